//! The linear decompile walk.

use std::collections::BTreeSet;
use std::fmt::Write;

use ubcd_ir::{Instruction, Token};
use ubcd_isa::{NativeFunction, NativeTable, Opcode};

use crate::context::{BraceStyle, DecompileContext};
use crate::error::RenderError;
use crate::heuristics::{is_do_until, is_implicit_return};
use crate::labels::{LabelOrigin, LabelTable, goto_label_name};
use crate::nest::{Nest, NestFlavor, NestKind, NestManager};
use crate::render::{render_expr, render_statement};
use crate::stream::TokenStream;
use crate::symbols::{SymbolResolver, name_text};

/// Renders a deserialized [`TokenStream`] as source text.
pub struct Decompiler<'a> {
    stream: &'a TokenStream,
    pub(crate) symbols: &'a dyn SymbolResolver,
    natives: &'a dyn NativeTable,
    pub(crate) owner_class: Option<String>,
}

impl<'a> Decompiler<'a> {
    pub fn new(
        stream: &'a TokenStream,
        symbols: &'a dyn SymbolResolver,
        natives: &'a dyn NativeTable,
    ) -> Self {
        Self {
            stream,
            symbols,
            natives,
            owner_class: None,
        }
    }

    /// Class that owns the declaration; enables `super(...)` call forms.
    pub fn with_owner_class(mut self, class: impl Into<String>) -> Self {
        self.owner_class = Some(class.into());
        self
    }

    pub fn stream(&self) -> &TokenStream {
        self.stream
    }

    pub(crate) fn native(&self, ordinal: u16) -> Option<NativeFunction> {
        self.natives
            .native(ordinal)
            .or_else(|| self.symbols.native_function(ordinal))
    }

    /// Logical end of the code.
    pub(crate) fn code_end(&self) -> u32 {
        self.stream
            .tokens()
            .last()
            .map(|t| t.end())
            .unwrap_or(0)
            .max(self.stream.declared_size())
    }

    /// Render the whole body, starting from the state in `ctx`.
    ///
    /// A `goto` back to a position that had no label triggers one more walk
    /// with those labels registered up front.
    pub fn decompile(&self, ctx: &mut DecompileContext) -> String {
        let start = ctx.clone();
        let (text, missed) = self.walk(ctx, &BTreeSet::new());
        if missed.is_empty() {
            return text;
        }
        log::debug!(
            "ubcd_decompiler::driver: {}: re-running for {} missed labels",
            self.stream.declaration(),
            missed.len()
        );
        *ctx = start;
        self.walk(ctx, &missed).0
    }

    /// Render the single top-level instruction at `position` as an expression.
    pub fn render_at(
        &self,
        position: u32,
        ctx: &mut DecompileContext,
    ) -> Result<String, RenderError> {
        let index = self
            .stream
            .index_of(position)
            .ok_or(RenderError::NoTokenAt(position))?;
        let mut w = Walk::new(self, ctx);
        w.index = index;
        render_expr(&mut w, &self.stream.tokens()[index])
    }

    fn walk(&self, ctx: &mut DecompileContext, seeds: &BTreeSet<u32>) -> (String, BTreeSet<u32>) {
        let mut w = Walk::new(self, ctx);
        w.prepare(seeds);
        w.run();
        let missed = w.labels.missed().clone();
        (w.out, missed)
    }
}

/// State of one pass over a stream.
pub(crate) struct Walk<'w, 'a> {
    pub(crate) dec: &'w Decompiler<'a>,
    pub(crate) ctx: &'w mut DecompileContext,
    pub(crate) nests: NestManager,
    pub(crate) labels: LabelTable,
    pub(crate) out: String,
    /// Index of the top-level instruction being rendered.
    pub(crate) index: usize,
    /// Previous meaningful top-level opcode.
    pub(crate) previous: Option<Opcode>,
}

impl<'w, 'a> Walk<'w, 'a> {
    fn new(dec: &'w Decompiler<'a>, ctx: &'w mut DecompileContext) -> Self {
        Self {
            dec,
            ctx,
            nests: NestManager::new(),
            labels: LabelTable::new(),
            out: String::new(),
            index: 0,
            previous: None,
        }
    }

    /// Register state labels, seeded labels and `do` loop openers.
    fn prepare(&mut self, seeds: &BTreeSet<u32>) {
        let dec = self.dec;
        let tokens = dec.stream.tokens();
        for t in tokens {
            if let Token::LabelTable(entries) = &t.token {
                for e in entries {
                    let name = name_text(dec.symbols, e.name);
                    self.labels.register(name, e.position, LabelOrigin::State);
                }
            }
        }
        for &p in seeds {
            self.labels.register(goto_label_name(p), p, LabelOrigin::Goto);
        }
        for t in tokens.iter().filter(|t| is_do_until(t)) {
            if let Some(target) = t.jump_target() {
                self.nests.push_deferred_begin(
                    NestKind::Loop,
                    target,
                    t.position,
                    t.end(),
                    Some("do".into()),
                );
            }
        }
    }

    fn run(&mut self) {
        let dec = self.dec;
        let tokens = dec.stream.tokens();
        self.reconcile(0);
        for (i, insn) in tokens.iter().enumerate() {
            self.index = i;
            self.emit_label(insn.position);
            if !insn.opcode.is_hidden() {
                if !(self.ctx.options.suppress_implicit_return && is_implicit_return(tokens, i)) {
                    self.statement(insn);
                }
                self.previous = Some(insn.opcode);
            }
            self.reconcile(insn.end());
        }
        self.flush();
    }

    fn statement(&mut self, insn: &Instruction) {
        self.ctx.needs_terminator = false;
        self.ctx.pre_comment = None;
        self.ctx.post_comment = None;
        match render_statement(self, insn) {
            Ok(text) => self.emit_statement(text),
            Err(e) => {
                log::debug!(
                    "ubcd_decompiler::driver: {}: {} at {:#06x}: {e}",
                    self.dec.stream.declaration(),
                    e.kind(),
                    insn.position
                );
                self.emit_line(&format!("// {} at 0x{:04X}: {e}", e.kind(), insn.position));
            }
        }
    }

    fn emit_statement(&mut self, text: String) {
        let comments = !self.ctx.options.suppress_comments;
        if let Some(c) = self.ctx.pre_comment.take() {
            if comments {
                self.emit_line(&format!("// {c}"));
            }
        }
        let post = self.ctx.post_comment.take();
        if text.is_empty() {
            return;
        }
        let mut line = text;
        if self.ctx.needs_terminator {
            line.push(';');
        }
        if let Some(c) = post {
            if comments {
                let _ = write!(line, " // {c}");
            }
        }
        self.emit_line(&line);
    }

    fn emit_line(&mut self, text: &str) {
        self.ctx.apply_pending_indent();
        let _ = writeln!(self.out, "{}{text}", self.ctx.pad());
    }

    fn emit_label(&mut self, position: u32) {
        if let Some(label) = self.labels.take(position) {
            self.ctx.apply_pending_indent();
            let _ = writeln!(self.out, "{}{}:", self.ctx.outdented_pad(), label.name);
        }
    }

    /// Emit the markers that are due at `cursor`.
    fn reconcile(&mut self, cursor: u32) {
        for nest in self.nests.take_ready_begins(cursor, false) {
            self.emit_begin(nest);
        }
        loop {
            while let Some(nest) = self.nests.take_ready_end(cursor) {
                self.emit_end(nest);
            }
            let Some(outer) = self.nests.blocked_end(cursor) else {
                break;
            };
            self.close_inside(outer);
        }
        for nest in self.nests.take_ready_begins(cursor, true) {
            self.emit_begin(nest);
        }
    }

    fn emit_begin(&mut self, nest: Nest) {
        match nest.kind {
            NestKind::SwitchBreak => {
                let text = nest.text.as_deref().unwrap_or("break;").to_string();
                self.emit_line(&text);
            }
            NestKind::Case | NestKind::Default => {
                self.nests.enter(&nest);
                self.ctx.pending_indent_delta += 1;
            }
            NestKind::Else => {
                if let Some(top) = self.nests.innermost().copied() {
                    if top.kind == NestKind::If {
                        self.nests.cancel_end(top.id);
                        self.nests.leave(top.id);
                    }
                }
                self.ctx.pending_indent_delta -= 1;
                match self.ctx.options.brace_style {
                    BraceStyle::SameLine => self.emit_line("} else {"),
                    BraceStyle::NextLine => {
                        self.emit_line("}");
                        self.emit_line("else");
                        self.emit_line("{");
                    }
                }
                self.nests.enter(&nest);
                self.ctx.pending_indent_delta += 1;
            }
            _ => {
                let header = nest.text.clone().unwrap_or_default();
                match self.ctx.options.brace_style {
                    BraceStyle::SameLine => self.emit_line(&format!("{header} {{")),
                    BraceStyle::NextLine => {
                        self.emit_line(&header);
                        self.emit_line("{");
                    }
                }
                self.nests.enter(&nest);
                self.ctx.pending_indent_delta += 1;
            }
        }
    }

    fn emit_end(&mut self, nest: Nest) {
        self.nests.leave(nest.id);
        self.close_block(nest.kind, nest.text.as_deref());
    }

    fn close_block(&mut self, kind: NestKind, footer: Option<&str>) {
        self.ctx.pending_indent_delta -= 1;
        if kind.is_label_like() {
            return;
        }
        match (footer, self.ctx.options.brace_style) {
            (None, _) => self.emit_line("}"),
            (Some(f), BraceStyle::SameLine) => self.emit_line(&format!("}} {f}")),
            (Some(f), BraceStyle::NextLine) => {
                self.emit_line("}");
                self.emit_line(f);
            }
        }
    }

    /// Close the blocks opened inside `outer` whose own ends lie later.
    fn close_inside(&mut self, outer: usize) {
        while let Some(top) = self.nests.innermost().copied() {
            if top.id == outer {
                break;
            }
            log::debug!(
                "ubcd_decompiler::driver: {}: {:?} at {:#06x} closed early with its enclosing block",
                self.dec.stream.declaration(),
                top.kind,
                top.creator
            );
            let footer = self.nests.cancel_end(top.id).and_then(|n| n.text);
            self.nests.leave(top.id);
            self.close_block(top.kind, footer.as_deref());
        }
    }

    /// Close everything still open once the code is exhausted.
    fn flush(&mut self) {
        let code_end = self.dec.code_end();
        for label in self.labels.drain_pending() {
            if label.position >= code_end {
                self.ctx.apply_pending_indent();
                let _ = writeln!(self.out, "{}{}:", self.ctx.outdented_pad(), label.name);
            } else {
                log::warn!(
                    "ubcd_decompiler::driver: {}: label {} at {:#06x} does not start an instruction",
                    self.dec.stream.declaration(),
                    label.name,
                    label.position
                );
            }
        }

        for nest in self.nests.take_ready_begins(u32::MAX, false) {
            self.emit_begin(nest);
        }
        for nest in self.nests.take_ready_begins(u32::MAX, true) {
            self.emit_begin(nest);
        }
        loop {
            if let Some(nest) = self.nests.take_ready_end(u32::MAX) {
                self.emit_end(nest);
                continue;
            }
            let Some(top) = self.nests.innermost().copied() else {
                break;
            };
            self.nests.leave(top.id);
            self.close_block(top.kind, None);
        }
        let orphans = self.nests.drain_pending();
        if !orphans.is_empty() {
            log::debug!(
                "ubcd_decompiler::driver: {}: dropped {} unmatched markers",
                self.dec.stream.declaration(),
                orphans
                    .iter()
                    .filter(|n| n.flavor == NestFlavor::End)
                    .count()
            );
        }
        self.ctx.apply_pending_indent();
    }
}
