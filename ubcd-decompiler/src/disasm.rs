//! Human-readable instruction listing.

use std::fmt::Write;

use ubcd_ir::{CallTarget, Instruction, Token};
use ubcd_isa::DEFAULT_CASE_TARGET;

use crate::stream::TokenStream;

/// One line per instruction, nested operands indented under their parent.
///
/// Columns: logical position, storage offset, logical/storage size, kind.
pub fn listing(stream: &TokenStream) -> String {
    let mut out = String::new();
    let integrity = stream.integrity();
    let _ = writeln!(
        out,
        "; {} format {} ({}), {} tokens, size {:#06x}/{:#06x}",
        stream.declaration(),
        stream.format(),
        stream.format().era(),
        stream.tokens().len(),
        integrity.consumed,
        integrity.declared,
    );
    for insn in stream.tokens() {
        insn.visit(&mut |t, depth| {
            let _ = writeln!(
                out,
                "{:04X} [{:04X}] {:>3}/{:<3} {}{}{}",
                t.position,
                t.storage_position,
                t.size,
                t.storage_size,
                "  ".repeat(depth),
                t.opcode,
                detail(t)
            );
        });
    }
    if let Some(e) = stream.failure() {
        let _ = writeln!(out, "; decode aborted: {e}");
    } else if !integrity.is_intact() {
        let _ = writeln!(out, "; size mismatch");
    }
    out
}

fn detail(insn: &Instruction) -> String {
    match &insn.token {
        Token::Case { target, .. } if *target == DEFAULT_CASE_TARGET => " default".into(),
        Token::Jump { target }
        | Token::JumpIfNot { target, .. }
        | Token::FilterEditorOnly { target }
        | Token::Case { target, .. } => format!(" -> {target:#06x}"),
        Token::Iterator { end, .. } | Token::DynArrayIterator { end, .. } => {
            format!(" end {end:#06x}")
        }
        Token::IntConst(v) => format!(" {v}"),
        Token::ByteConst(v) => format!(" {v}"),
        Token::FloatConst(v) => format!(" {v}"),
        Token::StringConst(s) => format!(" {s:?}"),
        Token::NameConst(n) | Token::InstanceDelegate(n) => format!(" name {}", n.index),
        Token::Variable(o) | Token::ObjectConst(o) => format!(" obj {}", o.0),
        Token::Call {
            target: CallTarget::Final(o),
            ..
        } => format!(" obj {}", o.0),
        Token::Call {
            target: CallTarget::Virtual(n) | CallTarget::Global(n),
            ..
        } => format!(" name {}", n.index),
        Token::LabelTable(entries) => format!(" {} labels", entries.len()),
        Token::DebugInfo { line, column, .. } => format!(" line {line} col {column}"),
        Token::PrimitiveCast { cast, .. } => format!(" cast {cast:#04x}"),
        _ => String::new(),
    }
}
