//! Statement and expression rendering.
//!
//! Control-flow instructions render to nothing and queue block markers
//! instead; the driver turns those into braces when the walk reaches them.

use ubcd_ir::{CallTarget, FunctionFlags, Instruction, ObjectKind, ObjectRef, Token};
use ubcd_isa::{NativeFormat, Opcode, VER_UE3_TOKEN_LAYOUT, cast_type_name};

use crate::driver::Walk;
use crate::error::RenderError;
use crate::heuristics::{
    is_break, is_do_until, is_else, is_foreach_continue, is_loop_continue, is_while_guard,
    switch_end,
};
use crate::nest::NestKind;
use crate::symbols::{name_text, object_text};

type RenderResult = Result<String, RenderError>;

/// Render a top-level instruction. An empty string means nothing is written
/// for it; block markers may still have been queued.
pub(crate) fn render_statement(w: &mut Walk<'_, '_>, insn: &Instruction) -> RenderResult {
    match &insn.token {
        Token::JumpIfNot { target, condition } => {
            jump_if_not(w, insn, *target as u32, condition)
        }
        Token::Jump { target } => jump(w, insn, *target as u32),
        Token::FilterEditorOnly { target } => {
            w.nests.open(
                NestKind::If,
                insn.end(),
                insn.position,
                *target as u32,
                Some("filtereditoronly".into()),
            );
            Ok(String::new())
        }
        Token::Switch { value, .. } => {
            let header = format!("switch({})", render_expr(w, value)?);
            let dec = w.dec;
            let limit = w.nests.innermost().map_or(dec.code_end(), |c| c.end);
            let end = switch_end(dec.stream().tokens(), w.index, limit);
            w.nests
                .open(NestKind::Switch, insn.end(), insn.position, end, Some(header));
            Ok(String::new())
        }
        Token::Case { target, value } => case(w, insn, *target as u32, value.as_deref()),
        Token::Iterator { expr, end } => {
            let header = format!("foreach {}", render_expr(w, expr)?);
            w.nests.push_begin(
                NestKind::ForEach,
                insn.end(),
                insn.position,
                *end as u32,
                Some(header),
            );
            Ok(String::new())
        }
        Token::DynArrayIterator {
            array,
            item,
            with_index,
            index,
            end,
        } => {
            let array = render_expr(w, array)?;
            let item = render_expr(w, item)?;
            let header = if *with_index {
                format!("foreach {array}({item}, {})", render_expr(w, index)?)
            } else {
                format!("foreach {array}({item})")
            };
            w.nests.push_begin(
                NestKind::ForEach,
                insn.end(),
                insn.position,
                *end as u32,
                Some(header),
            );
            Ok(String::new())
        }
        Token::NoOperands if insn.opcode == Opcode::IteratorPop => {
            if w.previous == Some(Opcode::IteratorNext) {
                if let Some(foreach) = w.nests.innermost_where(|k| k == NestKind::ForEach) {
                    let id = foreach.id;
                    w.nests.push_end(NestKind::ForEach, id, insn.end(), None);
                }
            }
            Ok(String::new())
        }
        Token::LabelTable(_) => Ok(String::new()),
        Token::DefaultParmValue { statements, .. } => {
            let mut parts = Vec::with_capacity(statements.len());
            for s in statements {
                let text = render_expr(w, s)?;
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            w.ctx.pre_comment = Some(format!("DefaultParmValue={}", parts.join("; ")));
            Ok(String::new())
        }
        Token::Unknown => render_expr(w, insn),
        _ => {
            let text = render_expr(w, insn)?;
            w.ctx.needs_terminator = !text.is_empty();
            Ok(text)
        }
    }
}

fn jump_if_not(
    w: &mut Walk<'_, '_>,
    insn: &Instruction,
    target: u32,
    condition: &Instruction,
) -> RenderResult {
    let cond = render_expr(w, condition)?;
    if is_do_until(insn) {
        if let Some(id) = w.nests.find_by_creator(NestKind::Loop, insn.position) {
            w.nests.push_end(
                NestKind::Loop,
                id,
                insn.end(),
                Some(format!("until({cond});")),
            );
            return Ok(String::new());
        }
        let label = w.labels.goto_target(target, insn.position);
        w.ctx.needs_terminator = true;
        return Ok(format!("if(!({cond})) goto {label}"));
    }
    let dec = w.dec;
    let (kind, header) = if is_while_guard(insn, dec.stream().tokens()) {
        (NestKind::Loop, format!("while({cond})"))
    } else {
        (NestKind::If, format!("if({cond})"))
    };
    w.nests
        .open(kind, insn.end(), insn.position, target, Some(header));
    Ok(String::new())
}

fn jump(w: &mut Walk<'_, '_>, insn: &Instruction, target: u32) -> RenderResult {
    let position = insn.position;
    let end = insn.end();

    let closes_loop = w
        .nests
        .innermost_where(|k| k == NestKind::Loop)
        .is_some_and(|l| l.end == end && l.creator == target);
    if closes_loop {
        return Ok(String::new());
    }

    let breakable = w.nests.innermost_where(|k| k.is_breakable()).copied();
    if is_break(target, breakable.map(|b| b.end)) {
        w.nests.push_begin(
            NestKind::SwitchBreak,
            end,
            position,
            end,
            Some("break;".into()),
        );
        return Ok(String::new());
    }
    let continues = breakable.is_some_and(|b| match b.kind {
        NestKind::ForEach => is_foreach_continue(target, b.end),
        NestKind::Loop => is_loop_continue(position, target, b.creator, b.end),
        _ => false,
    });
    if let Some(top) = w.nests.innermost().copied() {
        // A jump alone in an `if` body reads as `continue` when it can.
        let sole = top.start == position;
        if top.kind == NestKind::If && !(continues && sole) {
            let if_end = w.nests.pending_end(top.id).map(|n| n.position);
            if is_else(end, target, if_end) {
                w.nests.open(NestKind::Else, end, position, target, None);
                return Ok(String::new());
            }
        }
    }
    if continues {
        w.ctx.needs_terminator = true;
        return Ok("continue".into());
    }

    let label = w.labels.goto_target(target, position);
    w.ctx.needs_terminator = true;
    Ok(format!("goto {label}"))
}

fn case(
    w: &mut Walk<'_, '_>,
    insn: &Instruction,
    target: u32,
    value: Option<&Instruction>,
) -> RenderResult {
    let Some(switch) = w.nests.innermost_where(|k| k == NestKind::Switch).copied() else {
        return Err(RenderError::MissingSwitch);
    };
    match value {
        None => {
            w.nests
                .open(NestKind::Default, insn.end(), insn.position, switch.end, None);
            Ok("default:".into())
        }
        Some(value) => {
            let value = render_expr(w, value)?;
            w.nests
                .open(NestKind::Case, insn.end(), insn.position, target, None);
            Ok(format!("case {value}:"))
        }
    }
}

/// Render an instruction as an expression.
pub(crate) fn render_expr(w: &mut Walk<'_, '_>, insn: &Instruction) -> RenderResult {
    let symbols = w.dec.symbols;
    let text = match &insn.token {
        Token::NoOperands => constant(insn.opcode).to_string(),
        Token::Variable(object) => {
            let name = object_text(symbols, *object);
            if insn.opcode == Opcode::DefaultVariable {
                format!("default.{name}")
            } else {
                name
            }
        }
        Token::UndefinedVariable => "__undefined".into(),
        Token::BoolVariable(e) | Token::InterfaceContext(e) => render_expr(w, e)?,
        Token::InstanceDelegate(name) => name_text(symbols, *name),
        Token::DelegateProperty { name, .. } => name_text(symbols, *name),

        Token::IntConst(v) => v.to_string(),
        Token::FloatConst(v) => float_text(*v),
        Token::ByteConst(v) => v.to_string(),
        Token::StringConst(s) => string_literal(s),
        Token::NameConst(name) => format!("'{}'", name_text(symbols, *name)),
        Token::ObjectConst(object) => object_literal(w, *object),
        Token::RotatorConst { pitch, yaw, roll } => format!("rot({pitch},{yaw},{roll})"),
        Token::VectorConst { x, y, z } => {
            format!("vect({},{},{})", float_text(*x), float_text(*y), float_text(*z))
        }
        Token::RangeConst { min, max } => {
            format!("range({},{})", float_text(*min), float_text(*max))
        }

        Token::Return(value) => {
            let value = render_expr(w, value)?;
            if value.is_empty() {
                "return".into()
            } else {
                format!("return {value}")
            }
        }
        Token::ReturnNothing(_) => "return".into(),
        Token::GotoLabel(e) => format!("goto {}", render_expr(w, e)?),
        Token::Assert { condition, .. } => format!("assert({})", render_expr(w, condition)?),
        Token::Let { target, value } => {
            let target = render_expr(w, target)?;
            format!("{target} = {}", render_expr(w, value)?)
        }
        Token::EatReturnValue { expr, .. } | Token::Skip { expr, .. } => render_expr(w, expr)?,

        Token::Context { object, member, .. } => {
            let object = render_expr(w, object)?;
            let saved = (w.ctx.in_context, w.ctx.in_class_static_context);
            w.ctx.in_context = true;
            if insn.opcode == Opcode::ClassContext {
                w.ctx.in_class_static_context = true;
            }
            let member = render_expr(w, member);
            (w.ctx.in_context, w.ctx.in_class_static_context) = saved;
            format!("{object}.{}", member?)
        }
        Token::StructMember {
            property, object, ..
        } => {
            let object = render_expr(w, object)?;
            format!("{object}.{}", object_text(symbols, *property))
        }
        Token::ArrayElement { index, array } => {
            let index = render_expr(w, index)?;
            format!("{}[{index}]", render_expr(w, array)?)
        }
        Token::DynArrayLength(array) => format!("{}.Length", render_expr(w, array)?),
        Token::DynArrayMethod { array, args, .. } => {
            let array = render_expr(w, array)?;
            format!("{array}.{}({})", array_method(insn.opcode), arguments(w, args)?)
        }

        Token::Call { target, args } => call(w, target, args)?,

        Token::PrimitiveCast {
            cast,
            interface,
            expr,
        } => {
            let inner = render_expr(w, expr)?;
            match interface {
                Some(class) => format!("{}({inner})", object_text(symbols, *class)),
                None => {
                    let legacy = !w.dec.stream().format().at_least(VER_UE3_TOKEN_LAYOUT);
                    match cast_type_name(*cast, legacy) {
                        Some(ty) => format!("{ty}({inner})"),
                        None => {
                            w.ctx.post_comment = Some(format!("unknown cast 0x{cast:02X}"));
                            inner
                        }
                    }
                }
            }
        }
        Token::ClassCast { class, expr } => {
            let class = object_text(symbols, *class);
            let inner = render_expr(w, expr)?;
            if insn.opcode == Opcode::MetaCast {
                format!("class<{class}>({inner})")
            } else {
                format!("{class}({inner})")
            }
        }

        Token::StructCmp { lhs, rhs, .. } => {
            let op = if insn.opcode == Opcode::StructCmpNe { "!=" } else { "==" };
            let lhs = render_expr(w, lhs)?;
            format!("{lhs} {op} {}", render_expr(w, rhs)?)
        }
        Token::DelegateCmp { lhs, rhs } => {
            let op = match insn.opcode {
                Opcode::NotEqualDelDel | Opcode::NotEqualDelFunc => "!=",
                _ => "==",
            };
            let lhs = render_expr(w, lhs)?;
            format!("{lhs} {op} {}", render_expr(w, rhs)?)
        }
        Token::Conditional {
            condition,
            then,
            otherwise,
            ..
        } => {
            let condition = render_expr(w, condition)?;
            let then = render_expr(w, then)?;
            format!("({condition} ? {then} : {})", render_expr(w, otherwise)?)
        }
        Token::New {
            outer,
            name,
            flags,
            class,
            template,
        } => {
            let mut parts = vec![
                optional(w, outer)?,
                optional(w, name)?,
                optional(w, flags)?,
            ];
            trim_trailing_empty(&mut parts);
            let mut text = if parts.is_empty() {
                "new ".to_string()
            } else {
                format!("new({}) ", parts.join(", "))
            };
            text.push_str(&render_expr(w, class)?);
            if let Some(template) = template {
                let template = optional(w, template)?;
                if !template.is_empty() {
                    text.push_str(&format!("({template})"));
                }
            }
            text
        }

        Token::Unknown => {
            let code = match insn.opcode {
                Opcode::Unknown(code) => code,
                _ => (insn.raw >> 8) as u8,
            };
            format!("/*@Unknown 0x{code:02X}*/")
        }

        Token::Jump { .. }
        | Token::JumpIfNot { .. }
        | Token::FilterEditorOnly { .. }
        | Token::Switch { .. }
        | Token::Case { .. }
        | Token::Iterator { .. }
        | Token::DynArrayIterator { .. }
        | Token::LabelTable(_)
        | Token::DebugInfo { .. }
        | Token::DefaultParmValue { .. } => {
            return Err(RenderError::UnexpectedToken(insn.opcode));
        }
    };
    Ok(text)
}

fn constant(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::IntZero => "0",
        Opcode::IntOne => "1",
        Opcode::True => "true",
        Opcode::False => "false",
        Opcode::NoObject | Opcode::EmptyDelegate => "none",
        Opcode::SelfObject => "self",
        Opcode::Stop => "stop",
        _ => "",
    }
}

fn float_text(v: f32) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn object_literal(w: &Walk<'_, '_>, object: ObjectRef) -> String {
    if object.is_none() {
        return "none".into();
    }
    match w.dec.symbols.object(object) {
        Some(info) if !info.class_name.is_empty() => format!("{}'{}'", info.class_name, info.name),
        Some(info) => format!("'{}'", info.name),
        None => format!("Object#{}", object.0),
    }
}

fn array_method(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::DynArrayInsert => "Insert",
        Opcode::DynArrayRemove => "Remove",
        Opcode::DynArrayAdd => "Add",
        Opcode::DynArrayAddItem => "AddItem",
        Opcode::DynArrayRemoveItem => "RemoveItem",
        Opcode::DynArrayInsertItem => "InsertItem",
        Opcode::DynArraySort => "Sort",
        _ => "Find",
    }
}

/// Renders an optional operand; parameter placeholders render empty.
fn optional(w: &mut Walk<'_, '_>, insn: &Instruction) -> RenderResult {
    match insn.opcode {
        Opcode::Nothing | Opcode::EmptyParmValue | Opcode::NoObject => Ok(String::new()),
        _ => render_expr(w, insn),
    }
}

fn trim_trailing_empty(parts: &mut Vec<String>) {
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
}

/// Argument list; omitted optional parameters keep their comma unless they
/// trail.
fn arguments(w: &mut Walk<'_, '_>, args: &[Instruction]) -> RenderResult {
    let saved = (w.ctx.in_context, w.ctx.in_class_static_context);
    w.ctx.in_context = false;
    w.ctx.in_class_static_context = false;
    let mut parts = Vec::with_capacity(args.len());
    let mut result = Ok(());
    for arg in args {
        let text = match arg.opcode {
            Opcode::Nothing | Opcode::EmptyParmValue => Ok(String::new()),
            _ => render_expr(w, arg),
        };
        match text {
            Ok(text) => parts.push(text),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    (w.ctx.in_context, w.ctx.in_class_static_context) = saved;
    result?;
    trim_trailing_empty(&mut parts);
    Ok(parts.join(", "))
}

fn call(w: &mut Walk<'_, '_>, target: &CallTarget, args: &[Instruction]) -> RenderResult {
    let symbols = w.dec.symbols;
    let prefix = if w.ctx.in_class_static_context { "static." } else { "" };
    match target {
        CallTarget::Virtual(name) => {
            let name = name_text(symbols, *name);
            Ok(format!("{prefix}{name}({})", arguments(w, args)?))
        }
        CallTarget::Global(name) => {
            let name = name_text(symbols, *name);
            Ok(format!("global.{name}({})", arguments(w, args)?))
        }
        CallTarget::Delegate { name, .. } => {
            let name = name_text(symbols, *name);
            Ok(format!("{name}({})", arguments(w, args)?))
        }
        CallTarget::Final(object) => {
            let info = symbols
                .object(*object)
                .ok_or(RenderError::UnresolvedFunction(*object))?;
            if info.kind != ObjectKind::Function {
                return Err(RenderError::NotAFunction(info.name));
            }
            let function = info.function.clone().unwrap_or_default();
            if function.is_operator() {
                return match args {
                    [lhs, rhs] => binary(w, &info.name, function.operator_precedence, lhs, rhs),
                    [operand] if function.is_pre_operator() => unary(w, &info.name, operand, true),
                    [operand] => unary(w, &info.name, operand, false),
                    _ => Ok(format!("{}({})", info.name, arguments(w, args)?)),
                };
            }
            let bypass = FunctionFlags::FINAL | FunctionFlags::STATIC;
            let super_class = match (&info.outer, &w.dec.owner_class) {
                (Some(outer), Some(owner))
                    if !w.ctx.in_context
                        && outer != owner
                        && !function.flags.intersects(bypass) =>
                {
                    Some(outer.clone())
                }
                _ => None,
            };
            let args = arguments(w, args)?;
            Ok(match super_class {
                Some(class) => format!("super({class}).{}({args})", info.name),
                None => format!("{prefix}{}({args})", info.name),
            })
        }
        CallTarget::Native(ordinal) => match w.dec.native(*ordinal) {
            Some(native) => match (native.format, args) {
                (NativeFormat::Operator, [lhs, rhs]) => {
                    binary(w, &native.name, native.precedence, lhs, rhs)
                }
                (NativeFormat::PreOperator, [operand]) => unary(w, &native.name, operand, true),
                (NativeFormat::PostOperator, [operand]) => {
                    unary(w, &native.name, operand, false)
                }
                _ => Ok(format!("{prefix}{}({})", native.name, arguments(w, args)?)),
            },
            None => {
                w.ctx.post_comment = Some(format!("unresolved native {ordinal}"));
                Ok(format!("__native_{ordinal}({})", arguments(w, args)?))
            }
        },
    }
}

fn binary(
    w: &mut Walk<'_, '_>,
    op: &str,
    precedence: u8,
    lhs: &Instruction,
    rhs: &Instruction,
) -> RenderResult {
    let lhs = operand(w, lhs, |p| p > precedence)?;
    let rhs = operand(w, rhs, |p| p >= precedence)?;
    Ok(format!("{lhs} {op} {rhs}"))
}

fn unary(w: &mut Walk<'_, '_>, op: &str, expr: &Instruction, pre: bool) -> RenderResult {
    let expr = operand(w, expr, |_| true)?;
    let spaced = op.ends_with(|c: char| c.is_ascii_alphanumeric());
    Ok(match (pre, spaced) {
        (true, true) => format!("{op} {expr}"),
        (true, false) => format!("{op}{expr}"),
        (false, true) => format!("{expr} {op}"),
        (false, false) => format!("{expr}{op}"),
    })
}

/// Render an operator operand, parenthesized when it is itself a binary
/// operator that `wrap` says binds too loosely.
fn operand(
    w: &mut Walk<'_, '_>,
    insn: &Instruction,
    wrap: impl Fn(u8) -> bool,
) -> RenderResult {
    let text = render_expr(w, insn)?;
    Ok(match binary_precedence(w, insn) {
        Some(p) if wrap(p) => format!("({text})"),
        _ => text,
    })
}

fn binary_precedence(w: &Walk<'_, '_>, insn: &Instruction) -> Option<u8> {
    match &insn.token {
        Token::Call {
            target: CallTarget::Native(ordinal),
            args,
        } if args.len() == 2 => w
            .dec
            .native(*ordinal)
            .filter(|n| n.format == NativeFormat::Operator)
            .map(|n| n.precedence),
        Token::Call {
            target: CallTarget::Final(object),
            args,
        } if args.len() == 2 => w
            .dec
            .symbols
            .object(*object)?
            .function
            .filter(|f| f.is_operator())
            .map(|f| f.operator_precedence),
        Token::Skip { expr, .. } => binary_precedence(w, expr),
        _ => None,
    }
}
