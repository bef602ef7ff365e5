mod common;

use common::*;
use ubcd_decompiler::{DecodeError, TokenStream};
use ubcd_ir::Token;
use ubcd_isa::{NativeTableMap, Opcode, OpcodeResolver};

fn debug_info(a: &mut Asm, line: i32) {
    a.op(Opcode::DebugInfo).i32(100).i32(line).i32(0).byte(0);
}

fn sample(version: u16) -> Asm {
    let mut a = Asm::new(version);
    debug_info(&mut a, 10);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.native(146).local(1).int(3).end_parms();
    a.tail();
    a
}

// --- partition ---

#[test]
fn tokens_partition_the_logical_range() {
    let a = sample(512);
    let declared = a.here();
    let stream = deserialize(a, &MockSymbols::new());
    let tokens = stream.tokens();
    assert_eq!(tokens[0].position, 0);
    for pair in tokens.windows(2) {
        assert_eq!(pair[0].end(), pair[1].position);
    }
    assert_eq!(tokens.last().unwrap().end(), declared);
    assert!(stream.integrity().is_intact());
    assert!(stream.failure().is_none());
}

#[test]
fn nested_operands_stay_inside_their_parent() {
    let stream = deserialize(sample(512), &MockSymbols::new());
    for t in stream.tokens() {
        t.visit(&mut |insn, _| {
            for child in insn.children() {
                assert!(child.position > insn.position);
                assert!(child.end() <= insn.end());
            }
        });
    }
}

// --- address spaces ---

#[test]
fn logical_and_storage_sizes_differ_for_wide_pointers() {
    let mut a = Asm::new(600);
    a.local(1);
    a.op(Opcode::EndOfScript);
    let stream = deserialize(a, &MockSymbols::new());
    let local = &stream.tokens()[0];
    assert_eq!(local.size, 9);
    assert_eq!(local.storage_size, 5);
    let end = &stream.tokens()[1];
    assert_eq!(end.position, 9);
    assert_eq!(end.storage_position, 5);
}

fn wide_if() -> Asm {
    let mut a = Asm::new(600);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.tail();
    a
}

#[test]
fn jump_targets_use_logical_positions() {
    let symbols = MockSymbols::new();
    let stream = deserialize(wide_if(), &symbols);
    let target = stream.tokens()[0].jump_target().unwrap();
    assert_eq!(target, 23);
    assert!(stream.token_at(target).is_some());
    assert_eq!(decompile_with(wide_if(), &symbols, options()), "if(A) {\n  B = 1;\n}\n");
}

// --- opcodes ---

#[test]
fn unknown_opcode_is_a_placeholder() {
    let mut a = Asm::new(512);
    a.byte(0x2B);
    a.set(2, true);
    a.op(Opcode::EndOfScript);
    let stream = deserialize(a, &MockSymbols::new());
    let t = &stream.tokens()[0];
    assert_eq!(t.opcode, Opcode::Unknown(0x2B));
    assert!(matches!(t.token, Token::Unknown));
    assert_eq!(t.size, 1);
    assert_eq!(stream.tokens()[1].opcode, Opcode::Let);
}

#[test]
fn natives_resolve_against_the_table() {
    let stream = deserialize(sample(512), &MockSymbols::new());
    let call = stream
        .tokens()
        .iter()
        .find(|t| t.opcode.is_native())
        .unwrap();
    assert_eq!(call.opcode, Opcode::NativeFunction(146));
    assert_eq!(call.children().len(), 2);
}

// --- memoization and cursor ---

#[test]
fn deserialization_is_memoized() {
    let a = sample(512);
    let format = a.format;
    let mut stream = a.into_stream();
    assert!(!stream.is_deserialized());
    let resolver = OpcodeResolver::new(format);
    let natives = NativeTableMap::core();
    let symbols = MockSymbols::new();
    let first = stream.ensure_deserialized(&resolver, &natives, &symbols).len();
    assert!(stream.is_deserialized());
    let second = stream.ensure_deserialized(&resolver, &natives, &symbols).len();
    assert_eq!(first, second);
    assert_eq!(stream.format(), format);
}

#[test]
fn cursor_skips_debug_info() {
    let mut stream = deserialize(sample(512), &MockSymbols::new());
    assert_eq!(stream.tokens()[0].opcode, Opcode::DebugInfo);
    assert_eq!(stream.next_token().map(|t| t.opcode), Some(Opcode::JumpIfNot));
    assert_eq!(stream.next_token().map(|t| t.opcode), Some(Opcode::Let));

    assert_eq!(stream.seek(0).map(|t| t.opcode), Some(Opcode::DebugInfo));
    assert!(stream.seek(1).is_none());
    stream.rewind();
    assert_eq!(stream.next_token().map(|t| t.opcode), Some(Opcode::JumpIfNot));
}

#[test]
fn debug_info_is_hidden_from_output() {
    let out = decompile(sample(512));
    assert_eq!(out, "if(A) {\n  B = 1;\n}\nA + 3;\n");
}

// --- malformed input ---

#[test]
fn declared_size_mismatch_is_reported() {
    let a = sample(512);
    let format = a.format;
    let size = a.here();
    let mut stream = TokenStream::new("Pawn.Test", a.bytes, size + 10);
    stream.ensure_deserialized(
        &OpcodeResolver::new(format),
        &NativeTableMap::core(),
        &MockSymbols::new(),
    );
    let integrity = stream.integrity();
    assert!(!integrity.is_intact());
    assert_eq!(integrity.declared, size + 10);
    assert_eq!(integrity.consumed, size);
}

#[test]
fn truncated_operand_aborts_the_blob_only() {
    let mut a = Asm::new(512);
    a.set(2, true);
    a.op(Opcode::IntConst).byte(1);
    let format = a.format;
    let mut stream = TokenStream::new("Pawn.Test", a.bytes, 20);
    stream.ensure_deserialized(
        &OpcodeResolver::new(format),
        &NativeTableMap::core(),
        &MockSymbols::new(),
    );
    assert_eq!(stream.tokens().len(), 1);
    assert!(matches!(stream.failure(), Some(DecodeError::Truncated { .. })));
}

#[test]
fn runaway_nesting_is_rejected() {
    let mut a = Asm::new(512);
    for _ in 0..300 {
        a.op(Opcode::BoolVariable);
    }
    a.local(1);
    let stream = deserialize(a, &MockSymbols::new());
    assert!(stream.tokens().is_empty());
    assert!(matches!(
        stream.failure(),
        Some(DecodeError::NestingTooDeep { .. })
    ));
}

#[test]
fn idempotent_after_context_reset() {
    use ubcd_decompiler::{DecompileContext, Decompiler};

    let symbols = MockSymbols::new();
    let stream = deserialize(sample(512), &symbols);
    let natives = NativeTableMap::core();
    let d = Decompiler::new(&stream, &symbols, &natives);
    let mut ctx = DecompileContext::new(options());
    let first = d.decompile(&mut ctx);
    ctx.reset();
    assert_eq!(d.decompile(&mut ctx), first);
}
