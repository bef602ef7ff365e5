mod common;

use common::*;
use ubcd_decompiler::{TokenStream, disasm};
use ubcd_isa::{NativeTableMap, Opcode, OpcodeResolver};

#[test]
fn listing_indents_nested_operands() {
    let mut a = Asm::new(512);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.tail();
    let stream = deserialize(a, &MockSymbols::new());
    let text = disasm::listing(&stream);
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("; Pawn.Test"), "{text}");
    assert_eq!(lines[1], "0000 [0000]   8/8   JumpIfNot -> 0x000f");
    assert_eq!(lines[2], "0003 [0003]   5/5     LocalVariable obj 1");
    assert_eq!(lines[3], "0008 [0008]   7/7   Let");
    assert!(!text.contains("aborted"));
}

#[test]
fn listing_reports_truncation() {
    let mut a = Asm::new(512);
    a.op(Opcode::IntConst).byte(1);
    let format = a.format;
    let mut stream = TokenStream::new("Pawn.Test", a.bytes, 5);
    stream.ensure_deserialized(
        &OpcodeResolver::new(format),
        &NativeTableMap::core(),
        &MockSymbols::new(),
    );
    let text = disasm::listing(&stream);
    assert!(text.ends_with("; decode aborted: unexpected end of code at 0x0001 (wanted 4 bytes)\n"), "{text}");
}
