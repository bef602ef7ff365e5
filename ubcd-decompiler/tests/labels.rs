mod common;

use common::*;
use ubcd_decompiler::{DecompileContext, Decompiler};
use ubcd_isa::{NativeTableMap, Opcode};

const V: u16 = 512;

#[test]
fn shared_forward_target_gets_one_label() {
    let mut a = Asm::new(V);
    let first = a.jump();
    let second = a.jump();
    a.set(2, true);
    a.land(first);
    a.land(second);
    a.set(3, true);
    a.tail();
    let out = decompile(a);
    assert_eq!(
        out,
        "goto J0x000D;\ngoto J0x000D;\nB = 1;\nJ0x000D:\nC = 1;\n"
    );
    assert_eq!(out.matches("J0x000D:").count(), 1);
}

#[test]
fn backward_goto_is_labelled_on_second_pass() {
    let mut a = Asm::new(V);
    a.set(2, true);
    let target = a.here();
    a.set(3, true);
    a.jump_to(target);
    a.tail();
    assert_eq!(
        decompile(a),
        "B = 1;\nJ0x0007:\nC = 1;\ngoto J0x0007;\n"
    );
}

#[test]
fn state_labels_come_from_the_label_table() {
    let mut a = Asm::new(V);
    a.set(2, true);
    a.op(Opcode::Stop);
    a.op(Opcode::LabelTable);
    a.name(1).i32(0);
    a.name(0).i32(0xFFFF);
    a.op(Opcode::EndOfScript);
    assert_eq!(decompile(a), "Begin:\nB = 1;\nstop;\n");
}

#[test]
fn goto_to_state_label_reuses_its_name() {
    let mut a = Asm::new(V);
    a.set(2, true);
    a.jump_to(0);
    a.op(Opcode::LabelTable);
    a.name(1).i32(0);
    a.name(0).i32(0xFFFF);
    a.op(Opcode::EndOfScript);
    let out = decompile(a);
    assert_eq!(out, "Begin:\nB = 1;\ngoto Begin;\n");
}

#[test]
fn label_at_code_end_is_still_written() {
    let mut a = Asm::new(V);
    let out_of_body = a.jump();
    a.set(2, true);
    a.op(Opcode::Return).op(Opcode::Nothing);
    a.land(out_of_body);
    let out = decompile(a);
    assert!(out.ends_with("J0x000C:\n"), "{out}");
}

#[test]
fn rerun_restores_context_between_passes() {
    let mut a = Asm::new(V);
    let target = a.here();
    a.set(3, true);
    a.jump_to(target);
    a.tail();
    let symbols = MockSymbols::new();
    let stream = deserialize(a, &symbols);
    let natives = NativeTableMap::core();
    let d = Decompiler::new(&stream, &symbols, &natives);

    let mut ctx = DecompileContext::new(options());
    let first = d.decompile(&mut ctx);
    ctx.reset();
    let second = d.decompile(&mut ctx);
    assert_eq!(first, second);
    assert_eq!(first, "J0x0000:\nC = 1;\ngoto J0x0000;\n");
}
