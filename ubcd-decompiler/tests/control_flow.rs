mod common;

use common::*;
use ubcd_decompiler::DecompileOptions;
use ubcd_isa::Opcode;

const V: u16 = 512;

// --- if / else ---

#[test]
fn if_block() {
    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.tail();
    assert_eq!(decompile(a), "if(A) {\n  B = 1;\n}\n");
}

#[test]
fn if_else_block() {
    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    let over = a.jump();
    a.land(skip);
    a.set(3, false);
    a.land(over);
    a.tail();
    assert_eq!(
        decompile(a),
        "if(A) {\n  B = 1;\n} else {\n  C = 0;\n}\n"
    );
}

#[test]
fn if_else_next_line_braces() {
    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    let over = a.jump();
    a.land(skip);
    a.set(3, false);
    a.land(over);
    a.tail();
    let out = decompile_with(a, &MockSymbols::new(), DecompileOptions::default());
    assert_eq!(out, "if(A)\n{\n\tB = 1;\n}\nelse\n{\n\tC = 0;\n}\n");
}

#[test]
fn nested_ifs_close_innermost_first() {
    let mut a = Asm::new(V);
    let outer = a.jump_if_not(1);
    let inner = a.jump_if_not(2);
    a.set(3, true);
    a.land(inner);
    a.land(outer);
    a.tail();
    assert_eq!(
        decompile(a),
        "if(A) {\n  if(B) {\n    C = 1;\n  }\n}\n"
    );
}

// --- switch ---

#[test]
fn switch_with_returning_cases_closes_once() {
    let mut a = Asm::new(V);
    a.op(Opcode::Switch).byte(4).local(1);
    a.op(Opcode::Case);
    let next = a.target();
    a.int(1);
    a.op(Opcode::Return).local(2);
    a.land(next);
    a.op(Opcode::Case);
    let default = a.target();
    a.int(2);
    a.op(Opcode::Return).local(3);
    a.land(default);
    a.op(Opcode::Case).u16(0xFFFF);
    a.op(Opcode::Return).op(Opcode::IntZero);
    a.tail();
    let out = decompile(a);
    assert_eq!(
        out,
        "switch(A) {\n\
         \x20 case 1:\n\
         \x20   return B;\n\
         \x20 case 2:\n\
         \x20   return C;\n\
         \x20 default:\n\
         \x20   return 0;\n\
         }\n"
    );
    assert_eq!(out.matches('}').count(), 1);
}

#[test]
fn switch_inside_if_closes_with_the_if() {
    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.op(Opcode::Switch).byte(4).local(2);
    a.op(Opcode::Case);
    let default = a.target();
    a.int(1);
    a.op(Opcode::Return).op(Opcode::Nothing);
    a.land(default);
    a.op(Opcode::Case).u16(0xFFFF);
    a.set(3, true);
    a.land(skip);
    a.set(4, true);
    a.op(Opcode::Return).local(4);
    a.op(Opcode::EndOfScript);
    assert_eq!(
        decompile(a),
        "if(A) {\n\
         \x20 switch(B) {\n\
         \x20   case 1:\n\
         \x20     return;\n\
         \x20   default:\n\
         \x20     C = 1;\n\
         \x20 }\n\
         }\n\
         D = 1;\n\
         return D;\n"
    );
}

#[test]
fn switch_with_breaks() {
    let mut a = Asm::new(V);
    a.op(Opcode::Switch).byte(4).local(1);

    a.op(Opcode::Case);
    let second = a.target();
    a.op(Opcode::IntOne);
    a.set(2, true);
    let break1 = a.jump();

    a.land(second);
    a.op(Opcode::Case);
    let default = a.target();
    a.op(Opcode::IntZero);
    a.set(3, true);
    let break2 = a.jump();

    a.land(default);
    a.op(Opcode::Case).u16(0xFFFF);
    a.set(2, false);
    a.land(break1);
    a.land(break2);
    a.tail();

    assert_eq!(
        decompile(a),
        "switch(A) {\n\
         \x20 case 1:\n\
         \x20   B = 1;\n\
         \x20   break;\n\
         \x20 case 0:\n\
         \x20   C = 1;\n\
         \x20   break;\n\
         \x20 default:\n\
         \x20   B = 0;\n\
         }\n"
    );
}

// --- loops ---

#[test]
fn foreach_spans_every_statement() {
    let mut a = Asm::new(V);
    a.op(Opcode::Iterator);
    a.op(Opcode::VirtualFunction).name(5).local(4).local(2).end_parms();
    let end = a.target();
    a.set(2, true);
    a.set(3, true);
    a.set(3, false);
    a.op(Opcode::IteratorNext);
    a.land(end);
    a.op(Opcode::IteratorPop);
    a.tail();
    assert_eq!(
        decompile(a),
        "foreach AllActors(D, B) {\n  B = 1;\n  C = 1;\n  C = 0;\n}\n"
    );
}

#[test]
fn foreach_continue_and_break() {
    let mut a = Asm::new(V);
    a.op(Opcode::Iterator);
    a.op(Opcode::VirtualFunction).name(5).local(4).end_parms();
    let end = a.target();
    let skip = a.jump_if_not(1);
    let cont = a.jump();
    a.land(skip);
    let brk = a.jump();
    a.land(cont);
    a.op(Opcode::IteratorNext);
    a.land(end);
    a.fix(brk, a.here());
    a.op(Opcode::IteratorPop);
    a.tail();
    let out = decompile(a);
    assert!(out.contains("    continue;\n"), "{out}");
    assert!(out.contains("  break;\n"), "{out}");
    assert!(!out.contains("goto"), "{out}");
}

#[test]
fn foreach_with_if_else() {
    let mut a = Asm::new(V);
    a.op(Opcode::Iterator);
    a.op(Opcode::VirtualFunction).name(5).local(4).end_parms();
    let end = a.target();
    let skip = a.jump_if_not(1);
    a.set(2, true);
    let over = a.jump();
    a.land(skip);
    a.set(3, true);
    a.land(over);
    a.op(Opcode::IteratorNext);
    a.land(end);
    a.op(Opcode::IteratorPop);
    a.tail();
    let out = decompile(a);
    assert_eq!(
        out,
        "foreach AllActors(D) {\n\
         \x20 if(A) {\n\
         \x20   B = 1;\n\
         \x20 } else {\n\
         \x20   C = 1;\n\
         \x20 }\n\
         }\n"
    );
    assert!(!out.contains("continue"), "{out}");
}

#[test]
fn while_loop() {
    let mut a = Asm::new(V);
    let guard = a.here();
    let exit = a.jump_if_not(1);
    a.set(2, true);
    a.jump_to(guard);
    a.land(exit);
    a.tail();
    assert_eq!(decompile(a), "while(A) {\n  B = 1;\n}\n");
}

#[test]
fn do_until_loop() {
    let mut a = Asm::new(V);
    let top = a.here();
    a.set(2, true);
    a.op(Opcode::JumpIfNot).u16(top as u16).local(1);
    a.tail();
    assert_eq!(decompile(a), "do {\n  B = 1;\n} until(A);\n");
}

#[test]
fn do_until_next_line_braces() {
    let mut a = Asm::new(V);
    let top = a.here();
    a.set(2, true);
    a.op(Opcode::JumpIfNot).u16(top as u16).local(1);
    a.tail();
    let out = decompile_with(a, &MockSymbols::new(), DecompileOptions::default());
    assert_eq!(out, "do\n{\n\tB = 1;\n}\nuntil(A);\n");
}

#[test]
fn while_with_continue_and_break() {
    let mut a = Asm::new(V);
    let guard = a.here();
    let exit = a.jump_if_not(1);

    let skip_continue = a.jump_if_not(2);
    a.jump_to(guard);
    a.land(skip_continue);

    let skip_break = a.jump_if_not(3);
    let brk = a.jump();
    a.land(skip_break);

    a.set(2, true);
    a.jump_to(guard);
    a.land(exit);
    a.fix(brk, a.here());
    a.tail();

    assert_eq!(
        decompile(a),
        "while(A) {\n\
         \x20 if(B) {\n\
         \x20   continue;\n\
         \x20 }\n\
         \x20 if(C) {\n\
         \x20   break;\n\
         \x20 }\n\
         \x20 B = 1;\n\
         }\n"
    );
}

// --- tail handling ---

#[test]
fn implicit_return_kept_on_request() {
    let mut a = Asm::new(V);
    a.set(2, true);
    a.tail();
    let options = DecompileOptions {
        suppress_implicit_return: false,
        ..options()
    };
    assert_eq!(
        decompile_with(a, &MockSymbols::new(), options),
        "B = 1;\nreturn;\n"
    );
}

#[test]
fn initial_indent_applies_to_every_line() {
    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.tail();
    let options = DecompileOptions {
        initial_indent: 1,
        ..options()
    };
    assert_eq!(
        decompile_with(a, &MockSymbols::new(), options),
        "  if(A) {\n    B = 1;\n  }\n"
    );
}

#[test]
fn options_from_yaml_fill_defaults() {
    let options: DecompileOptions =
        serde_yaml::from_str("brace_style: SameLine\nindent: \"  \"\n").unwrap();
    assert!(options.suppress_implicit_return);
    assert_eq!(options.initial_indent, 0);

    let mut a = Asm::new(V);
    let skip = a.jump_if_not(1);
    a.set(2, true);
    a.land(skip);
    a.tail();
    assert_eq!(
        decompile_with(a, &MockSymbols::new(), options),
        "if(A) {\n  B = 1;\n}\n"
    );
}
