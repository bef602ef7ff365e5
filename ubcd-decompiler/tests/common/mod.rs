#![allow(dead_code)]

use std::collections::HashMap;

use ubcd_decompiler::*;
use ubcd_ir::{FunctionFlags, FunctionInfo, NameRef, ObjectInfo, ObjectKind, ObjectRef};
use ubcd_isa::{FormatVersion, NativeFunction, NativeTableMap, Opcode, OpcodeResolver};

/// Placeholder for a jump target written before the target is known.
#[derive(Clone, Copy)]
pub struct Fixup(usize);

/// Writes bytecode for one format while tracking logical positions.
pub struct Asm {
    pub format: FormatVersion,
    pub bytes: Vec<u8>,
    pos: u32,
}

impl Asm {
    pub fn new(version: u16) -> Self {
        Self {
            format: FormatVersion::new(version, 0),
            bytes: Vec::new(),
            pos: 0,
        }
    }

    /// Logical position of the next instruction.
    pub fn here(&self) -> u32 {
        self.pos
    }

    pub fn byte(&mut self, b: u8) -> &mut Self {
        self.bytes.push(b);
        self.pos += 1;
        self
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        let code = op.canonical_code().unwrap();
        self.byte(code)
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self.pos += 2;
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self.pos += 4;
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self.pos += 4;
        self
    }

    pub fn name(&mut self, index: i32) -> &mut Self {
        self.bytes.extend_from_slice(&index.to_le_bytes());
        if self.format.has_name_number() {
            self.bytes.extend_from_slice(&0i32.to_le_bytes());
        }
        self.pos += self.format.name_width();
        self
    }

    pub fn object(&mut self, index: i32) -> &mut Self {
        self.bytes.extend_from_slice(&index.to_le_bytes());
        self.pos += self.format.object_width();
        self
    }

    /// Native call opcode, one byte or extended.
    pub fn native(&mut self, ordinal: u16) -> &mut Self {
        if ordinal >= 0x70 && ordinal <= 0xFF {
            self.byte(ordinal as u8)
        } else {
            self.byte(0x60 + (ordinal >> 8) as u8).byte(ordinal as u8)
        }
    }

    pub fn target(&mut self) -> Fixup {
        let at = self.bytes.len();
        self.u16(0);
        Fixup(at)
    }

    pub fn fix(&mut self, fixup: Fixup, target: u32) {
        self.bytes[fixup.0..fixup.0 + 2].copy_from_slice(&(target as u16).to_le_bytes());
    }

    /// Fix `fixup` to the current position.
    pub fn land(&mut self, fixup: Fixup) {
        let here = self.pos;
        self.fix(fixup, here);
    }

    // --- common shapes ---

    pub fn local(&mut self, object: i32) -> &mut Self {
        self.op(Opcode::LocalVariable).object(object)
    }

    pub fn int(&mut self, v: i32) -> &mut Self {
        self.op(Opcode::IntConst).i32(v)
    }

    pub fn end_parms(&mut self) -> &mut Self {
        self.op(Opcode::EndFunctionParms)
    }

    /// `local = IntOne` / `IntZero`.
    pub fn set(&mut self, object: i32, one: bool) -> &mut Self {
        self.op(Opcode::Let).local(object).op(if one {
            Opcode::IntOne
        } else {
            Opcode::IntZero
        })
    }

    pub fn jump(&mut self) -> Fixup {
        self.op(Opcode::Jump);
        self.target()
    }

    pub fn jump_to(&mut self, target: u32) -> &mut Self {
        self.op(Opcode::Jump).u16(target as u16)
    }

    /// `JumpIfNot` over a local variable condition.
    pub fn jump_if_not(&mut self, condition: i32) -> Fixup {
        self.op(Opcode::JumpIfNot);
        let f = self.target();
        self.local(condition);
        f
    }

    /// Compiler tail: `return;` and end of script.
    pub fn tail(&mut self) -> &mut Self {
        self.op(Opcode::Return)
            .op(Opcode::Nothing)
            .op(Opcode::EndOfScript)
    }

    pub fn into_stream(self) -> TokenStream {
        let size = self.pos;
        TokenStream::new("Pawn.Test", self.bytes, size)
    }
}

/// Package symbols for tests.
///
/// Names: 0 None, 1 Begin, 2 Touch, 3 Create, 4 Length, 5 AllActors,
/// 6 Timer. Objects: 1..=4 locals A..D, functions and classes from 10.
pub struct MockSymbols {
    names: Vec<&'static str>,
    objects: HashMap<i32, ObjectInfo>,
    natives: HashMap<u16, NativeFunction>,
}

impl MockSymbols {
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        for (i, n) in ["A", "B", "C", "D"].iter().enumerate() {
            objects.insert(
                i as i32 + 1,
                ObjectInfo::new(n, ObjectKind::Property).with_class("IntProperty"),
            );
        }
        let function = |name: &str, outer: &str, flags: FunctionFlags| {
            ObjectInfo::new(name, ObjectKind::Function)
                .with_class("Function")
                .with_outer(outer)
                .with_function(FunctionInfo {
                    flags,
                    ..Default::default()
                })
        };
        objects.insert(10, function("Touch", "Actor", FunctionFlags::DEFINED));
        objects.insert(11, function("Destroy", "Pawn", FunctionFlags::DEFINED));
        objects.insert(12, function("Died", "Actor", FunctionFlags::FINAL));
        objects.insert(
            13,
            ObjectInfo::new("Dot", ObjectKind::Function)
                .with_outer("Object")
                .with_function(FunctionInfo {
                    flags: FunctionFlags::OPERATOR | FunctionFlags::FINAL,
                    native_index: 0,
                    operator_precedence: 16,
                }),
        );
        objects.insert(
            20,
            ObjectInfo::new("GameInfo", ObjectKind::Class).with_class("Class"),
        );
        Self {
            names: vec!["None", "Begin", "Touch", "Create", "Length", "AllActors", "Timer"],
            objects,
            natives: HashMap::new(),
        }
    }

    pub fn declare_native(&mut self, ordinal: u16, function: NativeFunction) {
        self.natives.insert(ordinal, function);
    }
}

impl SymbolResolver for MockSymbols {
    fn name(&self, name: NameRef) -> Option<String> {
        self.names.get(name.index as usize).map(|s| s.to_string())
    }

    fn object(&self, object: ObjectRef) -> Option<ObjectInfo> {
        self.objects.get(&object.0).cloned()
    }

    fn native_function(&self, ordinal: u16) -> Option<NativeFunction> {
        self.natives.get(&ordinal).cloned()
    }
}

/// Compact options so expected text stays readable.
pub fn options() -> DecompileOptions {
    DecompileOptions {
        brace_style: BraceStyle::SameLine,
        indent: "  ".into(),
        ..Default::default()
    }
}

pub fn deserialize(asm: Asm, symbols: &MockSymbols) -> TokenStream {
    let resolver = OpcodeResolver::new(asm.format);
    let mut stream = asm.into_stream();
    stream.ensure_deserialized(&resolver, &NativeTableMap::core(), symbols);
    stream
}

pub fn decompile_with(asm: Asm, symbols: &MockSymbols, options: DecompileOptions) -> String {
    let stream = deserialize(asm, symbols);
    let natives = NativeTableMap::core();
    let mut ctx = DecompileContext::new(options);
    Decompiler::new(&stream, symbols, &natives)
        .with_owner_class("Pawn")
        .decompile(&mut ctx)
}

pub fn decompile(asm: Asm) -> String {
    decompile_with(asm, &MockSymbols::new(), options())
}
