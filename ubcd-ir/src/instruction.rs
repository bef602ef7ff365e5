use ubcd_isa::Opcode;

use crate::token::Token;

/// Index into the package object tables: positive for exports, negative for
/// imports, zero for none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef(pub i32);

impl ObjectRef {
    pub const NONE: ObjectRef = ObjectRef(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Index into the package name table with its instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NameRef {
    pub index: i32,
    /// Instance number; zero when the format has none.
    pub number: i32,
}

impl NameRef {
    pub const fn new(index: i32, number: i32) -> Self {
        Self { index, number }
    }
}

/// A single decoded bytecode instruction.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Raw opcode: the first byte, or `first << 8 | next` for extended natives.
    pub raw: u16,
    /// Resolved kind.
    pub opcode: Opcode,
    /// Logical position, in the jump-target address space.
    pub position: u32,
    /// Logical size, including nested operand instructions.
    pub size: u32,
    /// Byte offset within the serialized blob.
    pub storage_position: u32,
    /// Serialized size in bytes.
    pub storage_size: u32,
    /// Kind-specific operands.
    pub token: Token,
}

impl Instruction {
    /// Logical position just past this instruction.
    pub fn end(&self) -> u32 {
        self.position + self.size
    }

    /// Jump target carried by control-flow instructions.
    pub fn jump_target(&self) -> Option<u32> {
        self.token.jump_target().map(u32::from)
    }

    /// Nested operand instructions in serialization order.
    pub fn children(&self) -> Vec<&Instruction> {
        self.token.operands()
    }

    /// Depth-first visit of this instruction and every nested operand.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Instruction, usize)) {
        fn go<'a>(insn: &'a Instruction, depth: usize, f: &mut dyn FnMut(&'a Instruction, usize)) {
            f(insn, depth);
            for child in insn.children() {
                go(child, depth + 1, f);
            }
        }
        go(self, 0, f);
    }
}
