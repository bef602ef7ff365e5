use ubcd_isa::DEFAULT_CASE_TARGET;

use crate::instruction::{Instruction, NameRef, ObjectRef};

/// Callee of a function call instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Dispatched by name on the context object.
    Virtual(NameRef),
    /// Bound to a specific function object.
    Final(ObjectRef),
    /// Dispatched by name, skipping state overrides.
    Global(NameRef),
    /// Call through a delegate property.
    Delegate {
        local: bool,
        property: ObjectRef,
        name: NameRef,
    },
    /// Engine builtin addressed by ordinal.
    Native(u16),
}

/// One `(name, position)` entry of a label table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEntry {
    pub name: NameRef,
    pub position: u32,
}

/// Kind-specific operand payload of an [`Instruction`].
///
/// Operands that are themselves expressions are nested instructions, in the
/// order they were serialized.
#[derive(Debug, Clone)]
pub enum Token {
    /// Opcodes with no operands (constants such as `true`, `none`, `self`,
    /// terminators, iterator bookkeeping).
    NoOperands,

    /// Local, instance, default, state, out and native-parameter references.
    Variable(ObjectRef),
    UndefinedVariable,
    BoolVariable(Box<Instruction>),
    InstanceDelegate(NameRef),
    DelegateProperty {
        name: NameRef,
        property: Option<ObjectRef>,
    },
    /// Default value statements of an optional parameter.
    DefaultParmValue {
        size: u16,
        statements: Vec<Instruction>,
    },

    IntConst(i32),
    FloatConst(f32),
    ByteConst(u8),
    StringConst(String),
    NameConst(NameRef),
    ObjectConst(ObjectRef),
    RotatorConst {
        pitch: i32,
        yaw: i32,
        roll: i32,
    },
    VectorConst {
        x: f32,
        y: f32,
        z: f32,
    },
    RangeConst {
        min: f32,
        max: f32,
    },

    Return(Box<Instruction>),
    ReturnNothing(ObjectRef),
    Jump {
        target: u16,
    },
    JumpIfNot {
        target: u16,
        condition: Box<Instruction>,
    },
    FilterEditorOnly {
        target: u16,
    },
    Switch {
        property: Option<ObjectRef>,
        size: u8,
        value: Box<Instruction>,
    },
    /// `target` is the next case, or [`DEFAULT_CASE_TARGET`] for `default`.
    Case {
        target: u16,
        value: Option<Box<Instruction>>,
    },
    Iterator {
        expr: Box<Instruction>,
        end: u16,
    },
    DynArrayIterator {
        array: Box<Instruction>,
        item: Box<Instruction>,
        with_index: bool,
        index: Box<Instruction>,
        end: u16,
    },
    GotoLabel(Box<Instruction>),
    LabelTable(Vec<LabelEntry>),
    Assert {
        line: u16,
        debug_mode: Option<u8>,
        condition: Box<Instruction>,
    },
    DebugInfo {
        version: i32,
        line: i32,
        column: i32,
        mode: u8,
    },

    /// `let`, `let bool` and `let delegate`.
    Let {
        target: Box<Instruction>,
        value: Box<Instruction>,
    },
    EatReturnValue {
        property: ObjectRef,
        expr: Box<Instruction>,
    },
    Skip {
        size: u16,
        expr: Box<Instruction>,
    },

    /// Object and class context: `object.member`.
    Context {
        object: Box<Instruction>,
        skip: u16,
        field: Option<ObjectRef>,
        field_size: u8,
        member: Box<Instruction>,
    },
    InterfaceContext(Box<Instruction>),
    StructMember {
        property: ObjectRef,
        struct_ref: Option<ObjectRef>,
        flags: Option<[u8; 2]>,
        object: Box<Instruction>,
    },
    ArrayElement {
        index: Box<Instruction>,
        array: Box<Instruction>,
    },
    DynArrayLength(Box<Instruction>),
    /// Dynamic array methods (`Insert`, `Remove`, `Add`, `AddItem`, ...).
    DynArrayMethod {
        array: Box<Instruction>,
        skip: Option<u16>,
        args: Vec<Instruction>,
    },

    Call {
        target: CallTarget,
        args: Vec<Instruction>,
    },

    /// Conversion by cast code; `interface` is set for object-to-interface.
    PrimitiveCast {
        cast: u8,
        interface: Option<ObjectRef>,
        expr: Box<Instruction>,
    },
    /// Dynamic, meta and interface casts.
    ClassCast {
        class: ObjectRef,
        expr: Box<Instruction>,
    },

    StructCmp {
        struct_ref: ObjectRef,
        lhs: Box<Instruction>,
        rhs: Box<Instruction>,
    },
    DelegateCmp {
        lhs: Box<Instruction>,
        rhs: Box<Instruction>,
    },
    Conditional {
        condition: Box<Instruction>,
        true_skip: u16,
        then: Box<Instruction>,
        false_skip: u16,
        otherwise: Box<Instruction>,
    },
    New {
        outer: Box<Instruction>,
        name: Box<Instruction>,
        flags: Box<Instruction>,
        class: Box<Instruction>,
        template: Option<Box<Instruction>>,
    },

    /// Opcode with no meaning for the format; carries no operands.
    Unknown,
}

impl Token {
    /// Jump target carried by control-flow tokens.
    pub fn jump_target(&self) -> Option<u16> {
        match self {
            Token::Jump { target }
            | Token::JumpIfNot { target, .. }
            | Token::FilterEditorOnly { target } => Some(*target),
            Token::Case { target, .. } if *target != DEFAULT_CASE_TARGET => Some(*target),
            Token::Iterator { end, .. } | Token::DynArrayIterator { end, .. } => Some(*end),
            _ => None,
        }
    }

    /// Nested operand instructions in serialization order.
    pub fn operands(&self) -> Vec<&Instruction> {
        match self {
            Token::BoolVariable(e)
            | Token::Return(e)
            | Token::GotoLabel(e)
            | Token::InterfaceContext(e)
            | Token::DynArrayLength(e) => vec![&**e],
            Token::DefaultParmValue { statements, .. } => statements.iter().collect(),
            Token::JumpIfNot { condition, .. } | Token::Assert { condition, .. } => {
                vec![&**condition]
            }
            Token::Switch { value, .. } => vec![&**value],
            Token::Case { value, .. } => value.iter().map(|v| v.as_ref()).collect(),
            Token::Iterator { expr, .. } => vec![&**expr],
            Token::DynArrayIterator {
                array, item, index, ..
            } => vec![&**array, &**item, &**index],
            Token::Let { target, value } => vec![&**target, &**value],
            Token::EatReturnValue { expr, .. } | Token::Skip { expr, .. } => vec![&**expr],
            Token::Context { object, member, .. } => vec![&**object, &**member],
            Token::StructMember { object, .. } => vec![&**object],
            Token::ArrayElement { index, array } => vec![&**index, &**array],
            Token::DynArrayMethod { array, args, .. } => {
                std::iter::once(array.as_ref()).chain(args.iter()).collect()
            }
            Token::Call { args, .. } => args.iter().collect(),
            Token::PrimitiveCast { expr, .. } | Token::ClassCast { expr, .. } => vec![&**expr],
            Token::StructCmp { lhs, rhs, .. } | Token::DelegateCmp { lhs, rhs } => vec![&**lhs, &**rhs],
            Token::Conditional {
                condition,
                then,
                otherwise,
                ..
            } => vec![&**condition, &**then, &**otherwise],
            Token::New {
                outer,
                name,
                flags,
                class,
                template,
            } => {
                let mut v: Vec<&Instruction> = vec![&**outer, &**name, &**flags, &**class];
                if let Some(t) = template {
                    v.push(&**t);
                }
                v
            }
            _ => Vec::new(),
        }
    }
}
