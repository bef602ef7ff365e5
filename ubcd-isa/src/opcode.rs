use std::fmt;

/// First code of the extended native band; the low nibble is the high byte
/// of a 16-bit native ordinal.
pub const EXTENDED_NATIVE: u8 = 0x60;

/// First code that directly addresses a native function by ordinal.
pub const FIRST_NATIVE: u8 = 0x70;

/// Sentinel `case` target marking the `default` label.
pub const DEFAULT_CASE_TARGET: u16 = 0xFFFF;

/// Instruction kind after opcode resolution.
///
/// Unit variants follow the canonical (newest) numbering listed in
/// [`CANONICAL`]; data-carrying variants cover kinds whose identity depends
/// on the code itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    LocalVariable,
    InstanceVariable,
    DefaultVariable,
    StateVariable,
    UndefinedVariable,
    Return,
    Switch,
    Jump,
    JumpIfNot,
    Stop,
    Assert,
    Case,
    Nothing,
    LabelTable,
    GotoLabel,
    EatReturnValue,
    Let,
    DynArrayElement,
    New,
    ClassContext,
    MetaCast,
    LetBool,
    EndParmValue,
    EndFunctionParms,
    SelfObject,
    Skip,
    Context,
    ArrayElement,
    VirtualFunction,
    FinalFunction,
    IntConst,
    FloatConst,
    StringConst,
    ObjectConst,
    NameConst,
    RotatorConst,
    VectorConst,
    ByteConst,
    IntZero,
    IntOne,
    True,
    False,
    NativeParm,
    NoObject,
    IntConstByte,
    BoolVariable,
    DynamicCast,
    Iterator,
    IteratorPop,
    IteratorNext,
    StructCmpEq,
    StructCmpNe,
    UnicodeStringConst,
    RangeConst,
    StructMember,
    DynArrayLength,
    GlobalFunction,
    PrimitiveCast,
    DynArrayInsert,
    ReturnNothing,
    EqualEqualDelDel,
    NotEqualDelDel,
    EqualEqualDelFunc,
    NotEqualDelFunc,
    EmptyDelegate,
    DynArrayRemove,
    DebugInfo,
    DelegateFunction,
    DelegateProperty,
    LetDelegate,
    Conditional,
    DynArrayFind,
    DynArrayFindStruct,
    LocalOutVariable,
    DefaultParmValue,
    EmptyParmValue,
    InstanceDelegate,
    InterfaceContext,
    InterfaceCast,
    EndOfScript,
    DynArrayAdd,
    DynArrayAddItem,
    DynArrayRemoveItem,
    DynArrayInsertItem,
    DynArrayIterator,
    DynArraySort,
    FilterEditorOnly,
    /// Standalone conversion token of the legacy layout; the code doubles as
    /// the cast code.
    LegacyCast(u8),
    /// Native function call whose ordinal resolved against a native table.
    NativeFunction(u16),
    /// Native function call no table knows about.
    UnresolvedNative(u16),
    /// Code unused or reserved for the format.
    Unknown(u8),
}

/// Canonical numbering: `(code, kind, name)`.
pub const CANONICAL: &[(u8, Opcode, &str)] = &[
    (0x00, Opcode::LocalVariable, "LocalVariable"),
    (0x01, Opcode::InstanceVariable, "InstanceVariable"),
    (0x02, Opcode::DefaultVariable, "DefaultVariable"),
    (0x03, Opcode::StateVariable, "StateVariable"),
    (0x04, Opcode::Return, "Return"),
    (0x05, Opcode::Switch, "Switch"),
    (0x06, Opcode::Jump, "Jump"),
    (0x07, Opcode::JumpIfNot, "JumpIfNot"),
    (0x08, Opcode::Stop, "Stop"),
    (0x09, Opcode::Assert, "Assert"),
    (0x0A, Opcode::Case, "Case"),
    (0x0B, Opcode::Nothing, "Nothing"),
    (0x0C, Opcode::LabelTable, "LabelTable"),
    (0x0D, Opcode::GotoLabel, "GotoLabel"),
    (0x0E, Opcode::EatReturnValue, "EatReturnValue"),
    (0x0F, Opcode::Let, "Let"),
    (0x10, Opcode::DynArrayElement, "DynArrayElement"),
    (0x11, Opcode::New, "New"),
    (0x12, Opcode::ClassContext, "ClassContext"),
    (0x13, Opcode::MetaCast, "MetaCast"),
    (0x14, Opcode::LetBool, "LetBool"),
    (0x15, Opcode::EndParmValue, "EndParmValue"),
    (0x16, Opcode::EndFunctionParms, "EndFunctionParms"),
    (0x17, Opcode::SelfObject, "Self"),
    (0x18, Opcode::Skip, "Skip"),
    (0x19, Opcode::Context, "Context"),
    (0x1A, Opcode::ArrayElement, "ArrayElement"),
    (0x1B, Opcode::VirtualFunction, "VirtualFunction"),
    (0x1C, Opcode::FinalFunction, "FinalFunction"),
    (0x1D, Opcode::IntConst, "IntConst"),
    (0x1E, Opcode::FloatConst, "FloatConst"),
    (0x1F, Opcode::StringConst, "StringConst"),
    (0x20, Opcode::ObjectConst, "ObjectConst"),
    (0x21, Opcode::NameConst, "NameConst"),
    (0x22, Opcode::RotatorConst, "RotatorConst"),
    (0x23, Opcode::VectorConst, "VectorConst"),
    (0x24, Opcode::ByteConst, "ByteConst"),
    (0x25, Opcode::IntZero, "IntZero"),
    (0x26, Opcode::IntOne, "IntOne"),
    (0x27, Opcode::True, "True"),
    (0x28, Opcode::False, "False"),
    (0x29, Opcode::NativeParm, "NativeParm"),
    (0x2A, Opcode::NoObject, "NoObject"),
    (0x2C, Opcode::IntConstByte, "IntConstByte"),
    (0x2D, Opcode::BoolVariable, "BoolVariable"),
    (0x2E, Opcode::DynamicCast, "DynamicCast"),
    (0x2F, Opcode::Iterator, "Iterator"),
    (0x30, Opcode::IteratorPop, "IteratorPop"),
    (0x31, Opcode::IteratorNext, "IteratorNext"),
    (0x32, Opcode::StructCmpEq, "StructCmpEq"),
    (0x33, Opcode::StructCmpNe, "StructCmpNe"),
    (0x34, Opcode::UnicodeStringConst, "UnicodeStringConst"),
    (0x35, Opcode::StructMember, "StructMember"),
    (0x36, Opcode::DynArrayLength, "DynArrayLength"),
    (0x37, Opcode::GlobalFunction, "GlobalFunction"),
    (0x38, Opcode::PrimitiveCast, "PrimitiveCast"),
    (0x39, Opcode::DynArrayInsert, "DynArrayInsert"),
    (0x3A, Opcode::ReturnNothing, "ReturnNothing"),
    (0x3B, Opcode::EqualEqualDelDel, "EqualEqual_DelDel"),
    (0x3C, Opcode::NotEqualDelDel, "NotEqual_DelDel"),
    (0x3D, Opcode::EqualEqualDelFunc, "EqualEqual_DelFunc"),
    (0x3E, Opcode::NotEqualDelFunc, "NotEqual_DelFunc"),
    (0x3F, Opcode::EmptyDelegate, "EmptyDelegate"),
    (0x40, Opcode::DynArrayRemove, "DynArrayRemove"),
    (0x41, Opcode::DebugInfo, "DebugInfo"),
    (0x42, Opcode::DelegateFunction, "DelegateFunction"),
    (0x43, Opcode::DelegateProperty, "DelegateProperty"),
    (0x44, Opcode::LetDelegate, "LetDelegate"),
    (0x45, Opcode::Conditional, "Conditional"),
    (0x46, Opcode::DynArrayFind, "DynArrayFind"),
    (0x47, Opcode::DynArrayFindStruct, "DynArrayFindStruct"),
    (0x48, Opcode::LocalOutVariable, "LocalOutVariable"),
    (0x49, Opcode::DefaultParmValue, "DefaultParmValue"),
    (0x4A, Opcode::EmptyParmValue, "EmptyParmValue"),
    (0x4B, Opcode::InstanceDelegate, "InstanceDelegate"),
    (0x51, Opcode::InterfaceContext, "InterfaceContext"),
    (0x52, Opcode::InterfaceCast, "InterfaceCast"),
    (0x53, Opcode::EndOfScript, "EndOfScript"),
    (0x54, Opcode::DynArrayAdd, "DynArrayAdd"),
    (0x55, Opcode::DynArrayAddItem, "DynArrayAddItem"),
    (0x56, Opcode::DynArrayRemoveItem, "DynArrayRemoveItem"),
    (0x57, Opcode::DynArrayInsertItem, "DynArrayInsertItem"),
    (0x58, Opcode::DynArrayIterator, "DynArrayIterator"),
    (0x59, Opcode::DynArraySort, "DynArraySort"),
    (0x5A, Opcode::FilterEditorOnly, "FilterEditorOnly"),
];

/// Kinds only reachable through era rules.
const NON_CANONICAL: &[(Opcode, &str)] = &[
    (Opcode::UndefinedVariable, "UndefinedVariable"),
    (Opcode::RangeConst, "RangeConst"),
];

impl Opcode {
    /// Kind at `code` in the canonical numbering.
    pub fn canonical(code: u8) -> Opcode {
        CANONICAL
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, op, _)| *op)
            .unwrap_or(Opcode::Unknown(code))
    }

    /// Canonical code of a unit kind, if it has one.
    pub fn canonical_code(&self) -> Option<u8> {
        CANONICAL
            .iter()
            .find(|(_, op, _)| op == self)
            .map(|(code, _, _)| *code)
    }

    /// Look up a unit kind by its listing name.
    pub fn from_name(name: &str) -> Option<Opcode> {
        CANONICAL
            .iter()
            .map(|(_, op, n)| (*op, *n))
            .chain(NON_CANONICAL.iter().copied())
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(op, _)| op)
    }

    /// Listing name.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::LegacyCast(_) => "LegacyCast",
            Opcode::NativeFunction(_) => "NativeFunction",
            Opcode::UnresolvedNative(_) => "UnresolvedNative",
            Opcode::Unknown(_) => "Unknown",
            op => CANONICAL
                .iter()
                .map(|(_, o, n)| (*o, *n))
                .chain(NON_CANONICAL.iter().copied())
                .find(|(o, _)| o == op)
                .map(|(_, n)| n)
                .unwrap_or("Unknown"),
        }
    }

    /// Kinds that carry a jump target in the code address space.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Opcode::Jump
                | Opcode::JumpIfNot
                | Opcode::Case
                | Opcode::Iterator
                | Opcode::DynArrayIterator
                | Opcode::FilterEditorOnly
        )
    }

    /// Kinds that never contribute to decompiled text.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Opcode::DebugInfo)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Opcode::NativeFunction(_) | Opcode::UnresolvedNative(_))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::LegacyCast(code) => write!(f, "LegacyCast({code:#04x})"),
            Opcode::NativeFunction(ordinal) => write!(f, "Native({ordinal})"),
            Opcode::UnresolvedNative(ordinal) => write!(f, "UnresolvedNative({ordinal})"),
            Opcode::Unknown(code) => write!(f, "Unknown({code:#04x})"),
            op => f.write_str(op.name()),
        }
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Cast code (the byte after `PrimitiveCast`, or a legacy cast token) that
/// converts an object to an interface and carries the interface class.
pub const CAST_OBJECT_TO_INTERFACE: u8 = 0x46;

/// Source-level type name a cast code converts to.
pub fn cast_type_name(cast: u8, legacy: bool) -> Option<&'static str> {
    let name = match cast {
        0x36 => "Object",
        0x37 => "string",
        0x38 => "bool",
        0x39 => "vector",
        0x3A => "int",
        0x3B => "bool",
        0x3C => "float",
        0x3D => "byte",
        0x3E => "bool",
        0x3F => "float",
        0x40 => "byte",
        0x41 => "int",
        0x42 => "float",
        0x43 => "byte",
        0x44 => "int",
        0x45 => "bool",
        0x46 if legacy => "name",
        0x47 | 0x48 => "bool",
        0x49 => "byte",
        0x4A => "int",
        0x4B => "bool",
        0x4C => "float",
        0x4D => "vector",
        0x4E => "rotator",
        0x4F => "bool",
        0x50 => "rotator",
        0x51 => "bool",
        0x52..=0x5A => "string",
        0x60 if !legacy => "name",
        _ => return None,
    };
    Some(name)
}
