use bitflags::bitflags;

bitflags! {
    /// Function declaration flags as stored in packages.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        const FINAL = 0x0000_0001;
        const DEFINED = 0x0000_0002;
        const ITERATOR = 0x0000_0004;
        const LATENT = 0x0000_0008;
        const PRE_OPERATOR = 0x0000_0010;
        const SINGULAR = 0x0000_0020;
        const NET = 0x0000_0040;
        const NET_RELIABLE = 0x0000_0080;
        const SIMULATED = 0x0000_0100;
        const EXEC = 0x0000_0200;
        const NATIVE = 0x0000_0400;
        const EVENT = 0x0000_0800;
        const OPERATOR = 0x0000_1000;
        const STATIC = 0x0000_2000;
        const HAS_OPTIONAL_PARMS = 0x0000_4000;
        const CONST = 0x0000_8000;
        const PUBLIC = 0x0002_0000;
        const PRIVATE = 0x0004_0000;
        const PROTECTED = 0x0008_0000;
        const DELEGATE = 0x0010_0000;
    }
}

/// What kind of declaration an object reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectKind {
    Property,
    Function,
    Class,
    Struct,
    State,
    Enum,
    Const,
    #[default]
    Other,
}

/// Function metadata needed to choose a call rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionInfo {
    pub flags: FunctionFlags,
    /// Native ordinal, zero when the function is not bound to one.
    pub native_index: u16,
    /// Binary operator precedence.
    pub operator_precedence: u8,
}

impl FunctionInfo {
    pub fn is_operator(&self) -> bool {
        self.flags.contains(FunctionFlags::OPERATOR)
    }

    pub fn is_pre_operator(&self) -> bool {
        self.flags.contains(FunctionFlags::PRE_OPERATOR)
    }
}

/// A resolved object reference as supplied by the package layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectInfo {
    pub name: String,
    /// Name of the object's class, e.g. `IntProperty` or `Function`.
    pub class_name: String,
    /// Name of the enclosing object, e.g. the class owning a function.
    pub outer: Option<String>,
    pub kind: ObjectKind,
    pub function: Option<FunctionInfo>,
}

impl ObjectInfo {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            class_name: String::new(),
            outer: None,
            kind,
            function: None,
        }
    }

    pub fn with_outer(mut self, outer: &str) -> Self {
        self.outer = Some(outer.into());
        self
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_function(mut self, function: FunctionInfo) -> Self {
        self.function = Some(function);
        self
    }
}
