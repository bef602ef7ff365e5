use std::fmt;

/// Below this version the legacy token layout is used: a range constant at
/// `0x35` and standalone conversion tokens in `0x39..=0x59`.
pub const VER_UE2_TOKEN_LAYOUT: u16 = 100;

/// Below this version name and object indices are stored as compact indices.
pub const VER_COMPACT_INDEX_DEPRECATED: u16 = 178;

/// Below this version `0x36..=0x39` sit one above their canonical numbers.
pub const VER_UE3_TOKEN_LAYOUT: u16 = 180;

/// `new` expressions carry a trailing template operand.
pub const VER_NEW_TEMPLATE: u16 = 190;

/// Struct member access carries the owning struct reference.
pub const VER_STRUCT_MEMBER_STRUCT_REF: u16 = 224;

/// Delegate calls carry a leading "local delegate" byte.
pub const VER_DELEGATE_FUNCTION_LOCAL: u16 = 281;

/// Name references gain a 4-byte number suffix.
pub const VER_NAME_NUMBER: u16 = 343;

/// `assert` carries a debug-mode byte after its line number.
pub const VER_ASSERT_DEBUG_MODE: u16 = 470;

/// Delegate property references carry the property object after the name.
pub const VER_DELEGATE_PROPERTY_REF: u16 = 479;

/// Struct member access carries two trailing flag bytes.
pub const VER_STRUCT_MEMBER_FLAGS: u16 = 518;

/// `switch` carries the switched property reference before its size byte.
pub const VER_SWITCH_PROPERTY_REF: u16 = 536;

/// Object references take 8 bytes in the jump-target address space.
pub const VER_SCRIPT_POINTER_64: u16 = 587;

/// Dynamic array insert/remove/add end with an explicit parameter terminator.
pub const VER_DYNARRAY_PARMS_TERMINATOR: u16 = 648;

/// Package format version of a bytecode blob (`version`, `licensee`).
///
/// ```
/// use ubcd_isa::FormatVersion;
///
/// let v = FormatVersion::new(512, 0);
/// assert_eq!(v.name_width(), 8);
/// assert_eq!(v.object_width(), 4);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FormatVersion {
    version: u16,
    licensee: u16,
}

impl FormatVersion {
    #[inline]
    pub const fn new(version: u16, licensee: u16) -> Self {
        Self { version, licensee }
    }

    /// Engine file format version.
    #[inline]
    pub const fn version(&self) -> u16 {
        self.version
    }

    /// Licensee (engine branch) version; 0 for stock builds.
    #[inline]
    pub const fn licensee(&self) -> u16 {
        self.licensee
    }

    #[inline]
    pub const fn at_least(&self, version: u16) -> bool {
        self.version >= version
    }

    /// Indices are stored as compact indices rather than 4-byte integers.
    #[inline]
    pub const fn uses_compact_index(&self) -> bool {
        self.version < VER_COMPACT_INDEX_DEPRECATED
    }

    /// Name references carry a number suffix.
    #[inline]
    pub const fn has_name_number(&self) -> bool {
        self.version >= VER_NAME_NUMBER
    }

    /// Logical width of a name reference operand.
    #[inline]
    pub const fn name_width(&self) -> u32 {
        if self.has_name_number() { 8 } else { 4 }
    }

    /// Logical width of an object reference operand.
    #[inline]
    pub const fn object_width(&self) -> u32 {
        if self.version >= VER_SCRIPT_POINTER_64 { 8 } else { 4 }
    }

    /// Short era label, used by listings.
    pub fn era(&self) -> &'static str {
        if self.version < VER_UE2_TOKEN_LAYOUT {
            "ue1"
        } else if self.version < VER_UE3_TOKEN_LAYOUT {
            "ue2"
        } else {
            "ue3"
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.version, self.licensee)
    }
}

impl fmt::Debug for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatVersion({self})")
    }
}

impl From<(u16, u16)> for FormatVersion {
    fn from((version, licensee): (u16, u16)) -> Self {
        Self::new(version, licensee)
    }
}

/// A version window a rule applies to.
///
/// `max_version` is exclusive; `licensee`, when set, must match exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct VersionPredicate {
    pub min_version: Option<u16>,
    pub max_version: Option<u16>,
    pub licensee: Option<u16>,
}

impl VersionPredicate {
    /// Matches every format.
    pub const fn any() -> Self {
        Self {
            min_version: None,
            max_version: None,
            licensee: None,
        }
    }

    pub const fn below(version: u16) -> Self {
        Self {
            min_version: None,
            max_version: Some(version),
            licensee: None,
        }
    }

    pub const fn at_least(version: u16) -> Self {
        Self {
            min_version: Some(version),
            max_version: None,
            licensee: None,
        }
    }

    pub const fn between(min: u16, max: u16) -> Self {
        Self {
            min_version: Some(min),
            max_version: Some(max),
            licensee: None,
        }
    }

    pub const fn for_licensee(mut self, licensee: u16) -> Self {
        self.licensee = Some(licensee);
        self
    }

    pub fn matches(&self, format: &FormatVersion) -> bool {
        if let Some(min) = self.min_version {
            if format.version() < min {
                return false;
            }
        }
        if let Some(max) = self.max_version {
            if format.version() >= max {
                return false;
            }
        }
        match self.licensee {
            Some(licensee) => format.licensee() == licensee,
            None => true,
        }
    }
}
