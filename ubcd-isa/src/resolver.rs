use crate::native::NativeTable;
use crate::opcode::{EXTENDED_NATIVE, FIRST_NATIVE, Opcode};
use crate::rules::{OpcodeRule, builtin_rules};
use crate::version::FormatVersion;

/// Per-format opcode lookup, built once from the rule table.
///
/// ```
/// use ubcd_isa::{FormatVersion, NoNatives, Opcode, OpcodeResolver};
///
/// let ue2 = OpcodeResolver::new(FormatVersion::new(120, 0));
/// assert_eq!(ue2.lookup(0x37), Opcode::DynArrayLength);
///
/// let ue3 = OpcodeResolver::new(FormatVersion::new(512, 0));
/// assert_eq!(ue3.lookup(0x37), Opcode::GlobalFunction);
/// assert_eq!(ue3.resolve(0xFF, None, &NoNatives), Opcode::UnresolvedNative(0xFF));
/// ```
#[derive(Clone, Debug)]
pub struct OpcodeResolver {
    format: FormatVersion,
    table: [Opcode; EXTENDED_NATIVE as usize],
}

impl OpcodeResolver {
    /// Resolver using the built-in era rules only.
    pub fn new(format: FormatVersion) -> Self {
        Self::with_rules(format, &[])
    }

    /// Resolver with engine-branch `overrides` applied after the era rules.
    pub fn with_rules(format: FormatVersion, overrides: &[OpcodeRule]) -> Self {
        let mut table = [Opcode::Unknown(0); EXTENDED_NATIVE as usize];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = Opcode::Unknown(code as u8);
        }
        for rule in builtin_rules().iter().chain(overrides) {
            if !rule.when.matches(&format) {
                continue;
            }
            for code in rule.first..=rule.last.min(EXTENDED_NATIVE - 1) {
                table[code as usize] = rule.apply(code);
            }
        }
        Self { format, table }
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    /// Kind of a single-byte, non-native code.
    pub fn lookup(&self, code: u8) -> Opcode {
        self.table
            .get(code as usize)
            .copied()
            .unwrap_or(Opcode::Unknown(code))
    }

    /// `first` heads an extended native call and needs one more byte.
    pub fn needs_extension(first: u8) -> bool {
        (EXTENDED_NATIVE..FIRST_NATIVE).contains(&first)
    }

    /// Native ordinal addressed by a code, if it is a native call code.
    pub fn native_ordinal(first: u8, extension: Option<u8>) -> Option<u16> {
        if first >= FIRST_NATIVE {
            Some(first as u16)
        } else if Self::needs_extension(first) {
            extension.map(|next| (((first - EXTENDED_NATIVE) as u16) << 8) | next as u16)
        } else {
            None
        }
    }

    /// Resolve an opcode, consulting `natives` for native call codes.
    ///
    /// Never fails: unmapped codes become [`Opcode::Unknown`] and natives no
    /// table knows become [`Opcode::UnresolvedNative`].
    pub fn resolve(&self, first: u8, extension: Option<u8>, natives: &dyn NativeTable) -> Opcode {
        if first < EXTENDED_NATIVE {
            return self.lookup(first);
        }
        match Self::native_ordinal(first, extension) {
            Some(ordinal) if natives.native(ordinal).is_some() => Opcode::NativeFunction(ordinal),
            Some(ordinal) => Opcode::UnresolvedNative(ordinal),
            None => Opcode::Unknown(first),
        }
    }

    /// Every non-native code with its kind, for listings.
    pub fn entries(&self) -> impl Iterator<Item = (u8, Opcode)> + '_ {
        self.table
            .iter()
            .enumerate()
            .map(|(code, op)| (code as u8, *op))
    }
}
