//! Declarative opcode rules.
//!
//! Each format folds the rule list into a flat lookup (see
//! [`OpcodeResolver`](crate::OpcodeResolver)). Rules are applied in order and
//! the last matching rule for a code wins, so engine-branch overrides are
//! appended after the built-in era rules.

use serde::Deserialize;

use crate::error::RuleError;
use crate::opcode::{EXTENDED_NATIVE, Opcode};
use crate::version::{
    FormatVersion, VER_UE2_TOKEN_LAYOUT, VER_UE3_TOKEN_LAYOUT, VersionPredicate,
};

/// What a matching rule does with a code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleAction {
    /// Use the canonical kind at this code.
    Canonical,
    /// Use the canonical kind at `code + delta`.
    Shift(i8),
    /// Use a fixed kind.
    Kind(Opcode),
    /// Standalone conversion token; the code is the cast code.
    LegacyCast,
    /// The code has no meaning in this format.
    Unused,
}

/// Maps an inclusive code range to an action for formats matching `when`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeRule {
    pub first: u8,
    pub last: u8,
    pub when: VersionPredicate,
    pub action: RuleAction,
}

impl OpcodeRule {
    pub const fn new(first: u8, last: u8, when: VersionPredicate, action: RuleAction) -> Self {
        Self {
            first,
            last,
            when,
            action,
        }
    }

    pub fn applies(&self, code: u8, format: &FormatVersion) -> bool {
        code >= self.first && code <= self.last && self.when.matches(format)
    }

    /// Kind this rule assigns to `code`.
    pub fn apply(&self, code: u8) -> Opcode {
        match self.action {
            RuleAction::Canonical => Opcode::canonical(code),
            RuleAction::Shift(delta) => {
                let shifted = code as i16 + delta as i16;
                if (0..EXTENDED_NATIVE as i16).contains(&shifted) {
                    Opcode::canonical(shifted as u8)
                } else {
                    Opcode::Unknown(code)
                }
            }
            RuleAction::Kind(op) => op,
            RuleAction::LegacyCast => Opcode::LegacyCast(code),
            RuleAction::Unused => Opcode::Unknown(code),
        }
    }
}

/// Era rules shared by every engine branch.
pub fn builtin_rules() -> Vec<OpcodeRule> {
    use RuleAction::*;
    let pre_ue3 = VersionPredicate::below(VER_UE3_TOKEN_LAYOUT);
    let ue2 = VersionPredicate::between(VER_UE2_TOKEN_LAYOUT, VER_UE3_TOKEN_LAYOUT);
    let ue1 = VersionPredicate::below(VER_UE2_TOKEN_LAYOUT);

    vec![
        OpcodeRule::new(0x00, EXTENDED_NATIVE - 1, VersionPredicate::any(), Canonical),
        // Tokens introduced with the canonical layout.
        OpcodeRule::new(0x3A, EXTENDED_NATIVE - 1, pre_ue3, Unused),
        OpcodeRule::new(0x15, 0x15, pre_ue3, Unused),
        OpcodeRule::new(0x03, 0x03, pre_ue3, Kind(Opcode::UndefinedVariable)),
        // Struct member through primitive cast sit one code higher.
        OpcodeRule::new(0x35, 0x35, pre_ue3, Unused),
        OpcodeRule::new(0x36, 0x39, pre_ue3, Shift(-1)),
        OpcodeRule::new(0x40, 0x40, ue2, Kind(Opcode::DynArrayInsert)),
        OpcodeRule::new(0x41, 0x41, ue2, Kind(Opcode::DynArrayRemove)),
        OpcodeRule::new(0x42, 0x44, ue2, Canonical),
        // Legacy layout: no dynamic arrays, conversions are standalone tokens.
        OpcodeRule::new(0x10, 0x10, ue1, Unused),
        OpcodeRule::new(0x35, 0x35, ue1, Kind(Opcode::RangeConst)),
        OpcodeRule::new(0x37, 0x37, ue1, Unused),
        OpcodeRule::new(0x39, 0x59, ue1, LegacyCast),
    ]
}

/// One rule as written in an override document.
///
/// ```yaml
/// - first: 0x5B
///   min_version: 500
///   licensee: 42
///   opcode: DebugInfo
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub first: u8,
    #[serde(default)]
    pub last: Option<u8>,
    #[serde(default)]
    pub min_version: Option<u16>,
    #[serde(default)]
    pub max_version: Option<u16>,
    #[serde(default)]
    pub licensee: Option<u16>,
    #[serde(default)]
    pub opcode: Option<String>,
    #[serde(default)]
    pub shift: Option<i8>,
    #[serde(default)]
    pub legacy_cast: bool,
    #[serde(default)]
    pub unused: bool,
}

impl TryFrom<RuleDocument> for OpcodeRule {
    type Error = RuleError;

    fn try_from(doc: RuleDocument) -> Result<Self, Self::Error> {
        let last = doc.last.unwrap_or(doc.first);
        if last < doc.first || last >= EXTENDED_NATIVE {
            return Err(RuleError::InvalidRange(doc.first, last));
        }

        let mut actions = Vec::new();
        if let Some(name) = doc.opcode.as_deref() {
            let op = Opcode::from_name(name).ok_or_else(|| RuleError::UnknownOpcode(name.into()))?;
            actions.push(RuleAction::Kind(op));
        }
        if let Some(delta) = doc.shift {
            actions.push(RuleAction::Shift(delta));
        }
        if doc.legacy_cast {
            actions.push(RuleAction::LegacyCast);
        }
        if doc.unused {
            actions.push(RuleAction::Unused);
        }
        let action = match actions.as_slice() {
            [] => RuleAction::Canonical,
            [action] => *action,
            _ => return Err(RuleError::ConflictingActions(doc.first)),
        };

        Ok(OpcodeRule::new(
            doc.first,
            last,
            VersionPredicate {
                min_version: doc.min_version,
                max_version: doc.max_version,
                licensee: doc.licensee,
            },
            action,
        ))
    }
}

/// Parse a YAML list of override rules.
pub fn parse_rules(yaml: &str) -> Result<Vec<OpcodeRule>, RuleError> {
    let docs: Vec<RuleDocument> = serde_yaml::from_str(yaml)?;
    docs.into_iter().map(OpcodeRule::try_from).collect()
}
