//! Native function tables keyed by ordinal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Largest ordinal addressable by the extended native band.
pub const MAX_NATIVE_ORDINAL: u16 = 0x0FFF;

/// How a native function call is written in source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NativeFormat {
    #[default]
    Function,
    Operator,
    PreOperator,
    PostOperator,
}

/// Metadata for one native function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeFunction {
    pub name: String,
    #[serde(default)]
    pub format: NativeFormat,
    /// Binary operator precedence; larger binds looser.
    #[serde(default)]
    pub precedence: u8,
}

impl NativeFunction {
    pub fn function(name: &str) -> Self {
        Self {
            name: name.into(),
            format: NativeFormat::Function,
            precedence: 0,
        }
    }

    pub fn operator(name: &str, precedence: u8) -> Self {
        Self {
            name: name.into(),
            format: NativeFormat::Operator,
            precedence,
        }
    }

    pub fn pre_operator(name: &str) -> Self {
        Self {
            name: name.into(),
            format: NativeFormat::PreOperator,
            precedence: 0,
        }
    }

    pub fn post_operator(name: &str) -> Self {
        Self {
            name: name.into(),
            format: NativeFormat::PostOperator,
            precedence: 0,
        }
    }
}

/// Resolves native ordinals to function metadata.
pub trait NativeTable {
    fn native(&self, ordinal: u16) -> Option<NativeFunction>;
}

/// Table that knows no natives.
pub struct NoNatives;

impl NativeTable for NoNatives {
    fn native(&self, _ordinal: u16) -> Option<NativeFunction> {
        None
    }
}

/// Consults `primary` first, then `fallback`.
pub struct ChainedNatives<'a> {
    pub primary: &'a dyn NativeTable,
    pub fallback: &'a dyn NativeTable,
}

impl NativeTable for ChainedNatives<'_> {
    fn native(&self, ordinal: u16) -> Option<NativeFunction> {
        self.primary
            .native(ordinal)
            .or_else(|| self.fallback.native(ordinal))
    }
}

/// An explicit ordinal → function table.
///
/// ```yaml
/// 112: { name: "$", format: Operator, precedence: 40 }
/// 129: { name: "!", format: PreOperator }
/// 167: { name: Rand }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeTableMap {
    entries: BTreeMap<u16, NativeFunction>,
}

impl NativeTableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Core operator and math natives shared by every engine generation.
    pub fn core() -> Self {
        let mut t = Self::new();
        t.insert(112, NativeFunction::operator("$", 40));
        t.insert(129, NativeFunction::pre_operator("!"));
        t.insert(130, NativeFunction::operator("&&", 30));
        t.insert(131, NativeFunction::operator("^^", 30));
        t.insert(132, NativeFunction::operator("||", 32));
        t.insert(133, NativeFunction::operator("*=", 34));
        t.insert(134, NativeFunction::operator("/=", 34));
        t.insert(135, NativeFunction::operator("+=", 34));
        t.insert(136, NativeFunction::operator("-=", 34));
        t.insert(137, NativeFunction::pre_operator("++"));
        t.insert(138, NativeFunction::pre_operator("--"));
        t.insert(139, NativeFunction::post_operator("++"));
        t.insert(140, NativeFunction::post_operator("--"));
        t.insert(141, NativeFunction::pre_operator("~"));
        t.insert(143, NativeFunction::pre_operator("-"));
        t.insert(144, NativeFunction::operator("*", 16));
        t.insert(145, NativeFunction::operator("/", 16));
        t.insert(146, NativeFunction::operator("+", 20));
        t.insert(147, NativeFunction::operator("-", 20));
        t.insert(148, NativeFunction::operator("<<", 22));
        t.insert(149, NativeFunction::operator(">>", 22));
        t.insert(150, NativeFunction::operator("<", 24));
        t.insert(151, NativeFunction::operator(">", 24));
        t.insert(152, NativeFunction::operator("<=", 24));
        t.insert(153, NativeFunction::operator(">=", 24));
        t.insert(154, NativeFunction::operator("==", 24));
        t.insert(155, NativeFunction::operator("!=", 26));
        t.insert(156, NativeFunction::operator("&", 28));
        t.insert(157, NativeFunction::operator("^", 28));
        t.insert(158, NativeFunction::operator("|", 28));
        t.insert(159, NativeFunction::operator("*=", 34));
        t.insert(160, NativeFunction::operator("/=", 34));
        t.insert(161, NativeFunction::operator("+=", 34));
        t.insert(162, NativeFunction::operator("-=", 34));
        t.insert(163, NativeFunction::pre_operator("++"));
        t.insert(164, NativeFunction::pre_operator("--"));
        t.insert(165, NativeFunction::post_operator("++"));
        t.insert(166, NativeFunction::post_operator("--"));
        t.insert(167, NativeFunction::function("Rand"));
        t.insert(168, NativeFunction::operator("@", 40));
        t.insert(169, NativeFunction::pre_operator("-"));
        t.insert(170, NativeFunction::operator("**", 12));
        t.insert(171, NativeFunction::operator("*", 16));
        t.insert(172, NativeFunction::operator("/", 16));
        t.insert(173, NativeFunction::operator("%", 18));
        t.insert(174, NativeFunction::operator("+", 20));
        t.insert(175, NativeFunction::operator("-", 20));
        t.insert(176, NativeFunction::operator("<", 24));
        t.insert(177, NativeFunction::operator(">", 24));
        t.insert(178, NativeFunction::operator("<=", 24));
        t.insert(179, NativeFunction::operator(">=", 24));
        t.insert(180, NativeFunction::operator("==", 24));
        t.insert(181, NativeFunction::operator("!=", 26));
        t.insert(182, NativeFunction::operator("*=", 34));
        t.insert(183, NativeFunction::operator("/=", 34));
        t.insert(184, NativeFunction::operator("+=", 34));
        t.insert(185, NativeFunction::operator("-=", 34));
        t.insert(186, NativeFunction::function("Abs"));
        t.insert(187, NativeFunction::function("Sin"));
        t.insert(188, NativeFunction::function("Cos"));
        t.insert(189, NativeFunction::function("Tan"));
        t.insert(190, NativeFunction::function("Atan"));
        t.insert(191, NativeFunction::function("Exp"));
        t.insert(192, NativeFunction::function("Loge"));
        t.insert(193, NativeFunction::function("Sqrt"));
        t.insert(194, NativeFunction::function("Square"));
        t.insert(195, NativeFunction::function("FRand"));
        t.insert(196, NativeFunction::operator(">>>", 22));
        t.insert(242, NativeFunction::operator("==", 24));
        t.insert(243, NativeFunction::operator("!=", 26));
        t
    }

    pub fn insert(&mut self, ordinal: u16, function: NativeFunction) {
        self.entries.insert(ordinal, function);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` on top of this table.
    pub fn merge(&mut self, other: NativeTableMap) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &NativeFunction)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Parse a YAML ordinal map.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleError> {
        let table: NativeTableMap = serde_yaml::from_str(yaml)?;
        if let Some((&ordinal, _)) = table
            .entries
            .iter()
            .find(|(ordinal, _)| **ordinal > MAX_NATIVE_ORDINAL)
        {
            return Err(RuleError::InvalidNativeOrdinal(ordinal));
        }
        Ok(table)
    }
}

impl NativeTable for NativeTableMap {
    fn native(&self, ordinal: u16) -> Option<NativeFunction> {
        self.entries.get(&ordinal).cloned()
    }
}
