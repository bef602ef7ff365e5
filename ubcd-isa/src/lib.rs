//! UnrealScript-family bytecode instruction set.
//!
//! This crate provides format version gates, the canonical opcode set, the
//! declarative per-era rule table and the resolver that turns raw opcode
//! bytes into instruction kinds for a given format.

pub mod error;
pub mod native;
pub mod opcode;
pub mod resolver;
pub mod rules;
pub mod version;

pub use error::RuleError;
pub use native::{
    ChainedNatives, MAX_NATIVE_ORDINAL, NativeFormat, NativeFunction, NativeTable, NativeTableMap,
    NoNatives,
};
pub use opcode::{
    CANONICAL, CAST_OBJECT_TO_INTERFACE, DEFAULT_CASE_TARGET, EXTENDED_NATIVE, FIRST_NATIVE,
    Opcode, cast_type_name,
};
pub use resolver::OpcodeResolver;
pub use rules::{OpcodeRule, RuleAction, RuleDocument, builtin_rules, parse_rules};
pub use version::*;
