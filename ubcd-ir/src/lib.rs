//! Decoded instruction model shared by the deserializer and the decompiler.

pub mod instruction;
pub mod symbols;
pub mod token;

pub use instruction::{Instruction, NameRef, ObjectRef};
pub use symbols::{FunctionFlags, FunctionInfo, ObjectInfo, ObjectKind};
pub use token::{CallTarget, LabelEntry, Token};
