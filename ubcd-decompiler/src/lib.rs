//! Token deserialization and source reconstruction for UnrealScript-family
//! bytecode.
//!
//! A [`TokenStream`] decodes one function or state body into a tree of
//! [`ubcd_ir::Instruction`]s. A [`Decompiler`] walks the top-level
//! instructions once, rendering statements and reconstructing blocks from
//! jump geometry through the [`nest::NestManager`] and [`labels::LabelTable`].

pub(crate) mod consume;
pub mod context;
pub mod disasm;
pub mod driver;
pub mod error;
pub mod heuristics;
pub mod labels;
pub mod nest;
pub mod reader;
pub(crate) mod render;
pub mod stream;
pub mod symbols;

pub use context::{BraceStyle, DecompileContext, DecompileOptions};
pub use driver::Decompiler;
pub use error::{DecodeError, RenderError};
pub use stream::{Integrity, TokenStream};
pub use symbols::{NoSymbols, SymbolResolver};

use ubcd_isa::{NativeTable, OpcodeResolver};

/// Decode a body and render it in one go.
pub fn decompile_body(
    declaration: &str,
    code: Vec<u8>,
    declared_size: u32,
    resolver: &OpcodeResolver,
    natives: &dyn NativeTable,
    symbols: &dyn SymbolResolver,
    options: DecompileOptions,
) -> String {
    let mut stream = TokenStream::new(declaration, code, declared_size);
    stream.ensure_deserialized(resolver, natives, symbols);
    let mut ctx = DecompileContext::new(options);
    Decompiler::new(&stream, symbols, natives).decompile(&mut ctx)
}
