use ubcd_ir::{Instruction, NameRef, ObjectRef};
use ubcd_isa::{ChainedNatives, FormatVersion, NativeTable, Opcode, OpcodeResolver};

use crate::consume::consume;
use crate::error::DecodeError;
use crate::reader::ByteReader;
use crate::symbols::{DeclaredNatives, SymbolResolver};

/// Maximum operand nesting before a blob is treated as malformed.
pub const MAX_NESTING: usize = 256;

/// Declared versus consumed logical size of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Integrity {
    pub declared: u32,
    pub consumed: u32,
}

impl Integrity {
    pub fn is_intact(&self) -> bool {
        self.declared == self.consumed
    }
}

/// The decoded instruction sequence of one function or state body.
///
/// Deserialization runs once; later calls to
/// [`ensure_deserialized`](Self::ensure_deserialized) return the memoized
/// sequence.
pub struct TokenStream {
    declaration: String,
    code: Vec<u8>,
    declared_size: u32,
    format: FormatVersion,
    tokens: Vec<Instruction>,
    deserialized: bool,
    failure: Option<DecodeError>,
    integrity: Integrity,
    cursor: usize,
}

impl TokenStream {
    /// `declared_size` is the blob's size in the logical address space.
    pub fn new(declaration: impl Into<String>, code: Vec<u8>, declared_size: u32) -> Self {
        Self {
            declaration: declaration.into(),
            code,
            declared_size,
            format: FormatVersion::default(),
            tokens: Vec::new(),
            deserialized: false,
            failure: None,
            integrity: Integrity {
                declared: declared_size,
                consumed: 0,
            },
            cursor: 0,
        }
    }

    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    /// Format the stream was decoded with.
    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn is_deserialized(&self) -> bool {
        self.deserialized
    }

    /// Decode the blob if that has not happened yet.
    ///
    /// Operand decode failures stop decoding of this blob only; the tokens
    /// decoded so far are kept and the failure is available from
    /// [`failure`](Self::failure).
    pub fn ensure_deserialized(
        &mut self,
        resolver: &OpcodeResolver,
        natives: &dyn NativeTable,
        symbols: &dyn SymbolResolver,
    ) -> &[Instruction] {
        if self.deserialized {
            return &self.tokens;
        }
        self.deserialized = true;
        self.format = resolver.format();

        let declared = DeclaredNatives(symbols);
        let chain = ChainedNatives {
            primary: natives,
            fallback: &declared,
        };
        let mut d = Decoder::new(&self.code, resolver, &chain, symbols);
        while d.position < self.declared_size && d.reader.remaining() > 0 {
            let start = d.position;
            let storage = d.reader.offset();
            match d.read_instruction() {
                Ok(insn) => {
                    log::trace!(
                        "ubcd_decompiler::stream: {} {:#06x} {}",
                        self.declaration,
                        insn.position,
                        insn.opcode
                    );
                    self.tokens.push(insn);
                }
                Err(e) => {
                    log::warn!(
                        "ubcd_decompiler::stream: {}: decode aborted at {start:#06x} (storage {storage:#06x}): {e}",
                        self.declaration
                    );
                    self.failure = Some(e);
                    break;
                }
            }
        }

        self.integrity.consumed = self.tokens.last().map(|t| t.end()).unwrap_or(0);
        if !self.integrity.is_intact() {
            log::warn!(
                "ubcd_decompiler::stream: {}: declared size {:#06x} but consumed {:#06x}",
                self.declaration,
                self.integrity.declared,
                self.integrity.consumed
            );
        }
        log::debug!(
            "ubcd_decompiler::stream: {}: {} tokens, {:#06x} bytes",
            self.declaration,
            self.tokens.len(),
            self.integrity.consumed
        );
        &self.tokens
    }

    /// Top-level instructions, empty until deserialized.
    pub fn tokens(&self) -> &[Instruction] {
        &self.tokens
    }

    pub fn integrity(&self) -> Integrity {
        self.integrity
    }

    /// Why decoding stopped early, if it did.
    pub fn failure(&self) -> Option<&DecodeError> {
        self.failure.as_ref()
    }

    /// Index of the top-level instruction starting at `position`.
    pub fn index_of(&self, position: u32) -> Option<usize> {
        self.tokens
            .binary_search_by_key(&position, |t| t.position)
            .ok()
    }

    /// Top-level instruction starting at `position`.
    pub fn token_at(&self, position: u32) -> Option<&Instruction> {
        self.index_of(position).map(|i| &self.tokens[i])
    }

    /// Move the cursor to the instruction at `position`.
    pub fn seek(&mut self, position: u32) -> Option<&Instruction> {
        let index = self.index_of(position)?;
        self.cursor = index;
        self.tokens.get(index)
    }

    /// Next meaningful instruction at the cursor, skipping debug-only ones.
    pub fn next_token(&mut self) -> Option<&Instruction> {
        while let Some(t) = self.tokens.get(self.cursor) {
            self.cursor += 1;
            if !t.opcode.is_hidden() {
                return self.tokens.get(self.cursor - 1);
            }
        }
        None
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// Reads instructions while tracking both address spaces.
pub(crate) struct Decoder<'a> {
    pub(crate) reader: ByteReader<'a>,
    resolver: &'a OpcodeResolver,
    natives: &'a dyn NativeTable,
    pub(crate) symbols: &'a dyn SymbolResolver,
    /// Logical position of the next byte.
    pub(crate) position: u32,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(
        code: &'a [u8],
        resolver: &'a OpcodeResolver,
        natives: &'a dyn NativeTable,
        symbols: &'a dyn SymbolResolver,
    ) -> Self {
        Self {
            reader: ByteReader::new(code),
            resolver,
            natives,
            symbols,
            position: 0,
            depth: 0,
        }
    }

    pub(crate) fn format(&self) -> FormatVersion {
        self.resolver.format()
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let v = self.reader.get_u8()?;
        self.position += 1;
        Ok(v)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let v = self.reader.get_u16()?;
        self.position += 2;
        Ok(v)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let v = self.reader.get_u32()?;
        self.position += 4;
        Ok(v)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let v = self.reader.get_i32()?;
        self.position += 4;
        Ok(v)
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let v = self.reader.get_f32()?;
        self.position += 4;
        Ok(v)
    }

    pub(crate) fn read_ansi_string(&mut self) -> Result<String, DecodeError> {
        let (s, n) = self.reader.get_ansi_string()?;
        self.position += n as u32;
        Ok(s)
    }

    pub(crate) fn read_wide_string(&mut self) -> Result<String, DecodeError> {
        let (s, n) = self.reader.get_wide_string()?;
        self.position += n as u32;
        Ok(s)
    }

    /// Advance the logical position by one name reference.
    pub(crate) fn align_name_size(&mut self) {
        self.position += self.format().name_width();
    }

    /// Advance the logical position by one object reference.
    pub(crate) fn align_object_size(&mut self) {
        self.position += self.format().object_width();
    }

    fn read_index(&mut self) -> Result<i32, DecodeError> {
        if self.format().uses_compact_index() {
            self.reader.get_compact_index()
        } else {
            self.reader.get_i32()
        }
    }

    pub(crate) fn read_name(&mut self) -> Result<NameRef, DecodeError> {
        let index = self.read_index()?;
        let number = if self.format().has_name_number() {
            self.reader.get_i32()?
        } else {
            0
        };
        self.align_name_size();
        Ok(NameRef::new(index, number))
    }

    pub(crate) fn read_object(&mut self) -> Result<ObjectRef, DecodeError> {
        let index = self.read_index()?;
        self.align_object_size();
        Ok(ObjectRef(index))
    }

    /// Kind of the next instruction without consuming it.
    pub(crate) fn peek_opcode(&self) -> Option<Opcode> {
        self.reader
            .peek_u8()
            .map(|b| self.resolver.resolve(b, None, self.natives))
    }

    /// Read one instruction and everything it nests.
    pub(crate) fn read_instruction(&mut self) -> Result<Instruction, DecodeError> {
        let position = self.position;
        let storage_position = self.reader.offset();
        if self.depth >= MAX_NESTING {
            return Err(DecodeError::NestingTooDeep {
                offset: storage_position,
            });
        }

        let first = self.read_u8()?;
        let (extension, raw) = if OpcodeResolver::needs_extension(first) {
            let next = self.read_u8()?;
            (Some(next), (first as u16) << 8 | next as u16)
        } else {
            (None, first as u16)
        };
        let opcode = self.resolver.resolve(first, extension, self.natives);
        if let Opcode::Unknown(code) = opcode {
            log::warn!(
                "ubcd_decompiler::stream: unknown opcode {code:#04x} at {position:#06x} for format {}",
                self.format()
            );
        }

        self.depth += 1;
        let token = consume(self, opcode);
        self.depth -= 1;
        let token = token?;

        Ok(Instruction {
            raw,
            opcode,
            position,
            size: self.position - position,
            storage_position,
            storage_size: self.reader.offset() - storage_position,
            token,
        })
    }

    /// Next meaningful operand, consuming any debug-only instructions first.
    pub(crate) fn read_expr(&mut self) -> Result<Instruction, DecodeError> {
        while self.peek_opcode().is_some_and(|op| op.is_hidden()) {
            self.read_instruction()?;
        }
        self.read_instruction()
    }

    pub(crate) fn read_boxed(&mut self) -> Result<Box<Instruction>, DecodeError> {
        self.read_expr().map(Box::new)
    }

    /// Operands up to and including `stop`; the terminator is not returned.
    pub(crate) fn read_until(&mut self, stop: Opcode) -> Result<Vec<Instruction>, DecodeError> {
        let mut items = Vec::new();
        loop {
            let insn = self.read_expr()?;
            if insn.opcode == stop {
                return Ok(items);
            }
            items.push(insn);
        }
    }

    /// Consume an end-of-parameters marker if one follows.
    pub(crate) fn skip_terminator(&mut self) -> Result<(), DecodeError> {
        if self.peek_opcode() == Some(Opcode::EndFunctionParms) {
            self.read_instruction()?;
        }
        Ok(())
    }
}
