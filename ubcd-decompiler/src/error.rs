use thiserror::Error;
use ubcd_ir::ObjectRef;
use ubcd_isa::Opcode;

/// Failure while consuming an instruction's operands.
///
/// Offsets are storage offsets within the blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of code at {offset:#06x} (wanted {wanted} bytes)")]
    Truncated { offset: u32, wanted: usize },

    #[error("unterminated string at {offset:#06x}")]
    UnterminatedString { offset: u32 },

    #[error("invalid compact index at {offset:#06x}")]
    InvalidCompactIndex { offset: u32 },

    #[error("operands nested too deeply at {offset:#06x}")]
    NestingTooDeep { offset: u32 },
}

/// Failure while rendering one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("function object {0:?} could not be resolved")]
    UnresolvedFunction(ObjectRef),

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("{0} cannot appear here")]
    UnexpectedToken(Opcode),

    #[error("case outside of a switch")]
    MissingSwitch,

    #[error("no instruction at {0:#06x}")]
    NoTokenAt(u32),
}

impl RenderError {
    /// Stable name used in inline diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::UnresolvedFunction(_) => "UnresolvedFunction",
            RenderError::NotAFunction(_) => "NotAFunction",
            RenderError::UnexpectedToken(_) => "UnexpectedToken",
            RenderError::MissingSwitch => "MissingSwitch",
            RenderError::NoTokenAt(_) => "NoTokenAt",
        }
    }
}
