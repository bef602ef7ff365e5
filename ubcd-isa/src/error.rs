use thiserror::Error;

/// Errors from loading rule and native-table documents.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid code range {0:#04x}..={1:#04x}")]
    InvalidRange(u8, u8),

    #[error("unknown opcode name: {0}")]
    UnknownOpcode(String),

    #[error("rule at {0:#04x} names more than one action")]
    ConflictingActions(u8),

    #[error("native ordinal {0} is outside the native range")]
    InvalidNativeOrdinal(u16),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
