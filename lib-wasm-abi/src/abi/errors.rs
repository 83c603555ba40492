//! ABI serializer errors.
//!
//! One variant per failure class so callers can react to the class without
//! parsing messages: schema faults reject the ABI at load, transcoding
//! faults abort the call, and resource faults (stream, array size, deadline)
//! bound adversarial input. `Context` nests any of them to record the type
//! and field being processed when the failure surfaced; `root_cause()`
//! unwraps the chain back to the originating class.

use thiserror::Error;

/// Result type for all ABI operations.
pub type AbiResult<T> = Result<T, AbiError>;

#[derive(Error, Debug)]
pub enum AbiError {
    // =========================================================================
    // Schema faults (reject the ABI at load)
    // =========================================================================
    #[error("ABI has an unsupported version: '{0}'")]
    UnsupportedAbiVersion(String),

    #[error("Duplicate {kind} definition detected: '{name}'")]
    DuplicateAbiDef { kind: &'static str, name: String },

    #[error("Invalid type inside ABI: {0}")]
    InvalidTypeInsideAbi(String),

    #[error("Circular reference in type '{0}'")]
    AbiCircularDef(String),

    #[error("Circular reference in struct '{0}'")]
    CircularReferenceInStruct(String),

    // =========================================================================
    // Transcoding faults (abort the call)
    // =========================================================================
    #[error("Unable to unpack: {0}")]
    Unpack(String),

    #[error("Invalid {kind} literal: '{text}'")]
    InvalidValue { kind: &'static str, text: String },

    // =========================================================================
    // Resource faults
    // =========================================================================
    #[error("Array size {size} exceeds maximum {max}")]
    ArraySizeExceeds { size: u32, max: u32 },

    #[error("Serialization time limit {limit_us}us exceeded")]
    DeadlineExceeded { limit_us: u128 },

    #[error("Stream overflow: needed {want} bytes, {available} available")]
    StreamOverflow { want: usize, available: usize },

    // =========================================================================
    // Context chain
    // =========================================================================
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AbiError>,
    },
}

impl AbiError {
    /// Wrap this error with the type or field being processed.
    pub fn context(self, context: impl Into<String>) -> AbiError {
        AbiError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap context frames back to the originating error.
    pub fn root_cause(&self) -> &AbiError {
        match self {
            AbiError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chain_preserves_root() {
        let err = AbiError::Unpack("short read".to_string())
            .context("field 'amount'")
            .context("struct 'transfer'");
        assert!(matches!(err.root_cause(), AbiError::Unpack(_)));
        let text = err.to_string();
        assert!(text.contains("struct 'transfer'"));
        assert!(text.contains("field 'amount'"));
        assert!(text.contains("short read"));
    }
}
