//! Synthesis errors
//!
//! Everything reported here surfaces from `ClassBuilder::create()` (or from
//! declaring host types and loading options), before any instance exists.
//! Per-call failures are `mimic_sdk::CallError`.

/// Result alias for synthesis operations
pub type SynthResult<T> = Result<T, SynthError>;

/// Class synthesis errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// A callable carries no parameter metadata and no explicit signature was given
    #[error("Cannot inspect callable for {subject}: supply an explicit signature")]
    UninspectableCallable {
        /// Method whose implementation could not be inspected
        subject: String,
    },

    /// The requested class shape cannot be satisfied
    #[error("Structural constraint violated: {reason}")]
    StructuralConstraint {
        /// What is wrong with the requested shape
        reason: String,
    },

    /// A method name collides with a name the synthesizer reserves
    #[error("Method name '{name}' is reserved")]
    ReservedName {
        /// Offending method name
        name: String,
    },

    /// An explicit signature could not be parsed
    #[error("Invalid signature '{signature}': {reason}")]
    InvalidSignature {
        /// Signature text as given
        signature: String,
        /// Parse failure
        reason: String,
    },

    /// A method or type name is empty or not an identifier
    #[error("Invalid name '{name}'")]
    InvalidName {
        /// Offending name
        name: String,
    },

    /// Synthesis options are malformed
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl SynthError {
    pub(crate) fn structural(reason: impl Into<String>) -> Self {
        SynthError::StructuralConstraint {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_signature(signature: &str, reason: impl Into<String>) -> Self {
        SynthError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }
}
