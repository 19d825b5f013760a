use crate::datatypes::diagnostics::CriticalityDiagnostics;
use thiserror::Error;

/// Main error type for PER decoding and encoding operations
#[derive(Error, Debug)]
pub enum PerError {
    #[error(
        "truncated input while decoding {context}: need {needed_bits} bits, \
         {available_bits} available at bit offset {bit_offset}"
    )]
    Truncated {
        context: &'static str,
        needed_bits: usize,
        available_bits: usize,
        bit_offset: usize,
    },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("no decoder registered for key {key} in table '{namespace}'")]
    UnresolvedOpenType { namespace: String, key: u32 },

    #[error("message rejected: an IE with criticality 'reject' could not be processed")]
    Rejected(Box<CriticalityDiagnostics>),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for PER operations
pub type PerResult<T> = Result<T, PerError>;

impl PerError {
    /// Diagnostics record attached to a rejection, if this is one.
    pub fn diagnostics(&self) -> Option<&CriticalityDiagnostics> {
        match self {
            PerError::Rejected(diag) => Some(diag),
            _ => None,
        }
    }
}
