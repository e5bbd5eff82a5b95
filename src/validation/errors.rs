//! Definition-time error types.
//!
//! Everything here is fatal at initialization: when a definition document is
//! rejected, no schema object is ever handed back to the caller.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("{message}")]
    ReservedTypeName { type_name: String, message: String },
    #[error("Invalid type definitions:\n{0}")]
    Invalid(String),
}

impl DefinitionError {
    /// Collapse a list of diagnostics into the single error surfaced to the
    /// caller. Callers must only invoke this with a non-empty list.
    pub fn from_diagnostics(diagnostics: Vec<String>) -> Self {
        DefinitionError::Invalid(diagnostics.join("\n"))
    }
}
