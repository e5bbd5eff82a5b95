//! Translation-time error types.
//!
//! Every error here is scoped to the single operation being translated;
//! concurrent translations against the same model are unaffected.

use thiserror::Error;

use crate::auth::AuthorizationError;
use crate::cypher::ValueError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error("Unknown node \"{0}\"")]
    UnknownNode(String),
    #[error("Unknown field \"{field}\" on \"{owner}\"")]
    UnknownField { owner: String, field: String },
    #[error("Unknown relationship \"{field}\" on \"{owner}\"")]
    UnknownRelationship { owner: String, field: String },
    #[error("Unknown where operator \"{key}\" on \"{owner}\"")]
    UnknownOperator { owner: String, key: String },
    #[error("Unknown full-text index \"{index}\" on Node \"{node}\"")]
    UnknownFulltextIndex { node: String, index: String },
    #[error("Can only call one search at any given time")]
    MultipleFulltext,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid cursor \"{0}\"")]
    InvalidCursor(String),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

impl TranslationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TranslationError::InvalidArgument(message.into())
    }
}
