//! Index assertion error types.
//!
//! Message texts are part of the external contract: operators match on
//! them, so each variant carries the index name, the node name, and the
//! specific missing field (plus its alias when the schema declares one).

use thiserror::Error;

use super::driver::DriverError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexAssertionError {
    #[error("Missing @fulltext index '{index}' on Node '{node}'")]
    MissingIndex { index: String, node: String },
    /// A pre-existing index does not cover a declared field.
    #[error("@fulltext index '{index}' on Node '{node}' is missing field '{field}'")]
    MissingField {
        index: String,
        node: String,
        field: String,
    },
    /// Same gap, but on a field whose database property is aliased.
    #[error("@fulltext index '{index}' on Node '{node}' is missing field '{field}' aliased to field '{alias}'")]
    MissingAliasedField {
        index: String,
        node: String,
        field: String,
        alias: String,
    },
    /// The gap was discovered while asserting with auto-create enabled:
    /// the index name is taken, so it cannot be created with the declared
    /// shape.
    #[error("@fulltext index '{index}' on Node '{node}' already exists, but is missing field '{field}'")]
    MissingFieldAfterCreate {
        index: String,
        node: String,
        field: String,
    },
    #[error("Missing constraint for {node}.{field}")]
    MissingConstraint { node: String, field: String },
    #[error(transparent)]
    Driver(#[from] DriverError),
}
