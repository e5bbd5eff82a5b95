use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthorizationError {
    /// A write-time bind rule cannot be satisfied by the request context;
    /// the write is rejected before any statement is produced.
    #[error("Bind rule on \"{location}\" references claim \"{claim}\" absent from the request context")]
    MissingClaim { location: String, claim: String },
    #[error("Auth rule on \"{location}\" references unknown field \"{field}\"")]
    UnknownField { location: String, field: String },
    #[error("Malformed auth predicate on \"{location}\": {message}")]
    MalformedPredicate { location: String, message: String },
}
