pub mod errors;
pub mod predicate;
pub mod rules;

pub use errors::AuthorizationError;
pub use predicate::{bind_validation, read_predicate, AUTH_PARAM};
pub use rules::{AuthAnnotation, AuthContext, AuthOperation, AuthRule};
