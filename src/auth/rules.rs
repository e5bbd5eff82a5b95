//! Declared authorization rules and the per-request claims context.
//!
//! Rules are parsed out of `auth(rules: [...])` directives at model-build
//! time. The claims context is resolved by the caller (transport-level
//! authentication is out of scope) and handed to the translator per request.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The `auth` directive payload attached to a node or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAnnotation {
    pub rules: Vec<AuthRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRule {
    /// Operations the rule applies to; empty means all operations.
    #[serde(default)]
    pub operations: Vec<AuthOperation>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, rename = "isAuthenticated")]
    pub is_authenticated: Option<bool>,
    /// Read-time predicate: rows failing it are silently excluded.
    #[serde(default)]
    pub allow: Option<Value>,
    /// Read-time predicate merged into the matching stage.
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    /// Write-time predicate: a violation aborts the whole mutation.
    #[serde(default)]
    pub bind: Option<Value>,
}

impl AuthRule {
    pub fn applies_to(&self, operation: AuthOperation) -> bool {
        self.operations.is_empty() || self.operations.contains(&operation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthOperation {
    Read,
    Create,
    Update,
    Delete,
    Connect,
    Disconnect,
}

/// Resolved identity information for one request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub roles: Vec<String>,
    /// Verified claim values, e.g. the decoded JWT payload.
    pub claims: Map<String, Value>,
}

impl AuthContext {
    pub fn unauthenticated() -> Self {
        AuthContext::default()
    }

    pub fn authenticated(roles: Vec<String>, claims: Map<String, Value>) -> Self {
        AuthContext { is_authenticated: true, roles, claims }
    }

    /// Look up a dotted claim path such as `sub` or `org.id`.
    pub fn claim(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for segment in path.split('.') {
            current = match current {
                None => self.claims.get(segment),
                Some(value) => value.get(segment),
            };
            current?;
        }
        current
    }

    /// The value bound as the `$auth` statement parameter.
    pub fn to_param(&self) -> Value {
        json!({
            "isAuthenticated": self.is_authenticated,
            "roles": self.roles,
            "jwt": Value::Object(self.claims.clone()),
        })
    }
}
