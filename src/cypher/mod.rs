//! Cypher statement primitives shared by the translator.
//!
//! Nothing in here talks to a database; a [`Statement`] is just text plus
//! its parameter bindings, executed by whatever driver the caller owns.

pub mod value;

use serde_json::{Map, Value};

pub use value::{encode_int, int_parts, scalar_param, ValueError};

/// One translated operation: a single Cypher statement and the parameter
/// map that must be bound when executing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: Map<String, Value>,
}

impl Statement {
    pub fn new(cypher: String, params: Map<String, Value>) -> Self {
        Statement { cypher, params }
    }
}

/// Render a string as a double-quoted Cypher literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render a label or relationship type, backtick-escaped when it is not a
/// plain identifier.
pub fn escape_identifier(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        s.to_string()
    } else {
        format!("`{}`", s.replace('`', "``"))
    }
}
