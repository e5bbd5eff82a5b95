//! The resolved operation handed to the translator.
//!
//! Executing a request against the generated schema is the transport
//! layer's concern; what reaches this crate is the already-resolved
//! operation: which root field, its argument values, and the selection
//! tree. The structures derive `serde` so operations can be loaded from
//! JSON/YAML in the CLI and tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Operation {
    Read(ReadOperation),
    Aggregate(AggregateOperation),
    Connection(ConnectionOperation),
    Create(CreateOperation),
    Update(UpdateOperation),
    Delete(DeleteOperation),
}

impl Operation {
    pub fn node_name(&self) -> &str {
        match self {
            Operation::Read(op) => &op.node,
            Operation::Aggregate(op) => &op.node,
            Operation::Connection(op) => &op.node,
            Operation::Create(op) => &op.node,
            Operation::Update(op) => &op.node,
            Operation::Delete(op) => &op.node,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOperation {
    pub node: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub fulltext: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateOperation {
    pub node: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionOperation {
    pub node: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub sort: Option<Value>,
    #[serde(default)]
    pub first: Option<i64>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOperation {
    pub node: String,
    #[serde(default)]
    pub input: Vec<Value>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOperation {
    pub node: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub update: Option<Value>,
    #[serde(default)]
    pub connect: Option<Value>,
    #[serde(default)]
    pub disconnect: Option<Value>,
    #[serde(default)]
    pub create: Option<Value>,
    #[serde(default)]
    pub delete: Option<Value>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteOperation {
    pub node: String,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub delete: Option<Value>,
}

/// One field of a selection tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, rename = "where")]
    pub where_: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    /// Per-implementing-type sub-selections for polymorphic traversals.
    #[serde(default)]
    pub on: Vec<TypeSelection>,
    #[serde(default)]
    pub selection: Vec<Selection>,
}

impl Selection {
    pub fn named(name: impl Into<String>) -> Self {
        Selection { name: name.into(), ..Selection::default() }
    }

    /// The key this selection projects under.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn type_selection(&self, type_name: &str) -> Option<&TypeSelection> {
        self.on.iter().find(|t| t.type_name == type_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeSelection {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub selection: Vec<Selection>,
}
