//! The immutable in-memory type model.
//!
//! Built once from a validated definition document; read-only for the rest
//! of the process and safely shared across concurrent translations.

pub mod builder;
pub mod field;
pub mod node;
pub mod relationship;

pub use field::{Field, FieldType, ScalarKind};
pub use node::{FullTextIndex, Node};
pub use relationship::{Direction, RelTarget, Relationship};

use std::collections::HashMap;

use crate::type_defs::DefinitionDocument;
use crate::validation::base_registry::BaseRegistry;
use crate::validation::errors::DefinitionError;

/// An interface implemented by one or more nodes, with the shared field and
/// relationship shape every implementor satisfies.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceModel {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub implementations: Vec<String>,
}

impl InterfaceModel {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionModel {
    pub name: String,
    pub members: Vec<String>,
}

/// Edge-properties type: a small scalar field set carried on a
/// relationship. Never declares further relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipProperties {
    pub name: String,
    pub fields: Vec<Field>,
}

impl RelationshipProperties {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct TypeModel {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    interfaces: Vec<InterfaceModel>,
    interface_index: HashMap<String, usize>,
    unions: Vec<UnionModel>,
    union_index: HashMap<String, usize>,
    enums: HashMap<String, Vec<String>>,
    rel_properties: HashMap<String, RelationshipProperties>,
}

impl TypeModel {
    /// Validate a document and build the model from it in one step.
    pub fn from_document(document: &DefinitionDocument) -> Result<Self, DefinitionError> {
        let registry = BaseRegistry::builtin();
        crate::validation::validate_document(document, &registry)?;
        builder::build(document, &registry)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn interfaces(&self) -> &[InterfaceModel] {
        &self.interfaces
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceModel> {
        self.interface_index.get(name).map(|&i| &self.interfaces[i])
    }

    pub fn unions(&self) -> &[UnionModel] {
        &self.unions
    }

    pub fn union(&self, name: &str) -> Option<&UnionModel> {
        self.union_index.get(name).map(|&i| &self.unions[i])
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn relationship_properties(&self, name: &str) -> Option<&RelationshipProperties> {
        self.rel_properties.get(name)
    }

    /// Shared (interface-declared) fields visible through a polymorphic
    /// relationship target; a concrete node target just exposes its own
    /// fields.
    pub fn target_fields<'a>(&'a self, target: &'a RelTarget) -> Vec<&'a Field> {
        match target {
            RelTarget::Node(name) => self
                .node(name)
                .map(|n| n.fields.iter().collect())
                .unwrap_or_default(),
            RelTarget::Interface { name, .. } => self
                .interface(name)
                .map(|i| i.fields.iter().collect())
                .unwrap_or_default(),
            // Unions share no fields; per-member inputs are keyed instead.
            RelTarget::Union { .. } => Vec::new(),
        }
    }
}
