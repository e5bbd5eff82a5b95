//! The Schema Generation Engine.
//!
//! Consumes the immutable type model and produces the generated API schema:
//! object types, filter/sort/aggregate inputs, the nested write-input
//! families, and the root operations. Built once at initialization; the
//! artifact is immutable and shared read-only afterwards.

pub mod builder;
pub mod connection;
pub mod sdl;
pub mod types;
pub mod where_input;
pub mod write_input;

use std::collections::BTreeMap;

pub use types::{
    EnumType, FieldSpec, InputObjectType, InputValueSpec, InterfaceType, ObjectType, ScalarType,
    SchemaType, TypeRef, UnionType,
};

use crate::type_model::TypeModel;

/// The generated schema artifact. Keyed by type name; root operations are
/// kept in generation order (per-node, nodes in declaration order).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSchema {
    pub types: BTreeMap<String, SchemaType>,
    pub query_fields: Vec<FieldSpec>,
    pub mutation_fields: Vec<FieldSpec>,
}

impl ApiSchema {
    pub fn generate(model: &TypeModel) -> Self {
        builder::generate(model)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&InputObjectType> {
        match self.types.get(name) {
            Some(SchemaType::Input(input)) => Some(input),
            _ => None,
        }
    }

    pub fn query_field(&self, name: &str) -> Option<&FieldSpec> {
        self.query_fields.iter().find(|f| f.name == name)
    }

    pub fn mutation_field(&self, name: &str) -> Option<&FieldSpec> {
        self.mutation_fields.iter().find(|f| f.name == name)
    }

    /// Render the artifact as SDL text, deterministically ordered.
    pub fn to_sdl(&self) -> String {
        sdl::render(self)
    }
}
