//! GraphBolt - a generated GraphQL API and Cypher translation layer for Neo4j
//!
//! This crate turns a declarative graph type definition into:
//! - A generated API schema (object types, filter/sort/aggregate inputs,
//!   nested write inputs, root operations)
//! - Per-operation Cypher translation: one resolved operation in, one
//!   parameterized statement out
//! - Index/constraint reconciliation against a live database
//!
//! Schema construction runs once at initialization; the resulting type
//! model and schema artifact are immutable and safely shared across
//! concurrent translations.

pub mod api_schema;
pub mod auth;
pub mod config;
pub mod cypher;
pub mod indexes;
pub mod translate;
pub mod type_defs;
pub mod type_model;
pub mod utils;
pub mod validation;

use thiserror::Error;

pub use api_schema::ApiSchema;
pub use auth::AuthContext;
pub use cypher::Statement;
pub use indexes::{AssertOptions, GraphDatabase, IndexAssertionError};
pub use translate::{Operation, TranslationError};
pub use type_defs::DefinitionDocument;
pub use type_model::TypeModel;
pub use validation::errors::DefinitionError;

/// Top-level error, aggregating the per-component taxonomies.
#[derive(Debug, Clone, Error)]
pub enum GraphBoltError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    IndexAssertion(#[from] IndexAssertionError),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// The engine: an immutable type model plus its generated schema.
#[derive(Debug)]
pub struct GraphBolt {
    model: TypeModel,
    schema: ApiSchema,
}

impl GraphBolt {
    /// Validate the definition document, build the type model, and
    /// generate the API schema. Fails fast: on any definition error no
    /// schema is ever returned.
    pub fn new(document: &DefinitionDocument) -> Result<Self, DefinitionError> {
        let model = TypeModel::from_document(document)?;
        let schema = ApiSchema::generate(&model);
        Ok(GraphBolt { model, schema })
    }

    pub fn model(&self) -> &TypeModel {
        &self.model
    }

    pub fn schema(&self) -> &ApiSchema {
        &self.schema
    }

    /// Translate one resolved operation under the given claims context.
    pub fn translate(
        &self,
        operation: &Operation,
        auth: AuthContext,
    ) -> Result<Statement, TranslationError> {
        translate::translate(&self.model, operation, auth)
    }

    /// Reconcile declared full-text indexes and unique constraints against
    /// the database reachable through `db`.
    pub async fn assert_indexes_and_constraints(
        &self,
        db: &dyn GraphDatabase,
        options: AssertOptions,
    ) -> Result<(), IndexAssertionError> {
        indexes::assert_indexes_and_constraints(&self.model, db, options).await
    }
}
