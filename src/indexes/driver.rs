//! Database driver collaborator for the assertor.
//!
//! Session handling, pooling and retries live with the driver; this crate
//! only needs index/constraint metadata reads and the two DDL calls, so
//! the surface is a small trait. The shipped implementation wraps the
//! `neo4rs` Bolt driver; tests substitute a mock.

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::config::Neo4jConfig;
use crate::cypher::escape_identifier;

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("Database error: {0}")]
    Database(String),
}

impl PartialEq for DriverError {
    fn eq(&self, other: &Self) -> bool {
        let (DriverError::Database(a), DriverError::Database(b)) = (self, other);
        a == b
    }
}

impl From<neo4rs::Error> for DriverError {
    fn from(e: neo4rs::Error) -> Self {
        DriverError::Database(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    pub name: String,
    pub index_type: String,
    pub entity_type: String,
    pub labels: Vec<String>,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMetadata {
    pub name: String,
    pub constraint_type: String,
    pub labels: Vec<String>,
    pub properties: Vec<String>,
}

#[async_trait]
pub trait GraphDatabase: Send + Sync {
    async fn list_indexes(&self) -> Result<Vec<IndexMetadata>, DriverError>;
    async fn create_fulltext_index(
        &self,
        name: &str,
        label: &str,
        properties: &[String],
    ) -> Result<(), DriverError>;
    async fn list_constraints(&self) -> Result<Vec<ConstraintMetadata>, DriverError>;
    async fn create_unique_constraint(
        &self,
        name: &str,
        label: &str,
        property: &str,
    ) -> Result<(), DriverError>;
}

/// Bolt-backed implementation.
pub struct Neo4jDatabase {
    graph: neo4rs::Graph,
}

impl Neo4jDatabase {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, DriverError> {
        let mut builder = neo4rs::ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        let graph = neo4rs::Graph::connect(builder.build()?).await?;
        debug!("connected to {}", config.uri);
        Ok(Neo4jDatabase { graph })
    }
}

#[async_trait]
impl GraphDatabase for Neo4jDatabase {
    async fn list_indexes(&self) -> Result<Vec<IndexMetadata>, DriverError> {
        let mut rows = self
            .graph
            .execute(neo4rs::query(
                "SHOW INDEXES YIELD name, type, entityType, labelsOrTypes, properties",
            ))
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(IndexMetadata {
                name: row.get("name").unwrap_or_default(),
                index_type: row.get("type").unwrap_or_default(),
                entity_type: row.get("entityType").unwrap_or_default(),
                labels: row.get("labelsOrTypes").unwrap_or_default(),
                properties: row.get("properties").unwrap_or_default(),
            });
        }
        Ok(out)
    }

    async fn create_fulltext_index(
        &self,
        name: &str,
        label: &str,
        properties: &[String],
    ) -> Result<(), DriverError> {
        let properties = properties
            .iter()
            .map(|p| format!("n.{}", escape_identifier(p)))
            .collect::<Vec<_>>()
            .join(", ");
        let statement = format!(
            "CREATE FULLTEXT INDEX {} FOR (n:{}) ON EACH [{}]",
            escape_identifier(name),
            escape_identifier(label),
            properties
        );
        debug!("creating fulltext index: {}", statement);
        self.graph.run(neo4rs::query(&statement)).await?;
        Ok(())
    }

    async fn list_constraints(&self) -> Result<Vec<ConstraintMetadata>, DriverError> {
        let mut rows = self
            .graph
            .execute(neo4rs::query(
                "SHOW CONSTRAINTS YIELD name, type, labelsOrTypes, properties",
            ))
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(ConstraintMetadata {
                name: row.get("name").unwrap_or_default(),
                constraint_type: row.get("type").unwrap_or_default(),
                labels: row.get("labelsOrTypes").unwrap_or_default(),
                properties: row.get("properties").unwrap_or_default(),
            });
        }
        Ok(out)
    }

    async fn create_unique_constraint(
        &self,
        name: &str,
        label: &str,
        property: &str,
    ) -> Result<(), DriverError> {
        let statement = format!(
            "CREATE CONSTRAINT {} FOR (n:{}) REQUIRE n.{} IS UNIQUE",
            escape_identifier(name),
            escape_identifier(label),
            escape_identifier(property)
        );
        debug!("creating unique constraint: {}", statement);
        self.graph.run(neo4rs::query(&statement)).await?;
        Ok(())
    }
}
