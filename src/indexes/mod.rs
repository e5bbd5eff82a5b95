//! The Index/Constraint Assertor.
//!
//! Reconciles declared full-text indexes (and unique constraints) against
//! live database metadata. Asserting twice in a row against an unchanged
//! declaration succeeds both times, and the assertor never creates part of
//! an index and then reports success: each declaration either already
//! satisfies the schema, is created whole, or fails the whole call.

pub mod driver;
pub mod errors;

use log::info;

use crate::type_model::{Node, TypeModel};

pub use driver::{ConstraintMetadata, DriverError, GraphDatabase, IndexMetadata, Neo4jDatabase};
pub use errors::IndexAssertionError;

#[derive(Debug, Clone, Copy, Default)]
pub struct AssertOptions {
    /// Create missing indexes and constraints instead of failing.
    pub create: bool,
}

pub async fn assert_indexes_and_constraints(
    model: &TypeModel,
    db: &dyn GraphDatabase,
    options: AssertOptions,
) -> Result<(), IndexAssertionError> {
    let indexes = db.list_indexes().await?;

    for node in model.nodes() {
        for declared in &node.fulltext_indexes {
            match indexes.iter().find(|i| i.name == declared.name) {
                None => {
                    if !options.create {
                        return Err(IndexAssertionError::MissingIndex {
                            index: declared.name.clone(),
                            node: node.name.clone(),
                        });
                    }
                    let properties: Vec<String> = declared
                        .fields
                        .iter()
                        .map(|field_name| db_property(node, field_name))
                        .collect();
                    db.create_fulltext_index(&declared.name, node.primary_label(), &properties)
                        .await?;
                    info!(
                        "created @fulltext index '{}' on :{} [{}]",
                        declared.name,
                        node.primary_label(),
                        properties.join(", ")
                    );
                }
                Some(existing) => {
                    for field_name in &declared.fields {
                        let property = db_property(node, field_name);
                        if existing.properties.contains(&property) {
                            continue;
                        }
                        if options.create {
                            return Err(IndexAssertionError::MissingFieldAfterCreate {
                                index: declared.name.clone(),
                                node: node.name.clone(),
                                field: field_name.clone(),
                            });
                        }
                        if property != *field_name {
                            return Err(IndexAssertionError::MissingAliasedField {
                                index: declared.name.clone(),
                                node: node.name.clone(),
                                field: field_name.clone(),
                                alias: property,
                            });
                        }
                        return Err(IndexAssertionError::MissingField {
                            index: declared.name.clone(),
                            node: node.name.clone(),
                            field: field_name.clone(),
                        });
                    }
                }
            }
        }
    }

    let needs_constraints = model.nodes().iter().any(|n| n.unique_fields().next().is_some());
    if needs_constraints {
        let constraints = db.list_constraints().await?;
        for node in model.nodes() {
            for field in node.unique_fields() {
                let property = field.db_property().to_string();
                let satisfied = constraints.iter().any(|c| {
                    c.constraint_type.contains("UNIQUENESS")
                        && c.labels.contains(&node.primary_label().to_string())
                        && c.properties == vec![property.clone()]
                });
                if satisfied {
                    continue;
                }
                if !options.create {
                    return Err(IndexAssertionError::MissingConstraint {
                        node: node.name.clone(),
                        field: field.name.clone(),
                    });
                }
                let constraint_name = format!("{}_{}_unique", node.name, field.name);
                db.create_unique_constraint(&constraint_name, node.primary_label(), &property)
                    .await?;
                info!(
                    "created unique constraint '{}' on :{}({})",
                    constraint_name,
                    node.primary_label(),
                    property
                );
            }
        }
    }

    Ok(())
}

/// Declared index fields map through field aliasing onto database
/// properties.
fn db_property(node: &Node, field_name: &str) -> String {
    node.field(field_name)
        .map(|f| f.db_property().to_string())
        .unwrap_or_else(|| field_name.to_string())
}
