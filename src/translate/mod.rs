//! The Query Translation Engine.
//!
//! A pure function of (type model, one resolved operation, auth context):
//! translation allocates a fresh [`context::TranslationContext`] per call,
//! performs no I/O, never suspends, and writes no shared state, so
//! concurrent translations need no locking. The output is one statement
//! and its parameter map; executing it is the caller's concern.

pub mod context;
pub mod create;
pub mod delete;
pub mod errors;
pub mod operation;
pub mod projection;
pub mod read;
pub mod update;
pub mod where_clause;
pub mod write;

pub use context::TranslationContext;
pub use errors::TranslationError;
pub use operation::{
    AggregateOperation, ConnectionOperation, CreateOperation, DeleteOperation, Operation,
    ReadOperation, Selection, TypeSelection, UpdateOperation,
};

use log::debug;

use crate::auth::AuthContext;
use crate::cypher::Statement;
use crate::type_model::{Node, TypeModel};

/// Translate one resolved operation into a single parameterized statement.
pub fn translate(
    model: &TypeModel,
    operation: &Operation,
    auth: AuthContext,
) -> Result<Statement, TranslationError> {
    let mut ctx = TranslationContext::new(model, auth);
    let cypher = match operation {
        Operation::Read(op) => read::translate_read(&mut ctx, op)?,
        Operation::Aggregate(op) => read::translate_aggregate(&mut ctx, op)?,
        Operation::Connection(op) => read::translate_connection(&mut ctx, op)?,
        Operation::Create(op) => create::translate_create(&mut ctx, op)?,
        Operation::Update(op) => update::translate_update(&mut ctx, op)?,
        Operation::Delete(op) => delete::translate_delete(&mut ctx, op)?,
    };
    debug!(
        "translated {} operation on \"{}\" ({} chars)",
        match operation {
            Operation::Read(_) => "read",
            Operation::Aggregate(_) => "aggregate",
            Operation::Connection(_) => "connection",
            Operation::Create(_) => "create",
            Operation::Update(_) => "update",
            Operation::Delete(_) => "delete",
        },
        operation.node_name(),
        cypher.len()
    );
    Ok(Statement::new(cypher, ctx.into_params()))
}

/// `Label` or `Label:Extra` for nodes carrying additional labels.
pub(crate) fn node_labels_pattern(node: &Node) -> String {
    node.labels
        .iter()
        .map(|label| crate::cypher::escape_identifier(label))
        .collect::<Vec<_>>()
        .join(":")
}
