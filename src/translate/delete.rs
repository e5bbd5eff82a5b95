//! Delete translation.

use serde_json::Value;

use crate::auth::AuthOperation;

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::operation::DeleteOperation;
use super::where_clause::{self, Scope};
use super::write;

pub fn translate_delete(
    ctx: &mut TranslationContext<'_>,
    op: &DeleteOperation,
) -> Result<String, TranslationError> {
    let node = ctx
        .model
        .node(&op.node)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(op.node.clone()))?;
    let var = "this";

    let mut clauses = vec![format!("MATCH ({}:{})", var, super::node_labels_pattern(&node))];
    let mut where_parts = Vec::new();
    if let Some(where_value) = &op.where_ {
        if let Some(predicate) =
            where_clause::compile_where(ctx, Scope::Node(&node), var, var, where_value)?
        {
            where_parts.push(predicate);
        }
    }
    if let Some(annotation) = node.auth.clone() {
        if let Some(predicate) = crate::auth::read_predicate(&node, &annotation, var)? {
            ctx.bind_auth();
            where_parts.push(format!("({})", predicate));
        }
    }
    if !where_parts.is_empty() {
        clauses.push(format!("WHERE {}", where_parts.join(" AND ")));
    }

    write::append_bind_clause(ctx, &node, var, AuthOperation::Delete, &mut clauses)?;

    if let Some(delete) = op.delete.as_ref().and_then(Value::as_object) {
        for rel in node.relationships.clone() {
            let Some(value) = delete.get(&rel.field_name) else { continue };
            for (member, member_value) in write::rel_field_entries(&rel, value)? {
                for (index, entry) in
                    write::normalize_entries(&member_value).into_iter().enumerate()
                {
                    write::delete_block(
                        ctx,
                        &rel,
                        var,
                        member.as_deref(),
                        index,
                        &entry,
                        &[],
                        &mut clauses,
                    )?;
                }
            }
        }
    }

    clauses.push(format!("DETACH DELETE {}", var));
    Ok(clauses.join("\n"))
}
