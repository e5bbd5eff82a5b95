//! Update translation.
//!
//! Nested writes apply in a fixed order at every nesting level, whatever
//! the input key order: creation, connect, disconnect, scalar property
//! updates, delete. Conditional nested updates are pre-branched into
//! `CALL` blocks whose `WITH ... WHERE x IS NOT NULL` filter makes the
//! update a no-op when the pattern did not match. Interface and union
//! targets fan out to one branch per implementing type combined by UNION;
//! an `_on` override replaces the generic instruction entirely for its
//! named type.

use serde_json::Value;

use crate::auth::AuthOperation;
use crate::cypher::escape_identifier;
use crate::type_model::{Node, Relationship};

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::operation::UpdateOperation;
use super::projection::build_projection;
use super::where_clause::{self, Scope};
use super::write;

pub fn translate_update(
    ctx: &mut TranslationContext<'_>,
    op: &UpdateOperation,
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

    // Top-level phases run in the same fixed order as nested levels.
    if let Some(create) = op.create.as_ref().and_then(Value::as_object) {
        for rel in node.relationships.clone() {
            let Some(value) = create.get(&rel.field_name) else { continue };
            for (member, member_value) in write::rel_field_entries(&rel, value)? {
                for (index, entry) in
                    write::normalize_entries(&member_value).into_iter().enumerate()
                {
                    write::nested_create(
                        ctx,
                        &node,
                        &rel,
                        var,
                        member.as_deref(),
                        index,
                        &entry,
                        &mut clauses,
                    )?;
                }
            }
        }
    }
    if let Some(connect) = op.connect.as_ref().and_then(Value::as_object) {
        for rel in node.relationships.clone() {
            let Some(value) = connect.get(&rel.field_name) else { continue };
            for (member, member_value) in write::rel_field_entries(&rel, value)? {
                for (index, entry) in
                    write::normalize_entries(&member_value).into_iter().enumerate()
                {
                    write::connect_block(
                        ctx,
                        &rel,
                        var,
                        member.as_deref(),
                        index,
                        &entry,
                        &mut clauses,
                    )?;
                }
            }
        }
    }
    if let Some(disconnect) = op.disconnect.as_ref().and_then(Value::as_object) {
        for rel in node.relationships.clone() {
            let Some(value) = disconnect.get(&rel.field_name) else { continue };
            for (member, member_value) in write::rel_field_entries(&rel, value)? {
                for (index, entry) in
                    write::normalize_entries(&member_value).into_iter().enumerate()
                {
                    write::disconnect_block(
                        ctx,
                        &rel,
                        var,
                        member.as_deref(),
                        index,
                        &entry,
                        &mut clauses,
                    )?;
                }
            }
        }
    }
    if let Some(update_value) = &op.update {
        apply_update_ops(ctx, &node, var, update_value, None, &mut clauses)?;
    }
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

    let node_selection = op
        .selection
        .iter()
        .find(|s| s.name == node.plural)
        .map(|s| s.selection.clone())
        .unwrap_or_default();
    let projection = build_projection(ctx, &node, var, var, &node_selection, false, true)?;
    clauses.push(format!("WITH {}", var));
    let return_clause = format!("RETURN {} AS {}", projection.map_projection(var), var);
    clauses.extend(projection.pre_clauses);
    clauses.push(return_clause);

    Ok(clauses.join("\n"))
}

/// One update instruction applied to an already-bound variable: scalar
/// sets, the write-time bind check, then nested relationship entries.
fn apply_update_ops(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    update_value: &Value,
    param_tag: Option<&str>,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    let Some(object) = update_value.as_object() else {
        return Err(TranslationError::invalid("update instruction must be an object"));
    };
    let prefix = match param_tag {
        Some(tag) => format!("{}_update_on_{}", var, tag),
        None => format!("{}_update", var),
    };
    write::scalar_set_clauses(ctx, &node.fields, var, &prefix, update_value, false, clauses)?;
    write::append_bind_clause(ctx, node, var, AuthOperation::Update, clauses)?;

    for rel in node.relationships.clone() {
        let Some(value) = object.get(&rel.field_name) else { continue };
        for (member, member_value) in write::rel_field_entries(&rel, value)? {
            for (index, entry) in write::normalize_entries(&member_value).into_iter().enumerate() {
                update_entry_block(ctx, node, &rel, var, member.as_deref(), index, &entry, clauses)?;
            }
        }
    }
    Ok(())
}

/// The effective instruction for one implementing type: an `_on.{Type}`
/// override replaces the generic instruction; other types receive the
/// generic instruction with `_on` stripped.
fn branch_instruction(value: &Value, type_name: &str, polymorphic: bool) -> (Option<Value>, bool) {
    if !polymorphic {
        return (Some(value.clone()), false);
    }
    let Some(object) = value.as_object() else {
        return (Some(value.clone()), false);
    };
    if let Some(on) = object.get("_on").and_then(|v| v.as_object()) {
        if let Some(replacement) = on.get(type_name) {
            return (Some(replacement.clone()), true);
        }
    }
    let mut cleaned = object.clone();
    cleaned.remove("_on");
    if cleaned.is_empty() {
        (None, false)
    } else {
        (Some(Value::Object(cleaned)), false)
    }
}

#[allow(clippy::too_many_arguments)]
fn update_entry_block(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    rel: &Relationship,
    parent_var: &str,
    member: Option<&str>,
    index: usize,
    entry: &Value,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    let targets: Vec<Node> = match member {
        Some(member) => vec![ctx
            .model
            .node(member)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownNode(member.to_string()))?],
        None => rel
            .target
            .concrete_types()
            .iter()
            .map(|name| {
                ctx.model
                    .node(name)
                    .cloned()
                    .ok_or_else(|| TranslationError::UnknownNode((*name).to_string()))
            })
            .collect::<Result<_, _>>()?,
    };
    let polymorphic = targets.len() > 1;
    let props = rel
        .properties
        .as_ref()
        .and_then(|name| ctx.model.relationship_properties(name).cloned());

    let v = format!("{}_{}{}", parent_var, write::entry_segment(rel, member), index);
    let rel_var = format!("{}_relationship", v);
    let node_instruction = entry.get("update").and_then(|u| u.get("node"));
    let edge_instruction = entry.get("update").and_then(|u| u.get("edge"));

    // Fixed order within the entry: creation, connect, disconnect, then
    // the conditional property update, then delete. The first three attach
    // further nodes to the parent over this same relationship.
    if let Some(create_value) = entry.get("create") {
        for (nested_index, nested_entry) in
            write::normalize_entries(create_value).into_iter().enumerate()
        {
            write::nested_create(
                ctx,
                node,
                rel,
                parent_var,
                member,
                nested_index,
                &nested_entry,
                clauses,
            )?;
        }
    }
    if let Some(connect_value) = entry.get("connect") {
        for (nested_index, nested_entry) in
            write::normalize_entries(connect_value).into_iter().enumerate()
        {
            write::connect_block(
                ctx,
                rel,
                parent_var,
                member,
                nested_index,
                &nested_entry,
                clauses,
            )?;
        }
    }
    if let Some(disconnect_value) = entry.get("disconnect") {
        for (nested_index, nested_entry) in
            write::normalize_entries(disconnect_value).into_iter().enumerate()
        {
            write::disconnect_block(
                ctx,
                rel,
                parent_var,
                member,
                nested_index,
                &nested_entry,
                clauses,
            )?;
        }
    }

    if node_instruction.is_none() && edge_instruction.is_none() {
        if let Some(delete_value) = entry.get("delete") {
            for (nested_index, nested_entry) in
                write::normalize_entries(delete_value).into_iter().enumerate()
            {
                write::delete_block(
                    ctx,
                    rel,
                    parent_var,
                    member,
                    nested_index,
                    &nested_entry,
                    &[],
                    clauses,
                )?;
            }
        }
        return Ok(());
    }

    let mut generic_ops: Option<Vec<String>> = None;
    // The entry's match filter compiles to identical text and parameters
    // for every branch (it only references shared fields), so compile it
    // once and reuse it.
    let mut cached_where: Option<Option<String>> = None;
    let mut branches = Vec::new();

    for target in &targets {
        let mut branch = vec![format!("WITH {}", parent_var)];
        branch.push(format!(
            "OPTIONAL MATCH {}",
            rel.pattern(
                parent_var,
                Some(&rel_var),
                &format!("{}:{}", v, escape_identifier(target.primary_label()))
            )
        ));
        if let Some(where_value) = entry.get("where") {
            let predicate = match &cached_where {
                Some(cached) => cached.clone(),
                None => {
                    let compiled = where_clause::compile_connection_where(
                        ctx,
                        target,
                        props.as_ref(),
                        &v,
                        Some(&rel_var),
                        &v,
                        where_value,
                    )?;
                    cached_where = Some(compiled.clone());
                    compiled
                }
            };
            if let Some(predicate) = predicate {
                branch.push(format!("WHERE {}", predicate));
            }
        }
        branch.push(format!(
            "WITH {}, {}, {} WHERE {} IS NOT NULL",
            parent_var, v, rel_var, v
        ));

        if let Some(instruction) = node_instruction {
            let (effective, overridden) =
                branch_instruction(instruction, &target.name, polymorphic);
            match (effective, overridden) {
                (Some(effective), true) => {
                    let mut ops = Vec::new();
                    apply_update_ops(ctx, target, &v, &effective, Some(&target.name), &mut ops)?;
                    branch.extend(ops);
                }
                (Some(effective), false) => {
                    // The generic instruction compiles to identical text
                    // (and identical parameters) for every non-overridden
                    // branch; compile it once.
                    if generic_ops.is_none() {
                        let mut ops = Vec::new();
                        apply_update_ops(ctx, target, &v, &effective, None, &mut ops)?;
                        generic_ops = Some(ops);
                    }
                    branch.extend(generic_ops.clone().unwrap_or_default());
                }
                (None, _) => {}
            }
        }
        if let Some(edge_instruction) = edge_instruction {
            if let Some(props) = &props {
                write::scalar_set_clauses(
                    ctx,
                    &props.fields,
                    &rel_var,
                    &format!("{}_update_edge", v),
                    edge_instruction,
                    false,
                    &mut branch,
                )?;
            }
        }

        branch.push(format!("RETURN count(*) AS update_{}", v));
        branches.push(branch.join("\n"));
    }

    clauses.push(format!("WITH {}", parent_var));
    clauses.push(format!("CALL {{\n{}\n}}", branches.join("\nUNION\n")));

    if let Some(delete_value) = entry.get("delete") {
        for (nested_index, nested_entry) in
            write::normalize_entries(delete_value).into_iter().enumerate()
        {
            write::delete_block(
                ctx,
                rel,
                parent_var,
                member,
                nested_index,
                &nested_entry,
                &[],
                clauses,
            )?;
        }
    }
    Ok(())
}
