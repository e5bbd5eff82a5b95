//! Shared building blocks for create/update/delete translation.
//!
//! Conditional writes are pre-branched at translation time: `FOREACH` over
//! a `CASE WHEN ... IS NULL` guard for connects/disconnects, and
//! `WITH ... WHERE x IS NOT NULL` filters inside `CALL` blocks for nested
//! updates. No statement fragment is interpreted inside another at
//! execution time.

use serde_json::Value;

use crate::auth::{self, AuthOperation};
use crate::cypher::escape_identifier;
use crate::type_model::{Node, RelTarget, Relationship, RelationshipProperties};

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::where_clause::{self, Scope};

/// Normalize a list-or-single input into entries.
pub(super) fn normalize_entries(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Split a relationship's write input into per-target entries. Union
/// inputs are keyed per member; everything else passes through unchanged.
pub(super) fn rel_field_entries(
    rel: &Relationship,
    value: &Value,
) -> Result<Vec<(Option<String>, Value)>, TranslationError> {
    match &rel.target {
        RelTarget::Union { members, .. } => {
            let Some(object) = value.as_object() else {
                return Err(TranslationError::invalid(format!(
                    "input for union relationship \"{}\" must be keyed by member type",
                    rel.field_name
                )));
            };
            let mut out = Vec::new();
            for member in members {
                if let Some(member_value) = object.get(member) {
                    out.push((Some(member.clone()), member_value.clone()));
                }
            }
            Ok(out)
        }
        _ => Ok(vec![(None, value.clone())]),
    }
}

/// The naming segment for a relationship entry: `field` or `field_Member`.
pub(super) fn entry_segment(rel: &Relationship, member: Option<&str>) -> String {
    match member {
        Some(member) => format!("{}_{}", rel.field_name, member),
        None => rel.field_name.clone(),
    }
}

/// Resolve the concrete node a create entry targets, plus the node-level
/// create input for it. Interface entries arrive keyed by implementing
/// type and must name exactly one.
pub(super) fn resolve_create_target(
    ctx: &TranslationContext<'_>,
    rel: &Relationship,
    member: Option<&str>,
    node_value: &Value,
) -> Result<(Node, Value), TranslationError> {
    let target_name = match (member, &rel.target) {
        (Some(member), _) => member.to_string(),
        (None, RelTarget::Node(name)) => name.clone(),
        (None, RelTarget::Interface { name, implementations }) => {
            let Some(object) = node_value.as_object() else {
                return Err(TranslationError::invalid(format!(
                    "create input for interface \"{}\" must be keyed by implementing type",
                    name
                )));
            };
            let keys: Vec<&String> =
                object.keys().filter(|k| implementations.contains(*k)).collect();
            if keys.len() != 1 {
                return Err(TranslationError::invalid(format!(
                    "create input for interface \"{}\" must name exactly one implementing type",
                    name
                )));
            }
            let implementation = keys[0].clone();
            let inner = object.get(&implementation).cloned().unwrap_or(Value::Null);
            let node = ctx
                .model
                .node(&implementation)
                .cloned()
                .ok_or_else(|| TranslationError::UnknownNode(implementation.clone()))?;
            return Ok((node, inner));
        }
        (None, RelTarget::Union { name, .. }) => {
            return Err(TranslationError::invalid(format!(
                "create input for union \"{}\" must be keyed by member type",
                name
            )));
        }
    };
    let node = ctx
        .model
        .node(&target_name)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(target_name))?;
    Ok((node, node_value.clone()))
}

fn props_of(ctx: &TranslationContext<'_>, rel: &Relationship) -> Option<RelationshipProperties> {
    rel.properties
        .as_ref()
        .and_then(|name| ctx.model.relationship_properties(name).cloned())
}

/// Emit `SET var.prop = $param` clauses for the writable scalar values of
/// `input`. In create mode declared defaults fill in absent fields.
pub(super) fn scalar_set_clauses(
    ctx: &mut TranslationContext<'_>,
    node_fields: &[crate::type_model::Field],
    var: &str,
    param_prefix: &str,
    input: &Value,
    apply_defaults: bool,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    let empty = serde_json::Map::new();
    let object = input.as_object().unwrap_or(&empty);
    for field in node_fields.iter().filter(|f| f.writable()) {
        let value = match object.get(&field.name) {
            Some(value) => Some(value.clone()),
            None if apply_defaults => field.default.clone(),
            None => None,
        };
        let Some(value) = value else { continue };
        let converted =
            crate::cypher::scalar_param(&field.name, &field.field_type, field.list, &value)?;
        let param = ctx.add_param(format!("{}_{}", param_prefix, field.name), converted);
        clauses.push(format!("SET {}.{} = ${}", var, field.db_property(), param));
    }
    Ok(())
}

/// One node creation, depth-first: CREATE + SET, nested creates and
/// connects per relationship, then cardinality checks and bind rules.
pub(super) fn create_node_block(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    input: &Value,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    clauses.push(format!(
        "CREATE ({}:{})",
        var,
        super::node_labels_pattern(node)
    ));
    scalar_set_clauses(ctx, &node.fields, var, var, input, true, clauses)?;

    let empty = serde_json::Map::new();
    let object = input.as_object().unwrap_or(&empty);
    for rel in node.relationships.clone() {
        let Some(value) = object.get(&rel.field_name) else { continue };
        for (member, field_input) in rel_field_entries(&rel, value)? {
            let Some(field_object) = field_input.as_object() else {
                continue;
            };
            // Fixed order per nesting level: creation first, then connect.
            if let Some(create_value) = field_object.get("create") {
                for (index, entry) in normalize_entries(create_value).into_iter().enumerate() {
                    nested_create(ctx, node, &rel, var, member.as_deref(), index, &entry, clauses)?;
                }
            }
            if let Some(connect_value) = field_object.get("connect") {
                for (index, entry) in normalize_entries(connect_value).into_iter().enumerate() {
                    connect_block(ctx, &rel, var, member.as_deref(), index, &entry, clauses)?;
                }
            }
        }
    }

    cardinality_checks(ctx, node, var, clauses);
    append_bind_clause(ctx, node, var, AuthOperation::Create, clauses)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(super) fn nested_create(
    ctx: &mut TranslationContext<'_>,
    parent: &Node,
    rel: &Relationship,
    parent_var: &str,
    member: Option<&str>,
    index: usize,
    entry: &Value,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    let node_value = entry.get("node").cloned().unwrap_or(Value::Null);
    let (target, target_input) = resolve_create_target(ctx, rel, member, &node_value)?;
    let child_var = format!(
        "{}_{}{}_node",
        parent_var,
        entry_segment(rel, member),
        index
    );

    clauses.push(format!("WITH {}", parent_var));
    create_node_block(ctx, &target, &child_var, &target_input, clauses)?;

    let props = props_of(ctx, rel);
    match (props, entry.get("edge")) {
        (Some(props), Some(edge_input)) => {
            let rel_var = format!(
                "{}_{}{}_relationship",
                parent_var,
                entry_segment(rel, member),
                index
            );
            clauses.push(format!(
                "MERGE {}",
                rel.pattern(parent_var, Some(&rel_var), &child_var)
            ));
            scalar_set_clauses(ctx, &props.fields, &rel_var, &rel_var, edge_input, true, clauses)?;
        }
        _ => {
            clauses.push(format!("MERGE {}", rel.pattern(parent_var, None, &child_var)));
        }
    }

    let _ = parent;
    Ok(())
}

/// Conditional connect: optional-match the target, then merge inside
/// null-guarded FOREACH loops.
pub(super) fn connect_block(
    ctx: &mut TranslationContext<'_>,
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
    let multi = targets.len() > 1;
    let where_value = entry.get("where").and_then(|w| w.get("node"));
    let props = props_of(ctx, rel);

    let mut block = vec![format!("WITH {}", parent_var)];
    for target in &targets {
        let connect_var = if multi {
            format!(
                "{}_{}_connect{}_{}_node",
                parent_var,
                entry_segment(rel, member),
                index,
                target.name
            )
        } else {
            format!(
                "{}_{}_connect{}_node",
                parent_var,
                entry_segment(rel, member),
                index
            )
        };
        block.push(format!(
            "OPTIONAL MATCH ({}:{})",
            connect_var,
            escape_identifier(target.primary_label())
        ));
        if let Some(where_value) = where_value {
            let effective = if multi {
                where_clause::branch_where_value(where_value, &target.name)
            } else {
                Some(where_value.clone())
            };
            if let Some(effective) = effective {
                if let Some(predicate) = where_clause::compile_where(
                    ctx,
                    Scope::Node(target),
                    &connect_var,
                    &connect_var,
                    &effective,
                )? {
                    block.push(format!("WHERE {}", predicate));
                }
            }
        }

        let mut merge_lines = Vec::new();
        match (&props, entry.get("edge")) {
            (Some(props), Some(edge_input)) => {
                let rel_var = format!("{}_relationship", connect_var);
                merge_lines.push(format!(
                    "MERGE {}",
                    rel.pattern(parent_var, Some(&rel_var), &connect_var)
                ));
                let mut set_clauses = Vec::new();
                scalar_set_clauses(
                    ctx,
                    &props.fields,
                    &rel_var,
                    &rel_var,
                    edge_input,
                    true,
                    &mut set_clauses,
                )?;
                merge_lines.extend(set_clauses);
            }
            _ => {
                merge_lines.push(format!(
                    "MERGE {}",
                    rel.pattern(parent_var, None, &connect_var)
                ));
            }
        }

        block.push(format!(
            "FOREACH(_ IN CASE WHEN {} IS NULL THEN [] ELSE [1] END |",
            parent_var
        ));
        block.push(format!(
            "FOREACH(_ IN CASE WHEN {} IS NULL THEN [] ELSE [1] END |",
            connect_var
        ));
        block.extend(merge_lines);
        block.push(")".to_string());
        block.push(")".to_string());

        // Nested connects recurse on the connected node.
        if let Some(nested) = entry.get("connect") {
            for nested_entry in normalize_entries(nested) {
                let Some(nested_object) = nested_entry.as_object() else { continue };
                for nested_rel in target.relationships.clone() {
                    let Some(value) = nested_object.get(&nested_rel.field_name) else {
                        continue;
                    };
                    for (nested_member, nested_value) in rel_field_entries(&nested_rel, value)? {
                        for (nested_index, inner) in
                            normalize_entries(&nested_value).into_iter().enumerate()
                        {
                            connect_block(
                                ctx,
                                &nested_rel,
                                &connect_var,
                                nested_member.as_deref(),
                                nested_index,
                                &inner,
                                &mut block,
                            )?;
                        }
                    }
                }
            }
        }
    }
    block.push("RETURN count(*)".to_string());

    clauses.push(format!("WITH {}", parent_var));
    clauses.push(format!("CALL {{\n{}\n}}", block.join("\n")));
    Ok(())
}

/// Conditional disconnect: optional-match the related pattern, delete the
/// relationship inside a null-guarded FOREACH.
pub(super) fn disconnect_block(
    ctx: &mut TranslationContext<'_>,
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
    let multi = targets.len() > 1;
    let props = props_of(ctx, rel);

    let mut block = vec![format!("WITH {}", parent_var)];
    for target in &targets {
        let disconnect_var = if multi {
            format!(
                "{}_{}_disconnect{}_{}",
                parent_var,
                entry_segment(rel, member),
                index,
                target.name
            )
        } else {
            format!(
                "{}_{}_disconnect{}",
                parent_var,
                entry_segment(rel, member),
                index
            )
        };
        let rel_var = format!("{}_rel", disconnect_var);
        block.push(format!(
            "OPTIONAL MATCH {}",
            rel.pattern(
                parent_var,
                Some(&rel_var),
                &format!("{}:{}", disconnect_var, escape_identifier(target.primary_label()))
            )
        ));
        if let Some(where_value) = entry.get("where") {
            if let Some(predicate) = where_clause::compile_connection_where(
                ctx,
                target,
                props.as_ref(),
                &disconnect_var,
                Some(&rel_var),
                &disconnect_var,
                where_value,
            )? {
                block.push(format!("WHERE {}", predicate));
            }
        }
        block.push(format!(
            "FOREACH(_ IN CASE WHEN {} IS NULL THEN [] ELSE [1] END |",
            disconnect_var
        ));
        block.push(format!("DELETE {}", rel_var));
        block.push(")".to_string());

        // Nested disconnects recurse on the (possibly null) matched node.
        if let Some(nested) = entry.get("disconnect") {
            if let Some(nested_object) = nested.as_object() {
                for nested_rel in target.relationships.clone() {
                    let Some(value) = nested_object.get(&nested_rel.field_name) else {
                        continue;
                    };
                    for (nested_member, nested_value) in rel_field_entries(&nested_rel, value)? {
                        for (nested_index, inner) in
                            normalize_entries(&nested_value).into_iter().enumerate()
                        {
                            disconnect_block(
                                ctx,
                                &nested_rel,
                                &disconnect_var,
                                nested_member.as_deref(),
                                nested_index,
                                &inner,
                                &mut block,
                            )?;
                        }
                    }
                }
            }
        }
    }
    block.push("RETURN count(*)".to_string());

    clauses.push(format!("WITH {}", parent_var));
    clauses.push(format!("CALL {{\n{}\n}}", block.join("\n")));
    Ok(())
}

/// Nested delete: match, recurse deeper first, then detach-delete the
/// collected nodes.
pub(super) fn delete_block(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    parent_var: &str,
    member: Option<&str>,
    index: usize,
    entry: &Value,
    carried: &[String],
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
    let multi = targets.len() > 1;
    let props = props_of(ctx, rel);

    for target in &targets {
        let delete_var = if multi {
            format!(
                "{}_{}{}_{}",
                parent_var,
                entry_segment(rel, member),
                index,
                target.name
            )
        } else {
            format!("{}_{}{}", parent_var, entry_segment(rel, member), index)
        };
        let rel_var = format!("{}_relationship", delete_var);

        let mut carry = carried.to_vec();
        carry.push(parent_var.to_string());
        clauses.push(format!("WITH {}", carry.join(", ")));
        clauses.push(format!(
            "OPTIONAL MATCH {}",
            rel.pattern(
                parent_var,
                Some(&rel_var),
                &format!("{}:{}", delete_var, escape_identifier(target.primary_label()))
            )
        ));
        if let Some(where_value) = entry.get("where") {
            let effective = if multi {
                where_clause::branch_where_value(where_value, &target.name)
            } else {
                Some(where_value.clone())
            };
            if let Some(effective) = effective {
                if let Some(predicate) = where_clause::compile_connection_where(
                    ctx,
                    target,
                    props.as_ref(),
                    &delete_var,
                    Some(&rel_var),
                    &delete_var,
                    &effective,
                )? {
                    clauses.push(format!("WHERE {}", predicate));
                }
            }
        }

        // Deeper deletes run before this level's nodes disappear.
        if let Some(nested) = entry.get("delete") {
            if let Some(nested_object) = nested.as_object() {
                let mut deeper_carry = carry.clone();
                deeper_carry.push(delete_var.clone());
                for nested_rel in target.relationships.clone() {
                    let Some(value) = nested_object.get(&nested_rel.field_name) else {
                        continue;
                    };
                    for (nested_member, nested_value) in rel_field_entries(&nested_rel, value)? {
                        for (nested_index, inner) in
                            normalize_entries(&nested_value).into_iter().enumerate()
                        {
                            delete_block(
                                ctx,
                                &nested_rel,
                                &delete_var,
                                nested_member.as_deref(),
                                nested_index,
                                &inner,
                                &deeper_carry,
                                clauses,
                            )?;
                        }
                    }
                }
            }
        }

        clauses.push(format!(
            "WITH {}, collect(DISTINCT {}) AS {}_to_delete",
            carry.join(", "),
            delete_var,
            delete_var
        ));
        clauses.push(format!(
            "FOREACH(x IN {}_to_delete | DETACH DELETE x)",
            delete_var
        ));
    }
    Ok(())
}

/// Required single relationships are validated after writes: exactly one
/// edge must exist or the statement aborts.
pub(super) fn cardinality_checks(
    _ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    clauses: &mut Vec<String>,
) {
    for rel in node.relationships.iter().filter(|r| r.required) {
        let RelTarget::Node(target_name) = &rel.target else { continue };
        let check_var = format!("{}_{}_{}_unique", var, rel.field_name, target_name);
        let pattern = rel.pattern(
            var,
            Some(&check_var),
            &format!(":{}", escape_identifier(target_name)),
        );
        let block = [
            format!("WITH {}", var),
            format!("MATCH {}", pattern),
            format!("WITH count({}) AS c", check_var),
            format!(
                "CALL apoc.util.validate(NOT (c = 1), '{}.{} required', [0])",
                node.name, rel.field_name
            ),
            format!("RETURN c AS {}_ignored", check_var),
        ];
        clauses.push(format!("WITH {}", var));
        clauses.push(format!("CALL {{\n{}\n}}", block.join("\n")));
    }
}

/// Emit the write-time bind validation for a node, when any bind rule is
/// scoped to the operation.
pub(super) fn append_bind_clause(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    operation: AuthOperation,
    clauses: &mut Vec<String>,
) -> Result<(), TranslationError> {
    let Some(annotation) = node.auth.clone() else {
        return Ok(());
    };
    let auth_ctx = ctx.auth.clone();
    if let Some(predicate) =
        auth::bind_validation(node, &annotation, operation, var, &auth_ctx)?
    {
        ctx.bind_auth();
        clauses.push(format!("WITH {}", var));
        clauses.push(format!(
            "CALL apoc.util.validate(NOT ({}), \"Forbidden\", [0])",
            predicate
        ));
    }
    Ok(())
}
