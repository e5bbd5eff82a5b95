//! Read, aggregate and connection root translation.

use serde_json::{json, Value};

use crate::auth;
use crate::cypher::{encode_int, quote};
use crate::type_model::Node;
use crate::utils::paging;

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::node_labels_pattern;
use super::operation::{AggregateOperation, ConnectionOperation, ReadOperation};
use super::projection::{aggregate_function, build_projection};
use super::where_clause::{self, Scope};

pub fn translate_read(
    ctx: &mut TranslationContext<'_>,
    op: &ReadOperation,
) -> Result<String, TranslationError> {
    let node = ctx
        .model
        .node(&op.node)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(op.node.clone()))?;
    let var = "this";

    let mut clauses = Vec::new();
    let mut where_parts = Vec::new();

    if let Some(fulltext) = &op.fulltext {
        let clause = fulltext_call(ctx, &node, var, fulltext)?;
        clauses.push(clause);
        // The index yields untyped hits; keep only rows carrying the
        // node's label.
        where_parts.push(format!("{} IN labels({})", quote(node.primary_label()), var));
    } else {
        clauses.push(format!("MATCH ({}:{})", var, node_labels_pattern(&node)));
    }

    if let Some(where_value) = &op.where_ {
        if let Some(predicate) =
            where_clause::compile_where(ctx, Scope::Node(&node), var, var, where_value)?
        {
            where_parts.push(predicate);
        }
    }
    if let Some(annotation) = node.auth.clone() {
        if let Some(predicate) = auth::read_predicate(&node, &annotation, var)? {
            ctx.bind_auth();
            where_parts.push(format!("({})", predicate));
        }
    }
    if !where_parts.is_empty() {
        clauses.push(format!("WHERE {}", where_parts.join(" AND ")));
    }

    let projection = build_projection(ctx, &node, var, var, &op.selection, false, true)?;
    let return_clause = format!("RETURN {} AS {}", projection.map_projection(var), var);
    clauses.extend(projection.pre_clauses);
    clauses.push(return_clause);

    if let Some(options) = op.options.as_ref().and_then(Value::as_object) {
        if let Some(sort) = options.get("sort") {
            if let Some(order_by) = order_by_clause(&node, var, sort)? {
                clauses.push(order_by);
            }
        }
        if let Some(offset) = options.get("offset").and_then(Value::as_i64) {
            let p = ctx.add_param(format!("{}_offset", var), encode_int(offset));
            clauses.push(format!("SKIP ${}", p));
        }
        if let Some(limit) = options.get("limit").and_then(Value::as_i64) {
            let p = ctx.add_param(format!("{}_limit", var), encode_int(limit));
            clauses.push(format!("LIMIT ${}", p));
        }
    }

    Ok(clauses.join("\n"))
}

/// Exactly one named full-text index may be queried per operation.
fn fulltext_call(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    fulltext: &Value,
) -> Result<String, TranslationError> {
    let Some(object) = fulltext.as_object() else {
        return Err(TranslationError::invalid("fulltext argument must be an object"));
    };
    if object.len() > 1 {
        return Err(TranslationError::MultipleFulltext);
    }
    let Some((index_name, payload)) = object.iter().next() else {
        return Err(TranslationError::invalid("fulltext argument is empty"));
    };
    if node.fulltext_index(index_name).is_none() {
        return Err(TranslationError::UnknownFulltextIndex {
            node: node.name.clone(),
            index: index_name.clone(),
        });
    }
    let phrase = payload
        .get("phrase")
        .and_then(Value::as_str)
        .ok_or_else(|| TranslationError::invalid("fulltext phrase must be a string"))?;
    let p = ctx.add_param(
        format!("{}_fulltext_{}_phrase", var, index_name),
        json!(phrase),
    );
    Ok(format!(
        "CALL db.index.fulltext.queryNodes({}, ${}) YIELD node AS {}",
        quote(index_name),
        p,
        var
    ))
}

pub(super) fn order_by_clause(
    node: &Node,
    var: &str,
    sort: &Value,
) -> Result<Option<String>, TranslationError> {
    let Some(items) = sort.as_array() else {
        return Err(TranslationError::invalid("sort must be a list"));
    };
    let mut keys = Vec::new();
    for item in items {
        let Some(object) = item.as_object() else {
            return Err(TranslationError::invalid("sort entries must be objects"));
        };
        for (field_name, direction) in object {
            let field = node.field(field_name).ok_or_else(|| {
                TranslationError::UnknownField {
                    owner: node.name.clone(),
                    field: field_name.clone(),
                }
            })?;
            let direction = match direction.as_str() {
                Some("ASC") => "ASC",
                Some("DESC") => "DESC",
                _ => {
                    return Err(TranslationError::invalid(
                        "sort direction must be ASC or DESC",
                    ))
                }
            };
            keys.push(format!("{}.{} {}", var, field.db_property(), direction));
        }
    }
    if keys.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format!("ORDER BY {}", keys.join(", "))))
    }
}

pub fn translate_aggregate(
    ctx: &mut TranslationContext<'_>,
    op: &AggregateOperation,
) -> Result<String, TranslationError> {
    let node = ctx
        .model
        .node(&op.node)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(op.node.clone()))?;
    let var = "this";

    let mut clauses = vec![format!("MATCH ({}:{})", var, node_labels_pattern(&node))];
    let mut where_parts = Vec::new();
    if let Some(where_value) = &op.where_ {
        if let Some(predicate) =
            where_clause::compile_where(ctx, Scope::Node(&node), var, var, where_value)?
        {
            where_parts.push(predicate);
        }
    }
    if let Some(annotation) = node.auth.clone() {
        if let Some(predicate) = auth::read_predicate(&node, &annotation, var)? {
            ctx.bind_auth();
            where_parts.push(format!("({})", predicate));
        }
    }
    if !where_parts.is_empty() {
        clauses.push(format!("WHERE {}", where_parts.join(" AND ")));
    }

    let mut entries = Vec::new();
    for sel in &op.selection {
        match sel.name.as_str() {
            "count" => entries.push(format!("count: count({})", var)),
            field_name => {
                let field = node.field(field_name).ok_or_else(|| {
                    TranslationError::UnknownField {
                        owner: node.name.clone(),
                        field: field_name.to_string(),
                    }
                })?;
                let prop = format!("{}.{}", var, field.db_property());
                let mut function_entries = Vec::new();
                for function_sel in &sel.selection {
                    let expr = match function_sel.name.as_str() {
                        "min" => format!("min({})", prop),
                        "max" => format!("max({})", prop),
                        "average" => format!("avg({})", prop),
                        "sum" => format!("sum({})", prop),
                        // Length-based selectors have no aggregation
                        // function; fold over the collected values.
                        "shortest" | "longest" => {
                            aggregate_function(&function_sel.name, &format!("collect({})", prop))?
                        }
                        other => {
                            return Err(TranslationError::invalid(format!(
                                "unknown aggregate function \"{}\"",
                                other
                            )))
                        }
                    };
                    function_entries.push(format!("{}: {}", function_sel.name, expr));
                }
                entries.push(format!("{}: {{ {} }}", field_name, function_entries.join(", ")));
            }
        }
    }
    clauses.push(format!("RETURN {{ {} }}", entries.join(", ")));

    Ok(clauses.join("\n"))
}

pub fn translate_connection(
    ctx: &mut TranslationContext<'_>,
    op: &ConnectionOperation,
) -> Result<String, TranslationError> {
    let node = ctx
        .model
        .node(&op.node)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(op.node.clone()))?;
    let var = "this";

    let mut clauses = vec![format!("MATCH ({}:{})", var, node_labels_pattern(&node))];
    let mut where_parts = Vec::new();
    if let Some(where_value) = &op.where_ {
        if let Some(predicate) =
            where_clause::compile_where(ctx, Scope::Node(&node), var, var, where_value)?
        {
            where_parts.push(predicate);
        }
    }
    if let Some(annotation) = node.auth.clone() {
        if let Some(predicate) = auth::read_predicate(&node, &annotation, var)? {
            ctx.bind_auth();
            where_parts.push(format!("({})", predicate));
        }
    }
    if !where_parts.is_empty() {
        clauses.push(format!("WHERE {}", where_parts.join(" AND ")));
    }

    clauses.push(format!("WITH collect({}) AS edges", var));
    clauses.push("WITH edges, size(edges) AS totalCount".to_string());
    clauses.push(format!("UNWIND edges AS {}", var));
    clauses.push(format!("WITH {}, totalCount", var));

    if let Some(sort) = &op.sort {
        if let Some(order_by) = order_by_clause(&node, var, sort)? {
            clauses.push(order_by);
        }
    }
    if let Some(after) = &op.after {
        let offset = paging::cursor_to_offset(after)
            .ok_or_else(|| TranslationError::InvalidCursor(after.clone()))?;
        let p = ctx.add_param(format!("{}_after_offset", var), encode_int(offset + 1));
        clauses.push(format!("SKIP ${}", p));
    }
    if let Some(first) = op.first {
        let p = ctx.add_param(format!("{}_first", var), encode_int(first));
        clauses.push(format!("LIMIT ${}", p));
    }

    let edges_sel = op.selection.iter().find(|s| s.name == "edges");
    let node_projection = match edges_sel {
        Some(edges_sel) => {
            let node_sel = edges_sel.selection.iter().find(|s| s.name == "node");
            match node_sel {
                Some(node_sel) => {
                    let projection =
                        build_projection(ctx, &node, var, var, &node_sel.selection, false, false)?;
                    projection.map_projection(var)
                }
                None => format!("{} {{ }}", var),
            }
        }
        None => format!("{} {{ }}", var),
    };
    clauses.push(format!(
        "RETURN {{ edges: collect({{ node: {} }}), totalCount: totalCount }} AS {}",
        node_projection, var
    ));

    Ok(clauses.join("\n"))
}
