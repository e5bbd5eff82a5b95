//! Compiles selection trees into Cypher projection expressions.
//!
//! Scalar fields become map-projection entries, relationship traversals
//! become pattern comprehensions, and interface/union traversals become
//! `CALL { ... UNION ... }` branches (one per implementing type, each
//! returning a `__resolveType` discriminator) collected back into the
//! parent projection. Where a subquery clause cannot be emitted (inside a
//! comprehension) polymorphic traversals fall back to concatenated
//! per-type comprehensions.

use serde_json::Value;

use crate::cypher::{encode_int, escape_identifier, quote};
use crate::type_model::{Node, Relationship};

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::operation::Selection;
use super::where_clause::{self, Scope};

#[derive(Debug, Default)]
pub struct Projection {
    pub entries: Vec<String>,
    /// Clauses (WITH/CALL blocks) that must precede the RETURN.
    pub pre_clauses: Vec<String>,
}

impl Projection {
    pub fn map_projection(&self, var: &str) -> String {
        if self.entries.is_empty() {
            format!("{} {{ }}", var)
        } else {
            format!("{} {{ {} }}", var, self.entries.join(", "))
        }
    }

    pub fn literal_map(&self) -> String {
        if self.entries.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", self.entries.join(", "))
        }
    }
}

pub fn build_projection(
    ctx: &mut TranslationContext<'_>,
    node: &Node,
    var: &str,
    prefix: &str,
    selections: &[Selection],
    literal: bool,
    allow_clauses: bool,
) -> Result<Projection, TranslationError> {
    let mut projection = Projection::default();

    for sel in selections {
        let out = sel.output_name();

        if sel.name == "__typename" {
            projection
                .entries
                .push(format!("__typename: {}", quote(&node.name)));
            continue;
        }

        if let Some(field) = node.field(&sel.name) {
            if !field.readable() {
                return Err(TranslationError::UnknownField {
                    owner: node.name.clone(),
                    field: sel.name.clone(),
                });
            }
            if field.computed {
                // Computed fields are resolved outside the statement.
                continue;
            }
            let prop = field.db_property();
            if !literal && out == prop {
                projection.entries.push(format!(".{}", prop));
            } else {
                projection.entries.push(format!("{}: {}.{}", out, var, prop));
            }
            continue;
        }

        if let Some(rel) = node.relationship(&sel.name) {
            let entry = traversal_entry(ctx, rel, var, prefix, sel, allow_clauses)?;
            match entry {
                TraversalEntry::Inline(expr) => {
                    projection.entries.push(format!("{}: {}", out, expr))
                }
                TraversalEntry::Clause { clauses, collected } => {
                    projection.pre_clauses.extend(clauses);
                    projection.entries.push(format!("{}: {}", out, collected));
                }
            }
            continue;
        }

        if let Some(base) = sel.name.strip_suffix("Connection") {
            if let Some(rel) = node.relationship(base) {
                let expr = connection_entry(ctx, rel, var, prefix, sel)?;
                projection.entries.push(format!("{}: {}", out, expr));
                continue;
            }
        }

        if let Some(base) = sel.name.strip_suffix("Aggregate") {
            if let Some(rel) = node.relationship(base) {
                let expr = aggregate_entry(ctx, rel, var, prefix, sel)?;
                projection.entries.push(format!("{}: {}", out, expr));
                continue;
            }
        }

        return Err(TranslationError::UnknownField {
            owner: node.name.clone(),
            field: sel.name.clone(),
        });
    }

    Ok(projection)
}

enum TraversalEntry {
    Inline(String),
    Clause { clauses: Vec<String>, collected: String },
}

fn traversal_entry(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    var: &str,
    prefix: &str,
    sel: &Selection,
    allow_clauses: bool,
) -> Result<TraversalEntry, TranslationError> {
    let targets: Vec<Node> = rel
        .target
        .concrete_types()
        .iter()
        .map(|name| {
            ctx.model
                .node(name)
                .cloned()
                .ok_or_else(|| TranslationError::UnknownNode((*name).to_string()))
        })
        .collect::<Result<_, _>>()?;

    if !rel.target.is_polymorphic() {
        let target = &targets[0];
        let expr = comprehension(ctx, rel, target, var, prefix, sel, None)?;
        let expr = apply_slice(ctx, expr, prefix, sel)?;
        return Ok(TraversalEntry::Inline(if rel.list {
            expr
        } else {
            format!("head({})", expr)
        }));
    }

    if !allow_clauses {
        // Inside a comprehension: concatenate one typed comprehension per
        // implementing type.
        let mut lists = Vec::new();
        for target in &targets {
            lists.push(comprehension(ctx, rel, target, var, prefix, sel, Some(&target.name))?);
        }
        let expr = lists.join(" + ");
        return Ok(TraversalEntry::Inline(if rel.list {
            format!("({})", expr)
        } else {
            format!("head({})", expr)
        }));
    }

    // One CALL branch per implementing type, combined by UNION; every
    // branch returns a type discriminator next to its fields.
    let out_var = format!("{}_{}", var, sel.output_name());
    let mut branches = Vec::new();
    for target in &targets {
        let branch_var = format!("{}_{}", var, target.name);
        let branch_prefix = format!("{}_{}_{}", prefix, sel.output_name(), target.name);
        let mut clause = vec![
            format!("WITH {}", var),
            format!(
                "MATCH {}",
                rel.pattern(
                    var,
                    None,
                    &format!("{}:{}", branch_var, escape_identifier(target.primary_label()))
                )
            ),
        ];
        if let Some(where_value) = sel
            .where_
            .as_ref()
            .and_then(|w| where_clause::branch_where_value(w, &target.name))
        {
            if let Some(predicate) = where_clause::compile_where(
                ctx,
                Scope::Node(target),
                &branch_var,
                &branch_prefix,
                &where_value,
            )? {
                clause.push(format!("WHERE {}", predicate));
            }
        }
        let inner = branch_projection(ctx, target, &branch_var, &branch_prefix, sel)?;
        clause.push(format!("RETURN {} AS {}", inner, out_var));
        branches.push(clause.join("\n"));
    }

    let clauses = vec![
        format!("WITH {}", var),
        format!("CALL {{\n{}\n}}", branches.join("\nUNION\n")),
    ];
    let collected = if rel.list {
        format!("collect({})", out_var)
    } else {
        format!("head(collect({}))", out_var)
    };
    Ok(TraversalEntry::Clause { clauses, collected })
}

/// Literal map for one polymorphic branch: discriminator plus the generic
/// selections and any per-type sub-selection for this implementing type.
fn branch_projection(
    ctx: &mut TranslationContext<'_>,
    target: &Node,
    var: &str,
    prefix: &str,
    sel: &Selection,
) -> Result<String, TranslationError> {
    let mut selections: Vec<Selection> = sel.selection.clone();
    if let Some(type_selection) = sel.type_selection(&target.name) {
        selections.extend(type_selection.selection.iter().cloned());
    }
    let projection = build_projection(ctx, target, var, prefix, &selections, true, false)?;
    let mut entries = vec![format!("__resolveType: {}", quote(&target.name))];
    entries.extend(projection.entries);
    Ok(format!("{{ {} }}", entries.join(", ")))
}

/// `[ (this)-[:TYPE]->(x:Label) WHERE ... | x { ... } ]`
fn comprehension(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    target: &Node,
    var: &str,
    prefix: &str,
    sel: &Selection,
    discriminated: Option<&str>,
) -> Result<String, TranslationError> {
    let inner_var = match discriminated {
        Some(type_name) => format!("{}_{}_{}", var, sel.output_name(), type_name),
        None => format!("{}_{}", var, sel.output_name()),
    };
    let inner_prefix = match discriminated {
        Some(type_name) => format!("{}_{}_{}", prefix, sel.output_name(), type_name),
        None => format!("{}_{}", prefix, sel.output_name()),
    };

    let pattern = rel.pattern(
        var,
        None,
        &format!("{}:{}", inner_var, escape_identifier(target.primary_label())),
    );

    let mut guard = String::new();
    let where_value = match (discriminated, &sel.where_) {
        (Some(type_name), Some(w)) => where_clause::branch_where_value(w, type_name),
        (None, Some(w)) => Some((*w).clone()),
        _ => None,
    };
    if let Some(where_value) = where_value {
        if let Some(predicate) = where_clause::compile_where(
            ctx,
            Scope::Node(target),
            &inner_var,
            &inner_prefix,
            &where_value,
        )? {
            guard = format!(" WHERE {}", predicate);
        }
    }

    let body = if let Some(type_name) = discriminated {
        let mut selections: Vec<Selection> = sel.selection.clone();
        if let Some(type_selection) = sel.type_selection(type_name) {
            selections.extend(type_selection.selection.iter().cloned());
        }
        let projection =
            build_projection(ctx, target, &inner_var, &inner_prefix, &selections, true, false)?;
        let mut entries = vec![format!("__resolveType: {}", quote(type_name))];
        entries.extend(projection.entries);
        format!("{{ {} }}", entries.join(", "))
    } else {
        let projection =
            build_projection(ctx, target, &inner_var, &inner_prefix, &sel.selection, false, false)?;
        projection.map_projection(&inner_var)
    };

    Ok(format!("[{}{} | {}]", pattern, guard, body))
}

/// Apply traversal options (limit/offset) as a list slice.
fn apply_slice(
    ctx: &mut TranslationContext<'_>,
    expr: String,
    prefix: &str,
    sel: &Selection,
) -> Result<String, TranslationError> {
    let Some(options) = sel.options.as_ref().and_then(Value::as_object) else {
        return Ok(expr);
    };
    let limit = options.get("limit").and_then(Value::as_i64);
    let offset = options.get("offset").and_then(Value::as_i64);
    Ok(match (offset, limit) {
        (None, None) => expr,
        (Some(offset), None) => {
            let p = ctx.add_param(
                format!("{}_{}_offset", prefix, sel.output_name()),
                encode_int(offset),
            );
            format!("{}[${}..]", expr, p)
        }
        (None, Some(limit)) => {
            let p = ctx.add_param(
                format!("{}_{}_limit", prefix, sel.output_name()),
                encode_int(limit),
            );
            format!("{}[..${}]", expr, p)
        }
        (Some(offset), Some(limit)) => {
            let po = ctx.add_param(
                format!("{}_{}_offset", prefix, sel.output_name()),
                encode_int(offset),
            );
            let pl = ctx.add_param(
                format!("{}_{}_limit", prefix, sel.output_name()),
                encode_int(limit),
            );
            format!("{}[${}..${} + ${}]", expr, po, po, pl)
        }
    })
}

/// Connection field projection: edges as a comprehension binding the
/// relationship, totalCount as a size() over the same pattern.
fn connection_entry(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    var: &str,
    prefix: &str,
    sel: &Selection,
) -> Result<String, TranslationError> {
    let edges_sel = sel.selection.iter().find(|s| s.name == "edges");
    let wants_total = sel.selection.iter().any(|s| s.name == "totalCount");

    let props = rel
        .properties
        .as_ref()
        .and_then(|name| ctx.model.relationship_properties(name).cloned());

    let targets: Vec<Node> = rel
        .target
        .concrete_types()
        .iter()
        .map(|name| {
            ctx.model
                .node(name)
                .cloned()
                .ok_or_else(|| TranslationError::UnknownNode((*name).to_string()))
        })
        .collect::<Result<_, _>>()?;
    let polymorphic = rel.target.is_polymorphic();

    let mut edge_lists = Vec::new();
    let mut count_terms = Vec::new();
    for target in &targets {
        let rel_var = format!("{}_{}_relationship", var, rel.field_name);
        let node_var = if polymorphic {
            format!("{}_{}_{}", var, rel.field_name, target.name)
        } else {
            format!("{}_{}", var, rel.field_name)
        };
        let branch_prefix = if polymorphic {
            format!("{}_{}Connection_{}", prefix, rel.field_name, target.name)
        } else {
            format!("{}_{}Connection", prefix, rel.field_name)
        };
        let pattern = rel.pattern(
            var,
            Some(&rel_var),
            &format!("{}:{}", node_var, escape_identifier(target.primary_label())),
        );

        let mut guard = String::new();
        // Union connection filters are keyed per member; node and interface
        // targets share one filter across branches.
        let connection_where = match (&sel.where_, &rel.target) {
            (Some(w), crate::type_model::RelTarget::Union { .. }) => {
                w.as_object().and_then(|o| o.get(&target.name)).cloned()
            }
            (Some(w), _) => Some((*w).clone()),
            (None, _) => None,
        };
        if let Some(where_value) = connection_where {
            if let Some(predicate) = where_clause::compile_connection_where(
                ctx,
                target,
                props.as_ref(),
                &node_var,
                Some(&rel_var),
                &branch_prefix,
                &where_value,
            )? {
                guard = format!(" WHERE {}", predicate);
            }
        }

        let mut edge_entries = Vec::new();
        if let Some(edges_sel) = edges_sel {
            for edge_field in &edges_sel.selection {
                match edge_field.name.as_str() {
                    // Cursors encode positions; the caller derives them
                    // from result order.
                    "cursor" => {}
                    "node" => {
                        let mut selections: Vec<Selection> = edge_field.selection.clone();
                        if let Some(type_selection) = edge_field.type_selection(&target.name) {
                            selections.extend(type_selection.selection.iter().cloned());
                        }
                        let projection = build_projection(
                            ctx,
                            target,
                            &node_var,
                            &branch_prefix,
                            &selections,
                            true,
                            false,
                        )?;
                        let mut entries = Vec::new();
                        if polymorphic {
                            entries.push(format!("__resolveType: {}", quote(&target.name)));
                        }
                        entries.extend(projection.entries);
                        edge_entries.push(format!("node: {{ {} }}", entries.join(", ")));
                    }
                    name => {
                        let field = props
                            .as_ref()
                            .and_then(|p| p.field(name))
                            .ok_or_else(|| TranslationError::UnknownField {
                                owner: format!("{}Connection edge", rel.field_name),
                                field: name.to_string(),
                            })?;
                        edge_entries.push(format!(
                            "{}: {}.{}",
                            edge_field.output_name(),
                            rel_var,
                            field.db_property()
                        ));
                    }
                }
            }
        }
        edge_lists.push(format!(
            "[{}{} | {{ {} }}]",
            pattern,
            guard,
            edge_entries.join(", ")
        ));
        count_terms.push(format!("size([{}{} | 1])", pattern, guard));
    }

    let mut entries = Vec::new();
    if edges_sel.is_some() {
        entries.push(format!("edges: {}", edge_lists.join(" + ")));
    }
    if wants_total {
        let total = if count_terms.len() == 1 {
            count_terms.remove(0)
        } else {
            format!("({})", count_terms.join(" + "))
        };
        entries.push(format!("totalCount: {}", total));
    }
    Ok(format!("{{ {} }}", entries.join(", ")))
}

/// Relationship aggregation selection compiled as static expressions over
/// pattern comprehensions.
fn aggregate_entry(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    var: &str,
    prefix: &str,
    sel: &Selection,
) -> Result<String, TranslationError> {
    let crate::type_model::RelTarget::Node(target_name) = &rel.target else {
        return Err(TranslationError::invalid(
            "aggregation selections are only supported on concrete node targets",
        ));
    };
    let target = ctx
        .model
        .node(target_name)
        .cloned()
        .ok_or_else(|| TranslationError::UnknownNode(target_name.clone()))?;

    let inner_var = format!("{}_{}", var, rel.field_name);
    let pattern = rel.pattern(
        var,
        None,
        &format!("{}:{}", inner_var, escape_identifier(target.primary_label())),
    );
    let mut guard = String::new();
    if let Some(where_value) = &sel.where_ {
        let inner_prefix = format!("{}_{}Aggregate", prefix, rel.field_name);
        if let Some(predicate) = where_clause::compile_where(
            ctx,
            Scope::Node(&target),
            &inner_var,
            &inner_prefix,
            where_value,
        )? {
            guard = format!(" WHERE {}", predicate);
        }
    }

    let mut entries = Vec::new();
    for agg_sel in &sel.selection {
        match agg_sel.name.as_str() {
            "count" => entries.push(format!("count: size([{}{} | 1])", pattern, guard)),
            "node" => {
                let mut node_entries = Vec::new();
                for field_sel in &agg_sel.selection {
                    let field = target.field(&field_sel.name).ok_or_else(|| {
                        TranslationError::UnknownField {
                            owner: target.name.clone(),
                            field: field_sel.name.clone(),
                        }
                    })?;
                    let list =
                        format!("[{}{} | {}.{}]", pattern, guard, inner_var, field.db_property());
                    let mut function_entries = Vec::new();
                    for function_sel in &field_sel.selection {
                        function_entries.push(format!(
                            "{}: {}",
                            function_sel.name,
                            aggregate_function(&function_sel.name, &list)?
                        ));
                    }
                    node_entries.push(format!(
                        "{}: {{ {} }}",
                        field_sel.name,
                        function_entries.join(", ")
                    ));
                }
                entries.push(format!("node: {{ {} }}", node_entries.join(", ")));
            }
            other => {
                return Err(TranslationError::UnknownField {
                    owner: format!("{}Aggregate", rel.field_name),
                    field: other.to_string(),
                })
            }
        }
    }
    Ok(format!("{{ {} }}", entries.join(", ")))
}

pub(super) fn aggregate_function(name: &str, list: &str) -> Result<String, TranslationError> {
    Ok(match name {
        "sum" => format!("reduce(acc = 0, v IN {} | acc + v)", list),
        "min" => format!(
            "reduce(acc = null, v IN {} | CASE WHEN acc IS NULL OR v < acc THEN v ELSE acc END)",
            list
        ),
        "max" => format!(
            "reduce(acc = null, v IN {} | CASE WHEN acc IS NULL OR v > acc THEN v ELSE acc END)",
            list
        ),
        "average" => format!(
            "CASE WHEN size({list}) = 0 THEN null ELSE toFloat(reduce(acc = 0, v IN {list} | acc + v)) / size({list}) END",
            list = list
        ),
        "shortest" => format!(
            "reduce(acc = null, v IN {} | CASE WHEN acc IS NULL OR size(v) < size(acc) THEN v ELSE acc END)",
            list
        ),
        "longest" => format!(
            "reduce(acc = null, v IN {} | CASE WHEN acc IS NULL OR size(v) > size(acc) THEN v ELSE acc END)",
            list
        ),
        other => {
            return Err(TranslationError::invalid(format!(
                "unknown aggregate function \"{}\"",
                other
            )))
        }
    })
}
