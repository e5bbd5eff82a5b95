//! Compiles where arguments into boolean predicate trees.
//!
//! Per-field operators map onto comparison and membership expressions,
//! `AND`/`OR` compose recursively, and relationship quantifiers compile to
//! pattern-comprehension counting checks so no runtime sub-statement
//! interpretation is needed.

use serde_json::Value;

use crate::cypher::{encode_int, scalar_param};
use crate::type_model::{Field, Node, RelTarget, Relationship, RelationshipProperties};

use super::context::TranslationContext;
use super::errors::TranslationError;

/// What a where object is compiled against: a node (fields plus
/// relationships) or a bare field set (edge properties).
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Node(&'a Node),
    Fields { owner: &'a str, fields: &'a [Field] },
}

impl<'a> Scope<'a> {
    fn owner(&self) -> &str {
        match self {
            Scope::Node(node) => &node.name,
            Scope::Fields { owner, .. } => owner,
        }
    }

    fn field(&self, name: &str) -> Option<&'a Field> {
        match self {
            Scope::Node(node) => node.field(name),
            Scope::Fields { fields, .. } => fields.iter().find(|f| f.name == name),
        }
    }

    fn relationship(&self, name: &str) -> Option<&'a Relationship> {
        match self {
            Scope::Node(node) => node.relationship(name),
            Scope::Fields { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarOp {
    Eq,
    Not,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Lt,
    Lte,
    Gt,
    Gte,
    Includes,
    NotIncludes,
}

/// Suffix table ordered longest-first so `_NOT_IN` wins over `_IN` and
/// `_NOT` never shadows its compounds.
const SCALAR_SUFFIXES: &[(&str, ScalarOp)] = &[
    ("_NOT_STARTS_WITH", ScalarOp::NotStartsWith),
    ("_NOT_ENDS_WITH", ScalarOp::NotEndsWith),
    ("_NOT_CONTAINS", ScalarOp::NotContains),
    ("_NOT_INCLUDES", ScalarOp::NotIncludes),
    ("_STARTS_WITH", ScalarOp::StartsWith),
    ("_ENDS_WITH", ScalarOp::EndsWith),
    ("_CONTAINS", ScalarOp::Contains),
    ("_INCLUDES", ScalarOp::Includes),
    ("_NOT_IN", ScalarOp::NotIn),
    ("_NOT", ScalarOp::Not),
    ("_LTE", ScalarOp::Lte),
    ("_GTE", ScalarOp::Gte),
    ("_IN", ScalarOp::In),
    ("_LT", ScalarOp::Lt),
    ("_GT", ScalarOp::Gt),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    All,
    None,
    Single,
    Some,
}

const QUANTIFIER_SUFFIXES: &[(&str, Quantifier)] = &[
    ("_SINGLE", Quantifier::Single),
    ("_NONE", Quantifier::None),
    ("_SOME", Quantifier::Some),
    ("_ALL", Quantifier::All),
];

pub fn compile_where(
    ctx: &mut TranslationContext<'_>,
    scope: Scope<'_>,
    var: &str,
    prefix: &str,
    value: &Value,
) -> Result<Option<String>, TranslationError> {
    let Some(object) = value.as_object() else {
        return Err(TranslationError::invalid(format!(
            "where on \"{}\" must be an object",
            scope.owner()
        )));
    };

    let mut parts = Vec::new();
    for (key, entry) in object {
        match key.as_str() {
            "AND" | "OR" => {
                let Some(items) = entry.as_array() else {
                    return Err(TranslationError::invalid(format!("{} expects a list", key)));
                };
                let mut compiled = Vec::new();
                for item in items {
                    if let Some(predicate) = compile_where(ctx, scope, var, prefix, item)? {
                        compiled.push(format!("({})", predicate));
                    }
                }
                if !compiled.is_empty() {
                    parts.push(format!("({})", compiled.join(&format!(" {} ", key))));
                }
            }
            // `_on` only has meaning inside polymorphic branches, where the
            // caller resolves it before compiling; stray keys are dropped.
            "_on" => {}
            _ => parts.push(compile_entry(ctx, scope, var, prefix, key, entry)?),
        }
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join(" AND ")))
    }
}

fn compile_entry(
    ctx: &mut TranslationContext<'_>,
    scope: Scope<'_>,
    var: &str,
    prefix: &str,
    key: &str,
    value: &Value,
) -> Result<String, TranslationError> {
    if let Some(field) = scope.field(key) {
        return scalar_predicate(ctx, field, var, prefix, key, ScalarOp::Eq, value);
    }
    if let Some(rel) = scope.relationship(key) {
        return relationship_predicate(ctx, rel, var, prefix, Quantifier::Some, value);
    }
    if let Some(base) = key.strip_suffix("Aggregate") {
        if let Some(rel) = scope.relationship(base) {
            return aggregate_predicate(ctx, rel, var, prefix, value);
        }
    }
    for (suffix, quantifier) in QUANTIFIER_SUFFIXES {
        if let Some(base) = key.strip_suffix(suffix) {
            if let Some(rel) = scope.relationship(base) {
                return relationship_predicate(ctx, rel, var, prefix, *quantifier, value);
            }
        }
    }
    for (suffix, op) in SCALAR_SUFFIXES {
        if let Some(base) = key.strip_suffix(suffix) {
            if let Some(field) = scope.field(base) {
                return scalar_predicate(ctx, field, var, prefix, key, *op, value);
            }
            if *op == ScalarOp::Not {
                if let Some(rel) = scope.relationship(base) {
                    return relationship_predicate(ctx, rel, var, prefix, Quantifier::None, value);
                }
            }
        }
    }
    Err(TranslationError::UnknownOperator {
        owner: scope.owner().to_string(),
        key: key.to_string(),
    })
}

fn scalar_predicate(
    ctx: &mut TranslationContext<'_>,
    field: &Field,
    var: &str,
    prefix: &str,
    key: &str,
    op: ScalarOp,
    value: &Value,
) -> Result<String, TranslationError> {
    let prop = field.db_property();

    if value.is_null() {
        return match op {
            ScalarOp::Eq => Ok(format!("{}.{} IS NULL", var, prop)),
            ScalarOp::Not => Ok(format!("{}.{} IS NOT NULL", var, prop)),
            _ => Err(TranslationError::invalid(format!(
                "operator \"{}\" does not accept null",
                key
            ))),
        };
    }

    let list = match op {
        ScalarOp::In | ScalarOp::NotIn => true,
        ScalarOp::Includes | ScalarOp::NotIncludes => false,
        _ => field.list,
    };
    let converted = scalar_param(&field.name, &field.field_type, list, value)?;
    let param = ctx.add_param(format!("{}_{}", prefix, key), converted);

    Ok(match op {
        ScalarOp::Eq => format!("{}.{} = ${}", var, prop, param),
        ScalarOp::Not => format!("(NOT {}.{} = ${})", var, prop, param),
        ScalarOp::In => format!("{}.{} IN ${}", var, prop, param),
        ScalarOp::NotIn => format!("(NOT {}.{} IN ${})", var, prop, param),
        ScalarOp::Contains => format!("{}.{} CONTAINS ${}", var, prop, param),
        ScalarOp::NotContains => format!("(NOT {}.{} CONTAINS ${})", var, prop, param),
        ScalarOp::StartsWith => format!("{}.{} STARTS WITH ${}", var, prop, param),
        ScalarOp::NotStartsWith => format!("(NOT {}.{} STARTS WITH ${})", var, prop, param),
        ScalarOp::EndsWith => format!("{}.{} ENDS WITH ${}", var, prop, param),
        ScalarOp::NotEndsWith => format!("(NOT {}.{} ENDS WITH ${})", var, prop, param),
        ScalarOp::Lt => format!("{}.{} < ${}", var, prop, param),
        ScalarOp::Lte => format!("{}.{} <= ${}", var, prop, param),
        ScalarOp::Gt => format!("{}.{} > ${}", var, prop, param),
        ScalarOp::Gte => format!("{}.{} >= ${}", var, prop, param),
        ScalarOp::Includes => format!("${} IN {}.{}", param, var, prop),
        ScalarOp::NotIncludes => format!("(NOT ${} IN {}.{})", param, var, prop),
    })
}

/// Resolve the effective where value for one implementing type: an
/// `_on.{Type}` override replaces the generic filter entirely for that
/// type; other types keep the generic filter unchanged.
pub fn branch_where_value(value: &Value, type_name: &str) -> Option<Value> {
    let object = value.as_object()?;
    if let Some(on) = object.get("_on").and_then(|v| v.as_object()) {
        if let Some(replacement) = on.get(type_name) {
            return Some(replacement.clone());
        }
    }
    let mut cleaned = object.clone();
    cleaned.remove("_on");
    if cleaned.is_empty() {
        None
    } else {
        Some(Value::Object(cleaned))
    }
}

/// The (target node, effective where) branches a relationship filter fans
/// out to.
fn filter_branches<'m>(
    ctx: &TranslationContext<'m>,
    rel: &Relationship,
    value: &Value,
) -> Result<Vec<(&'m Node, Option<Value>)>, TranslationError> {
    match &rel.target {
        RelTarget::Node(name) => {
            let node = ctx
                .model
                .node(name)
                .ok_or_else(|| TranslationError::UnknownNode(name.clone()))?;
            let effective = if value.as_object().is_some_and(|o| o.is_empty()) {
                None
            } else {
                Some(value.clone())
            };
            Ok(vec![(node, effective)])
        }
        RelTarget::Interface { implementations, .. } => implementations
            .iter()
            .map(|name| {
                let node = ctx
                    .model
                    .node(name)
                    .ok_or_else(|| TranslationError::UnknownNode(name.clone()))?;
                Ok((node, branch_where_value(value, name)))
            })
            .collect(),
        RelTarget::Union { members, .. } => {
            let object = value.as_object().ok_or_else(|| {
                TranslationError::invalid("union relationship filter must be an object")
            })?;
            let mut branches = Vec::new();
            for member in members {
                if let Some(member_value) = object.get(member) {
                    let node = ctx
                        .model
                        .node(member)
                        .ok_or_else(|| TranslationError::UnknownNode(member.clone()))?;
                    let effective = if member_value.as_object().is_some_and(|o| o.is_empty()) {
                        None
                    } else {
                        Some(member_value.clone())
                    };
                    branches.push((node, effective));
                }
            }
            if branches.is_empty() {
                // An empty filter quantifies over every member.
                for member in members {
                    let node = ctx
                        .model
                        .node(member)
                        .ok_or_else(|| TranslationError::UnknownNode(member.clone()))?;
                    branches.push((node, None));
                }
            }
            Ok(branches)
        }
    }
}

fn relationship_predicate(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    var: &str,
    prefix: &str,
    quantifier: Quantifier,
    value: &Value,
) -> Result<String, TranslationError> {
    let branches = filter_branches(ctx, rel, value)?;
    let multi = branches.len() > 1;

    let mut counts = Vec::new();
    for (target, effective) in branches {
        let target = target.clone();
        let inner_var = if multi {
            format!("{}_{}_{}", var, rel.field_name, target.name)
        } else {
            format!("{}_{}", var, rel.field_name)
        };
        let inner_prefix = if multi {
            format!("{}_{}_{}", prefix, rel.field_name, target.name)
        } else {
            format!("{}_{}", prefix, rel.field_name)
        };
        let predicate = match &effective {
            Some(effective) => {
                compile_where(ctx, Scope::Node(&target), &inner_var, &inner_prefix, effective)?
            }
            None => None,
        };
        let pattern = rel.pattern(
            var,
            None,
            &format!(
                "{}:{}",
                inner_var,
                crate::cypher::escape_identifier(target.primary_label())
            ),
        );
        let guard = match (quantifier, predicate) {
            // ALL counts counterexamples; everything else counts matches.
            (Quantifier::All, Some(p)) => format!(" WHERE NOT ({})", p),
            (Quantifier::All, None) => continue,
            (_, Some(p)) => format!(" WHERE {}", p),
            (_, None) => String::new(),
        };
        counts.push(format!("size([{}{} | 1])", pattern, guard));
    }

    if counts.is_empty() {
        // ALL with no predicate is trivially satisfied.
        return Ok("true".to_string());
    }
    let total = if counts.len() == 1 {
        counts.remove(0)
    } else {
        format!("({})", counts.join(" + "))
    };

    Ok(match quantifier {
        Quantifier::Some => format!("{} > 0", total),
        Quantifier::None => format!("{} = 0", total),
        Quantifier::Single => format!("{} = 1", total),
        Quantifier::All => format!("{} = 0", total),
    })
}

fn aggregate_predicate(
    ctx: &mut TranslationContext<'_>,
    rel: &Relationship,
    var: &str,
    prefix: &str,
    value: &Value,
) -> Result<String, TranslationError> {
    let Some(object) = value.as_object() else {
        return Err(TranslationError::invalid("aggregate filter must be an object"));
    };
    let RelTarget::Node(target_name) = &rel.target else {
        return Err(TranslationError::invalid(
            "aggregate filters are only supported on concrete node targets",
        ));
    };
    let target = ctx
        .model
        .node(target_name)
        .ok_or_else(|| TranslationError::UnknownNode(target_name.clone()))?
        .clone();

    let inner_var = format!("{}_{}", var, rel.field_name);
    let pattern = rel.pattern(
        var,
        None,
        &format!(
            "{}:{}",
            inner_var,
            crate::cypher::escape_identifier(target.primary_label())
        ),
    );
    let count = format!("size([{} | 1])", pattern);

    let mut parts = Vec::new();
    for (key, entry) in object {
        match key.as_str() {
            "AND" | "OR" => {
                let Some(items) = entry.as_array() else {
                    return Err(TranslationError::invalid(format!("{} expects a list", key)));
                };
                let compiled = items
                    .iter()
                    .map(|item| aggregate_predicate(ctx, rel, var, prefix, item))
                    .collect::<Result<Vec<_>, _>>()?;
                parts.push(format!(
                    "({})",
                    compiled
                        .into_iter()
                        .map(|p| format!("({})", p))
                        .collect::<Vec<_>>()
                        .join(&format!(" {} ", key))
                ));
            }
            "count" | "count_LT" | "count_LTE" | "count_GT" | "count_GTE" => {
                let n = entry.as_i64().ok_or_else(|| {
                    TranslationError::invalid("aggregate count filters expect an integer")
                })?;
                let param = ctx.add_param(
                    format!("{}_{}Aggregate_{}", prefix, rel.field_name, key),
                    encode_int(n),
                );
                let operator = match key.as_str() {
                    "count" => "=",
                    "count_LT" => "<",
                    "count_LTE" => "<=",
                    "count_GT" => ">",
                    _ => ">=",
                };
                parts.push(format!("{} {} ${}", count, operator, param));
            }
            other => {
                return Err(TranslationError::UnknownOperator {
                    owner: target.name.clone(),
                    key: other.to_string(),
                })
            }
        }
    }
    Ok(parts.join(" AND "))
}

/// Connection-level where: `node`/`edge` sub-filters plus boolean
/// composition, compiled against an already-bound pattern.
pub fn compile_connection_where(
    ctx: &mut TranslationContext<'_>,
    target: &Node,
    props: Option<&RelationshipProperties>,
    node_var: &str,
    rel_var: Option<&str>,
    prefix: &str,
    value: &Value,
) -> Result<Option<String>, TranslationError> {
    let Some(object) = value.as_object() else {
        return Err(TranslationError::invalid("connection where must be an object"));
    };
    let mut parts = Vec::new();
    for (key, entry) in object {
        match key.as_str() {
            "AND" | "OR" => {
                let Some(items) = entry.as_array() else {
                    return Err(TranslationError::invalid(format!("{} expects a list", key)));
                };
                let mut compiled = Vec::new();
                for item in items {
                    if let Some(predicate) = compile_connection_where(
                        ctx, target, props, node_var, rel_var, prefix, item,
                    )? {
                        compiled.push(format!("({})", predicate));
                    }
                }
                if !compiled.is_empty() {
                    parts.push(format!("({})", compiled.join(&format!(" {} ", key))));
                }
            }
            "node" | "node_NOT" => {
                let inner = compile_where(
                    ctx,
                    Scope::Node(target),
                    node_var,
                    &format!("{}_node", prefix),
                    entry,
                )?;
                if let Some(inner) = inner {
                    if key == "node" {
                        parts.push(inner);
                    } else {
                        parts.push(format!("(NOT ({}))", inner));
                    }
                }
            }
            "edge" | "edge_NOT" => {
                let (Some(props), Some(rel_var)) = (props, rel_var) else {
                    return Err(TranslationError::invalid(
                        "edge filters require relationship properties",
                    ));
                };
                let scope = Scope::Fields { owner: &props.name, fields: &props.fields };
                let inner =
                    compile_where(ctx, scope, rel_var, &format!("{}_edge", prefix), entry)?;
                if let Some(inner) = inner {
                    if key == "edge" {
                        parts.push(inner);
                    } else {
                        parts.push(format!("(NOT ({}))", inner));
                    }
                }
            }
            other => {
                return Err(TranslationError::UnknownOperator {
                    owner: target.name.clone(),
                    key: other.to_string(),
                })
            }
        }
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join(" AND ")))
    }
}
