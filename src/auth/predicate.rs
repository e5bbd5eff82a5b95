//! Compiles declared auth rules into boolean Cypher fragments.
//!
//! Read-time predicates are merged into the matching stage, so rows that
//! fail them disappear from results instead of raising errors. Write-time
//! bind predicates are wrapped by the translator in a validation call that
//! aborts the enclosing mutation.
//!
//! Compiled fragments reference already-bound statement variables plus a
//! single `$auth` parameter carrying `{ isAuthenticated, roles, jwt }`.

use serde_json::Value;

use crate::cypher::quote;
use crate::type_model::Node;

use super::errors::AuthorizationError;
use super::rules::{AuthAnnotation, AuthContext, AuthOperation, AuthRule};

/// Name of the statement parameter the compiled predicates reference.
pub const AUTH_PARAM: &str = "auth";

/// Compile the read-time predicate for `var`, if the annotation has any
/// rules scoped to READ.
pub fn read_predicate(
    node: &Node,
    annotation: &AuthAnnotation,
    var: &str,
) -> Result<Option<String>, AuthorizationError> {
    let rules: Vec<&AuthRule> = annotation
        .rules
        .iter()
        .filter(|r| r.applies_to(AuthOperation::Read))
        .collect();
    let mut predicates = Vec::new();
    for rule in rules {
        let spec = rule.where_.as_ref().or(rule.allow.as_ref());
        if let Some(predicate) = rule_predicate(rule, spec, node, var)? {
            predicates.push(predicate);
        }
    }
    Ok(combine_or(predicates))
}

/// Compile the write-time bind predicate for `var` and `operation`.
///
/// A bind rule that references a claim the request context does not carry
/// cannot ever hold; translation fails up front instead of emitting a
/// statement that would partially mutate before failing.
pub fn bind_validation(
    node: &Node,
    annotation: &AuthAnnotation,
    operation: AuthOperation,
    var: &str,
    auth: &AuthContext,
) -> Result<Option<String>, AuthorizationError> {
    let rules: Vec<&AuthRule> = annotation
        .rules
        .iter()
        .filter(|r| r.applies_to(operation) && r.bind.is_some())
        .collect();
    let mut predicates = Vec::new();
    for rule in rules {
        let spec = rule.bind.as_ref();
        if let Some(spec_value) = spec {
            for claim in claim_paths(spec_value) {
                if auth.claim(&claim).is_none() {
                    return Err(AuthorizationError::MissingClaim {
                        location: node.name.clone(),
                        claim,
                    });
                }
            }
        }
        if let Some(predicate) = rule_predicate(rule, spec, node, var)? {
            predicates.push(predicate);
        }
    }
    Ok(combine_or(predicates))
}

fn combine_or(mut predicates: Vec<String>) -> Option<String> {
    match predicates.len() {
        0 => None,
        1 => Some(predicates.remove(0)),
        _ => Some(
            predicates
                .into_iter()
                .map(|p| format!("({})", p))
                .collect::<Vec<_>>()
                .join(" OR "),
        ),
    }
}

fn rule_predicate(
    rule: &AuthRule,
    spec: Option<&Value>,
    node: &Node,
    var: &str,
) -> Result<Option<String>, AuthorizationError> {
    let mut parts = Vec::new();
    if let Some(flag) = rule.is_authenticated {
        parts.push(format!("$auth.isAuthenticated = {}", flag));
    }
    if !rule.roles.is_empty() {
        let roles = rule
            .roles
            .iter()
            .map(|r| quote(r))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("ANY(r IN [{}] WHERE r IN $auth.roles)", roles));
    }
    if let Some(spec) = spec {
        parts.push(compile_spec(spec, node, var)?);
    }
    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.join(" AND ")))
}

fn compile_spec(spec: &Value, node: &Node, var: &str) -> Result<String, AuthorizationError> {
    let Some(object) = spec.as_object() else {
        return Err(AuthorizationError::MalformedPredicate {
            location: node.name.clone(),
            message: "predicate must be an object".into(),
        });
    };

    let mut parts = Vec::new();
    for (key, value) in object {
        match key.as_str() {
            "AND" | "OR" => {
                let Some(items) = value.as_array() else {
                    return Err(AuthorizationError::MalformedPredicate {
                        location: node.name.clone(),
                        message: format!("{} expects a list", key),
                    });
                };
                let compiled = items
                    .iter()
                    .map(|item| compile_spec(item, node, var))
                    .collect::<Result<Vec<_>, _>>()?;
                let joined = compiled
                    .into_iter()
                    .map(|p| format!("({})", p))
                    .collect::<Vec<_>>()
                    .join(&format!(" {} ", key));
                parts.push(format!("({})", joined));
            }
            field_name => {
                let field = node.field(field_name).ok_or_else(|| {
                    AuthorizationError::UnknownField {
                        location: node.name.clone(),
                        field: field_name.to_string(),
                    }
                })?;
                parts.push(field_equation(var, field.db_property(), value));
            }
        }
    }

    if parts.is_empty() {
        return Err(AuthorizationError::MalformedPredicate {
            location: node.name.clone(),
            message: "empty predicate".into(),
        });
    }
    Ok(parts.join(" AND "))
}

fn field_equation(var: &str, property: &str, value: &Value) -> String {
    match value {
        Value::String(s) => {
            if let Some(path) = s.strip_prefix("$jwt.") {
                // Claims may be absent at run time: require the property to
                // be present so a null = null comparison cannot leak rows.
                return format!(
                    "({var}.{property} IS NOT NULL AND {var}.{property} = $auth.jwt.{path})",
                    var = var,
                    property = property,
                    path = path
                );
            }
            format!("{}.{} = {}", var, property, quote(s))
        }
        Value::Null => format!("{}.{} IS NULL", var, property),
        Value::Bool(b) => format!("{}.{} = {}", var, property, b),
        Value::Number(n) => format!("{}.{} = {}", var, property, n),
        other => format!("{}.{} = {}", var, property, other),
    }
}

/// All `$jwt.*` claim paths referenced by a predicate spec.
fn claim_paths(spec: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_claim_paths(spec, &mut paths);
    paths
}

fn collect_claim_paths(value: &Value, paths: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(path) = s.strip_prefix("$jwt.") {
                paths.push(path.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_claim_paths(item, paths);
            }
        }
        Value::Object(object) => {
            for item in object.values() {
                collect_claim_paths(item, paths);
            }
        }
        _ => {}
    }
}
