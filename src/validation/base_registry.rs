//! Built-in scalar and directive registry.
//!
//! The registry is constructed explicitly and frozen before validation runs;
//! nothing in the crate keeps mutable module-level state. Validation and the
//! type-model builder both borrow the same frozen instance.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Str,
    StrList,
    Bool,
    /// Any literal value (used by `default`).
    Any,
    /// One of OUT / IN / BOTH.
    Direction,
    ObjectList,
}

#[derive(Debug, Clone)]
pub struct DirectiveSpec {
    pub name: &'static str,
    pub required: Vec<(&'static str, ArgKind)>,
    pub optional: Vec<(&'static str, ArgKind)>,
}

/// Frozen table of built-in scalars and the directive vocabulary.
#[derive(Debug, Clone)]
pub struct BaseRegistry {
    scalars: BTreeSet<&'static str>,
    directives: BTreeMap<&'static str, DirectiveSpec>,
}

impl BaseRegistry {
    pub fn builtin() -> Self {
        let scalars: BTreeSet<&'static str> =
            ["ID", "String", "Int", "Float", "Boolean"].into_iter().collect();

        let specs = vec![
            DirectiveSpec {
                name: "relationship",
                required: vec![("type", ArgKind::Str), ("direction", ArgKind::Direction)],
                optional: vec![("properties", ArgKind::Str)],
            },
            DirectiveSpec {
                name: "node",
                required: vec![],
                optional: vec![("label", ArgKind::Str), ("additionalLabels", ArgKind::StrList)],
            },
            DirectiveSpec {
                name: "alias",
                required: vec![("property", ArgKind::Str)],
                optional: vec![],
            },
            DirectiveSpec {
                name: "fulltext",
                required: vec![("indexes", ArgKind::ObjectList)],
                optional: vec![],
            },
            DirectiveSpec {
                name: "plural",
                required: vec![("value", ArgKind::Str)],
                optional: vec![],
            },
            DirectiveSpec {
                name: "default",
                required: vec![("value", ArgKind::Any)],
                optional: vec![],
            },
            DirectiveSpec {
                name: "auth",
                required: vec![("rules", ArgKind::ObjectList)],
                optional: vec![],
            },
            DirectiveSpec { name: "computed", required: vec![], optional: vec![] },
            DirectiveSpec { name: "readonly", required: vec![], optional: vec![] },
            DirectiveSpec { name: "writeonly", required: vec![], optional: vec![] },
            DirectiveSpec { name: "private", required: vec![], optional: vec![] },
            DirectiveSpec { name: "unique", required: vec![], optional: vec![] },
            DirectiveSpec {
                name: "relationshipProperties",
                required: vec![],
                optional: vec![],
            },
        ];

        let directives = specs.into_iter().map(|s| (s.name, s)).collect();

        BaseRegistry { scalars, directives }
    }

    pub fn is_builtin_scalar(&self, name: &str) -> bool {
        self.scalars.contains(name)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveSpec> {
        self.directives.get(name)
    }
}

/// Check one directive argument value against its declared kind.
pub fn argument_matches(kind: ArgKind, value: &Value) -> bool {
    match kind {
        ArgKind::Str => value.is_string(),
        ArgKind::Bool => value.is_boolean(),
        ArgKind::Any => true,
        ArgKind::StrList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        ArgKind::Direction => matches!(value.as_str(), Some("OUT") | Some("IN") | Some("BOTH")),
        ArgKind::ObjectList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_object)),
    }
}
