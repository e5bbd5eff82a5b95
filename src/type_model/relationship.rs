//! Relationships of the type model.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

impl Direction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OUT" => Some(Direction::Out),
            "IN" => Some(Direction::In),
            "BOTH" => Some(Direction::Both),
            _ => None,
        }
    }

    /// The pattern arms around the relationship bracket:
    /// `(a){left}[r:T]{right}(b)`.
    pub fn arrows(&self) -> (&'static str, &'static str) {
        match self {
            Direction::Out => ("-", "->"),
            Direction::In => ("<-", "-"),
            Direction::Both => ("-", "-"),
        }
    }
}

/// What a relationship points at. Interface and union targets carry their
/// implementing-node sets, resolved once at model-build time; the
/// translator never re-derives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    Node(String),
    Interface {
        name: String,
        implementations: Vec<String>,
    },
    Union {
        name: String,
        members: Vec<String>,
    },
}

impl RelTarget {
    pub fn name(&self) -> &str {
        match self {
            RelTarget::Node(name) => name,
            RelTarget::Interface { name, .. } => name,
            RelTarget::Union { name, .. } => name,
        }
    }

    /// The concrete node types a traversal fans out to.
    pub fn concrete_types(&self) -> Vec<&str> {
        match self {
            RelTarget::Node(name) => vec![name.as_str()],
            RelTarget::Interface { implementations, .. } => {
                implementations.iter().map(String::as_str).collect()
            }
            RelTarget::Union { members, .. } => members.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        !matches!(self, RelTarget::Node(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub field_name: String,
    /// Database edge label.
    pub rel_type: String,
    pub direction: Direction,
    /// List-ness of the declared field type; single otherwise.
    pub list: bool,
    /// A required single relationship gets a cardinality check after writes.
    pub required: bool,
    pub target: RelTarget,
    /// Name of the edge-properties type, when the edge carries properties.
    pub properties: Option<String>,
}

impl Relationship {
    /// Render the traversal pattern from `from_var` to `to`, optionally
    /// binding the relationship itself.
    pub fn pattern(&self, from_var: &str, rel_var: Option<&str>, to: &str) -> String {
        let (left, right) = self.direction.arrows();
        let binding = match rel_var {
            Some(var) => format!("[{}:{}]", var, crate::cypher::escape_identifier(&self.rel_type)),
            None => format!("[:{}]", crate::cypher::escape_identifier(&self.rel_type)),
        };
        format!("({}){}{}{}({})", from_var, left, binding, right, to)
    }
}
