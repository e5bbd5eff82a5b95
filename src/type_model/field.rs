//! Scalar and enum fields of the type model.

use serde_json::Value;

use crate::auth::AuthAnnotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Id,
    String,
    Int,
    Float,
    Boolean,
}

impl ScalarKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ID" => Some(ScalarKind::Id),
            "String" => Some(ScalarKind::String),
            "Int" => Some(ScalarKind::Int),
            "Float" => Some(ScalarKind::Float),
            "Boolean" => Some(ScalarKind::Boolean),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Id => "ID",
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarKind),
    Enum(String),
    /// A user-declared scalar; values pass through the parameter boundary
    /// untouched.
    Custom(String),
}

impl FieldType {
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Scalar(kind) => kind.type_name(),
            FieldType::Enum(name) | FieldType::Custom(name) => name,
        }
    }

    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            FieldType::Scalar(ScalarKind::String) | FieldType::Scalar(ScalarKind::Id)
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Scalar(ScalarKind::Int) | FieldType::Scalar(ScalarKind::Float)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub list: bool,
    pub required: bool,
    /// Underlying database property name when it differs from the field name.
    pub alias: Option<String>,
    pub computed: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub private: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub auth: Option<AuthAnnotation>,
}

impl Field {
    pub fn db_property(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether the field appears in generated create/update inputs.
    pub fn writable(&self) -> bool {
        !self.computed && !self.read_only && !self.private
    }

    /// Whether the field appears on the generated object type.
    pub fn readable(&self) -> bool {
        !self.write_only && !self.private
    }

    /// Whether the field participates in where/sort/aggregate inputs.
    pub fn filterable(&self) -> bool {
        !self.computed && !self.private && !self.write_only
    }

    pub fn sortable(&self) -> bool {
        self.filterable() && !self.list
    }
}
