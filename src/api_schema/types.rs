//! In-memory representation of the generated API schema.
//!
//! The artifact is plain data: named types plus the root operation fields.
//! Serving it over a transport (or handing it to a GraphQL executor) is the
//! caller's concern.

use serde_json::Value;

/// A type reference with list and non-null wrappers, e.g. `[Movie!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub list: bool,
    pub non_null: bool,
    pub element_non_null: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            list: false,
            non_null: false,
            element_non_null: false,
        }
    }

    /// Mark the outermost wrapper non-null.
    pub fn required(mut self) -> Self {
        self.non_null = true;
        self
    }

    /// Wrap the current reference in a list; the element keeps its
    /// nullability, the list itself starts out nullable.
    pub fn list_of(mut self) -> Self {
        self.element_non_null = self.non_null;
        self.list = true;
        self.non_null = false;
        self
    }

    pub fn to_sdl(&self) -> String {
        if self.list {
            format!(
                "[{}{}]{}",
                self.name,
                if self.element_non_null { "!" } else { "" },
                if self.non_null { "!" } else { "" },
            )
        } else {
            format!("{}{}", self.name, if self.non_null { "!" } else { "" })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(ScalarType),
    Input(InputObjectType),
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Object(t) => &t.name,
            SchemaType::Interface(t) => &t.name,
            SchemaType::Union(t) => &t.name,
            SchemaType::Enum(t) => &t.name,
            SchemaType::Scalar(t) => &t.name,
            SchemaType::Input(t) => &t.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub implements: Vec<String>,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub type_ref: TypeRef,
    pub arguments: Vec<InputValueSpec>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        FieldSpec { name: name.into(), type_ref, arguments: Vec::new() }
    }

    pub fn argument(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.arguments.push(InputValueSpec { name: name.into(), type_ref, default: None });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    pub name: String,
    pub fields: Vec<InputValueSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputValueSpec {
    pub name: String,
    pub type_ref: TypeRef,
    pub default: Option<Value>,
}

impl InputValueSpec {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        InputValueSpec { name: name.into(), type_ref, default: None }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}
