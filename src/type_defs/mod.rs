//! Abstract syntax tree of the declarative type-definition language.
//!
//! The lexical grammar is out of scope for this crate: callers hand over an
//! already-parsed document of type, field and directive declarations. The
//! tree derives `serde` traits so definition documents can also be loaded
//! from YAML or JSON files (see [`crate::config`]), which is how the CLI and
//! the test suites feed the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered directive argument map. Insertion order is preserved so that
/// generated output stays deterministic.
pub type DirectiveArguments = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionDocument {
    #[serde(default)]
    pub definitions: Vec<TypeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDefinition {
    Object(ObjectTypeDef),
    Interface(InterfaceTypeDef),
    Union(UnionTypeDef),
    Enum(EnumTypeDef),
    Scalar(ScalarTypeDef),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Object(d) => &d.name,
            TypeDefinition::Interface(d) => &d.name,
            TypeDefinition::Union(d) => &d.name,
            TypeDefinition::Enum(d) => &d.name,
            TypeDefinition::Scalar(d) => &d.name,
        }
    }

    pub fn directives(&self) -> &[DirectiveUse] {
        match self {
            TypeDefinition::Object(d) => &d.directives,
            TypeDefinition::Interface(d) => &d.directives,
            TypeDefinition::Union(d) => &d.directives,
            TypeDefinition::Enum(d) => &d.directives,
            TypeDefinition::Scalar(d) => &d.directives,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTypeDef {
    pub name: String,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceTypeDef {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionTypeDef {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumTypeDef {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarTypeDef {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRefAst,
    #[serde(default)]
    pub directives: Vec<DirectiveUse>,
}

impl FieldDef {
    pub fn directive(&self, name: &str) -> Option<&DirectiveUse> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }
}

/// A type reference as written in a field declaration: the named type plus
/// list and nullability wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRefAst {
    pub name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    /// For list types, whether the element type is non-null.
    #[serde(default)]
    pub element_required: bool,
}

impl TypeRefAst {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRefAst {
            name: name.into(),
            list: false,
            required: false,
            element_required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn list_of(mut self) -> Self {
        self.element_required = self.required;
        self.list = true;
        self.required = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveUse {
    pub name: String,
    #[serde(default)]
    pub arguments: DirectiveArguments,
}

impl DirectiveUse {
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Value::as_str)
    }
}

pub fn find_directive<'a>(directives: &'a [DirectiveUse], name: &str) -> Option<&'a DirectiveUse> {
    directives.iter().find(|d| d.name == name)
}
