//! Nodes of the type model.

use crate::auth::AuthAnnotation;

use super::field::Field;
use super::relationship::Relationship;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Database labels; never empty, the first entry is the primary label.
    pub labels: Vec<String>,
    /// Camel-cased plural used for the generated root operations.
    pub plural: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub fulltext_indexes: Vec<FullTextIndex>,
    pub auth: Option<AuthAnnotation>,
}

impl Node {
    pub fn primary_label(&self) -> &str {
        &self.labels[0]
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relationship(&self, field_name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.field_name == field_name)
    }

    pub fn fulltext_index(&self, name: &str) -> Option<&FullTextIndex> {
        self.fulltext_indexes.iter().find(|i| i.name == name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.unique)
    }
}

/// A declared full-text index: name plus the ordered field list it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTextIndex {
    pub name: String,
    pub fields: Vec<String>,
}
