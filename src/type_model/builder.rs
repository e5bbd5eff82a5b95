//! Builds the immutable type model from a validated definition document.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::auth::{AuthAnnotation, AuthRule};
use crate::type_defs::{
    find_directive, DefinitionDocument, FieldDef, InterfaceTypeDef, ObjectTypeDef, TypeDefinition,
};
use crate::utils::naming;
use crate::validation::base_registry::BaseRegistry;
use crate::validation::errors::DefinitionError;

use super::field::{Field, FieldType, ScalarKind};
use super::node::{FullTextIndex, Node};
use super::relationship::{Direction, RelTarget, Relationship};
use super::{InterfaceModel, RelationshipProperties, TypeModel, UnionModel};

struct DocumentIndex<'a> {
    objects: Vec<&'a ObjectTypeDef>,
    interfaces: Vec<&'a InterfaceTypeDef>,
    rel_properties: Vec<&'a InterfaceTypeDef>,
    unions: Vec<(&'a str, &'a [String])>,
    enums: HashMap<String, Vec<String>>,
    custom_scalars: BTreeSet<String>,
    /// interface name -> implementing object names, in declaration order
    implementations: HashMap<String, Vec<String>>,
}

impl<'a> DocumentIndex<'a> {
    fn new(document: &'a DefinitionDocument) -> Self {
        let mut index = DocumentIndex {
            objects: Vec::new(),
            interfaces: Vec::new(),
            rel_properties: Vec::new(),
            unions: Vec::new(),
            enums: HashMap::new(),
            custom_scalars: BTreeSet::new(),
            implementations: HashMap::new(),
        };

        for definition in &document.definitions {
            match definition {
                TypeDefinition::Object(def) => index.objects.push(def),
                TypeDefinition::Interface(def) => {
                    if find_directive(&def.directives, "relationshipProperties").is_some() {
                        index.rel_properties.push(def);
                    } else {
                        index.interfaces.push(def);
                    }
                }
                TypeDefinition::Union(def) => {
                    index.unions.push((def.name.as_str(), def.members.as_slice()))
                }
                TypeDefinition::Enum(def) => {
                    index.enums.insert(def.name.clone(), def.values.clone());
                }
                TypeDefinition::Scalar(def) => {
                    index.custom_scalars.insert(def.name.clone());
                }
            }
        }

        for object in &index.objects {
            for interface_name in &object.implements {
                index
                    .implementations
                    .entry(interface_name.clone())
                    .or_default()
                    .push(object.name.clone());
            }
        }

        index
    }

    fn resolve_target(&self, type_name: &str) -> Option<RelTarget> {
        if self.objects.iter().any(|o| o.name == type_name) {
            return Some(RelTarget::Node(type_name.to_string()));
        }
        if self.interfaces.iter().any(|i| i.name == type_name) {
            return Some(RelTarget::Interface {
                name: type_name.to_string(),
                implementations: self
                    .implementations
                    .get(type_name)
                    .cloned()
                    .unwrap_or_default(),
            });
        }
        if let Some((name, members)) = self.unions.iter().find(|(name, _)| *name == type_name) {
            return Some(RelTarget::Union {
                name: (*name).to_string(),
                members: members.to_vec(),
            });
        }
        None
    }
}

/// Build the type model. The document must already have passed
/// [`crate::validation::validate_document`].
pub fn build(
    document: &DefinitionDocument,
    registry: &BaseRegistry,
) -> Result<TypeModel, DefinitionError> {
    let index = DocumentIndex::new(document);
    let mut diagnostics = Vec::new();

    let mut interfaces = Vec::new();
    for def in &index.interfaces {
        let (fields, relationships) =
            split_fields(&def.name, &def.fields, &index, registry, None, &mut diagnostics);
        interfaces.push(InterfaceModel {
            name: def.name.clone(),
            fields,
            relationships,
            implementations: index
                .implementations
                .get(&def.name)
                .cloned()
                .unwrap_or_default(),
        });
    }

    let mut rel_properties = HashMap::new();
    for def in &index.rel_properties {
        let (fields, relationships) =
            split_fields(&def.name, &def.fields, &index, registry, None, &mut diagnostics);
        if !relationships.is_empty() {
            diagnostics.push(format!(
                "Relationship properties type \"{}\" must not declare relationships",
                def.name
            ));
        }
        rel_properties.insert(
            def.name.clone(),
            RelationshipProperties { name: def.name.clone(), fields },
        );
    }

    let mut nodes = Vec::new();
    for def in &index.objects {
        nodes.push(build_node(def, &index, registry, &interfaces, &mut diagnostics));
    }

    if !diagnostics.is_empty() {
        return Err(DefinitionError::from_diagnostics(diagnostics));
    }

    debug!(
        "built type model: {} nodes, {} interfaces, {} unions",
        nodes.len(),
        interfaces.len(),
        index.unions.len()
    );

    let node_index = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.name.clone(), i))
        .collect();
    let interface_index = interfaces
        .iter()
        .enumerate()
        .map(|(i, def)| (def.name.clone(), i))
        .collect();
    let unions: Vec<UnionModel> = index
        .unions
        .iter()
        .map(|(name, members)| UnionModel {
            name: (*name).to_string(),
            members: members.to_vec(),
        })
        .collect();
    let union_index = unions
        .iter()
        .enumerate()
        .map(|(i, u)| (u.name.clone(), i))
        .collect();

    Ok(TypeModel {
        nodes,
        node_index,
        interfaces,
        interface_index,
        unions,
        union_index,
        enums: index.enums,
        rel_properties,
    })
}

fn build_node(
    def: &ObjectTypeDef,
    index: &DocumentIndex<'_>,
    registry: &BaseRegistry,
    interfaces: &[InterfaceModel],
    diagnostics: &mut Vec<String>,
) -> Node {
    let labels = node_labels(def);
    let plural = match find_directive(&def.directives, "plural")
        .and_then(|d| d.string_argument("value"))
    {
        Some(value) => naming::lower_first(value),
        None => naming::pluralize(&def.name),
    };

    let implemented: Vec<&InterfaceModel> = def
        .implements
        .iter()
        .filter_map(|name| interfaces.iter().find(|i| &i.name == name))
        .collect();

    let (fields, relationships) = split_fields(
        &def.name,
        &def.fields,
        index,
        registry,
        Some(&implemented),
        diagnostics,
    );

    let fulltext_indexes = fulltext_indexes(def);
    let auth = parse_auth(&def.name, &def.directives, diagnostics);

    Node {
        name: def.name.clone(),
        labels,
        plural,
        fields,
        relationships,
        fulltext_indexes,
        auth,
    }
}

fn node_labels(def: &ObjectTypeDef) -> Vec<String> {
    let mut labels = Vec::new();
    if let Some(node) = find_directive(&def.directives, "node") {
        if let Some(label) = node.string_argument("label") {
            labels.push(label.to_string());
        }
        if let Some(additional) = node.argument("additionalLabels").and_then(|v| v.as_array()) {
            labels.extend(additional.iter().filter_map(|v| v.as_str()).map(String::from));
        }
    }
    if labels.is_empty() {
        labels.push(def.name.clone());
    }
    labels
}

fn fulltext_indexes(def: &ObjectTypeDef) -> Vec<FullTextIndex> {
    let Some(fulltext) = find_directive(&def.directives, "fulltext") else {
        return Vec::new();
    };
    let Some(indexes) = fulltext.argument("indexes").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    indexes
        .iter()
        .filter_map(|index| {
            let name = index.get("name")?.as_str()?.to_string();
            let fields = index
                .get("fields")?
                .as_array()?
                .iter()
                .filter_map(|f| f.as_str().map(String::from))
                .collect();
            Some(FullTextIndex { name, fields })
        })
        .collect()
}

/// Split declared fields into scalar/enum fields and relationships.
///
/// An implementor may omit the `relationship` directive on a field its
/// interface already declares as a relationship; the declaration is
/// inherited from the interface.
fn split_fields(
    owner: &str,
    field_defs: &[FieldDef],
    index: &DocumentIndex<'_>,
    registry: &BaseRegistry,
    implemented: Option<&[&InterfaceModel]>,
    diagnostics: &mut Vec<String>,
) -> (Vec<Field>, Vec<Relationship>) {
    let mut fields = Vec::new();
    let mut relationships = Vec::new();

    for field_def in field_defs {
        let type_name = field_def.type_ref.name.as_str();
        let target = index.resolve_target(type_name);

        if let Some(target) = target {
            match relationship_from_field(owner, field_def, target, diagnostics) {
                Some(relationship) => relationships.push(relationship),
                None => {
                    // No directive on the field itself: inherit the shared
                    // declaration from an implemented interface.
                    let inherited = implemented.and_then(|interfaces| {
                        interfaces
                            .iter()
                            .find_map(|i| i.relationships.iter().find(|r| r.field_name == field_def.name))
                    });
                    match inherited {
                        Some(shared) => relationships.push(shared.clone()),
                        None => diagnostics.push(format!(
                            "Field \"{}.{}\" targets type \"{}\" but declares no relationship",
                            owner, field_def.name, type_name
                        )),
                    }
                }
            }
            continue;
        }

        fields.push(scalar_field(owner, field_def, index, registry, diagnostics));
    }

    (fields, relationships)
}

fn relationship_from_field(
    owner: &str,
    field_def: &FieldDef,
    target: RelTarget,
    diagnostics: &mut Vec<String>,
) -> Option<Relationship> {
    let directive = field_def.directive("relationship")?;
    let rel_type = directive.string_argument("type").unwrap_or_default().to_string();
    let direction = directive
        .string_argument("direction")
        .and_then(Direction::from_name)
        .unwrap_or_else(|| {
            diagnostics.push(format!(
                "Relationship \"{}.{}\" has an invalid direction",
                owner, field_def.name
            ));
            Direction::Out
        });
    let properties = directive.string_argument("properties").map(String::from);

    Some(Relationship {
        field_name: field_def.name.clone(),
        rel_type,
        direction,
        list: field_def.type_ref.list,
        required: !field_def.type_ref.list && field_def.type_ref.required,
        target,
        properties,
    })
}

fn scalar_field(
    owner: &str,
    field_def: &FieldDef,
    index: &DocumentIndex<'_>,
    registry: &BaseRegistry,
    diagnostics: &mut Vec<String>,
) -> Field {
    let type_name = field_def.type_ref.name.as_str();
    let field_type = if let Some(kind) = ScalarKind::from_name(type_name) {
        FieldType::Scalar(kind)
    } else if index.enums.contains_key(type_name) {
        FieldType::Enum(type_name.to_string())
    } else if index.custom_scalars.contains(type_name) {
        FieldType::Custom(type_name.to_string())
    } else {
        // Validation rejects unknown types; guard anyway.
        debug_assert!(registry.is_builtin_scalar(type_name));
        FieldType::Scalar(ScalarKind::String)
    };

    let alias = field_def
        .directive("alias")
        .and_then(|d| d.string_argument("property"))
        .map(String::from);
    let default = field_def
        .directive("default")
        .and_then(|d| d.argument("value"))
        .cloned();
    let auth = parse_auth(
        &format!("{}.{}", owner, field_def.name),
        &field_def.directives,
        diagnostics,
    );

    Field {
        name: field_def.name.clone(),
        field_type,
        list: field_def.type_ref.list,
        required: field_def.type_ref.required,
        alias,
        computed: field_def.has_directive("computed"),
        read_only: field_def.has_directive("readonly"),
        write_only: field_def.has_directive("writeonly"),
        private: field_def.has_directive("private"),
        unique: field_def.has_directive("unique"),
        default,
        auth,
    }
}

fn parse_auth(
    location: &str,
    directives: &[crate::type_defs::DirectiveUse],
    diagnostics: &mut Vec<String>,
) -> Option<AuthAnnotation> {
    let directive = find_directive(directives, "auth")?;
    let rules = directive.argument("rules")?.clone();
    match serde_json::from_value::<Vec<AuthRule>>(rules) {
        Ok(rules) => Some(AuthAnnotation { rules }),
        Err(e) => {
            diagnostics.push(format!("Malformed auth rules on \"{}\": {}", location, e));
            None
        }
    }
}
