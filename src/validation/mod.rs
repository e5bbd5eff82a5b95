//! Definition-document validation.
//!
//! Runs before any schema object is constructed. Reserved-name collisions
//! are unconditionally fatal and reported one at a time; every other
//! structural problem is collected and surfaced as a single concatenated
//! error so an author can fix a whole document in one pass.

pub mod base_registry;
pub mod errors;
pub mod reserved;

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::type_defs::{
    DefinitionDocument, DirectiveUse, FieldDef, InterfaceTypeDef, ObjectTypeDef, TypeDefinition,
};
use base_registry::{argument_matches, BaseRegistry};
use errors::DefinitionError;

lazy_static! {
    /// Field types whose names collide with inputs the generator will
    /// produce for a declared node.
    static ref GENERATED_INPUT_NAME: Regex = Regex::new(
        r"^(?P<node>.+?)(ConnectInput|ConnectWhere|CreateInput|DeleteInput|DisconnectInput|Options|RelationInput|Sort|UpdateInput|Where)$"
    )
    .expect("hardcoded pattern");
    static ref MUTATION_RESPONSE_NAME: Regex =
        Regex::new(r"^(?:Create|Update)(?P<plural>.+)MutationResponse$").expect("hardcoded pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
}

/// Validate a raw definition document against the frozen base registry.
///
/// The document itself is left untouched; filtering (auth stripping,
/// generated-name collision removal) happens on an internal copy that only
/// exists for the duration of the structural checks.
pub fn validate_document(
    document: &DefinitionDocument,
    registry: &BaseRegistry,
) -> Result<(), DefinitionError> {
    for definition in &document.definitions {
        if let Some(error) = reserved::check_reserved(definition.name()) {
            return Err(DefinitionError::ReservedTypeName {
                type_name: definition.name().to_string(),
                message: error.to_string(),
            });
        }
    }

    let filtered = filter_document(document);

    let mut diagnostics = Vec::new();
    structural_checks(&filtered, registry, &mut diagnostics);

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(DefinitionError::from_diagnostics(diagnostics))
    }
}

/// Produce the copy of the document that structural validation runs over.
///
/// Authorization directives are stripped so they cannot interfere with the
/// shape checks, and fields typed with a name the generator will itself
/// produce for a declared node are removed (they are resolved against the
/// generated schema, not the input document). A type left with no fields
/// after filtering is dropped entirely.
fn filter_document(document: &DefinitionDocument) -> DefinitionDocument {
    let node_names: BTreeSet<String> = document
        .definitions
        .iter()
        .filter_map(|d| match d {
            TypeDefinition::Object(def) => Some(def.name.clone()),
            _ => None,
        })
        .collect();

    let plural_names: BTreeSet<String> = node_names
        .iter()
        .map(|n| crate::utils::naming::upper_first(&crate::utils::naming::pluralize(n)))
        .collect();

    let refers_to_generated = |type_name: &str| -> bool {
        if let Some(captures) = GENERATED_INPUT_NAME.captures(type_name) {
            if node_names.contains(&captures["node"]) {
                return true;
            }
        }
        if let Some(captures) = MUTATION_RESPONSE_NAME.captures(type_name) {
            if plural_names.contains(&captures["plural"]) {
                return true;
            }
        }
        false
    };

    let strip_auth = |directives: &[DirectiveUse]| -> Vec<DirectiveUse> {
        directives.iter().filter(|d| d.name != "auth").cloned().collect()
    };

    let filter_fields = |fields: &[FieldDef]| -> Vec<FieldDef> {
        fields
            .iter()
            .filter(|f| !refers_to_generated(&f.type_ref.name))
            .map(|f| FieldDef {
                name: f.name.clone(),
                type_ref: f.type_ref.clone(),
                directives: strip_auth(&f.directives),
            })
            .collect()
    };

    let definitions = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            TypeDefinition::Object(def) => {
                let fields = filter_fields(&def.fields);
                if fields.is_empty() && !def.fields.is_empty() {
                    return None;
                }
                Some(TypeDefinition::Object(ObjectTypeDef {
                    name: def.name.clone(),
                    implements: def.implements.clone(),
                    directives: strip_auth(&def.directives),
                    fields,
                }))
            }
            TypeDefinition::Interface(def) => {
                let fields = filter_fields(&def.fields);
                if fields.is_empty() && !def.fields.is_empty() {
                    return None;
                }
                Some(TypeDefinition::Interface(InterfaceTypeDef {
                    name: def.name.clone(),
                    directives: strip_auth(&def.directives),
                    fields,
                }))
            }
            other => Some(other.clone()),
        })
        .collect();

    DefinitionDocument { definitions }
}

fn structural_checks(
    document: &DefinitionDocument,
    registry: &BaseRegistry,
    diagnostics: &mut Vec<String>,
) {
    let mut kinds: BTreeMap<&str, TypeKind> = BTreeMap::new();
    for definition in &document.definitions {
        let name = definition.name();
        if registry.is_builtin_scalar(name) {
            diagnostics.push(format!("Type \"{}\" shadows a built-in scalar", name));
            continue;
        }
        let kind = match definition {
            TypeDefinition::Object(_) => TypeKind::Object,
            TypeDefinition::Interface(_) => TypeKind::Interface,
            TypeDefinition::Union(_) => TypeKind::Union,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::Scalar(_) => TypeKind::Scalar,
        };
        if kinds.insert(name, kind).is_some() {
            diagnostics.push(format!("There can be only one type named \"{}\"", name));
        }
    }

    // A document with no object types is allowed: the only diagnostic that
    // would produce ("no root query type") is benign and suppressed.
    for definition in &document.definitions {
        match definition {
            TypeDefinition::Object(def) => {
                check_type_directives(&def.name, &def.directives, &def.fields, registry, diagnostics);
                let inherited = inherited_relationship_fields(def, document);
                check_fields(&def.name, &def.fields, &kinds, registry, &inherited, diagnostics);
                check_implements(def, document, diagnostics);
            }
            TypeDefinition::Interface(def) => {
                check_type_directives(&def.name, &def.directives, &def.fields, registry, diagnostics);
                check_fields(&def.name, &def.fields, &kinds, registry, &BTreeSet::new(), diagnostics);
                if crate::type_defs::find_directive(&def.directives, "relationshipProperties")
                    .is_some()
                {
                    for field in &def.fields {
                        let target_kind = kinds.get(field.type_ref.name.as_str());
                        if field.has_directive("relationship")
                            || matches!(
                                target_kind,
                                Some(TypeKind::Object) | Some(TypeKind::Interface) | Some(TypeKind::Union)
                            )
                        {
                            diagnostics.push(format!(
                                "Relationship properties type \"{}\" cannot declare relationship field \"{}\"",
                                def.name, field.name
                            ));
                        }
                    }
                }
            }
            TypeDefinition::Union(def) => {
                if def.members.is_empty() {
                    diagnostics.push(format!("Union \"{}\" has no member types", def.name));
                }
                for member in &def.members {
                    match kinds.get(member.as_str()) {
                        Some(TypeKind::Object) => {}
                        Some(_) => diagnostics.push(format!(
                            "Union \"{}\" member \"{}\" must be an object type",
                            def.name, member
                        )),
                        None => diagnostics.push(format!(
                            "Unknown type \"{}\" in union \"{}\"",
                            member, def.name
                        )),
                    }
                }
            }
            TypeDefinition::Enum(def) => {
                if def.values.is_empty() {
                    diagnostics.push(format!("Enum \"{}\" has no values", def.name));
                }
            }
            TypeDefinition::Scalar(_) => {}
        }
    }
}

/// Field names whose relationship declaration is inherited from an
/// implemented interface, and may therefore omit the directive locally.
fn inherited_relationship_fields(
    def: &ObjectTypeDef,
    document: &DefinitionDocument,
) -> BTreeSet<String> {
    let mut inherited = BTreeSet::new();
    for interface_name in &def.implements {
        let interface = document.definitions.iter().find_map(|d| match d {
            TypeDefinition::Interface(i) if &i.name == interface_name => Some(i),
            _ => None,
        });
        if let Some(interface) = interface {
            for field in &interface.fields {
                if field.has_directive("relationship") {
                    inherited.insert(field.name.clone());
                }
            }
        }
    }
    inherited
}

fn check_fields(
    owner: &str,
    fields: &[FieldDef],
    kinds: &BTreeMap<&str, TypeKind>,
    registry: &BaseRegistry,
    inherited: &BTreeSet<String>,
    diagnostics: &mut Vec<String>,
) {
    let mut seen = BTreeSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            diagnostics.push(format!(
                "Field \"{}.{}\" can only be defined once",
                owner, field.name
            ));
        }

        let type_name = field.type_ref.name.as_str();
        let target_kind = if registry.is_builtin_scalar(type_name) {
            Some(TypeKind::Scalar)
        } else {
            kinds.get(type_name).copied()
        };

        match target_kind {
            None => diagnostics.push(format!(
                "Unknown type \"{}\" referenced by \"{}.{}\"",
                type_name, owner, field.name
            )),
            Some(TypeKind::Object) | Some(TypeKind::Interface) | Some(TypeKind::Union) => {
                if !field.has_directive("relationship") && !inherited.contains(&field.name) {
                    diagnostics.push(format!(
                        "Field \"{}.{}\" targets type \"{}\" and must be declared with the relationship directive",
                        owner, field.name, type_name
                    ));
                }
            }
            Some(TypeKind::Enum) | Some(TypeKind::Scalar) => {
                if field.has_directive("relationship") {
                    diagnostics.push(format!(
                        "Field \"{}.{}\" is scalar-typed and cannot be a relationship",
                        owner, field.name
                    ));
                }
            }
        }

        for directive in &field.directives {
            check_directive_shape(owner, Some(&field.name), directive, registry, diagnostics);
        }

        if let Some(rel) = field.directive("relationship") {
            if let Some(properties) = rel.string_argument("properties") {
                match kinds.get(properties) {
                    Some(TypeKind::Interface) => {}
                    _ => diagnostics.push(format!(
                        "Relationship properties type \"{}\" referenced by \"{}.{}\" must be an interface marked relationshipProperties",
                        properties, owner, field.name
                    )),
                }
            }
        }
    }
}

fn check_type_directives(
    owner: &str,
    directives: &[DirectiveUse],
    fields: &[FieldDef],
    registry: &BaseRegistry,
    diagnostics: &mut Vec<String>,
) {
    for directive in directives {
        check_directive_shape(owner, None, directive, registry, diagnostics);
    }

    if let Some(fulltext) = crate::type_defs::find_directive(directives, "fulltext") {
        if let Some(indexes) = fulltext.argument("indexes").and_then(|v| v.as_array()) {
            for index in indexes {
                let name = index.get("name").and_then(|v| v.as_str());
                let index_fields = index.get("fields").and_then(|v| v.as_array());
                match (name, index_fields) {
                    (Some(name), Some(index_fields)) => {
                        for index_field in index_fields {
                            let Some(field_name) = index_field.as_str() else {
                                diagnostics.push(format!(
                                    "Full-text index \"{}\" on \"{}\" has a non-string field entry",
                                    name, owner
                                ));
                                continue;
                            };
                            if !fields.iter().any(|f| f.name == field_name) {
                                diagnostics.push(format!(
                                    "Full-text index \"{}\" on \"{}\" references unknown field \"{}\"",
                                    name, owner, field_name
                                ));
                            }
                        }
                    }
                    _ => diagnostics.push(format!(
                        "Full-text index declarations on \"{}\" require a name and a field list",
                        owner
                    )),
                }
            }
        }
    }
}

fn check_directive_shape(
    owner: &str,
    field: Option<&str>,
    directive: &DirectiveUse,
    registry: &BaseRegistry,
    diagnostics: &mut Vec<String>,
) {
    let location = match field {
        Some(field) => format!("{}.{}", owner, field),
        None => owner.to_string(),
    };

    let Some(spec) = registry.directive(&directive.name) else {
        diagnostics.push(format!(
            "Unknown directive \"{}\" on \"{}\"",
            directive.name, location
        ));
        return;
    };

    for (arg, kind) in &spec.required {
        match directive.argument(arg) {
            None => diagnostics.push(format!(
                "Directive \"{}\" on \"{}\" is missing required argument \"{}\"",
                directive.name, location, arg
            )),
            Some(value) if !argument_matches(*kind, value) => diagnostics.push(format!(
                "Directive \"{}\" on \"{}\" has a malformed \"{}\" argument",
                directive.name, location, arg
            )),
            Some(_) => {}
        }
    }

    for (arg, value) in &directive.arguments {
        let known = spec.required.iter().chain(&spec.optional).find(|(n, _)| n == arg);
        match known {
            None => diagnostics.push(format!(
                "Directive \"{}\" on \"{}\" has unknown argument \"{}\"",
                directive.name, location, arg
            )),
            Some((_, kind)) if !argument_matches(*kind, value) => diagnostics.push(format!(
                "Directive \"{}\" on \"{}\" has a malformed \"{}\" argument",
                directive.name, location, arg
            )),
            Some(_) => {}
        }
    }
}

fn check_implements(
    def: &ObjectTypeDef,
    document: &DefinitionDocument,
    diagnostics: &mut Vec<String>,
) {
    for interface_name in &def.implements {
        let interface = document.definitions.iter().find_map(|d| match d {
            TypeDefinition::Interface(i) if &i.name == interface_name => Some(i),
            _ => None,
        });
        let Some(interface) = interface else {
            diagnostics.push(format!(
                "Type \"{}\" implements unknown interface \"{}\"",
                def.name, interface_name
            ));
            continue;
        };
        for shared in &interface.fields {
            match def.fields.iter().find(|f| f.name == shared.name) {
                None => diagnostics.push(format!(
                    "Interface field \"{}.{}\" expected but \"{}\" does not provide it",
                    interface_name, shared.name, def.name
                )),
                Some(own) if own.type_ref != shared.type_ref => diagnostics.push(format!(
                    "Interface field \"{}.{}\" expects type \"{}\" but \"{}.{}\" is incompatible",
                    interface_name, shared.name, shared.type_ref.name, def.name, own.name
                )),
                Some(_) => {}
            }
        }
    }
}
