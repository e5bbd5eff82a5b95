//! Create/update/connect/disconnect/delete/relation input generation.
//!
//! The per-relationship field-input family is generated recursively: a
//! create input references field inputs which reference the target's create
//! input, and so on around relationship cycles. Every entry point records
//! its memo key before building, so generation terminates by reuse.

use crate::type_model::{
    Field, InterfaceModel, Node, RelTarget, Relationship, RelationshipProperties,
};

use super::builder::{InputKind, SchemaBuilder};
use super::connection;
use super::types::{InputValueSpec, TypeRef};

fn list_ref(name: &str, list: bool) -> TypeRef {
    if list {
        TypeRef::named(name).required().list_of()
    } else {
        TypeRef::named(name)
    }
}

/// Scalar field spec for create inputs: declared nullability is kept unless
/// a default makes the field optional.
fn create_scalar_spec(field: &Field) -> InputValueSpec {
    let mut type_ref = super::builder::scalar_field_type_ref(field);
    if field.default.is_some() {
        type_ref.non_null = false;
    }
    let mut spec = InputValueSpec::new(&field.name, type_ref);
    if let Some(default) = &field.default {
        spec = spec.with_default(default.clone());
    }
    spec
}

/// Scalar field spec for update inputs: everything is optional.
fn update_scalar_spec(field: &Field) -> InputValueSpec {
    let mut type_ref = super::builder::scalar_field_type_ref(field);
    type_ref.non_null = false;
    InputValueSpec::new(&field.name, type_ref)
}

pub(super) fn ensure_node_create(b: &mut SchemaBuilder<'_>, node: &Node) -> String {
    let name = format!("{}CreateInput", node.name);
    if !b.enter(&node.name, None, InputKind::Create) {
        return name;
    }
    let mut fields: Vec<InputValueSpec> = node
        .fields
        .iter()
        .filter(|f| f.writable())
        .map(create_scalar_spec)
        .collect();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_create_input(b, node, &rel);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_field_input(b, node, &rel);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_node_update(b: &mut SchemaBuilder<'_>, node: &Node) -> String {
    let name = format!("{}UpdateInput", node.name);
    if !b.enter(&node.name, None, InputKind::Update) {
        return name;
    }
    let mut fields: Vec<InputValueSpec> = node
        .fields
        .iter()
        .filter(|f| f.writable())
        .map(update_scalar_spec)
        .collect();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_nested_input(b, node, &rel, UnionNested::Update);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_update_field_input(b, node, &rel, None);
                InputValueSpec::new(&rel.field_name, list_ref(&input, rel.list))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    name
}

/// `{Node}{Field}FieldInput`: the create/connect pair used inside create
/// inputs.
fn ensure_field_input(b: &mut SchemaBuilder<'_>, node: &Node, rel: &Relationship) -> String {
    let name = format!("{}FieldInput", SchemaBuilder::rel_input_base(node, rel, None));
    if !b.enter(&node.name, Some(&rel.field_name), InputKind::FieldInput) {
        return name;
    }
    let create = ensure_create_field_input(b, node, rel, None);
    let connect = ensure_connect_field_input(b, node, rel, None);
    b.add_input(
        &name,
        vec![
            InputValueSpec::new("create", list_ref(&create, rel.list)),
            InputValueSpec::new("connect", list_ref(&connect, rel.list)),
        ],
    );
    name
}

fn member_field_input(b: &mut SchemaBuilder<'_>, node: &Node, rel: &Relationship, member: &str) -> String {
    let name = format!("{}FieldInput", SchemaBuilder::rel_input_base(node, rel, Some(member)));
    let key_rel = format!("{}:{}", rel.field_name, member);
    if !b.enter(&node.name, Some(&key_rel), InputKind::FieldInput) {
        return name;
    }
    let create = ensure_create_field_input(b, node, rel, Some(member));
    let connect = ensure_connect_field_input(b, node, rel, Some(member));
    b.add_input(
        &name,
        vec![
            InputValueSpec::new("create", list_ref(&create, rel.list)),
            InputValueSpec::new("connect", list_ref(&connect, rel.list)),
        ],
    );
    name
}

fn rel_key(rel: &Relationship, member: Option<&str>) -> String {
    match member {
        Some(member) => format!("{}:{}", rel.field_name, member),
        None => rel.field_name.clone(),
    }
}

fn target_create_input(
    b: &mut SchemaBuilder<'_>,
    rel: &Relationship,
    member: Option<&str>,
) -> Option<String> {
    if let Some(member) = member {
        let node = b.model.node(member).cloned()?;
        return Some(ensure_node_create(b, &node));
    }
    match &rel.target {
        RelTarget::Node(name) => {
            let node = b.model.node(name).cloned()?;
            Some(ensure_node_create(b, &node))
        }
        RelTarget::Interface { name, .. } => {
            let interface = b.model.interface(name).cloned()?;
            Some(ensure_interface_create(b, &interface))
        }
        RelTarget::Union { .. } => None,
    }
}

fn target_update_input(
    b: &mut SchemaBuilder<'_>,
    rel: &Relationship,
    member: Option<&str>,
) -> Option<String> {
    if let Some(member) = member {
        let node = b.model.node(member).cloned()?;
        return Some(ensure_node_update(b, &node));
    }
    match &rel.target {
        RelTarget::Node(name) => {
            let node = b.model.node(name).cloned()?;
            Some(ensure_node_update(b, &node))
        }
        RelTarget::Interface { name, .. } => {
            let interface = b.model.interface(name).cloned()?;
            Some(ensure_interface_update(b, &interface))
        }
        RelTarget::Union { .. } => None,
    }
}

fn rel_props(b: &SchemaBuilder<'_>, rel: &Relationship) -> Option<RelationshipProperties> {
    rel.properties
        .as_ref()
        .and_then(|name| b.model.relationship_properties(name).cloned())
}

fn ensure_create_field_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}CreateFieldInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::CreateField) {
        return name;
    }
    let mut fields = Vec::new();
    if let Some(create) = target_create_input(b, rel, member) {
        fields.push(InputValueSpec::new("node", TypeRef::named(create).required()));
    }
    if let Some(props) = rel_props(b, rel) {
        let edge = ensure_props_create(b, &props);
        fields.push(InputValueSpec::new("edge", TypeRef::named(edge).required()));
    }
    b.add_input(&name, fields);
    name
}

fn ensure_connect_where(b: &mut SchemaBuilder<'_>, owner: &str, where_name: &str) -> String {
    let name = format!("{}ConnectWhere", owner);
    if !b.enter(owner, None, InputKind::ConnectWhere) {
        return name;
    }
    b.add_input(
        &name,
        vec![InputValueSpec::new("node", TypeRef::named(where_name).required())],
    );
    name
}

fn ensure_connect_field_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}ConnectFieldInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::ConnectField) {
        return name;
    }
    let mut fields = Vec::new();

    let connect_where = match member {
        Some(member) => {
            let target = b.model.node(member).cloned();
            target.map(|t| {
                let node_where = super::where_input::ensure_node_where(b, &t);
                ensure_connect_where(b, &t.name, &node_where)
            })
        }
        None => match &rel.target {
            RelTarget::Node(target_name) => {
                let target = b.model.node(target_name).cloned();
                target.map(|t| {
                    let node_where = super::where_input::ensure_node_where(b, &t);
                    ensure_connect_where(b, &t.name, &node_where)
                })
            }
            RelTarget::Interface { name, .. } => {
                let interface = b.model.interface(name).cloned();
                interface.map(|i| {
                    let interface_where = super::where_input::ensure_interface_where(b, &i);
                    ensure_connect_where(b, &i.name, &interface_where)
                })
            }
            RelTarget::Union { .. } => None,
        },
    };
    if let Some(connect_where) = connect_where {
        fields.push(InputValueSpec::new("where", TypeRef::named(connect_where)));
    }

    // Nested connects recurse into the connected node's own relationships.
    let connect_target = match member {
        Some(member) => Some(member.to_string()),
        None => match &rel.target {
            RelTarget::Node(name) => Some(name.clone()),
            _ => None,
        },
    };
    if let Some(target_name) = connect_target {
        if let Some(target) = b.model.node(&target_name).cloned() {
            if let Some(connect_input) = ensure_node_connect_input(b, &target) {
                fields.push(InputValueSpec::new(
                    "connect",
                    list_ref(&connect_input, rel.list),
                ));
            }
        }
    }

    if let Some(props) = rel_props(b, rel) {
        let edge = ensure_props_create(b, &props);
        fields.push(InputValueSpec::new("edge", TypeRef::named(edge).required()));
    }
    b.add_input(&name, fields);
    name
}

fn ensure_update_field_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}UpdateFieldInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::UpdateField) {
        return name;
    }
    let where_name = connection::ensure_connection_where(b, node, rel, member);
    let update = ensure_update_connection_input(b, node, rel, member);
    let connect = ensure_connect_field_input(b, node, rel, member);
    let disconnect = ensure_disconnect_field_input(b, node, rel, member);
    let create = ensure_create_field_input(b, node, rel, member);
    let delete = ensure_delete_field_input(b, node, rel, member);
    b.add_input(
        &name,
        vec![
            InputValueSpec::new("where", TypeRef::named(where_name)),
            InputValueSpec::new("update", TypeRef::named(update)),
            InputValueSpec::new("connect", list_ref(&connect, rel.list)),
            InputValueSpec::new("disconnect", list_ref(&disconnect, rel.list)),
            InputValueSpec::new("create", list_ref(&create, rel.list)),
            InputValueSpec::new("delete", list_ref(&delete, rel.list)),
        ],
    );
    name
}

fn ensure_update_connection_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}UpdateConnectionInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::UpdateConnection) {
        return name;
    }
    let mut fields = Vec::new();
    if let Some(update) = target_update_input(b, rel, member) {
        fields.push(InputValueSpec::new("node", TypeRef::named(update)));
    }
    if let Some(props) = rel_props(b, rel) {
        let edge = ensure_props_update(b, &props);
        fields.push(InputValueSpec::new("edge", TypeRef::named(edge)));
    }
    b.add_input(&name, fields);
    name
}

fn ensure_delete_field_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}DeleteFieldInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::DeleteField) {
        return name;
    }
    let where_name = connection::ensure_connection_where(b, node, rel, member);
    let mut fields = vec![InputValueSpec::new("where", TypeRef::named(where_name))];
    let target_name = match member {
        Some(member) => Some(member.to_string()),
        None => match &rel.target {
            RelTarget::Node(name) => Some(name.clone()),
            _ => None,
        },
    };
    if let Some(target_name) = target_name {
        if let Some(target) = b.model.node(&target_name).cloned() {
            if let Some(delete_input) = ensure_node_delete_input(b, &target) {
                fields.push(InputValueSpec::new("delete", TypeRef::named(delete_input)));
            }
        }
    }
    b.add_input(&name, fields);
    name
}

fn ensure_disconnect_field_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let name = format!(
        "{}DisconnectFieldInput",
        SchemaBuilder::rel_input_base(node, rel, member)
    );
    if !b.enter(&node.name, Some(&rel_key(rel, member)), InputKind::DisconnectField) {
        return name;
    }
    let where_name = connection::ensure_connection_where(b, node, rel, member);
    let mut fields = vec![InputValueSpec::new("where", TypeRef::named(where_name))];
    let target_name = match member {
        Some(member) => Some(member.to_string()),
        None => match &rel.target {
            RelTarget::Node(name) => Some(name.clone()),
            _ => None,
        },
    };
    if let Some(target_name) = target_name {
        if let Some(target) = b.model.node(&target_name).cloned() {
            if let Some(disconnect_input) = ensure_node_disconnect_input(b, &target) {
                fields.push(InputValueSpec::new(
                    "disconnect",
                    TypeRef::named(disconnect_input),
                ));
            }
        }
    }
    b.add_input(&name, fields);
    name
}

/// What a union-typed relationship nests inside a top-level write input.
#[derive(Clone, Copy, PartialEq, Eq)]
enum UnionNested {
    Connect,
    Disconnect,
    Delete,
    Update,
}

/// `{Node}{Field}CreateInput` keyed per union member.
fn ensure_union_create_input(b: &mut SchemaBuilder<'_>, node: &Node, rel: &Relationship) -> String {
    let name = format!("{}CreateInput", SchemaBuilder::rel_input_base(node, rel, None));
    if !b.enter(&node.name, Some(&rel.field_name), InputKind::Create) {
        return name;
    }
    let RelTarget::Union { members, .. } = rel.target.clone() else {
        b.add_input(&name, vec![]);
        return name;
    };
    let mut fields = Vec::new();
    for member in &members {
        let input = member_field_input(b, node, rel, member);
        fields.push(InputValueSpec::new(member.clone(), TypeRef::named(input)));
    }
    b.add_input(&name, fields);
    name
}

fn ensure_union_nested_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    nested: UnionNested,
) -> String {
    let (suffix, kind) = match nested {
        UnionNested::Connect => ("ConnectInput", InputKind::Connect),
        UnionNested::Disconnect => ("DisconnectInput", InputKind::Disconnect),
        UnionNested::Delete => ("DeleteInput", InputKind::Delete),
        UnionNested::Update => ("UpdateInput", InputKind::Update),
    };
    let name = format!("{}{}", SchemaBuilder::rel_input_base(node, rel, None), suffix);
    if !b.enter(&node.name, Some(&rel.field_name), kind) {
        return name;
    }
    let RelTarget::Union { members, .. } = rel.target.clone() else {
        b.add_input(&name, vec![]);
        return name;
    };
    let mut fields = Vec::new();
    for member in &members {
        let input = match nested {
            UnionNested::Connect => ensure_connect_field_input(b, node, rel, Some(member)),
            UnionNested::Disconnect => ensure_disconnect_field_input(b, node, rel, Some(member)),
            UnionNested::Delete => ensure_delete_field_input(b, node, rel, Some(member)),
            UnionNested::Update => ensure_update_field_input(b, node, rel, Some(member)),
        };
        fields.push(InputValueSpec::new(member.clone(), list_ref(&input, rel.list)));
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_node_connect_input(b: &mut SchemaBuilder<'_>, node: &Node) -> Option<String> {
    if node.relationships.is_empty() {
        return None;
    }
    let name = format!("{}ConnectInput", node.name);
    if !b.enter(&node.name, None, InputKind::Connect) {
        return Some(name);
    }
    let mut fields = Vec::new();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_nested_input(b, node, &rel, UnionNested::Connect);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_connect_field_input(b, node, &rel, None);
                InputValueSpec::new(&rel.field_name, list_ref(&input, rel.list))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    Some(name)
}

pub(super) fn ensure_node_disconnect_input(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
) -> Option<String> {
    if node.relationships.is_empty() {
        return None;
    }
    let name = format!("{}DisconnectInput", node.name);
    if !b.enter(&node.name, None, InputKind::Disconnect) {
        return Some(name);
    }
    let mut fields = Vec::new();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_nested_input(b, node, &rel, UnionNested::Disconnect);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_disconnect_field_input(b, node, &rel, None);
                InputValueSpec::new(&rel.field_name, list_ref(&input, rel.list))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    Some(name)
}

pub(super) fn ensure_node_delete_input(b: &mut SchemaBuilder<'_>, node: &Node) -> Option<String> {
    if node.relationships.is_empty() {
        return None;
    }
    let name = format!("{}DeleteInput", node.name);
    if !b.enter(&node.name, None, InputKind::Delete) {
        return Some(name);
    }
    let mut fields = Vec::new();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_nested_input(b, node, &rel, UnionNested::Delete);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_delete_field_input(b, node, &rel, None);
                InputValueSpec::new(&rel.field_name, list_ref(&input, rel.list))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    Some(name)
}

pub(super) fn ensure_node_relation_input(b: &mut SchemaBuilder<'_>, node: &Node) -> Option<String> {
    if node.relationships.is_empty() {
        return None;
    }
    let name = format!("{}RelationInput", node.name);
    if !b.enter(&node.name, None, InputKind::Relation) {
        return Some(name);
    }
    let mut fields = Vec::new();
    for rel in node.relationships.clone() {
        let spec = match &rel.target {
            RelTarget::Union { .. } => {
                let input = ensure_union_create_input(b, node, &rel);
                InputValueSpec::new(&rel.field_name, TypeRef::named(input))
            }
            _ => {
                let input = ensure_create_field_input(b, node, &rel, None);
                InputValueSpec::new(&rel.field_name, list_ref(&input, rel.list))
            }
        };
        fields.push(spec);
    }
    b.add_input(&name, fields);
    Some(name)
}

pub(super) fn ensure_interface_create(
    b: &mut SchemaBuilder<'_>,
    interface: &InterfaceModel,
) -> String {
    let name = format!("{}CreateInput", interface.name);
    if !b.enter(&interface.name, None, InputKind::Create) {
        return name;
    }
    let mut fields = Vec::new();
    for implementation in interface.implementations.clone() {
        if let Some(node) = b.model.node(&implementation).cloned() {
            let create = ensure_node_create(b, &node);
            fields.push(InputValueSpec::new(implementation, TypeRef::named(create)));
        }
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_interface_update(
    b: &mut SchemaBuilder<'_>,
    interface: &InterfaceModel,
) -> String {
    let name = format!("{}UpdateInput", interface.name);
    if !b.enter(&interface.name, None, InputKind::Update) {
        return name;
    }
    let mut fields: Vec<InputValueSpec> = interface
        .fields
        .iter()
        .filter(|f| f.writable())
        .map(update_scalar_spec)
        .collect();
    let implementations = ensure_implementations_update(b, interface);
    fields.push(InputValueSpec::new("_on", TypeRef::named(implementations)));
    b.add_input(&name, fields);
    name
}

fn ensure_implementations_update(
    b: &mut SchemaBuilder<'_>,
    interface: &InterfaceModel,
) -> String {
    let name = format!("{}ImplementationsUpdateInput", interface.name);
    if !b.enter(&interface.name, None, InputKind::ImplementationsUpdate) {
        return name;
    }
    let mut fields = Vec::new();
    for implementation in interface.implementations.clone() {
        if let Some(node) = b.model.node(&implementation).cloned() {
            let update = ensure_node_update(b, &node);
            fields.push(InputValueSpec::new(implementation, TypeRef::named(update)));
        }
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_props_create(
    b: &mut SchemaBuilder<'_>,
    props: &RelationshipProperties,
) -> String {
    let name = format!("{}CreateInput", props.name);
    if !b.enter(&props.name, None, InputKind::Create) {
        return name;
    }
    let fields = props
        .fields
        .iter()
        .filter(|f| f.writable())
        .map(create_scalar_spec)
        .collect();
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_props_update(
    b: &mut SchemaBuilder<'_>,
    props: &RelationshipProperties,
) -> String {
    let name = format!("{}UpdateInput", props.name);
    if !b.enter(&props.name, None, InputKind::Update) {
        return name;
    }
    let fields = props
        .fields
        .iter()
        .filter(|f| f.writable())
        .map(update_scalar_spec)
        .collect();
    b.add_input(&name, fields);
    name
}
