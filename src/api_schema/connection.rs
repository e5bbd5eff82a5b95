//! Per-relationship connection types.
//!
//! Every relationship gets a paginated connection field: edges carrying a
//! cursor, the target node, and any edge properties, plus page-info and a
//! total count.

use crate::type_model::{Node, RelTarget, Relationship};

use super::builder::{InputKind, SchemaBuilder};
use super::types::{FieldSpec, InputValueSpec, ObjectType, SchemaType, TypeRef};
use super::where_input;

/// Generate the connection object, its where input, and (when anything is
/// sortable) its sort input. Returns their names.
pub(super) fn ensure_connection_field_types(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
) -> (String, String, Option<String>) {
    let base = SchemaBuilder::rel_input_base(node, rel, None);
    let connection_name = format!("{}Connection", base);
    let where_name = ensure_connection_where(b, node, rel, None);
    let sort_name = ensure_connection_sort(b, node, rel);

    if b.enter(&node.name, Some(&rel.field_name), InputKind::Connection) {
        let relationship_name = format!("{}Relationship", base);
        let mut edge_fields = vec![
            FieldSpec::new("cursor", TypeRef::named("String").required()),
            FieldSpec::new("node", TypeRef::named(rel.target.name()).required()),
        ];
        if let Some(props) = rel
            .properties
            .as_ref()
            .and_then(|name| b.model.relationship_properties(name).cloned())
        {
            for field in props.fields.iter().filter(|f| f.readable()) {
                edge_fields.push(FieldSpec::new(
                    &field.name,
                    super::builder::scalar_field_type_ref(field),
                ));
            }
        }
        b.add(SchemaType::Object(ObjectType {
            name: relationship_name.clone(),
            implements: vec![],
            fields: edge_fields,
        }));
        b.add(SchemaType::Object(ObjectType {
            name: connection_name.clone(),
            implements: vec![],
            fields: vec![
                FieldSpec::new(
                    "edges",
                    TypeRef::named(relationship_name).required().list_of().required(),
                ),
                FieldSpec::new("totalCount", TypeRef::named("Int").required()),
                FieldSpec::new("pageInfo", TypeRef::named("PageInfo").required()),
            ],
        }));
    }

    (connection_name, where_name, sort_name)
}

/// Connection-level where input. Union targets key one sub-where per
/// member; node and interface targets filter on node and edge directly.
pub(super) fn ensure_connection_where(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    member: Option<&str>,
) -> String {
    let base = SchemaBuilder::rel_input_base(node, rel, member);
    let name = format!("{}ConnectionWhere", base);
    let key_rel = match member {
        Some(member) => format!("{}:{}", rel.field_name, member),
        None => rel.field_name.clone(),
    };
    if !b.enter(&node.name, Some(&key_rel), InputKind::ConnectionWhere) {
        return name;
    }

    if member.is_none() {
        if let RelTarget::Union { members, .. } = &rel.target {
            let members = members.clone();
            let mut fields = Vec::new();
            for member in &members {
                let member_where = ensure_connection_where(b, node, rel, Some(member));
                fields.push(InputValueSpec::new(member.clone(), TypeRef::named(member_where)));
            }
            b.add_input(&name, fields);
            return name;
        }
    }

    let node_where = match member {
        Some(member) => b
            .model
            .node(member)
            .cloned()
            .map(|n| where_input::ensure_node_where(b, &n)),
        None => where_input::ensure_target_where(b, &rel.target),
    };

    let mut fields = vec![
        InputValueSpec::new("AND", TypeRef::named(&name).required().list_of()),
        InputValueSpec::new("OR", TypeRef::named(&name).required().list_of()),
    ];
    if let Some(node_where) = node_where {
        fields.push(InputValueSpec::new("node", TypeRef::named(&node_where)));
        fields.push(InputValueSpec::new("node_NOT", TypeRef::named(node_where)));
    }
    if let Some(props) = rel
        .properties
        .as_ref()
        .and_then(|p| b.model.relationship_properties(p).cloned())
    {
        let edge_where = where_input::ensure_props_where(b, &props);
        fields.push(InputValueSpec::new("edge", TypeRef::named(&edge_where)));
        fields.push(InputValueSpec::new("edge_NOT", TypeRef::named(edge_where)));
    }
    b.add_input(&name, fields);
    name
}

fn ensure_connection_sort(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
) -> Option<String> {
    let node_sort = match &rel.target {
        RelTarget::Node(target) => {
            let target = b.model.node(target).cloned()?;
            where_input::ensure_node_sort(b, &target)
        }
        RelTarget::Interface { .. } | RelTarget::Union { .. } => None,
    };
    let edge_sort = rel
        .properties
        .as_ref()
        .and_then(|p| b.model.relationship_properties(p).cloned())
        .and_then(|props| where_input::ensure_props_sort(b, &props));

    if node_sort.is_none() && edge_sort.is_none() {
        return None;
    }

    let base = SchemaBuilder::rel_input_base(node, rel, None);
    let name = format!("{}ConnectionSort", base);
    if !b.enter(&node.name, Some(&rel.field_name), InputKind::ConnectionSort) {
        return Some(name);
    }
    let mut fields = Vec::new();
    if let Some(node_sort) = node_sort {
        fields.push(InputValueSpec::new("node", TypeRef::named(node_sort)));
    }
    if let Some(edge_sort) = edge_sort {
        fields.push(InputValueSpec::new("edge", TypeRef::named(edge_sort)));
    }
    b.add_input(&name, fields);
    Some(name)
}
