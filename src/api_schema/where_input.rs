//! Where, sort and options input generation.
//!
//! Each scalar field contributes the operator family appropriate to its
//! type; relationships contribute quantifier sub-filters and an aggregate
//! sub-filter. Polymorphic targets key their sub-filters per implementing
//! type.

use crate::type_model::{
    Field, FieldType, InterfaceModel, Node, RelTarget, RelationshipProperties, ScalarKind,
    UnionModel,
};

use super::builder::{InputKind, SchemaBuilder};
use super::types::{InputValueSpec, TypeRef};

/// Operator specs for one scalar/enum field.
pub(super) fn scalar_operator_specs(field: &Field) -> Vec<InputValueSpec> {
    let type_name = field.field_type.type_name().to_string();
    let scalar = TypeRef::named(&type_name);
    let mut out = Vec::new();

    if field.list {
        let list = scalar.clone().required().list_of();
        out.push(InputValueSpec::new(&field.name, list.clone()));
        out.push(InputValueSpec::new(format!("{}_NOT", field.name), list));
        out.push(InputValueSpec::new(
            format!("{}_INCLUDES", field.name),
            scalar.clone(),
        ));
        out.push(InputValueSpec::new(format!("{}_NOT_INCLUDES", field.name), scalar));
        return out;
    }

    out.push(InputValueSpec::new(&field.name, scalar.clone()));
    out.push(InputValueSpec::new(format!("{}_NOT", field.name), scalar.clone()));

    let boolean = matches!(field.field_type, FieldType::Scalar(ScalarKind::Boolean));
    if !boolean {
        let membership = scalar.clone().list_of();
        out.push(InputValueSpec::new(format!("{}_IN", field.name), membership.clone()));
        out.push(InputValueSpec::new(format!("{}_NOT_IN", field.name), membership));
    }

    if field.field_type.is_string_like() {
        for op in ["CONTAINS", "NOT_CONTAINS", "STARTS_WITH", "NOT_STARTS_WITH", "ENDS_WITH", "NOT_ENDS_WITH"] {
            out.push(InputValueSpec::new(
                format!("{}_{}", field.name, op),
                scalar.clone(),
            ));
        }
    }

    if field.field_type.is_numeric() {
        for op in ["LT", "LTE", "GT", "GTE"] {
            out.push(InputValueSpec::new(
                format!("{}_{}", field.name, op),
                scalar.clone(),
            ));
        }
    }

    out
}

pub(super) fn ensure_node_where(b: &mut SchemaBuilder<'_>, node: &Node) -> String {
    let name = format!("{}Where", node.name);
    if !b.enter(&node.name, None, InputKind::Where) {
        return name;
    }

    let mut fields = vec![
        InputValueSpec::new("AND", TypeRef::named(&name).required().list_of()),
        InputValueSpec::new("OR", TypeRef::named(&name).required().list_of()),
    ];
    for field in node.fields.iter().filter(|f| f.filterable()) {
        fields.extend(scalar_operator_specs(field));
    }

    let relationships = node.relationships.clone();
    for rel in &relationships {
        let Some(target_where) = ensure_target_where(b, &rel.target) else {
            continue;
        };
        if rel.list {
            for quantifier in ["ALL", "NONE", "SINGLE", "SOME"] {
                fields.push(InputValueSpec::new(
                    format!("{}_{}", rel.field_name, quantifier),
                    TypeRef::named(&target_where),
                ));
            }
            if let RelTarget::Node(_) = &rel.target {
                let aggregate_name = ensure_aggregate_input(b, node, &rel.field_name);
                fields.push(InputValueSpec::new(
                    format!("{}Aggregate", rel.field_name),
                    TypeRef::named(aggregate_name),
                ));
            }
        } else {
            fields.push(InputValueSpec::new(&rel.field_name, TypeRef::named(&target_where)));
            fields.push(InputValueSpec::new(
                format!("{}_NOT", rel.field_name),
                TypeRef::named(&target_where),
            ));
        }
    }

    b.add_input(&name, fields);
    name
}

/// The where input a relationship target contributes, whatever its shape.
pub(super) fn ensure_target_where(b: &mut SchemaBuilder<'_>, target: &RelTarget) -> Option<String> {
    match target {
        RelTarget::Node(name) => {
            let node = b.model.node(name).cloned()?;
            Some(ensure_node_where(b, &node))
        }
        RelTarget::Interface { name, .. } => {
            let interface = b.model.interface(name).cloned()?;
            Some(ensure_interface_where(b, &interface))
        }
        RelTarget::Union { name, .. } => {
            let union = b.model.union(name).cloned()?;
            Some(ensure_union_where(b, &union))
        }
    }
}

pub(super) fn ensure_interface_where(
    b: &mut SchemaBuilder<'_>,
    interface: &InterfaceModel,
) -> String {
    let name = format!("{}Where", interface.name);
    if !b.enter(&interface.name, None, InputKind::Where) {
        return name;
    }
    let mut fields = vec![
        InputValueSpec::new("AND", TypeRef::named(&name).required().list_of()),
        InputValueSpec::new("OR", TypeRef::named(&name).required().list_of()),
    ];
    for field in interface.fields.iter().filter(|f| f.filterable()) {
        fields.extend(scalar_operator_specs(field));
    }
    let implementations_name = ensure_implementations_where(b, interface);
    fields.push(InputValueSpec::new("_on", TypeRef::named(implementations_name)));
    b.add_input(&name, fields);
    name
}

fn ensure_implementations_where(b: &mut SchemaBuilder<'_>, interface: &InterfaceModel) -> String {
    let name = format!("{}ImplementationsWhere", interface.name);
    if !b.enter(&interface.name, None, InputKind::ImplementationsWhere) {
        return name;
    }
    let mut fields = Vec::new();
    for implementation in interface.implementations.clone() {
        if let Some(node) = b.model.node(&implementation).cloned() {
            let node_where = ensure_node_where(b, &node);
            fields.push(InputValueSpec::new(implementation, TypeRef::named(node_where)));
        }
    }
    b.add_input(&name, fields);
    name
}

/// A union where input carries exactly one sub-filter per member type.
pub(super) fn ensure_union_where(b: &mut SchemaBuilder<'_>, union: &UnionModel) -> String {
    let name = format!("{}Where", union.name);
    if !b.enter(&union.name, None, InputKind::Where) {
        return name;
    }
    let mut fields = Vec::new();
    for member in union.members.clone() {
        if let Some(node) = b.model.node(&member).cloned() {
            let node_where = ensure_node_where(b, &node);
            fields.push(InputValueSpec::new(member, TypeRef::named(node_where)));
        }
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_node_sort(b: &mut SchemaBuilder<'_>, node: &Node) -> Option<String> {
    let sortable: Vec<&Field> = node.fields.iter().filter(|f| f.sortable()).collect();
    if sortable.is_empty() {
        return None;
    }
    let name = format!("{}Sort", node.name);
    if !b.enter(&node.name, None, InputKind::Sort) {
        return Some(name);
    }
    let fields = sortable
        .iter()
        .map(|f| InputValueSpec::new(&f.name, TypeRef::named("SortDirection")))
        .collect();
    b.add_input(&name, fields);
    Some(name)
}

fn ensure_interface_sort(b: &mut SchemaBuilder<'_>, interface: &InterfaceModel) -> Option<String> {
    let sortable: Vec<&Field> = interface.fields.iter().filter(|f| f.sortable()).collect();
    if sortable.is_empty() {
        return None;
    }
    let name = format!("{}Sort", interface.name);
    if !b.enter(&interface.name, None, InputKind::Sort) {
        return Some(name);
    }
    let fields = sortable
        .iter()
        .map(|f| InputValueSpec::new(&f.name, TypeRef::named("SortDirection")))
        .collect();
    b.add_input(&name, fields);
    Some(name)
}

pub(super) fn ensure_node_options(b: &mut SchemaBuilder<'_>, node: &Node) -> String {
    let name = format!("{}Options", node.name);
    if !b.enter(&node.name, None, InputKind::Options) {
        return name;
    }
    let mut fields = Vec::new();
    if let Some(sort_name) = ensure_node_sort(b, node) {
        fields.push(InputValueSpec::new(
            "sort",
            TypeRef::named(sort_name).required().list_of(),
        ));
    }
    fields.push(InputValueSpec::new("limit", TypeRef::named("Int")));
    fields.push(InputValueSpec::new("offset", TypeRef::named("Int")));
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_interface_options(
    b: &mut SchemaBuilder<'_>,
    interface: &InterfaceModel,
) -> String {
    let name = format!("{}Options", interface.name);
    if !b.enter(&interface.name, None, InputKind::Options) {
        return name;
    }
    let mut fields = Vec::new();
    if let Some(sort_name) = ensure_interface_sort(b, interface) {
        fields.push(InputValueSpec::new(
            "sort",
            TypeRef::named(sort_name).required().list_of(),
        ));
    }
    fields.push(InputValueSpec::new("limit", TypeRef::named("Int")));
    fields.push(InputValueSpec::new("offset", TypeRef::named("Int")));
    b.add_input(&name, fields);
    name
}

/// Shared limit/offset options used where no sortable shape exists.
pub(super) fn ensure_query_options(b: &mut SchemaBuilder<'_>) -> String {
    let name = "QueryOptions".to_string();
    if !b.enter("QueryOptions", None, InputKind::Options) {
        return name;
    }
    b.add_input(
        &name,
        vec![
            InputValueSpec::new("limit", TypeRef::named("Int")),
            InputValueSpec::new("offset", TypeRef::named("Int")),
        ],
    );
    name
}

/// Count-based aggregate sub-filter for a list relationship.
fn ensure_aggregate_input(b: &mut SchemaBuilder<'_>, node: &Node, field_name: &str) -> String {
    let name = format!("{}{}AggregateInput", node.name, crate::utils::naming::upper_first(field_name));
    if !b.enter(&node.name, Some(field_name), InputKind::AggregateInput) {
        return name;
    }
    let mut fields = vec![
        InputValueSpec::new("AND", TypeRef::named(&name).required().list_of()),
        InputValueSpec::new("OR", TypeRef::named(&name).required().list_of()),
    ];
    for op in ["count", "count_LT", "count_LTE", "count_GT", "count_GTE"] {
        fields.push(InputValueSpec::new(op, TypeRef::named("Int")));
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_props_where(
    b: &mut SchemaBuilder<'_>,
    props: &RelationshipProperties,
) -> String {
    let name = format!("{}Where", props.name);
    if !b.enter(&props.name, None, InputKind::Where) {
        return name;
    }
    let mut fields = vec![
        InputValueSpec::new("AND", TypeRef::named(&name).required().list_of()),
        InputValueSpec::new("OR", TypeRef::named(&name).required().list_of()),
    ];
    for field in props.fields.iter().filter(|f| f.filterable()) {
        fields.extend(scalar_operator_specs(field));
    }
    b.add_input(&name, fields);
    name
}

pub(super) fn ensure_props_sort(
    b: &mut SchemaBuilder<'_>,
    props: &RelationshipProperties,
) -> Option<String> {
    let sortable: Vec<&Field> = props.fields.iter().filter(|f| f.sortable()).collect();
    if sortable.is_empty() {
        return None;
    }
    let name = format!("{}Sort", props.name);
    if !b.enter(&props.name, None, InputKind::Sort) {
        return Some(name);
    }
    let fields = sortable
        .iter()
        .map(|f| InputValueSpec::new(&f.name, TypeRef::named("SortDirection")))
        .collect();
    b.add_input(&name, fields);
    Some(name)
}
