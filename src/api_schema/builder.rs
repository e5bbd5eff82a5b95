//! Schema generation driver.
//!
//! One pass over the type model produces every generated type and root
//! operation. Recursively generated input types are memoized by
//! (owner, relationship-field, kind): the key is recorded before the type
//! body is built, so cyclic relationship graphs terminate by type reuse
//! instead of unfolding forever.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::type_model::{
    Field, FieldType, Node, RelTarget, Relationship, ScalarKind, TypeModel,
};
use crate::utils::naming::upper_first;

use super::types::{
    EnumType, FieldSpec, InputObjectType, InputValueSpec, InterfaceType, ObjectType, ScalarType,
    SchemaType, TypeRef, UnionType,
};
use super::{connection, where_input, write_input, ApiSchema};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct InputTypeKey {
    pub owner: String,
    pub relationship: Option<String>,
    pub kind: InputKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum InputKind {
    Where,
    Sort,
    Options,
    ConnectWhere,
    Fulltext,
    Create,
    Update,
    Connect,
    Disconnect,
    Delete,
    Relation,
    FieldInput,
    CreateField,
    ConnectField,
    UpdateField,
    UpdateConnection,
    DeleteField,
    DisconnectField,
    ConnectionWhere,
    ConnectionSort,
    Connection,
    AggregateInput,
    AggregateSelection,
    ImplementationsWhere,
    ImplementationsUpdate,
}

pub(super) struct SchemaBuilder<'m> {
    pub model: &'m TypeModel,
    pub types: BTreeMap<String, SchemaType>,
    generated: HashSet<InputTypeKey>,
    pub query_fields: Vec<FieldSpec>,
    pub mutation_fields: Vec<FieldSpec>,
}

impl<'m> SchemaBuilder<'m> {
    fn new(model: &'m TypeModel) -> Self {
        SchemaBuilder {
            model,
            types: BTreeMap::new(),
            generated: HashSet::new(),
            query_fields: Vec::new(),
            mutation_fields: Vec::new(),
        }
    }

    /// Record that generation for this key has started. Returns false when
    /// the type already exists (or is being built higher up the stack), in
    /// which case the caller must reuse the name instead of recursing.
    pub(super) fn enter(
        &mut self,
        owner: &str,
        relationship: Option<&str>,
        kind: InputKind,
    ) -> bool {
        self.generated.insert(InputTypeKey {
            owner: owner.to_string(),
            relationship: relationship.map(String::from),
            kind,
        })
    }

    pub(super) fn add(&mut self, ty: SchemaType) {
        self.types.insert(ty.name().to_string(), ty);
    }

    pub(super) fn add_input(&mut self, name: &str, fields: Vec<InputValueSpec>) {
        self.add(SchemaType::Input(InputObjectType { name: name.to_string(), fields }));
    }

    /// Base name of the per-relationship input family, optionally keyed to
    /// one concrete member of a polymorphic target.
    pub(super) fn rel_input_base(node: &Node, rel: &Relationship, member: Option<&str>) -> String {
        match member {
            Some(member) => format!("{}{}{}", node.name, upper_first(&rel.field_name), member),
            None => format!("{}{}", node.name, upper_first(&rel.field_name)),
        }
    }
}

pub fn generate(model: &TypeModel) -> ApiSchema {
    let mut b = SchemaBuilder::new(model);

    add_static_types(&mut b);

    for node in model.nodes() {
        node_object_type(&mut b, node);
        where_input::ensure_node_where(&mut b, node);
        where_input::ensure_node_options(&mut b, node);
        write_input::ensure_node_create(&mut b, node);
        write_input::ensure_node_update(&mut b, node);
        write_input::ensure_node_connect_input(&mut b, node);
        write_input::ensure_node_disconnect_input(&mut b, node);
        write_input::ensure_node_delete_input(&mut b, node);
        write_input::ensure_node_relation_input(&mut b, node);
        ensure_node_aggregate_selection(&mut b, node);
        ensure_fulltext_input(&mut b, node);
        root_operations(&mut b, node);
    }

    for interface in model.interfaces() {
        interface_object_type(&mut b, interface);
    }

    for union in model.unions() {
        b.add(SchemaType::Union(UnionType {
            name: union.name.clone(),
            members: union.members.clone(),
        }));
    }

    debug!(
        "generated api schema: {} types, {} query fields, {} mutation fields",
        b.types.len(),
        b.query_fields.len(),
        b.mutation_fields.len()
    );

    ApiSchema {
        types: b.types,
        query_fields: b.query_fields,
        mutation_fields: b.mutation_fields,
    }
}

fn add_static_types(b: &mut SchemaBuilder<'_>) {
    b.add(SchemaType::Enum(EnumType {
        name: "SortDirection".into(),
        values: vec!["ASC".into(), "DESC".into()],
    }));
    b.add(SchemaType::Object(ObjectType {
        name: "PageInfo".into(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("hasNextPage", TypeRef::named("Boolean").required()),
            FieldSpec::new("hasPreviousPage", TypeRef::named("Boolean").required()),
            FieldSpec::new("startCursor", TypeRef::named("String")),
            FieldSpec::new("endCursor", TypeRef::named("String")),
        ],
    }));
    b.add(SchemaType::Object(ObjectType {
        name: "CreateInfo".into(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("bookmark", TypeRef::named("String")),
            FieldSpec::new("nodesCreated", TypeRef::named("Int").required()),
            FieldSpec::new("relationshipsCreated", TypeRef::named("Int").required()),
        ],
    }));
    b.add(SchemaType::Object(ObjectType {
        name: "UpdateInfo".into(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("bookmark", TypeRef::named("String")),
            FieldSpec::new("nodesCreated", TypeRef::named("Int").required()),
            FieldSpec::new("nodesDeleted", TypeRef::named("Int").required()),
            FieldSpec::new("relationshipsCreated", TypeRef::named("Int").required()),
            FieldSpec::new("relationshipsDeleted", TypeRef::named("Int").required()),
        ],
    }));
    b.add(SchemaType::Object(ObjectType {
        name: "DeleteInfo".into(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("bookmark", TypeRef::named("String")),
            FieldSpec::new("nodesDeleted", TypeRef::named("Int").required()),
            FieldSpec::new("relationshipsDeleted", TypeRef::named("Int").required()),
        ],
    }));

    for (name, values) in enum_definitions(b.model) {
        b.add(SchemaType::Enum(EnumType { name, values }));
    }
    for name in custom_scalar_names(b.model) {
        b.add(SchemaType::Scalar(ScalarType { name }));
    }
}

fn enum_definitions(model: &TypeModel) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for node in model.nodes() {
        for field in &node.fields {
            if let FieldType::Enum(name) = &field.field_type {
                if seen.insert(name.clone()) {
                    if let Some(values) = model.enum_values(name) {
                        out.push((name.clone(), values.to_vec()));
                    }
                }
            }
        }
    }
    out
}

fn custom_scalar_names(model: &TypeModel) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for node in model.nodes() {
        for field in &node.fields {
            if let FieldType::Custom(name) = &field.field_type {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
        }
    }
    out
}

pub(super) fn scalar_field_type_ref(field: &Field) -> TypeRef {
    let mut type_ref = TypeRef::named(field.field_type.type_name());
    if field.list {
        // List elements are treated as non-null; the database cannot store
        // null entries inside a property array anyway.
        type_ref = type_ref.required().list_of();
        if field.required {
            type_ref = type_ref.required();
        }
    } else if field.required {
        type_ref = type_ref.required();
    }
    type_ref
}

fn node_object_type(b: &mut SchemaBuilder<'_>, node: &Node) {
    let mut fields = Vec::new();
    for field in node.fields.iter().filter(|f| f.readable()) {
        fields.push(FieldSpec::new(&field.name, scalar_field_type_ref(field)));
    }
    for rel in &node.relationships {
        fields.extend(relationship_fields(b, node, rel));
    }

    let implements = b
        .model
        .interfaces()
        .iter()
        .filter(|i| i.implementations.contains(&node.name))
        .map(|i| i.name.clone())
        .collect();

    b.add(SchemaType::Object(ObjectType { name: node.name.clone(), implements, fields }));
}

fn interface_object_type(b: &mut SchemaBuilder<'_>, interface: &crate::type_model::InterfaceModel) {
    let mut fields = Vec::new();
    for field in interface.fields.iter().filter(|f| f.readable()) {
        fields.push(FieldSpec::new(&field.name, scalar_field_type_ref(field)));
    }
    for rel in &interface.relationships {
        let target_ref = traversal_type_ref(rel);
        fields.push(FieldSpec::new(&rel.field_name, target_ref));
    }
    b.add(SchemaType::Interface(InterfaceType { name: interface.name.clone(), fields }));
}

fn traversal_type_ref(rel: &Relationship) -> TypeRef {
    let mut type_ref = TypeRef::named(rel.target.name()).required();
    if rel.list {
        type_ref = type_ref.list_of().required();
    } else if !rel.required {
        type_ref.non_null = false;
    }
    type_ref
}

/// The traversal, connection and aggregation fields a relationship adds to
/// its owner's object type.
fn relationship_fields(b: &mut SchemaBuilder<'_>, node: &Node, rel: &Relationship) -> Vec<FieldSpec> {
    let mut out = Vec::new();

    let mut traversal = FieldSpec::new(&rel.field_name, traversal_type_ref(rel));
    if let Some(where_name) = where_input::ensure_target_where(b, &rel.target) {
        traversal = traversal.argument("where", TypeRef::named(where_name));
    }
    let options_name = match &rel.target {
        RelTarget::Node(name) => {
            let target = b.model.node(name).cloned();
            target.map(|t| where_input::ensure_node_options(b, &t))
        }
        RelTarget::Interface { name, .. } => {
            let interface = b.model.interface(name).cloned();
            interface.map(|i| where_input::ensure_interface_options(b, &i))
        }
        RelTarget::Union { .. } => Some(where_input::ensure_query_options(b)),
    };
    if let Some(options_name) = options_name {
        traversal = traversal.argument("options", TypeRef::named(options_name));
    }
    out.push(traversal);

    let (connection_name, connection_where, connection_sort) =
        connection::ensure_connection_field_types(b, node, rel);
    let mut connection_field = FieldSpec::new(
        format!("{}Connection", rel.field_name),
        TypeRef::named(connection_name).required(),
    )
    .argument("where", TypeRef::named(connection_where))
    .argument("first", TypeRef::named("Int"))
    .argument("after", TypeRef::named("String"));
    if let Some(sort_name) = connection_sort {
        connection_field = connection_field
            .argument("sort", TypeRef::named(sort_name).required().list_of());
    }
    out.push(connection_field);

    if let RelTarget::Node(target_name) = &rel.target {
        if let Some(target) = b.model.node(target_name).cloned() {
            let selection_name = ensure_rel_aggregation_selection(b, node, rel, &target);
            let mut aggregate = FieldSpec::new(
                format!("{}Aggregate", rel.field_name),
                TypeRef::named(selection_name).required(),
            );
            let where_name = where_input::ensure_node_where(b, &target);
            aggregate = aggregate.argument("where", TypeRef::named(where_name));
            out.push(aggregate);
        }
    }

    out
}

fn aggregate_scalar_type(b: &mut SchemaBuilder<'_>, kind: ScalarKind) -> Option<String> {
    let (name, fields) = match kind {
        ScalarKind::Id => (
            "IDAggregateSelection",
            vec![
                FieldSpec::new("shortest", TypeRef::named("ID")),
                FieldSpec::new("longest", TypeRef::named("ID")),
            ],
        ),
        ScalarKind::String => (
            "StringAggregateSelection",
            vec![
                FieldSpec::new("shortest", TypeRef::named("String")),
                FieldSpec::new("longest", TypeRef::named("String")),
            ],
        ),
        ScalarKind::Int => (
            "IntAggregateSelection",
            vec![
                FieldSpec::new("min", TypeRef::named("Int")),
                FieldSpec::new("max", TypeRef::named("Int")),
                FieldSpec::new("average", TypeRef::named("Float")),
                FieldSpec::new("sum", TypeRef::named("Int")),
            ],
        ),
        ScalarKind::Float => (
            "FloatAggregateSelection",
            vec![
                FieldSpec::new("min", TypeRef::named("Float")),
                FieldSpec::new("max", TypeRef::named("Float")),
                FieldSpec::new("average", TypeRef::named("Float")),
                FieldSpec::new("sum", TypeRef::named("Float")),
            ],
        ),
        ScalarKind::Boolean => return None,
    };
    if !b.types.contains_key(name) {
        b.add(SchemaType::Object(ObjectType {
            name: name.to_string(),
            implements: vec![],
            fields,
        }));
    }
    Some(name.to_string())
}

/// Which fields participate in aggregate selections.
pub(super) fn aggregatable_fields(node: &Node) -> Vec<&Field> {
    node.fields
        .iter()
        .filter(|f| f.filterable() && !f.list)
        .filter(|f| {
            matches!(
                f.field_type,
                FieldType::Scalar(ScalarKind::Id)
                    | FieldType::Scalar(ScalarKind::String)
                    | FieldType::Scalar(ScalarKind::Int)
                    | FieldType::Scalar(ScalarKind::Float)
            )
        })
        .collect()
}

pub(super) fn ensure_node_aggregate_selection(b: &mut SchemaBuilder<'_>, node: &Node) -> String {
    let name = format!("{}AggregateSelection", node.name);
    if !b.enter(&node.name, None, InputKind::AggregateSelection) {
        return name;
    }
    let mut fields = vec![FieldSpec::new("count", TypeRef::named("Int").required())];
    for field in aggregatable_fields(node) {
        let FieldType::Scalar(kind) = field.field_type else { continue };
        if let Some(type_name) = aggregate_scalar_type(b, kind) {
            fields.push(FieldSpec::new(&field.name, TypeRef::named(type_name).required()));
        }
    }
    b.add(SchemaType::Object(ObjectType { name: name.clone(), implements: vec![], fields }));
    name
}

fn ensure_rel_aggregation_selection(
    b: &mut SchemaBuilder<'_>,
    node: &Node,
    rel: &Relationship,
    target: &Node,
) -> String {
    let name = format!("{}AggregationSelection", SchemaBuilder::rel_input_base(node, rel, None));
    if !b.enter(&node.name, Some(&rel.field_name), InputKind::AggregateSelection) {
        return name;
    }
    let target_selection = ensure_node_aggregate_selection(b, target);
    b.add(SchemaType::Object(ObjectType {
        name: name.clone(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("count", TypeRef::named("Int").required()),
            FieldSpec::new("node", TypeRef::named(target_selection)),
        ],
    }));
    name
}

/// `{Node}Fulltext` input with one key per declared index.
pub(super) fn ensure_fulltext_input(b: &mut SchemaBuilder<'_>, node: &Node) -> Option<String> {
    if node.fulltext_indexes.is_empty() {
        return None;
    }
    let name = format!("{}Fulltext", node.name);
    if !b.enter(&node.name, None, InputKind::Fulltext) {
        return Some(name);
    }
    let mut fields = Vec::new();
    for index in &node.fulltext_indexes {
        let index_input = format!("{}{}Fulltext", node.name, index.name);
        b.add_input(
            &index_input,
            vec![InputValueSpec::new("phrase", TypeRef::named("String").required())],
        );
        fields.push(InputValueSpec::new(&index.name, TypeRef::named(index_input)));
    }
    b.add_input(&name, fields);
    Some(name)
}

fn root_operations(b: &mut SchemaBuilder<'_>, node: &Node) {
    let plural_pascal = upper_first(&node.plural);
    let where_name = where_input::ensure_node_where(b, node);
    let options_name = where_input::ensure_node_options(b, node);
    let aggregate_name = ensure_node_aggregate_selection(b, node);
    let create_name = write_input::ensure_node_create(b, node);
    let update_name = write_input::ensure_node_update(b, node);

    let mut read = FieldSpec::new(
        &node.plural,
        TypeRef::named(&node.name).required().list_of().required(),
    )
    .argument("where", TypeRef::named(&where_name))
    .argument("options", TypeRef::named(&options_name));
    if let Some(fulltext_name) = ensure_fulltext_input(b, node) {
        read = read.argument("fulltext", TypeRef::named(fulltext_name));
    }
    b.query_fields.push(read);

    b.query_fields.push(
        FieldSpec::new(
            format!("{}Aggregate", node.plural),
            TypeRef::named(aggregate_name).required(),
        )
        .argument("where", TypeRef::named(&where_name)),
    );

    // Root-level relay connection.
    let sort_name = where_input::ensure_node_sort(b, node);
    let edge_name = format!("{}Edge", node.name);
    let connection_name = format!("{}Connection", plural_pascal);
    if !b.types.contains_key(&edge_name) {
        b.add(SchemaType::Object(ObjectType {
            name: edge_name.clone(),
            implements: vec![],
            fields: vec![
                FieldSpec::new("cursor", TypeRef::named("String").required()),
                FieldSpec::new("node", TypeRef::named(&node.name).required()),
            ],
        }));
    }
    if !b.types.contains_key(&connection_name) {
        b.add(SchemaType::Object(ObjectType {
            name: connection_name.clone(),
            implements: vec![],
            fields: vec![
                FieldSpec::new(
                    "edges",
                    TypeRef::named(edge_name).required().list_of().required(),
                ),
                FieldSpec::new("totalCount", TypeRef::named("Int").required()),
                FieldSpec::new("pageInfo", TypeRef::named("PageInfo").required()),
            ],
        }));
    }
    let mut connection_root = FieldSpec::new(
        format!("{}Connection", node.plural),
        TypeRef::named(connection_name).required(),
    )
    .argument("where", TypeRef::named(&where_name));
    if let Some(sort_name) = sort_name.clone() {
        connection_root =
            connection_root.argument("sort", TypeRef::named(sort_name).required().list_of());
    }
    connection_root = connection_root
        .argument("first", TypeRef::named("Int"))
        .argument("after", TypeRef::named("String"));
    b.query_fields.push(connection_root);

    // Mutation responses and root mutations.
    let create_response = format!("Create{}MutationResponse", plural_pascal);
    b.add(SchemaType::Object(ObjectType {
        name: create_response.clone(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("info", TypeRef::named("CreateInfo").required()),
            FieldSpec::new(
                &node.plural,
                TypeRef::named(&node.name).required().list_of().required(),
            ),
        ],
    }));
    let update_response = format!("Update{}MutationResponse", plural_pascal);
    b.add(SchemaType::Object(ObjectType {
        name: update_response.clone(),
        implements: vec![],
        fields: vec![
            FieldSpec::new("info", TypeRef::named("UpdateInfo").required()),
            FieldSpec::new(
                &node.plural,
                TypeRef::named(&node.name).required().list_of().required(),
            ),
        ],
    }));

    b.mutation_fields.push(
        FieldSpec::new(
            format!("create{}", plural_pascal),
            TypeRef::named(create_response).required(),
        )
        .argument(
            "input",
            TypeRef::named(create_name).required().list_of().required(),
        ),
    );

    let mut update = FieldSpec::new(
        format!("update{}", plural_pascal),
        TypeRef::named(update_response).required(),
    )
    .argument("where", TypeRef::named(&where_name))
    .argument("update", TypeRef::named(update_name));
    if let Some(connect_name) = write_input::ensure_node_connect_input(b, node) {
        update = update.argument("connect", TypeRef::named(connect_name));
    }
    if let Some(disconnect_name) = write_input::ensure_node_disconnect_input(b, node) {
        update = update.argument("disconnect", TypeRef::named(disconnect_name));
    }
    if let Some(relation_name) = write_input::ensure_node_relation_input(b, node) {
        update = update.argument("create", TypeRef::named(relation_name));
    }
    if let Some(delete_name) = write_input::ensure_node_delete_input(b, node) {
        update = update.argument("delete", TypeRef::named(delete_name));
    }
    b.mutation_fields.push(update);

    let mut delete = FieldSpec::new(
        format!("delete{}", plural_pascal),
        TypeRef::named("DeleteInfo").required(),
    )
    .argument("where", TypeRef::named(&where_name));
    if let Some(delete_name) = write_input::ensure_node_delete_input(b, node) {
        delete = delete.argument("delete", TypeRef::named(delete_name));
    }
    b.mutation_fields.push(delete);
}
