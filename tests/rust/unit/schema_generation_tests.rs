//! Generated schema shape: operator families, per-relationship input
//! families, polymorphic keying, root operations, and cycle termination.

use graphbolt::api_schema::{ApiSchema, SchemaType};
use graphbolt::type_model::TypeModel;
use serde_json::json;

use crate::fixtures;

fn input_field_names(schema: &ApiSchema, name: &str) -> Vec<String> {
    schema
        .input(name)
        .unwrap_or_else(|| panic!("input {} exists", name))
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect()
}

#[test]
fn test_where_input_operator_families() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    let names = input_field_names(&schema, "MovieWhere");

    for expected in [
        "AND",
        "OR",
        "title",
        "title_NOT",
        "title_IN",
        "title_NOT_IN",
        "title_CONTAINS",
        "title_NOT_CONTAINS",
        "title_STARTS_WITH",
        "title_NOT_STARTS_WITH",
        "title_ENDS_WITH",
        "title_NOT_ENDS_WITH",
        "runtime",
        "runtime_NOT",
        "runtime_LT",
        "runtime_LTE",
        "runtime_GT",
        "runtime_GTE",
        "actors_ALL",
        "actors_NONE",
        "actors_SINGLE",
        "actors_SOME",
        "actorsAggregate",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    // Numeric fields get no string operators.
    assert!(!names.iter().any(|n| n == "runtime_CONTAINS"));
}

#[test]
fn test_union_where_is_keyed_per_member() {
    let model = fixtures::publication_model();
    let schema = ApiSchema::generate(&model);
    assert_eq!(input_field_names(&schema, "PublicationWhere"), vec!["Book", "Journal"]);
}

#[test]
fn test_sort_and_options_inputs() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    let sort = input_field_names(&schema, "MovieSort");
    assert_eq!(sort, vec!["title", "description", "runtime"]);
    let options = input_field_names(&schema, "MovieOptions");
    assert_eq!(options, vec!["sort", "limit", "offset"]);
}

#[test]
fn test_relationship_field_input_family() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    assert_eq!(
        input_field_names(&schema, "MovieActorsFieldInput"),
        vec!["create", "connect"]
    );
    assert_eq!(
        input_field_names(&schema, "MovieActorsUpdateFieldInput"),
        vec!["where", "update", "connect", "disconnect", "create", "delete"]
    );
    assert_eq!(
        input_field_names(&schema, "ActorConnectWhere"),
        vec!["node"]
    );
    assert!(schema.input("MovieConnectInput").is_some());
    assert!(schema.input("MovieDisconnectInput").is_some());
    assert!(schema.input("MovieDeleteInput").is_some());
    assert!(schema.input("MovieRelationInput").is_some());
    // Actor has no relationships, so no connect-family inputs exist for it.
    assert!(schema.input("ActorConnectInput").is_none());
}

#[test]
fn test_root_operations() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);

    assert!(schema.query_field("movies").is_some());
    assert!(schema.query_field("moviesAggregate").is_some());
    assert!(schema.query_field("moviesConnection").is_some());
    assert!(schema.mutation_field("createMovies").is_some());
    assert!(schema.mutation_field("updateMovies").is_some());
    assert!(schema.mutation_field("deleteMovies").is_some());

    let update = schema.mutation_field("updateMovies").unwrap();
    let argument_names: Vec<&str> =
        update.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        argument_names,
        vec!["where", "update", "connect", "disconnect", "create", "delete"]
    );

    let read = schema.query_field("movies").unwrap();
    let argument_names: Vec<&str> = read.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(argument_names, vec!["where", "options", "fulltext"]);
}

#[test]
fn test_mutation_responses_and_infos() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    for name in [
        "CreateInfo",
        "UpdateInfo",
        "DeleteInfo",
        "PageInfo",
        "CreateMoviesMutationResponse",
        "UpdateMoviesMutationResponse",
    ] {
        assert!(schema.get(name).is_some(), "missing {}", name);
    }
    let Some(SchemaType::Object(response)) = schema.get("CreateMoviesMutationResponse") else {
        panic!("mutation response is an object type");
    };
    let field_names: Vec<&str> = response.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["info", "movies"]);
}

#[test]
fn test_connection_types() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    let Some(SchemaType::Object(connection)) = schema.get("MovieActorsConnection") else {
        panic!("relationship connection type exists");
    };
    let field_names: Vec<&str> = connection.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["edges", "totalCount", "pageInfo"]);

    let Some(SchemaType::Object(edge)) = schema.get("MovieActorsRelationship") else {
        panic!("relationship edge type exists");
    };
    let field_names: Vec<&str> = edge.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["cursor", "node"]);

    // Root-level relay connection.
    assert!(schema.get("MoviesConnection").is_some());
    assert!(schema.get("MovieEdge").is_some());
}

#[test]
fn test_fulltext_inputs() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    assert_eq!(
        input_field_names(&schema, "MovieFulltext"),
        vec!["MovieTitle", "MovieDescription"]
    );
    assert_eq!(
        input_field_names(&schema, "MovieMovieTitleFulltext"),
        vec!["phrase"]
    );
}

#[test]
fn test_aggregate_selection_types() {
    let model = fixtures::movie_model();
    let schema = ApiSchema::generate(&model);
    let Some(SchemaType::Object(selection)) = schema.get("MovieAggregateSelection") else {
        panic!("aggregate selection exists");
    };
    let field_names: Vec<&str> = selection.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["count", "title", "description", "runtime"]);
    assert!(schema.get("StringAggregateSelection").is_some());
    assert!(schema.get("IntAggregateSelection").is_some());
}

#[test]
fn test_interface_inputs_carry_on_overrides() {
    let model = fixtures::production_model();
    let schema = ApiSchema::generate(&model);

    let where_names = input_field_names(&schema, "ProductionWhere");
    assert!(where_names.contains(&"_on".to_string()));
    assert_eq!(
        input_field_names(&schema, "ProductionImplementationsWhere"),
        vec!["Movie", "Series"]
    );
    let update_names = input_field_names(&schema, "ProductionUpdateInput");
    assert!(update_names.contains(&"_on".to_string()));
    assert_eq!(
        input_field_names(&schema, "ProductionImplementationsUpdateInput"),
        vec!["Movie", "Series"]
    );
    // Interface create inputs are keyed per implementing type.
    assert_eq!(
        input_field_names(&schema, "ProductionCreateInput"),
        vec!["Movie", "Series"]
    );
}

#[test]
fn test_union_write_inputs_keyed_per_member() {
    let model = fixtures::publication_model();
    let schema = ApiSchema::generate(&model);
    assert_eq!(
        input_field_names(&schema, "AuthorPublicationsCreateInput"),
        vec!["Book", "Journal"]
    );
    assert_eq!(
        input_field_names(&schema, "AuthorPublicationsBookFieldInput"),
        vec!["create", "connect"]
    );
    assert_eq!(
        input_field_names(&schema, "AuthorPublicationsUpdateInput"),
        vec!["Book", "Journal"]
    );
    assert_eq!(
        input_field_names(&schema, "AuthorPublicationsConnectionWhere"),
        vec!["Book", "Journal"]
    );
}

#[test]
fn test_cyclic_relationships_terminate_by_reuse() {
    let model = TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Movie",
                "fields": [
                    { "name": "title", "type": { "name": "String", "required": true } },
                    {
                        "name": "actors",
                        "type": { "name": "Actor", "list": true, "required": true, "element_required": true },
                        "directives": [
                            { "name": "relationship", "arguments": { "type": "ACTED_IN", "direction": "IN" } }
                        ]
                    }
                ]
            },
            {
                "kind": "object",
                "name": "Actor",
                "fields": [
                    { "name": "name", "type": { "name": "String", "required": true } },
                    {
                        "name": "movies",
                        "type": { "name": "Movie", "list": true, "required": true, "element_required": true },
                        "directives": [
                            { "name": "relationship", "arguments": { "type": "ACTED_IN", "direction": "OUT" } }
                        ]
                    }
                ]
            }
        ]
    })))
    .expect("cyclic model builds");

    let schema = ApiSchema::generate(&model);
    // Each side of the cycle generates its inputs exactly once and the
    // second generation run reproduces the artifact.
    assert!(schema.input("MovieCreateInput").is_some());
    assert!(schema.input("ActorCreateInput").is_some());
    assert!(schema.input("MovieActorsCreateFieldInput").is_some());
    assert!(schema.input("ActorMoviesCreateFieldInput").is_some());
    assert_eq!(ApiSchema::generate(&model), schema);
}

#[test]
fn test_computed_fields_are_read_only() {
    let model = TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "User",
                "fields": [
                    { "name": "id", "type": { "name": "ID", "required": true } },
                    {
                        "name": "nickname",
                        "type": { "name": "String", "required": true },
                        "directives": [{ "name": "computed", "arguments": {} }]
                    }
                ]
            }
        ]
    })))
    .expect("computed model builds");
    let schema = ApiSchema::generate(&model);

    let Some(SchemaType::Object(user)) = schema.get("User") else {
        panic!("object type exists");
    };
    assert!(user.fields.iter().any(|f| f.name == "nickname"));
    assert!(!input_field_names(&schema, "UserCreateInput").contains(&"nickname".to_string()));
    assert!(!input_field_names(&schema, "UserUpdateInput").contains(&"nickname".to_string()));
    assert!(!input_field_names(&schema, "UserWhere").contains(&"nickname".to_string()));
}

#[test]
fn test_sdl_rendering() {
    let model = fixtures::publication_model();
    let schema = ApiSchema::generate(&model);
    let sdl = schema.to_sdl();
    assert!(sdl.starts_with("schema {\n  query: Query\n  mutation: Mutation\n}\n"));
    assert!(sdl.contains("union Publication = Book | Journal"));
    assert!(sdl.contains("type Query {"));
    assert!(sdl.contains("type Mutation {"));
    assert!(sdl.contains("enum SortDirection {"));
    // Rendering is deterministic.
    assert_eq!(sdl, schema.to_sdl());
}
