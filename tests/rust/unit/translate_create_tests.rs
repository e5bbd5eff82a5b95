//! Create translation: nested creates, connects, edge properties, and
//! cardinality validation.

use graphbolt::auth::AuthContext;
use graphbolt::translate::{self, Operation};
use graphbolt::type_model::TypeModel;
use serde_json::{json, Map, Value};

use crate::fixtures;

fn translate(model: &TypeModel, op: Value) -> graphbolt::Statement {
    let operation: Operation = serde_json::from_value(op).expect("operation deserializes");
    translate::translate(model, &operation, AuthContext::unauthenticated()).expect("translates")
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().expect("params object").clone()
}

#[test]
fn test_create_with_nested_creates() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Movie",
            "input": [
                {
                    "title": "The Matrix",
                    "actors": { "create": [
                        { "node": { "name": "Keanu Reeves" } },
                        { "node": { "name": "Carrie-Anne Moss" } }
                    ] }
                }
            ],
            "selection": [
                { "name": "movies", "selection": [{ "name": "title" }] }
            ]
        }),
    );
    assert_eq!(
        statement.cypher,
        "CALL {\n\
         CREATE (this0:Movie)\n\
         SET this0.title = $this0_title\n\
         WITH this0\n\
         CREATE (this0_actors0_node:Actor)\n\
         SET this0_actors0_node.name = $this0_actors0_node_name\n\
         MERGE (this0)<-[:ACTED_IN]-(this0_actors0_node)\n\
         WITH this0\n\
         CREATE (this0_actors1_node:Actor)\n\
         SET this0_actors1_node.name = $this0_actors1_node_name\n\
         MERGE (this0)<-[:ACTED_IN]-(this0_actors1_node)\n\
         RETURN this0\n\
         }\n\
         RETURN this0 { .title } AS this0"
    );
    assert_eq!(
        statement.params,
        params(json!({
            "this0_title": "The Matrix",
            "this0_actors0_node_name": "Keanu Reeves",
            "this0_actors1_node_name": "Carrie-Anne Moss"
        }))
    );
}

#[test]
fn test_create_clause_counts_and_param_uniqueness() {
    // N nested creations: exactly N+1 node creations, N relationship
    // merges, and globally unique parameter keys.
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Movie",
            "input": [
                {
                    "title": "Speed",
                    "actors": { "create": [
                        { "node": { "name": "A" } },
                        { "node": { "name": "B" } },
                        { "node": { "name": "C" } }
                    ] }
                }
            ],
            "selection": []
        }),
    );
    assert_eq!(statement.cypher.matches("CREATE (").count(), 4);
    assert_eq!(statement.cypher.matches("MERGE (").count(), 3);
    assert_eq!(statement.params.len(), 4);
}

#[test]
fn test_create_multiple_inputs() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Movie",
            "input": [{ "title": "A" }, { "title": "B" }],
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert!(statement.cypher.contains("CREATE (this0:Movie)"));
    assert!(statement.cypher.contains("CREATE (this1:Movie)"));
    assert!(statement
        .cypher
        .ends_with("RETURN this0 { .title } AS this0, this1 { .title } AS this1"));
    assert_eq!(
        statement.params,
        params(json!({ "this0_title": "A", "this1_title": "B" }))
    );
}

#[test]
fn test_create_with_connect() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Movie",
            "input": [
                {
                    "title": "The Matrix",
                    "actors": { "connect": [
                        { "where": { "node": { "name": "Keanu Reeves" } } }
                    ] }
                }
            ],
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "CALL {\n\
         CREATE (this0:Movie)\n\
         SET this0.title = $this0_title\n\
         WITH this0\n\
         CALL {\n\
         WITH this0\n\
         OPTIONAL MATCH (this0_actors_connect0_node:Actor)\n\
         WHERE this0_actors_connect0_node.name = $this0_actors_connect0_node_name\n\
         FOREACH(_ IN CASE WHEN this0 IS NULL THEN [] ELSE [1] END |\n\
         FOREACH(_ IN CASE WHEN this0_actors_connect0_node IS NULL THEN [] ELSE [1] END |\n\
         MERGE (this0)<-[:ACTED_IN]-(this0_actors_connect0_node)\n\
         )\n\
         )\n\
         RETURN count(*)\n\
         }\n\
         RETURN this0\n\
         }\n\
         RETURN this0 { .title } AS this0"
    );
}

#[test]
fn test_union_create_keyed_per_member() {
    let model = fixtures::publication_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Author",
            "input": [
                {
                    "name": "Asimov",
                    "publications": {
                        "Book": { "create": [{ "node": { "title": "Foundation" } }] }
                    }
                }
            ],
            "selection": [{ "name": "authors", "selection": [{ "name": "name" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "CALL {\n\
         CREATE (this0:Author)\n\
         SET this0.name = $this0_name\n\
         WITH this0\n\
         CREATE (this0_publications_Book0_node:Book)\n\
         SET this0_publications_Book0_node.title = $this0_publications_Book0_node_title\n\
         MERGE (this0)-[:WROTE]->(this0_publications_Book0_node)\n\
         RETURN this0\n\
         }\n\
         RETURN this0 { .name } AS this0"
    );
}

fn acted_in_model() -> TypeModel {
    TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "interface",
                "name": "ActedIn",
                "directives": [{ "name": "relationshipProperties", "arguments": {} }],
                "fields": [
                    { "name": "screenTime", "type": { "name": "Int", "required": true } }
                ]
            },
            {
                "kind": "object",
                "name": "Movie",
                "fields": [
                    { "name": "title", "type": { "name": "String", "required": true } },
                    {
                        "name": "actors",
                        "type": { "name": "Actor", "list": true, "required": true, "element_required": true },
                        "directives": [
                            { "name": "relationship", "arguments": { "type": "ACTED_IN", "direction": "IN", "properties": "ActedIn" } }
                        ]
                    }
                ]
            },
            {
                "kind": "object",
                "name": "Actor",
                "fields": [
                    { "name": "name", "type": { "name": "String", "required": true } }
                ]
            }
        ]
    })))
    .expect("acted-in model builds")
}

#[test]
fn test_create_sets_edge_properties() {
    let model = acted_in_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Movie",
            "input": [
                {
                    "title": "The Matrix",
                    "actors": { "create": [
                        { "node": { "name": "Keanu" }, "edge": { "screenTime": 90 } }
                    ] }
                }
            ],
            "selection": []
        }),
    );
    assert!(statement.cypher.contains(
        "MERGE (this0)<-[this0_actors0_relationship:ACTED_IN]-(this0_actors0_node)\n\
         SET this0_actors0_relationship.screenTime = $this0_actors0_relationship_screenTime"
    ));
    assert_eq!(
        statement.params["this0_actors0_relationship_screenTime"],
        json!({ "low": 90, "high": 0 })
    );
}

fn photo_model() -> TypeModel {
    TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Photo",
                "fields": [
                    { "name": "url", "type": { "name": "String", "required": true } },
                    {
                        "name": "color",
                        "type": { "name": "Color", "required": true },
                        "directives": [
                            { "name": "relationship", "arguments": { "type": "OF_COLOR", "direction": "OUT" } }
                        ]
                    }
                ]
            },
            {
                "kind": "object",
                "name": "Color",
                "fields": [
                    { "name": "name", "type": { "name": "String", "required": true } }
                ]
            }
        ]
    })))
    .expect("photo model builds")
}

#[test]
fn test_required_relationship_gets_cardinality_check() {
    let model = photo_model();
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Photo",
            "input": [
                {
                    "url": "photo.png",
                    "color": { "connect": { "where": { "node": { "name": "Red" } } } }
                }
            ],
            "selection": []
        }),
    );
    assert!(statement.cypher.contains(
        "MATCH (this0)-[this0_color_Color_unique:OF_COLOR]->(:Color)\n\
         WITH count(this0_color_Color_unique) AS c\n\
         CALL apoc.util.validate(NOT (c = 1), 'Photo.color required', [0])\n\
         RETURN c AS this0_color_Color_unique_ignored"
    ));
}

#[test]
fn test_create_applies_declared_defaults() {
    let model = TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Article",
                "fields": [
                    { "name": "title", "type": { "name": "String", "required": true } },
                    {
                        "name": "status",
                        "type": { "name": "String", "required": true },
                        "directives": [{ "name": "default", "arguments": { "value": "draft" } }]
                    }
                ]
            }
        ]
    })))
    .expect("article model builds");
    let statement = translate(
        &model,
        json!({
            "operation": "create",
            "node": "Article",
            "input": [{ "title": "Hello" }],
            "selection": []
        }),
    );
    assert!(statement.cypher.contains("SET this0.status = $this0_status"));
    assert_eq!(statement.params["this0_status"], json!("draft"));
}
