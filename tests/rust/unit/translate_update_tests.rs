//! Update and delete translation: fixed nested-write ordering,
//! pre-branched conditional updates, `_on` overrides, and write-time auth.

use graphbolt::auth::AuthContext;
use graphbolt::translate::{self, Operation, TranslationError};
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
fn test_scalar_update() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Movie",
            "where": { "title": "Old" },
            "update": { "title": "New" },
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WHERE this.title = $this_title\n\
         SET this.title = $this_update_title\n\
         WITH this\n\
         RETURN this { .title } AS this"
    );
    assert_eq!(
        statement.params,
        params(json!({ "this_title": "Old", "this_update_title": "New" }))
    );
}

#[test]
fn test_nested_update_is_pre_branched() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Movie",
            "update": {
                "actors": [{
                    "where": { "node": { "name": "Old Name" } },
                    "update": { "node": { "name": "New Name" } }
                }]
            },
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WITH this\n\
         CALL {\n\
         WITH this\n\
         OPTIONAL MATCH (this)<-[this_actors0_relationship:ACTED_IN]-(this_actors0:Actor)\n\
         WHERE this_actors0.name = $this_actors0_node_name\n\
         WITH this, this_actors0, this_actors0_relationship WHERE this_actors0 IS NOT NULL\n\
         SET this_actors0.name = $this_actors0_update_name\n\
         RETURN count(*) AS update_this_actors0\n\
         }\n\
         WITH this\n\
         RETURN this { .title } AS this"
    );
    assert_eq!(
        statement.params,
        params(json!({
            "this_actors0_node_name": "Old Name",
            "this_actors0_update_name": "New Name"
        }))
    );
}

#[test]
fn test_interface_update_branches_per_implementation() {
    let model = fixtures::production_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Actor",
            "update": {
                "actedIn": [{
                    "where": { "node": { "title": "Old Title" } },
                    "update": { "node": { "title": "New Title" } }
                }]
            },
            "selection": [{ "name": "actors", "selection": [{ "name": "name" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Actor)\n\
         WITH this\n\
         CALL {\n\
         WITH this\n\
         OPTIONAL MATCH (this)-[this_actedIn0_relationship:ACTED_IN]->(this_actedIn0:Movie)\n\
         WHERE this_actedIn0.title = $this_actedIn0_node_title\n\
         WITH this, this_actedIn0, this_actedIn0_relationship WHERE this_actedIn0 IS NOT NULL\n\
         SET this_actedIn0.title = $this_actedIn0_update_title\n\
         RETURN count(*) AS update_this_actedIn0\n\
         UNION\n\
         WITH this\n\
         OPTIONAL MATCH (this)-[this_actedIn0_relationship:ACTED_IN]->(this_actedIn0:Series)\n\
         WHERE this_actedIn0.title = $this_actedIn0_node_title\n\
         WITH this, this_actedIn0, this_actedIn0_relationship WHERE this_actedIn0 IS NOT NULL\n\
         SET this_actedIn0.title = $this_actedIn0_update_title\n\
         RETURN count(*) AS update_this_actedIn0\n\
         }\n\
         WITH this\n\
         RETURN this { .name } AS this"
    );
    // The generic instruction binds one shared parameter across branches.
    assert_eq!(
        statement.params,
        params(json!({
            "this_actedIn0_node_title": "Old Title",
            "this_actedIn0_update_title": "New Title"
        }))
    );
}

#[test]
fn test_on_override_replaces_generic_instruction_for_named_type() {
    let model = fixtures::production_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Actor",
            "update": {
                "actedIn": [{
                    "where": { "node": { "title": "Old Title" } },
                    "update": { "node": {
                        "title": "New Title",
                        "_on": { "Movie": { "title": "Movie Title" } }
                    } }
                }]
            },
            "selection": [{ "name": "actors", "selection": [{ "name": "name" }] }]
        }),
    );
    // Movie receives only the override value; Series keeps the generic one.
    assert!(statement.cypher.contains(
        "OPTIONAL MATCH (this)-[this_actedIn0_relationship:ACTED_IN]->(this_actedIn0:Movie)\n\
         WHERE this_actedIn0.title = $this_actedIn0_node_title\n\
         WITH this, this_actedIn0, this_actedIn0_relationship WHERE this_actedIn0 IS NOT NULL\n\
         SET this_actedIn0.title = $this_actedIn0_update_on_Movie_title"
    ));
    assert!(statement.cypher.contains(
        "OPTIONAL MATCH (this)-[this_actedIn0_relationship:ACTED_IN]->(this_actedIn0:Series)\n\
         WHERE this_actedIn0.title = $this_actedIn0_node_title\n\
         WITH this, this_actedIn0, this_actedIn0_relationship WHERE this_actedIn0 IS NOT NULL\n\
         SET this_actedIn0.title = $this_actedIn0_update_title"
    ));
    assert_eq!(statement.params["this_actedIn0_update_on_Movie_title"], json!("Movie Title"));
    assert_eq!(statement.params["this_actedIn0_update_title"], json!("New Title"));
}

#[test]
fn test_update_with_top_level_connect() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Movie",
            "where": { "title": "The Matrix" },
            "connect": { "actors": [{ "where": { "node": { "name": "Keanu" } } }] },
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert!(statement.cypher.contains("OPTIONAL MATCH (this_actors_connect0_node:Actor)"));
    assert!(statement.cypher.contains(
        "FOREACH(_ IN CASE WHEN this_actors_connect0_node IS NULL THEN [] ELSE [1] END |\n\
         MERGE (this)<-[:ACTED_IN]-(this_actors_connect0_node)"
    ));
}

#[test]
fn test_update_with_disconnect() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Movie",
            "where": { "title": "The Matrix" },
            "disconnect": { "actors": [{ "where": { "node": { "name": "Keanu" } } }] },
            "selection": [{ "name": "movies", "selection": [{ "name": "title" }] }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WHERE this.title = $this_title\n\
         WITH this\n\
         CALL {\n\
         WITH this\n\
         OPTIONAL MATCH (this)<-[this_actors_disconnect0_rel:ACTED_IN]-(this_actors_disconnect0:Actor)\n\
         WHERE this_actors_disconnect0.name = $this_actors_disconnect0_node_name\n\
         FOREACH(_ IN CASE WHEN this_actors_disconnect0 IS NULL THEN [] ELSE [1] END |\n\
         DELETE this_actors_disconnect0_rel\n\
         )\n\
         RETURN count(*)\n\
         }\n\
         WITH this\n\
         RETURN this { .title } AS this"
    );
}

#[test]
fn test_nested_writes_apply_in_fixed_order() {
    // Whatever the input key order, creation precedes connect, connect
    // precedes disconnect, disconnect precedes property updates, and
    // deletes come last.
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "update",
            "node": "Movie",
            "delete": { "actors": [{ "where": { "node": { "name": "D" } } }] },
            "update": { "title": "New" },
            "disconnect": { "actors": [{ "where": { "node": { "name": "C" } } }] },
            "connect": { "actors": [{ "where": { "node": { "name": "B" } } }] },
            "create": { "actors": [{ "node": { "name": "A" } }] },
            "selection": []
        }),
    );
    let create_pos = statement.cypher.find("CREATE (this_actors0_node:Actor)").unwrap();
    let connect_pos = statement.cypher.find("_connect0_node:Actor)").unwrap();
    let disconnect_pos = statement.cypher.find("_disconnect0:Actor)").unwrap();
    let set_pos = statement.cypher.find("SET this.title").unwrap();
    let delete_pos = statement.cypher.find("DETACH DELETE x").unwrap();
    assert!(create_pos < connect_pos);
    assert!(connect_pos < disconnect_pos);
    assert!(disconnect_pos < set_pos);
    assert!(set_pos < delete_pos);
}

#[test]
fn test_delete_with_nested_delete() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "delete",
            "node": "Movie",
            "where": { "title": "The Matrix" },
            "delete": { "actors": [{ "where": { "node": { "name": "Keanu" } } }] }
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WHERE this.title = $this_title\n\
         WITH this\n\
         OPTIONAL MATCH (this)<-[this_actors0_relationship:ACTED_IN]-(this_actors0:Actor)\n\
         WHERE this_actors0.name = $this_actors0_node_name\n\
         WITH this, collect(DISTINCT this_actors0) AS this_actors0_to_delete\n\
         FOREACH(x IN this_actors0_to_delete | DETACH DELETE x)\n\
         DETACH DELETE this"
    );
}

fn bound_model() -> TypeModel {
    TypeModel::from_document(&fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "User",
                "directives": [
                    {
                        "name": "auth",
                        "arguments": {
                            "rules": [
                                { "operations": ["UPDATE"], "bind": { "id": "$jwt.sub" } }
                            ]
                        }
                    }
                ],
                "fields": [
                    { "name": "id", "type": { "name": "ID", "required": true } },
                    { "name": "name", "type": { "name": "String", "required": true } }
                ]
            }
        ]
    })))
    .expect("bound model builds")
}

#[test]
fn test_bind_rule_emits_validation_after_writes() {
    let model = bound_model();
    let mut claims = Map::new();
    claims.insert("sub".into(), json!("user-1"));
    let operation: Operation = serde_json::from_value(json!({
        "operation": "update",
        "node": "User",
        "update": { "name": "New" },
        "selection": []
    }))
    .unwrap();
    let statement = translate::translate(
        &model,
        &operation,
        AuthContext::authenticated(vec![], claims),
    )
    .unwrap();
    assert!(statement.cypher.contains(
        "SET this.name = $this_update_name\n\
         WITH this\n\
         CALL apoc.util.validate(NOT ((this.id IS NOT NULL AND this.id = $auth.jwt.sub)), \"Forbidden\", [0])"
    ));
    assert!(statement.params.contains_key("auth"));
}

#[test]
fn test_bind_rule_missing_claim_aborts_translation() {
    let model = bound_model();
    let operation: Operation = serde_json::from_value(json!({
        "operation": "update",
        "node": "User",
        "update": { "name": "New" },
        "selection": []
    }))
    .unwrap();
    let err = translate::translate(&model, &operation, AuthContext::unauthenticated()).unwrap_err();
    assert!(matches!(err, TranslationError::Authorization(_)));
}
