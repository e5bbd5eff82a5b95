//! End-to-end definition validation through the engine entry point.

use graphbolt::{DefinitionError, GraphBolt};
use serde_json::json;

use crate::fixtures;

#[test]
fn test_reserved_name_fails_before_any_schema_exists() {
    let document = fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "PageInfo",
                "fields": [{ "name": "count", "type": { "name": "Int" } }]
            }
        ]
    }));
    let err = GraphBolt::new(&document).unwrap_err();
    let DefinitionError::ReservedTypeName { type_name, message } = err else {
        panic!("expected a reserved-name error");
    };
    assert_eq!(type_name, "PageInfo");
    assert!(message.contains("PageInfo"));
}

#[test]
fn test_generated_suffix_collision_is_fatal() {
    let document = fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "MovieConnection",
                "fields": [{ "name": "x", "type": { "name": "Int" } }]
            }
        ]
    }));
    assert!(matches!(
        GraphBolt::new(&document),
        Err(DefinitionError::ReservedTypeName { .. })
    ));
}

#[test]
fn test_diagnostics_are_concatenated() {
    let document = fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Movie",
                "fields": [
                    { "name": "director", "type": { "name": "Person" } },
                    { "name": "studio", "type": { "name": "Studio" } }
                ]
            }
        ]
    }));
    let err = GraphBolt::new(&document).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Unknown type \"Person\""));
    assert!(message.contains("Unknown type \"Studio\""));
}

#[test]
fn test_fields_colliding_with_generated_names_are_filtered() {
    // A field typed with a name the generator will produce is stripped
    // before validation rather than reported as unknown.
    let document = fixtures::document(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Movie",
                "fields": [{ "name": "title", "type": { "name": "String", "required": true } }]
            },
            {
                "kind": "object",
                "name": "Lookup",
                "fields": [
                    { "name": "filter", "type": { "name": "MovieWhere" } },
                    { "name": "label", "type": { "name": "String" } }
                ]
            }
        ]
    }));
    let engine = GraphBolt::new(&document).expect("collisions are filtered, not fatal");
    assert!(engine.model().node("Movie").is_some());
}

#[test]
fn test_empty_document_is_valid() {
    let document = fixtures::document(json!({ "definitions": [] }));
    let engine = GraphBolt::new(&document).expect("benign empty-document diagnostic suppressed");
    assert!(engine.model().nodes().is_empty());
}

#[test]
fn test_relationship_properties_must_not_declare_relationships() {
    let document = fixtures::document(json!({
        "definitions": [
            {
                "kind": "interface",
                "name": "ActedIn",
                "directives": [{ "name": "relationshipProperties", "arguments": {} }],
                "fields": [
                    {
                        "name": "movie",
                        "type": { "name": "Movie" },
                        "directives": [
                            { "name": "relationship", "arguments": { "type": "IN_MOVIE", "direction": "OUT" } }
                        ]
                    }
                ]
            },
            {
                "kind": "object",
                "name": "Movie",
                "fields": [{ "name": "title", "type": { "name": "String", "required": true } }]
            }
        ]
    }));
    let err = GraphBolt::new(&document).unwrap_err();
    assert!(err.to_string().contains("cannot declare relationship field"));
}
