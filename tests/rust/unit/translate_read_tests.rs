//! Read, aggregate and connection translation.
//!
//! These assert exact (cypher, params) pairs, mirroring how the generated
//! statements are consumed downstream.

use graphbolt::auth::AuthContext;
use graphbolt::translate::{self, Operation, TranslationError};
use graphbolt::type_model::TypeModel;
use graphbolt::utils::paging;
use serde_json::{json, Map, Value};
use test_case::test_case;

use crate::fixtures;

fn translate(model: &TypeModel, op: Value) -> graphbolt::Statement {
    let operation: Operation = serde_json::from_value(op).expect("operation deserializes");
    translate::translate(model, &operation, AuthContext::unauthenticated()).expect("translates")
}

fn translate_err(model: &TypeModel, op: Value) -> TranslationError {
    let operation: Operation = serde_json::from_value(op).expect("operation deserializes");
    translate::translate(model, &operation, AuthContext::unauthenticated()).unwrap_err()
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().expect("params object").clone()
}

#[test]
fn test_simple_read() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "title": "The Matrix" },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WHERE this.title = $this_title\n\
         RETURN this { .title } AS this"
    );
    assert_eq!(statement.params, params(json!({ "this_title": "The Matrix" })));
}

#[test_case("title_NOT", json!("x"), "(NOT this.title = $this_title_NOT)" ; "not")]
#[test_case("title_CONTAINS", json!("x"), "this.title CONTAINS $this_title_CONTAINS" ; "contains")]
#[test_case("title_NOT_CONTAINS", json!("x"), "(NOT this.title CONTAINS $this_title_NOT_CONTAINS)" ; "not contains")]
#[test_case("title_STARTS_WITH", json!("x"), "this.title STARTS WITH $this_title_STARTS_WITH" ; "starts with")]
#[test_case("title_ENDS_WITH", json!("x"), "this.title ENDS WITH $this_title_ENDS_WITH" ; "ends with")]
#[test_case("title_IN", json!(["a", "b"]), "this.title IN $this_title_IN" ; "membership")]
#[test_case("title_NOT_IN", json!(["a"]), "(NOT this.title IN $this_title_NOT_IN)" ; "negated membership")]
#[test_case("runtime_LT", json!(90), "this.runtime < $this_runtime_LT" ; "less than")]
#[test_case("runtime_LTE", json!(90), "this.runtime <= $this_runtime_LTE" ; "less than or equal")]
#[test_case("runtime_GT", json!(90), "this.runtime > $this_runtime_GT" ; "greater than")]
#[test_case("runtime_GTE", json!(90), "this.runtime >= $this_runtime_GTE" ; "greater than or equal")]
fn test_scalar_operator(key: &str, value: Value, expected: &str) {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { key: value },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(statement.cypher.lines().nth(1).unwrap(), format!("WHERE {}", expected));
}

#[test]
fn test_null_comparisons() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "description": null },
            "selection": [{ "name": "title" }]
        }),
    );
    assert!(statement.cypher.contains("WHERE this.description IS NULL"));
    assert!(statement.params.is_empty());

    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "description_NOT": null },
            "selection": [{ "name": "title" }]
        }),
    );
    assert!(statement.cypher.contains("WHERE this.description IS NOT NULL"));
}

#[test]
fn test_boolean_composition() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "OR": [{ "title": "A" }, { "title": "B" }] },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher.lines().nth(1).unwrap(),
        "WHERE ((this.title = $this_title) OR (this.title = $this_title2))"
    );
    assert_eq!(
        statement.params,
        params(json!({ "this_title": "A", "this_title2": "B" }))
    );
}

#[test]
fn test_int_params_use_low_high_split() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "runtime": 8589934597i64 },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.params,
        params(json!({ "this_runtime": { "low": 5, "high": 2 } }))
    );
}

#[test_case("actors_SOME", "> 0" ; "some")]
#[test_case("actors_NONE", "= 0" ; "none")]
#[test_case("actors_SINGLE", "= 1" ; "single")]
fn test_relationship_quantifier(key: &str, comparison: &str) {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { key: { "name": "Keanu" } },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher.lines().nth(1).unwrap(),
        format!(
            "WHERE size([(this)<-[:ACTED_IN]-(this_actors:Actor) WHERE this_actors.name = $this_actors_name | 1]) {}",
            comparison
        )
    );
}

#[test]
fn test_relationship_all_counts_counterexamples() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "actors_ALL": { "name": "Keanu" } },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher.lines().nth(1).unwrap(),
        "WHERE size([(this)<-[:ACTED_IN]-(this_actors:Actor) WHERE NOT (this_actors.name = $this_actors_name) | 1]) = 0"
    );
}

#[test]
fn test_aggregate_count_filter() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "actorsAggregate": { "count_GT": 2 } },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher.lines().nth(1).unwrap(),
        "WHERE size([(this)<-[:ACTED_IN]-(this_actors:Actor) | 1]) > $this_actorsAggregate_count_GT"
    );
    assert_eq!(
        statement.params,
        params(json!({ "this_actorsAggregate_count_GT": { "low": 2, "high": 0 } }))
    );
}

#[test]
fn test_traversal_projection() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "selection": [
                { "name": "title" },
                { "name": "actors", "selection": [{ "name": "name" }] }
            ]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         RETURN this { .title, actors: [(this)<-[:ACTED_IN]-(this_actors:Actor) | this_actors { .name }] } AS this"
    );
}

#[test]
fn test_read_options() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "options": { "sort": [{ "title": "ASC" }], "limit": 10, "offset": 5 },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         RETURN this { .title } AS this\n\
         ORDER BY this.title ASC\n\
         SKIP $this_offset\n\
         LIMIT $this_limit"
    );
    assert_eq!(
        statement.params,
        params(json!({
            "this_offset": { "low": 5, "high": 0 },
            "this_limit": { "low": 10, "high": 0 }
        }))
    );
}

#[test]
fn test_fulltext_read() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "fulltext": { "MovieTitle": { "phrase": "The Matrix" } },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(
        statement.cypher,
        "CALL db.index.fulltext.queryNodes(\"MovieTitle\", $this_fulltext_MovieTitle_phrase) YIELD node AS this\n\
         WHERE \"Movie\" IN labels(this)\n\
         RETURN this { .title } AS this"
    );
    assert_eq!(
        statement.params,
        params(json!({ "this_fulltext_MovieTitle_phrase": "The Matrix" }))
    );
}

#[test]
fn test_two_fulltext_arguments_fail() {
    let model = fixtures::movie_model();
    let err = translate_err(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "fulltext": {
                "MovieTitle": { "phrase": "x" },
                "MovieDescription": { "phrase": "x" }
            },
            "selection": [{ "name": "title" }]
        }),
    );
    assert_eq!(err, TranslationError::MultipleFulltext);
    assert_eq!(err.to_string(), "Can only call one search at any given time");
}

#[test]
fn test_unknown_fulltext_index() {
    let model = fixtures::movie_model();
    let err = translate_err(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "fulltext": { "Nope": { "phrase": "x" } },
            "selection": [{ "name": "title" }]
        }),
    );
    assert!(matches!(err, TranslationError::UnknownFulltextIndex { .. }));
}

#[test]
fn test_union_read_emits_one_branch_per_member() {
    let model = fixtures::publication_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Author",
            "selection": [
                { "name": "name" },
                {
                    "name": "publications",
                    "on": [
                        { "type": "Book", "selection": [{ "name": "title" }] },
                        { "type": "Journal", "selection": [{ "name": "subject" }] }
                    ]
                }
            ]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Author)\n\
         WITH this\n\
         CALL {\n\
         WITH this\n\
         MATCH (this)-[:WROTE]->(this_Book:Book)\n\
         RETURN { __resolveType: \"Book\", title: this_Book.title } AS this_publications\n\
         UNION\n\
         WITH this\n\
         MATCH (this)-[:WROTE]->(this_Journal:Journal)\n\
         RETURN { __resolveType: \"Journal\", subject: this_Journal.subject } AS this_publications\n\
         }\n\
         RETURN this { .name, publications: collect(this_publications) } AS this"
    );
}

#[test]
fn test_interface_read_merges_shared_and_typed_selections() {
    let model = fixtures::production_model();
    let statement = translate(
        &model,
        json!({
            "operation": "read",
            "node": "Actor",
            "selection": [
                { "name": "name" },
                {
                    "name": "actedIn",
                    "selection": [{ "name": "title" }],
                    "on": [
                        { "type": "Movie", "selection": [{ "name": "runtime" }] }
                    ]
                }
            ]
        }),
    );
    assert!(statement.cypher.contains(
        "RETURN { __resolveType: \"Movie\", title: this_Movie.title, runtime: this_Movie.runtime } AS this_actedIn"
    ));
    assert!(statement
        .cypher
        .contains("RETURN { __resolveType: \"Series\", title: this_Series.title } AS this_actedIn"));
}

#[test]
fn test_aggregate_root() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "aggregate",
            "node": "Movie",
            "selection": [
                { "name": "count" },
                { "name": "runtime", "selection": [{ "name": "min" }, { "name": "max" }] }
            ]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         RETURN { count: count(this), runtime: { min: min(this.runtime), max: max(this.runtime) } }"
    );
}

#[test]
fn test_connection_root() {
    let model = fixtures::movie_model();
    let statement = translate(
        &model,
        json!({
            "operation": "connection",
            "node": "Movie",
            "sort": [{ "title": "ASC" }],
            "first": 2,
            "selection": [
                { "name": "edges", "selection": [
                    { "name": "node", "selection": [{ "name": "title" }] }
                ] },
                { "name": "totalCount" }
            ]
        }),
    );
    assert_eq!(
        statement.cypher,
        "MATCH (this:Movie)\n\
         WITH collect(this) AS edges\n\
         WITH edges, size(edges) AS totalCount\n\
         UNWIND edges AS this\n\
         WITH this, totalCount\n\
         ORDER BY this.title ASC\n\
         LIMIT $this_first\n\
         RETURN { edges: collect({ node: this { .title } }), totalCount: totalCount } AS this"
    );
}

#[test]
fn test_connection_after_cursor_becomes_skip() {
    let model = fixtures::movie_model();
    let cursor = paging::offset_to_cursor(4);
    let statement = translate(
        &model,
        json!({
            "operation": "connection",
            "node": "Movie",
            "after": cursor,
            "selection": [{ "name": "totalCount" }]
        }),
    );
    assert!(statement.cypher.contains("SKIP $this_after_offset"));
    assert_eq!(
        statement.params["this_after_offset"],
        json!({ "low": 5, "high": 0 })
    );
}

#[test]
fn test_connection_rejects_malformed_cursor() {
    let model = fixtures::movie_model();
    let err = translate_err(
        &model,
        json!({
            "operation": "connection",
            "node": "Movie",
            "after": "garbage",
            "selection": [{ "name": "totalCount" }]
        }),
    );
    assert!(matches!(err, TranslationError::InvalidCursor(_)));
}

#[test]
fn test_unknown_field_in_where() {
    let model = fixtures::movie_model();
    let err = translate_err(
        &model,
        json!({
            "operation": "read",
            "node": "Movie",
            "where": { "studio": "WB" },
            "selection": [{ "name": "title" }]
        }),
    );
    assert!(matches!(err, TranslationError::UnknownOperator { .. }));
}

fn secure_model() -> TypeModel {
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
                                { "operations": ["READ"], "where": { "id": "$jwt.sub" } }
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
    .expect("secure model builds")
}

#[test]
fn test_read_auth_predicate_is_injected() {
    let model = secure_model();
    let mut claims = Map::new();
    claims.insert("sub".into(), json!("user-1"));
    let operation: Operation = serde_json::from_value(json!({
        "operation": "read",
        "node": "User",
        "selection": [{ "name": "name" }]
    }))
    .unwrap();
    let statement = translate::translate(
        &model,
        &operation,
        AuthContext::authenticated(vec![], claims),
    )
    .unwrap();
    assert_eq!(
        statement.cypher,
        "MATCH (this:User)\n\
         WHERE ((this.id IS NOT NULL AND this.id = $auth.jwt.sub))\n\
         RETURN this { .name } AS this"
    );
    assert_eq!(
        statement.params["auth"],
        json!({ "isAuthenticated": true, "roles": [], "jwt": { "sub": "user-1" } })
    );
}
