//! Assertor reconciliation behavior against mocked database metadata.

use std::sync::{Arc, Mutex};

use graphbolt::indexes::{
    assert_indexes_and_constraints, AssertOptions, ConstraintMetadata, DriverError, GraphDatabase,
    IndexMetadata,
};
use graphbolt::type_defs::DefinitionDocument;
use graphbolt::type_model::TypeModel;
use serde_json::json;

mockall::mock! {
    pub Db {}

    #[async_trait::async_trait]
    impl GraphDatabase for Db {
        async fn list_indexes(&self) -> Result<Vec<IndexMetadata>, DriverError>;
        async fn create_fulltext_index(
            &self,
            name: &str,
            label: &str,
            properties: &[String],
        ) -> Result<(), DriverError>;
        async fn list_constraints(&self) -> Result<Vec<ConstraintMetadata>, DriverError>;
        async fn create_unique_constraint(
            &self,
            name: &str,
            label: &str,
            property: &str,
        ) -> Result<(), DriverError>;
    }
}

fn model(value: serde_json::Value) -> TypeModel {
    let document: DefinitionDocument = serde_json::from_value(value).expect("fixture document");
    TypeModel::from_document(&document).expect("model builds")
}

fn movie_model() -> TypeModel {
    model(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Movie",
                "directives": [
                    {
                        "name": "fulltext",
                        "arguments": { "indexes": [{ "name": "MovieTitle", "fields": ["title"] }] }
                    }
                ],
                "fields": [
                    { "name": "title", "type": { "name": "String", "required": true } }
                ]
            }
        ]
    }))
}

fn movie_two_field_model(alias: Option<&str>) -> TypeModel {
    let mut description = json!({ "name": "description", "type": { "name": "String", "required": true } });
    if let Some(alias) = alias {
        description["directives"] =
            json!([{ "name": "alias", "arguments": { "property": alias } }]);
    }
    model(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "Movie",
                "directives": [
                    {
                        "name": "fulltext",
                        "arguments": {
                            "indexes": [{ "name": "MovieTitle", "fields": ["title", "description"] }]
                        }
                    }
                ],
                "fields": [
                    { "name": "title", "type": { "name": "String", "required": true } },
                    description
                ]
            }
        ]
    }))
}

fn existing_index(properties: &[&str]) -> IndexMetadata {
    IndexMetadata {
        name: "MovieTitle".into(),
        index_type: "FULLTEXT".into(),
        entity_type: "NODE".into(),
        labels: vec!["Movie".into()],
        properties: properties.iter().map(|p| p.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_creates_missing_index_when_create_is_set() {
    let model = movie_model();
    let mut db = MockDb::new();
    db.expect_list_indexes().times(1).returning(|| Ok(vec![]));
    db.expect_create_fulltext_index()
        .withf(|name, label, properties| {
            name == "MovieTitle"
                && label == "Movie"
                && properties.len() == 1
                && properties[0] == "title"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("index is created");
}

#[tokio::test]
async fn test_missing_index_without_create_fails() {
    let model = movie_model();
    let mut db = MockDb::new();
    db.expect_list_indexes().times(1).returning(|| Ok(vec![]));

    let err = assert_indexes_and_constraints(&model, &db, AssertOptions { create: false })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing @fulltext index 'MovieTitle' on Node 'Movie'"
    );
}

#[tokio::test]
async fn test_satisfied_declaration_is_a_noop() {
    let model = movie_model();
    let mut db = MockDb::new();
    db.expect_list_indexes()
        .times(1)
        .returning(|| Ok(vec![existing_index(&["title"])]));
    // No create expectation: any DDL call would fail the test.

    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("nothing to do");
}

#[tokio::test]
async fn test_asserting_twice_with_create_is_idempotent() {
    let model = movie_model();
    let created: Arc<Mutex<Vec<IndexMetadata>>> = Arc::new(Mutex::new(Vec::new()));

    let mut db = MockDb::new();
    let state = created.clone();
    db.expect_list_indexes()
        .times(2)
        .returning(move || Ok(state.lock().unwrap().clone()));
    let state = created.clone();
    db.expect_create_fulltext_index()
        .times(1)
        .returning(move |name, label, properties| {
            state.lock().unwrap().push(IndexMetadata {
                name: name.to_string(),
                index_type: "FULLTEXT".into(),
                entity_type: "NODE".into(),
                labels: vec![label.to_string()],
                properties: properties.to_vec(),
            });
            Ok(())
        });

    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("first run creates");
    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("second run succeeds without creating again");
}

#[tokio::test]
async fn test_pre_existing_index_missing_field() {
    let model = movie_two_field_model(None);
    let mut db = MockDb::new();
    db.expect_list_indexes()
        .times(1)
        .returning(|| Ok(vec![existing_index(&["title"])]));

    let err = assert_indexes_and_constraints(&model, &db, AssertOptions { create: false })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "@fulltext index 'MovieTitle' on Node 'Movie' is missing field 'description'"
    );
}

#[tokio::test]
async fn test_missing_field_reports_alias() {
    let model = movie_two_field_model(Some("desc"));
    let mut db = MockDb::new();
    db.expect_list_indexes()
        .times(1)
        .returning(|| Ok(vec![existing_index(&["title", "description"])]));

    let err = assert_indexes_and_constraints(&model, &db, AssertOptions { create: false })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "@fulltext index 'MovieTitle' on Node 'Movie' is missing field 'description' aliased to field 'desc'"
    );
}

#[tokio::test]
async fn test_missing_field_under_create_uses_distinct_variant() {
    let model = movie_two_field_model(None);
    let mut db = MockDb::new();
    db.expect_list_indexes()
        .times(1)
        .returning(|| Ok(vec![existing_index(&["title"])]));
    // The name is taken, so the index cannot be created whole; the call
    // must fail rather than silently patch or recreate it.

    let err = assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "@fulltext index 'MovieTitle' on Node 'Movie' already exists, but is missing field 'description'"
    );
}

fn user_model() -> TypeModel {
    model(json!({
        "definitions": [
            {
                "kind": "object",
                "name": "User",
                "fields": [
                    {
                        "name": "id",
                        "type": { "name": "ID", "required": true },
                        "directives": [{ "name": "unique", "arguments": {} }]
                    },
                    { "name": "name", "type": { "name": "String", "required": true } }
                ]
            }
        ]
    }))
}

#[tokio::test]
async fn test_unique_constraint_is_created() {
    let model = user_model();
    let mut db = MockDb::new();
    db.expect_list_indexes().times(1).returning(|| Ok(vec![]));
    db.expect_list_constraints().times(1).returning(|| Ok(vec![]));
    db.expect_create_unique_constraint()
        .withf(|name, label, property| {
            name == "User_id_unique" && label == "User" && property == "id"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("constraint is created");
}

#[tokio::test]
async fn test_missing_constraint_without_create_fails() {
    let model = user_model();
    let mut db = MockDb::new();
    db.expect_list_indexes().times(1).returning(|| Ok(vec![]));
    db.expect_list_constraints().times(1).returning(|| Ok(vec![]));

    let err = assert_indexes_and_constraints(&model, &db, AssertOptions { create: false })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing constraint for User.id");
}

#[tokio::test]
async fn test_existing_constraint_is_accepted() {
    let model = user_model();
    let mut db = MockDb::new();
    db.expect_list_indexes().times(1).returning(|| Ok(vec![]));
    db.expect_list_constraints().times(1).returning(|| {
        Ok(vec![ConstraintMetadata {
            name: "User_id_unique".into(),
            constraint_type: "UNIQUENESS".into(),
            labels: vec!["User".into()],
            properties: vec!["id".into()],
        }])
    });

    assert_indexes_and_constraints(&model, &db, AssertOptions { create: true })
        .await
        .expect("existing constraint satisfies the declaration");
}
