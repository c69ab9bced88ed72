//! Integration tests for the claims middleware.
//!
//! These drive the full router (contract check → controller → adjudicator →
//! envelope) through `tower::ServiceExt::oneshot`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use claims_middleware::{
    build_middleware, create_app, mount, Adjudicator, AdjudicatorError, ClaimOutcome,
    ClaimsRequest, ConceptDefinition, ConceptDescriptor, ConceptKind, ContractEnforcer,
    InMemoryAdjudicator, Operation, Relationship, ServiceConfig, ValueSource,
};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn subject(age: u32, height: f64, color: &str, name: &str, food: &str, sex: &str) -> Map<String, Value> {
    Map::from_iter([
        ("age".to_string(), json!(age)),
        ("height".to_string(), json!(height)),
        ("favorite_color".to_string(), json!(color)),
        ("name".to_string(), json!(name)),
        ("favorite_food".to_string(), json!(food)),
        ("sex".to_string(), json!(sex)),
    ])
}

/// Adjudicator with the full test concept set.
fn full_adjudicator() -> InMemoryAdjudicator {
    let mut adjudicator = InMemoryAdjudicator::new();
    adjudicator.add_subject("123456789", subject(23, 5.5, "blue", "John", "pizza", "M"));
    adjudicator.add_subject("987654321", subject(16, 6.1, "green", "Jane", "tacos", "F"));
    adjudicator.add_subject("123456987", subject(25, 5.8, "red", "Jim", "sushi", "M"));

    adjudicator.add_concept(
        ConceptDefinition::new(
            ConceptKind::Boolean,
            "subject_exists",
            "The subject exists",
            "Determines whether a subject is a known entity within the domain.",
        )
        .with_source(ValueSource::SubjectExists)
        .with_qualifiers(["age"]),
    );
    adjudicator.add_concept(ConceptDefinition::new(
        ConceptKind::Number,
        "age",
        "The subject is of age",
        "Determine if the subject is of an age",
    ));
    adjudicator.add_concept(ConceptDefinition::new(
        ConceptKind::Number,
        "height",
        "The height of the subject",
        "The measured height of the subject in feet",
    ));
    adjudicator.add_concept(ConceptDefinition::new(
        ConceptKind::String,
        "favorite_color",
        "The subject has the favorite color",
        "The subject considers their favorite color to be",
    ));
    adjudicator.add_concept(
        ConceptDefinition::new(
            ConceptKind::String,
            "favorite_food",
            "The subject has the favorite food",
            "The subject considers their favorite food to be",
        )
        .with_relationships([Relationship::Eq, Relationship::Ne]),
    );
    adjudicator.add_concept(
        ConceptDefinition::new(
            ConceptKind::Number,
            "bad_cast_favorite_color",
            "Favorite color read as a number",
            "Reads a string attribute as a number",
        )
        .with_source(ValueSource::Attribute("favorite_color".to_string())),
    );
    adjudicator
}

fn app_with<A: Adjudicator + 'static>(adjudicator: A) -> Router {
    mount("/claims", Arc::new(adjudicator)).unwrap()
}

fn demo_app() -> Router {
    app_with(InMemoryAdjudicator::demo())
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn put_claims(app: Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, "/claims", Some(&body.to_string())).await
}

fn success(verified: bool) -> Value {
    json!({
        "verified": verified,
        "metadata": {"validation_response": {"code": 200, "message": "Success"}}
    })
}

fn bare(code: u16, message: &str) -> Value {
    json!({"metadata": {"validation_response": {"code": code, "message": message}}})
}

fn claim_set(subject: &str, concept: &str, relationship: &str, value: &str) -> Value {
    json!({
        "subject": subject,
        "claims": [{"concept": concept, "relationship": relationship, "value": value}]
    })
}

/// Adjudicator whose whole call fails with the given error.
struct FailingAdjudicator(AdjudicatorError);

#[async_trait]
impl Adjudicator for FailingAdjudicator {
    fn concepts(&self) -> Vec<ConceptDescriptor> {
        Vec::new()
    }

    async fn verify_claims(
        &self,
        _request: &ClaimsRequest,
    ) -> Result<BTreeMap<String, ClaimOutcome>, AdjudicatorError> {
        Err(self.0.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// List Concepts
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_concepts() {
    let (status, body) = send(demo_app(), Method::GET, "/claims", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "metadata": {"validation_response": {"code": 200, "message": "Success"}},
            "values": [
                {
                    "name": "subject_exists",
                    "description": "The subject exists",
                    "longDescription": "Determines whether a subject is a known entity within the domain.",
                    "relationships": ["eq", "not_eq"],
                    "qualifiers": ["age"]
                },
                {
                    "name": "age",
                    "description": "The subject is of age",
                    "longDescription": "Determine if the subject is of an age",
                    "relationships": ["gt", "gt_or_eq", "lt", "lt_or_eq", "eq", "not_eq"],
                    "qualifiers": []
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_list_concepts_empty_registry() {
    let (status, body) = send(app_with(InMemoryAdjudicator::new()), Method::GET, "/claims", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"metadata": {"validation_response": {"code": 200, "message": "Success"}}, "values": []})
    );
}

#[tokio::test]
async fn test_listing_matches_contract() {
    let (_, body) = send(app_with(full_adjudicator()), Method::GET, "/claims", None).await;
    let contract = ContractEnforcer::embedded().unwrap();
    assert!(contract.validate_response(Operation::GetConcepts, &body).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate Claims
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_verified_claim() {
    let (status, body) = put_claims(
        demo_app(),
        json!({"1": claim_set("123456987", "subject_exists", "eq", "true")}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1": success(true)}));
}

#[tokio::test]
async fn test_mixed_batch() {
    let request = json!({
        "1": claim_set("123456987", "subject_exists", "eq", "true"),
        "2": claim_set("123456987", "subject_exists", "not_eq", "true"),
        "3": {
            "subject": "123456987",
            "mode": "any",
            "claims": [{
                "concept": "subject_exists",
                "relationship": "eq",
                "qualifier": {"age": 25},
                "value": "true"
            }]
        },
        "4": claim_set("000000000", "subject_exists", "eq", "true")
    });

    let (status, body) = put_claims(demo_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "1": success(true),
            "2": success(false),
            "3": success(true),
            "4": bare(404, "Not Found")
        })
    );
}

#[tokio::test]
async fn test_post_matches_put() {
    let body = json!({"a": claim_set("987654321", "age", "lt", "18")}).to_string();
    let (status, value) = send(demo_app(), Method::POST, "/claims", Some(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({"a": success(true)}));
}

#[tokio::test]
async fn test_empty_request() {
    let (status, body) = put_claims(demo_app(), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_true_and_false_claims() {
    let request = json!({
        "t1": claim_set("123456789", "age", "gt", "18"),
        "t2": claim_set("123456789", "height", "lt_or_eq", "5.5"),
        "t3": claim_set("123456789", "favorite_color", "eq", "blue"),
        "t4": claim_set("987654321", "favorite_food", "not_eq", "pizza"),
        "f1": claim_set("987654321", "age", "gt_or_eq", "18"),
        "f2": claim_set("123456987", "height", "gt", "6"),
        "f3": claim_set("123456987", "favorite_color", "not_eq", "red"),
        "f4": claim_set("123456789", "favorite_food", "eq", "sushi")
    });

    let (status, body) = put_claims(app_with(full_adjudicator()), request).await;
    assert_eq!(status, StatusCode::OK);

    let body = body.as_object().unwrap();
    assert_eq!(body.len(), 8);
    for (key, entry) in body {
        let expected = key.starts_with('t');
        assert_eq!(entry, &success(expected), "key {}", key);
    }
}

#[tokio::test]
async fn test_bad_request_entries() {
    let request = json!({
        "e_bad_request_undefined_relationship": claim_set("123456789", "favorite_food", "gt_or_eq", "pizza"),
        "e_bad_request_undefined_qualifier": {
            "subject": "123456789",
            "claims": [{
                "concept": "subject_exists",
                "relationship": "eq",
                "qualifier": {"height": 5.5},
                "value": "true"
            }]
        }
    });

    let (status, body) = put_claims(app_with(full_adjudicator()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "e_bad_request_undefined_relationship": {"metadata": {
                "validation_response": {"code": 400, "message": "Bad Request"},
                "validation_information": [
                    "Relationship gt_or_eq is not defined for concept favorite_food"
                ]
            }},
            "e_bad_request_undefined_qualifier": {"metadata": {
                "validation_response": {"code": 400, "message": "Bad Request"},
                "validation_information": [
                    "Qualifier height is not defined for concept subject_exists"
                ]
            }}
        })
    );
}

#[tokio::test]
async fn test_internal_error_entries_hide_detail() {
    let request = json!({
        "e_internal_bad_cast": claim_set("123456789", "bad_cast_favorite_color", "gt", "3"),
        "ok": claim_set("123456789", "age", "eq", "23")
    });

    let (status, body) = put_claims(app_with(full_adjudicator()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "e_internal_bad_cast": bare(500, "Internal Server Error"),
            "ok": success(true)
        })
    );
}

#[tokio::test]
async fn test_every_key_preserved() {
    let mut request = Map::new();
    for i in 0..25 {
        let subject = if i % 3 == 0 { "000000000" } else { "123456987" };
        request.insert(format!("k{}", i), claim_set(subject, "age", "gt", "18"));
    }

    let (_, body) = put_claims(demo_app(), Value::Object(request.clone())).await;
    let body = body.as_object().unwrap();

    assert_eq!(body.len(), request.len());
    assert!(request.keys().all(|k| body.contains_key(k)));
}

#[tokio::test]
async fn test_validate_response_matches_contract() {
    let request = json!({
        "1": claim_set("123456987", "age", "gt", "18"),
        "2": claim_set("000000000", "age", "gt", "18"),
        "3": claim_set("123456987", "favorite_food", "gt", "x")
    });
    let (_, body) = put_claims(app_with(full_adjudicator()), request).await;
    let contract = ContractEnforcer::embedded().unwrap();
    assert!(contract.validate_response(Operation::ValidateClaims, &body).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract Enforcement and Error Stage
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_body_rejected() {
    let (status, body) = send(demo_app(), Method::PUT, "/claims", Some("")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["metadata"]["validation_response"]["code"], 400);
    assert_eq!(body["metadata"]["validation_information"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_object_body_rejected() {
    for payload in ["[]", "\"claims\"", "42"] {
        let (status, body) = send(demo_app(), Method::PUT, "/claims", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body["metadata"]["validation_response"]["message"], "Bad Request");
        assert!(!body["metadata"]["validation_information"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_malformed_claim_set_rejected() {
    let request = json!({"1": {"subject": "123456987", "claims": [{"concept": "age"}]}});
    let (status, body) = put_claims(demo_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let information = body["metadata"]["validation_information"].as_array().unwrap();
    assert!(information.iter().all(|i| i.as_str().unwrap().starts_with("$/1/claims/0")));
}

#[tokio::test]
async fn test_whole_call_failure_is_bare_500() {
    let request = json!({"1": claim_set("123456987", "age", "gt", "18")});
    let failures = [
        AdjudicatorError::Internal("connection refused to subject store".to_string()),
        AdjudicatorError::Rejected("connection refused by policy".to_string()),
    ];
    for failure in failures {
        let (status, body) = put_claims(app_with(FailingAdjudicator(failure)), request.clone()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, bare(500, "Internal Server Error"));
        assert!(!body.to_string().contains("connection refused"));
    }
}

#[tokio::test]
async fn test_unknown_path_under_prefix() {
    let (status, body) = send(demo_app(), Method::GET, "/claims/unknown", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, bare(404, "Not Found"));
}

#[tokio::test]
async fn test_prefix_with_trailing_slash() {
    let (status, body) = send(demo_app(), Method::GET, "/claims/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["values"].as_array().unwrap().len(), 2);

    let request = json!({"1": claim_set("123456987", "subject_exists", "eq", "true")}).to_string();
    let (status, body) = send(demo_app(), Method::PUT, "/claims/", Some(&request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1": success(true)}));

    let (status, body) = send(demo_app(), Method::PUT, "/claims/", Some("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["metadata"]["validation_information"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unprefixed_middleware() {
    let app = build_middleware(Arc::new(InMemoryAdjudicator::demo())).unwrap();
    let (status, body) = send(app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["values"].as_array().unwrap().len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Full Service
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_service_health_and_claims() {
    let config = ServiceConfig::default();
    let app = create_app(&config, Arc::new(InMemoryAdjudicator::demo())).unwrap();

    let (status, body) = send(app.clone(), Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "alive"}));

    let (status, body) = send(app.clone(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["concept_count"], 2);
    assert_eq!(body["api_version"], "1.0.0");

    let (status, body) = send(app.clone(), Method::GET, "/claims/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["values"].as_array().unwrap().len(), 2);

    let request = json!({"1": claim_set("123456987", "subject_exists", "eq", "true")}).to_string();
    let (status, body) = send(app, Method::PUT, "/claims", Some(&request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1": success(true)}));
}
