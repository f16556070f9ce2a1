use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::matching::router::{run_handler, MatchRequest};
use crate::workflows::matching::{matching_router, Filters};
use crate::workflows::volunteers::VolunteerId;

fn post_json(path: &str, payload: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(path)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn run_route_accepts_legacy_field_names() {
    let (service, _, _) = build_service(
        MemoryDirectory::with(vec![volunteer(1, 25), volunteer(2, 45)]),
        settings(10),
    );
    let router = matching_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/matching/run",
            json!({
                "demographics": { "ageMin": 18, "ageMax": 30, "phototypes": ["Phototype 2"] },
                "evaluations": { "globale": { "min": 3, "max": 5 } },
                "today": "2026-06-01"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["volunteer_id"], json!(1));
    assert_eq!(results[0]["total_score"], json!(100));
    assert_eq!(payload["exclusions"]["age"], json!(1));
}

#[tokio::test]
async fn run_handler_maps_validation_errors_to_unprocessable() {
    let (service, _, _) =
        build_service(MemoryDirectory::with(vec![volunteer(1, 25)]), settings(10));
    let mut filters = Filters::default();
    filters.demographics.age_min = 60;
    filters.demographics.age_max = 20;

    let response = run_handler::<MemoryDirectory, MemoryContacts>(
        State(Arc::new(service)),
        axum::Json(MatchRequest {
            filters,
            today: Some(today()),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("minimum age"));
}

#[tokio::test]
async fn run_handler_reports_unavailable_directory() {
    let (service, _, _) = build_service(MemoryDirectory::default(), settings(10));

    let response = run_handler::<MemoryDirectory, MemoryContacts>(
        State(Arc::new(service)),
        axum::Json(MatchRequest::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn contact_route_accepts_and_reports_receipt() {
    let (service, _, contacts) =
        build_service(MemoryDirectory::with(vec![volunteer(4, 25)]), settings(10));
    let router = matching_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/matching/contact",
            json!({
                "volunteer_ids": [4],
                "subject": "Nouvelle étude",
                "body": "Merci de nous recontacter."
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["sent"], json!(1));
    assert_eq!(contacts.messages()[0].recipients[0].volunteer_id, VolunteerId(4));
}

#[tokio::test]
async fn contact_route_rejects_empty_selection() {
    let (service, _, _) =
        build_service(MemoryDirectory::with(vec![volunteer(4, 25)]), settings(10));
    let router = matching_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/matching/contact",
            json!({ "volunteer_ids": [], "subject": "x", "body": "" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
