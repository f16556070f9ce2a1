use super::common::*;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::scheduling::scheduling_router;
use crate::workflows::volunteers::VolunteerId;

fn post_json(path: &str, payload: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(path)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request builds")
}

fn get(path: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(path)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn assign_route_returns_receipt() {
    let repository = MemoryScheduling::seeded(vec![slot(5, "9h00")], vec![group(50, None)]);
    let (service, repository) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/studies/7/appointments/5/assign",
            json!({ "volunteer_id": 42, "group_id": 3 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("assigned"));
    assert_eq!(payload["association_created"], json!(true));
    assert_eq!(payload["appointment"]["volunteer_id"], json!(42));
    assert_eq!(repository.associated(42).expect("association").incentive, 50);
}

#[tokio::test]
async fn assign_route_asks_for_confirmation_on_phototype_mismatch() {
    let repository = MemoryScheduling::seeded(vec![slot(5, "9h00")], vec![group(50, Some("V;VI"))]);
    let (service, _) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/studies/7/appointments/5/assign",
            json!({ "volunteer_id": 42, "group_id": 3 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("requires_confirmation"));
}

#[tokio::test]
async fn missing_appointment_maps_to_not_found() {
    let repository = MemoryScheduling::seeded(Vec::new(), vec![group(50, None)]);
    let (service, _) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/studies/7/appointments/404/unassign",
            json!({}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_route_accepts_one_volunteer_mode() {
    let repository = MemoryScheduling::seeded(
        vec![slot(1, "9h"), slot(2, "10h")],
        vec![group(50, None)],
    );
    let (service, repository) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/studies/7/assignments/bulk",
            json!({
                "group_id": 3,
                "mode": "one_volunteer",
                "volunteer_id": 42,
                "appointment_ids": [1, 2]
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["assigned"], json!([1, 2]));
    assert_eq!(repository.stored(2).volunteer_id, Some(VolunteerId(42)));
}

#[tokio::test]
async fn invalid_status_transition_is_unprocessable() {
    let repository = MemoryScheduling::seeded(vec![slot(1, "9h")], vec![group(50, None)]);
    let (service, _) = build_service(repository, Vec::new());
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/studies/7/appointments/1/status",
            json!({ "status": "COMPLETE" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cancel_route_creates_history_entry() {
    let repository = MemoryScheduling::seeded(vec![assigned(5, 42)], vec![group(50, None)]);
    let (service, _) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/studies/7/appointments/5/cancel",
            json!({ "reason": "empêchement", "party": "VOLONTAIRE", "date": "2026-09-10" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(get("/api/v1/volunteers/42/cancellations"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["reason"], json!("empêchement"));
    assert_eq!(payload[0]["appointment_id"], json!(5));
}

#[tokio::test]
async fn schedule_route_lists_days() {
    let repository = MemoryScheduling::seeded(
        vec![slot(1, "9h"), assigned(2, 42)],
        vec![group(50, None)],
    );
    let (service, _) = build_service(repository, vec![person(42, 2)]);
    let router = scheduling_router(Arc::new(service));

    let response = router
        .oneshot(get("/api/v1/studies/7/schedule"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["date"], json!("2026-09-14"));
    assert_eq!(payload[0]["slots"][0]["time"], json!("09:00"));
    assert_eq!(payload[0]["slots"][1]["time"], json!("10:00"));
}
