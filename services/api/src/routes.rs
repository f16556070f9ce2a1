use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use volunteer_desk::workflows::matching::{
    matching_router, ContactPublisher, MatchingService, VolunteerDirectory,
};
use volunteer_desk::workflows::scheduling::{
    scheduling_router, AssignmentService, SchedulingRepository,
};

pub(crate) fn with_service_routes<D, C, R>(
    matching: Arc<MatchingService<D, C>>,
    scheduling: Arc<AssignmentService<R, D>>,
) -> axum::Router
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
    R: SchedulingRepository + 'static,
{
    matching_router(matching)
        .merge(scheduling_router(scheduling))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryContacts, InMemoryDirectory, InMemoryScheduling};
    use crate::server::build_app;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use volunteer_desk::config::MatchingSettings;

    fn app(ready: bool) -> axum::Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        build_app(
            Arc::new(InMemoryDirectory::seeded()),
            Arc::new(InMemoryContacts::default()),
            Arc::new(InMemoryScheduling::seeded()),
            MatchingSettings::default(),
        )
        .layer(Extension(state))
    }

    fn post_json(path: &str, payload: serde_json::Value) -> Request<Body> {
        Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&payload).expect("serialize payload"),
            ))
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn matching_route_ranks_seeded_volunteers() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/matching/run",
                json!({
                    "demographics": { "phototypes": ["II"] },
                    "today": "2026-06-01"
                }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        let ids: Vec<i64> = payload["results"]
            .as_array()
            .expect("results array")
            .iter()
            .map(|result| result["volunteer_id"].as_i64().expect("id"))
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&42));
        assert!(ids.contains(&46));
    }

    #[tokio::test]
    async fn assignment_route_binds_seeded_volunteer() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/studies/7/appointments/5/assign",
                json!({ "volunteer_id": 42, "group_id": 1 }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["status"], "assigned");
        assert_eq!(payload["association_created"], true);
        assert_eq!(payload["appointment"]["volunteer_id"], 42);
    }
}
