use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::directory::{ContactPublisher, ContactRequest, VolunteerDirectory};
use super::domain::Filters;
use super::service::{MatchingError, MatchingService};

/// Body of a matching run: the filters plus an optional reference date for ages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRequest {
    #[serde(flatten)]
    pub filters: Filters,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Router builder exposing the matching run and the bulk contact action.
pub fn matching_router<D, C>(service: Arc<MatchingService<D, C>>) -> Router
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
{
    Router::new()
        .route("/api/v1/matching/run", post(run_handler::<D, C>))
        .route("/api/v1/matching/contact", post(contact_handler::<D, C>))
        .with_state(service)
}

pub(crate) async fn run_handler<D, C>(
    State(service): State<Arc<MatchingService<D, C>>>,
    axum::Json(request): axum::Json<MatchRequest>,
) -> Response
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
{
    let today = request
        .today
        .unwrap_or_else(|| Local::now().date_naive());

    match service.execute(&request.filters, today).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn contact_handler<D, C>(
    State(service): State<Arc<MatchingService<D, C>>>,
    axum::Json(request): axum::Json<ContactRequest>,
) -> Response
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
{
    match service.contact(request).await {
        Ok(receipt) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: MatchingError) -> Response {
    let status = match &error {
        MatchingError::Filters(_) | MatchingError::Contact(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MatchingError::NoVolunteers => StatusCode::SERVICE_UNAVAILABLE,
        MatchingError::Transport(_) => StatusCode::BAD_GATEWAY,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
