use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{AppointmentId, AppointmentStatus, CancellingParty, GroupId, StudyId};
use super::repository::{RepositoryError, SchedulingRepository};
use super::service::{
    AssignmentError, AssignmentOutcome, AssignmentRequest, AssignmentService,
    BulkAssignmentRequest, BulkSelection, CancellationRequest,
};
use crate::workflows::matching::directory::VolunteerDirectory;
use crate::workflows::volunteers::VolunteerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignBody {
    pub volunteer_id: VolunteerId,
    pub group_id: GroupId,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignBody {
    pub group_id: GroupId,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(flatten)]
    pub selection: BulkSelection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchBody {
    pub first: AppointmentId,
    pub second: AppointmentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBody {
    pub reason: String,
    pub party: CancellingParty,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub release: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: AppointmentStatus,
}

/// Router builder exposing assignment, cancellation and schedule endpoints.
pub fn scheduling_router<R, D>(service: Arc<AssignmentService<R, D>>) -> Router
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/studies/:study_id/appointments/:appointment_id/assign",
            post(assign_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/assignments/bulk",
            post(bulk_assign_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/appointments/:appointment_id/unassign",
            post(unassign_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/appointments/switch",
            post(switch_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/appointments/:appointment_id/cancel",
            post(cancel_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/appointments/:appointment_id/status",
            post(status_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/schedule",
            get(schedule_handler::<R, D>),
        )
        .route(
            "/api/v1/studies/:study_id/volunteers",
            get(roster_handler::<R, D>),
        )
        .route(
            "/api/v1/volunteers/:volunteer_id/cancellations",
            get(cancellations_handler::<R, D>),
        )
        .with_state(service)
}

pub(crate) async fn assign_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path((study_id, appointment_id)): Path<(i64, i64)>,
    axum::Json(body): axum::Json<AssignBody>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    let request = AssignmentRequest {
        study_id: StudyId(study_id),
        appointment_id: AppointmentId(appointment_id),
        volunteer_id: body.volunteer_id,
        group_id: body.group_id,
        confirmed: body.confirmed,
    };

    match service.assign(request).await {
        Ok(outcome @ AssignmentOutcome::Assigned(_)) => {
            (StatusCode::OK, axum::Json(outcome)).into_response()
        }
        Ok(outcome @ AssignmentOutcome::RequiresConfirmation { .. }) => {
            (StatusCode::CONFLICT, axum::Json(outcome)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_assign_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path(study_id): Path<i64>,
    axum::Json(body): axum::Json<BulkAssignBody>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    let request = BulkAssignmentRequest {
        study_id: StudyId(study_id),
        group_id: body.group_id,
        confirmed: body.confirmed,
        selection: body.selection,
    };

    match service.bulk_assign(request).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn unassign_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path((study_id, appointment_id)): Path<(i64, i64)>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service
        .unassign(StudyId(study_id), AppointmentId(appointment_id))
        .await
    {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn switch_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path(study_id): Path<i64>,
    axum::Json(body): axum::Json<SwitchBody>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service
        .switch(StudyId(study_id), body.first, body.second)
        .await
    {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path((study_id, appointment_id)): Path<(i64, i64)>,
    axum::Json(body): axum::Json<CancelBody>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    let request = CancellationRequest {
        study_id: StudyId(study_id),
        appointment_id: AppointmentId(appointment_id),
        date: body.date.unwrap_or_else(|| Local::now().date_naive()),
        reason: body.reason,
        party: body.party,
        release: body.release,
    };

    match service.cancel(request).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path((study_id, appointment_id)): Path<(i64, i64)>,
    axum::Json(body): axum::Json<StatusBody>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service
        .transition(StudyId(study_id), AppointmentId(appointment_id), body.status)
        .await
    {
        Ok(appointment) => (StatusCode::OK, axum::Json(appointment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn schedule_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path(study_id): Path<i64>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service.schedule(StudyId(study_id)).await {
        Ok(days) => (StatusCode::OK, axum::Json(days)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn roster_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path(study_id): Path<i64>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service.roster(StudyId(study_id)).await {
        Ok(associations) => (StatusCode::OK, axum::Json(associations)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancellations_handler<R, D>(
    State(service): State<Arc<AssignmentService<R, D>>>,
    Path(volunteer_id): Path<i64>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    match service.cancellations_for(VolunteerId(volunteer_id)).await {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AssignmentError) -> Response {
    let status = match &error {
        AssignmentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssignmentError::NotFound(_) | AssignmentError::Repository(RepositoryError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        AssignmentError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        AssignmentError::Repository(RepositoryError::Unavailable(_))
        | AssignmentError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
