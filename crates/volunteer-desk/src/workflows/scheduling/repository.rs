use axum::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{
    Appointment, AppointmentId, CancellationRecord, Group, GroupId, StudyId, StudyVolunteer,
    Warning,
};
use crate::workflows::volunteers::VolunteerId;

/// Warnings the backend attached to a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub warnings: Vec<Warning>,
}

/// Persistence seam for appointments, groups, associations and cancellations.
#[async_trait]
pub trait SchedulingRepository: Send + Sync {
    async fn appointment(
        &self,
        study: StudyId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError>;
    async fn appointments_for_study(&self, study: StudyId)
        -> Result<Vec<Appointment>, RepositoryError>;
    /// Full-record write of an appointment.
    async fn save_appointment(&self, appointment: &Appointment)
        -> Result<WriteReceipt, RepositoryError>;

    async fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError>;

    async fn association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Option<StudyVolunteer>, RepositoryError>;
    async fn associations_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<StudyVolunteer>, RepositoryError>;
    async fn create_association(&self, association: &StudyVolunteer)
        -> Result<(), RepositoryError>;
    async fn delete_association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<(), RepositoryError>;

    /// Studies overlapping `study` in time in which the volunteer is already enrolled.
    async fn overlap_warnings(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Vec<Warning>, RepositoryError>;

    async fn record_cancellation(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, RepositoryError>;
    async fn cancellations_for_volunteer(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<CancellationRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("write rejected: {0}")]
    Conflict(String),
    #[error("scheduling backend unavailable: {0}")]
    Unavailable(String),
}
