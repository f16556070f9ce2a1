//! Appointment assignment: binding volunteers to study slots while keeping exactly
//! one study-volunteer association per pair that still holds an appointment.

pub mod agenda;
pub mod compatibility;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod time;

#[cfg(test)]
mod tests;

pub use agenda::{group_by_day, DaySchedule, TimeSlot};
pub use compatibility::{check_phototype, PhototypeCheck};
pub use domain::{
    Appointment, AppointmentId, AppointmentStatus, CancellationRecord, CancellingParty,
    EnrollmentStatus, Group, GroupId, StudyId, StudyVolunteer, Warning, WarningKind,
};
pub use repository::{RepositoryError, SchedulingRepository, WriteReceipt};
pub use router::scheduling_router;
pub use service::{
    AssignmentError, AssignmentOutcome, AssignmentPair, AssignmentReceipt, AssignmentRequest,
    AssignmentService, AssignmentValidationError, BulkAssignmentReport, BulkAssignmentRequest,
    BulkFailure, BulkSelection, CancellationRequest, MissingEntity, PendingConfirmation,
    SwitchOutcome, UnassignOutcome,
};
