use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::agenda::{group_by_day, DaySchedule};
use super::compatibility::check_phototype;
use super::domain::{
    dedupe_warnings, Appointment, AppointmentId, AppointmentStatus, CancellationRecord,
    CancellingParty, Group, GroupId, StudyId, StudyVolunteer, Warning, WarningKind,
};
use super::repository::{RepositoryError, SchedulingRepository};
use crate::workflows::matching::directory::{DirectoryError, VolunteerDirectory};
use crate::workflows::volunteers::{Volunteer, VolunteerId};

/// Assign one volunteer to one appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub study_id: StudyId,
    pub appointment_id: AppointmentId,
    pub volunteer_id: VolunteerId,
    pub group_id: GroupId,
    /// Operator already acknowledged a phototype mismatch.
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned(AssignmentReceipt),
    /// Nothing was written; resubmit with `confirmed` to proceed.
    RequiresConfirmation { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReceipt {
    pub appointment: Appointment,
    pub association_created: bool,
    /// Volunteer who held the slot before this assignment.
    pub displaced: Option<VolunteerId>,
    pub displaced_association_deleted: bool,
    pub warnings: Vec<Warning>,
}

/// Which appointments go to which volunteers in a bulk assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BulkSelection {
    /// Several appointments for a single volunteer.
    OneVolunteer {
        volunteer_id: VolunteerId,
        appointment_ids: Vec<AppointmentId>,
    },
    /// Mass assignment: one volunteer per appointment.
    Pairs { pairs: Vec<AssignmentPair> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPair {
    pub appointment_id: AppointmentId,
    pub volunteer_id: VolunteerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignmentRequest {
    pub study_id: StudyId,
    pub group_id: GroupId,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(flatten)]
    pub selection: BulkSelection,
}

impl BulkAssignmentRequest {
    pub fn pairs(&self) -> Vec<AssignmentPair> {
        match &self.selection {
            BulkSelection::OneVolunteer {
                volunteer_id,
                appointment_ids,
            } => appointment_ids
                .iter()
                .map(|appointment_id| AssignmentPair {
                    appointment_id: *appointment_id,
                    volunteer_id: *volunteer_id,
                })
                .collect(),
            BulkSelection::Pairs { pairs } => pairs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub appointment_id: AppointmentId,
    pub volunteer_id: VolunteerId,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub appointment_id: AppointmentId,
    pub volunteer_id: VolunteerId,
    pub reason: String,
}

/// Per-item outcome of a bulk assignment. Successful items are never rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAssignmentReport {
    pub assigned: Vec<AppointmentId>,
    pub failures: Vec<BulkFailure>,
    pub needs_confirmation: Vec<PendingConfirmation>,
    pub associations_created: Vec<VolunteerId>,
    pub associations_deleted: Vec<VolunteerId>,
    pub warnings: Vec<Warning>,
    /// One consolidated line for the operator.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignOutcome {
    pub appointment: Appointment,
    /// Volunteer removed from the slot; `None` when the slot was already free.
    pub volunteer_id: Option<VolunteerId>,
    pub association_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOutcome {
    pub first: Appointment,
    pub second: Appointment,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub study_id: StudyId,
    pub appointment_id: AppointmentId,
    pub date: NaiveDate,
    pub reason: String,
    pub party: CancellingParty,
    /// Also free the slot through the unassign path.
    #[serde(default)]
    pub release: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEntity {
    Appointment(AppointmentId),
    Group(GroupId),
    Volunteer(VolunteerId),
}

impl fmt::Display for MissingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingEntity::Appointment(id) => write!(f, "appointment {id} not found"),
            MissingEntity::Group(id) => write!(f, "group {id} not found"),
            MissingEntity::Volunteer(id) => write!(f, "volunteer {id} not found"),
        }
    }
}

/// Rejections raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentValidationError {
    #[error("volunteer {0} is archived")]
    ArchivedVolunteer(VolunteerId),
    #[error("group {group} does not belong to study {study}")]
    GroupOutsideStudy { group: GroupId, study: StudyId },
    #[error("appointment {id} is {status} and can no longer be assigned")]
    AppointmentClosed {
        id: AppointmentId,
        status: AppointmentStatus,
    },
    #[error("appointment {0} has no volunteer assigned")]
    NotAssigned(AppointmentId),
    #[error("cannot switch appointment {0} with itself")]
    SameAppointment(AppointmentId),
    #[error("select at least one appointment")]
    EmptySelection,
    #[error("appointment {0} is selected more than once")]
    DuplicateAppointment(AppointmentId),
    #[error("cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("a cancellation reason is required")]
    MissingReason,
}

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error(transparent)]
    Validation(#[from] AssignmentValidationError),
    #[error("{0}")]
    NotFound(MissingEntity),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Service keeping appointments and study-volunteer associations consistent.
pub struct AssignmentService<R, D> {
    repository: Arc<R>,
    directory: Arc<D>,
}

impl<R, D> AssignmentService<R, D>
where
    R: SchedulingRepository + 'static,
    D: VolunteerDirectory + 'static,
{
    pub fn new(repository: Arc<R>, directory: Arc<D>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    pub async fn assign(
        &self,
        request: AssignmentRequest,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let study = request.study_id;
        let mut appointment = self.load_appointment(study, request.appointment_id).await?;
        if !appointment.status.accepts_assignment() {
            return Err(AssignmentValidationError::AppointmentClosed {
                id: appointment.id,
                status: appointment.status,
            }
            .into());
        }

        let volunteer = self.load_volunteer(request.volunteer_id).await?;
        let group = self.load_group(study, request.group_id).await?;

        let mut warnings = Vec::new();
        let check = check_phototype(&group, volunteer.phototype);
        if let Some(reason) = check.reason() {
            if !request.confirmed {
                debug!(volunteer_id = %volunteer.id, %reason, "assignment awaits confirmation");
                return Ok(AssignmentOutcome::RequiresConfirmation { reason });
            }
            warnings.push(Warning::new(WarningKind::PhototypeOverride, reason));
        }

        warnings.extend(self.overlaps(study, volunteer.id).await);

        let mut displaced = None;
        let mut displaced_association_deleted = false;
        if let Some(previous) = appointment.volunteer_id.filter(|id| *id != volunteer.id) {
            let released = self.release(appointment.clone()).await?;
            appointment = released.appointment;
            displaced_association_deleted = released.association_deleted;
            displaced = Some(previous);
            warnings.push(Warning::new(
                WarningKind::Displaced,
                format!("volunteer {previous} was removed from appointment {}", appointment.id),
            ));
        }

        let association_created = self.ensure_association(study, volunteer.id, &group).await?;

        appointment.volunteer_id = Some(volunteer.id);
        appointment.group_id = Some(group.id);
        let receipt = self.repository.save_appointment(&appointment).await?;
        warnings.extend(receipt.warnings);

        info!(
            study_id = %study,
            appointment_id = %appointment.id,
            volunteer_id = %volunteer.id,
            association_created,
            "appointment assigned"
        );

        Ok(AssignmentOutcome::Assigned(AssignmentReceipt {
            appointment,
            association_created,
            displaced,
            displaced_association_deleted,
            warnings: dedupe_warnings(warnings),
        }))
    }

    /// Run the single-assign path over a selection. Associations are ensured first,
    /// then every appointment update is issued concurrently.
    pub async fn bulk_assign(
        &self,
        request: BulkAssignmentRequest,
    ) -> Result<BulkAssignmentReport, AssignmentError> {
        let study = request.study_id;
        let pairs = request.pairs();
        if pairs.is_empty() {
            return Err(AssignmentValidationError::EmptySelection.into());
        }
        let mut seen = BTreeSet::new();
        for pair in &pairs {
            if !seen.insert(pair.appointment_id) {
                return Err(AssignmentValidationError::DuplicateAppointment(pair.appointment_id).into());
            }
        }

        let group = self.load_group(study, request.group_id).await?;
        let mut report = BulkAssignmentReport::default();
        let mut warnings = Vec::new();

        // Resolve each distinct volunteer once.
        let volunteer_ids: BTreeSet<VolunteerId> = pairs.iter().map(|pair| pair.volunteer_id).collect();
        let mut rejected: HashMap<VolunteerId, String> = HashMap::new();
        let mut unconfirmed: HashMap<VolunteerId, String> = HashMap::new();
        for volunteer_id in &volunteer_ids {
            match self.load_volunteer(*volunteer_id).await {
                Ok(volunteer) => {
                    if let Some(reason) = check_phototype(&group, volunteer.phototype).reason() {
                        if request.confirmed {
                            warnings.push(Warning::new(WarningKind::PhototypeOverride, reason));
                        } else {
                            unconfirmed.insert(*volunteer_id, reason);
                        }
                    }
                }
                Err(error) => {
                    rejected.insert(*volunteer_id, error.to_string());
                }
            }
        }

        let mut updates = Vec::new();
        let mut displaced = BTreeSet::new();
        for pair in pairs {
            if let Some(error) = rejected.get(&pair.volunteer_id) {
                report.failures.push(failure(pair, error.clone()));
                continue;
            }
            if let Some(reason) = unconfirmed.get(&pair.volunteer_id) {
                report.needs_confirmation.push(PendingConfirmation {
                    appointment_id: pair.appointment_id,
                    volunteer_id: pair.volunteer_id,
                    reason: reason.clone(),
                });
                continue;
            }

            let mut appointment = match self.load_appointment(study, pair.appointment_id).await {
                Ok(appointment) if !appointment.status.accepts_assignment() => {
                    let error = AssignmentValidationError::AppointmentClosed {
                        id: appointment.id,
                        status: appointment.status,
                    };
                    report.failures.push(failure(pair, error.to_string()));
                    continue;
                }
                Ok(appointment) => appointment,
                Err(error) => {
                    report.failures.push(failure(pair, error.to_string()));
                    continue;
                }
            };

            if let Some(previous) = appointment.volunteer_id.filter(|id| *id != pair.volunteer_id) {
                displaced.insert(previous);
                warnings.push(Warning::new(
                    WarningKind::Displaced,
                    format!("volunteer {previous} was removed from appointment {}", appointment.id),
                ));
            }
            appointment.volunteer_id = Some(pair.volunteer_id);
            appointment.group_id = Some(group.id);
            updates.push((pair, appointment));
        }

        // Associations before the batch of appointment writes.
        let targets: BTreeSet<VolunteerId> = updates.iter().map(|(pair, _)| pair.volunteer_id).collect();
        let mut unenrolled = HashMap::new();
        for volunteer_id in &targets {
            warnings.extend(self.overlaps(study, *volunteer_id).await);
            match self.ensure_association(study, *volunteer_id, &group).await {
                Ok(true) => report.associations_created.push(*volunteer_id),
                Ok(false) => {}
                Err(error) => {
                    warn!(study_id = %study, volunteer_id = %volunteer_id, %error, "association could not be ensured");
                    unenrolled.insert(*volunteer_id, error.to_string());
                }
            }
        }
        let (updates, skipped): (Vec<_>, Vec<_>) = updates
            .into_iter()
            .partition(|(pair, _)| !unenrolled.contains_key(&pair.volunteer_id));
        for (pair, _) in skipped {
            let error = unenrolled.get(&pair.volunteer_id).cloned().unwrap_or_default();
            report.failures.push(failure(pair, error));
        }

        let outcomes = join_all(
            updates
                .iter()
                .map(|(_, appointment)| self.repository.save_appointment(appointment)),
        )
        .await;

        let mut assigned_volunteers = BTreeSet::new();
        for ((pair, _), outcome) in updates.iter().zip(outcomes) {
            match outcome {
                Ok(receipt) => {
                    report.assigned.push(pair.appointment_id);
                    assigned_volunteers.insert(pair.volunteer_id);
                    warnings.extend(receipt.warnings);
                }
                Err(error) => {
                    warn!(appointment_id = %pair.appointment_id, %error, "bulk appointment update failed");
                    report.failures.push(failure(*pair, error.to_string()));
                }
            }
        }

        // Displaced volunteers and volunteers whose every update failed may no
        // longer hold an appointment in the study.
        let created: BTreeSet<VolunteerId> = report.associations_created.iter().copied().collect();
        let to_reconcile: BTreeSet<VolunteerId> = displaced
            .into_iter()
            .chain(created.difference(&assigned_volunteers).copied())
            .collect();
        for volunteer_id in to_reconcile {
            match self.reconcile(study, volunteer_id).await {
                Ok(true) => report.associations_deleted.push(volunteer_id),
                Ok(false) => {}
                Err(error) => {
                    warn!(study_id = %study, volunteer_id = %volunteer_id, %error, "association reconciliation failed")
                }
            }
        }

        report.warnings = dedupe_warnings(warnings);
        report.message = consolidated_message(&report);
        info!(
            study_id = %study,
            assigned = report.assigned.len(),
            failed = report.failures.len(),
            pending = report.needs_confirmation.len(),
            "bulk assignment complete"
        );
        Ok(report)
    }

    /// Clear the volunteer from an appointment, then drop the study association
    /// if that volunteer holds no other appointment in the study.
    pub async fn unassign(
        &self,
        study: StudyId,
        appointment: AppointmentId,
    ) -> Result<UnassignOutcome, AssignmentError> {
        let appointment = self.load_appointment(study, appointment).await?;
        self.release(appointment).await
    }

    /// Exchange the volunteers (and groups) of two assigned appointments.
    ///
    /// Associations are ensured before either write. When the second write fails
    /// the first appointment is written back and both holders are reconciled.
    pub async fn switch(
        &self,
        study: StudyId,
        first: AppointmentId,
        second: AppointmentId,
    ) -> Result<SwitchOutcome, AssignmentError> {
        if first == second {
            return Err(AssignmentValidationError::SameAppointment(first).into());
        }

        let mut first = self.load_appointment(study, first).await?;
        let mut second = self.load_appointment(study, second).await?;
        for appointment in [&first, &second] {
            if appointment.volunteer_id.is_none() {
                return Err(AssignmentValidationError::NotAssigned(appointment.id).into());
            }
        }

        let (original_first, original_second) = (first.clone(), second.clone());
        std::mem::swap(&mut first.volunteer_id, &mut second.volunteer_id);
        std::mem::swap(&mut first.group_id, &mut second.group_id);

        for appointment in [&first, &second] {
            if let (Some(volunteer_id), Some(group_id)) = (appointment.volunteer_id, appointment.group_id) {
                let group = self.load_group(study, group_id).await?;
                self.ensure_association(study, volunteer_id, &group).await?;
            }
        }

        let mut warnings = self.repository.save_appointment(&first).await?.warnings;
        match self.repository.save_appointment(&second).await {
            Ok(receipt) => warnings.extend(receipt.warnings),
            Err(error) => {
                warn!(study_id = %study, appointment_id = %second.id, %error, "switch failed halfway; restoring first appointment");
                if let Err(restore) = self.repository.save_appointment(&original_first).await {
                    warn!(study_id = %study, appointment_id = %first.id, error = %restore, "first appointment could not be restored");
                }
                let holders: BTreeSet<VolunteerId> = [&original_first, &original_second]
                    .into_iter()
                    .filter_map(|appointment| appointment.volunteer_id)
                    .collect();
                for volunteer_id in holders {
                    if let Err(reconcile) = self.reconcile(study, volunteer_id).await {
                        warn!(study_id = %study, volunteer_id = %volunteer_id, error = %reconcile, "association reconciliation failed");
                    }
                }
                return Err(error.into());
            }
        }

        info!(study_id = %study, first = %first.id, second = %second.id, "appointments switched");
        Ok(SwitchOutcome {
            first,
            second,
            warnings: dedupe_warnings(warnings),
        })
    }

    pub async fn transition(
        &self,
        study: StudyId,
        appointment: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AssignmentError> {
        let mut appointment = self.load_appointment(study, appointment).await?;
        if appointment.status == status {
            return Ok(appointment);
        }
        if !appointment.status.can_transition_to(status) {
            return Err(AssignmentValidationError::InvalidTransition {
                from: appointment.status,
                to: status,
            }
            .into());
        }

        appointment.status = status;
        self.repository.save_appointment(&appointment).await?;
        info!(study_id = %study, appointment_id = %appointment.id, %status, "appointment status updated");
        Ok(appointment)
    }

    /// Record a cancellation beside the appointment, optionally freeing the slot.
    pub async fn cancel(
        &self,
        request: CancellationRequest,
    ) -> Result<CancellationRecord, AssignmentError> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(AssignmentValidationError::MissingReason.into());
        }

        let appointment = self
            .load_appointment(request.study_id, request.appointment_id)
            .await?;
        let record = CancellationRecord {
            study_id: request.study_id,
            appointment_id: appointment.id,
            volunteer_id: appointment.volunteer_id,
            date: request.date,
            reason: reason.to_string(),
            party: request.party,
        };
        let record = self.repository.record_cancellation(&record).await?;
        info!(study_id = %record.study_id, appointment_id = %record.appointment_id, "cancellation recorded");

        if request.release && !appointment.is_available() {
            self.release(appointment).await?;
        }
        Ok(record)
    }

    /// Cancellation history for a volunteer, most recent first.
    pub async fn cancellations_for(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<CancellationRecord>, AssignmentError> {
        let mut records = self.repository.cancellations_for_volunteer(volunteer).await?;
        records.sort_by(|left, right| right.date.cmp(&left.date));
        Ok(records)
    }

    pub async fn schedule(&self, study: StudyId) -> Result<Vec<DaySchedule>, AssignmentError> {
        let appointments = self.repository.appointments_for_study(study).await?;
        Ok(group_by_day(appointments))
    }

    /// Study-volunteer associations of a study, ordered by volunteer.
    pub async fn roster(&self, study: StudyId) -> Result<Vec<StudyVolunteer>, AssignmentError> {
        let mut associations = self.repository.associations_for_study(study).await?;
        associations.sort_by_key(|association| association.volunteer_id);
        Ok(associations)
    }

    async fn release(&self, mut appointment: Appointment) -> Result<UnassignOutcome, AssignmentError> {
        let Some(volunteer_id) = appointment.volunteer_id.take() else {
            return Ok(UnassignOutcome {
                appointment,
                volunteer_id: None,
                association_deleted: false,
            });
        };

        self.repository.save_appointment(&appointment).await?;
        let association_deleted = self.reconcile(appointment.study_id, volunteer_id).await?;
        info!(
            study_id = %appointment.study_id,
            appointment_id = %appointment.id,
            volunteer_id = %volunteer_id,
            association_deleted,
            "appointment unassigned"
        );

        Ok(UnassignOutcome {
            appointment,
            volunteer_id: Some(volunteer_id),
            association_deleted,
        })
    }

    /// Create the association for the pair if none exists. Returns whether one was created.
    async fn ensure_association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
        group: &Group,
    ) -> Result<bool, AssignmentError> {
        if self.repository.association(study, volunteer).await?.is_some() {
            return Ok(false);
        }

        let association = StudyVolunteer::enroll(study, volunteer, group);
        self.repository.create_association(&association).await?;
        info!(study_id = %study, volunteer_id = %volunteer, incentive = group.incentive, "association created");
        Ok(true)
    }

    /// Delete the association when no appointment of the study still references
    /// the volunteer. Must run after the mutation that may have freed the last one.
    async fn reconcile(&self, study: StudyId, volunteer: VolunteerId) -> Result<bool, AssignmentError> {
        let still_assigned = self
            .repository
            .appointments_for_study(study)
            .await?
            .iter()
            .any(|appointment| appointment.volunteer_id == Some(volunteer));
        if still_assigned {
            return Ok(false);
        }
        if self.repository.association(study, volunteer).await?.is_none() {
            return Ok(false);
        }

        self.repository.delete_association(study, volunteer).await?;
        info!(study_id = %study, volunteer_id = %volunteer, "association deleted");
        Ok(true)
    }

    async fn overlaps(&self, study: StudyId, volunteer: VolunteerId) -> Vec<Warning> {
        match self.repository.overlap_warnings(study, volunteer).await {
            Ok(warnings) => warnings,
            Err(error) => {
                warn!(study_id = %study, volunteer_id = %volunteer, %error, "overlap check unavailable");
                Vec::new()
            }
        }
    }

    async fn load_appointment(
        &self,
        study: StudyId,
        id: AppointmentId,
    ) -> Result<Appointment, AssignmentError> {
        self.repository
            .appointment(study, id)
            .await?
            .ok_or(AssignmentError::NotFound(MissingEntity::Appointment(id)))
    }

    async fn load_group(&self, study: StudyId, id: GroupId) -> Result<Group, AssignmentError> {
        let group = self
            .repository
            .group(id)
            .await?
            .ok_or(AssignmentError::NotFound(MissingEntity::Group(id)))?;
        if group.study_id != study {
            return Err(AssignmentValidationError::GroupOutsideStudy { group: id, study }.into());
        }
        Ok(group)
    }

    async fn load_volunteer(&self, id: VolunteerId) -> Result<Volunteer, AssignmentError> {
        let volunteer = self
            .directory
            .volunteer(id)
            .await?
            .ok_or(AssignmentError::NotFound(MissingEntity::Volunteer(id)))?;
        if volunteer.archived {
            return Err(AssignmentValidationError::ArchivedVolunteer(id).into());
        }
        Ok(volunteer)
    }
}

fn failure(pair: AssignmentPair, error: String) -> BulkFailure {
    BulkFailure {
        appointment_id: pair.appointment_id,
        volunteer_id: pair.volunteer_id,
        error,
    }
}

fn consolidated_message(report: &BulkAssignmentReport) -> String {
    let requested = report.assigned.len() + report.failures.len() + report.needs_confirmation.len();
    let mut message = format!("{} of {} appointments assigned", report.assigned.len(), requested);
    if !report.failures.is_empty() {
        message.push_str(&format!("; {} failed", report.failures.len()));
    }
    if !report.needs_confirmation.is_empty() {
        message.push_str(&format!(
            "; {} awaiting phototype confirmation",
            report.needs_confirmation.len()
        ));
    }

    let mut by_kind: BTreeMap<WarningKind, Vec<&str>> = BTreeMap::new();
    for warning in &report.warnings {
        by_kind.entry(warning.kind).or_default().push(&warning.message);
    }
    for messages in by_kind.values() {
        message.push_str(". ");
        message.push_str(&messages.join("; "));
    }
    message
}
