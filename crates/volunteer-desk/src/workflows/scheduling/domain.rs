use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::volunteers::VolunteerId;

macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

backend_id!(
    /// Study identifier.
    StudyId
);
backend_id!(
    /// Appointment (rdv) identifier, unique within its study.
    AppointmentId
);
backend_id!(GroupId);

/// Appointment lifecycle as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "PLANIFIE", alias = "planned")]
    Planned,
    #[serde(rename = "CONFIRME", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "EN_ATTENTE", alias = "pending")]
    Pending,
    #[serde(rename = "ANNULE", alias = "cancelled")]
    Cancelled,
    #[serde(rename = "COMPLETE", alias = "completed")]
    Completed,
}

impl AppointmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Planned => "PLANIFIE",
            AppointmentStatus::Confirmed => "CONFIRME",
            AppointmentStatus::Pending => "EN_ATTENTE",
            AppointmentStatus::Cancelled => "ANNULE",
            AppointmentStatus::Completed => "COMPLETE",
        }
    }

    /// Only cancelled slots refuse a volunteer; completed ones can still be corrected.
    pub const fn accepts_assignment(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Cancelled) => true,
            (Planned, Confirmed) | (Planned, Pending) => true,
            (Pending, Planned) | (Pending, Confirmed) => true,
            (Confirmed, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A bookable slot within a study. `volunteer_id` being empty means the slot is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub study_id: StudyId,
    pub date: Option<NaiveDate>,
    /// Time of day as typed by staff ("9h00", "09:00", "900").
    pub time: Option<String>,
    pub status: AppointmentStatus,
    pub volunteer_id: Option<VolunteerId>,
    pub group_id: Option<GroupId>,
    pub comment: Option<String>,
}

impl Appointment {
    pub fn is_available(&self) -> bool {
        self.volunteer_id.is_none()
    }
}

/// Study group carrying the incentive paid to its volunteers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub study_id: StudyId,
    pub label: String,
    /// Incentive ("iv") in whole currency units.
    pub incentive: u32,
    /// Semicolon separated phototype list, e.g. `"II;III"`. Empty means unrestricted.
    pub eligible_phototypes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[serde(rename = "INSCRIT", alias = "enrolled")]
    Enrolled,
    #[serde(rename = "CONFIRME", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "RESERVE", alias = "reserved")]
    Reserved,
    #[serde(rename = "RETIRE", alias = "withdrawn")]
    Withdrawn,
}

/// Study-volunteer association, keyed by `(study_id, volunteer_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyVolunteer {
    pub study_id: StudyId,
    pub volunteer_id: VolunteerId,
    pub group_id: Option<GroupId>,
    pub incentive: u32,
    pub subject_number: Option<u32>,
    pub paid: bool,
    pub status: EnrollmentStatus,
}

impl StudyVolunteer {
    /// Fresh enrollment created on a volunteer's first appointment in the study.
    pub fn enroll(study_id: StudyId, volunteer_id: VolunteerId, group: &Group) -> Self {
        Self {
            study_id,
            volunteer_id,
            group_id: Some(group.id),
            incentive: group.incentive,
            subject_number: None,
            paid: false,
            status: EnrollmentStatus::Enrolled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellingParty {
    #[serde(rename = "VOLONTAIRE", alias = "volunteer")]
    Volunteer,
    #[serde(rename = "LABORATOIRE", alias = "laboratory")]
    Laboratory,
    #[serde(rename = "PROMOTEUR", alias = "sponsor")]
    Sponsor,
}

/// History entry kept beside the appointment; the appointment itself is not deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub study_id: StudyId,
    pub appointment_id: AppointmentId,
    pub volunteer_id: Option<VolunteerId>,
    pub date: NaiveDate,
    pub reason: String,
    pub party: CancellingParty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Volunteer already enrolled in a study running at the same time.
    Overlap,
    /// Assignment went ahead despite a phototype mismatch.
    PhototypeOverride,
    /// A previously assigned volunteer was removed from the slot.
    Displaced,
    /// Free-form warning returned by the backend with a write.
    Backend,
}

/// Non-blocking conflict surfaced to the operator after a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Drop duplicate warnings, keeping first-seen order.
pub fn dedupe_warnings(warnings: Vec<Warning>) -> Vec<Warning> {
    let mut unique: Vec<Warning> = Vec::with_capacity(warnings.len());
    for warning in warnings {
        if !unique.contains(&warning) {
            unique.push(warning);
        }
    }
    unique
}
