use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::matching::directory::{DirectoryError, Page, VolunteerDirectory};
use crate::workflows::scheduling::repository::{
    RepositoryError, SchedulingRepository, WriteReceipt,
};
use crate::workflows::scheduling::{
    Appointment, AppointmentId, AppointmentStatus, AssignmentService, CancellationRecord, Group,
    GroupId, StudyId, StudyVolunteer, Warning, WarningKind,
};
use crate::workflows::volunteers::{
    EvaluationScores, HabitRecord, Phototype, Sex, Volunteer, VolunteerId,
};

pub(super) const STUDY: StudyId = StudyId(7);
pub(super) const GROUP: GroupId = GroupId(3);

pub(super) fn slot(id: i64, time: &str) -> Appointment {
    Appointment {
        id: AppointmentId(id),
        study_id: STUDY,
        date: NaiveDate::from_ymd_opt(2026, 9, 14),
        time: Some(time.to_string()),
        status: AppointmentStatus::Planned,
        volunteer_id: None,
        group_id: None,
        comment: None,
    }
}

pub(super) fn assigned(id: i64, volunteer: i64) -> Appointment {
    Appointment {
        volunteer_id: Some(VolunteerId(volunteer)),
        group_id: Some(GROUP),
        ..slot(id, "10h00")
    }
}

pub(super) fn group(incentive: u32, eligible: Option<&str>) -> Group {
    Group {
        id: GROUP,
        study_id: STUDY,
        label: "Peaux sensibles".to_string(),
        incentive,
        eligible_phototypes: eligible.map(str::to_string),
    }
}

pub(super) fn person(id: i64, phototype: u8) -> Volunteer {
    Volunteer {
        id: VolunteerId(id),
        last_name: format!("Bernard{id}"),
        first_name: "Lea".to_string(),
        email: Some(format!("lea{id}@example.org")),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 4),
        sex: Some(Sex::Feminine),
        phototype: Phototype::new(phototype),
        ethnicity: None,
        ethnicity_detail: None,
        skin_type: None,
        skin_sensitivity: None,
        evaluations: EvaluationScores::default(),
        archived: false,
    }
}

pub(super) fn association(volunteer: i64) -> StudyVolunteer {
    StudyVolunteer::enroll(STUDY, VolunteerId(volunteer), &group(50, None))
}

#[derive(Default)]
pub(super) struct State {
    pub(super) appointments: BTreeMap<(StudyId, AppointmentId), Appointment>,
    pub(super) groups: HashMap<GroupId, Group>,
    pub(super) associations: BTreeMap<(StudyId, VolunteerId), StudyVolunteer>,
    pub(super) cancellations: Vec<CancellationRecord>,
    pub(super) overlaps: HashMap<VolunteerId, String>,
    pub(super) save_warnings: HashMap<AppointmentId, String>,
    pub(super) failing_saves: HashSet<AppointmentId>,
}

#[derive(Default)]
pub(super) struct MemoryScheduling {
    pub(super) state: Mutex<State>,
    pub(super) saves: AtomicUsize,
    pub(super) deletions: AtomicUsize,
}

impl MemoryScheduling {
    pub(super) fn seeded(appointments: Vec<Appointment>, groups: Vec<Group>) -> Self {
        let repository = Self::default();
        {
            let mut state = repository.state();
            for appointment in appointments {
                state
                    .appointments
                    .insert((appointment.study_id, appointment.id), appointment);
            }
            for group in groups {
                state.groups.insert(group.id, group);
            }
        }
        repository
    }

    pub(super) fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("scheduling mutex poisoned")
    }

    pub(super) fn stored(&self, id: i64) -> Appointment {
        self.state()
            .appointments
            .get(&(STUDY, AppointmentId(id)))
            .cloned()
            .expect("appointment stored")
    }

    pub(super) fn associated(&self, volunteer: i64) -> Option<StudyVolunteer> {
        self.state()
            .associations
            .get(&(STUDY, VolunteerId(volunteer)))
            .cloned()
    }

    pub(super) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulingRepository for MemoryScheduling {
    async fn appointment(
        &self,
        study: StudyId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        Ok(self.state().appointments.get(&(study, id)).cloned())
    }

    async fn appointments_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        Ok(self
            .state()
            .appointments
            .values()
            .filter(|appointment| appointment.study_id == study)
            .cloned()
            .collect())
    }

    async fn save_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<WriteReceipt, RepositoryError> {
        let mut state = self.state();
        if state.failing_saves.contains(&appointment.id) {
            return Err(RepositoryError::Unavailable(format!(
                "appointment {} write timed out",
                appointment.id
            )));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        state
            .appointments
            .insert((appointment.study_id, appointment.id), appointment.clone());
        let warnings = state
            .save_warnings
            .get(&appointment.id)
            .map(|message| vec![Warning::new(WarningKind::Backend, message.clone())])
            .unwrap_or_default();
        Ok(WriteReceipt { warnings })
    }

    async fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        Ok(self.state().groups.get(&id).cloned())
    }

    async fn association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Option<StudyVolunteer>, RepositoryError> {
        Ok(self.state().associations.get(&(study, volunteer)).cloned())
    }

    async fn associations_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<StudyVolunteer>, RepositoryError> {
        Ok(self
            .state()
            .associations
            .values()
            .filter(|association| association.study_id == study)
            .cloned()
            .collect())
    }

    async fn create_association(
        &self,
        association: &StudyVolunteer,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let key = (association.study_id, association.volunteer_id);
        if state.associations.contains_key(&key) {
            return Err(RepositoryError::Conflict("association exists".to_string()));
        }
        state.associations.insert(key, association.clone());
        Ok(())
    }

    async fn delete_association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<(), RepositoryError> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        self.state()
            .associations
            .remove(&(study, volunteer))
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("association {study}/{volunteer}")))
    }

    async fn overlap_warnings(
        &self,
        _study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Vec<Warning>, RepositoryError> {
        Ok(self
            .state()
            .overlaps
            .get(&volunteer)
            .map(|message| vec![Warning::new(WarningKind::Overlap, message.clone())])
            .unwrap_or_default())
    }

    async fn record_cancellation(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, RepositoryError> {
        self.state().cancellations.push(record.clone());
        Ok(record.clone())
    }

    async fn cancellations_for_volunteer(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<CancellationRecord>, RepositoryError> {
        Ok(self
            .state()
            .cancellations
            .iter()
            .filter(|record| record.volunteer_id == Some(volunteer))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct People {
    volunteers: Vec<Volunteer>,
}

impl People {
    pub(super) fn of(volunteers: Vec<Volunteer>) -> Self {
        Self { volunteers }
    }
}

#[async_trait]
impl VolunteerDirectory for People {
    async fn volunteer_page(&self, _page: u32, _size: u32) -> Result<Page<Volunteer>, DirectoryError> {
        Ok(Page::complete(self.volunteers.clone()))
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, DirectoryError> {
        Ok(self.volunteers.iter().find(|volunteer| volunteer.id == id).cloned())
    }

    async fn habit_records(&self) -> Result<Vec<HabitRecord>, DirectoryError> {
        Ok(Vec::new())
    }
}

pub(super) fn build_service(
    repository: MemoryScheduling,
    people: Vec<Volunteer>,
) -> (AssignmentService<MemoryScheduling, People>, Arc<MemoryScheduling>) {
    let repository = Arc::new(repository);
    let service = AssignmentService::new(repository.clone(), Arc::new(People::of(people)));
    (service, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
