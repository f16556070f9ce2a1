use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use volunteer_desk::workflows::matching::{
    ContactError, ContactMessage, ContactPublisher, DirectoryError, Page, VolunteerDirectory,
};
use volunteer_desk::workflows::scheduling::{
    Appointment, AppointmentId, AppointmentStatus, CancellationRecord, Group, GroupId,
    RepositoryError, SchedulingRepository, StudyId, StudyVolunteer, Warning, WriteReceipt,
};
use volunteer_desk::workflows::volunteers::{
    EthnicGroup, EvaluationScores, HabitRecord, Phototype, Sex, Volunteer, VolunteerId,
};

use axum::async_trait;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDirectory {
    volunteers: Arc<Vec<Volunteer>>,
    habits: Arc<Vec<HabitRecord>>,
}

impl InMemoryDirectory {
    pub(crate) fn new(volunteers: Vec<Volunteer>, habits: Vec<HabitRecord>) -> Self {
        Self {
            volunteers: Arc::new(volunteers),
            habits: Arc::new(habits),
        }
    }

    pub(crate) fn seeded() -> Self {
        Self::new(seed_volunteers(), seed_habits())
    }
}

#[async_trait]
impl VolunteerDirectory for InMemoryDirectory {
    async fn volunteer_page(&self, page: u32, size: u32) -> Result<Page<Volunteer>, DirectoryError> {
        let size = size.max(1) as usize;
        let start = page as usize * size;
        let content: Vec<Volunteer> = self.volunteers.iter().skip(start).take(size).cloned().collect();
        Ok(Page {
            last: start + content.len() >= self.volunteers.len(),
            total_elements: Some(self.volunteers.len() as u64),
            content,
        })
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, DirectoryError> {
        Ok(self.volunteers.iter().find(|volunteer| volunteer.id == id).cloned())
    }

    async fn habit_records(&self) -> Result<Vec<HabitRecord>, DirectoryError> {
        Ok(self.habits.as_ref().clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryContacts {
    messages: Arc<Mutex<Vec<ContactMessage>>>,
}

#[async_trait]
impl ContactPublisher for InMemoryContacts {
    async fn publish(&self, message: ContactMessage) -> Result<(), ContactError> {
        let mut guard = self.messages.lock().expect("contact mutex poisoned");
        guard.push(message);
        Ok(())
    }
}

#[derive(Default)]
struct SchedulingState {
    appointments: BTreeMap<(StudyId, AppointmentId), Appointment>,
    groups: HashMap<GroupId, Group>,
    associations: BTreeMap<(StudyId, VolunteerId), StudyVolunteer>,
    cancellations: Vec<CancellationRecord>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryScheduling {
    state: Arc<Mutex<SchedulingState>>,
}

impl InMemoryScheduling {
    pub(crate) fn seeded() -> Self {
        let repository = Self::default();
        {
            let mut guard = repository.state.lock().expect("scheduling mutex poisoned");
            for appointment in seed_appointments() {
                guard
                    .appointments
                    .insert((appointment.study_id, appointment.id), appointment);
            }
            for group in seed_groups() {
                guard.groups.insert(group.id, group);
            }
        }
        repository
    }
}

#[async_trait]
impl SchedulingRepository for InMemoryScheduling {
    async fn appointment(
        &self,
        study: StudyId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard.appointments.get(&(study, id)).cloned())
    }

    async fn appointments_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard
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
        let mut guard = self.state.lock().expect("scheduling mutex poisoned");
        let key = (appointment.study_id, appointment.id);
        if !guard.appointments.contains_key(&key) {
            return Err(RepositoryError::NotFound(format!(
                "appointment {}/{}",
                appointment.study_id, appointment.id
            )));
        }
        guard.appointments.insert(key, appointment.clone());
        Ok(WriteReceipt::default())
    }

    async fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard.groups.get(&id).cloned())
    }

    async fn association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Option<StudyVolunteer>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard.associations.get(&(study, volunteer)).cloned())
    }

    async fn associations_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<StudyVolunteer>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard
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
        let mut guard = self.state.lock().expect("scheduling mutex poisoned");
        let key = (association.study_id, association.volunteer_id);
        if guard.associations.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!(
                "association {}/{} already exists",
                key.0, key.1
            )));
        }
        guard.associations.insert(key, association.clone());
        Ok(())
    }

    async fn delete_association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("scheduling mutex poisoned");
        guard
            .associations
            .remove(&(study, volunteer))
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("association {study}/{volunteer}")))
    }

    async fn overlap_warnings(
        &self,
        _study: StudyId,
        _volunteer: VolunteerId,
    ) -> Result<Vec<Warning>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn record_cancellation(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("scheduling mutex poisoned");
        guard.cancellations.push(record.clone());
        Ok(record.clone())
    }

    async fn cancellations_for_volunteer(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<CancellationRecord>, RepositoryError> {
        let guard = self.state.lock().expect("scheduling mutex poisoned");
        Ok(guard
            .cancellations
            .iter()
            .filter(|record| record.volunteer_id == Some(volunteer))
            .cloned()
            .collect())
    }
}

pub(crate) const DEMO_STUDY: StudyId = StudyId(7);
pub(crate) const DEMO_GROUP: GroupId = GroupId(1);

fn seed_volunteer(
    id: i64,
    name: (&str, &str),
    birth: (i32, u32, u32),
    sex: Sex,
    phototype: u8,
    ethnicity: EthnicGroup,
    global: Option<u8>,
) -> Volunteer {
    Volunteer {
        id: VolunteerId(id),
        first_name: name.0.to_string(),
        last_name: name.1.to_string(),
        email: Some(format!(
            "{}.{}@example.org",
            name.0.to_lowercase(),
            name.1.to_lowercase()
        )),
        birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2),
        sex: Some(sex),
        phototype: Phototype::new(phototype),
        ethnicity: Some(ethnicity),
        ethnicity_detail: None,
        skin_type: None,
        skin_sensitivity: None,
        evaluations: EvaluationScores {
            global,
            ..EvaluationScores::default()
        },
        archived: false,
    }
}

pub(crate) fn seed_volunteers() -> Vec<Volunteer> {
    let mut archived = seed_volunteer(
        45,
        ("Jules", "Moreau"),
        (1988, 2, 11),
        Sex::Masculine,
        3,
        EthnicGroup::Caucasian,
        Some(2),
    );
    archived.archived = true;

    vec![
        seed_volunteer(42, ("Claire", "Martin"), (1999, 4, 3), Sex::Feminine, 2, EthnicGroup::Caucasian, Some(4)),
        seed_volunteer(43, ("Awa", "Diallo"), (1992, 9, 21), Sex::Feminine, 5, EthnicGroup::African, Some(5)),
        seed_volunteer(44, ("Lina", "Haddad"), (2001, 12, 1), Sex::Feminine, 3, EthnicGroup::NorthAfrican, None),
        archived,
        seed_volunteer(46, ("Mai", "Nguyen"), (1985, 6, 30), Sex::Feminine, 2, EthnicGroup::Asian, Some(3)),
    ]
}

pub(crate) fn seed_habits() -> Vec<HabitRecord> {
    vec![
        HabitRecord::new(VolunteerId(42))
            .with_answer("mascara", "oui")
            .with_answer("rouge a levres", "oui"),
        HabitRecord::new(VolunteerId(43)).with_answer("fond de teint", "oui"),
        HabitRecord::new(VolunteerId(46))
            .with_answer("mascara", "oui")
            .with_answer("fond de teint", "non"),
    ]
}

fn seed_appointments() -> Vec<Appointment> {
    [(5, "9h00"), (6, "9h30"), (7, "1000"), (8, "14h")]
        .into_iter()
        .map(|(id, time)| Appointment {
            id: AppointmentId(id),
            study_id: DEMO_STUDY,
            date: NaiveDate::from_ymd_opt(2026, 11, 16),
            time: Some(time.to_string()),
            status: AppointmentStatus::Planned,
            volunteer_id: None,
            group_id: Some(DEMO_GROUP),
            comment: None,
        })
        .collect()
}

fn seed_groups() -> Vec<Group> {
    vec![
        Group {
            id: DEMO_GROUP,
            study_id: DEMO_STUDY,
            label: "Peaux claires".to_string(),
            incentive: 50,
            eligible_phototypes: Some("I;II;III".to_string()),
        },
        Group {
            id: GroupId(2),
            study_id: DEMO_STUDY,
            label: "Toutes peaux".to_string(),
            incentive: 40,
            eligible_phototypes: None,
        },
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
