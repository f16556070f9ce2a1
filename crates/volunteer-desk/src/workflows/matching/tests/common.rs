use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::MatchingSettings;
use crate::workflows::matching::directory::{
    ContactError, ContactMessage, ContactPublisher, DirectoryError, Page, VolunteerDirectory,
};
use crate::workflows::matching::{MatchingService, ScoringConfig};
use crate::workflows::volunteers::{
    EvaluationScores, HabitRecord, Phototype, Sex, Volunteer, VolunteerId,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date")
}

/// Volunteer of the given age on [`today`], phototype 2, female, overall score 4.
pub(super) fn volunteer(id: i64, age: i32) -> Volunteer {
    Volunteer {
        id: VolunteerId(id),
        last_name: format!("Durand{id}"),
        first_name: "Alice".to_string(),
        email: Some(format!("v{id}@example.org")),
        birth_date: NaiveDate::from_ymd_opt(2026 - age, 1, 15),
        sex: Some(Sex::Feminine),
        phototype: Phototype::new(2),
        ethnicity: None,
        ethnicity_detail: None,
        skin_type: Some("mixte".to_string()),
        skin_sensitivity: None,
        evaluations: EvaluationScores {
            global: Some(4),
            ..EvaluationScores::default()
        },
        archived: false,
    }
}

pub(super) fn settings(page_size: u32) -> MatchingSettings {
    MatchingSettings {
        page_size,
        detail_batch_size: 2,
        refresh_details: false,
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    pub(super) volunteers: Vec<Volunteer>,
    pub(super) habits: Vec<HabitRecord>,
    pub(super) failing_pages: HashSet<u32>,
    pub(super) failing_details: HashSet<VolunteerId>,
    pub(super) habits_unavailable: bool,
    /// Serve the first page for every page number, with no end marker.
    pub(super) ignores_paging: bool,
    pub(super) page_calls: AtomicUsize,
    pub(super) detail_calls: AtomicUsize,
}

impl MemoryDirectory {
    pub(super) fn with(volunteers: Vec<Volunteer>) -> Self {
        Self {
            volunteers,
            ..Self::default()
        }
    }

    pub(super) fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub(super) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VolunteerDirectory for MemoryDirectory {
    async fn volunteer_page(&self, page: u32, size: u32) -> Result<Page<Volunteer>, DirectoryError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&page) {
            return Err(DirectoryError::Unavailable(format!("page {page} timed out")));
        }

        let start = if self.ignores_paging { 0 } else { (page * size) as usize };
        let content: Vec<Volunteer> = self
            .volunteers
            .iter()
            .skip(start)
            .take(size as usize)
            .cloned()
            .collect();
        if self.ignores_paging {
            return Ok(Page {
                content,
                total_elements: None,
                last: false,
            });
        }

        let last = start + content.len() >= self.volunteers.len();
        Ok(Page {
            content,
            total_elements: Some(self.volunteers.len() as u64),
            last,
        })
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, DirectoryError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_details.contains(&id) {
            return Err(DirectoryError::Unavailable(format!("volunteer {id} timed out")));
        }
        Ok(self.volunteers.iter().find(|volunteer| volunteer.id == id).cloned())
    }

    async fn habit_records(&self) -> Result<Vec<HabitRecord>, DirectoryError> {
        if self.habits_unavailable {
            return Err(DirectoryError::Unavailable("habits offline".to_string()));
        }
        Ok(self.habits.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryContacts {
    messages: Arc<Mutex<Vec<ContactMessage>>>,
}

impl MemoryContacts {
    pub(super) fn messages(&self) -> Vec<ContactMessage> {
        self.messages.lock().expect("contact mutex poisoned").clone()
    }
}

#[async_trait]
impl ContactPublisher for MemoryContacts {
    async fn publish(&self, message: ContactMessage) -> Result<(), ContactError> {
        self.messages
            .lock()
            .expect("contact mutex poisoned")
            .push(message);
        Ok(())
    }
}

pub(super) struct OfflineContacts;

#[async_trait]
impl ContactPublisher for OfflineContacts {
    async fn publish(&self, _message: ContactMessage) -> Result<(), ContactError> {
        Err(ContactError::Transport("smtp relay down".to_string()))
    }
}

pub(super) fn build_service(
    directory: MemoryDirectory,
    settings: MatchingSettings,
) -> (
    MatchingService<MemoryDirectory, MemoryContacts>,
    Arc<MemoryDirectory>,
    Arc<MemoryContacts>,
) {
    let directory = Arc::new(directory);
    let contacts = Arc::new(MemoryContacts::default());
    let service = MatchingService::new(
        directory.clone(),
        contacts.clone(),
        settings,
        ScoringConfig::default(),
    );
    (service, directory, contacts)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
