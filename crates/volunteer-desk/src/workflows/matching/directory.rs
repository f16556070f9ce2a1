use std::collections::BTreeMap;

use axum::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::volunteers::{HabitRecord, Volunteer, VolunteerId};

/// One page of a paginated listing, already unwrapped from whichever envelope
/// the backend used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: Option<u64>,
    pub last: bool,
}

impl<T> Page<T> {
    /// A bare array is a complete, single-page listing.
    pub fn complete(content: Vec<T>) -> Self {
        let total = content.len() as u64;
        Self {
            content,
            total_elements: Some(total),
            last: true,
        }
    }
}

/// Read access to volunteer data for the matching service.
#[async_trait]
pub trait VolunteerDirectory: Send + Sync {
    /// Zero-based page of volunteers.
    async fn volunteer_page(&self, page: u32, size: u32) -> Result<Page<Volunteer>, DirectoryError>;
    async fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, DirectoryError>;
    async fn habit_records(&self) -> Result<Vec<HabitRecord>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("volunteer directory unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected directory payload: {0}")]
    Malformed(String),
}

/// Outbound hook for contacting a matched result set (bulk e-mail adapters).
#[async_trait]
pub trait ContactPublisher: Send + Sync {
    async fn publish(&self, message: ContactMessage) -> Result<(), ContactError>;
}

/// Request body for contacting volunteers after a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub volunteer_ids: Vec<VolunteerId>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// Payload handed to the publisher once recipients are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<ContactRecipient>,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecipient {
    pub volunteer_id: VolunteerId,
    pub display_name: String,
    pub email: String,
}

/// Summary returned to the caller after a bulk contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub sent: usize,
    pub skipped_without_email: Vec<VolunteerId>,
    pub unknown: Vec<VolunteerId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("contact transport unavailable: {0}")]
    Transport(String),
}
