use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::directory::{
    ContactError, ContactMessage, ContactPublisher, ContactReceipt, ContactRecipient,
    ContactRequest, VolunteerDirectory,
};
use super::domain::{FilterValidationError, Filters, MatchReport};
use super::evaluation::{MatchingEngine, ScoringConfig};
use crate::config::MatchingSettings;
use crate::workflows::volunteers::{HabitIndex, Volunteer, VolunteerId};

/// Service composing the volunteer directory, the contact hook and the matching engine.
pub struct MatchingService<D, C> {
    directory: Arc<D>,
    contacts: Arc<C>,
    engine: Arc<MatchingEngine>,
    settings: MatchingSettings,
}

impl<D, C> MatchingService<D, C>
where
    D: VolunteerDirectory + 'static,
    C: ContactPublisher + 'static,
{
    pub fn new(
        directory: Arc<D>,
        contacts: Arc<C>,
        settings: MatchingSettings,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            directory,
            contacts,
            engine: Arc::new(MatchingEngine::new(scoring)),
            settings,
        }
    }

    /// Validate the filters, pull every volunteer and habit record, then rank.
    ///
    /// Sub-fetch failures degrade to whatever was retrieved; only an empty volunteer
    /// listing stops the run.
    pub async fn execute(
        &self,
        filters: &Filters,
        today: NaiveDate,
    ) -> Result<MatchReport, MatchingError> {
        filters.validate()?;

        let mut volunteers = self.fetch_volunteers().await;
        if volunteers.is_empty() {
            return Err(MatchingError::NoVolunteers);
        }

        let habits = match self.directory.habit_records().await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "habit records unavailable; makeup criteria will score zero");
                Vec::new()
            }
        };
        let habits = HabitIndex::from_records(habits);

        if self.settings.refresh_details {
            volunteers = self.refresh_details(volunteers).await;
        }

        debug!(
            volunteers = volunteers.len(),
            habit_records = habits.len(),
            "running matching engine"
        );
        Ok(self.engine.run(&volunteers, &habits, filters, today))
    }

    /// Send one message to every selected volunteer that has an e-mail address.
    pub async fn contact(&self, request: ContactRequest) -> Result<ContactReceipt, MatchingError> {
        if request.volunteer_ids.is_empty() {
            return Err(ContactValidationError::NoRecipients.into());
        }
        if request.subject.trim().is_empty() {
            return Err(ContactValidationError::EmptySubject.into());
        }

        let mut seen = HashSet::new();
        let ids: Vec<VolunteerId> = request
            .volunteer_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut recipients = Vec::new();
        let mut skipped_without_email = Vec::new();
        let mut unknown = Vec::new();

        for batch in ids.chunks(self.batch_size()) {
            let fetched = join_all(batch.iter().map(|id| self.directory.volunteer(*id))).await;
            for (id, outcome) in batch.iter().zip(fetched) {
                match outcome {
                    Ok(Some(volunteer)) if volunteer.archived => unknown.push(*id),
                    Ok(Some(volunteer)) => match volunteer.email.as_deref().map(str::trim) {
                        Some(email) if !email.is_empty() => recipients.push(ContactRecipient {
                            volunteer_id: volunteer.id,
                            display_name: volunteer.display_name(),
                            email: email.to_string(),
                        }),
                        _ => skipped_without_email.push(*id),
                    },
                    Ok(None) => unknown.push(*id),
                    Err(error) => {
                        warn!(volunteer_id = %id, %error, "could not resolve contact recipient");
                        unknown.push(*id);
                    }
                }
            }
        }

        if recipients.is_empty() {
            return Err(ContactValidationError::NoReachableRecipients.into());
        }

        let sent = recipients.len();
        self.contacts
            .publish(ContactMessage {
                subject: request.subject,
                body: request.body,
                recipients,
                details: request.details,
            })
            .await?;

        info!(sent, skipped = skipped_without_email.len(), "bulk contact dispatched");
        Ok(ContactReceipt {
            sent,
            skipped_without_email,
            unknown,
        })
    }

    fn batch_size(&self) -> usize {
        self.settings.detail_batch_size.max(1)
    }

    /// Merge every page into one collection, first occurrence of an id wins.
    /// Stops at the last page, at the advertised total, or at a page that adds nothing.
    async fn fetch_volunteers(&self) -> Vec<Volunteer> {
        let size = self.settings.page_size.max(1);
        let mut seen = HashSet::new();
        let mut volunteers = Vec::new();
        let mut page = 0u32;

        loop {
            let listing = match self.directory.volunteer_page(page, size).await {
                Ok(listing) => listing,
                Err(error) => {
                    warn!(page, %error, "volunteer page fetch failed; keeping pages already retrieved");
                    break;
                }
            };

            let before = volunteers.len();
            for volunteer in listing.content {
                if seen.insert(volunteer.id) {
                    volunteers.push(volunteer);
                }
            }

            let reached_total = listing
                .total_elements
                .map_or(false, |total| volunteers.len() as u64 >= total);
            // A page with no new id means the backend is not paging; stop there.
            if listing.last || volunteers.len() == before || reached_total {
                break;
            }
            page += 1;
        }

        debug!(count = volunteers.len(), pages = page + 1, "volunteers retrieved");
        volunteers
    }

    /// Re-read each volunteer through the detail endpoint in bounded batches.
    /// A volunteer whose detail fetch fails is left out.
    async fn refresh_details(&self, volunteers: Vec<Volunteer>) -> Vec<Volunteer> {
        let mut refreshed = Vec::with_capacity(volunteers.len());

        for batch in volunteers.chunks(self.batch_size()) {
            let fetched = join_all(
                batch
                    .iter()
                    .map(|volunteer| self.directory.volunteer(volunteer.id)),
            )
            .await;

            for (volunteer, outcome) in batch.iter().zip(fetched) {
                match outcome {
                    Ok(Some(detail)) => refreshed.push(detail),
                    Ok(None) => debug!(volunteer_id = %volunteer.id, "volunteer vanished before detail fetch"),
                    Err(error) => {
                        warn!(volunteer_id = %volunteer.id, %error, "volunteer detail fetch failed; excluded from this match")
                    }
                }
            }
        }

        refreshed
    }
}

/// Validation failures for the bulk contact action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactValidationError {
    #[error("select at least one volunteer to contact")]
    NoRecipients,
    #[error("a subject is required")]
    EmptySubject,
    #[error("none of the selected volunteers has a usable e-mail address")]
    NoReachableRecipients,
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error(transparent)]
    Filters(#[from] FilterValidationError),
    #[error(transparent)]
    Contact(#[from] ContactValidationError),
    #[error("no volunteers could be retrieved")]
    NoVolunteers,
    #[error(transparent)]
    Transport(#[from] ContactError),
}
