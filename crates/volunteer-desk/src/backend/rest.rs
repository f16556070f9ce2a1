use axum::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::wire::{self, WireError};
use super::BackendError;
use crate::config::BackendConfig;
use crate::workflows::matching::directory::{
    ContactError, ContactMessage, ContactPublisher, DirectoryError, Page, VolunteerDirectory,
};
use crate::workflows::scheduling::repository::{
    RepositoryError, SchedulingRepository, WriteReceipt,
};
use crate::workflows::scheduling::{
    Appointment, AppointmentId, CancellationRecord, Group, GroupId, StudyId, StudyVolunteer,
    Warning, WarningKind,
};
use crate::workflows::volunteers::{HabitRecord, Volunteer, VolunteerId};

/// Client for the study administration backend. Implements every collaborator
/// trait the services need, so one instance is shared between them.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or(BackendError::MissingBaseUrl)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| BackendError::Http {
                path: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and decode the JSON answer. An empty body reads as `null`;
    /// a 404 reads as `None`.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, BackendError> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let http_error = |source| BackendError::Http {
            path: path.to_string(),
            source,
        };
        let response = request.send().await.map_err(http_error)?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "backend call");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Value::Null));
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| BackendError::Decode {
                path: path.to_string(),
                source: WireError::Json(source),
            })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Option<Value>, BackendError> {
        self.call(Method::GET, path, query, None).await
    }

    /// Write that must reach an existing resource; a 404 is an error here.
    async fn write(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, BackendError> {
        self.call(method, path, &[], body)
            .await?
            .ok_or_else(|| BackendError::Status {
                path: path.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            })
    }

    /// Decode every entry of a listing, skipping (and logging) records that do not decode.
    fn decode_all<T>(
        &self,
        path: &str,
        entries: Vec<Value>,
        decode: impl Fn(&Value) -> Result<T, WireError>,
    ) -> Vec<T> {
        entries
            .iter()
            .filter_map(|entry| match decode(entry) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(path, %error, "skipping undecodable backend record");
                    None
                }
            })
            .collect()
    }

    async fn listing(&self, path: &str, query: &[(&str, String)]) -> Result<Page<Value>, BackendError> {
        let value = self.get(path, query).await?.unwrap_or(Value::Null);
        wire::listing(value)
            .map(wire::Listing::into_page)
            .map_err(|source| BackendError::Decode {
                path: path.to_string(),
                source,
            })
    }

    fn decode_one<T>(
        path: &str,
        value: Option<Value>,
        decode: impl Fn(&Value) -> Result<T, WireError>,
    ) -> Result<Option<T>, BackendError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(&value).map(Some).map_err(|source| BackendError::Decode {
                path: path.to_string(),
                source,
            }),
        }
    }
}

#[async_trait]
impl VolunteerDirectory for RestBackend {
    async fn volunteer_page(&self, page: u32, size: u32) -> Result<Page<Volunteer>, DirectoryError> {
        let path = "volontaires";
        let listing = self
            .listing(path, &[("page", page.to_string()), ("size", size.to_string())])
            .await?;
        Ok(Page {
            content: self.decode_all(path, listing.content, wire::volunteer),
            total_elements: listing.total_elements,
            last: listing.last,
        })
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, DirectoryError> {
        let path = format!("volontaires/{id}");
        let value = self.get(&path, &[]).await?;
        Ok(Self::decode_one(&path, value, wire::volunteer)?)
    }

    async fn habit_records(&self) -> Result<Vec<HabitRecord>, DirectoryError> {
        let path = "volontaires-habitudes";
        let listing = self.listing(path, &[]).await?;
        Ok(self.decode_all(path, listing.content, wire::habit_record))
    }
}

#[async_trait]
impl ContactPublisher for RestBackend {
    async fn publish(&self, message: ContactMessage) -> Result<(), ContactError> {
        let body = wire::contact_body(&message);
        self.write(Method::POST, "emails/bulk", Some(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl SchedulingRepository for RestBackend {
    async fn appointment(
        &self,
        study: StudyId,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let path = format!("rdvs/{study}/{id}");
        let value = self.get(&path, &[]).await?;
        Ok(Self::decode_one(&path, value, |value| wire::appointment(value, study))?)
    }

    async fn appointments_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let path = format!("rdvs/etude/{study}");
        let listing = self.listing(&path, &[]).await?;
        Ok(self.decode_all(&path, listing.content, |value| wire::appointment(value, study)))
    }

    async fn save_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<WriteReceipt, RepositoryError> {
        let path = format!("rdvs/{}/{}", appointment.study_id, appointment.id);
        let body = wire::appointment_body(appointment);
        let response = self.write(Method::PUT, &path, Some(&body)).await?;
        Ok(WriteReceipt {
            warnings: wire::warnings(&response, WarningKind::Backend),
        })
    }

    async fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let path = format!("groupes/{id}");
        let value = self.get(&path, &[]).await?;
        Ok(Self::decode_one(&path, value, wire::group)?)
    }

    async fn association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Option<StudyVolunteer>, RepositoryError> {
        let exists = self
            .get(
                "etude-volontaires/exists",
                &[
                    ("idEtude", study.to_string()),
                    ("idVolontaire", volunteer.to_string()),
                ],
            )
            .await?;
        if !matches!(exists, Some(Value::Bool(true))) {
            return Ok(None);
        }

        let associations = self.associations_for_study(study).await?;
        Ok(associations
            .into_iter()
            .find(|association| association.volunteer_id == volunteer))
    }

    async fn associations_for_study(
        &self,
        study: StudyId,
    ) -> Result<Vec<StudyVolunteer>, RepositoryError> {
        let path = format!("etude-volontaires/etude/{study}");
        let listing = self.listing(&path, &[]).await?;
        Ok(self.decode_all(&path, listing.content, wire::association))
    }

    async fn create_association(
        &self,
        association: &StudyVolunteer,
    ) -> Result<(), RepositoryError> {
        let body = wire::association_body(association);
        self.write(Method::POST, "etude-volontaires", Some(&body))
            .await?;
        Ok(())
    }

    async fn delete_association(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<(), RepositoryError> {
        let path = format!("etude-volontaires/{study}/{volunteer}");
        self.write(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn overlap_warnings(
        &self,
        study: StudyId,
        volunteer: VolunteerId,
    ) -> Result<Vec<Warning>, RepositoryError> {
        let value = self
            .get(
                "etude-volontaires/chevauchements",
                &[
                    ("idEtude", study.to_string()),
                    ("idVolontaire", volunteer.to_string()),
                ],
            )
            .await?
            .unwrap_or(Value::Null);
        Ok(wire::warnings(&value, WarningKind::Overlap))
    }

    async fn record_cancellation(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, RepositoryError> {
        let body = wire::cancellation_body(record);
        let response = self.write(Method::POST, "annulations", Some(&body)).await?;
        // Some deployments answer with an empty body.
        Ok(wire::cancellation(&response).unwrap_or_else(|_| record.clone()))
    }

    async fn cancellations_for_volunteer(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<CancellationRecord>, RepositoryError> {
        let path = format!("annulations/volontaire/{volunteer}");
        let listing = self.listing(&path, &[]).await?;
        Ok(self.decode_all(&path, listing.content, wire::cancellation))
    }
}
