//! Mapping between backend JSON and the canonical domain records.
//!
//! The backend grew over several years and the same concept is spelled
//! differently depending on the endpoint (`idVol`, `id`, `volontaireId`...),
//! numbers sometimes arrive as strings, and listings come either as a bare
//! array or wrapped in a paginated envelope. Every decode goes through
//! [`Fields`], which looks keys up by their known aliases in order.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::workflows::matching::directory::{ContactMessage, Page};
use crate::workflows::scheduling::{
    Appointment, AppointmentId, AppointmentStatus, CancellationRecord, CancellingParty,
    EnrollmentStatus, Group, GroupId, StudyId, StudyVolunteer, Warning, WarningKind,
};
use crate::workflows::volunteers::normalize::{
    fold, is_affirmative, parse_ethnicity, parse_phototype, parse_sex,
};
use crate::workflows::volunteers::{
    EvaluationAxis, EvaluationScores, HabitRecord, Volunteer, VolunteerId,
};

const VOLUNTEER_ID: &[&str] = &["idVol", "idVolontaire", "volontaireId", "id"];
const STUDY_ID: &[&str] = &["idEtude", "etudeId"];
const GROUP_ID: &[&str] = &["idGroupe", "groupeId"];
const APPOINTMENT_ID: &[&str] = &["idRdv", "rdvId", "id"];

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("payload does not have the expected shape")]
    Json(#[source] serde_json::Error),
}

/// Paginated envelope or bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(Envelope<T>),
    Bare(Vec<T>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub last: Option<bool>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
}

impl<T> Listing<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            Listing::Bare(content) => Page::complete(content),
            Listing::Paged(envelope) => {
                let last = envelope.last.unwrap_or_else(|| {
                    match (envelope.number, envelope.total_pages) {
                        (Some(number), Some(total)) => number + 1 >= total,
                        _ => false,
                    }
                });
                Page {
                    content: envelope.content,
                    total_elements: envelope.total_elements,
                    last,
                }
            }
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.into_page().content
    }
}

pub fn listing(value: Value) -> Result<Listing<Value>, WireError> {
    if value.is_null() {
        return Ok(Listing::Bare(Vec::new()));
    }
    serde_json::from_value(value).map_err(WireError::Json)
}

/// Alias-aware view over one JSON object.
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn of(value: &'a Value) -> Result<Self, WireError> {
        value
            .as_object()
            .map(|map| Self { map })
            .ok_or(WireError::NotAnObject)
    }

    /// First non-null value among `keys`.
    pub fn raw(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.map.get(*key))
            .find(|value| !value.is_null())
    }

    pub fn text(&self, keys: &[&str]) -> Option<String> {
        match self.raw(keys)? {
            Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        let value: f64 = match self.raw(keys)? {
            Value::Number(number) => number.as_f64()?,
            Value::String(text) => text.trim().replace(',', ".").parse().ok()?,
            _ => return None,
        };
        Some(value).filter(|value| value.is_finite())
    }

    pub fn integer(&self, keys: &[&str]) -> Option<i64> {
        match self.raw(keys)? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, keys: &[&str]) -> bool {
        match self.raw(keys) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(number)) => number.as_f64().map_or(false, |value| value != 0.0),
            Some(Value::String(text)) => is_affirmative(text),
            _ => false,
        }
    }

    pub fn date(&self, keys: &[&str]) -> Option<NaiveDate> {
        self.text(keys).as_deref().and_then(parse_date)
    }

    fn required(&self, keys: &[&str], name: &'static str) -> Result<i64, WireError> {
        self.integer(keys).ok_or(WireError::MissingField(name))
    }
}

/// `2026-03-14`, `2026-03-14T09:00:00` or `14/03/2026`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text.get(..19)?, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|moment| moment.date())
        })
}

fn score(fields: &Fields<'_>, keys: &[&str]) -> Option<u8> {
    fields
        .number(keys)
        .map(f64::round)
        .filter(|value| (0.0..=5.0).contains(value))
        .map(|value| value as u8)
}

pub fn volunteer(value: &Value) -> Result<Volunteer, WireError> {
    let fields = Fields::of(value)?;
    let id = fields.required(VOLUNTEER_ID, "idVol")?;

    let mut evaluations = EvaluationScores::default();
    for (axis, keys) in [
        (EvaluationAxis::Global, &["notes", "noteGlobale", "globale"][..]),
        (EvaluationAxis::Punctuality, &["ponctualite", "notePonctualite"][..]),
        (EvaluationAxis::Involvement, &["implication", "noteImplication"][..]),
        (EvaluationAxis::Comprehension, &["comprehension", "noteComprehension"][..]),
        (EvaluationAxis::Reliability, &["fiabilite", "noteFiabilite"][..]),
    ] {
        evaluations.set(axis, score(&fields, keys));
    }

    let ethnicity_text = fields.text(&["ethnie", "ethnicite"]);
    Ok(Volunteer {
        id: VolunteerId(id),
        last_name: fields.text(&["nomVol", "nom"]).unwrap_or_default(),
        first_name: fields.text(&["prenomVol", "prenom"]).unwrap_or_default(),
        email: fields.text(&["emailVol", "email", "mail"]),
        birth_date: fields.date(&["dateNaissance", "dateNaissanceVol"]),
        sex: fields.text(&["sexe", "sexeVol"]).as_deref().and_then(parse_sex),
        phototype: fields.text(&["phototype", "phototypeVol"]).as_deref().and_then(parse_phototype),
        ethnicity: ethnicity_text.as_deref().and_then(parse_ethnicity),
        ethnicity_detail: fields.text(&["sousEthnie", "ethnieDetail"]),
        skin_type: fields.text(&["typePeauVisage", "typePeau"]),
        skin_sensitivity: fields.text(&["sensibiliteCutanee", "peauSensible"]),
        evaluations,
        archived: fields.flag(&["archive", "archived", "estArchive"]),
    })
}

/// `rougeALevres` and `rouge_a_levres` both read as `rouge a levres`.
fn label_from_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_uppercase() && !spaced.is_empty() {
            spaced.push(' ');
        }
        if ch == '_' || ch == '-' {
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }
    fold(&spaced)
}

/// Habit record: every boolean-ish field other than identifiers is an answer.
pub fn habit_record(value: &Value) -> Result<HabitRecord, WireError> {
    let fields = Fields::of(value)?;
    let id = fields.required(&["idVol", "idVolontaire", "volontaireId"], "idVol")?;
    let mut record = HabitRecord::new(VolunteerId(id));

    for (key, answer) in fields.map {
        if matches!(key.as_str(), "id" | "idVol" | "idVolontaire" | "volontaireId" | "idHabitude") {
            continue;
        }
        let label = label_from_key(key);
        match answer {
            Value::Bool(flag) => record = record.with_flag(&label, *flag),
            Value::String(text) => record = record.with_answer(&label, text),
            _ => {}
        }
    }
    Ok(record)
}

fn status_from_text(text: &str) -> Option<AppointmentStatus> {
    match fold(text).replace([' ', '-'], "_").as_str() {
        "planifie" | "planned" | "prevu" => Some(AppointmentStatus::Planned),
        "confirme" | "confirmed" => Some(AppointmentStatus::Confirmed),
        "en_attente" | "pending" | "attente" => Some(AppointmentStatus::Pending),
        "annule" | "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
        "complete" | "completed" | "termine" | "effectue" => Some(AppointmentStatus::Completed),
        _ => None,
    }
}

pub fn appointment(value: &Value, study: StudyId) -> Result<Appointment, WireError> {
    let fields = Fields::of(value)?;
    let id = fields.required(APPOINTMENT_ID, "idRdv")?;

    Ok(Appointment {
        id: AppointmentId(id),
        study_id: fields.integer(STUDY_ID).map(StudyId).unwrap_or(study),
        date: fields.date(&["date", "dateRdv"]),
        time: fields.text(&["heure", "heureRdv", "time"]),
        status: fields
            .text(&["etat", "statut", "status"])
            .as_deref()
            .and_then(status_from_text)
            .unwrap_or(AppointmentStatus::Planned),
        volunteer_id: fields
            .integer(&["idVolontaire", "idVol", "volontaireId"])
            .map(VolunteerId),
        group_id: fields.integer(GROUP_ID).map(GroupId),
        comment: fields.text(&["commentaires", "commentaire", "comment"]),
    })
}

pub fn appointment_body(appointment: &Appointment) -> Value {
    json!({
        "idRdv": appointment.id,
        "idEtude": appointment.study_id,
        "date": appointment.date,
        "heure": appointment.time,
        "etat": appointment.status.label(),
        "idVolontaire": appointment.volunteer_id,
        "idGroupe": appointment.group_id,
        "commentaires": appointment.comment,
    })
}

/// Incentive in whole units; negative or unparseable amounts count as zero.
fn incentive(fields: &Fields<'_>) -> u32 {
    fields
        .number(&["iv", "indemnite", "incentive"])
        .map(|amount| amount.round().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

pub fn group(value: &Value) -> Result<Group, WireError> {
    let fields = Fields::of(value)?;
    Ok(Group {
        id: GroupId(fields.required(&["idGroupe", "groupeId", "id"], "idGroupe")?),
        study_id: StudyId(fields.required(STUDY_ID, "idEtude")?),
        label: fields
            .text(&["intitule", "libelle", "nom"])
            .unwrap_or_default(),
        incentive: incentive(&fields),
        eligible_phototypes: fields.text(&["phototypes", "phototypesEligibles", "phototype"]),
    })
}

fn enrollment_from_text(text: &str) -> EnrollmentStatus {
    match fold(text).as_str() {
        "confirme" | "confirmed" => EnrollmentStatus::Confirmed,
        "reserve" | "reserved" | "reserviste" => EnrollmentStatus::Reserved,
        "retire" | "withdrawn" | "abandon" => EnrollmentStatus::Withdrawn,
        _ => EnrollmentStatus::Enrolled,
    }
}

fn enrollment_label(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::Enrolled => "INSCRIT",
        EnrollmentStatus::Confirmed => "CONFIRME",
        EnrollmentStatus::Reserved => "RESERVE",
        EnrollmentStatus::Withdrawn => "RETIRE",
    }
}

pub fn association(value: &Value) -> Result<StudyVolunteer, WireError> {
    let fields = Fields::of(value)?;
    Ok(StudyVolunteer {
        study_id: StudyId(fields.required(STUDY_ID, "idEtude")?),
        volunteer_id: VolunteerId(fields.required(&["idVolontaire", "idVol", "volontaireId"], "idVolontaire")?),
        group_id: fields.integer(GROUP_ID).map(GroupId),
        incentive: incentive(&fields),
        subject_number: fields
            .integer(&["numsujet", "numSujet"])
            .and_then(|number| u32::try_from(number).ok()),
        paid: fields.flag(&["paye", "paid"]),
        status: fields
            .text(&["statut", "status"])
            .as_deref()
            .map_or(EnrollmentStatus::Enrolled, enrollment_from_text),
    })
}

pub fn association_body(association: &StudyVolunteer) -> Value {
    let paid = u8::from(association.paid);
    json!({
        "idEtude": association.study_id,
        "idVolontaire": association.volunteer_id,
        "idGroupe": association.group_id,
        "iv": association.incentive,
        "numsujet": association.subject_number,
        "paye": paid,
        "statut": enrollment_label(association.status),
    })
}

fn party_from_text(text: &str) -> CancellingParty {
    match fold(text).as_str() {
        "laboratoire" | "laboratory" | "labo" => CancellingParty::Laboratory,
        "promoteur" | "sponsor" => CancellingParty::Sponsor,
        _ => CancellingParty::Volunteer,
    }
}

fn party_label(party: CancellingParty) -> &'static str {
    match party {
        CancellingParty::Volunteer => "VOLONTAIRE",
        CancellingParty::Laboratory => "LABORATOIRE",
        CancellingParty::Sponsor => "PROMOTEUR",
    }
}

pub fn cancellation(value: &Value) -> Result<CancellationRecord, WireError> {
    let fields = Fields::of(value)?;
    Ok(CancellationRecord {
        study_id: StudyId(fields.required(STUDY_ID, "idEtude")?),
        appointment_id: AppointmentId(fields.required(&["idRdv", "rdvId"], "idRdv")?),
        volunteer_id: fields
            .integer(&["idVolontaire", "idVol", "volontaireId"])
            .map(VolunteerId),
        date: fields
            .date(&["dateAnnulation", "date"])
            .ok_or(WireError::MissingField("dateAnnulation"))?,
        reason: fields
            .text(&["motif", "commentaire", "raison"])
            .unwrap_or_default(),
        party: fields
            .text(&["annulePar", "partie"])
            .as_deref()
            .map_or(CancellingParty::Volunteer, party_from_text),
    })
}

pub fn cancellation_body(record: &CancellationRecord) -> Value {
    json!({
        "idEtude": record.study_id,
        "idRdv": record.appointment_id,
        "idVolontaire": record.volunteer_id,
        "dateAnnulation": record.date,
        "motif": record.reason,
        "annulePar": party_label(record.party),
    })
}

/// Warnings attached to a write: strings or `{ "message": ... }` objects.
pub fn warnings(value: &Value, kind: WarningKind) -> Vec<Warning> {
    let entries = match value {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("warnings") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(message) => Some(message.trim().to_string()),
            Value::Object(_) => Fields::of(entry)
                .ok()
                .and_then(|fields| fields.text(&["message", "libelle", "titre", "ref"])),
            _ => None,
        })
        .filter(|message| !message.is_empty())
        .map(|message| Warning::new(kind, message))
        .collect()
}

pub fn contact_body(message: &ContactMessage) -> Value {
    let recipients: Vec<Value> = message
        .recipients
        .iter()
        .map(|recipient| {
            json!({
                "idVolontaire": recipient.volunteer_id,
                "email": recipient.email,
                "nom": recipient.display_name,
            })
        })
        .collect();

    json!({
        "sujet": message.subject,
        "contenu": message.body,
        "destinataires": recipients,
        "details": message.details,
    })
}
