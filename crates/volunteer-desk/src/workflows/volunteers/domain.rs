use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::normalize::{fold, is_affirmative};

/// Identifier wrapper for volunteers as issued by the study backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolunteerId(pub i64);

impl fmt::Display for VolunteerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical sex values used for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "MASCULIN")]
    Masculine,
    #[serde(rename = "FEMININ")]
    Feminine,
}

impl Sex {
    pub const fn label(self) -> &'static str {
        match self {
            Sex::Masculine => "MASCULIN",
            Sex::Feminine => "FEMININ",
        }
    }
}

/// Fitzpatrick phototype, I through VI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Phototype(u8);

impl Phototype {
    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= 6 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn roman(self) -> &'static str {
        match self.0 {
            1 => "I",
            2 => "II",
            3 => "III",
            4 => "IV",
            5 => "V",
            _ => "VI",
        }
    }
}

impl TryFrom<u8> for Phototype {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Phototype::new(value).ok_or_else(|| format!("phototype {value} outside I-VI"))
    }
}

impl From<Phototype> for u8 {
    fn from(value: Phototype) -> Self {
        value.0
    }
}

impl fmt::Display for Phototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical ethnic categories; sub-variants collapse onto their category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthnicGroup {
    Caucasian,
    African,
    Caribbean,
    NorthAfrican,
    Asian,
    Indian,
    Hispanic,
    MiddleEastern,
    Mixed,
    Other(String),
}

impl EthnicGroup {
    pub fn label(&self) -> &str {
        match self {
            EthnicGroup::Caucasian => "caucasian",
            EthnicGroup::African => "african",
            EthnicGroup::Caribbean => "caribbean",
            EthnicGroup::NorthAfrican => "north_african",
            EthnicGroup::Asian => "asian",
            EthnicGroup::Indian => "indian",
            EthnicGroup::Hispanic => "hispanic",
            EthnicGroup::MiddleEastern => "middle_eastern",
            EthnicGroup::Mixed => "mixed",
            EthnicGroup::Other(value) => value,
        }
    }
}

/// The five named axes staff use to rate a volunteer after a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationAxis {
    Global,
    Punctuality,
    Involvement,
    Comprehension,
    Reliability,
}

impl EvaluationAxis {
    pub const fn ordered() -> [EvaluationAxis; 5] {
        [
            EvaluationAxis::Global,
            EvaluationAxis::Punctuality,
            EvaluationAxis::Involvement,
            EvaluationAxis::Comprehension,
            EvaluationAxis::Reliability,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            EvaluationAxis::Global => "global",
            EvaluationAxis::Punctuality => "punctuality",
            EvaluationAxis::Involvement => "involvement",
            EvaluationAxis::Comprehension => "comprehension",
            EvaluationAxis::Reliability => "reliability",
        }
    }
}

/// Evaluation scores on a 0-5 scale; `None` means the axis was never rated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationScores {
    #[serde(default, alias = "globale")]
    pub global: Option<u8>,
    #[serde(default, alias = "ponctualite")]
    pub punctuality: Option<u8>,
    #[serde(default, alias = "implication")]
    pub involvement: Option<u8>,
    #[serde(default)]
    pub comprehension: Option<u8>,
    #[serde(default, alias = "fiabilite")]
    pub reliability: Option<u8>,
}

impl EvaluationScores {
    pub fn get(&self, axis: EvaluationAxis) -> Option<u8> {
        match axis {
            EvaluationAxis::Global => self.global,
            EvaluationAxis::Punctuality => self.punctuality,
            EvaluationAxis::Involvement => self.involvement,
            EvaluationAxis::Comprehension => self.comprehension,
            EvaluationAxis::Reliability => self.reliability,
        }
    }

    pub fn set(&mut self, axis: EvaluationAxis, value: Option<u8>) {
        let slot = match axis {
            EvaluationAxis::Global => &mut self.global,
            EvaluationAxis::Punctuality => &mut self.punctuality,
            EvaluationAxis::Involvement => &mut self.involvement,
            EvaluationAxis::Comprehension => &mut self.comprehension,
            EvaluationAxis::Reliability => &mut self.reliability,
        };
        *slot = value.filter(|score| *score <= 5);
    }
}

/// Volunteer record after backend field drift has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: VolunteerId,
    pub last_name: String,
    pub first_name: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub phototype: Option<Phototype>,
    pub ethnicity: Option<EthnicGroup>,
    pub ethnicity_detail: Option<String>,
    pub skin_type: Option<String>,
    pub skin_sensitivity: Option<String>,
    pub evaluations: EvaluationScores,
    pub archived: bool,
}

impl Volunteer {
    /// Age in completed years on `today`; `None` without a usable birth date.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if birth > today {
            return None;
        }

        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            ("", "") => format!("volunteer {}", self.id),
            ("", last) => last.to_string(),
            (first, "") => first.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }
}

/// Cosmetic-habit answers for one volunteer keyed by folded product label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub volunteer_id: VolunteerId,
    pub answers: BTreeMap<String, bool>,
}

impl HabitRecord {
    pub fn new(volunteer_id: VolunteerId) -> Self {
        Self {
            volunteer_id,
            answers: BTreeMap::new(),
        }
    }

    /// Record a raw answer such as `"Oui"` or `"non"` for a product label.
    pub fn with_answer(mut self, label: &str, raw_answer: &str) -> Self {
        self.answers.insert(fold(label), is_affirmative(raw_answer));
        self
    }

    pub fn with_flag(mut self, label: &str, value: bool) -> Self {
        self.answers.insert(fold(label), value);
        self
    }

    pub fn uses(&self, label: &str) -> bool {
        self.answers.get(&fold(label)).copied().unwrap_or(false)
    }
}

/// Lookup from volunteer id to habit record. The first record seen for an id wins.
#[derive(Debug, Clone, Default)]
pub struct HabitIndex {
    records: HashMap<VolunteerId, HabitRecord>,
}

impl HabitIndex {
    pub fn from_records(records: impl IntoIterator<Item = HabitRecord>) -> Self {
        let mut index = HashMap::new();
        for record in records {
            index.entry(record.volunteer_id).or_insert(record);
        }
        Self { records: index }
    }

    pub fn get(&self, id: VolunteerId) -> Option<&HabitRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volunteer(birth: Option<NaiveDate>) -> Volunteer {
        Volunteer {
            id: VolunteerId(1),
            last_name: "Martin".to_string(),
            first_name: "Claire".to_string(),
            email: None,
            birth_date: birth,
            sex: Some(Sex::Feminine),
            phototype: Phototype::new(2),
            ethnicity: None,
            ethnicity_detail: None,
            skin_type: None,
            skin_sensitivity: None,
            evaluations: EvaluationScores::default(),
            archived: false,
        }
    }

    #[test]
    fn age_counts_completed_years() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid");
        let before_birthday = volunteer(NaiveDate::from_ymd_opt(2000, 3, 15));
        let on_birthday = volunteer(NaiveDate::from_ymd_opt(2000, 3, 14));
        assert_eq!(before_birthday.age_on(today), Some(25));
        assert_eq!(on_birthday.age_on(today), Some(26));
        assert_eq!(volunteer(None).age_on(today), None);
    }

    #[test]
    fn habit_index_keeps_first_record_for_duplicate_ids() {
        let first = HabitRecord::new(VolunteerId(9)).with_answer("Mascara", "oui");
        let second = HabitRecord::new(VolunteerId(9)).with_answer("Mascara", "non");
        let index = HabitIndex::from_records(vec![first, second]);
        assert_eq!(index.len(), 1);
        assert!(index.get(VolunteerId(9)).expect("record").uses("mascara"));
    }

    #[test]
    fn evaluation_scores_drop_out_of_range_values() {
        let mut scores = EvaluationScores::default();
        scores.set(EvaluationAxis::Reliability, Some(9));
        scores.set(EvaluationAxis::Global, Some(4));
        assert_eq!(scores.get(EvaluationAxis::Reliability), None);
        assert_eq!(scores.get(EvaluationAxis::Global), Some(4));
    }
}
