use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::workflows::volunteers::normalize::{fold, parse_ethnicity, parse_phototype, parse_sex};
use crate::workflows::volunteers::{
    EthnicGroup, EvaluationAxis, EvaluationScores, Phototype, Sex, VolunteerId,
};

/// Criteria submitted from the matching screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub demographics: DemographicFilters,
    #[serde(default)]
    pub makeup: MakeupSelection,
    #[serde(default)]
    pub evaluations: EvaluationThresholds,
}

/// Hard demographic filters. Sex, phototype and ethnicity stay as entered so the
/// engine can normalize them the same way it normalizes volunteer records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicFilters {
    #[serde(default = "default_age_min", alias = "ageMin")]
    pub age_min: u32,
    #[serde(default = "default_age_max", alias = "ageMax")]
    pub age_max: u32,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub phototypes: Vec<String>,
    #[serde(default, alias = "ethnies")]
    pub ethnicities: Vec<String>,
}

fn default_age_min() -> u32 {
    0
}

fn default_age_max() -> u32 {
    120
}

impl Default for DemographicFilters {
    fn default() -> Self {
        Self {
            age_min: default_age_min(),
            age_max: default_age_max(),
            sex: None,
            phototypes: Vec::new(),
            ethnicities: Vec::new(),
        }
    }
}

/// Cosmetic-habit labels selected per area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeupSelection {
    #[serde(default, alias = "visage")]
    pub face: Vec<String>,
    #[serde(default, alias = "yeux")]
    pub eyes: Vec<String>,
    #[serde(default, alias = "levres")]
    pub lips: Vec<String>,
}

impl MakeupSelection {
    /// Every selected label across the three areas, folded and de-duplicated,
    /// in selection order.
    pub fn labels(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.face
            .iter()
            .chain(&self.eyes)
            .chain(&self.lips)
            .map(|label| fold(label))
            .filter(|label| !label.is_empty())
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }
}

/// Inclusive bounds on one evaluation axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisRange {
    #[serde(default)]
    pub min: Option<u8>,
    #[serde(default)]
    pub max: Option<u8>,
}

impl AxisRange {
    pub const fn between(min: u8, max: u8) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn admits(&self, score: u8) -> bool {
        self.min.map_or(true, |min| score >= min) && self.max.map_or(true, |max| score <= max)
    }
}

/// Optional thresholds per evaluation axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationThresholds {
    #[serde(default, alias = "globale")]
    pub global: Option<AxisRange>,
    #[serde(default, alias = "ponctualite")]
    pub punctuality: Option<AxisRange>,
    #[serde(default, alias = "implication")]
    pub involvement: Option<AxisRange>,
    #[serde(default)]
    pub comprehension: Option<AxisRange>,
    #[serde(default, alias = "fiabilite")]
    pub reliability: Option<AxisRange>,
}

impl EvaluationThresholds {
    pub fn get(&self, axis: EvaluationAxis) -> Option<AxisRange> {
        match axis {
            EvaluationAxis::Global => self.global,
            EvaluationAxis::Punctuality => self.punctuality,
            EvaluationAxis::Involvement => self.involvement,
            EvaluationAxis::Comprehension => self.comprehension,
            EvaluationAxis::Reliability => self.reliability,
        }
    }

    /// Axes with at least one bound set.
    pub fn configured(&self) -> Vec<(EvaluationAxis, AxisRange)> {
        EvaluationAxis::ordered()
            .into_iter()
            .filter_map(|axis| {
                self.get(axis)
                    .filter(AxisRange::is_configured)
                    .map(|range| (axis, range))
            })
            .collect()
    }
}

/// Validation failures surfaced before any data is fetched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterValidationError {
    #[error("minimum age {min} is greater than maximum age {max}")]
    AgeRangeInverted { min: u32, max: u32 },
    #[error("{} bound {value} is outside the 0-5 scale", .axis.label())]
    EvaluationOutOfScale { axis: EvaluationAxis, value: u8 },
    #[error("{} minimum {min} is greater than maximum {max}", .axis.label())]
    EvaluationRangeInverted {
        axis: EvaluationAxis,
        min: u8,
        max: u8,
    },
}

impl Filters {
    pub fn validate(&self) -> Result<(), FilterValidationError> {
        let demographics = &self.demographics;
        if demographics.age_min > demographics.age_max {
            return Err(FilterValidationError::AgeRangeInverted {
                min: demographics.age_min,
                max: demographics.age_max,
            });
        }

        for (axis, range) in self.evaluations.configured() {
            for value in [range.min, range.max].into_iter().flatten() {
                if value > 5 {
                    return Err(FilterValidationError::EvaluationOutOfScale { axis, value });
                }
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(FilterValidationError::EvaluationRangeInverted { axis, min, max });
                }
            }
        }

        Ok(())
    }

    /// Resolve the free-text demographic criteria into canonical values.
    pub fn criteria(&self) -> NormalizedCriteria {
        let demographics = &self.demographics;
        let sex = demographics.sex.as_deref().and_then(|raw| {
            match fold(raw).as_str() {
                "" | "any" | "tous" | "toutes" | "indifferent" => None,
                _ => Some(parse_sex(raw)),
            }
        });

        NormalizedCriteria {
            age_min: demographics.age_min,
            age_max: demographics.age_max,
            sex,
            phototypes: selection(&demographics.phototypes, parse_phototype),
            ethnicities: selection(&demographics.ethnicities, parse_ethnicity),
            makeup_labels: self.makeup.labels(),
            thresholds: self.evaluations.configured(),
        }
    }
}

fn selection<T: Ord>(raw: &[String], parse: fn(&str) -> Option<T>) -> Option<BTreeSet<T>> {
    let entries: Vec<&str> = raw
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(entries.into_iter().filter_map(parse).collect())
}

/// Criteria after normalization.
///
/// A filter the user set but that could not be resolved (an unknown sex, only
/// unparseable phototypes) stays active and matches nobody instead of silently
/// widening the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCriteria {
    pub age_min: u32,
    pub age_max: u32,
    pub sex: Option<Option<Sex>>,
    pub phototypes: Option<BTreeSet<Phototype>>,
    pub ethnicities: Option<BTreeSet<EthnicGroup>>,
    pub makeup_labels: Vec<String>,
    pub thresholds: Vec<(EvaluationAxis, AxisRange)>,
}

/// One ranked volunteer with the components that produced the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub volunteer_id: VolunteerId,
    pub display_name: String,
    pub email: Option<String>,
    pub age: u32,
    pub sex: Option<Sex>,
    pub phototype: Option<Phototype>,
    pub ethnicity: Option<EthnicGroup>,
    pub demographic_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub makeup_score: Option<u8>,
    pub total_score: u8,
    pub matched_labels: Vec<String>,
    pub missing_labels: Vec<String>,
    pub evaluations: EvaluationScores,
}

/// Why a volunteer dropped out, counted per reason for the results banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionTally {
    pub archived: usize,
    pub age: usize,
    pub sex: usize,
    pub phototype: usize,
    pub ethnicity: usize,
    pub evaluation: usize,
    pub zero_score: usize,
}

impl ExclusionTally {
    pub fn total(&self) -> usize {
        self.archived
            + self.age
            + self.sex
            + self.phototype
            + self.ethnicity
            + self.evaluation
            + self.zero_score
    }
}

/// Score bands and averages over the final result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total: usize,
    /// Scores in 80..=100.
    pub excellent: usize,
    /// Scores in 60..=79.
    pub good: usize,
    /// Scores in 40..=59.
    pub fair: usize,
    pub average_score: Option<f32>,
    pub axis_averages: AxisAverages,
}

/// Per-axis averages; `None` when no volunteer in the result has a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisAverages {
    pub global: Option<f32>,
    pub punctuality: Option<f32>,
    pub involvement: Option<f32>,
    pub comprehension: Option<f32>,
    pub reliability: Option<f32>,
}

impl AxisAverages {
    pub fn get(&self, axis: EvaluationAxis) -> Option<f32> {
        match axis {
            EvaluationAxis::Global => self.global,
            EvaluationAxis::Punctuality => self.punctuality,
            EvaluationAxis::Involvement => self.involvement,
            EvaluationAxis::Comprehension => self.comprehension,
            EvaluationAxis::Reliability => self.reliability,
        }
    }

    pub(crate) fn set(&mut self, axis: EvaluationAxis, value: Option<f32>) {
        match axis {
            EvaluationAxis::Global => self.global = value,
            EvaluationAxis::Punctuality => self.punctuality = value,
            EvaluationAxis::Involvement => self.involvement = value,
            EvaluationAxis::Comprehension => self.comprehension = value,
            EvaluationAxis::Reliability => self.reliability = value,
        }
    }
}

/// Engine output: ranked results, statistics and the exclusion breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub considered: usize,
    pub results: Vec<MatchResult>,
    pub statistics: MatchStatistics,
    pub exclusions: ExclusionTally,
}

impl MatchReport {
    pub fn volunteer_ids(&self) -> Vec<VolunteerId> {
        self.results.iter().map(|result| result.volunteer_id).collect()
    }
}
