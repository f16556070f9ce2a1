mod config;
mod rules;
mod scoring;
mod statistics;

pub use config::ScoringConfig;

use chrono::NaiveDate;
use tracing::debug;

use super::domain::{ExclusionTally, Filters, MatchReport, MatchResult};
use crate::workflows::volunteers::{HabitIndex, Volunteer};
use rules::{hard_filter, passes_thresholds, Exclusion};
use scoring::{makeup_match, total_score, DEMOGRAPHIC_SCORE};

/// Stateless matcher: hard filters, scoring, evaluation thresholds, ranking and statistics.
pub struct MatchingEngine {
    config: ScoringConfig,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl MatchingEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank `volunteers` against `filters`. Ages are computed on `today`.
    ///
    /// Filters are expected to be validated already; an inverted age range simply
    /// matches nobody here.
    pub fn run(
        &self,
        volunteers: &[Volunteer],
        habits: &HabitIndex,
        filters: &Filters,
        today: NaiveDate,
    ) -> MatchReport {
        let criteria = filters.criteria();
        let mut exclusions = ExclusionTally::default();
        let mut results = Vec::new();

        for volunteer in volunteers {
            let age = match hard_filter(volunteer, &criteria, today) {
                Ok(age) => age,
                Err(reason) => {
                    reason.record(&mut exclusions);
                    continue;
                }
            };

            let makeup = makeup_match(&criteria.makeup_labels, habits.get(volunteer.id));
            let total = total_score(makeup.score, &self.config);

            if !passes_thresholds(&volunteer.evaluations, &criteria.thresholds) {
                Exclusion::Evaluation.record(&mut exclusions);
                continue;
            }

            let total_score = match total {
                Some(score) if score > 0 => score,
                _ => {
                    Exclusion::ZeroScore.record(&mut exclusions);
                    continue;
                }
            };

            results.push(MatchResult {
                volunteer_id: volunteer.id,
                display_name: volunteer.display_name(),
                email: volunteer.email.clone(),
                age,
                sex: volunteer.sex,
                phototype: volunteer.phototype,
                ethnicity: volunteer.ethnicity.clone(),
                demographic_score: DEMOGRAPHIC_SCORE,
                makeup_score: makeup.score,
                total_score,
                matched_labels: makeup.matched,
                missing_labels: makeup.missing,
                evaluations: volunteer.evaluations,
            });
        }

        // Stable: equal scores keep fetch order.
        results.sort_by(|left, right| right.total_score.cmp(&left.total_score));

        debug!(
            considered = volunteers.len(),
            matched = results.len(),
            excluded = exclusions.total(),
            "matching pass complete"
        );

        let statistics = statistics::summarize(&results);
        MatchReport {
            considered: volunteers.len(),
            results,
            statistics,
            exclusions,
        }
    }
}
