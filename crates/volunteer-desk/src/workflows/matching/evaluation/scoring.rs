use super::config::ScoringConfig;
use crate::workflows::volunteers::HabitRecord;

/// Score every hard-filter survivor starts with.
pub(crate) const DEMOGRAPHIC_SCORE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MakeupMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub score: Option<u8>,
}

/// Share of the selected labels the volunteer answered affirmatively, 0-100.
/// `score` is `None` when no label was selected.
pub(crate) fn makeup_match(labels: &[String], habits: Option<&HabitRecord>) -> MakeupMatch {
    if labels.is_empty() {
        return MakeupMatch {
            matched: Vec::new(),
            missing: Vec::new(),
            score: None,
        };
    }

    let (matched, missing): (Vec<String>, Vec<String>) = labels
        .iter()
        .cloned()
        .partition(|label| habits.map_or(false, |record| record.uses(label)));

    let ratio = matched.len() as f64 / labels.len() as f64;
    MakeupMatch {
        score: to_score(ratio * 100.0),
        matched,
        missing,
    }
}

/// Blend the rounded components. Without makeup criteria the demographic score stands alone.
pub(crate) fn total_score(makeup: Option<u8>, config: &ScoringConfig) -> Option<u8> {
    let demographic = f64::from(DEMOGRAPHIC_SCORE);
    match makeup {
        Some(makeup) => to_score(
            f64::from(makeup) * config.makeup_weight() + demographic * config.demographic_weight(),
        ),
        None => to_score(demographic),
    }
}

/// Round to the nearest integer and clamp into 0..=100; non-finite values have no score.
pub(crate) fn to_score(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::volunteers::VolunteerId;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn makeup_score_is_share_of_affirmative_labels() {
        let habits = HabitRecord::new(VolunteerId(1))
            .with_answer("mascara", "oui")
            .with_answer("rouge a levres", "non")
            .with_answer("fond de teint", "oui");
        let outcome = makeup_match(
            &labels(&["mascara", "rouge a levres", "fond de teint"]),
            Some(&habits),
        );
        assert_eq!(outcome.score, Some(67));
        assert_eq!(outcome.matched, labels(&["mascara", "fond de teint"]));
        assert_eq!(outcome.missing, labels(&["rouge a levres"]));
    }

    #[test]
    fn missing_habit_record_scores_zero() {
        let outcome = makeup_match(&labels(&["mascara"]), None);
        assert_eq!(outcome.score, Some(0));
        assert_eq!(outcome.missing, labels(&["mascara"]));
    }

    #[test]
    fn blended_total_weights_makeup_at_eighty_percent() {
        let config = ScoringConfig::default();
        assert_eq!(total_score(Some(50), &config), Some(60));
        assert_eq!(total_score(Some(0), &config), Some(20));
        assert_eq!(total_score(Some(100), &config), Some(100));
        assert_eq!(total_score(None, &config), Some(100));
    }

    #[test]
    fn out_of_range_weights_fall_back_to_default() {
        assert_eq!(ScoringConfig::new(f64::NAN), ScoringConfig::default());
        assert_eq!(ScoringConfig::new(1.5), ScoringConfig::default());
        assert_eq!(to_score(f64::INFINITY), None);
        assert_eq!(to_score(-3.0), Some(0));
    }
}
