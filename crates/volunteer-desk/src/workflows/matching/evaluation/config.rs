use serde::{Deserialize, Serialize};

const DEFAULT_MAKEUP_WEIGHT: f64 = 0.8;

/// Blend weights used once makeup criteria are selected. The demographic share is
/// whatever the makeup share leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    makeup_weight: f64,
}

impl ScoringConfig {
    pub fn new(makeup_weight: f64) -> Self {
        let sanitized = if makeup_weight.is_finite() && (0.0..=1.0).contains(&makeup_weight) {
            makeup_weight
        } else {
            DEFAULT_MAKEUP_WEIGHT
        };

        Self {
            makeup_weight: sanitized,
        }
    }

    pub fn makeup_weight(&self) -> f64 {
        self.makeup_weight
    }

    pub fn demographic_weight(&self) -> f64 {
        1.0 - self.makeup_weight
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAKEUP_WEIGHT)
    }
}
