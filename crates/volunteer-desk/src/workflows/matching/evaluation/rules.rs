use chrono::NaiveDate;

use super::super::domain::{AxisRange, ExclusionTally, NormalizedCriteria};
use crate::workflows::volunteers::{EvaluationAxis, EvaluationScores, Volunteer};

/// First predicate a volunteer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exclusion {
    Archived,
    Age,
    Sex,
    Phototype,
    Ethnicity,
    Evaluation,
    ZeroScore,
}

impl Exclusion {
    pub(crate) fn record(self, tally: &mut ExclusionTally) {
        let slot = match self {
            Exclusion::Archived => &mut tally.archived,
            Exclusion::Age => &mut tally.age,
            Exclusion::Sex => &mut tally.sex,
            Exclusion::Phototype => &mut tally.phototype,
            Exclusion::Ethnicity => &mut tally.ethnicity,
            Exclusion::Evaluation => &mut tally.evaluation,
            Exclusion::ZeroScore => &mut tally.zero_score,
        };
        *slot += 1;
    }
}

/// Hard demographic predicates. Returns the volunteer's age when every predicate passes.
pub(crate) fn hard_filter(
    volunteer: &Volunteer,
    criteria: &NormalizedCriteria,
    today: NaiveDate,
) -> Result<u32, Exclusion> {
    if volunteer.archived {
        return Err(Exclusion::Archived);
    }

    let age = volunteer.age_on(today).ok_or(Exclusion::Age)?;
    if age < criteria.age_min || age > criteria.age_max {
        return Err(Exclusion::Age);
    }

    if let Some(phototypes) = &criteria.phototypes {
        let admitted = volunteer
            .phototype
            .map_or(false, |phototype| phototypes.contains(&phototype));
        if !admitted {
            return Err(Exclusion::Phototype);
        }
    }

    if let Some(ethnicities) = &criteria.ethnicities {
        let admitted = volunteer
            .ethnicity
            .as_ref()
            .map_or(false, |ethnicity| ethnicities.contains(ethnicity));
        if !admitted {
            return Err(Exclusion::Ethnicity);
        }
    }

    if let Some(required) = criteria.sex {
        if required.is_none() || volunteer.sex != required {
            return Err(Exclusion::Sex);
        }
    }

    Ok(age)
}

/// Every configured axis needs a rated value inside its bounds.
pub(crate) fn passes_thresholds(
    scores: &EvaluationScores,
    thresholds: &[(EvaluationAxis, AxisRange)],
) -> bool {
    thresholds.iter().all(|(axis, range)| {
        scores
            .get(*axis)
            .map_or(false, |score| range.admits(score))
    })
}
