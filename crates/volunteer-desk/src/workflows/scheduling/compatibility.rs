use serde::{Deserialize, Serialize};

use super::domain::Group;
use crate::workflows::volunteers::normalize::{fold, parse_phototype, split_list};
use crate::workflows::volunteers::Phototype;

/// Result of checking a volunteer's phototype against a group's eligibility list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhototypeCheck {
    /// The group declares no phototype constraint.
    Unrestricted,
    Compatible,
    Mismatch {
        eligible: Vec<String>,
        actual: Option<Phototype>,
    },
}

impl PhototypeCheck {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, PhototypeCheck::Mismatch { .. })
    }

    /// Operator-facing explanation for a mismatch.
    pub fn reason(&self) -> Option<String> {
        match self {
            PhototypeCheck::Mismatch { eligible, actual } => Some(match actual {
                Some(phototype) => format!(
                    "phototype {} is not among the group's eligible phototypes ({})",
                    phototype.roman(),
                    eligible.join(", ")
                ),
                None => format!(
                    "volunteer has no recorded phototype; group requires {}",
                    eligible.join(", ")
                ),
            }),
            _ => None,
        }
    }
}

/// Case-insensitive match of the volunteer's phototype against each listed entry.
///
/// An entry matches when one of its tokens spells the phototype (`"2"`, `"II"`),
/// or when the entry as a whole parses to the same phototype.
pub fn check_phototype(group: &Group, phototype: Option<Phototype>) -> PhototypeCheck {
    let eligible = group
        .eligible_phototypes
        .as_deref()
        .map(split_list)
        .unwrap_or_default();
    if eligible.is_empty() {
        return PhototypeCheck::Unrestricted;
    }

    let compatible = phototype.map_or(false, |phototype| {
        eligible.iter().any(|entry| entry_matches(entry, phototype))
    });

    if compatible {
        PhototypeCheck::Compatible
    } else {
        PhototypeCheck::Mismatch {
            eligible,
            actual: phototype,
        }
    }
}

fn entry_matches(entry: &str, phototype: Phototype) -> bool {
    let digit = phototype.value().to_string();
    let roman = phototype.roman().to_ascii_lowercase();
    let folded = fold(entry);

    folded
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .any(|token| token == digit || token == roman)
        || parse_phototype(entry) == Some(phototype)
}
