//! Demographic matching: hard filters, makeup scoring, evaluation thresholds and
//! result statistics, plus the service that feeds the engine from the volunteer
//! directory.

pub mod directory;
pub mod domain;
pub(crate) mod evaluation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use directory::{
    ContactError, ContactMessage, ContactPublisher, ContactReceipt, ContactRecipient,
    ContactRequest, DirectoryError, Page, VolunteerDirectory,
};
pub use domain::{
    AxisAverages, AxisRange, DemographicFilters, EvaluationThresholds, ExclusionTally,
    FilterValidationError, Filters, MakeupSelection, MatchReport, MatchResult, MatchStatistics,
};
pub use evaluation::{MatchingEngine, ScoringConfig};
pub use router::{matching_router, MatchRequest};
pub use service::{ContactValidationError, MatchingError, MatchingService};
