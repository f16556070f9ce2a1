//! Canonical volunteer records shared by the matching and scheduling workflows.

pub mod domain;
pub mod normalize;

pub use domain::{
    EthnicGroup, EvaluationAxis, EvaluationScores, HabitIndex, HabitRecord, Phototype, Sex,
    Volunteer, VolunteerId,
};
