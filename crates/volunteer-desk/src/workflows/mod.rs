pub mod matching;
pub mod scheduling;
pub mod volunteers;
