//! Data model: patient records in, rate estimates out.

pub mod estimate;
pub mod patient;

pub use estimate::{OVERALL_GROUP, RateEstimate, RateKind};
pub use patient::{Cohort, PatientRecord};
