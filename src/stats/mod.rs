//! Statistical estimators used by the rate calculators.

pub mod confidence;

pub use confidence::{ByarsInterval, ChiSquaredInterval, ConfidenceInterval};
