//! Incidence rates and point prevalence with confidence intervals from
//! longitudinal patient-level data.
//!
//! A study period is split into fixed-length time slices. For each slice,
//! condition and (optionally) demographic subgroup the calculators produce
//! a numerator, a denominator, a rate or proportion and a confidence
//! interval around it.

pub mod algorithm;
pub mod analyser;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod stats;
pub mod utils;

// Re-export the most common types for easier use
pub use analyser::{AnalysisOutputs, AnalysisSelection, Analyser};
pub use config::{AnalysisConfig, ConfidenceMethod, DateFormat, RawAnalysisConfig};
pub use error::{IncPrevError, Result};

// Calculators
pub use algorithm::{
    IncidenceCalculator, PeriodWindower, PrevalenceCalculator, RateCalculator, TimeSlice,
};
pub use models::{Cohort, PatientRecord, RateEstimate, RateKind};
pub use stats::{ByarsInterval, ChiSquaredInterval, ConfidenceInterval};

// Arrow types
pub use arrow::record_batch::RecordBatch;
