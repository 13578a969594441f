//! Algorithm implementations for incidence and prevalence studies
//!
//! This module contains the period windowing, the exposure accounting
//! and the calculators that combine them with confidence intervals.

pub mod calculator;
pub mod exposure;
pub mod incidence;
pub mod period;
pub mod prevalence;

pub use calculator::{RateCalculator, Series, partition, plan_grouped, plan_overall};
pub use exposure::{DENOMINATOR_EPSILON, PeriodCounts};
pub use incidence::IncidenceCalculator;
pub use period::{PeriodWindower, Periods, TimeSlice};
pub use prevalence::PrevalenceCalculator;
