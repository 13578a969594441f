//! Incidence rates: new events per unit of exposure time in each slice.

use crate::algorithm::calculator::RateCalculator;
use crate::algorithm::exposure::{PeriodCounts, incidence_counts};
use crate::algorithm::period::TimeSlice;
use crate::models::{PatientRecord, RateKind};

/// Windowed incidence over a cohort
#[derive(Debug, Clone, Copy, Default)]
pub struct IncidenceCalculator;

impl RateCalculator for IncidenceCalculator {
    fn kind(&self) -> RateKind {
        RateKind::Incidence
    }

    fn counts(&self, records: &[&PatientRecord], slice: &TimeSlice, condition: usize) -> PeriodCounts {
        incidence_counts(records, slice, condition)
    }
}
