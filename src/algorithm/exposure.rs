//! Numerators and denominators from follow-up windows and event dates.
//!
//! Incidence counts events within a slice over the exposure time patients
//! contribute to it, in units of the slice length. Prevalence counts
//! patients with the condition at an instant over the patients under
//! follow-up at that instant. Both denominators carry
//! [`DENOMINATOR_EPSILON`] so an empty risk set never divides by zero.

use chrono::NaiveDate;

use crate::algorithm::period::TimeSlice;
use crate::models::PatientRecord;

/// Added to every denominator
pub const DENOMINATOR_EPSILON: f64 = 1e-8;

/// Numerator and guarded denominator for one slice or instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodCounts {
    pub numerator: u64,
    pub denominator: f64,
}

impl PeriodCounts {
    /// Unscaled rate or proportion
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.numerator as f64 / self.denominator
    }
}

fn overlaps(record: &PatientRecord, slice: &TimeSlice) -> bool {
    record.follow_up_end >= slice.start && record.follow_up_start < slice.end
}

/// Whether the record's event for `condition` counts as a new case in `slice`
///
/// Events on or before the patient's own follow-up start predate
/// observation and never count.
#[must_use]
pub fn is_incident_event(record: &PatientRecord, slice: &TimeSlice, condition: usize) -> bool {
    record.condition_date(condition).is_some_and(|event| {
        slice.contains(event) && overlaps(record, slice) && event > record.follow_up_start
    })
}

/// Exposure the record contributes to `slice`, as a fraction of the slice
/// length, or `None` when the record is not at risk in it
///
/// A record is at risk when its follow-up overlaps the slice and its event
/// either never occurred or falls on or after the slice start and after
/// follow-up start. Exposure runs from the later of follow-up start and
/// slice start to the earliest of follow-up end, event date and slice end.
#[must_use]
pub fn exposure_contribution(
    record: &PatientRecord,
    slice: &TimeSlice,
    condition: usize,
) -> Option<f64> {
    if !overlaps(record, slice) {
        return None;
    }

    let event = record.condition_date(condition);
    if let Some(event) = event {
        if event < slice.start || event <= record.follow_up_start {
            return None;
        }
    }

    let start = record.follow_up_start.max(slice.start);
    let end = event
        .map_or(record.follow_up_end, |e| e.min(record.follow_up_end))
        .min(slice.end);

    Some((end - start).num_days() as f64 / slice.length_days() as f64)
}

/// New events and exposure time for `condition` within `slice`
#[must_use]
pub fn incidence_counts(records: &[&PatientRecord], slice: &TimeSlice, condition: usize) -> PeriodCounts {
    let numerator = records
        .iter()
        .filter(|record| is_incident_event(record, slice, condition))
        .count() as u64;

    let exposure: f64 = records
        .iter()
        .filter_map(|record| exposure_contribution(record, slice, condition))
        .sum();

    PeriodCounts {
        numerator,
        denominator: exposure + DENOMINATOR_EPSILON,
    }
}

/// Existing cases and at-risk population for `condition` at `point`
///
/// A missing event date never counts as a case.
#[must_use]
pub fn prevalence_counts(records: &[&PatientRecord], point: NaiveDate, condition: usize) -> PeriodCounts {
    let (numerator, at_risk) = records
        .iter()
        .filter(|record| record.under_follow_up_at(point))
        .fold((0u64, 0u64), |(cases, at_risk), record| {
            let is_case = record
                .condition_date(condition)
                .is_some_and(|event| event <= point);
            (cases + u64::from(is_case), at_risk + 1)
        });

    PeriodCounts {
        numerator,
        denominator: at_risk as f64 + DENOMINATOR_EPSILON,
    }
}
