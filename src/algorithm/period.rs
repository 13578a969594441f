//! Partitioning of a study period into fixed-length time slices.
//!
//! The study end date is inclusive on input and is moved one day forward
//! so slices are half-open `[start, end)`. Each step advances the slice
//! start by a calendar-month increment, so month-end starts follow chrono's
//! clamping (31 Jan + 1 month = 28/29 Feb).

use std::iter::FusedIterator;

use chrono::{Months, NaiveDate};

use crate::config::AnalysisConfig;
use crate::error::{IncPrevError, Result};

/// A half-open interval of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlice {
    /// First day of the slice (inclusive)
    pub start: NaiveDate,
    /// Day after the last day of the slice (exclusive)
    pub end: NaiveDate,
}

impl TimeSlice {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days in the slice
    #[must_use]
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Whether `date` falls in `[start, end)`
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Produces the ordered time slices covering a study period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindower {
    study_start: NaiveDate,
    study_end: NaiveDate,
    increment: Months,
}

impl PeriodWindower {
    /// Create a windower for `[study_start, study_end_inclusive]`
    pub fn new(
        study_start: NaiveDate,
        study_end_inclusive: NaiveDate,
        increment_months: i32,
    ) -> Result<Self> {
        let months = u32::try_from(increment_months)
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| {
                IncPrevError::config(format!(
                    "increment must be a positive number of months, got {increment_months}"
                ))
            })?;

        let study_end = study_end_inclusive.succ_opt().ok_or_else(|| {
            IncPrevError::config(format!("study end {study_end_inclusive} is out of range"))
        })?;

        Ok(Self {
            study_start,
            study_end,
            increment: Months::new(months),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::new(config.study_start, config.study_end, config.increment_months)
    }

    #[must_use]
    pub fn study_start(&self) -> NaiveDate {
        self.study_start
    }

    /// Exclusive end of the study range
    #[must_use]
    pub fn study_end_exclusive(&self) -> NaiveDate {
        self.study_end
    }

    /// Iterate the slices from the start of the study
    #[must_use]
    pub fn slices(&self) -> Periods {
        Periods {
            windower: *self,
            current: Some(self.study_start),
        }
    }
}

impl IntoIterator for &PeriodWindower {
    type Item = TimeSlice;
    type IntoIter = Periods;

    fn into_iter(self) -> Periods {
        self.slices()
    }
}

/// Iterator over the slices of a [`PeriodWindower`]
#[derive(Debug, Clone)]
pub struct Periods {
    windower: PeriodWindower,
    current: Option<NaiveDate>,
}

impl Iterator for Periods {
    type Item = TimeSlice;

    fn next(&mut self) -> Option<TimeSlice> {
        let current = self.current.filter(|c| *c < self.windower.study_end)?;
        let next = current.checked_add_months(self.windower.increment);
        let end = next.map_or(self.windower.study_end, |n| n.min(self.windower.study_end));
        self.current = next;
        Some(TimeSlice::new(current, end))
    }
}

impl FusedIterator for Periods {}
