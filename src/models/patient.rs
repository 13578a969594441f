//! Patient records and the cohort they form.

use chrono::NaiveDate;

/// One row of the input table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    /// Position of the row in the source data
    pub row: usize,
    /// First day of follow-up
    pub follow_up_start: NaiveDate,
    /// Last day of follow-up
    pub follow_up_end: NaiveDate,
    /// Event date per condition column; `None` when the event never occurred
    pub condition_dates: Vec<Option<NaiveDate>>,
    /// Value per stratifying column; `None` when missing
    pub strata: Vec<Option<String>>,
}

impl PatientRecord {
    /// Whether follow-up covers `date` (both ends inclusive)
    #[must_use]
    pub fn under_follow_up_at(&self, date: NaiveDate) -> bool {
        self.follow_up_start <= date && date <= self.follow_up_end
    }

    /// Event date for the condition at `index`
    #[must_use]
    pub fn condition_date(&self, index: usize) -> Option<NaiveDate> {
        self.condition_dates.get(index).copied().flatten()
    }

    /// Stratum value for the stratifying column at `index`
    #[must_use]
    pub fn stratum(&self, index: usize) -> Option<&str> {
        self.strata.get(index).and_then(|value| value.as_deref())
    }
}

/// The patient records of one analysis run together with the names of
/// their condition and stratifying columns
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    conditions: Vec<String>,
    strata: Vec<String>,
    records: Vec<PatientRecord>,
}

impl Cohort {
    /// Create a cohort; every record must carry one date per condition
    /// and one value per stratifying column, in the same order
    #[must_use]
    pub fn new(conditions: Vec<String>, strata: Vec<String>, records: Vec<PatientRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.condition_dates.len() == conditions.len()
            && r.strata.len() == strata.len()));
        Self {
            conditions,
            strata,
            records,
        }
    }

    #[must_use]
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    #[must_use]
    pub fn strata(&self) -> &[String] {
        &self.strata
    }

    #[must_use]
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of a condition column
    #[must_use]
    pub fn condition_index(&self, name: &str) -> Option<usize> {
        self.conditions.iter().position(|c| c == name)
    }

    /// Index of a stratifying column
    #[must_use]
    pub fn stratum_index(&self, name: &str) -> Option<usize> {
        self.strata.iter().position(|s| s == name)
    }
}
