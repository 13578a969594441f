//! Rate and proportion estimates produced by the calculators.

use std::fmt;

use chrono::NaiveDate;

/// Label used for estimates over the whole cohort
pub const OVERALL_GROUP: &str = "Overall";

/// Which measure an estimate holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    /// Events per unit of exposure time within a slice
    Incidence,
    /// Proportion of the at-risk population with the condition at an instant
    Prevalence,
}

impl RateKind {
    /// Column header for the estimate value
    #[must_use]
    pub fn value_column(self) -> &'static str {
        match self {
            Self::Incidence => "Incidence",
            Self::Prevalence => "Prevalence",
        }
    }

    /// File name the result table is written to
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Incidence => "incidence_analysis.csv",
            Self::Prevalence => "prevalence_analysis.csv",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incidence => write!(f, "incidence"),
            Self::Prevalence => write!(f, "prevalence"),
        }
    }
}

/// One row of a result table
#[derive(Debug, Clone, PartialEq)]
pub struct RateEstimate {
    pub kind: RateKind,
    /// Condition column the estimate is for
    pub condition: String,
    /// Start of the time slice
    pub period_start: NaiveDate,
    /// Start of the time slice, formatted with the run's date format
    pub period_label: String,
    /// Stratifying column, or [`OVERALL_GROUP`]
    pub group: String,
    /// Value of the stratifying column; empty when unstratified
    pub subgroup: String,
    /// Rate or proportion, scaled by person-years
    pub value: f64,
    pub numerator: u64,
    /// Exposure time or at-risk population, including the zero guard
    pub denominator: f64,
    pub lower_ci: f64,
    pub upper_ci: f64,
}

impl RateEstimate {
    /// Whether the estimate covers the whole cohort
    #[must_use]
    pub fn is_overall(&self) -> bool {
        self.group == OVERALL_GROUP && self.subgroup.is_empty()
    }

    /// Denominator as written to the result table: exposure for incidence,
    /// whole at-risk head count for prevalence
    #[must_use]
    pub fn reported_denominator(&self) -> f64 {
        match self.kind {
            RateKind::Incidence => self.denominator,
            RateKind::Prevalence => self.denominator.trunc(),
        }
    }
}
