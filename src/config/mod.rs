//! Configuration for incidence and prevalence analyses.
//!
//! An [`AnalysisConfig`] is built once per run and handed by reference to
//! every calculation. [`RawAnalysisConfig`] is its textual form, as read
//! from the command line or a JSON file, and resolves into a validated
//! [`AnalysisConfig`].

use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{IncPrevError, Result};

/// Default scaling applied to rates and their bounds
pub const DEFAULT_PERSON_YEARS: f64 = 1.0;
/// Default significance level
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Default slice length in months (yearly rates)
pub const DEFAULT_INCREMENT_MONTHS: i32 = 12;

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATETIMES: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date format used for parsing input dates and formatting period labels
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// ISO-8601 dates, optionally with a time part
    #[default]
    Iso8601,
    /// A chrono strftime pattern such as `%d/%m/%Y`
    Custom(String),
}

impl DateFormat {
    /// Interpret a user supplied format name; `ISO8601` (any case) or an
    /// empty string select ISO-8601
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("iso8601") {
            Self::Iso8601
        } else {
            Self::Custom(trimmed.to_string())
        }
    }

    /// The strftime pattern used for formatting
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Iso8601 => ISO_DATE,
            Self::Custom(pattern) => pattern,
        }
    }

    /// Reject patterns chrono cannot interpret
    pub fn validate(&self) -> Result<()> {
        let Self::Custom(pattern) = self else {
            return Ok(());
        };
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(IncPrevError::config(format!(
                "malformed date format string '{pattern}'"
            )));
        }
        Ok(())
    }

    /// Parse a date, returning `None` for empty or unparseable text
    #[must_use]
    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        match self {
            Self::Iso8601 => NaiveDate::parse_from_str(value, ISO_DATE)
                .ok()
                .or_else(|| {
                    ISO_DATETIMES.iter().find_map(|format| {
                        NaiveDateTime::parse_from_str(value, format)
                            .ok()
                            .map(|dt| dt.date())
                    })
                })
                .or_else(|| {
                    DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|dt| dt.date_naive())
                }),
            Self::Custom(pattern) => NaiveDate::parse_from_str(value, pattern)
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(value, pattern)
                        .ok()
                        .map(|dt| dt.date())
                }),
        }
    }

    /// Parse a date that must be present, such as a study boundary
    pub fn parse_required(&self, value: &str) -> Result<NaiveDate> {
        self.parse(value).ok_or_else(|| IncPrevError::DateParse {
            value: value.to_string(),
            format: self.to_string(),
        })
    }

    /// Format a date; time fields render as midnight and patterns needing
    /// an offset fall back to ISO
    #[must_use]
    pub fn format(&self, date: NaiveDate) -> String {
        let midnight = date.and_time(NaiveTime::MIN);
        let mut out = String::new();
        if write!(out, "{}", midnight.format(self.pattern())).is_err() {
            return date.format(ISO_DATE).to_string();
        }
        out
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iso8601 => write!(f, "ISO8601"),
            Self::Custom(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// Confidence interval method used for every estimate of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfidenceMethod {
    /// Byar's approximation, exact below ten events
    #[default]
    Byars,
    /// Exact chi-squared (Poisson) limits
    Exact,
}

impl FromStr for ConfidenceMethod {
    type Err = IncPrevError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byar" | "byars" | "byar's" => Ok(Self::Byars),
            "exact" | "chi2" | "chi-squared" | "chisquared" => Ok(Self::Exact),
            other => Err(IncPrevError::config(format!(
                "unknown confidence interval method '{other}' (expected 'byars' or 'exact')"
            ))),
        }
    }
}

impl fmt::Display for ConfidenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byars => write!(f, "byars"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// First day of the study period
    pub study_start: NaiveDate,
    /// Last day of the study period (inclusive)
    pub study_end: NaiveDate,
    /// Column holding the start of patient follow-up
    pub follow_up_start_col: String,
    /// Column holding the end of patient follow-up
    pub follow_up_end_col: String,
    /// Event date columns to analyse
    pub conditions: Vec<String>,
    /// Categorical columns to stratify by
    pub demography: Vec<String>,
    /// Multiplier applied to rates and bounds
    pub person_years: f64,
    /// Significance level for the confidence intervals
    pub alpha: f64,
    /// Length of each time slice in calendar months
    pub increment_months: i32,
    /// Confidence interval method
    pub confidence_method: ConfidenceMethod,
    /// Format of dates in the dataset and in period labels
    pub date_format: DateFormat,
}

impl AnalysisConfig {
    /// Create a configuration with default scaling, alpha, increment,
    /// method and date format
    #[must_use]
    pub fn new(
        study_start: NaiveDate,
        study_end: NaiveDate,
        follow_up_start_col: impl Into<String>,
        follow_up_end_col: impl Into<String>,
        conditions: Vec<String>,
    ) -> Self {
        Self {
            study_start,
            study_end,
            follow_up_start_col: follow_up_start_col.into(),
            follow_up_end_col: follow_up_end_col.into(),
            conditions,
            demography: Vec::new(),
            person_years: DEFAULT_PERSON_YEARS,
            alpha: DEFAULT_ALPHA,
            increment_months: DEFAULT_INCREMENT_MONTHS,
            confidence_method: ConfidenceMethod::default(),
            date_format: DateFormat::default(),
        }
    }

    #[must_use]
    pub fn with_demography(mut self, demography: Vec<String>) -> Self {
        self.demography = demography;
        self
    }

    #[must_use]
    pub fn with_person_years(mut self, person_years: f64) -> Self {
        self.person_years = person_years;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_increment_months(mut self, months: i32) -> Self {
        self.increment_months = months;
        self
    }

    #[must_use]
    pub fn with_confidence_method(mut self, method: ConfidenceMethod) -> Self {
        self.confidence_method = method;
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    /// Check the configuration before any computation starts
    pub fn validate(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(IncPrevError::config("provide at least one condition column"));
        }
        if self.increment_months <= 0 {
            return Err(IncPrevError::config(format!(
                "increment must be a positive number of months, got {}",
                self.increment_months
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(IncPrevError::config(format!(
                "alpha must lie strictly between 0 and 1, got {}",
                self.alpha
            )));
        }
        if !(self.person_years.is_finite() && self.person_years > 0.0) {
            return Err(IncPrevError::config(format!(
                "person-years scaling must be a positive number, got {}",
                self.person_years
            )));
        }
        if self.study_start > self.study_end {
            return Err(IncPrevError::config(format!(
                "study start {} is after study end {}",
                self.study_start, self.study_end
            )));
        }
        self.date_format.validate()
    }

    /// Every column the analysis reads, in a stable order
    #[must_use]
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.follow_up_start_col.as_str(),
            self.follow_up_end_col.as_str(),
        ];
        for column in self.conditions.iter().chain(&self.demography) {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }

    /// Check that every required column is present in `available`
    pub fn validate_columns<S: AsRef<str>>(&self, available: &[S]) -> Result<()> {
        let missing: Vec<String> = self
            .required_columns()
            .into_iter()
            .filter(|column| !available.iter().any(|a| a.as_ref() == *column))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(IncPrevError::MissingColumns(missing))
        }
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Configuration:")?;
        writeln!(f, "  Study Start Date: {}", self.study_start)?;
        writeln!(f, "  Study End Date: {}", self.study_end)?;
        writeln!(f, "  Follow-up Start Column: {}", self.follow_up_start_col)?;
        writeln!(f, "  Follow-up End Column: {}", self.follow_up_end_col)?;
        writeln!(f, "  Conditions: {}", self.conditions.join(", "))?;
        if !self.demography.is_empty() {
            writeln!(f, "  Demography: {}", self.demography.join(", "))?;
        }
        writeln!(f, "  Person Years: {}", self.person_years)?;
        writeln!(f, "  Alpha: {}", self.alpha)?;
        writeln!(f, "  Increment (months): {}", self.increment_months)?;
        writeln!(f, "  Confidence Method: {}", self.confidence_method)?;
        writeln!(f, "  Date Format: {}", self.date_format)?;
        Ok(())
    }
}

fn default_person_years() -> f64 {
    DEFAULT_PERSON_YEARS
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_increment() -> i32 {
    DEFAULT_INCREMENT_MONTHS
}

/// Textual analysis settings, as given on the command line or in a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisConfig {
    pub study_start_date: String,
    pub study_end_date: String,
    pub patient_start_col: String,
    pub patient_end_col: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub demography: Vec<String>,
    #[serde(default = "default_person_years")]
    pub person_years: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_increment")]
    pub increment_by_months: i32,
    #[serde(default)]
    pub confidence_method: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,
}

impl RawAnalysisConfig {
    /// Load settings from a JSON file
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Parse dates and method names and validate the result
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let date_format = self
            .date_format
            .as_deref()
            .map(DateFormat::from_name)
            .unwrap_or_default();
        date_format.validate()?;

        let confidence_method = match self.confidence_method.as_deref() {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => ConfidenceMethod::default(),
        };

        let config = AnalysisConfig::new(
            date_format.parse_required(&self.study_start_date)?,
            date_format.parse_required(&self.study_end_date)?,
            self.patient_start_col.trim(),
            self.patient_end_col.trim(),
            self.conditions.clone(),
        )
        .with_demography(self.demography.clone())
        .with_person_years(self.person_years)
        .with_alpha(self.alpha)
        .with_increment_months(self.increment_by_months)
        .with_confidence_method(confidence_method)
        .with_date_format(date_format);

        config.validate()?;
        Ok(config)
    }
}

/// Split a comma separated column list, dropping whitespace and empty names
#[must_use]
pub fn split_column_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|name| name.split_whitespace().collect::<String>())
        .filter(|name| !name.is_empty())
        .collect()
}
