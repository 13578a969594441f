//! Run command implementation
//!
//! Settings come either from individual flags or from a JSON file. Missing
//! condition lists are read interactively from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};

use crate::analyser::{AnalysisSelection, Analyser};
use crate::config::{
    AnalysisConfig, DEFAULT_ALPHA, DEFAULT_INCREMENT_MONTHS, DEFAULT_PERSON_YEARS,
    RawAnalysisConfig, split_column_list,
};
use crate::error::IncPrevError;

const CONDITIONS_PROMPT: &str = "Enter the list of conditions columns to analyse (col1, col2, ...): ";
const DEMOGRAPHY_PROMPT: &str =
    "Enter the list of demography columns for subgroup analyse or leave empty if none (col1, col2, ...): ";

/// Exit code for configuration errors
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Restrict a run to one result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnlyTable {
    Incidence,
    Prevalence,
}

impl From<Option<OnlyTable>> for AnalysisSelection {
    fn from(only: Option<OnlyTable>) -> Self {
        match only {
            None => Self::Both,
            Some(OnlyTable::Incidence) => Self::Incidence,
            Some(OnlyTable::Prevalence) => Self::Prevalence,
        }
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input CSV or Parquet file
    pub input: PathBuf,

    /// Existing directory the result tables are written to
    pub destination: PathBuf,

    /// JSON file holding the analysis settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First day of the study period
    #[arg(long, required_unless_present = "config")]
    pub start_date: Option<String>,

    /// Last day of the study period (inclusive)
    #[arg(long, required_unless_present = "config")]
    pub end_date: Option<String>,

    /// Date format of the study dates and date columns (strftime or iso8601)
    #[arg(long, default_value = "iso8601")]
    pub date_format: String,

    /// Column holding the start of each patient's follow-up
    #[arg(long, required_unless_present = "config")]
    pub patient_start_col: Option<String>,

    /// Column holding the end of each patient's follow-up
    #[arg(long, required_unless_present = "config")]
    pub patient_end_col: Option<String>,

    /// Scaling factor for rates, e.g. 1000 for rates per 1,000 person-years
    #[arg(long, default_value_t = DEFAULT_PERSON_YEARS)]
    pub person_years: f64,

    /// Length of each time slice in months
    #[arg(long, default_value_t = DEFAULT_INCREMENT_MONTHS, allow_negative_numbers = true)]
    pub increment: i32,

    /// Significance level of the confidence intervals
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Confidence interval method (byars or exact)
    #[arg(long)]
    pub method: Option<String>,

    /// Condition columns (comma-separated); prompted for when absent
    #[arg(long)]
    pub conditions: Option<String>,

    /// Stratifying columns (comma-separated)
    #[arg(long)]
    pub demography: Option<String>,

    /// Prompt for the stratifying columns when none are given
    #[arg(long)]
    pub prompt: bool,

    /// Produce only one of the result tables
    #[arg(long, value_enum)]
    pub only: Option<OnlyTable>,
}

impl RunArgs {
    /// Execute the run command
    pub fn execute(&self) -> anyhow::Result<i32> {
        log::info!("Starting run command");

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let config = match self.resolve_config(&mut stdin.lock(), &mut stdout) {
            Ok(config) => config,
            Err(e) if is_configuration_error(&e) => {
                eprintln!("Configuration error: {e:#}");
                return Ok(EXIT_CONFIG_ERROR);
            }
            Err(e) => return Err(e),
        };

        let analyser = Analyser::new(config)?;
        let outputs = analyser
            .run(&self.input, &self.destination, self.only.into())
            .with_context(|| format!("analysis of {} failed", self.input.display()))?;

        for path in outputs.incidence.iter().chain(&outputs.prevalence) {
            println!("Wrote {}", path.display());
        }
        Ok(0)
    }

    /// Build the textual settings, from the JSON file when given
    pub fn raw_config(&self) -> anyhow::Result<RawAnalysisConfig> {
        if let Some(path) = &self.config {
            return RawAnalysisConfig::from_json_file(path)
                .with_context(|| format!("failed to read settings from {}", path.display()));
        }

        Ok(RawAnalysisConfig {
            study_start_date: self.start_date.clone().context("--start-date is required")?,
            study_end_date: self.end_date.clone().context("--end-date is required")?,
            patient_start_col: self
                .patient_start_col
                .clone()
                .context("--patient-start-col is required")?,
            patient_end_col: self
                .patient_end_col
                .clone()
                .context("--patient-end-col is required")?,
            conditions: self.conditions.as_deref().map(split_column_list).unwrap_or_default(),
            demography: self.demography.as_deref().map(split_column_list).unwrap_or_default(),
            person_years: self.person_years,
            alpha: self.alpha,
            increment_by_months: self.increment,
            confidence_method: self.method.clone(),
            date_format: Some(self.date_format.clone()),
        })
    }

    /// Resolve the analysis settings, prompting for missing column lists
    pub fn resolve_config<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> anyhow::Result<AnalysisConfig> {
        let mut raw = self.raw_config()?;

        if raw.conditions.is_empty() {
            raw.conditions = split_column_list(&prompt_line(input, output, CONDITIONS_PROMPT)?);
        }
        if self.prompt && raw.demography.is_empty() {
            raw.demography = split_column_list(&prompt_line(input, output, DEMOGRAPHY_PROMPT)?);
        }

        Ok(raw.resolve()?)
    }
}

/// Write `message` and read one line of the answer
fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> io::Result<String> {
    write!(output, "{message}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_configuration_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<IncPrevError>()
        .is_some_and(IncPrevError::is_configuration_error)
}
