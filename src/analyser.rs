//! Orchestration of a complete analysis run
//!
//! The [`Analyser`] checks and loads the input file once, runs the
//! selected calculators over the resulting cohort and writes one result
//! table per calculator into the destination directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use crate::algorithm::{
    IncidenceCalculator, PrevalenceCalculator, RateCalculator, plan_grouped, plan_overall,
};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::io::{check_inputs, extract_cohort, load_batches, write_estimates};
use crate::models::{Cohort, RateEstimate};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// Which result tables a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisSelection {
    #[default]
    Both,
    Incidence,
    Prevalence,
}

impl AnalysisSelection {
    #[must_use]
    pub fn includes_incidence(self) -> bool {
        matches!(self, Self::Both | Self::Incidence)
    }

    #[must_use]
    pub fn includes_prevalence(self) -> bool {
        matches!(self, Self::Both | Self::Prevalence)
    }
}

/// Paths of the tables written by a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOutputs {
    pub incidence: Option<PathBuf>,
    pub prevalence: Option<PathBuf>,
}

/// Runs incidence and prevalence analyses for one validated configuration
#[derive(Debug, Clone)]
pub struct Analyser {
    config: AnalysisConfig,
}

impl Analyser {
    /// Create an analyser; the configuration is validated up front
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the cohort from a CSV or Parquet file
    pub fn load(&self, input: &Path) -> Result<Cohort> {
        let batches = load_batches(input, &self.config)?;
        let cohort = extract_cohort(&batches, &self.config)?;
        info!("Loaded cohort of {} patients", cohort.len());
        Ok(cohort)
    }

    /// Overall then grouped estimates for one calculator, with progress
    /// reported per condition and partition
    pub fn compute<C: RateCalculator>(
        &self,
        calculator: &C,
        cohort: &Cohort,
    ) -> Result<Vec<RateEstimate>> {
        let start = Instant::now();
        let mut plan = plan_overall(cohort, &self.config)?;
        plan.extend(plan_grouped(cohort, &self.config)?);

        let description = format!("Computing {}", calculator.kind());
        let pb = create_main_progress_bar(plan.len() as u64, Some(&description));
        let estimates = calculator.evaluate(&plan, &self.config, Some(&pb))?;
        finish_progress_bar(&pb, Some("Done"));

        info!(
            "Computed {} {} estimates for {} series in {:?}",
            estimates.len(),
            calculator.kind(),
            plan.len(),
            start.elapsed()
        );
        Ok(estimates)
    }

    /// Compute and write the incidence table
    pub fn run_incidence(&self, cohort: &Cohort, destination: &Path) -> Result<PathBuf> {
        self.compute_and_write(&IncidenceCalculator, cohort, destination)
    }

    /// Compute and write the prevalence table
    pub fn run_prevalence(&self, cohort: &Cohort, destination: &Path) -> Result<PathBuf> {
        self.compute_and_write(&PrevalenceCalculator, cohort, destination)
    }

    fn compute_and_write<C: RateCalculator>(
        &self,
        calculator: &C,
        cohort: &Cohort,
        destination: &Path,
    ) -> Result<PathBuf> {
        let estimates = self.compute(calculator, cohort)?;
        write_estimates(destination, calculator.kind(), &estimates)
    }

    /// Check inputs, load the cohort and write the selected tables
    pub fn run(
        &self,
        input: &Path,
        destination: &Path,
        selection: AnalysisSelection,
    ) -> Result<AnalysisOutputs> {
        check_inputs(input, destination)?;
        info!("Starting analysis\n{}", self.config);

        let cohort = self.load(input)?;
        let mut outputs = AnalysisOutputs::default();
        if selection.includes_incidence() {
            outputs.incidence = Some(self.run_incidence(&cohort, destination)?);
        }
        if selection.includes_prevalence() {
            outputs.prevalence = Some(self.run_prevalence(&cohort, destination)?);
        }
        Ok(outputs)
    }
}
