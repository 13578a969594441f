//! Shared driver for the incidence and prevalence calculators.
//!
//! A run is planned as a list of [`Series`]: one per condition over the
//! whole cohort, then one per (condition, stratifying column, value) over
//! that partition. Each series is evaluated over every time slice of the
//! study. Slices are computed in parallel and collected in order, so the
//! output always follows conditions, then columns, then values in
//! first-encounter order, then slices chronologically.

use indicatif::ProgressBar;
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::algorithm::exposure::PeriodCounts;
use crate::algorithm::period::{PeriodWindower, TimeSlice};
use crate::config::AnalysisConfig;
use crate::error::{IncPrevError, Result};
use crate::models::{Cohort, OVERALL_GROUP, PatientRecord, RateEstimate, RateKind};
use crate::stats::ConfidenceInterval;

/// A condition evaluated over one set of records
#[derive(Debug, Clone)]
pub struct Series<'a> {
    /// Index of the condition in the cohort
    pub condition: usize,
    pub condition_name: &'a str,
    pub group: &'a str,
    pub subgroup: String,
    pub records: Vec<&'a PatientRecord>,
}

/// Records grouped by their value in one stratifying column
///
/// Values appear in the order they are first met; records with no value
/// belong to no partition.
#[must_use]
pub fn partition<'a>(
    records: &'a [PatientRecord],
    stratum: usize,
) -> Vec<(&'a str, Vec<&'a PatientRecord>)> {
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
    let mut partitions: Vec<(&str, Vec<&PatientRecord>)> = Vec::new();

    for record in records {
        let Some(value) = record.stratum(stratum) else {
            continue;
        };
        let position = *positions.entry(value).or_insert_with(|| {
            partitions.push((value, Vec::new()));
            partitions.len() - 1
        });
        partitions[position].1.push(record);
    }

    partitions
}

fn condition_indices<'a>(cohort: &Cohort, config: &'a AnalysisConfig) -> Result<Vec<(usize, &'a str)>> {
    let mut missing = Vec::new();
    let indices: Vec<_> = config
        .conditions
        .iter()
        .filter_map(|name| match cohort.condition_index(name) {
            Some(index) => Some((index, name.as_str())),
            None => {
                missing.push(name.clone());
                None
            }
        })
        .collect();

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(IncPrevError::MissingColumns(missing))
    }
}

/// One series per condition over the whole cohort
pub fn plan_overall<'a>(cohort: &'a Cohort, config: &'a AnalysisConfig) -> Result<Vec<Series<'a>>> {
    let records: Vec<&PatientRecord> = cohort.records().iter().collect();

    Ok(condition_indices(cohort, config)?
        .into_iter()
        .map(|(condition, condition_name)| Series {
            condition,
            condition_name,
            group: OVERALL_GROUP,
            subgroup: String::new(),
            records: records.clone(),
        })
        .collect())
}

/// One series per condition, stratifying column and value
pub fn plan_grouped<'a>(cohort: &'a Cohort, config: &'a AnalysisConfig) -> Result<Vec<Series<'a>>> {
    let conditions = condition_indices(cohort, config)?;

    let mut missing = Vec::new();
    let mut partitioned = Vec::with_capacity(config.demography.len());
    for column in &config.demography {
        match cohort.stratum_index(column) {
            Some(index) => partitioned.push((column.as_str(), partition(cohort.records(), index))),
            None => missing.push(column.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(IncPrevError::MissingColumns(missing));
    }

    let mut plan = Vec::new();
    for (condition, condition_name) in conditions {
        for (column, partitions) in &partitioned {
            debug!(
                "{condition_name}: {} partitions of {column}",
                partitions.len()
            );
            for (value, records) in partitions {
                plan.push(Series {
                    condition,
                    condition_name,
                    group: *column,
                    subgroup: (*value).to_string(),
                    records: records.clone(),
                });
            }
        }
    }

    Ok(plan)
}

/// Turn counts into a scaled estimate with its confidence interval
#[must_use]
pub fn build_estimate(
    kind: RateKind,
    series: &Series<'_>,
    slice: &TimeSlice,
    counts: PeriodCounts,
    config: &AnalysisConfig,
) -> RateEstimate {
    let (lower, upper) =
        config
            .confidence_method
            .bounds(counts.numerator as f64, counts.denominator, config.alpha);

    RateEstimate {
        kind,
        condition: series.condition_name.to_string(),
        period_start: slice.start,
        period_label: config.date_format.format(slice.start),
        group: series.group.to_string(),
        subgroup: series.subgroup.clone(),
        value: counts.ratio() * config.person_years,
        numerator: counts.numerator,
        denominator: counts.denominator,
        lower_ci: lower * config.person_years,
        upper_ci: upper * config.person_years,
    }
}

/// A windowed rate calculation over a cohort
pub trait RateCalculator: Sync {
    fn kind(&self) -> RateKind;

    /// Numerator and denominator for one condition over `records` in `slice`
    fn counts(&self, records: &[&PatientRecord], slice: &TimeSlice, condition: usize) -> PeriodCounts;

    /// Evaluate planned series over every slice of the study
    fn evaluate(
        &self,
        plan: &[Series<'_>],
        config: &AnalysisConfig,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<RateEstimate>> {
        let slices: Vec<TimeSlice> = PeriodWindower::from_config(config)?.slices().collect();
        let mut estimates = Vec::with_capacity(plan.len() * slices.len());

        for series in plan {
            let rows: Vec<RateEstimate> = slices
                .par_iter()
                .map(|slice| {
                    let counts = self.counts(&series.records, slice, series.condition);
                    build_estimate(self.kind(), series, slice, counts, config)
                })
                .collect();
            estimates.extend(rows);

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        Ok(estimates)
    }

    /// Estimates for every condition over the whole cohort
    fn overall(&self, cohort: &Cohort, config: &AnalysisConfig) -> Result<Vec<RateEstimate>> {
        config.validate()?;
        self.evaluate(&plan_overall(cohort, config)?, config, None)
    }

    /// Estimates for every condition within each value of each stratifying column
    fn grouped(&self, cohort: &Cohort, config: &AnalysisConfig) -> Result<Vec<RateEstimate>> {
        config.validate()?;
        self.evaluate(&plan_grouped(cohort, config)?, config, None)
    }

    /// Overall estimates followed by grouped estimates
    fn analyse(&self, cohort: &Cohort, config: &AnalysisConfig) -> Result<Vec<RateEstimate>> {
        let mut estimates = self.overall(cohort, config)?;
        estimates.extend(self.grouped(cohort, config)?);
        Ok(estimates)
    }
}
