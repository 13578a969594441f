//! Input checks, projected loading and cohort extraction
//!
//! CSV files are read with every column as text so that date parsing is
//! governed by the configured [`DateFormat`](crate::config::DateFormat).
//! Parquet files may carry native date or timestamp columns.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::debug;
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};

use crate::config::AnalysisConfig;
use crate::error::{IncPrevError, Result};
use crate::models::{Cohort, PatientRecord};
use crate::utils::arrow_utils::{arrow_array_to_date, arrow_array_to_string, get_column};
use crate::utils::logging::{log_input_read, log_input_start, log_unusable_values};

/// Default batch size for reading input files
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Number of CSV records scanned to discover the header
const CSV_SCHEMA_SAMPLE: usize = 100;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    /// Detect the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Check the input file and the result destination before any work starts
///
/// # Errors
/// Returns an error if the input is not an existing `.csv` or `.parquet`
/// file, or if the destination is not an existing directory
pub fn check_inputs(filepath: &Path, destination: &Path) -> Result<InputFormat> {
    if !filepath.is_file() {
        return Err(IncPrevError::invalid_input(
            filepath,
            "input file does not exist",
        ));
    }
    let Some(format) = InputFormat::from_path(filepath) else {
        return Err(IncPrevError::invalid_input(
            filepath,
            "input must be a .csv or .parquet file",
        ));
    };
    if !destination.is_dir() {
        return Err(IncPrevError::invalid_input(
            destination,
            "destination must be an existing directory",
        ));
    }
    Ok(format)
}

/// Read the columns an analysis needs from a CSV or Parquet file
///
/// Every required column must be present; all missing names are reported
/// together.
///
/// # Errors
/// Returns an error if the file cannot be read or required columns are absent
pub fn load_batches(path: &Path, config: &AnalysisConfig) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_input_start(path);

    let format = InputFormat::from_path(path).ok_or_else(|| {
        IncPrevError::invalid_input(path, "input must be a .csv or .parquet file")
    })?;
    let batches = match format {
        InputFormat::Csv => read_csv(path, config)?,
        InputFormat::Parquet => read_parquet(path, config)?,
    };

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_input_read(path, rows, batches.len(), start.elapsed());
    Ok(batches)
}

/// Indices of the required columns within `fields`, in file order
fn projection(fields: &[&str], config: &AnalysisConfig) -> Result<Vec<usize>> {
    config.validate_columns(fields)?;

    Ok(config
        .required_columns()
        .into_iter()
        .filter_map(|column| fields.iter().position(|field| *field == column))
        .sorted_unstable()
        .dedup()
        .collect())
}

fn read_csv(path: &Path, config: &AnalysisConfig) -> Result<Vec<RecordBatch>> {
    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(CSV_SCHEMA_SAMPLE))?;
    file.rewind()?;

    // Text only, dates are parsed later with the configured format
    let schema = Schema::new(
        inferred
            .fields()
            .iter()
            .map(|field| Field::new(field.name(), DataType::Utf8, true))
            .collect_vec(),
    );
    let names = schema.fields().iter().map(|f| f.name().as_str()).collect_vec();
    let indices = projection(&names, config)?;
    debug!("Projecting CSV columns {indices:?} of {}", names.len());

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .with_projection(indices)
        .build(file)?;

    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn read_parquet(path: &Path, config: &AnalysisConfig) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let file_schema = builder.schema().clone();
    let names = file_schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect_vec();
    let indices = projection(&names, config)?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    let reader = builder
        .with_projection(mask)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;

    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Convert loaded batches into the cohort model
///
/// Condition dates that are empty or cannot be parsed are treated as
/// events that never occurred. Rows without a usable follow-up start or
/// end are skipped.
///
/// # Errors
/// Returns an error if a required column is absent from a batch, or if
/// rows were present but none had usable follow-up dates
pub fn extract_cohort(batches: &[RecordBatch], config: &AnalysisConfig) -> Result<Cohort> {
    let format = &config.date_format;
    let mut records = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut row = 0;
    let mut skipped = 0usize;
    let mut coerced = 0usize;

    for batch in batches {
        let start_col = get_column(batch, &config.follow_up_start_col)?;
        let end_col = get_column(batch, &config.follow_up_end_col)?;
        let condition_cols = config
            .conditions
            .iter()
            .map(|name| get_column(batch, name))
            .collect::<Result<Vec<_>>>()?;
        let stratum_cols = config
            .demography
            .iter()
            .map(|name| get_column(batch, name))
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            let position = row;
            row += 1;

            let (Some(follow_up_start), Some(follow_up_end)) = (
                arrow_array_to_date(&start_col, i, format),
                arrow_array_to_date(&end_col, i, format),
            ) else {
                skipped += 1;
                continue;
            };

            let condition_dates = condition_cols
                .iter()
                .map(|column| {
                    let date = arrow_array_to_date(column, i, format);
                    if date.is_none() && arrow_array_to_string(column, i).is_some() {
                        coerced += 1;
                    }
                    date
                })
                .collect();
            let strata = stratum_cols
                .iter()
                .map(|column| arrow_array_to_string(column, i))
                .collect();

            records.push(PatientRecord {
                row: position,
                follow_up_start,
                follow_up_end,
                condition_dates,
                strata,
            });
        }
    }

    if records.is_empty() && skipped > 0 {
        return Err(IncPrevError::NoUsableRows { skipped });
    }
    log_unusable_values(skipped, coerced);

    Ok(Cohort::new(
        config.conditions.clone(),
        config.demography.clone(),
        records,
    ))
}
