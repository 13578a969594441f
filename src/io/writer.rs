//! Result table writing
//!
//! Estimates are converted into an Arrow record batch and written with
//! the Arrow CSV writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::models::{RateEstimate, RateKind};
use crate::utils::logging::log_table_written;

/// Arrow schema of a result table
#[must_use]
pub fn result_schema(kind: RateKind) -> Schema {
    let denominator = match kind {
        RateKind::Incidence => DataType::Float64,
        RateKind::Prevalence => DataType::Int64,
    };

    Schema::new(vec![
        Field::new("Condition", DataType::Utf8, false),
        Field::new("Date", DataType::Utf8, false),
        Field::new("Group", DataType::Utf8, false),
        Field::new("Subgroup", DataType::Utf8, false),
        Field::new(kind.value_column(), DataType::Float64, false),
        Field::new("Numerator", DataType::UInt64, false),
        Field::new("Denominator", denominator, false),
        Field::new("Lower_CI", DataType::Float64, false),
        Field::new("Upper_CI", DataType::Float64, false),
    ])
}

/// Build a record batch from estimates of a single kind
///
/// # Errors
/// Returns an error if the batch cannot be assembled
pub fn estimates_to_batch(kind: RateKind, estimates: &[RateEstimate]) -> Result<RecordBatch> {
    let strings = |f: fn(&RateEstimate) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(estimates.iter().map(f)))
    };
    let floats = |f: fn(&RateEstimate) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(estimates.iter().map(f)))
    };

    let denominator: ArrayRef = match kind {
        RateKind::Incidence => floats(|e| e.denominator),
        // Truncated head count
        RateKind::Prevalence => Arc::new(Int64Array::from_iter_values(
            estimates.iter().map(|e| e.reported_denominator() as i64),
        )),
    };

    let columns: Vec<ArrayRef> = vec![
        strings(|e| e.condition.as_str()),
        strings(|e| e.period_label.as_str()),
        strings(|e| e.group.as_str()),
        strings(|e| e.subgroup.as_str()),
        floats(|e| e.value),
        Arc::new(UInt64Array::from_iter_values(
            estimates.iter().map(|e| e.numerator),
        )),
        denominator,
        floats(|e| e.lower_ci),
        floats(|e| e.upper_ci),
    ];

    Ok(RecordBatch::try_new(Arc::new(result_schema(kind)), columns)?)
}

/// Write estimates as `<destination>/<kind file name>`
///
/// # Returns
/// Path of the written file
///
/// # Errors
/// Returns an error if the file cannot be created or written
pub fn write_estimates(
    destination: &Path,
    kind: RateKind,
    estimates: &[RateEstimate],
) -> Result<PathBuf> {
    let path = destination.join(kind.file_name());
    let start = std::time::Instant::now();

    let batch = estimates_to_batch(kind, estimates)?;
    let file = BufWriter::new(File::create(&path)?);
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    writer.into_inner().flush()?;

    log_table_written(kind, &path, batch.num_rows(), start.elapsed());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn estimate(kind: RateKind, denominator: f64) -> RateEstimate {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        RateEstimate {
            kind,
            condition: "Asthma".to_string(),
            period_start: start,
            period_label: "2001-01-01".to_string(),
            group: "Overall".to_string(),
            subgroup: String::new(),
            value: 0.5,
            numerator: 2,
            denominator,
            lower_ci: 0.1,
            upper_ci: 1.5,
        }
    }

    #[test]
    fn test_prevalence_denominator_is_truncated() {
        let batch =
            estimates_to_batch(RateKind::Prevalence, &[estimate(RateKind::Prevalence, 4.00000001)])
                .unwrap();
        let denominators = batch
            .column(6)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(denominators.value(0), 4);
        assert_eq!(batch.schema().field(4).name(), "Prevalence");
    }

    #[test]
    fn test_write_incidence_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_estimates(
            dir.path(),
            RateKind::Incidence,
            &[estimate(RateKind::Incidence, 1.5)],
        )
        .unwrap();
        assert_eq!(path.file_name().unwrap(), "incidence_analysis.csv");

        let contents = std::fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("Condition,Date,Group,Subgroup,Incidence,Numerator,Denominator,Lower_CI,Upper_CI")
        );
        assert_eq!(lines.next(), Some("Asthma,2001-01-01,Overall,,0.5,2,1.5,0.1,1.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_estimates(dir.path(), RateKind::Prevalence, &[]).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
