//! Log messages for the input and output steps of a run

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};

use crate::models::RateKind;

/// Reading of the cohort file is about to begin
pub fn log_input_start(path: &Path) {
    info!("Reading cohort from {}", path.display());
}

/// The cohort file was read
pub fn log_input_read(path: &Path, rows: usize, batches: usize, elapsed: Duration) {
    info!(
        "Read {rows} rows in {batches} batches from {} in {elapsed:?}",
        path.display()
    );
}

/// Rows that could not be used as they stand
///
/// `skipped` rows had no usable follow-up dates and were left out;
/// `coerced` condition values were unreadable and count as no event.
pub fn log_unusable_values(skipped: usize, coerced: usize) {
    if skipped > 0 {
        warn!("Skipped {skipped} rows with a missing or unparseable follow-up date");
    }
    if coerced > 0 {
        debug!("{coerced} condition values could not be read as dates and count as no event");
    }
}

/// A result table was written
pub fn log_table_written(kind: RateKind, path: &Path, rows: usize, elapsed: Duration) {
    info!(
        "Wrote {rows} {kind} rows to {} in {elapsed:?}",
        path.display()
    );
}
