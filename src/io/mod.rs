//! Reading cohort files and writing result tables

pub mod loader;
pub mod writer;

pub use loader::{DEFAULT_BATCH_SIZE, InputFormat, check_inputs, extract_cohort, load_batches};
pub use writer::{estimates_to_batch, result_schema, write_estimates};
