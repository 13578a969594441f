//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging and progress tracking.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use log::{log_input_read, log_input_start, log_table_written, log_unusable_values};
pub use progress::{create_main_progress_bar, finish_progress_bar};
