//! Utility functions shared by loading, analysis and output

pub mod arrow_utils;
pub mod logging;
