//! Arrow utility functions for extracting typed values from columns
//!
//! Values are read one row at a time and converted into the plain Rust
//! types the cohort model uses. Nulls, and values that cannot be
//! converted, come back as `None`.

use crate::config::DateFormat;
use crate::error::{IncPrevError, Result};
use arrow::array::{
    Array, ArrayRef, Date32Array, Date64Array, LargeStringArray, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use chrono::NaiveDate;

/// Extract a string value from an Arrow array at the specified index, handling nulls
///
/// Non-string columns are rendered with Arrow's display formatting, so a
/// numeric category such as `1` becomes `"1"`.
///
/// # Arguments
/// * `array` - The Arrow array
/// * `index` - The index of the value to extract
///
/// # Returns
/// `Some(String)` if the value exists and is not null, otherwise `None`
pub fn arrow_array_to_string(array: &ArrayRef, index: usize) -> Option<String> {
    if array.is_null(index) {
        return None;
    }

    let value = match array.data_type() {
        DataType::Utf8 => array
            .as_any()
            .downcast_ref::<StringArray>()?
            .value(index)
            .to_string(),
        DataType::LargeUtf8 => array
            .as_any()
            .downcast_ref::<LargeStringArray>()?
            .value(index)
            .to_string(),
        _ => array_value_to_string(array, index).ok()?,
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extract a date value from an Arrow array at the specified index, handling nulls
///
/// Native date and timestamp columns are used as they are, keeping the
/// calendar date of a timestamp; text columns are parsed with `format`.
///
/// # Arguments
/// * `array` - The Arrow array
/// * `index` - The index of the value to extract
/// * `format` - Format for text dates
///
/// # Returns
/// `Some(NaiveDate)` if the value exists and can be read as a date, otherwise `None`
pub fn arrow_array_to_date(array: &ArrayRef, index: usize, format: &DateFormat) -> Option<NaiveDate> {
    if array.is_null(index) {
        return None;
    }

    match array.data_type() {
        DataType::Date32 => {
            let date_array = array.as_any().downcast_ref::<Date32Array>()?;
            date_array.value_as_date(index)
        }
        DataType::Date64 => {
            let date_array = array.as_any().downcast_ref::<Date64Array>()?;
            date_array.value_as_date(index)
        }
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => array
                    .as_any()
                    .downcast_ref::<TimestampSecondArray>()?
                    .value_as_datetime(index),
                TimeUnit::Millisecond => array
                    .as_any()
                    .downcast_ref::<TimestampMillisecondArray>()?
                    .value_as_datetime(index),
                TimeUnit::Microsecond => array
                    .as_any()
                    .downcast_ref::<TimestampMicrosecondArray>()?
                    .value_as_datetime(index),
                TimeUnit::Nanosecond => array
                    .as_any()
                    .downcast_ref::<TimestampNanosecondArray>()?
                    .value_as_datetime(index),
            };
            datetime.map(|dt| dt.date())
        }
        DataType::Utf8 => {
            let string_array = array.as_any().downcast_ref::<StringArray>()?;
            format.parse(string_array.value(index))
        }
        DataType::LargeUtf8 => {
            let string_array = array.as_any().downcast_ref::<LargeStringArray>()?;
            format.parse(string_array.value(index))
        }
        _ => None,
    }
}

/// Get a column from a record batch by name
///
/// # Errors
/// Returns an error if the column does not exist
pub fn get_column(batch: &RecordBatch, column_name: &str) -> Result<ArrayRef> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| IncPrevError::MissingColumns(vec![column_name.to_string()]))?;
    Ok(batch.column(idx).clone())
}
