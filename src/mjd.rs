//! Modified Julian Date conversion.
//!
//! DETECT files store their time axis as fractional days since
//! 1858-11-17T00:00:00Z.

use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Origin of the Modified Julian Date scale
pub fn mjd_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1858, 11, 17, 0, 0, 0)
        .single()
        .expect("MJD epoch is a valid date")
}

/// Convert a Modified Julian Date to a UTC timestamp.
///
/// Whole days are added exactly; the fractional part of the day is rounded
/// to the nearest microsecond.
pub fn mjd_to_datetime(mjd: f64) -> Result<DateTime<Utc>> {
    if !mjd.is_finite() {
        return Err(AppError::InvalidData(format!(
            "MJD value {} is not a finite number",
            mjd
        )));
    }

    let whole_days = mjd.floor();
    let micros = ((mjd - whole_days) * MICROS_PER_DAY).round() as i64;

    let out_of_range =
        || AppError::InvalidData(format!("MJD value {} is outside the supported date range", mjd));

    if whole_days.abs() > i32::MAX as f64 {
        return Err(out_of_range());
    }

    let days = Duration::try_days(whole_days as i64).ok_or_else(out_of_range)?;

    mjd_epoch()
        .checked_add_signed(days)
        .and_then(|t| t.checked_add_signed(Duration::microseconds(micros)))
        .ok_or_else(out_of_range)
}
