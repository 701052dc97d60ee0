//! Local time formatting for log lines and file names.

use chrono::{DateTime, Local, TimeZone};

/// Formats the current local time according to the specified format string.
///
/// The format string follows the same syntax as `chrono::format::strftime`.
///
/// # Examples
///
/// ```
/// use cutil::time::local_now;
///
/// let formatted = local_now("%H:%M:%S");
/// assert_eq!(formatted.len(), 8);
/// ```
pub fn local_now(format: &str) -> String {
    Local::now().format(format).to_string()
}

/// Formats a given point in time with a `strftime` format string.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use cutil::time::format_datetime;
///
/// let dt = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(format_datetime(&dt, "%Y%m%d_%H%M%S"), "20240309_070501");
/// ```
pub fn format_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime.format(format).to_string()
}
