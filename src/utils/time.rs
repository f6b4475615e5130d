//! Time parsing and formatting for plan timestamps

use crate::domain::errors::DomainError;

/// Parser for the time values a translator may emit
///
/// Accepted forms: plain seconds (`12.5`), `MM:SS(.ms)` and `HH:MM:SS(.ms)`.
pub struct TimeParser;

impl TimeParser {
    /// Parse a time string to seconds
    pub fn parse_seconds(time_str: &str) -> Result<f64, DomainError> {
        let trimmed = time_str.trim();
        let invalid = || DomainError::BadArgs(format!("Invalid time value: '{}'", trimmed));

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(invalid());
            }
            return Ok(seconds);
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [mm, ss] => ("0", *mm, *ss),
            [hh, mm, ss] => (*hh, *mm, *ss),
            _ => return Err(invalid()),
        };

        let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
        let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
        let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;

        if parts.len() == 3 && minutes >= 60 {
            return Err(invalid());
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(invalid());
        }

        Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
    }

    /// Format seconds as `MM:SS.mmm`, or `HH:MM:SS.mmm` past the hour
    pub fn format_time(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, secs, millis)
        }
    }
}
