use chrono::{NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

pub const HOUR_SECS: i64 = 3600;

// Format of the stored cursor and of every emitted row timestamp.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Error, Debug, PartialEq)]
pub enum TimeError {
    #[error("unable to parse {0:?} as YYYY-MM-DDTHH:MM:SSZ")]
    Parse(String, #[source] chrono::ParseError),
    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),
}

pub fn truncate_to_hour(timestamp: i64) -> i64 {
    timestamp.div_euclid(HOUR_SECS) * HOUR_SECS
}

pub fn format_time(timestamp: i64) -> Result<String, TimeError> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .ok_or(TimeError::OutOfRange(timestamp))
}

pub fn parse_time(s: &str) -> Result<i64, TimeError> {
    let naive = NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| TimeError::Parse(s.to_string(), e))?;
    Ok(Utc.from_utc_datetime(&naive).timestamp())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: i64,
    end: i64, // exclusive
}

impl Window {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    // Nothing to fetch once the cursor has caught up with the current hour.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
