//! Tariff window records
//!
//! A record is one time window and the tariff label that applies during it,
//! as printed by the fetch process: `<start-iso8601> <end-iso8601> <label>`.

use crate::error::{HdoError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Tariff window with timestamps as produced by the fetch process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TariffRecord {
    /// Window start, ISO-8601
    pub start: String,
    /// Window end, ISO-8601
    pub end: String,
    /// Opaque tariff label (`N` low, `V` high for PRE-distribuce data)
    pub tariff: String,
}

/// Tariff window with timestamps as Unix epoch seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UnixTariffRecord {
    pub start: i64,
    pub end: i64,
    pub tariff: String,
}

impl TariffRecord {
    pub fn new<S: Into<String>>(start: S, end: S, tariff: S) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            tariff: tariff.into(),
        }
    }

    /// Parse one output line of the fetch process.
    ///
    /// The line must hold exactly three whitespace-separated fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let (start, end, tariff) = (fields.next()?, fields.next()?, fields.next()?);
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(start, end, tariff))
    }

    /// Convert both timestamps to epoch seconds. Timestamps without an
    /// offset are read as local time in `tz`.
    pub fn to_unix(&self, tz: Tz) -> Result<UnixTariffRecord> {
        Ok(UnixTariffRecord {
            start: parse_timestamp(&self.start, tz)?,
            end: parse_timestamp(&self.end, tz)?,
            tariff: self.tariff.clone(),
        })
    }
}

/// Records of one fetch plus the lines that were passed over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub records: Vec<TariffRecord>,
    /// `(1-based line number, line)` of three-field lines that are not
    /// records, such as the fetcher echoing its source URL
    pub skipped: Vec<(usize, String)>,
}

/// Parse the complete stdout of a successful fetch.
///
/// Blank lines are skipped. A three-field line whose start or end is not an
/// ISO-8601 date-time is diagnostic output and lands in `skipped`. Any line
/// with a different field count fails the whole output.
pub fn parse_output(stdout: &str) -> Result<ParsedOutput> {
    let mut parsed = ParsedOutput::default();
    for (idx, line) in stdout.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = TariffRecord::parse_line(line).ok_or_else(|| {
            HdoError::malformed_output(format!(
                "line {} does not have 3 fields: {:?}",
                idx + 1,
                line
            ))
        })?;
        if is_timestamp(&record.start) && is_timestamp(&record.end) {
            parsed.records.push(record);
        } else {
            parsed.skipped.push((idx + 1, line.to_string()));
        }
    }
    Ok(parsed)
}

/// Convert a whole record set for a `unixTime` response
pub fn to_unix_records(records: &[TariffRecord], tz: Tz) -> Result<Vec<UnixTariffRecord>> {
    records.iter().map(|r| r.to_unix(tz)).collect()
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Whether `value` has the shape of an ISO-8601 date-time this module reads
pub fn is_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NAIVE_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

/// ISO-8601 date-time to Unix epoch seconds
pub fn parse_timestamp(value: &str, tz: Tz) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }

    let mut last_err = None;
    for fmt in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(value, fmt) {
            Ok(naive) => {
                // Ambiguous local times (DST fold) resolve to the earlier instant
                return tz
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.timestamp())
                    .ok_or_else(|| {
                        HdoError::malformed_output(format!("{value} does not exist in {tz}"))
                    });
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(HdoError::malformed_output(match last_err {
        Some(e) => format!("invalid timestamp {value:?}: {e}"),
        None => format!("invalid timestamp {value:?}"),
    }))
}
