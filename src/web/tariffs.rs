use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;

use super::{AppState, error_response};
use crate::error::{HdoError, Result};
use crate::tariff::to_unix_records;

/// Parsed tariff request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TariffQuery {
    pub command: i64,
    pub days: i64,
    /// `unixTime` was present in the query string
    pub unix_time: bool,
}

impl TariffQuery {
    /// Build from raw query parameters. `command` and `days` must be present
    /// (checked in that order); their values are coerced, never rejected.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let command = params
            .get("command")
            .ok_or_else(|| HdoError::validation("command", "Missing 'command' argument"))?;
        let days = params
            .get("days")
            .ok_or_else(|| HdoError::validation("days", "Missing 'days' argument"))?;
        Ok(Self {
            command: coerce_int(command),
            days: coerce_int(days),
            unix_time: params.contains_key("unixTime"),
        })
    }
}

/// Permissive integer coercion: optional leading whitespace and sign, then
/// as many decimal digits as follow. No digits yields 0; overflow saturates.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            let digit = i64::from(b - b'0');
            if negative {
                acc.saturating_mul(10).saturating_sub(digit)
            } else {
                acc.saturating_mul(10).saturating_add(digit)
            }
        })
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/tariffs",
    params(
        ("command" = String, Query, description = "HDO command code"),
        ("days" = String, Query, description = "Number of days to fetch"),
        ("unixTime" = Option<String>, Query, description = "When present, timestamps are epoch seconds"),
    ),
    responses(
        (status = 200, description = "Tariff windows", body = [crate::tariff::TariffRecord]),
        (status = 400, description = "Missing argument"),
        (status = 500, description = "Fetch process failed"),
    )
))]
pub async fn tariffs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = match TariffQuery::from_params(&params) {
        Ok(q) => q,
        Err(e) => return error_response(&e),
    };

    let records = match state.cache.get_tariff_data(query.command, query.days).await {
        Ok(records) => records,
        Err(e) => return error_response(&e),
    };

    if !query.unix_time {
        return Json(records).into_response();
    }
    match to_unix_records(&records, state.cache.timezone()) {
        Ok(unix) => Json(unix).into_response(),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("568"), 568);
        assert_eq!(coerce_int("12abc"), 12);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("  -7"), -7);
        assert_eq!(coerce_int("+3days"), 3);
        assert_eq!(coerce_int("3.9"), 3);
        assert_eq!(coerce_int("- 4"), 0);
        assert_eq!(coerce_int("99999999999999999999999"), i64::MAX);
        assert_eq!(coerce_int("-99999999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_missing_command_checked_first() {
        let err = TariffQuery::from_params(&params(&[])).unwrap_err();
        assert!(
            matches!(err, HdoError::Validation { ref message, .. } if message == "Missing 'command' argument")
        );

        let err = TariffQuery::from_params(&params(&[("days", "3")])).unwrap_err();
        assert!(
            matches!(err, HdoError::Validation { ref message, .. } if message == "Missing 'command' argument")
        );
    }

    #[test]
    fn test_missing_days() {
        let err = TariffQuery::from_params(&params(&[("command", "1")])).unwrap_err();
        assert!(
            matches!(err, HdoError::Validation { ref message, .. } if message == "Missing 'days' argument")
        );
    }

    #[test]
    fn test_unix_time_is_presence_only() {
        let q = TariffQuery::from_params(&params(&[("command", "1"), ("days", "3")])).unwrap();
        assert!(!q.unix_time);

        let q = TariffQuery::from_params(&params(&[
            ("command", "1"),
            ("days", "3"),
            ("unixTime", ""),
        ]))
        .unwrap();
        assert!(q.unix_time);

        let q = TariffQuery::from_params(&params(&[
            ("command", "x"),
            ("days", "2y"),
            ("unixTime", "0"),
        ]))
        .unwrap();
        assert_eq!(
            q,
            TariffQuery {
                command: 0,
                days: 2,
                unix_time: true
            }
        );
    }
}
