use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::Metrics;

/// Prefix shared by every header line of the slow log.
pub const HEADER_MARKER: &str = "# ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `# Time: 070119 12:29:58`, carries the trimmed timestamp text.
    Time(&'a str),
    /// `# User@Host: root[root] @ localhost []`, carries the trimmed identity.
    Actor(&'a str),
    /// `# Query_time: ...`, carries the text after the marker.
    Metrics(&'a str),
    /// Any other `# ` line (`# Schema:`, `# Thread_id:`, ...).
    OtherHeader,
    Payload,
}

impl LineKind<'_> {
    pub fn is_header(&self) -> bool {
        !matches!(self, LineKind::Payload)
    }
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let Some(rest) = line.strip_prefix(HEADER_MARKER) else {
        return LineKind::Payload;
    };
    if let Some(ts) = rest.strip_prefix("Time:") {
        LineKind::Time(ts.trim())
    } else if let Some(actor) = rest.strip_prefix("User@Host:") {
        LineKind::Actor(actor.trim())
    } else if rest.starts_with("Query_time:") {
        LineKind::Metrics(rest)
    } else {
        LineKind::OtherHeader
    }
}

static RE_METRICS: Lazy<Regex> = Lazy::new(|| {
    // Percona/MariaDB append further fields after Rows_examined; they are ignored.
    Regex::new(
        r"^Query_time:\s*(\d+)\s+Lock_time:\s*(\d+)\s+Rows_sent:\s*(\d+)\s+Rows_examined:\s*(\d+)",
    )
    .unwrap()
});

/// Parses the four integers of a metrics header. `None` means malformed:
/// a missing field, a non-integer value or a time that overflows `u64`.
pub fn parse_metrics(text: &str) -> Option<Metrics> {
    let caps = RE_METRICS.captures(text.trim())?;
    Some(Metrics {
        duration_seconds: caps[1].parse().ok()?,
        lock_seconds: caps[2].parse().ok()?,
        rows_sent: caps[3].parse::<BigUint>().ok()?,
        rows_examined: caps[4].parse::<BigUint>().ok()?,
    })
}

/// Parses a `# Time:` value into an absolute instant.
///
/// Accepts the classic `yymmdd H:MM:SS` layout (hour space padded by the
/// server) and the RFC 3339 form written by MySQL 5.7+, which is converted to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt);
    }
    let mut parts = text.split_whitespace();
    let (date, time) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%y%m%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    Some(date.and_time(time))
}
