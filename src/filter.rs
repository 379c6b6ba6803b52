use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::{Bound, RangeBounds};

use crate::config::ConfigError;
use crate::parser;
use crate::record::{Metrics, Record};

/// Inclusion rules for one run. Substring lists are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub min_duration: u64,
    /// 0 disables the rows-examined alternative of the metrics rule.
    pub min_rows_examined: u64,
    pub include_actors: Vec<String>,
    pub exclude_actors: Vec<String>,
    pub include_payloads: Vec<String>,
    pub date_range: Option<DateRange>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_duration: 1,
            min_rows_examined: 0,
            include_actors: Vec::new(),
            exclude_actors: Vec::new(),
            include_payloads: Vec::new(),
            date_range: None,
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(&n.to_lowercase()))
}

impl FilterConfig {
    /// Include list wins outright; the exclude list only applies when it is empty.
    pub fn actor_matches(&self, actor: &str) -> bool {
        if self.include_actors.is_empty() {
            !contains_any(actor, &self.exclude_actors)
        } else {
            contains_any(actor, &self.include_actors)
        }
    }

    pub fn metrics_match(&self, metrics: &Metrics) -> bool {
        metrics.duration_seconds >= self.min_duration
            || (self.min_rows_examined > 0
                && metrics.rows_examined >= BigUint::from(self.min_rows_examined))
    }

    pub fn payload_matches(&self, payload: &str) -> bool {
        self.include_payloads.is_empty() || contains_any(payload, &self.include_payloads)
    }

    /// Fails closed: with a range configured, an unparsable timestamp never matches.
    pub fn date_matches(&self, timestamp: &str) -> bool {
        match &self.date_range {
            None => true,
            Some(range) => parser::parse_timestamp(timestamp)
                .map(|t| range.contains(&t))
                .unwrap_or(false),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.actor_matches(&record.actor)
            && self.metrics_match(&record.metrics)
            && self.payload_matches(&record.payload)
            && self.date_matches(&record.timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Bound<NaiveDateTime>,
    pub end: Bound<NaiveDateTime>,
}

static RE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    let date = r"\d{1,2}\.\d{1,2}\.\d{4}|\d{4}-\d{1,2}-\d{1,2}";
    Regex::new(&format!(
        r"^(?P<op>[<>])?(?P<first>{date})?(?P<dash>-)?(?P<second>{date})?$"
    ))
    .unwrap()
});

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

impl DateRange {
    pub fn new(start: Bound<NaiveDateTime>, end: Bound<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Parses a date directive. Dates are `dd.mm.yyyy` or `yyyy-mm-dd`.
    ///
    /// `D` selects that whole day, `D1-D2` both days and everything between
    /// (in either order), `>D` everything after day D, `D-` day D onward,
    /// `<D` everything before day D and `-D` everything up to and including day D.
    pub fn parse(directive: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidDate(directive.to_string());
        let caps = RE_DIRECTIVE.captures(directive.trim()).ok_or_else(invalid)?;
        let date = |name: &str| -> Result<Option<NaiveDate>, ConfigError> {
            match caps.name(name) {
                None => Ok(None),
                Some(m) => parse_date(m.as_str()).map(Some).ok_or_else(invalid),
            }
        };
        let next_day = |d: NaiveDate| d.succ_opt().map(midnight).ok_or_else(invalid);

        let op = caps.name("op").map(|m| m.as_str());
        let dash = caps.name("dash").is_some();
        let (first, second) = (date("first")?, date("second")?);

        let range = match (op, first, dash, second) {
            (Some(">"), Some(d), false, None) => {
                Self::new(Bound::Included(next_day(d)?), Bound::Unbounded)
            }
            (Some("<"), Some(d), false, None) => {
                Self::new(Bound::Unbounded, Bound::Excluded(midnight(d)))
            }
            (None, Some(d), false, None) => {
                Self::new(Bound::Included(midnight(d)), Bound::Excluded(next_day(d)?))
            }
            (None, Some(d), true, None) => {
                Self::new(Bound::Included(midnight(d)), Bound::Unbounded)
            }
            (None, None, true, Some(d)) => {
                Self::new(Bound::Unbounded, Bound::Excluded(next_day(d)?))
            }
            (None, Some(a), true, Some(b)) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                Self::new(Bound::Included(midnight(lo)), Bound::Excluded(next_day(hi)?))
            }
            _ => return Err(invalid()),
        };
        Ok(range)
    }

    pub fn contains(&self, instant: &NaiveDateTime) -> bool {
        RangeBounds::contains(&(self.start, self.end), instant)
    }
}
