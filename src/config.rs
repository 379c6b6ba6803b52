use itertools::Itertools;
use std::str::FromStr;
use thiserror::Error;

use crate::filter::{DateRange, FilterConfig};
use crate::sort::SortSpec;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown sort key `{0}`")]
    UnknownSortKey(String),
    #[error("invalid date directive `{0}`")]
    InvalidDate(String),
    #[error("unknown report format `{0}` (expected text or json)")]
    UnknownFormat(String),
}

/// Rendering of the aggregated report. Streaming output is always text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub filter: FilterConfig,
    /// Aggregate by payload instead of streaming each record.
    pub dedup: bool,
    /// List every execution under its actor in the aggregated report.
    pub details: bool,
    pub sort: SortSpec,
    /// Maximum number of groups reported, 0 for all.
    pub top: usize,
    pub format: ReportFormat,
}

/// Raw command line values, before validation.
#[derive(Debug, Clone)]
pub struct Options {
    pub min_query_time: u64,
    pub min_rows_examined: u64,
    pub include_users: Vec<String>,
    pub exclude_users: Vec<String>,
    pub include_queries: Vec<String>,
    pub date: Option<String>,
    pub no_duplicates: bool,
    pub details: bool,
    pub top: usize,
    /// Key names; each item may be a comma separated list.
    pub sort: Vec<String>,
    pub format: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_query_time: 1,
            min_rows_examined: 0,
            include_users: Vec::new(),
            exclude_users: Vec::new(),
            include_queries: Vec::new(),
            date: None,
            no_duplicates: false,
            details: false,
            top: 0,
            sort: Vec::new(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Validates the date directive, sort keys and format; repeated substrings are dropped.
    pub fn from_options(opts: Options) -> Result<Self, ConfigError> {
        let date_range = opts.date.as_deref().map(DateRange::parse).transpose()?;
        Ok(Self {
            filter: FilterConfig {
                min_duration: opts.min_query_time,
                min_rows_examined: opts.min_rows_examined,
                include_actors: unique_values(opts.include_users),
                exclude_actors: unique_values(opts.exclude_users),
                include_payloads: unique_values(opts.include_queries),
                date_range,
            },
            dedup: opts.no_duplicates,
            details: opts.details,
            sort: SortSpec::parse(&opts.sort)?,
            top: opts.top,
            format: opts.format.parse()?,
        })
    }
}

/// Drops repeated values, keeping the first occurrence of each.
pub fn unique_values(values: Vec<String>) -> Vec<String> {
    values.into_iter().unique().collect()
}
