//! Streaming filter and aggregator for the MySQL slow query log.
pub mod record;
pub mod parser;
pub mod filter;
pub mod assembler;
pub mod aggregate;
pub mod sort;
pub mod report;
pub mod config;
pub mod engine;
pub mod input;

pub use config::{Config, ConfigError, Options, ReportFormat};
pub use engine::{run, Engine, RunStats};
pub use filter::{DateRange, FilterConfig};
pub use record::{Metrics, Record};
pub use report::{LineSink, WriteSink};
pub use sort::{SortKey, SortSpec};
