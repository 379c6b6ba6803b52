use num_bigint::BigUint;
use std::fmt;

/// The four numbers carried by a `# Query_time:` header.
///
/// Row counters are unbounded: a single pathological entry may already exceed
/// `u64`, and the aggregated sums certainly can.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Metrics {
    pub duration_seconds: u64,
    pub lock_seconds: u64,
    pub rows_sent: BigUint,
    pub rows_examined: BigUint,
}

impl Metrics {
    pub fn new(
        duration_seconds: u64,
        lock_seconds: u64,
        rows_sent: u64,
        rows_examined: u64,
    ) -> Self {
        Self {
            duration_seconds,
            lock_seconds,
            rows_sent: BigUint::from(rows_sent),
            rows_examined: BigUint::from(rows_examined),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# Query_time: {}  Lock_time: {}  Rows_sent: {}  Rows_examined: {}",
            self.duration_seconds, self.lock_seconds, self.rows_sent, self.rows_examined
        )
    }
}

/// One reconstructed slow log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub actor: String,
    pub metrics: Metrics,
    pub payload: String,
}

impl Record {
    /// Normalized block: the three header lines, the payload and a blank separator.
    pub fn render_lines(&self) -> Vec<String> {
        vec![
            format!("# Time: {}", self.timestamp),
            format!("# User@Host: {}", self.actor),
            self.metrics.to_string(),
            self.payload.clone(),
            String::new(),
        ]
    }
}
