use tracing::{debug, warn};

use crate::filter::FilterConfig;
use crate::parser::{self, LineKind};
use crate::record::{Metrics, Record};

/// Rebuilds records from raw slow log lines, one line at a time.
///
/// Actor and metrics rules are applied as soon as their header arrives, so the
/// payload of an already excluded entry is never buffered. Records handed out
/// have passed both; payload and date rules are left to the caller.
pub struct RecordAssembler<'a> {
    filter: &'a FilterConfig,
    timestamp: String,
    actor: String,
    metrics: Option<Metrics>,
    payload: String,
    included: bool,
    malformed: u64,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(filter: &'a FilterConfig) -> Self {
        Self {
            filter,
            timestamp: String::new(),
            actor: String::new(),
            metrics: None,
            payload: String::new(),
            included: false,
            malformed: 0,
        }
    }

    pub fn push(&mut self, line: &str) -> Option<Record> {
        let kind = parser::classify_line(line);
        if !kind.is_header() {
            if self.included {
                // Lines are joined as-is, without a separator.
                self.payload.push_str(line);
            }
            return None;
        }

        // Any header closes the pending entry: MySQL skips `# Time:` for
        // consecutive queries logged within the same second.
        let done = self.take_record();

        match kind {
            LineKind::Time(ts) => self.timestamp = ts.to_string(),
            LineKind::Actor(actor) => {
                self.actor = actor.to_string();
                self.metrics = None;
                self.included = self.filter.actor_matches(actor);
            }
            LineKind::Metrics(text) if self.included => match parser::parse_metrics(text) {
                Some(metrics) => {
                    self.included = self.filter.metrics_match(&metrics);
                    self.metrics = Some(metrics);
                }
                None => {
                    self.malformed += 1;
                    if self.malformed == 1 {
                        warn!(
                            line,
                            "metrics header is not four integers (fractional times are not \
                             supported); such entries are skipped"
                        );
                    } else {
                        debug!(actor = %self.actor, line, "malformed metrics header, skipped");
                    }
                    self.included = false;
                    self.metrics = None;
                }
            },
            _ => {}
        }
        done
    }

    /// Entries skipped so far because their metrics header did not parse.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Flushes the entry still pending at end of input.
    pub fn finish(&mut self) -> Option<Record> {
        self.take_record()
    }

    fn take_record(&mut self) -> Option<Record> {
        let payload = std::mem::take(&mut self.payload);
        if payload.trim().is_empty() {
            return None;
        }
        self.included = false;
        let Some(metrics) = self.metrics.take() else {
            debug!(actor = %self.actor, "payload without metrics header dropped");
            return None;
        };
        Some(Record {
            timestamp: self.timestamp.clone(),
            actor: self.actor.clone(),
            metrics,
            payload,
        })
    }
}
