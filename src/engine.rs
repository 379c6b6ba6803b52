use std::io;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::assembler::RecordAssembler;
use crate::config::Config;
use crate::record::Record;
use crate::report::{self, LineSink};

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: u64,
    /// Records that passed the actor and metrics rules.
    pub candidates: u64,
    /// Records that passed every rule.
    pub included: u64,
    /// Distinct payload groups, 0 in streaming mode.
    pub groups: usize,
    /// Groups actually written after `top` truncation.
    pub reported: usize,
    /// Entries skipped for an unparsable metrics header.
    pub malformed: u64,
}

/// Single pass over a slow log: lines in, filtered records or a report out.
pub struct Engine<'c> {
    config: &'c Config,
    assembler: RecordAssembler<'c>,
    aggregator: Option<Aggregator>,
    stats: RunStats,
}

impl<'c> Engine<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            assembler: RecordAssembler::new(&config.filter),
            aggregator: config.dedup.then(Aggregator::new),
            stats: RunStats::default(),
        }
    }

    /// In streaming mode a completed record is written before this returns.
    pub fn push_line<S: LineSink + ?Sized>(&mut self, line: &str, sink: &mut S) -> io::Result<()> {
        self.stats.lines += 1;
        match self.assembler.push(line) {
            Some(record) => self.accept(record, sink),
            None => Ok(()),
        }
    }

    /// Flushes the last record and, when aggregating, writes the sorted report.
    pub fn finish<S: LineSink + ?Sized>(mut self, sink: &mut S) -> io::Result<RunStats> {
        if let Some(record) = self.assembler.finish() {
            self.accept(record, sink)?;
        }
        self.stats.malformed = self.assembler.malformed();
        if let Some(aggregator) = self.aggregator.take() {
            let mut groups = aggregator.finish();
            self.stats.groups = groups.len();
            self.config.sort.sort(&mut groups);
            if self.config.top > 0 {
                groups.truncate(self.config.top);
            }
            self.stats.reported = groups.len();
            report::write_report(&groups, self.config.details, self.config.format, sink)?;
        }
        info!(
            lines = self.stats.lines,
            candidates = self.stats.candidates,
            included = self.stats.included,
            groups = self.stats.groups,
            malformed = self.stats.malformed,
            "slow log processed"
        );
        Ok(self.stats)
    }

    fn accept<S: LineSink + ?Sized>(&mut self, record: Record, sink: &mut S) -> io::Result<()> {
        self.stats.candidates += 1;
        let filter = &self.config.filter;
        if !filter.payload_matches(&record.payload) {
            debug!(actor = %record.actor, "query text filter rejected record");
            return Ok(());
        }
        if !filter.date_matches(&record.timestamp) {
            debug!(timestamp = %record.timestamp, "date range rejected record");
            return Ok(());
        }
        self.stats.included += 1;
        match self.aggregator.as_mut() {
            Some(aggregator) => {
                aggregator.fold(record);
                Ok(())
            }
            None => report::write_record(&record, sink),
        }
    }
}

/// Runs a whole input through a fresh engine.
pub fn run<I, S>(config: &Config, lines: I, sink: &mut S) -> io::Result<RunStats>
where
    I: IntoIterator<Item = io::Result<String>>,
    S: LineSink + ?Sized,
{
    let mut engine = Engine::new(config);
    for line in lines {
        engine.push_line(&line?, sink)?;
    }
    engine.finish(sink)
}
