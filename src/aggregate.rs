use itertools::Itertools;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::parser;
use crate::record::{Metrics, Record};
use crate::sort::{Metric, Precision, SortKey, Statistic, StatValue};

/// Exact mean kept in tenths, rounded half up.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Average {
    tenths: BigUint,
}

impl Average {
    pub fn of(sum: &BigUint, count: u64) -> Self {
        debug_assert!(count > 0, "average over an empty group");
        if count == 0 {
            return Self::default();
        }
        let count = BigUint::from(count);
        // round(10 * sum / count), half up
        let tenths = (sum * 20u32 + &count) / (count * 2u32);
        Self { tenths }
    }

    pub fn tenths(&self) -> &BigUint {
        &self.tenths
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ten = BigUint::from(10u32);
        write!(f, "{}.{}", &self.tenths / &ten, &self.tenths % &ten)
    }
}

/// Sum, maximum and mean of one metric across a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricStats<T> {
    pub sum: T,
    pub max: T,
    pub avg: Average,
}

/// One execution of a query by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub timestamp: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorStats {
    pub actor: String,
    /// Slowest first: duration, then lock time, then rows examined, all descending.
    pub occurrences: Vec<Occurrence>,
}

/// Finalized statistics of one payload group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStats {
    pub payload: String,
    pub execution_count: u64,
    pub query_time: MetricStats<u64>,
    pub lock_time: MetricStats<u64>,
    pub rows_sent: MetricStats<BigUint>,
    pub rows_examined: MetricStats<BigUint>,
    pub first_seen: String,
    /// `None` when every execution carries the same timestamp.
    pub last_seen: Option<String>,
    /// Sorted by actor identity.
    pub actors: Vec<ActorStats>,
}

impl GroupStats {
    pub fn stat(&self, key: SortKey) -> StatValue<'_> {
        let (statistic, metric) = match key {
            SortKey::ExecutionCount => return StatValue::Native(self.execution_count),
            SortKey::Stat(statistic, metric) => (statistic, metric),
        };
        let value = match (statistic, metric) {
            (Statistic::Avg, m) => StatValue::Unbounded(self.average(m).tenths()),
            (Statistic::Sum, Metric::QueryTime) => StatValue::Native(self.query_time.sum),
            (Statistic::Max, Metric::QueryTime) => StatValue::Native(self.query_time.max),
            (Statistic::Sum, Metric::LockTime) => StatValue::Native(self.lock_time.sum),
            (Statistic::Max, Metric::LockTime) => StatValue::Native(self.lock_time.max),
            (Statistic::Sum, Metric::RowsSent) => StatValue::Unbounded(&self.rows_sent.sum),
            (Statistic::Max, Metric::RowsSent) => StatValue::Unbounded(&self.rows_sent.max),
            (Statistic::Sum, Metric::RowsExamined) => StatValue::Unbounded(&self.rows_examined.sum),
            (Statistic::Max, Metric::RowsExamined) => StatValue::Unbounded(&self.rows_examined.max),
        };
        debug_assert_eq!(
            matches!(value, StatValue::Unbounded(_)),
            key.precision() == Precision::Unbounded,
            "{key} compared with the wrong precision"
        );
        value
    }

    pub fn average(&self, metric: Metric) -> &Average {
        match metric {
            Metric::QueryTime => &self.query_time.avg,
            Metric::LockTime => &self.lock_time.avg,
            Metric::RowsSent => &self.rows_sent.avg,
            Metric::RowsExamined => &self.rows_examined.avg,
        }
    }
}

/// Accumulation side of a payload group: actor -> timestamp -> metrics.
#[derive(Debug)]
struct Group {
    first_seen_order: usize,
    actors: BTreeMap<String, BTreeMap<String, Metrics>>,
}

/// Folds included records into groups keyed by their exact payload text.
///
/// Payloads are compared byte for byte; no whitespace or case folding is applied.
/// A record repeating the (payload, actor, timestamp) of an earlier one replaces it.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: HashMap<String, Group>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, record: Record) {
        let next_order = self.groups.len();
        let group = self.groups.entry(record.payload).or_insert_with(|| Group {
            first_seen_order: next_order,
            actors: BTreeMap::new(),
        });
        group
            .actors
            .entry(record.actor)
            .or_default()
            .insert(record.timestamp, record.metrics);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Finalizes every group, returned in first-seen order.
    pub fn finish(self) -> Vec<GroupStats> {
        let mut groups: Vec<(String, Group)> = self.groups.into_iter().collect();
        groups.sort_by_key(|(_, g)| g.first_seen_order);
        groups
            .into_iter()
            .map(|(payload, group)| finalize(payload, group))
            .collect()
    }
}

struct Totals {
    count: u64,
    query_time: (u64, u64),
    lock_time: (u64, u64),
    rows_sent: (BigUint, BigUint),
    rows_examined: (BigUint, BigUint),
}

impl Totals {
    fn new() -> Self {
        Self {
            count: 0,
            query_time: (0, 0),
            lock_time: (0, 0),
            rows_sent: (BigUint::zero(), BigUint::zero()),
            rows_examined: (BigUint::zero(), BigUint::zero()),
        }
    }

    fn add(&mut self, m: &Metrics) {
        self.count += 1;
        self.query_time.0 = self.query_time.0.saturating_add(m.duration_seconds);
        self.query_time.1 = self.query_time.1.max(m.duration_seconds);
        self.lock_time.0 = self.lock_time.0.saturating_add(m.lock_seconds);
        self.lock_time.1 = self.lock_time.1.max(m.lock_seconds);
        self.rows_sent.0 += &m.rows_sent;
        if m.rows_sent > self.rows_sent.1 {
            self.rows_sent.1 = m.rows_sent.clone();
        }
        self.rows_examined.0 += &m.rows_examined;
        if m.rows_examined > self.rows_examined.1 {
            self.rows_examined.1 = m.rows_examined.clone();
        }
    }

    fn time_stats(&self, (sum, max): (u64, u64)) -> MetricStats<u64> {
        MetricStats { sum, max, avg: Average::of(&BigUint::from(sum), self.count) }
    }

    fn row_stats(&self, (sum, max): (BigUint, BigUint)) -> MetricStats<BigUint> {
        let avg = Average::of(&sum, self.count);
        MetricStats { sum, max, avg }
    }
}

fn slowest_first(a: &Occurrence, b: &Occurrence) -> std::cmp::Ordering {
    let (a, b) = (&a.metrics, &b.metrics);
    b.duration_seconds
        .cmp(&a.duration_seconds)
        .then_with(|| b.lock_seconds.cmp(&a.lock_seconds))
        .then_with(|| b.rows_examined.cmp(&a.rows_examined))
}

/// Earliest and latest timestamp by instant. Unparsable texts only count when
/// nothing parses, and are then ordered as text.
fn seen_range(timestamps: &[&str]) -> Option<(String, String)> {
    let parsed = timestamps
        .iter()
        .filter_map(|ts| parser::parse_timestamp(ts).map(|at| (at, *ts)))
        .minmax()
        .into_option()
        .map(|((_, first), (_, last))| (first, last));
    parsed
        .or_else(|| timestamps.iter().copied().minmax().into_option())
        .map(|(first, last)| (first.to_string(), last.to_string()))
}

fn finalize(payload: String, group: Group) -> GroupStats {
    let mut totals = Totals::new();
    let mut actors = Vec::with_capacity(group.actors.len());

    for (actor, by_timestamp) in group.actors {
        let mut occurrences = Vec::with_capacity(by_timestamp.len());
        for (timestamp, metrics) in by_timestamp {
            totals.add(&metrics);
            occurrences.push(Occurrence { timestamp, metrics });
        }
        occurrences.sort_by(slowest_first);
        actors.push(ActorStats { actor, occurrences });
    }

    let timestamps: Vec<&str> = actors
        .iter()
        .flat_map(|a| a.occurrences.iter().map(|o| o.timestamp.as_str()))
        .collect();
    let (first_seen, last) = seen_range(&timestamps).unwrap_or_default();
    let last_seen = Some(last).filter(|l| *l != first_seen);
    let rows_sent = std::mem::take(&mut totals.rows_sent);
    let rows_examined = std::mem::take(&mut totals.rows_examined);
    GroupStats {
        payload,
        execution_count: totals.count,
        query_time: totals.time_stats(totals.query_time),
        lock_time: totals.time_stats(totals.lock_time),
        rows_sent: totals.row_stats(rows_sent),
        rows_examined: totals.row_stats(rows_examined),
        first_seen,
        last_seen,
        actors,
    }
}
