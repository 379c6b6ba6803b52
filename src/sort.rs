use itertools::Itertools;
use num_bigint::BigUint;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::aggregate::GroupStats;
use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    QueryTime,
    LockTime,
    RowsSent,
    RowsExamined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Sum,
    Avg,
    Max,
}

/// How two groups' values for a key are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Plain `u64` comparison.
    Native,
    /// Arbitrary precision comparison (row totals and every average).
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    ExecutionCount,
    Stat(Statistic, Metric),
}

impl SortKey {
    pub fn precision(self) -> Precision {
        match self {
            SortKey::ExecutionCount => Precision::Native,
            SortKey::Stat(Statistic::Avg, _) => Precision::Unbounded,
            SortKey::Stat(_, Metric::RowsSent | Metric::RowsExamined) => Precision::Unbounded,
            SortKey::Stat(_, Metric::QueryTime | Metric::LockTime) => Precision::Native,
        }
    }

    pub fn name(self) -> &'static str {
        use Metric::*;
        use Statistic::*;
        match self {
            SortKey::ExecutionCount => "execution-count",
            SortKey::Stat(Sum, QueryTime) => "sum-query-time",
            SortKey::Stat(Avg, QueryTime) => "avg-query-time",
            SortKey::Stat(Max, QueryTime) => "max-query-time",
            SortKey::Stat(Sum, LockTime) => "sum-lock-time",
            SortKey::Stat(Avg, LockTime) => "avg-lock-time",
            SortKey::Stat(Max, LockTime) => "max-lock-time",
            SortKey::Stat(Sum, RowsSent) => "sum-rows-sent",
            SortKey::Stat(Avg, RowsSent) => "avg-rows-sent",
            SortKey::Stat(Max, RowsSent) => "max-rows-sent",
            SortKey::Stat(Sum, RowsExamined) => "sum-rows-examined",
            SortKey::Stat(Avg, RowsExamined) => "avg-rows-examined",
            SortKey::Stat(Max, RowsExamined) => "max-rows-examined",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DEFAULT_ORDER
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownSortKey(s.to_string()))
    }
}

pub const DEFAULT_ORDER: [SortKey; 13] = {
    use Metric::*;
    use Statistic::*;
    [
        SortKey::Stat(Sum, QueryTime),
        SortKey::Stat(Avg, QueryTime),
        SortKey::Stat(Max, QueryTime),
        SortKey::Stat(Sum, LockTime),
        SortKey::Stat(Avg, LockTime),
        SortKey::Stat(Max, LockTime),
        SortKey::Stat(Sum, RowsExamined),
        SortKey::Stat(Avg, RowsExamined),
        SortKey::Stat(Max, RowsExamined),
        SortKey::Stat(Sum, RowsSent),
        SortKey::Stat(Avg, RowsSent),
        SortKey::Stat(Max, RowsSent),
        SortKey::ExecutionCount,
    ]
};

/// A group's value for one sort key.
#[derive(Debug, Clone)]
pub enum StatValue<'a> {
    Native(u64),
    Unbounded(&'a BigUint),
}

impl Ord for StatValue<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (StatValue::Native(a), StatValue::Native(b)) => a.cmp(b),
            (StatValue::Unbounded(a), StatValue::Unbounded(b)) => a.cmp(b),
            (StatValue::Native(a), StatValue::Unbounded(b)) => BigUint::from(*a).cmp(b),
            (StatValue::Unbounded(a), StatValue::Native(b)) => (*a).cmp(&BigUint::from(*b)),
        }
    }
}

impl PartialEq for StatValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for StatValue<'_> {}

impl PartialOrd for StatValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered list of keys used to rank aggregated groups, largest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { keys: DEFAULT_ORDER.to_vec() }
    }
}

impl SortSpec {
    /// Requested keys take the first positions in the order given; the remaining
    /// default keys follow in their default relative order. Repeats are dropped.
    pub fn with_priority(keys: impl IntoIterator<Item = SortKey>) -> Self {
        let keys = keys.into_iter().chain(DEFAULT_ORDER).unique().collect();
        Self { keys }
    }

    /// Builds the key order from names; each item may itself be a comma separated list.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let keys = names
            .iter()
            .flat_map(|n| n.as_ref().split(','))
            .filter(|n| !n.trim().is_empty())
            .map(SortKey::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_priority(keys))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// The first key on which the groups differ decides; larger values come first.
    pub fn compare(&self, a: &GroupStats, b: &GroupStats) -> Ordering {
        self.keys
            .iter()
            .map(|&key| b.stat(key).cmp(&a.stat(key)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Stable: groups tied on every key keep their incoming order.
    pub fn sort(&self, groups: &mut [GroupStats]) {
        groups.sort_by(|a, b| self.compare(a, b));
    }
}
