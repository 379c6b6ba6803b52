use serde::Serialize;
use std::io::{self, Write};

use crate::aggregate::{GroupStats, MetricStats};
use crate::config::ReportFormat;
use crate::record::Record;

/// Destination for output lines (without terminators).
pub trait LineSink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

impl LineSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line followed by `\n` to any writer.
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }
}

pub fn write_record<S: LineSink + ?Sized>(record: &Record, sink: &mut S) -> io::Result<()> {
    for line in record.render_lines() {
        sink.emit(&line)?;
    }
    Ok(())
}

pub fn write_report<S: LineSink + ?Sized>(
    groups: &[GroupStats],
    details: bool,
    format: ReportFormat,
    sink: &mut S,
) -> io::Result<()> {
    match format {
        ReportFormat::Text => {
            for group in groups {
                for line in render_group(group, details) {
                    sink.emit(&line)?;
                }
            }
            Ok(())
        }
        ReportFormat::Json => {
            let out: Vec<GroupOut<'_>> = groups.iter().map(|g| GroupOut::new(g, details)).collect();
            let text = serde_json::to_string_pretty(&out)?;
            text.lines().try_for_each(|line| sink.emit(line))
        }
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "time" } else { "times" }
}

/// Text block for one group: summary line, statistics table, actors and payload.
pub fn render_group(group: &GroupStats, details: bool) -> Vec<String> {
    let n = group.execution_count;
    let mut out = Vec::new();
    out.push(match &group.last_seen {
        None => format!("# Execution count: {n} {} on {}.", plural(n), group.first_seen),
        Some(last) => format!(
            "# Execution count: {n} {} between {} and {}.",
            plural(n),
            group.first_seen,
            last
        ),
    });

    let rows = [
        ("Query time", cells(&group.query_time)),
        ("Lock time", cells(&group.lock_time)),
        ("Rows examined", cells(&group.rows_examined)),
        ("Rows sent", cells(&group.rows_sent)),
    ];
    let header = ["avg".to_string(), "max".to_string(), "sum".to_string()];
    let mut widths = [8usize; 3];
    for (_, row) in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }
    out.push(table_line("Column", &header, &widths));
    for (label, row) in &rows {
        out.push(table_line(label, row, &widths));
    }

    for actor in &group.actors {
        out.push(format!("# User@Host: {}", actor.actor));
        if details {
            for occ in &actor.occurrences {
                out.push(format!("{} at {}", occ.metrics, occ.timestamp));
            }
        }
    }
    out.push(group.payload.clone());
    out.push(String::new());
    out
}

fn cells<T: ToString>(stats: &MetricStats<T>) -> [String; 3] {
    [stats.avg.to_string(), stats.max.to_string(), stats.sum.to_string()]
}

fn table_line(label: &str, cells: &[String; 3], widths: &[usize; 3]) -> String {
    format!(
        "# {label:<13}: {:>w0$} | {:>w1$} | {:>w2$}",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    )
}

#[derive(Serialize)]
struct StatOut {
    avg: String,
    max: String,
    sum: String,
}

impl<T: ToString> From<&MetricStats<T>> for StatOut {
    fn from(s: &MetricStats<T>) -> Self {
        let [avg, max, sum] = cells(s);
        Self { avg, max, sum }
    }
}

#[derive(Serialize)]
struct ExecutionOut<'a> {
    timestamp: &'a str,
    query_time: u64,
    lock_time: u64,
    rows_sent: String,
    rows_examined: String,
}

#[derive(Serialize)]
struct ActorOut<'a> {
    user_host: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    executions: Option<Vec<ExecutionOut<'a>>>,
}

#[derive(Serialize)]
struct GroupOut<'a> {
    execution_count: u64,
    first_seen: &'a str,
    last_seen: Option<&'a str>,
    query_time: StatOut,
    lock_time: StatOut,
    rows_examined: StatOut,
    rows_sent: StatOut,
    users: Vec<ActorOut<'a>>,
    query: &'a str,
}

impl<'a> GroupOut<'a> {
    fn new(g: &'a GroupStats, details: bool) -> Self {
        let users = g
            .actors
            .iter()
            .map(|a| ActorOut {
                user_host: &a.actor,
                executions: details.then(|| {
                    a.occurrences
                        .iter()
                        .map(|o| ExecutionOut {
                            timestamp: &o.timestamp,
                            query_time: o.metrics.duration_seconds,
                            lock_time: o.metrics.lock_seconds,
                            rows_sent: o.metrics.rows_sent.to_string(),
                            rows_examined: o.metrics.rows_examined.to_string(),
                        })
                        .collect()
                }),
            })
            .collect();
        Self {
            execution_count: g.execution_count,
            first_seen: &g.first_seen,
            last_seen: g.last_seen.as_deref(),
            query_time: (&g.query_time).into(),
            lock_time: (&g.lock_time).into(),
            rows_examined: (&g.rows_examined).into(),
            rows_sent: (&g.rows_sent).into(),
            users,
            query: &g.payload,
        }
    }
}
