use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing_subscriber::EnvFilter;

use slowlog_filter::config::Options;
use slowlog_filter::input::LossyLines;
use slowlog_filter::{Config, Engine, LineSink, WriteSink};

#[derive(Parser, Debug)]
#[command(
    name = "slowlog-filter",
    version,
    about = "Filter the MySQL slow query log, or aggregate it into a ranked report",
    after_help = "Live filtering: tail -f -n 0 slow.log | slowlog-filter -T 3 -R 10000 --exclude-user root"
)]
struct Cli {
    /// Input files (`-` for stdin). Defaults to stdin.
    #[arg(required = false)]
    input: Vec<String>,

    /// Include only queries that took at least this many seconds
    #[arg(short = 'T', long = "min-query-time", default_value_t = 1)]
    min_query_time: u64,
    /// ...or that examined at least this many rows (0 disables)
    #[arg(short = 'R', long = "min-rows-examined", default_value_t = 0)]
    min_rows_examined: u64,

    /// Include only entries whose User@Host contains this text. May be repeated.
    #[arg(long = "include-user")]
    include_user: Vec<String>,
    /// Exclude entries whose User@Host contains this text (ignored with --include-user).
    /// May be repeated.
    #[arg(long = "exclude-user")]
    exclude_user: Vec<String>,
    /// Include only queries containing this text, e.g. a table name. May be repeated.
    #[arg(long = "include-query")]
    include_query: Vec<String>,
    /// Date range: D, D1-D2, >D, D-, <D, -D with D as dd.mm.yyyy or yyyy-mm-dd
    #[arg(long = "date", allow_hyphen_values = true)]
    date: Option<String>,

    /// Output unique queries only, with execution statistics
    #[arg(long = "no-duplicates", default_value_t = false)]
    no_duplicates: bool,
    /// With --no-duplicates: list every execution below its user
    #[arg(long = "details", default_value_t = false)]
    details: bool,
    /// With --no-duplicates: report at most this many queries (0 = all)
    #[arg(long = "top", default_value_t = 0)]
    top: usize,
    /// With --no-duplicates: sort keys taking precedence over the default order
    /// (sum|avg|max-query-time, -lock-time, -rows-examined, -rows-sent, execution-count)
    #[arg(long = "sort", value_delimiter = ',')]
    sort: Vec<String>,
    /// With --no-duplicates: report format, text | json
    #[arg(long = "format", default_value = "text")]
    format: String,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            min_query_time: self.min_query_time,
            min_rows_examined: self.min_rows_examined,
            include_users: self.include_user.clone(),
            exclude_users: self.exclude_user.clone(),
            include_queries: self.include_query.clone(),
            date: self.date.clone(),
            no_duplicates: self.no_duplicates,
            details: self.details,
            top: self.top,
            sort: self.sort.clone(),
            format: self.format.clone(),
        }
    }
}

fn init_logging() {
    // stdout carries the result; diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_source<R: BufRead, S: LineSink>(
    reader: R,
    engine: &mut Engine<'_>,
    sink: &mut S,
) -> io::Result<()> {
    for line in LossyLines::new(reader) {
        engine.push_line(&line?, sink)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let input_files = if cli.input.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.input.clone()
    };
    let config = Config::from_options(cli.options())?;

    let stdout = io::stdout();
    let mut sink = WriteSink::new(stdout.lock());
    let mut engine = Engine::new(&config);
    for p in &input_files {
        if p == "-" {
            let stdin = io::stdin();
            read_source(stdin.lock(), &mut engine, &mut sink).context("reading stdin")?;
        } else {
            let f = File::open(p).with_context(|| format!("opening {p}"))?;
            read_source(BufReader::new(f), &mut engine, &mut sink)
                .with_context(|| format!("reading {p}"))?;
        }
    }
    let stats = engine.finish(&mut sink)?;
    tracing::debug!(?stats, "done");
    Ok(())
}
