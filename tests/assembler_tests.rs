use slowlog_filter::assembler::RecordAssembler;
use slowlog_filter::{FilterConfig, Metrics, Record};

fn assemble(filter: &FilterConfig, lines: &[&str]) -> Vec<Record> {
    let mut asm = RecordAssembler::new(filter);
    let mut out = Vec::new();
    for l in lines {
        if let Some(r) = asm.push(l) {
            out.push(r);
        }
    }
    if let Some(r) = asm.finish() {
        out.push(r);
    }
    out
}

#[test]
fn emits_one_record_per_header_block() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: root[root] @ localhost []",
        "# Query_time: 5  Lock_time: 1  Rows_sent: 1  Rows_examined: 12345",
        "SELECT * FROM test;",
        "# Time: 070119 12:30:10",
        "# User@Host: app[app] @ web1 []",
        "# Query_time: 2  Lock_time: 0  Rows_sent: 10  Rows_examined: 10",
        "UPDATE t SET a = 1;",
    ];
    let out = assemble(&FilterConfig::default(), &lines);
    assert_eq!(out.len(), 2);
    assert_eq!(
        out[0],
        Record {
            timestamp: "070119 12:29:58".into(),
            actor: "root[root] @ localhost []".into(),
            metrics: Metrics::new(5, 1, 1, 12345),
            payload: "SELECT * FROM test;".into(),
        }
    );
    assert_eq!(out[1].actor, "app[app] @ web1 []");
    assert_eq!(out[1].payload, "UPDATE t SET a = 1;");
}

#[test]
fn multi_line_payload_is_joined_without_separator() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: root[root] @ localhost []",
        "# Query_time: 3  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT *",
        "  FROM t",
        "WHERE id = 1;",
    ];
    let out = assemble(&FilterConfig::default(), &lines);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload, "SELECT *  FROM tWHERE id = 1;");
}

#[test]
fn block_without_time_line_reuses_previous_timestamp() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: a[a] @ h []",
        "# Query_time: 3  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT 1;",
        "# User@Host: b[b] @ h []",
        "# Query_time: 4  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT 2;",
    ];
    let out = assemble(&FilterConfig::default(), &lines);
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].timestamp, "070119 12:29:58");
    assert_eq!(out[1].actor, "b[b] @ h []");
    assert_eq!(out[1].payload, "SELECT 2;");
}

#[test]
fn excluded_actor_payload_is_not_buffered() {
    let filter = FilterConfig { exclude_actors: vec!["ROOT".into()], ..Default::default() };
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: root[root] @ localhost []",
        "# Query_time: 9  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT secret;",
        "# Time: 070119 12:29:59",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 9  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT visible;",
    ];
    let out = assemble(&filter, &lines);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload, "SELECT visible;");
}

#[test]
fn fast_query_is_dropped() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 0  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT fast;",
    ];
    assert!(assemble(&FilterConfig::default(), &lines).is_empty());
}

#[test]
fn malformed_metrics_excludes_the_entry_only() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0",
        "SELECT broken;",
        "# Time: 070119 12:30:00",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0  Rows_sent: 0  Rows_examined: 0",
        "SELECT fine;",
    ];
    let out = assemble(&FilterConfig::default(), &lines);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload, "SELECT fine;");
}

#[test]
fn whitespace_payload_is_never_emitted() {
    let lines = vec![
        "# Time: 070119 12:29:58",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0  Rows_sent: 0  Rows_examined: 0",
        "   ",
        "",
        "# Time: 070119 12:30:00",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0  Rows_sent: 0  Rows_examined: 0",
        "\t",
    ];
    assert!(assemble(&FilterConfig::default(), &lines).is_empty());
}

#[test]
fn lines_before_any_header_are_ignored() {
    let lines = vec![
        "/usr/sbin/mysqld, Version: 5.0.27-log. started with:",
        "Tcp port: 3306  Unix socket: /tmp/mysql.sock",
        "Time                 Id Command    Argument",
        "# Time: 070119 12:29:58",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0  Rows_sent: 0  Rows_examined: 0",
        "SELECT 1;",
    ];
    let out = assemble(&FilterConfig::default(), &lines);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload, "SELECT 1;");
}

#[test]
fn truncated_final_record_is_flushed_by_finish() {
    let filter = FilterConfig::default();
    let mut asm = RecordAssembler::new(&filter);
    for l in [
        "# Time: 070119 12:29:58",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 7  Lock_time: 0  Rows_sent: 0  Rows_examined: 0",
        "SELECT 1",
    ] {
        assert!(asm.push(l).is_none());
    }
    let last = asm.finish().expect("pending record");
    assert_eq!(last.payload, "SELECT 1");
    assert!(asm.finish().is_none());
}

#[test]
fn fractional_metrics_are_counted_as_malformed() {
    let filter = FilterConfig::default();
    let mut asm = RecordAssembler::new(&filter);
    let mut out = Vec::new();
    for l in [
        "# Time: 2019-03-04T11:22:33.123456Z",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 1.000219  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 1",
        "SELECT 1;",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 2.5  Lock_time: 0.0 Rows_sent: 1  Rows_examined: 1",
        "SELECT 2;",
        "# User@Host: app[app] @ localhost []",
        "# Query_time: 3  Lock_time: 0  Rows_sent: 1  Rows_examined: 1",
        "SELECT 3;",
    ] {
        out.extend(asm.push(l));
    }
    out.extend(asm.finish());
    assert_eq!(asm.malformed(), 2);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].payload, "SELECT 3;");
}
