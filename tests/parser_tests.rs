use num_bigint::BigUint;
use slowlog_filter::parser::{classify_line, parse_metrics, LineKind};

#[test]
fn classifies_the_three_header_kinds() {
    assert_eq!(classify_line("# Time: 070119 12:29:58"), LineKind::Time("070119 12:29:58"));
    assert_eq!(
        classify_line("# User@Host: root[root] @ localhost []"),
        LineKind::Actor("root[root] @ localhost []")
    );
    assert!(matches!(
        classify_line("# Query_time: 1  Lock_time: 0  Rows_sent: 1  Rows_examined: 12345"),
        LineKind::Metrics(_)
    ));
}

#[test]
fn other_comment_lines_are_headers_but_not_payload() {
    let kind = classify_line("# Thread_id: 7  Schema: shop  QC_hit: No");
    assert_eq!(kind, LineKind::OtherHeader);
    assert!(kind.is_header());
}

#[test]
fn marker_needs_the_trailing_space() {
    assert_eq!(classify_line("#Time: 070119 12:29:58"), LineKind::Payload);
    assert_eq!(classify_line("SELECT 1;"), LineKind::Payload);
    assert_eq!(classify_line(""), LineKind::Payload);
    assert_eq!(classify_line("#"), LineKind::Payload);
}

#[test]
fn parses_metrics_fields() {
    let m = parse_metrics("Query_time: 12  Lock_time: 3  Rows_sent: 40  Rows_examined: 12345").unwrap();
    assert_eq!(m.duration_seconds, 12);
    assert_eq!(m.lock_seconds, 3);
    assert_eq!(m.rows_sent, BigUint::from(40u32));
    assert_eq!(m.rows_examined, BigUint::from(12345u32));
}

#[test]
fn rows_examined_beyond_u64_is_kept_exactly() {
    let m = parse_metrics("Query_time: 1  Lock_time: 0  Rows_sent: 0  Rows_examined: 123456789012345678901234567890")
        .unwrap();
    assert_eq!(m.rows_examined.to_string(), "123456789012345678901234567890");
}

#[test]
fn trailing_fields_are_ignored() {
    let m = parse_metrics("Query_time: 2  Lock_time: 0  Rows_sent: 1  Rows_examined: 9  Rows_affected: 0");
    assert_eq!(m.map(|m| m.duration_seconds), Some(2));
}

#[test]
fn malformed_metrics_are_rejected() {
    assert!(parse_metrics("Query_time: 2  Lock_time: 0  Rows_sent: 1").is_none());
    assert!(parse_metrics("Query_time: x  Lock_time: 0  Rows_sent: 1  Rows_examined: 9").is_none());
    assert!(parse_metrics("Query_time: 1.5  Lock_time: 0  Rows_sent: 1  Rows_examined: 9").is_none());
    assert!(parse_metrics("Query_time: 99999999999999999999  Lock_time: 0  Rows_sent: 1  Rows_examined: 9").is_none());
    assert!(parse_metrics("").is_none());
}
