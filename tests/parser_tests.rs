//! Integration tests for view-entry extraction over checked-in XML exports.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{FixedOffset, TimeZone};
use notesview::error::NotesError;
use notesview::parser::reader::{VecSink, XmlEventReader};
use notesview::parser::view::ViewEntryParser;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn open(name: &str) -> BufReader<File> {
    BufReader::new(File::open(fixture(name)).unwrap())
}

// ─── Test 1: Parse mailview.xml → exactly 3 records, document order ─

#[test]
fn test_parse_mailview_count_and_order() {
    let records = ViewEntryParser::new().parse(open("mailview.xml")).unwrap();
    assert_eq!(records.len(), 3, "mailview.xml should contain 3 entries");
    let unids: Vec<_> = records.iter().map(|r| r.unid.as_str()).collect();
    assert_eq!(unids, ["ABC123", "DEF456", "GHI789"]);
}

// ─── Test 2: First record fields ────────────────────────────────────

#[test]
fn test_parse_mailview_first_record() {
    let records = ViewEntryParser::new().parse(open("mailview.xml")).unwrap();
    let first = &records[0];
    assert_eq!(first.unid, "ABC123");
    assert_eq!(first.entry_type, "Memo");
    assert_eq!(first.subject.as_deref(), Some("Hello"));
    let expected = FixedOffset::east_opt(-4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2010, 4, 5, 17, 0, 0)
        .unwrap();
    assert_eq!(first.date, expected);
    assert_eq!(first.date.offset().local_minus_utc(), -4 * 3600);
}

// ─── Test 3: Unknown columns are ignored, subject may be absent ─────

#[test]
fn test_parse_mailview_unknown_columns_and_missing_subject() {
    let records = ViewEntryParser::new().parse(open("mailview.xml")).unwrap();

    // Second entry carries a $93 number column and a $127 textlist; both
    // are skipped without affecting the recognized fields.
    let second = &records[1];
    assert_eq!(second.entry_type, "Reply");
    assert_eq!(second.subject.as_deref(), Some("Re: quarterly numbers"));

    // Third entry has no subject column at all.
    let third = &records[2];
    assert_eq!(third.subject, None);
    assert_eq!(third.date.offset().local_minus_utc(), 3600);
}

// ─── Test 4: Distinct type tally ────────────────────────────────────

#[test]
fn test_types_seen() {
    let mut parser = ViewEntryParser::new();
    let records = parser.parse(open("mailview.xml")).unwrap();
    let types: Vec<_> = parser.types_seen().iter().map(String::as_str).collect();
    assert_eq!(types, ["Memo", "Reply"]);
    // The tally matches the records themselves.
    for r in &records {
        assert!(parser.types_seen().contains(&r.entry_type));
    }
}

// ─── Test 5: Missing unid aborts the whole extraction ───────────────

#[test]
fn test_missing_unid_is_fatal() {
    let result = ViewEntryParser::new().parse(open("missing_unid.xml"));
    assert!(
        matches!(result, Err(NotesError::MissingIdentifier)),
        "expected MissingIdentifier, got {result:?}"
    );
}

// ─── Test 6: Truncated export → TruncatedStream, no partial result ──

#[test]
fn test_truncated_export() {
    let result = ViewEntryParser::new().parse(open("truncated.xml"));
    match result {
        Err(NotesError::TruncatedStream { unid }) => assert_eq!(unid, "CUT99"),
        other => panic!("expected TruncatedStream, got {other:?}"),
    }
}

// ─── Test 7: Undeclared entity → warning, extraction still succeeds ─

#[test]
fn test_undeclared_entity_warns_but_succeeds() {
    let mut sink = VecSink::default();
    let mut events = XmlEventReader::with_sink(open("undeclared_entity.xml"), &mut sink);
    let records = ViewEntryParser::new().parse_events(&mut events).unwrap();
    drop(events);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].unid, "ENT42");
    assert_eq!(
        records[0].subject.as_deref(),
        Some("Offsite &agenda; attached"),
        "unresolvable entity should be kept raw"
    );
    assert!(
        !sink.0.is_empty(),
        "the undeclared entity should produce a structural warning"
    );
    assert!(sink.0[0].line > 1, "diagnostic should carry a position");
}

// ─── Test 8: Empty view → 0 records, no error ───────────────────────

#[test]
fn test_empty_view() {
    let records = ViewEntryParser::new().parse(open("empty_view.xml")).unwrap();
    assert!(records.is_empty());
}

// ─── Test 9: Record serialization keeps the offset ──────────────────

#[test]
fn test_mailmeta_serializes_with_offset() {
    let records = ViewEntryParser::new().parse(open("mailview.xml")).unwrap();
    let json = serde_json::to_string(&records[0]).unwrap();
    assert!(json.contains("ABC123"));
    assert!(
        json.contains("2010-04-05T17:00:00-04:00"),
        "date should serialize as RFC 3339 with the encoded offset, got: {json}"
    );
}

// ─── Test 10: Independent calls share no state ──────────────────────

#[test]
fn test_independent_parsers_are_isolated() {
    let mut a = ViewEntryParser::new();
    let mut b = ViewEntryParser::new();
    a.parse(open("mailview.xml")).unwrap();
    b.parse(open("empty_view.xml")).unwrap();
    assert_eq!(a.types_seen().len(), 2);
    assert!(b.types_seen().is_empty());
}
