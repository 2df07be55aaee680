mod common;

use proptest::prelude::*;
use sheetflow::{
    error::NormalizeError,
    normalize::{CollisionPolicy, SynonymTable, Table, normalize},
    profile::ColumnProfile,
};

use common::raw_table;

fn default_rules() -> (Vec<String>, SynonymTable) {
    let profile = ColumnProfile::default();
    let synonyms = profile.synonym_table();
    (profile.allowed_columns, synonyms)
}

#[test]
fn sheet_headers_are_folded_renamed_and_filtered() {
    let (allowed, synonyms) = default_rules();
    let raw = raw_table(
        &[" Codes ", "LOTNO", "Testdate", "Unnamed: 3", "이슈사항"],
        &[&["A", "L1", "2024-01-01", "junk", "재검사"]],
    );
    let normalized = normalize(&raw, &allowed, &synonyms, &CollisionPolicy::default()).unwrap();
    assert_eq!(normalized.headers, vec!["product_code", "lot_no", "test_date", "notes"]);
    assert_eq!(normalized.rows[0], vec!["A", "L1", "2024-01-01", "재검사"]);
}

#[test]
fn empty_header_only_table_normalizes_to_empty_table() {
    let (allowed, synonyms) = default_rules();
    let raw = raw_table(&["codes", "serialst"], &[]);
    let normalized = normalize(&raw, &allowed, &synonyms, &CollisionPolicy::default()).unwrap();
    assert_eq!(normalized.headers, vec!["product_code", "serial_start"]);
    assert!(normalized.rows.is_empty());
}

#[test]
fn collisions_follow_the_configured_policy() {
    let (allowed, synonyms) = default_rules();
    let raw = raw_table(&["codes", "Codes"], &[&["first", "second"]]);

    let last = normalize(&raw, &allowed, &synonyms, &CollisionPolicy::LastWins).unwrap();
    assert_eq!(last.rows[0], vec!["second"]);
    let first = normalize(&raw, &allowed, &synonyms, &CollisionPolicy::FirstWins).unwrap();
    assert_eq!(first.rows[0], vec!["first"]);

    let err = normalize(&raw, &allowed, &synonyms, &CollisionPolicy::Reject).unwrap_err();
    assert!(matches!(err, NormalizeError::Collision { ref canonical, .. } if canonical == "product_code"));
}

#[test]
fn prefer_policy_picks_the_listed_source() {
    let allowed = vec!["testdate".to_string(), "shipdate".to_string()];
    let synonyms = SynonymTable::new([("testdate", "date"), ("shipdate", "date")]);
    let raw = raw_table(&["Testdate", "shipdate"], &[&["2024-01-01", "2024-01-09"]]);
    let policy = CollisionPolicy::Prefer(vec!["shipdate".to_string()]);
    let normalized = normalize(&raw, &allowed, &synonyms, &policy).unwrap();
    assert_eq!(normalized.headers, vec!["date"]);
    assert_eq!(normalized.rows[0], vec!["2024-01-09"]);
}

const HEADER_POOL: &[&str] = &[
    "codes", "CODES", " lotno", "Testdate", "shipdate ", "serialst", "SerialSP", "testedqty",
    "goodqty", "yld", "이슈사항", "remark", "Unnamed: 0", "product_code",
];

fn arb_table() -> impl Strategy<Value = Table> {
    prop::collection::vec(prop::sample::select(HEADER_POOL), 0..8).prop_flat_map(|headers| {
        let width = headers.len();
        let rows = prop::collection::vec(prop::collection::vec("[a-z0-9]{0,4}", width), 0..5);
        (Just(headers), rows).prop_map(|(headers, rows)| {
            Table::new(headers.iter().map(|h| h.to_string()).collect(), rows)
        })
    })
}

proptest! {
    #[test]
    fn normalization_is_idempotent(table in arb_table()) {
        let (allowed, synonyms) = default_rules();
        let policy = CollisionPolicy::default();
        let once = normalize(&table, &allowed, &synonyms, &policy).unwrap();
        let twice = normalize(&once, &allowed, &synonyms, &policy).unwrap();
        prop_assert_eq!(once, twice);
    }
}
