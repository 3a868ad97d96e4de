mod common;

use ev_dashboard::data::loader::LoadOptions;
use ev_dashboard::data::{
    build_predicate, DashboardError, FilterColumn, FilterSelection, KpiKind, LoadError,
    Predicate, TabularStore,
};
use ev_dashboard::data::model::ValidationIssue;

use common::{csv_with, row, write_csv, write_text_parquet, SAMPLE};

#[test]
fn record_count_matches_data_rows() {
    let mut store = TabularStore::default();
    let n = store.load_csv(csv_with(SAMPLE).as_bytes()).unwrap();
    assert_eq!(n, 4);
    assert_eq!(store.record_count(), 4);
    assert!(store.is_loaded());
}

#[test]
fn loads_from_path_by_extension() {
    let tmp = write_csv(&csv_with(SAMPLE));
    let mut store = TabularStore::default();
    assert_eq!(store.load_path(tmp.path()).unwrap(), 4);
}

#[test]
fn unreadable_file_is_a_load_error() {
    let mut store = TabularStore::default();
    let err = store
        .load_path(std::path::Path::new("/definitely/not/here.csv"))
        .unwrap_err();
    assert!(matches!(err, DashboardError::Load(LoadError::Io { .. })));
}

#[test]
fn failed_load_keeps_previous_table() {
    let mut store = TabularStore::default();
    store.load_csv(csv_with(SAMPLE).as_bytes()).unwrap();

    let err = store.load_csv(b"brand,segment\nKia,B - Compact\n").unwrap_err();
    assert!(matches!(err, DashboardError::Load(LoadError::MissingColumns(_))));
    assert_eq!(store.record_count(), 4);

    let err = store.load_csv(&[0xc3, 0x28, b'\n']).unwrap_err();
    assert!(matches!(err, DashboardError::Encoding(_)));
    assert_eq!(store.record_count(), 4);
}

#[test]
fn strict_load_fails_whole_file_on_bad_number() {
    let bad = format!("{}{}", row("A", "X", "300", "SUV"), row("B", "X", "lots", "SUV"));
    let mut store = TabularStore::new(LoadOptions {
        strict_numeric: true,
    });
    let err = store.load_csv(csv_with(&bad).as_bytes()).unwrap_err();
    assert!(matches!(err, DashboardError::Load(LoadError::InvalidValue { .. })));
    assert!(!store.is_loaded());

    let mut lenient = TabularStore::default();
    assert_eq!(lenient.load_csv(csv_with(&bad).as_bytes()).unwrap(), 1);
    assert_eq!(lenient.last_report().unwrap().rejected(), 1);
}

#[test]
fn reload_replaces_table() {
    let mut store = TabularStore::default();
    store.load_csv(csv_with(SAMPLE).as_bytes()).unwrap();
    store
        .load_csv(csv_with(&row("Kia", "B - Compact", "400", "SUV")).as_bytes())
        .unwrap();
    assert_eq!(store.record_count(), 1);
    let brands = store.distinct_values(FilterColumn::Brand);
    assert_eq!(brands.into_iter().collect::<Vec<_>>(), vec!["Kia"]);
}

#[test]
fn clear_then_query_is_empty_not_error() {
    let mut store = TabularStore::default();
    store.load_csv(csv_with(SAMPLE).as_bytes()).unwrap();
    store.clear();

    assert_eq!(store.record_count(), 0);
    assert!(store.distinct_values(FilterColumn::Segment).is_empty());
    for kind in KpiKind::ALL {
        let res = store.query_kpi(kind, &Predicate::all()).unwrap();
        assert!(res.is_empty());
        assert_eq!(res.kind(), kind);
    }
}

#[test]
fn distinct_values_skip_nulls_and_ignore_filters() {
    let rows = format!(
        "{}{}{}",
        row("A", "X", "1", "SUV"),
        row("B", "Y", "1", "Sedan"),
        row("B", "Y", "1", "Sedan"),
    );
    let mut store = TabularStore::default();
    store.load_csv(csv_with(&rows).as_bytes()).unwrap();

    let segments: Vec<String> = store
        .distinct_values(FilterColumn::Segment)
        .into_iter()
        .collect();
    assert_eq!(segments, vec!["X", "Y"]);
}

#[test]
fn matching_count_follows_predicate() {
    let mut store = TabularStore::default();
    store.load_csv(csv_with(SAMPLE).as_bytes()).unwrap();

    let sel = FilterSelection::new().with(FilterColumn::Brand, &["Tesla", "BMW"]);
    assert_eq!(store.matching_count(&build_predicate(&sel)), 3);

    let sel = sel.with(FilterColumn::BodyType, &["SUV"]);
    assert_eq!(store.matching_count(&build_predicate(&sel)), 1);

    assert_eq!(store.matching_count(&Predicate::all()), 4);
}

#[test]
fn parquet_file_loads_like_csv() {
    use ev_dashboard::data::loader::load_csv_bytes;
    use parquet::arrow::ArrowWriter;

    let outcome = load_csv_bytes(csv_with(SAMPLE).as_bytes(), LoadOptions::default()).unwrap();
    let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer =
        ArrowWriter::try_new(tmp.reopen().unwrap(), outcome.table.schema(), None).unwrap();
    writer.write(&outcome.table).unwrap();
    writer.close().unwrap();

    let mut store = TabularStore::default();
    assert_eq!(store.load_path(tmp.path()).unwrap(), 4);
    let sel = FilterSelection::new().with(FilterColumn::Segment, &["C - Medium"]);
    assert_eq!(store.matching_count(&build_predicate(&sel)), 2);
}

#[test]
fn text_parquet_rejects_values_the_schema_cannot_hold() {
    // row 2: non-numeric range and fractional seat count
    let rows = "\
Tesla,Model 3,225,75.0,Lithium-ion,4680,450,150,500,5.1,170,CCS,0,425,5,RWD,C - Medium,4694,1849,1443,Sedan,https://example.com/a
BMW,i4,200,81.5,Lithium-ion,,400,170,far,5.5,200,CCS,0,495,4.5,RWD,C - Medium,4783,1852,1454,Sedan,https://example.com/b
Audi,e-tron,200,100.0,Lithium-ion,,450,180,400,5.2,150,CCS,1800,660,5,AWD,D - Large,4901,1935,1616,SUV,https://example.com/c
";
    let tmp = write_text_parquet(rows);

    let mut store = TabularStore::default();
    assert_eq!(store.load_path(tmp.path()).unwrap(), 2);
    let report = store.last_report().unwrap();
    assert_eq!(
        report.issues,
        vec![ValidationIssue::Rejected {
            line: 2,
            column: "range_km".into(),
            value: "far".into(),
        }]
    );
    let mean = store
        .query_kpi(KpiKind::RangeBySegment, &Predicate::all())
        .unwrap();
    let means = mean.means().unwrap();
    assert_eq!(means[0].group, "C - Medium");
    assert_eq!(means[0].count, 1);

    let mut strict = TabularStore::new(LoadOptions {
        strict_numeric: true,
    });
    let err = strict.load_path(tmp.path()).unwrap_err();
    match err {
        DashboardError::Load(LoadError::InvalidValue { line, column, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(column, "range_km");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!strict.is_loaded());
}
