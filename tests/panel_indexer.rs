use polars::df;
use polars::prelude::DataFrame;

use panelprep::{
    build_sorted_panel, ColumnData, IdValues, PrepError, RowFrame, TabularFrame, TimeValues,
};

fn sorted_fixture() -> DataFrame {
    df! {
        "unique_id" => &["a", "a", "a", "b", "b"],
        "ds" => &[1i64, 2, 3, 1, 2],
        "y" => &[1.0, 2.0, 3.0, 10.0, 20.0],
        "x" => &[0.1, 0.2, 0.3, 0.4, 0.5],
    }
    .unwrap()
}

fn shuffled_fixture() -> DataFrame {
    // same rows as sorted_fixture, deliberately out of (id, time) order
    df! {
        "unique_id" => &["b", "a", "b", "a", "a"],
        "ds" => &[2i64, 3, 1, 1, 2],
        "y" => &[20.0, 3.0, 10.0, 1.0, 2.0],
        "x" => &[0.5, 0.3, 0.4, 0.1, 0.2],
    }
    .unwrap()
}

#[test]
fn indptr_and_ids_round_trip() {
    let df = sorted_fixture();
    let panel = build_sorted_panel(&df, "unique_id", "ds", "y").unwrap();

    assert_eq!(panel.indptr, vec![0, 3, 5]);
    assert_eq!(*panel.indptr.last().unwrap(), TabularFrame::height(&df));
    assert_eq!(panel.ids.len(), panel.indptr.len() - 1);
    assert_eq!(
        panel.ids,
        IdValues::Str(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(panel.last_times, TimeValues::Int(vec![3, 2]));
    assert_eq!(panel.n_series(), 2);
    assert_eq!(panel.n_rows(), 5);
}

#[test]
fn sorted_input_skips_permutation() {
    let panel = build_sorted_panel(&sorted_fixture(), "unique_id", "ds", "y").unwrap();
    assert!(panel.sort_permutation.is_none());
}

#[test]
fn target_column_comes_first_in_data() {
    let panel = build_sorted_panel(&sorted_fixture(), "unique_id", "ds", "y").unwrap();
    assert_eq!(panel.data.n_cols(), 2);
    assert_eq!(panel.data.row(0), &[1.0, 0.1]);
    assert_eq!(panel.data.row(4), &[20.0, 0.5]);
}

#[test]
fn shuffled_input_matches_sorted_build() {
    let from_sorted = build_sorted_panel(&sorted_fixture(), "unique_id", "ds", "y").unwrap();
    let from_shuffled = build_sorted_panel(&shuffled_fixture(), "unique_id", "ds", "y").unwrap();

    assert!(from_shuffled.sort_permutation.is_some());
    assert_eq!(from_shuffled.ids, from_sorted.ids);
    assert_eq!(from_shuffled.indptr, from_sorted.indptr);
    assert_eq!(from_shuffled.last_times, from_sorted.last_times);
    assert_eq!(from_shuffled.data, from_sorted.data);
}

#[test]
fn times_strictly_ascend_within_each_series() {
    let df = shuffled_fixture();
    let panel = build_sorted_panel(&df, "unique_id", "ds", "y").unwrap();

    let times = df.time_values("ds").unwrap();
    let perm = panel.sort_permutation.clone().unwrap();
    let sorted_keys: Vec<i64> = {
        let keys = times.sort_keys();
        perm.iter().map(|&i| keys[i as usize]).collect()
    };
    for k in 0..panel.n_series() {
        let range = panel.series_range(k);
        for i in range.start + 1..range.end {
            assert!(sorted_keys[i - 1] < sorted_keys[i]);
        }
    }
}

#[test]
fn missing_column_is_a_validation_error() {
    let err = build_sorted_panel(&sorted_fixture(), "unique_id", "ds", "nope").unwrap_err();
    assert!(matches!(err, PrepError::Validation(_)));
}

#[test]
fn row_frame_engine_agrees_with_polars() {
    let rows = RowFrame::new()
        .with_column(
            "unique_id",
            ColumnData::Str(vec![
                "b".into(),
                "a".into(),
                "b".into(),
                "a".into(),
                "a".into(),
            ]),
        )
        .unwrap()
        .with_column("ds", ColumnData::Int(vec![2, 3, 1, 1, 2]))
        .unwrap()
        .with_column("y", ColumnData::Float(vec![20.0, 3.0, 10.0, 1.0, 2.0]))
        .unwrap()
        .with_column("x", ColumnData::Float(vec![0.5, 0.3, 0.4, 0.1, 0.2]))
        .unwrap();

    let from_rows = build_sorted_panel(&rows, "unique_id", "ds", "y").unwrap();
    let from_polars = build_sorted_panel(&shuffled_fixture(), "unique_id", "ds", "y").unwrap();

    assert_eq!(from_rows.ids, from_polars.ids);
    assert_eq!(from_rows.indptr, from_polars.indptr);
    assert_eq!(from_rows.last_times, from_polars.last_times);
    assert_eq!(from_rows.data, from_polars.data);
    assert_eq!(from_rows.sort_permutation, from_polars.sort_permutation);
}

#[test]
fn integer_ids_are_supported() {
    let df = df! {
        "unique_id" => &[7i64, 7, 3, 3],
        "ds" => &[1i64, 2, 1, 2],
        "y" => &[1.0, 2.0, 3.0, 4.0],
    }
    .unwrap();
    let panel = build_sorted_panel(&df, "unique_id", "ds", "y").unwrap();
    assert_eq!(panel.ids, IdValues::Int(vec![3, 7]));
    // ids sort ascending, so series 3 comes first even though 7 arrived first
    assert!(panel.sort_permutation.is_some());
    assert_eq!(panel.data.column(0), vec![3.0, 4.0, 1.0, 2.0]);
}
