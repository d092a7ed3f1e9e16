use polars::df;
use polars::prelude::DataFrame;

use panelprep::{add_insample_levels, ColumnData, PrepError, RowFrame, TabularFrame};

fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() < tol
}

#[test]
fn single_series_level_80_matches_known_values() {
    let df = df! {
        "unique_id" => &["a", "a", "a"],
        "y" => &[9.0, 11.0, 10.0],
        "model" => &[10.0, 10.0, 10.0],
    }
    .unwrap();

    let out = add_insample_levels(&df, &["model"], &[80.0], "unique_id", "y").unwrap();

    // residual std = sqrt(2/3) ~ 0.8165, z(0.9) ~ 1.2816, width ~ 1.0465
    let lo = out.numeric_matrix(&["model-lo-80"]).unwrap();
    let hi = out.numeric_matrix(&["model-hi-80"]).unwrap();
    for row in 0..3 {
        assert!(close(lo.get(row, 0), 8.95, 0.01));
        assert!(close(hi.get(row, 0), 11.05, 0.01));
    }
}

#[test]
fn column_names_cover_every_model_and_level() {
    let df = df! {
        "unique_id" => &["a", "a"],
        "y" => &[1.0, 2.0],
        "m1" => &[1.0, 2.0],
        "m2" => &[1.5, 2.5],
    }
    .unwrap();

    let out = add_insample_levels(&df, &["m1", "m2"], &[80.0, 95.0], "unique_id", "y").unwrap();
    let names = out.column_names();
    for expected in [
        "m1-lo-80", "m1-lo-95", "m1-hi-80", "m1-hi-95", "m2-lo-80", "m2-lo-95", "m2-hi-80",
        "m2-hi-95",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    // original columns survive untouched
    assert!(names.iter().any(|n| n == "y"));
}

#[test]
fn stds_are_computed_per_series() {
    // series a has zero residuals, series b does not
    let df = df! {
        "unique_id" => &["a", "a", "b", "b"],
        "y" => &[1.0, 2.0, 1.0, 3.0],
        "model" => &[1.0, 2.0, 2.0, 2.0],
    }
    .unwrap();

    let out = add_insample_levels(&df, &["model"], &[80.0], "unique_id", "y").unwrap();
    let lo = out.numeric_matrix(&["model-lo-80"]).unwrap();
    // zero width for series a: lo equals the prediction
    assert_eq!(lo.get(0, 0), 1.0);
    assert_eq!(lo.get(1, 0), 2.0);
    // nonzero width for series b
    assert!(lo.get(2, 0) < 2.0);
}

#[test]
fn row_frame_engine_matches_polars() {
    let polars_df = df! {
        "unique_id" => &["a", "a", "a"],
        "y" => &[9.0, 11.0, 10.0],
        "model" => &[10.0, 10.0, 10.0],
    }
    .unwrap();
    let rows = RowFrame::new()
        .with_column(
            "unique_id",
            ColumnData::Str(vec!["a".into(), "a".into(), "a".into()]),
        )
        .unwrap()
        .with_column("y", ColumnData::Float(vec![9.0, 11.0, 10.0]))
        .unwrap()
        .with_column("model", ColumnData::Float(vec![10.0, 10.0, 10.0]))
        .unwrap();

    let from_polars = add_insample_levels(&polars_df, &["model"], &[80.0], "unique_id", "y")
        .unwrap()
        .numeric_matrix(&["model-lo-80", "model-hi-80"])
        .unwrap();
    let from_rows = add_insample_levels(&rows, &["model"], &[80.0], "unique_id", "y")
        .unwrap()
        .numeric_matrix(&["model-lo-80", "model-hi-80"])
        .unwrap();
    assert_eq!(from_polars, from_rows);
}

#[test]
fn out_of_range_levels_are_rejected() {
    let df: DataFrame = df! {
        "unique_id" => &["a"],
        "y" => &[1.0],
        "model" => &[1.0],
    }
    .unwrap();
    let err = add_insample_levels(&df, &["model"], &[100.0], "unique_id", "y").unwrap_err();
    assert!(matches!(err, PrepError::Configuration(_)));
}

#[test]
fn missing_model_column_is_a_validation_error() {
    let df = df! {
        "unique_id" => &["a"],
        "y" => &[1.0],
    }
    .unwrap();
    let err = add_insample_levels(&df, &["model"], &[80.0], "unique_id", "y").unwrap_err();
    assert!(matches!(err, PrepError::Validation(_)));
}
