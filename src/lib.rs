//! panelprep: dataframe-backend abstraction for time-series forecasting
//! data preparation.
//!
//! Forecasting pipelines hand this crate a long-format panel (one series-id
//! column, one time column, a numeric target and optional features) living in
//! either of two dataframe engines (a polars `DataFrame` or the built-in
//! [`RowFrame`]) and get back engine-agnostic building blocks:
//!
//! - [`build_sorted_panel`]: the compact sorted representation (ids, indptr,
//!   dense value matrix, per-series last times).
//! - [`make_future_frame`]: the per-series forecast horizon skeleton.
//! - [`backtest_splits`]: lazy rolling-origin train/validation windows.
//! - [`add_insample_levels`]: in-sample prediction interval columns.
//!
//! All core logic is written once against the [`TabularFrame`] capability
//! trait; nothing above the engine adapters branches on the concrete engine.

pub mod backtest;
pub mod engine;
pub mod error;
pub mod future;
pub mod intervals;
pub mod panel;
pub mod time;
pub mod validation;

pub use backtest::{backtest_splits, cv_times, BacktestConfig, BacktestSplit, BacktestSplits};
pub use engine::{
    ColumnData, ColumnValues, GroupedIds, IdValues, RowFrame, TabularFrame, TimeValues,
    ValueMatrix,
};
pub use error::{PrepError, Result};
pub use future::make_future_frame;
pub use intervals::add_insample_levels;
pub use panel::{build_sorted_panel, SortedPanel};
pub use time::{offset_times, offset_times_each, time_ranges, CalFreq, CalUnit, Freq};
pub use validation::{require_columns, validate_panel};
