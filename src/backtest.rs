//! Rolling-origin backtest splits.
//!
//! `backtest_splits` hands back a lazy iterator: each window's masks and
//! cutoffs are computed only when the consumer asks for them, so a
//! cross-validation loop can stop early without paying for the remaining
//! windows.

use serde::{Deserialize, Serialize};

use crate::engine::{ColumnValues, GroupedIds, IdValues, TabularFrame, TimeValues};
use crate::error::{PrepError, Result};
use crate::time::{offset_times, Freq};
use crate::validation::require_columns;

/// Window settings for [`backtest_splits`].
///
/// `step_size` defaults to `h`; `input_size` bounds the training window,
/// turning the expanding window into a sliding one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub n_windows: usize,
    pub h: usize,
    pub step_size: Option<usize>,
    pub input_size: Option<usize>,
}

impl BacktestConfig {
    pub fn new(n_windows: usize, h: usize) -> BacktestConfig {
        BacktestConfig {
            n_windows,
            h,
            step_size: None,
            input_size: None,
        }
    }

    pub fn with_step_size(mut self, step_size: usize) -> BacktestConfig {
        self.step_size = Some(step_size);
        self
    }

    pub fn with_input_size(mut self, input_size: usize) -> BacktestConfig {
        self.input_size = Some(input_size);
        self
    }

    fn step(&self) -> usize {
        self.step_size.unwrap_or(self.h)
    }

    fn validate(&self) -> Result<()> {
        if self.n_windows == 0 {
            return Err(PrepError::Configuration(
                "`n_windows` must be at least 1".into(),
            ));
        }
        if self.h == 0 {
            return Err(PrepError::Configuration("`h` must be at least 1".into()));
        }
        if self.step_size == Some(0) {
            return Err(PrepError::Configuration(
                "`step_size` must be at least 1".into(),
            ));
        }
        if self.input_size == Some(0) {
            return Err(PrepError::Configuration(
                "`input_size` must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One rolling-origin window.
///
/// `cutoffs` holds one row per surviving series (id, cutoff time). Training
/// rows of dropped series are left in `train`; they are harmless because no
/// validation rows exist for those series in this window.
#[derive(Debug, Clone)]
pub struct BacktestSplit<F> {
    pub cutoffs: F,
    pub train: F,
    pub valid: F,
    /// Series excluded from validation in this window for lack of training
    /// history. Empty when every series survived.
    pub dropped_ids: IdValues,
}

/// Lazy sequence of backtest windows. Window 0 has the earliest cutoff's
/// complement: the largest offset from each series' last time.
#[derive(Debug)]
pub struct BacktestSplits<'a, F: TabularFrame> {
    df: &'a F,
    config: BacktestConfig,
    freq: Freq,
    id_col: String,
    grouped: GroupedIds,
    time_keys: Vec<i64>,
    series_max: TimeValues,
    window: usize,
    failed: bool,
}

impl<'a, F: TabularFrame> BacktestSplits<'a, F> {
    pub fn n_windows(&self) -> usize {
        self.config.n_windows
    }

    fn split_window(&self, i: usize) -> Result<BacktestSplit<F>> {
        let h = self.config.h;
        let step = self.config.step();
        let test_size = h + step * (self.config.n_windows - 1);
        let offset = test_size - i * step;
        let n_series = self.grouped.n_groups();
        let n_rows = self.time_keys.len();

        let train_ends = offset_times(&self.series_max, &self.freq, -(offset as i64))?;
        let valid_ends = offset_times(&train_ends, &self.freq, h as i64)?;
        let train_end_keys = train_ends.sort_keys();
        let valid_end_keys = valid_ends.sort_keys();
        let train_start_keys = match self.config.input_size {
            Some(input_size) => {
                Some(offset_times(&train_ends, &self.freq, -(input_size as i64))?.sort_keys())
            }
            None => None,
        };

        let mut train_mask = vec![false; n_rows];
        let mut valid_mask = vec![false; n_rows];
        for row in 0..n_rows {
            let series = self.grouped.codes[row] as usize;
            let t = self.time_keys[row];
            let mut in_train = t <= train_end_keys[series];
            if let Some(starts) = &train_start_keys {
                in_train &= t > starts[series];
            }
            train_mask[row] = in_train;
            valid_mask[row] = t > train_end_keys[series] && t <= valid_end_keys[series];
        }

        let mut train_sizes = vec![0usize; n_series];
        for row in 0..n_rows {
            if train_mask[row] {
                train_sizes[self.grouped.codes[row] as usize] += 1;
            }
        }
        let too_short: Vec<bool> = train_sizes.iter().map(|&size| size == 0).collect();
        if too_short.iter().all(|&short| short) {
            return Err(PrepError::AllSeriesTooShort {
                min_samples: offset + 1,
            });
        }
        let dropped_ids = if too_short.iter().any(|&short| short) {
            let dropped = self.grouped.keys.filter(&too_short);
            log::warn!(
                "{} series are too short for window {} and were dropped from validation: {}",
                dropped.len(),
                i,
                dropped.display_truncated(10)
            );
            for row in 0..n_rows {
                if too_short[self.grouped.codes[row] as usize] {
                    valid_mask[row] = false;
                }
            }
            dropped
        } else {
            self.grouped.keys.empty_like()
        };

        let survivors: Vec<bool> = too_short.iter().map(|&short| !short).collect();
        let cutoffs = F::from_columns(vec![
            (
                self.id_col.as_str(),
                ColumnValues::Id(self.grouped.keys.filter(&survivors)),
            ),
            ("cutoff", ColumnValues::Time(train_ends.filter(&survivors))),
        ])?;
        let train = self.df.filter_rows(&train_mask)?;
        let valid = self.df.filter_rows(&valid_mask)?;

        Ok(BacktestSplit {
            cutoffs,
            train,
            valid,
            dropped_ids,
        })
    }
}

impl<'a, F: TabularFrame> Iterator for BacktestSplits<'a, F> {
    type Item = Result<BacktestSplit<F>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.window >= self.config.n_windows {
            return None;
        }
        let result = self.split_window(self.window);
        self.window += 1;
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.config.n_windows - self.window
        };
        (remaining, Some(remaining))
    }
}

/// Set up the rolling-origin windows for `df`.
///
/// The per-series maximum times are computed once here; everything
/// window-specific is deferred to iteration.
pub fn backtest_splits<'a, F: TabularFrame>(
    df: &'a F,
    config: BacktestConfig,
    freq: Freq,
    id_col: &str,
    time_col: &str,
) -> Result<BacktestSplits<'a, F>> {
    config.validate()?;
    require_columns(df, &[id_col, time_col])?;

    let grouped = df.id_codes(id_col)?;
    let times = df.time_values(time_col)?;

    // Surface time/frequency conflicts before the first window is requested.
    match (&times, &freq) {
        (TimeValues::Int(_), Freq::Int(_)) | (TimeValues::Stamp(_), Freq::Cal(_)) => {}
        _ => {
            return Err(PrepError::TypeMismatch {
                expected: "integer times with an integer frequency, or timestamps with a \
                           calendar frequency"
                    .to_string(),
                actual: format!("{} times with a {} frequency", times.kind(), freq.kind()),
            })
        }
    }

    if grouped.n_groups() == 0 {
        return Err(PrepError::Validation("panel has no rows".into()));
    }
    let time_keys = times.sort_keys();
    let series_max = df.group_max_time(id_col, time_col)?;

    Ok(BacktestSplits {
        df,
        config,
        freq,
        id_col: id_col.to_string(),
        grouped,
        time_keys,
        series_max,
        window: 0,
        failed: false,
    })
}

/// Timetable of every rolling window over an already-sorted panel: one row
/// per (window, series, horizon step) with its id, time and cutoff.
///
/// `times` is the sorted panel's full time column; `uids` and `indptr` come
/// from [`crate::panel::SortedPanel`]. Series shorter than a window's reach
/// are skipped for that window.
#[allow(clippy::too_many_arguments)]
pub fn cv_times<F: TabularFrame>(
    times: &TimeValues,
    uids: &IdValues,
    indptr: &[usize],
    h: usize,
    test_size: usize,
    step_size: usize,
    id_col: &str,
    time_col: &str,
) -> Result<F> {
    if test_size < h {
        return Err(PrepError::Configuration(
            "`test_size` should be greater or equal to `h`".into(),
        ));
    }
    if step_size == 0 {
        return Err(PrepError::Configuration("`step_size` must be at least 1".into()));
    }
    if (test_size - h) % step_size != 0 {
        return Err(PrepError::Configuration(
            "`test_size - h` should be a multiple of `step_size`".into(),
        ));
    }
    let n_windows = (test_size - h) / step_size + 1;
    let n_series = indptr.len().saturating_sub(1);

    let mut id_takes: Vec<usize> = Vec::new();
    let mut time_takes: Vec<usize> = Vec::new();
    let mut cutoff_takes: Vec<usize> = Vec::new();
    for window in 0..n_windows {
        let offset = test_size - window * step_size + 1;
        for series in 0..n_series {
            let size = indptr[series + 1] - indptr[series];
            if size < offset {
                continue;
            }
            let cutoff_idx = indptr[series + 1] - offset;
            for step in 1..=h {
                id_takes.push(series);
                time_takes.push(cutoff_idx + step);
                cutoff_takes.push(cutoff_idx);
            }
        }
    }

    F::from_columns(vec![
        (id_col, ColumnValues::Id(uids.take(&id_takes))),
        (time_col, ColumnValues::Time(times.take(&time_takes))),
        ("cutoff", ColumnValues::Time(times.take(&cutoff_takes))),
    ])
}
