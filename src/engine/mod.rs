//! Tabular engine capability interface.
//!
//! Everything above this module is written once against [`TabularFrame`] and
//! never branches on which dataframe engine the caller supplied. Two engines
//! conform: `polars::prelude::DataFrame` (columnar) and [`RowFrame`]
//! (a lightweight row/column frame).

pub mod polars;
pub mod rows;

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::error::{PrepError, Result};

pub use rows::{ColumnData, RowFrame};

/// Unique series identifiers, sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub enum IdValues {
    Int(Vec<i64>),
    Str(Vec<String>),
}

impl IdValues {
    pub fn len(&self) -> usize {
        match self {
            IdValues::Int(v) => v.len(),
            IdValues::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Each element repeated `n` times, preserving order.
    pub fn repeat_each(&self, n: usize) -> IdValues {
        fn rep<T: Clone>(v: &[T], n: usize) -> Vec<T> {
            let mut out = Vec::with_capacity(v.len() * n);
            for x in v {
                for _ in 0..n {
                    out.push(x.clone());
                }
            }
            out
        }
        match self {
            IdValues::Int(v) => IdValues::Int(rep(v, n)),
            IdValues::Str(v) => IdValues::Str(rep(v, n)),
        }
    }

    pub fn filter(&self, mask: &[bool]) -> IdValues {
        fn flt<T: Clone>(v: &[T], mask: &[bool]) -> Vec<T> {
            v.iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(x, _)| x.clone())
                .collect()
        }
        match self {
            IdValues::Int(v) => IdValues::Int(flt(v, mask)),
            IdValues::Str(v) => IdValues::Str(flt(v, mask)),
        }
    }

    pub fn take(&self, idxs: &[usize]) -> IdValues {
        match self {
            IdValues::Int(v) => IdValues::Int(idxs.iter().map(|&i| v[i]).collect()),
            IdValues::Str(v) => IdValues::Str(idxs.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Empty id sequence of the same variant.
    pub fn empty_like(&self) -> IdValues {
        match self {
            IdValues::Int(_) => IdValues::Int(Vec::new()),
            IdValues::Str(_) => IdValues::Str(Vec::new()),
        }
    }

    /// Human-readable listing, truncated after `max` entries.
    pub fn display_truncated(&self, max: usize) -> String {
        let render = |items: Vec<String>, total: usize| -> String {
            if total > max {
                format!("[{}, ... ({} more)]", items.join(", "), total - max)
            } else {
                format!("[{}]", items.join(", "))
            }
        };
        match self {
            IdValues::Int(v) => render(
                v.iter().take(max).map(|x| x.to_string()).collect(),
                v.len(),
            ),
            IdValues::Str(v) => render(
                v.iter().take(max).map(|x| format!("'{x}'")).collect(),
                v.len(),
            ),
        }
    }
}

/// A column of time values: either an integer counter or calendar timestamps.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValues {
    Int(Vec<i64>),
    Stamp(Vec<NaiveDateTime>),
}

impl TimeValues {
    pub fn len(&self) -> usize {
        match self {
            TimeValues::Int(v) => v.len(),
            TimeValues::Stamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monotone integer keys for ordering comparisons. Timestamps map to
    /// microseconds since the epoch.
    pub fn sort_keys(&self) -> Vec<i64> {
        match self {
            TimeValues::Int(v) => v.clone(),
            TimeValues::Stamp(v) => v.iter().map(|t| t.and_utc().timestamp_micros()).collect(),
        }
    }

    pub fn take(&self, idxs: &[usize]) -> TimeValues {
        match self {
            TimeValues::Int(v) => TimeValues::Int(idxs.iter().map(|&i| v[i]).collect()),
            TimeValues::Stamp(v) => TimeValues::Stamp(idxs.iter().map(|&i| v[i]).collect()),
        }
    }

    pub fn filter(&self, mask: &[bool]) -> TimeValues {
        fn flt<T: Copy>(v: &[T], mask: &[bool]) -> Vec<T> {
            v.iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(x, _)| *x)
                .collect()
        }
        match self {
            TimeValues::Int(v) => TimeValues::Int(flt(v, mask)),
            TimeValues::Stamp(v) => TimeValues::Stamp(flt(v, mask)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TimeValues::Int(_) => "integer",
            TimeValues::Stamp(_) => "timestamp",
        }
    }
}

/// Sorted unique keys plus, for every row, the index of its key.
#[derive(Debug, Clone)]
pub struct GroupedIds {
    pub keys: IdValues,
    pub codes: Vec<u32>,
}

impl GroupedIds {
    pub fn n_groups(&self) -> usize {
        self.keys.len()
    }

    /// Rows per group, in key order.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.keys.len()];
        for &c in &self.codes {
            counts[c as usize] += 1;
        }
        counts
    }
}

pub(crate) fn encode_keys<T: Ord + std::hash::Hash + Clone>(values: &[T]) -> (Vec<T>, Vec<u32>) {
    let mut keys: Vec<T> = values.to_vec();
    keys.sort();
    keys.dedup();
    let index: HashMap<&T, u32> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k, i as u32))
        .collect();
    let codes = values.iter().map(|v| index[v]).collect();
    (keys, codes)
}

/// Dense row-major f64 matrix holding target and feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMatrix {
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl ValueMatrix {
    pub fn new(values: Vec<f64>, n_rows: usize, n_cols: usize) -> ValueMatrix {
        debug_assert_eq!(values.len(), n_rows * n_cols);
        ValueMatrix {
            values,
            n_rows,
            n_cols,
        }
    }

    pub fn zeros(n_rows: usize, n_cols: usize) -> ValueMatrix {
        ValueMatrix::new(vec![0.0; n_rows * n_cols], n_rows, n_cols)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.n_cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.n_cols..(row + 1) * self.n_cols]
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.n_rows).map(|r| self.get(r, col)).collect()
    }

    /// New matrix whose row `r` is `self`'s row `perm[r]`.
    pub fn take_rows(&self, perm: &[u32]) -> ValueMatrix {
        let mut values = Vec::with_capacity(self.values.len());
        for &src in perm {
            values.extend_from_slice(self.row(src as usize));
        }
        ValueMatrix::new(values, perm.len(), self.n_cols)
    }
}

/// Column payloads accepted by [`TabularFrame::from_columns`].
#[derive(Debug, Clone)]
pub enum ColumnValues {
    Id(IdValues),
    Time(TimeValues),
    Float(Vec<f64>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Id(v) => v.len(),
            ColumnValues::Time(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability interface required from a dataframe engine.
///
/// The provided methods (`group_count`, `sort_permutation`) hold the shared
/// grouping/ordering logic; engines only supply primitive column access,
/// filtering, concatenation and construction.
pub trait TabularFrame: Sized {
    fn height(&self) -> usize;

    fn column_names(&self) -> Vec<String>;

    /// Sorted unique ids plus per-row key indices. Fails with a validation
    /// error if the column is missing, null-bearing or not id-like.
    fn id_codes(&self, id_col: &str) -> Result<GroupedIds>;

    fn time_values(&self, time_col: &str) -> Result<TimeValues>;

    /// Selected columns as a dense f64 matrix, in the given column order.
    /// Integer and f32 columns are widened, nulls become NaN.
    fn numeric_matrix(&self, cols: &[&str]) -> Result<ValueMatrix>;

    /// Rows where `mask` is true, in order.
    fn filter_rows(&self, mask: &[bool]) -> Result<Self>;

    fn concat_vertical(frames: &[Self]) -> Result<Self>;

    fn concat_horizontal(frames: &[Self]) -> Result<Self>;

    /// Copy of `self` with one new (or replaced) column per name, taken from
    /// the matching column of `matrix`.
    fn assign_numeric(&self, names: &[String], matrix: &ValueMatrix) -> Result<Self>;

    fn from_columns(cols: Vec<(&str, ColumnValues)>) -> Result<Self>;

    /// Row counts per distinct id, stably sorted by id ascending.
    fn group_count(&self, id_col: &str) -> Result<(IdValues, Vec<usize>)> {
        let grouped = self.id_codes(id_col)?;
        let counts = grouped.counts();
        Ok((grouped.keys, counts))
    }

    /// Permutation that sorts rows by (id, time) ascending, stable, or `None`
    /// when the rows are already in id-blocked ascending-time order.
    fn sort_permutation(&self, id_col: &str, time_col: &str) -> Result<Option<Vec<u32>>> {
        let codes = self.id_codes(id_col)?.codes;
        let keys = self.time_values(time_col)?.sort_keys();
        if codes.len() != keys.len() {
            return Err(PrepError::Validation(format!(
                "columns '{id_col}' and '{time_col}' have different lengths"
            )));
        }
        let sorted = (1..codes.len()).all(|i| {
            codes[i - 1] < codes[i] || (codes[i - 1] == codes[i] && keys[i - 1] <= keys[i])
        });
        if sorted {
            return Ok(None);
        }
        let mut perm: Vec<u32> = (0..codes.len() as u32).collect();
        // sort_by_key is stable, so ties keep their original row order
        perm.sort_by_key(|&i| (codes[i as usize], keys[i as usize]));
        Ok(Some(perm))
    }

    /// Per-series maximum of the time column, one value per distinct id, in
    /// key order.
    fn group_max_time(&self, id_col: &str, time_col: &str) -> Result<TimeValues> {
        let grouped = self.id_codes(id_col)?;
        let times = self.time_values(time_col)?;
        let keys = times.sort_keys();
        let mut best: Vec<Option<usize>> = vec![None; grouped.n_groups()];
        for (row, &code) in grouped.codes.iter().enumerate() {
            let series = code as usize;
            match best[series] {
                Some(current) if keys[current] >= keys[row] => {}
                _ => best[series] = Some(row),
            }
        }
        // every code indexes into `best` by construction
        let idxs: Vec<usize> = best.into_iter().flatten().collect();
        Ok(times.take(&idxs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keys_sorts_and_dedups() {
        let (keys, codes) = encode_keys(&["b".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(codes, vec![1, 0, 1]);
    }

    #[test]
    fn matrix_take_rows_reorders() {
        let m = ValueMatrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let taken = m.take_rows(&[2, 0]);
        assert_eq!(taken.row(0), &[5.0, 6.0]);
        assert_eq!(taken.row(1), &[1.0, 2.0]);
    }

    #[test]
    fn id_display_truncates() {
        let ids = IdValues::Int((0..8).collect());
        let shown = ids.display_truncated(3);
        assert!(shown.contains("(5 more)"));
    }
}
