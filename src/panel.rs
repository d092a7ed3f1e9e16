//! Panel indexer: long-format panel -> compact sorted representation.

use crate::engine::{IdValues, TabularFrame, TimeValues, ValueMatrix};
use crate::error::{PrepError, Result};
use crate::validation::require_columns;

/// Immutable sorted view of a long-format panel.
///
/// Rows `indptr[k]..indptr[k + 1]` of `data` belong to `ids[k]`, in ascending
/// time order. `sort_permutation` is `None` when the input already arrived in
/// that order; callers can then skip re-permuting auxiliary arrays of their
/// own.
#[derive(Debug, Clone)]
pub struct SortedPanel {
    pub ids: IdValues,
    pub last_times: TimeValues,
    pub data: ValueMatrix,
    pub indptr: Vec<usize>,
    pub sort_permutation: Option<Vec<u32>>,
}

impl SortedPanel {
    pub fn n_series(&self) -> usize {
        self.ids.len()
    }

    pub fn n_rows(&self) -> usize {
        *self.indptr.last().unwrap_or(&0)
    }

    /// Row range of series `k` within the sorted data.
    pub fn series_range(&self, k: usize) -> std::ops::Range<usize> {
        self.indptr[k]..self.indptr[k + 1]
    }
}

/// Build the sorted representation of a panel.
///
/// The value matrix holds the target column first, then every remaining
/// non-id/time column in its original order.
pub fn build_sorted_panel<F: TabularFrame>(
    df: &F,
    id_col: &str,
    time_col: &str,
    target_col: &str,
) -> Result<SortedPanel> {
    require_columns(df, &[id_col, time_col, target_col])?;

    let grouped = df.id_codes(id_col)?;
    let counts = grouped.counts();

    let mut indptr = Vec::with_capacity(counts.len() + 1);
    indptr.push(0usize);
    for count in &counts {
        indptr.push(indptr.last().copied().unwrap_or(0) + count);
    }
    let mut last_idxs: Vec<usize> = indptr[1..].iter().map(|&end| end - 1).collect();

    // Target first, then feature columns in their original order.
    let names = df.column_names();
    let mut value_cols: Vec<&str> = vec![target_col];
    value_cols.extend(
        names
            .iter()
            .map(|s| s.as_str())
            .filter(|name| *name != id_col && *name != time_col && *name != target_col),
    );
    let mut data = df.numeric_matrix(&value_cols)?;

    let times = df.time_values(time_col)?;
    if times.len() != data.n_rows() {
        return Err(PrepError::Validation(format!(
            "column '{time_col}' has length {}, expected {}",
            times.len(),
            data.n_rows()
        )));
    }

    let sort_permutation = df.sort_permutation(id_col, time_col)?;
    if let Some(perm) = &sort_permutation {
        data = data.take_rows(perm);
        for idx in last_idxs.iter_mut() {
            *idx = perm[*idx] as usize;
        }
    }
    let last_times = times.take(&last_idxs);

    Ok(SortedPanel {
        ids: grouped.keys,
        last_times,
        data,
        indptr,
        sort_permutation,
    })
}
