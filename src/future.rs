//! Forecast horizon skeleton: h future rows per series.

use crate::engine::{ColumnValues, IdValues, TabularFrame, TimeValues};
use crate::error::{PrepError, Result};
use crate::time::{time_ranges, Freq};

/// Build a frame with `h` rows per series: the id repeated, and a time range
/// starting one period after the series' last observed time.
pub fn make_future_frame<F: TabularFrame>(
    ids: &IdValues,
    last_times: &TimeValues,
    freq: &Freq,
    h: usize,
    id_col: &str,
    time_col: &str,
) -> Result<F> {
    if ids.len() != last_times.len() {
        return Err(PrepError::Validation(format!(
            "{} ids but {} last times",
            ids.len(),
            last_times.len()
        )));
    }
    let times = time_ranges(last_times, freq, h)?;
    F::from_columns(vec![
        (id_col, ColumnValues::Id(ids.repeat_each(h))),
        (time_col, ColumnValues::Time(times)),
    ])
}
