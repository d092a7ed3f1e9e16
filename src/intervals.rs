//! In-sample prediction intervals from per-series residual spread.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::engine::TabularFrame;
use crate::error::{PrepError, Result};
use crate::validation::require_columns;

fn format_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{}", level as i64)
    } else {
        format!("{level}")
    }
}

/// Population standard deviation of `model - target` within each series,
/// one value per (series, model).
fn residual_stds(
    codes: &[u32],
    n_series: usize,
    preds: &crate::engine::ValueMatrix,
    target: &[f64],
) -> Vec<Vec<f64>> {
    let n_models = preds.n_cols();
    let mut sums = vec![vec![0.0f64; n_models]; n_series];
    let mut sq_sums = vec![vec![0.0f64; n_models]; n_series];
    let mut counts = vec![0usize; n_series];
    for (row, &code) in codes.iter().enumerate() {
        let series = code as usize;
        counts[series] += 1;
        for model in 0..n_models {
            let residual = preds.get(row, model) - target[row];
            sums[series][model] += residual;
            sq_sums[series][model] += residual * residual;
        }
    }
    let mut stds = vec![vec![0.0f64; n_models]; n_series];
    for series in 0..n_series {
        let n = counts[series] as f64;
        for model in 0..n_models {
            let mean = sums[series][model] / n;
            let var = (sq_sums[series][model] / n - mean * mean).max(0.0);
            stds[series][model] = var.sqrt();
        }
    }
    stds
}

/// Add `{model}-lo-{level}` / `{model}-hi-{level}` interval columns for every
/// model and confidence level, width = gaussian quantile of
/// `0.5 + level / 200` times the series' residual standard deviation.
pub fn add_insample_levels<F: TabularFrame>(
    df: &F,
    models: &[&str],
    levels: &[f64],
    id_col: &str,
    target_col: &str,
) -> Result<F> {
    for &level in levels {
        if !(0.0 < level && level < 100.0) {
            return Err(PrepError::Configuration(format!(
                "confidence levels must be between 0 and 100, got {level}"
            )));
        }
    }
    require_columns(df, &[id_col, target_col])?;
    require_columns(df, models)?;

    let grouped = df.id_codes(id_col)?;
    let n_series = grouped.n_groups();
    let preds = df.numeric_matrix(models)?;
    let target = df.numeric_matrix(&[target_col])?.column(0);
    let stds = residual_stds(&grouped.codes, n_series, &preds, &target);

    let normal =
        Normal::new(0.0, 1.0).map_err(|e| PrepError::Configuration(e.to_string()))?;
    let cuts: Vec<f64> = levels
        .iter()
        .map(|&level| normal.inverse_cdf(0.5 + level / 200.0))
        .collect();

    let n_rows = preds.n_rows();
    let n_out = models.len() * 2 * levels.len();
    let mut names = Vec::with_capacity(n_out);
    let mut out = crate::engine::ValueMatrix::zeros(n_rows, n_out);
    let mut k = 0;
    for (m, model) in models.iter().enumerate() {
        for sign in [-1.0, 1.0] {
            let side = if sign < 0.0 { "lo" } else { "hi" };
            for (j, &level) in levels.iter().enumerate() {
                names.push(format!("{model}-{side}-{}", format_level(level)));
                for row in 0..n_rows {
                    let series = grouped.codes[row] as usize;
                    let width = cuts[j] * stds[series][m];
                    out.set(row, k, preds.get(row, m) + sign * width);
                }
                k += 1;
            }
        }
    }

    df.assign_numeric(&names, &out)
}
