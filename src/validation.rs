//! Presence and dtype checks for the required panel columns.

use crate::engine::TabularFrame;
use crate::error::{PrepError, Result};

/// Ensure every named column exists.
pub fn require_columns<F: TabularFrame>(df: &F, cols: &[&str]) -> Result<()> {
    let present = df.column_names();
    for col in cols {
        if !present.iter().any(|name| name == col) {
            return Err(PrepError::Validation(format!(
                "missing required column '{col}'"
            )));
        }
    }
    Ok(())
}

/// Check the id/time/target columns are present and of usable types.
///
/// The id column must be integer or string, the time column integer or
/// datetime, the target numeric. Engines surface the specific offender.
pub fn validate_panel<F: TabularFrame>(
    df: &F,
    id_col: &str,
    time_col: &str,
    target_col: &str,
) -> Result<()> {
    require_columns(df, &[id_col, time_col, target_col])?;
    df.id_codes(id_col)?;
    df.time_values(time_col)?;
    df.numeric_matrix(&[target_col])?;
    Ok(())
}
