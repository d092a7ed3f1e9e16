//! Row/column engine: a lightweight in-memory frame.
//!
//! Stands in for the row-oriented dataframe library of the original design;
//! the Rust ecosystem has no pandas equivalent, so the adapter owns a minimal
//! frame that satisfies the same capability interface.

use chrono::NaiveDateTime;

use super::{
    encode_keys, ColumnValues, GroupedIds, IdValues, TabularFrame, TimeValues, ValueMatrix,
};
use crate::error::{PrepError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Str(Vec<String>),
    Time(Vec<NaiveDateTime>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            ColumnData::Int(_) => "integer",
            ColumnData::Float(_) => "float",
            ColumnData::Str(_) => "string",
            ColumnData::Time(_) => "datetime",
        }
    }

    fn filter(&self, mask: &[bool]) -> ColumnData {
        fn flt<T: Clone>(v: &[T], mask: &[bool]) -> Vec<T> {
            v.iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(x, _)| x.clone())
                .collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(flt(v, mask)),
            ColumnData::Float(v) => ColumnData::Float(flt(v, mask)),
            ColumnData::Str(v) => ColumnData::Str(flt(v, mask)),
            ColumnData::Time(v) => ColumnData::Time(flt(v, mask)),
        }
    }

    fn append(&mut self, other: &ColumnData) -> Result<()> {
        match (self, other) {
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend_from_slice(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            (ColumnData::Time(a), ColumnData::Time(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(PrepError::Validation(format!(
                    "cannot concatenate {} column with {} column",
                    a.kind(),
                    b.kind()
                )))
            }
        }
        Ok(())
    }
}

/// Minimal row-oriented frame: named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFrame {
    columns: Vec<(String, ColumnData)>,
}

impl RowFrame {
    pub fn new() -> RowFrame {
        RowFrame::default()
    }

    /// Append a column, enforcing equal lengths.
    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<RowFrame> {
        if let Some((_, first)) = self.columns.first() {
            if first.len() != data.len() {
                return Err(PrepError::Validation(format!(
                    "column '{name}' has length {}, expected {}",
                    data.len(),
                    first.len()
                )));
            }
        }
        if self.columns.iter().any(|(n, _)| n == name) {
            return Err(PrepError::Validation(format!("duplicate column '{name}'")));
        }
        self.columns.push((name.to_string(), data));
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| PrepError::Validation(format!("missing column '{name}'")))
    }
}

impl TabularFrame for RowFrame {
    fn height(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    fn id_codes(&self, id_col: &str) -> Result<GroupedIds> {
        match self.column(id_col)? {
            ColumnData::Int(v) => {
                let (keys, codes) = encode_keys(v);
                Ok(GroupedIds {
                    keys: IdValues::Int(keys),
                    codes,
                })
            }
            ColumnData::Str(v) => {
                let (keys, codes) = encode_keys(v);
                Ok(GroupedIds {
                    keys: IdValues::Str(keys),
                    codes,
                })
            }
            other => Err(PrepError::Validation(format!(
                "id column '{id_col}' must be integer or string, found {}",
                other.kind()
            ))),
        }
    }

    fn time_values(&self, time_col: &str) -> Result<TimeValues> {
        match self.column(time_col)? {
            ColumnData::Int(v) => Ok(TimeValues::Int(v.clone())),
            ColumnData::Time(v) => Ok(TimeValues::Stamp(v.clone())),
            other => Err(PrepError::Validation(format!(
                "time column '{time_col}' must be integer or datetime, found {}",
                other.kind()
            ))),
        }
    }

    fn numeric_matrix(&self, cols: &[&str]) -> Result<ValueMatrix> {
        let n_rows = TabularFrame::height(self);
        let mut out = ValueMatrix::zeros(n_rows, cols.len());
        for (j, name) in cols.iter().enumerate() {
            match self.column(name)? {
                ColumnData::Float(v) => {
                    for (i, &x) in v.iter().enumerate() {
                        out.set(i, j, x);
                    }
                }
                ColumnData::Int(v) => {
                    for (i, &x) in v.iter().enumerate() {
                        out.set(i, j, x as f64);
                    }
                }
                other => {
                    return Err(PrepError::Validation(format!(
                        "column '{name}' must be numeric, found {}",
                        other.kind()
                    )))
                }
            }
        }
        Ok(out)
    }

    fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != TabularFrame::height(self) {
            return Err(PrepError::Validation(format!(
                "mask length {} does not match row count {}",
                mask.len(),
                TabularFrame::height(self)
            )));
        }
        Ok(RowFrame {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.filter(mask)))
                .collect(),
        })
    }

    fn concat_vertical(frames: &[Self]) -> Result<Self> {
        let mut iter = frames.iter();
        let first = iter
            .next()
            .ok_or_else(|| PrepError::Validation("cannot concatenate an empty list".into()))?;
        let mut out = first.clone();
        for frame in iter {
            if frame.column_names() != out.column_names() {
                return Err(PrepError::Validation(
                    "vertical concat requires identical columns".into(),
                ));
            }
            for ((_, dst), (_, src)) in out.columns.iter_mut().zip(&frame.columns) {
                dst.append(src)?;
            }
        }
        Ok(out)
    }

    fn concat_horizontal(frames: &[Self]) -> Result<Self> {
        let mut iter = frames.iter();
        let first = iter
            .next()
            .ok_or_else(|| PrepError::Validation("cannot concatenate an empty list".into()))?;
        let mut out = first.clone();
        for frame in iter {
            for (name, data) in &frame.columns {
                out = out.with_column(name, data.clone())?;
            }
        }
        Ok(out)
    }

    fn assign_numeric(&self, names: &[String], matrix: &ValueMatrix) -> Result<Self> {
        if names.len() != matrix.n_cols() || matrix.n_rows() != TabularFrame::height(self) {
            return Err(PrepError::Validation(
                "assigned matrix shape does not match frame".into(),
            ));
        }
        let mut out = self.clone();
        for (j, name) in names.iter().enumerate() {
            let data = ColumnData::Float(matrix.column(j));
            match out.columns.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = data,
                None => out.columns.push((name.clone(), data)),
            }
        }
        Ok(out)
    }

    fn from_columns(cols: Vec<(&str, ColumnValues)>) -> Result<Self> {
        let mut out = RowFrame::new();
        for (name, values) in cols {
            let data = match values {
                ColumnValues::Id(IdValues::Int(v)) => ColumnData::Int(v),
                ColumnValues::Id(IdValues::Str(v)) => ColumnData::Str(v),
                ColumnValues::Time(TimeValues::Int(v)) => ColumnData::Int(v),
                ColumnValues::Time(TimeValues::Stamp(v)) => ColumnData::Time(v),
                ColumnValues::Float(v) => ColumnData::Float(v),
            };
            out = out.with_column(name, data)?;
        }
        Ok(out)
    }
}
