//! Columnar engine: `polars::prelude::DataFrame`.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

use super::{
    encode_keys, ColumnValues, GroupedIds, IdValues, TabularFrame, TimeValues, ValueMatrix,
};
use crate::error::{PrepError, Result};

fn get_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| PrepError::Validation(format!("missing column '{name}'")))
}

fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn int_column_values(col: &Column, name: &str) -> Result<Vec<i64>> {
    let casted = col.cast(&DataType::Int64)?;
    let ca = casted.i64()?;
    let mut out = Vec::with_capacity(ca.len());
    for i in 0..ca.len() {
        let v = ca
            .get(i)
            .ok_or_else(|| PrepError::Validation(format!("null value in column '{name}'")))?;
        out.push(v);
    }
    Ok(out)
}

fn stamp_from_datetime(value: i64, unit: TimeUnit) -> Result<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => DateTime::from_timestamp_micros(value.div_euclid(1_000)),
    };
    dt.map(|d| d.naive_utc())
        .ok_or_else(|| PrepError::Validation(format!("timestamp out of range: {value}")))
}

fn stamp_from_date(days: i32) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0)
        .map(|d| d.naive_utc())
        .ok_or_else(|| PrepError::Validation(format!("date out of range: {days} days")))
}

impl TabularFrame for DataFrame {
    fn height(&self) -> usize {
        DataFrame::height(self)
    }

    fn column_names(&self) -> Vec<String> {
        self.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    fn id_codes(&self, id_col: &str) -> Result<GroupedIds> {
        let col = get_column(self, id_col)?;
        match col.dtype() {
            DataType::String => {
                let ca = col.str()?;
                let mut values = Vec::with_capacity(ca.len());
                for i in 0..ca.len() {
                    let v = ca.get(i).ok_or_else(|| {
                        PrepError::Validation(format!("null value in column '{id_col}'"))
                    })?;
                    values.push(v.to_string());
                }
                let (keys, codes) = encode_keys(&values);
                Ok(GroupedIds {
                    keys: IdValues::Str(keys),
                    codes,
                })
            }
            dtype if is_integer_dtype(dtype) => {
                let values = int_column_values(col, id_col)?;
                let (keys, codes) = encode_keys(&values);
                Ok(GroupedIds {
                    keys: IdValues::Int(keys),
                    codes,
                })
            }
            dtype => Err(PrepError::Validation(format!(
                "id column '{id_col}' must be integer or string, found {dtype:?}"
            ))),
        }
    }

    fn time_values(&self, time_col: &str) -> Result<TimeValues> {
        let col = get_column(self, time_col)?;
        match col.dtype() {
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                let ca = col.datetime()?;
                let mut out = Vec::with_capacity(ca.len());
                for i in 0..ca.len() {
                    let v = ca.phys.get(i).ok_or_else(|| {
                        PrepError::Validation(format!("null value in column '{time_col}'"))
                    })?;
                    out.push(stamp_from_datetime(v, unit)?);
                }
                Ok(TimeValues::Stamp(out))
            }
            DataType::Date => {
                let ca = col.date()?;
                let mut out = Vec::with_capacity(ca.len());
                for i in 0..ca.len() {
                    let v = ca.phys.get(i).ok_or_else(|| {
                        PrepError::Validation(format!("null value in column '{time_col}'"))
                    })?;
                    out.push(stamp_from_date(v)?);
                }
                Ok(TimeValues::Stamp(out))
            }
            dtype if is_integer_dtype(dtype) => {
                Ok(TimeValues::Int(int_column_values(col, time_col)?))
            }
            dtype => Err(PrepError::Validation(format!(
                "time column '{time_col}' must be integer, date or datetime, found {dtype:?}"
            ))),
        }
    }

    fn numeric_matrix(&self, cols: &[&str]) -> Result<ValueMatrix> {
        let n_rows = DataFrame::height(self);
        let n_cols = cols.len();
        let mut out = ValueMatrix::zeros(n_rows, n_cols);
        for (j, name) in cols.iter().enumerate() {
            let col = get_column(self, name)?;
            let numeric = matches!(col.dtype(), DataType::Float32 | DataType::Float64)
                || is_integer_dtype(col.dtype());
            if !numeric {
                return Err(PrepError::Validation(format!(
                    "column '{name}' must be numeric, found {:?}",
                    col.dtype()
                )));
            }
            let casted = col.cast(&DataType::Float64)?;
            let ca = casted.f64()?;
            for i in 0..n_rows {
                out.set(i, j, ca.get(i).unwrap_or(f64::NAN));
            }
        }
        Ok(out)
    }

    fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != DataFrame::height(self) {
            return Err(PrepError::Validation(format!(
                "mask length {} does not match row count {}",
                mask.len(),
                DataFrame::height(self)
            )));
        }
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(self.filter(&mask)?)
    }

    fn concat_vertical(frames: &[Self]) -> Result<Self> {
        let mut iter = frames.iter();
        let first = iter
            .next()
            .ok_or_else(|| PrepError::Validation("cannot concatenate an empty list".into()))?;
        let mut out = first.clone();
        for df in iter {
            out.vstack_mut(df)?;
        }
        Ok(out)
    }

    fn concat_horizontal(frames: &[Self]) -> Result<Self> {
        let mut iter = frames.iter();
        let first = iter
            .next()
            .ok_or_else(|| PrepError::Validation("cannot concatenate an empty list".into()))?;
        let mut out = first.clone();
        for df in iter {
            out.hstack_mut(df.get_columns())?;
        }
        Ok(out)
    }

    fn assign_numeric(&self, names: &[String], matrix: &ValueMatrix) -> Result<Self> {
        if names.len() != matrix.n_cols() || matrix.n_rows() != DataFrame::height(self) {
            return Err(PrepError::Validation(
                "assigned matrix shape does not match frame".into(),
            ));
        }
        let mut out = self.clone();
        for (j, name) in names.iter().enumerate() {
            out.with_column(Column::new(name.as_str().into(), matrix.column(j)))?;
        }
        Ok(out)
    }

    fn from_columns(cols: Vec<(&str, ColumnValues)>) -> Result<Self> {
        let mut columns = Vec::with_capacity(cols.len());
        for (name, values) in cols {
            let column = match values {
                ColumnValues::Id(IdValues::Int(v)) => Column::new(name.into(), v),
                ColumnValues::Id(IdValues::Str(v)) => Column::new(name.into(), v),
                ColumnValues::Time(TimeValues::Int(v)) => Column::new(name.into(), v),
                ColumnValues::Time(TimeValues::Stamp(v)) => {
                    let millis: Vec<i64> = v
                        .iter()
                        .map(|t| t.and_utc().timestamp_millis())
                        .collect();
                    Int64Chunked::from_vec(name.into(), millis)
                        .into_datetime(TimeUnit::Milliseconds, None)
                        .into_series()
                        .into_column()
                }
                ColumnValues::Float(v) => Column::new(name.into(), v),
            };
            columns.push(column);
        }
        Ok(DataFrame::new(columns)?)
    }
}
