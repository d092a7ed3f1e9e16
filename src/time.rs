//! Offsets and ranges over panel time columns.
//!
//! Integer counters move by plain arithmetic; calendar timestamps move by a
//! multiplier + unit descriptor. Month offsets carry the month-end anchoring
//! correction: when every input lands on a month end, every output is snapped
//! to its month end as well.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::engine::TimeValues;
use crate::error::{PrepError, Result};

/// Calendar offset unit, polars-style spelling in parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalUnit {
    Second, // "s"
    Minute, // "m"
    Hour,   // "h"
    Day,    // "d"
    Week,   // "w"
    Month,  // "mo"
    Year,   // "y"
}

impl CalUnit {
    fn suffix(&self) -> &'static str {
        match self {
            CalUnit::Second => "s",
            CalUnit::Minute => "m",
            CalUnit::Hour => "h",
            CalUnit::Day => "d",
            CalUnit::Week => "w",
            CalUnit::Month => "mo",
            CalUnit::Year => "y",
        }
    }
}

/// Calendar frequency descriptor: a positive multiplier and a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalFreq {
    pub mult: i64,
    pub unit: CalUnit,
}

impl CalFreq {
    pub fn new(mult: i64, unit: CalUnit) -> CalFreq {
        CalFreq { mult, unit }
    }

    /// Shift `t` by `n` periods of this frequency.
    pub fn offset(&self, t: NaiveDateTime, n: i64) -> Result<NaiveDateTime> {
        let total = self
            .mult
            .checked_mul(n)
            .ok_or_else(|| PrepError::Configuration("time offset out of range".into()))?;
        let out_of_range = || PrepError::Configuration("time offset out of range".into());
        match self.unit {
            CalUnit::Second => Duration::try_seconds(total)
                .and_then(|d| t.checked_add_signed(d))
                .ok_or_else(out_of_range),
            CalUnit::Minute => Duration::try_minutes(total)
                .and_then(|d| t.checked_add_signed(d))
                .ok_or_else(out_of_range),
            CalUnit::Hour => Duration::try_hours(total)
                .and_then(|d| t.checked_add_signed(d))
                .ok_or_else(out_of_range),
            CalUnit::Day => Duration::try_days(total)
                .and_then(|d| t.checked_add_signed(d))
                .ok_or_else(out_of_range),
            CalUnit::Week => Duration::try_weeks(total)
                .and_then(|d| t.checked_add_signed(d))
                .ok_or_else(out_of_range),
            CalUnit::Month => add_months(t, total).ok_or_else(out_of_range),
            CalUnit::Year => total
                .checked_mul(12)
                .and_then(|months| add_months(t, months))
                .ok_or_else(out_of_range),
        }
    }
}

impl fmt::Display for CalFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mult, self.unit.suffix())
    }
}

impl FromStr for CalFreq {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<CalFreq> {
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);
        let mult: i64 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| PrepError::Configuration(format!("invalid frequency '{s}'")))?
        };
        let unit = match suffix {
            "s" => CalUnit::Second,
            "m" => CalUnit::Minute,
            "h" => CalUnit::Hour,
            "d" => CalUnit::Day,
            "w" => CalUnit::Week,
            "mo" => CalUnit::Month,
            "y" => CalUnit::Year,
            _ => {
                return Err(PrepError::Configuration(format!(
                    "invalid frequency '{s}': unknown unit '{suffix}'"
                )))
            }
        };
        if mult < 1 {
            return Err(PrepError::Configuration(format!(
                "invalid frequency '{s}': multiplier must be positive"
            )));
        }
        Ok(CalFreq { mult, unit })
    }
}

/// Panel frequency: a plain integer step or a calendar descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freq {
    Int(i64),
    Cal(CalFreq),
}

impl Freq {
    pub fn kind(&self) -> &'static str {
        match self {
            Freq::Int(_) => "integer",
            Freq::Cal(_) => "calendar",
        }
    }
}

impl From<i64> for Freq {
    fn from(step: i64) -> Freq {
        Freq::Int(step)
    }
}

impl FromStr for Freq {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Freq> {
        if let Ok(step) = s.parse::<i64>() {
            return Ok(Freq::Int(step));
        }
        s.parse::<CalFreq>().map(Freq::Cal)
    }
}

fn add_months(t: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let amount = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        t.checked_add_months(amount)
    } else {
        t.checked_sub_months(amount)
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first_of_next.and_then(|d| d.pred_opt())
}

fn is_month_end(t: &NaiveDateTime) -> bool {
    last_day_of_month(t.date()) == Some(t.date())
}

fn snap_to_month_end(t: NaiveDateTime) -> Result<NaiveDateTime> {
    let last = last_day_of_month(t.date())
        .ok_or_else(|| PrepError::Configuration("time offset out of range".into()))?;
    Ok(NaiveDateTime::new(last, t.time()))
}

/// True when every input sits on the last day of its month. This drives the
/// anchoring correction for month-based offsets.
fn all_month_ends(times: &[NaiveDateTime]) -> bool {
    !times.is_empty() && times.iter().all(is_month_end)
}

fn type_mismatch(times: &TimeValues, freq: &Freq) -> PrepError {
    PrepError::TypeMismatch {
        expected: "integer times with an integer frequency, or timestamps with a \
                   calendar frequency"
            .to_string(),
        actual: format!("{} times with a {} frequency", times.kind(), freq.kind()),
    }
}

/// Shift every value in `times` forward by `n` periods of `freq`.
pub fn offset_times(times: &TimeValues, freq: &Freq, n: i64) -> Result<TimeValues> {
    match (times, freq) {
        (TimeValues::Int(values), Freq::Int(step)) => Ok(TimeValues::Int(
            values.iter().map(|t| t + n * step).collect(),
        )),
        (TimeValues::Stamp(values), Freq::Cal(cal)) => {
            let mut shifted = Vec::with_capacity(values.len());
            for t in values {
                shifted.push(cal.offset(*t, n)?);
            }
            if cal.unit == CalUnit::Month && all_month_ends(values) {
                shifted = shifted
                    .into_iter()
                    .map(snap_to_month_end)
                    .collect::<Result<Vec<_>>>()?;
            }
            Ok(TimeValues::Stamp(shifted))
        }
        _ => Err(type_mismatch(times, freq)),
    }
}

/// Shift each value by its own period count.
pub fn offset_times_each(times: &TimeValues, freq: &Freq, n: &[i64]) -> Result<TimeValues> {
    if n.len() != times.len() {
        return Err(PrepError::Validation(format!(
            "period counts have length {}, expected {}",
            n.len(),
            times.len()
        )));
    }
    match (times, freq) {
        (TimeValues::Int(values), Freq::Int(step)) => Ok(TimeValues::Int(
            values.iter().zip(n).map(|(t, k)| t + k * step).collect(),
        )),
        (TimeValues::Stamp(values), Freq::Cal(cal)) => {
            let mut shifted = Vec::with_capacity(values.len());
            for (t, k) in values.iter().zip(n) {
                shifted.push(cal.offset(*t, *k)?);
            }
            if cal.unit == CalUnit::Month && all_month_ends(values) {
                shifted = shifted
                    .into_iter()
                    .map(snap_to_month_end)
                    .collect::<Result<Vec<_>>>()?;
            }
            Ok(TimeValues::Stamp(shifted))
        }
        _ => Err(type_mismatch(times, freq)),
    }
}

/// For each start, `periods` consecutive values beginning one step after the
/// start itself. Flattened series-major: all periods for the first start,
/// then all periods for the second, and so on.
pub fn time_ranges(starts: &TimeValues, freq: &Freq, periods: usize) -> Result<TimeValues> {
    match (starts, freq) {
        (TimeValues::Int(values), Freq::Int(step)) => {
            let mut out = Vec::with_capacity(values.len() * periods);
            for start in values {
                for i in 1..=periods as i64 {
                    out.push(start + i * step);
                }
            }
            Ok(TimeValues::Int(out))
        }
        (TimeValues::Stamp(values), Freq::Cal(cal)) => {
            let snap = cal.unit == CalUnit::Month && all_month_ends(values);
            let mut out = Vec::with_capacity(values.len() * periods);
            for start in values {
                for i in 1..=periods as i64 {
                    let mut t = cal.offset(*start, i)?;
                    if snap {
                        t = snap_to_month_end(t)?;
                    }
                    out.push(t);
                }
            }
            Ok(TimeValues::Stamp(out))
        }
        _ => Err(type_mismatch(starts, freq)),
    }
}
