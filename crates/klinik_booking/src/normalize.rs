// --- File: crates/klinik_booking/src/normalize.rs ---
//! Coercion of raw spreadsheet cells into typed slot data.
//!
//! The sheet is edited by hand, so dates arrive as `2025-11-10`, `10/11/2025` or
//! `2025.11.10`, booleans as `TRUE`/`yes`/`1`, and time labels with non-breaking
//! spaces or typographic dashes. Everything downstream works on the canonical
//! forms produced here.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use std::fmt;

/// Renders a cell the way the sheet displays it.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Normalizes a date to zero-padded `YYYY-MM-DD`.
///
/// A four-digit first token means year-month-day, a four-digit last token means
/// day-month-year. Anything else, including impossible calendar dates, comes
/// back trimmed with its separators unified to `-`.
pub fn normalize_date(raw: &str) -> String {
    let unified: String = raw
        .trim()
        .chars()
        .map(|c| if c == '.' || c == '/' { '-' } else { c })
        .collect();

    let parts: Vec<&str> = unified.split('-').map(str::trim).collect();
    if parts.len() != 3 {
        return unified;
    }

    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else if parts[2].len() == 4 {
        (parts[2], parts[1], parts[0])
    } else {
        return unified;
    };

    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) if NaiveDate::from_ymd_opt(y, m, d).is_some() => {
            format!("{:04}-{:02}-{:02}", y, m, d)
        }
        _ => unified,
    }
}

/// Parses any accepted date representation.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&normalize_date(raw), "%Y-%m-%d").ok()
}

pub fn normalize_bool(cell: Option<&Value>) -> bool {
    match cell {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => matches!(
            cell_text(other).trim().to_uppercase().as_str(),
            "TRUE" | "YES" | "Y" | "1"
        ),
    }
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}' | '\u{2212}' | '\u{FE63}' | '\u{FF0D}')
}

/// Collapses whitespace runs (NBSP included) to one space, trims, and folds
/// typographic dashes to `-`.
pub fn clean_time_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: Option<String>,
}

/// Splits a cleaned label on its first dash.
pub fn parse_time_range(raw: &str) -> TimeRange {
    let cleaned = clean_time_label(raw);
    match cleaned.split_once('-') {
        Some((start, end)) => TimeRange {
            start: start.trim().to_string(),
            end: Some(end.trim().to_string()).filter(|e| !e.is_empty()),
        },
        None => TimeRange {
            start: cleaned.trim().to_string(),
            end: None,
        },
    }
}

pub fn parse_hour_minute(start: &str) -> Option<(u32, u32)> {
    let mut parts = start.split(':');
    let hour = parts.next()?.trim().parse::<u32>().ok()?;
    let minute = parts.next()?.trim().parse::<u32>().ok()?;
    Some((hour, minute))
}

pub fn parse_clock_time(start: &str) -> Option<NaiveTime> {
    let (hour, minute) = parse_hour_minute(start)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parses a non-negative integer cell. Anything else is `None`, never 0.
pub fn parse_count(cell: Option<&Value>) -> Option<u32> {
    match cell? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Canonical identity of a slot: calendar date plus start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub start: NaiveTime,
}

impl SlotKey {
    pub fn new(date: NaiveDate, start: NaiveTime) -> Self {
        Self { date, start }
    }

    /// Builds a key from raw cell text; `None` if either part does not parse.
    pub fn parse(date: &str, time_label: &str) -> Option<Self> {
        let date = parse_date(date)?;
        let start = parse_clock_time(&parse_time_range(time_label).start)?;
        Some(Self { date, start })
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.start.format("%H:%M"))
    }
}

/// One `time_slots` row after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// 1-based sheet row number.
    pub row_number: u32,
    /// Normalized date text; may still be non-canonical if the cell was garbage.
    pub date: String,
    pub time_slot: String,
    pub is_available: bool,
    pub max_capacity: Option<u32>,
    pub current_bookings: Option<u32>,
}

impl Slot {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn time_range(&self) -> TimeRange {
        parse_time_range(&self.time_slot)
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_clock_time(&self.time_range().start)
    }

    pub fn key(&self) -> Option<SlotKey> {
        Some(SlotKey::new(self.date()?, self.start_time()?))
    }
}

/// Parses one `time_slots` row. Short rows and rows without a date are skipped.
pub fn parse_slot_row(row_number: u32, row: &[Value]) -> Option<Slot> {
    if row.len() < 5 {
        return None;
    }
    let date = normalize_date(&cell_text(&row[0]));
    if date.is_empty() {
        return None;
    }
    Some(Slot {
        row_number,
        date,
        time_slot: cell_text(&row[1]).trim().to_string(),
        is_available: normalize_bool(row.get(2)),
        max_capacity: parse_count(row.get(3)),
        current_bookings: parse_count(row.get(4)),
    })
}
