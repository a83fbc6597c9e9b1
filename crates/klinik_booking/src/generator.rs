// --- File: crates/klinik_booking/src/generator.rs ---
use crate::calendar::DateRange;
use crate::error::BookingError;
use crate::normalize::{cell_text, parse_date, SlotKey};
use crate::table::Table;
use chrono::{NaiveDate, NaiveTime, Timelike};
use klinik_common::services::{ensure_sheet, Row, SheetStore};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Rows per append request.
const APPEND_BATCH: usize = 1000;

/// Opening pattern applied to every generated day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTemplate {
    pub start: NaiveTime,
    /// Exclusive.
    pub end: NaiveTime,
    pub interval_minutes: u32,
    pub max_capacity: u32,
}

fn parse_hhmm(raw: &str) -> Result<(i64, i64), BookingError> {
    let invalid_format =
        || BookingError::invalid("Invalid time format. Use HH:MM format (e.g., 10:00, 18:00)");
    let (h, m) = raw.trim().split_once(':').ok_or_else(invalid_format)?;
    let hour = h.trim().parse::<i64>().map_err(|_| invalid_format())?;
    let minute = m.trim().parse::<i64>().map_err(|_| invalid_format())?;
    Ok((hour, minute))
}

impl ShiftTemplate {
    /// Validates raw template values. Nothing is clamped.
    pub fn parse(
        start_time: &str,
        end_time: &str,
        interval_minutes: i64,
        max_capacity: i64,
    ) -> Result<Self, BookingError> {
        let (start_hour, start_minute) = parse_hhmm(start_time)?;
        let (end_hour, end_minute) = parse_hhmm(end_time)?;

        let in_range = |h: i64, m: i64| (0..=23).contains(&h) && (0..=59).contains(&m);
        if !in_range(start_hour, start_minute) || !in_range(end_hour, end_minute) {
            return Err(BookingError::invalid(
                "Invalid time values. Hours must be 0-23, minutes must be 0-59",
            ));
        }
        if !(1..=60).contains(&interval_minutes) {
            return Err(BookingError::invalid(
                "Invalid interval. Must be a positive integer between 1 and 60 minutes",
            ));
        }
        let max_capacity = u32::try_from(max_capacity)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| BookingError::invalid("Invalid max capacity. Must be a positive integer"))?;

        let time = |h: i64, m: i64| {
            NaiveTime::from_hms_opt(h as u32, m as u32, 0)
                .ok_or_else(|| BookingError::invalid("Invalid time format. Use HH:MM format (e.g., 10:00, 18:00)"))
        };
        Ok(Self {
            start: time(start_hour, start_minute)?,
            end: time(end_hour, end_minute)?,
            interval_minutes: interval_minutes as u32,
            max_capacity,
        })
    }

    /// Start times from `start` up to, not including, `end`.
    pub fn start_times(&self) -> Vec<NaiveTime> {
        let to_minutes = |t: NaiveTime| t.hour() * 60 + t.minute();
        let end = to_minutes(self.end);
        let mut minutes = to_minutes(self.start);
        let mut times = Vec::new();
        while minutes < end {
            if let Some(t) = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) {
                times.push(t);
            }
            minutes += self.interval_minutes;
        }
        times
    }
}

impl Default for ShiftTemplate {
    fn default() -> Self {
        Self {
            start: NaiveTime::MIN + chrono::Duration::hours(10),
            end: NaiveTime::MIN + chrono::Duration::hours(18),
            interval_minutes: 30,
            max_capacity: 1,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GeneratedRange {
    pub from: String,
    pub to: String,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GenerationReport {
    pub message: String,
    pub generated: usize,
    /// Candidate slots left out because they already existed.
    pub skipped: usize,
    #[serde(rename = "dateRange")]
    pub date_range: GeneratedRange,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Existing `(date, start)` keys, header row skipped when present.
async fn existing_keys(store: &dyn SheetStore) -> Result<HashSet<SlotKey>, BookingError> {
    let rows = store
        .read_range(&format!("{}!A:B", Table::TimeSlots.name()))
        .await?;
    let skip_header = rows
        .first()
        .and_then(|r| r.first())
        .is_some_and(|c| cell_text(c).trim().eq_ignore_ascii_case("date"));
    Ok(rows
        .iter()
        .skip(usize::from(skip_header))
        .filter(|r| r.len() >= 2)
        .filter_map(|r| SlotKey::parse(&cell_text(&r[0]), &cell_text(&r[1])))
        .collect())
}

/// Deletes every slot row dated inside `range`. Returns the number removed.
async fn delete_range(store: &dyn SheetStore, range: DateRange) -> Result<usize, BookingError> {
    let rows = store.read_range(&Table::TimeSlots.full_range()).await?;
    let skip_header = rows
        .first()
        .and_then(|r| r.first())
        .is_some_and(|c| cell_text(c).trim().eq_ignore_ascii_case("date"));

    let doomed: Vec<u32> = rows
        .iter()
        .enumerate()
        .skip(usize::from(skip_header))
        .filter_map(|(index, row)| {
            let date = parse_date(&cell_text(row.first()?))?;
            range.contains(date).then_some(index as u32 + 1)
        })
        .collect();

    if !doomed.is_empty() {
        store.delete_rows(Table::TimeSlots.name(), &doomed).await?;
        info!("Deleted {} existing slot rows for overwrite", doomed.len());
    }
    Ok(doomed.len())
}

/// Bulk-inserts slot rows for every service day in `range`.
///
/// With `overwrite`, existing rows in the range are deleted first and their
/// booking counts are lost.
pub async fn generate_time_slots(
    store: &dyn SheetStore,
    range: DateRange,
    template: &ShiftTemplate,
    overwrite: bool,
) -> Result<GenerationReport, BookingError> {
    ensure_sheet(store, Table::TimeSlots.name(), Table::TimeSlots.headers()).await?;

    let existing = if overwrite {
        delete_range(store, range).await?;
        HashSet::new()
    } else {
        existing_keys(store).await?
    };

    let starts = template.start_times();
    let mut rows: Vec<Row> = Vec::new();
    let mut skipped = 0usize;
    for day in range.service_days() {
        let date = format_date(day);
        for start in &starts {
            if existing.contains(&SlotKey::new(day, *start)) {
                skipped += 1;
                continue;
            }
            rows.push(vec![
                json!(date),
                json!(start.format("%H:%M").to_string()),
                json!("TRUE"),
                json!(template.max_capacity.to_string()),
                json!("0"),
            ]);
        }
    }

    let date_range = GeneratedRange {
        from: format_date(range.from),
        to: format_date(range.to),
    };
    if rows.is_empty() {
        if range.is_empty() {
            warn!("Generation range {}..={} is empty", range.from, range.to);
        }
        return Ok(GenerationReport {
            message: "No new time slots to generate (all already exist)".to_string(),
            generated: 0,
            skipped,
            date_range,
        });
    }

    let generated = rows.len();
    for batch in rows.chunks(APPEND_BATCH) {
        store
            .append_rows(&Table::TimeSlots.full_range(), batch.to_vec())
            .await?;
    }
    info!(
        "Generated {} slots for {}..={} ({} skipped, overwrite: {})",
        generated, date_range.from, date_range.to, skipped, overwrite
    );

    Ok(GenerationReport {
        message: format!("Successfully generated {} time slots", generated),
        generated,
        skipped,
        date_range,
    })
}
