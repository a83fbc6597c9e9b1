// --- File: crates/klinik_booking/src/calendar.rs ---
//! Read-side aggregation of the `time_slots` table.

use crate::availability::{check_capacity, is_bookable, AvailabilityRules};
use crate::error::BookingError;
use crate::holidays::service_days;
use crate::normalize::{normalize_date, parse_date, parse_slot_row, Slot};
use crate::table::Table;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc};
use klinik_common::services::SheetStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Longest `weeks` window a request may ask for.
pub const MAX_WEEKS: u32 = 520;
/// Most calendar years a `years` list may span.
pub const MAX_YEAR_SPAN: i32 = 10;

/// Inclusive calendar range shared by the aggregator and the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Tomorrow through `today + 7 * weeks`.
    ///
    /// `None` above [`MAX_WEEKS`] or past the end of the calendar.
    pub fn next_weeks(today: NaiveDate, weeks: u32) -> Option<Self> {
        if weeks > MAX_WEEKS {
            return None;
        }
        Some(Self {
            from: today.checked_add_days(Days::new(1))?,
            to: today.checked_add_days(Days::new(7 * u64::from(weeks)))?,
        })
    }

    /// The span of the given years, never starting before tomorrow.
    ///
    /// `None` for an empty list, a year chrono cannot represent or a span
    /// wider than [`MAX_YEAR_SPAN`]; the range itself may be empty for past years.
    pub fn for_years(today: NaiveDate, years: &[i32]) -> Option<Self> {
        let min = *years.iter().min()?;
        let max = *years.iter().max()?;
        if i64::from(max) - i64::from(min) >= i64::from(MAX_YEAR_SPAN) {
            return None;
        }
        let first = NaiveDate::from_ymd_opt(min, 1, 1)?;
        let last = NaiveDate::from_ymd_opt(max, 12, 31)?;
        Some(Self {
            from: first.max(today.checked_add_days(Days::new(1))?),
            to: last,
        })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            from,
            to: next - Duration::days(1),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Monday to Saturday, non-holiday days in the range.
    pub fn service_days(&self) -> Vec<NaiveDate> {
        service_days(self.from, self.to)
    }
}

/// Parses every data row of a `time_slots` read. Row 1 is the header.
pub fn slots_from_rows(rows: &[Vec<serde_json::Value>]) -> Vec<Slot> {
    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, row)| parse_slot_row(index as u32 + 1, row))
        .collect()
}

pub async fn load_slots(store: &dyn SheetStore) -> Result<Vec<Slot>, BookingError> {
    let rows = store.read_range(&Table::TimeSlots.full_range()).await?;
    let slots = slots_from_rows(&rows);
    debug!(
        "Read {} rows from time_slots, {} parsed as slots",
        rows.len(),
        slots.len()
    );
    Ok(slots)
}

/// Distinct bookable start times per date.
pub fn bookable_starts(
    slots: &[Slot],
    now: DateTime<Utc>,
    rules: &AvailabilityRules,
) -> BTreeMap<NaiveDate, BTreeSet<NaiveTime>> {
    let mut by_date: BTreeMap<NaiveDate, BTreeSet<NaiveTime>> = BTreeMap::new();
    let mut bookable = 0usize;
    for slot in slots.iter().filter(|s| is_bookable(s, now, rules)) {
        bookable += 1;
        if let Some(key) = slot.key() {
            by_date.entry(key.date).or_default().insert(key.start);
        }
    }
    let distinct: usize = by_date.values().map(BTreeSet::len).sum();
    if bookable > distinct {
        debug!("Ignored {} duplicate bookable rows", bookable - distinct);
    }
    by_date
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailableDate {
    #[cfg_attr(feature = "openapi", schema(example = "2025-11-10"))]
    pub date: String,
    #[serde(rename = "hasSlots")]
    pub has_slots: bool,
    #[serde(rename = "slotCount")]
    pub slot_count: usize,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailableDatesResponse {
    pub dates: Vec<AvailableDate>,
    pub total: usize,
}

/// Service days in `range` whose opening time is outside the lead time, with
/// the number of distinct bookable starts on each.
pub async fn get_available_dates(
    store: &dyn SheetStore,
    range: DateRange,
    now: DateTime<Utc>,
    rules: &AvailabilityRules,
) -> Result<AvailableDatesResponse, BookingError> {
    let slots = load_slots(store).await?;
    let starts = bookable_starts(&slots, now, rules);

    let dates: Vec<AvailableDate> = range
        .service_days()
        .into_iter()
        .filter(|day| !rules.day_within_lead_time(*day, now))
        .map(|day| {
            let slot_count = starts.get(&day).map_or(0, BTreeSet::len);
            AvailableDate {
                date: day.format("%Y-%m-%d").to_string(),
                has_slots: slot_count > 0,
                slot_count,
            }
        })
        .collect();

    info!(
        "Available dates {}..={}: {} days listed",
        range.from,
        range.to,
        dates.len()
    );
    Ok(AvailableDatesResponse {
        total: dates.len(),
        dates,
    })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DaySummary {
    pub date: String,
    #[serde(rename = "hasSlots")]
    pub has_slots: bool,
    pub count: usize,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MonthAvailabilityResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DaySummary>,
}

pub async fn month_availability(
    store: &dyn SheetStore,
    year: i32,
    month: u32,
    now: DateTime<Utc>,
    rules: &AvailabilityRules,
) -> Result<MonthAvailabilityResponse, BookingError> {
    let range = DateRange::month(year, month).ok_or_else(|| {
        BookingError::invalid(format!("Invalid month: {}-{}", year, month))
    })?;

    let slots = load_slots(store).await?;
    let starts = bookable_starts(&slots, now, rules);

    let days = range
        .service_days()
        .into_iter()
        .map(|day| {
            let count = starts.get(&day).map_or(0, BTreeSet::len);
            DaySummary {
                date: day.format("%Y-%m-%d").to_string(),
                has_slots: count > 0,
                count,
            }
        })
        .collect();

    Ok(MonthAvailabilityResponse { year, month, days })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DaySlot {
    #[cfg_attr(feature = "openapi", schema(example = "10:00"))]
    pub start: String,
    #[cfg_attr(feature = "openapi", schema(example = "10:30"))]
    pub end: String,
    pub value: String,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DayAvailabilityResponse {
    pub slots: Vec<DaySlot>,
    pub available_slots: Vec<String>,
}

/// Sorted, de-duplicated bookable slots of one day.
///
/// Rejects before reading the store when the day's opening time is already
/// inside the lead time.
pub async fn day_availability(
    store: &dyn SheetStore,
    date: &str,
    now: DateTime<Utc>,
    rules: &AvailabilityRules,
) -> Result<DayAvailabilityResponse, BookingError> {
    let day = parse_date(date)
        .ok_or_else(|| BookingError::invalid(format!("Invalid date: {}", date)))?;
    if rules.day_within_lead_time(day, now) {
        return Err(BookingError::DayTooSoon);
    }

    let slots = load_slots(store).await?;
    let mut by_start: BTreeMap<NaiveTime, DaySlot> = BTreeMap::new();
    for slot in slots
        .iter()
        .filter(|s| s.date() == Some(day))
        .filter(|s| is_bookable(s, now, rules))
    {
        let Some(start) = slot.start_time() else {
            continue;
        };
        let start_text = start.format("%H:%M").to_string();
        by_start.entry(start).or_insert_with(|| DaySlot {
            start: start_text.clone(),
            end: slot.time_range().end.unwrap_or_default(),
            value: start_text,
        });
    }

    let slots: Vec<DaySlot> = by_start.into_values().collect();
    let available_slots = slots
        .iter()
        .map(|s| {
            if s.end.is_empty() {
                s.start.clone()
            } else {
                format!("{}-{}", s.start, s.end)
            }
        })
        .collect();
    Ok(DayAvailabilityResponse {
        slots,
        available_slots,
    })
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CheckAvailabilityResponse {
    pub date: String,
    pub available_slots: Vec<String>,
    pub total_slots: usize,
}

/// Slot labels on `date` that are open and have capacity left.
///
/// Business hours and lead time are not applied here.
pub async fn check_availability(
    store: &dyn SheetStore,
    date: &str,
) -> Result<CheckAvailabilityResponse, BookingError> {
    let wanted = normalize_date(date);
    let slots = load_slots(store).await?;
    let available_slots: Vec<String> = slots
        .into_iter()
        .filter(|s| s.date == wanted && check_capacity(s).is_ok())
        .map(|s| s.time_slot)
        .collect();

    Ok(CheckAvailabilityResponse {
        date: date.to_string(),
        total_slots: available_slots.len(),
        available_slots,
    })
}

/// Clinic-local year and month of `now`, for requests that omit them.
pub fn current_month(now: DateTime<Utc>, rules: &AvailabilityRules) -> (i32, u32) {
    let today = rules.today(now);
    (today.year(), today.month())
}
