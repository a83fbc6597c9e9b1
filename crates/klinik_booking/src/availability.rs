// --- File: crates/klinik_booking/src/availability.rs ---
use crate::normalize::{parse_clock_time, Slot};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use klinik_config::BookingConfig;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Business hours, lead time and the zone slot dates are written in.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityRules {
    pub open: NaiveTime,
    /// Exclusive: a slot starting at `close` is outside business hours.
    pub close: NaiveTime,
    pub lead_time: Duration,
    pub time_zone: Tz,
}

impl Default for AvailabilityRules {
    fn default() -> Self {
        Self {
            open: NaiveTime::MIN + Duration::hours(10),
            close: NaiveTime::MIN + Duration::hours(18),
            lead_time: Duration::hours(24),
            time_zone: chrono_tz::Australia::Sydney,
        }
    }
}

impl AvailabilityRules {
    /// Builds rules from the `[booking]` section; unusable values fall back to defaults.
    pub fn from_config(config: Option<&BookingConfig>) -> Self {
        let mut rules = Self::default();
        let Some(cfg) = config else {
            return rules;
        };

        if let Some(open) = cfg.open_time.as_deref() {
            match parse_clock_time(open) {
                Some(t) => rules.open = t,
                None => warn!("Ignoring invalid booking.open_time '{}'", open),
            }
        }
        if let Some(close) = cfg.close_time.as_deref() {
            match parse_clock_time(close) {
                Some(t) => rules.close = t,
                None => warn!("Ignoring invalid booking.close_time '{}'", close),
            }
        }
        if let Some(hours) = cfg.lead_time_hours {
            if hours >= 0 {
                rules.lead_time = Duration::hours(hours);
            } else {
                warn!("Ignoring negative booking.lead_time_hours {}", hours);
            }
        }
        if let Some(zone) = cfg.time_zone.as_deref() {
            match Tz::from_str(zone) {
                Ok(tz) => rules.time_zone = tz,
                Err(_) => warn!("Unknown booking.time_zone '{}', using Australia/Sydney", zone),
            }
        }
        rules
    }

    /// Earliest instant a slot may start at when asked at `now`.
    pub fn earliest_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lead_time
    }

    /// The clinic's calendar date at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.time_zone).date_naive()
    }

    pub fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        local_instant(self.time_zone, date, time)
    }

    /// True when the day's opening time is already inside the lead time.
    pub fn day_within_lead_time(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        match self.local_instant(date, self.open) {
            Some(open) => open < self.earliest_start(now),
            None => true,
        }
    }

    pub fn within_business_hours(&self, start: NaiveTime) -> bool {
        start >= self.open && start < self.close
    }
}

/// Resolves a wall-clock time in `tz`, taking the earlier reading on DST overlaps.
pub fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Why a slot is not bookable, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotOpen,
    InvalidCapacity,
    InvalidBookings,
    Full,
    UnparseableStart,
    InvalidDate,
    OutsideBusinessHours,
    InsideLeadTime,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::NotOpen => "is_available is false",
            Rejection::InvalidCapacity => "max_capacity is missing or not positive",
            Rejection::InvalidBookings => "current_bookings is missing or negative",
            Rejection::Full => "no remaining capacity",
            Rejection::UnparseableStart => "start time does not parse",
            Rejection::InvalidDate => "date does not parse",
            Rejection::OutsideBusinessHours => "start is outside business hours",
            Rejection::InsideLeadTime => "start is inside the lead time",
        };
        f.write_str(reason)
    }
}

/// Flag and capacity checks only.
pub fn check_capacity(slot: &Slot) -> Result<(), Rejection> {
    if !slot.is_available {
        return Err(Rejection::NotOpen);
    }
    let max = match slot.max_capacity {
        Some(max) if max > 0 => max,
        _ => return Err(Rejection::InvalidCapacity),
    };
    let current = slot.current_bookings.ok_or(Rejection::InvalidBookings)?;
    if current >= max {
        return Err(Rejection::Full);
    }
    Ok(())
}

/// Full bookability check against `now`.
pub fn check_slot(
    slot: &Slot,
    now: DateTime<Utc>,
    rules: &AvailabilityRules,
) -> Result<(), Rejection> {
    check_capacity(slot)?;

    let start = slot.start_time().ok_or(Rejection::UnparseableStart)?;
    if !rules.within_business_hours(start) {
        return Err(Rejection::OutsideBusinessHours);
    }

    let date = slot.date().ok_or(Rejection::InvalidDate)?;
    let instant = rules
        .local_instant(date, start)
        .ok_or(Rejection::InvalidDate)?;
    if instant < rules.earliest_start(now) {
        return Err(Rejection::InsideLeadTime);
    }
    Ok(())
}

pub fn is_bookable(slot: &Slot, now: DateTime<Utc>, rules: &AvailabilityRules) -> bool {
    match check_slot(slot, now, rules) {
        Ok(()) => true,
        Err(reason) => {
            debug!(
                "Slot {} {} (row {}) rejected: {}",
                slot.date, slot.time_slot, slot.row_number, reason
            );
            false
        }
    }
}
