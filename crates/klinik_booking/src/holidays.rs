// --- File: crates/klinik_booking/src/holidays.rs ---
//! Australia-wide public holidays and the clinic's service-day rule.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashMap};

/// Easter Sunday for `year` (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn weekend_to_monday(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date + Duration::days(2)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

/// National public holidays observed in `year`, substitute days included.
pub fn holidays_for_year(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d);

    for fixed in [ymd(1, 1), ymd(1, 26)].into_iter().flatten() {
        days.insert(fixed);
        days.extend(weekend_to_monday(fixed));
    }

    // Easter Saturday and Sunday are state holidays only, so the Saturday stays open
    if let Some(easter) = easter_sunday(year) {
        for offset in [-2, 1] {
            days.insert(easter + Duration::days(offset));
        }
    }

    days.extend(ymd(4, 25));

    if let (Some(christmas), Some(boxing)) = (ymd(12, 25), ymd(12, 26)) {
        days.insert(christmas);
        days.insert(boxing);
        match christmas.weekday() {
            // Christmas on Saturday: Monday 27th and Tuesday 28th
            Weekday::Sat => {
                days.insert(christmas + Duration::days(2));
                days.insert(christmas + Duration::days(3));
            }
            // Christmas on Sunday: Boxing Day is Monday, Christmas moves to Tuesday
            Weekday::Sun => {
                days.insert(christmas + Duration::days(2));
            }
            _ => {}
        }
        if boxing.weekday() == Weekday::Sat {
            days.insert(boxing + Duration::days(2));
        }
    }

    days
}

pub fn is_public_holiday(date: NaiveDate) -> bool {
    holidays_for_year(date.year()).contains(&date)
}

/// Monday to Saturday and not a public holiday.
pub fn is_service_day(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun && !is_public_holiday(date)
}

/// Service days in `from..=to`, computing each year's holidays once.
pub fn service_days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut by_year: HashMap<i32, BTreeSet<NaiveDate>> = HashMap::new();
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| d.weekday() != Weekday::Sun)
        .filter(|d| {
            !by_year
                .entry(d.year())
                .or_insert_with(|| holidays_for_year(d.year()))
                .contains(d)
        })
        .collect()
}
