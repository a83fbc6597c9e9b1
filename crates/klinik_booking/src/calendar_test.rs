#[cfg(test)]
mod tests {
    use crate::availability::AvailabilityRules;
    use crate::calendar::*;
    use crate::error::BookingError;
    use crate::memory::MemorySheetStore;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Australia::Sydney;
    use klinik_common::services::Row;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Saturday 2025-11-08, midnight in Sydney.
    fn now() -> DateTime<Utc> {
        Sydney
            .with_ymd_and_hms(2025, 11, 8, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store() -> MemorySheetStore {
        let rows: Vec<Row> = [
            ["date", "time_slot", "is_available", "max_capacity", "current_bookings"],
            ["2025-11-10", "10:00 \u{2013} 10:30", "TRUE", "1", "0"],
            ["2025-11-10", "10:00-10:30", "TRUE", "2", "1"],
            ["2025-11-10", "10:30-11:00", "TRUE", "1", "1"],
            ["2025-11-10", "11:00-11:30", "FALSE", "1", "0"],
            ["10/11/2025", "12:00-12:30", "yes", "1", "0"],
            ["2025-11-10", "18:00-18:30", "TRUE", "1", "0"],
            ["2025-11-12", "09:00", "TRUE", "1", "0"],
            ["2025-11-08", "15:00", "TRUE", "1", "0"],
        ]
        .iter()
        .map(|r| r.iter().map(|c| json!(c)).collect())
        .collect();
        MemorySheetStore::new().with_sheet("time_slots", rows)
    }

    #[tokio::test]
    async fn test_available_dates_counts_distinct_bookable_starts() {
        let rules = AvailabilityRules::default();
        let range = DateRange {
            from: date(2025, 11, 8),
            to: date(2025, 11, 15),
        };
        let response = get_available_dates(&store(), range, now(), &rules)
            .await
            .unwrap();

        // Saturday 8th is inside the lead time and Sunday 9th is not a service day
        let listed: Vec<&str> = response.dates.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(
            listed,
            ["2025-11-10", "2025-11-11", "2025-11-12", "2025-11-13", "2025-11-14", "2025-11-15"]
        );
        assert_eq!(response.total, 6);

        assert_eq!(
            response.dates[0],
            AvailableDate {
                date: "2025-11-10".to_string(),
                has_slots: true,
                slot_count: 2,
            }
        );
        assert!(!response.dates[2].has_slots);
        assert_eq!(response.dates[2].slot_count, 0);
    }

    #[tokio::test]
    async fn test_month_lists_every_service_day() {
        let rules = AvailabilityRules::default();
        let response = month_availability(&store(), 2025, 11, now(), &rules)
            .await
            .unwrap();

        assert_eq!(response.year, 2025);
        assert_eq!(response.month, 11);
        // 30 days minus five Sundays
        assert_eq!(response.days.len(), 25);

        let tenth = response.days.iter().find(|d| d.date == "2025-11-10").unwrap();
        assert!(tenth.has_slots);
        assert_eq!(tenth.count, 2);

        // Saturday 8th has an open row, but it is inside the lead time
        let eighth = response.days.iter().find(|d| d.date == "2025-11-08").unwrap();
        assert_eq!(eighth.count, 0);
        assert!(response.days.iter().all(|d| d.date != "2025-11-09"));
    }

    #[tokio::test]
    async fn test_month_rejects_invalid_month() {
        let rules = AvailabilityRules::default();
        let err = month_availability(&store(), 2025, 13, now(), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_day_availability_sorted_and_deduplicated() {
        let rules = AvailabilityRules::default();
        let response = day_availability(&store(), "2025-11-10", now(), &rules)
            .await
            .unwrap();

        assert_eq!(
            response.slots,
            vec![
                DaySlot {
                    start: "10:00".to_string(),
                    end: "10:30".to_string(),
                    value: "10:00".to_string(),
                },
                DaySlot {
                    start: "12:00".to_string(),
                    end: "12:30".to_string(),
                    value: "12:00".to_string(),
                },
            ]
        );
        assert_eq!(response.available_slots, ["10:00-10:30", "12:00-12:30"]);
    }

    #[tokio::test]
    async fn test_day_availability_accepts_other_date_formats() {
        let rules = AvailabilityRules::default();
        let response = day_availability(&store(), "10.11.2025", now(), &rules)
            .await
            .unwrap();
        assert_eq!(response.slots.len(), 2);
    }

    #[tokio::test]
    async fn test_day_inside_lead_time_is_rejected_before_reading() {
        let rules = AvailabilityRules::default();
        // No time_slots sheet: a read would fail with a store error
        let empty = MemorySheetStore::new();
        let err = day_availability(&empty, "2025-11-08", now(), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::DayTooSoon));
        assert_eq!(err.code(), "LEAD_TIME");

        let err = day_availability(&empty, "not a date", now(), &rules)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_check_availability_ignores_hours_and_lead_time() {
        let response = check_availability(&store(), "10/11/2025").await.unwrap();

        assert_eq!(response.date, "10/11/2025");
        assert_eq!(
            response.available_slots,
            ["10:00 \u{2013} 10:30", "10:00-10:30", "12:00-12:30", "18:00-18:30"]
        );
        assert_eq!(response.total_slots, 4);
    }

    #[tokio::test]
    async fn test_missing_sheet_is_a_store_error() {
        let rules = AvailabilityRules::default();
        let range = DateRange::next_weeks(date(2025, 11, 8), 1).unwrap();
        let err = get_available_dates(&MemorySheetStore::new(), range, now(), &rules)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STORE_ERROR");
    }

    #[test]
    fn test_date_ranges() {
        let today = date(2025, 11, 8);
        let weeks = DateRange::next_weeks(today, 2).unwrap();
        assert_eq!(weeks.from, date(2025, 11, 9));
        assert_eq!(weeks.to, date(2025, 11, 22));
        assert!(DateRange::next_weeks(today, MAX_WEEKS).is_some());
        assert!(DateRange::next_weeks(today, MAX_WEEKS + 1).is_none());
        assert!(DateRange::next_weeks(NaiveDate::MAX, 1).is_none());

        let years = DateRange::for_years(today, &[2026, 2025]).unwrap();
        assert_eq!(years.from, date(2025, 11, 9));
        assert_eq!(years.to, date(2026, 12, 31));
        assert!(DateRange::for_years(today, &[]).is_none());
        assert!(DateRange::for_years(today, &[2024]).unwrap().is_empty());
        assert!(DateRange::for_years(today, &[999999]).is_none());
        assert!(DateRange::for_years(today, &[2025, 2025 + MAX_YEAR_SPAN]).is_none());
        assert!(DateRange::for_years(today, &[i32::MIN, i32::MAX]).is_none());

        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.to, date(2024, 2, 29));
        let dec = DateRange::month(2025, 12).unwrap();
        assert_eq!(dec.to, date(2025, 12, 31));
        assert!(DateRange::month(2025, 0).is_none());
    }

    #[test]
    fn test_slots_from_rows_keeps_sheet_row_numbers() {
        let rows = vec![
            vec![json!("date")],
            vec![json!("2025-11-10"), json!("10:00"), json!("TRUE"), json!(1), json!(0)],
            vec![json!("short row")],
            vec![json!("2025-11-11"), json!("10:00"), json!("TRUE"), json!(1), json!(0)],
        ];
        let slots = slots_from_rows(&rows);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].row_number, 2);
        assert_eq!(slots[1].row_number, 4);
    }

    #[test]
    fn test_current_month_uses_clinic_zone() {
        // 2025-11-30 14:00 UTC is already 1 December in Sydney
        let now = Utc.with_ymd_and_hms(2025, 11, 30, 14, 0, 0).unwrap();
        assert_eq!(current_month(now, &AvailabilityRules::default()), (2025, 12));
    }
}
