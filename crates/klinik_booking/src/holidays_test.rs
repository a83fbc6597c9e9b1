#[cfg(test)]
mod tests {
    use crate::holidays::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_easter_dates() {
        assert_eq!(easter_sunday(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(d(2026, 4, 5)));
    }

    #[test]
    fn test_2025_holidays() {
        let days = holidays_for_year(2025);
        for expected in [
            d(2025, 1, 1),
            d(2025, 1, 26),
            d(2025, 1, 27), // Australia Day on a Sunday
            d(2025, 4, 18),
            d(2025, 4, 21),
            d(2025, 4, 25),
            d(2025, 12, 25),
            d(2025, 12, 26),
        ] {
            assert!(days.contains(&expected), "missing {}", expected);
        }
        assert_eq!(days.len(), 8);
    }

    #[test]
    fn test_christmas_weekend_substitutes() {
        // 2021: Christmas on Saturday
        let days = holidays_for_year(2021);
        assert!(days.contains(&d(2021, 12, 27)));
        assert!(days.contains(&d(2021, 12, 28)));

        // 2022: Christmas on Sunday
        let days = holidays_for_year(2022);
        assert!(days.contains(&d(2022, 12, 26)));
        assert!(days.contains(&d(2022, 12, 27)));
        assert!(!days.contains(&d(2022, 12, 28)));
        // 2022: New Year's Day on Saturday
        assert!(days.contains(&d(2022, 1, 3)));

        // 2026: Christmas on Friday, Boxing Day on Saturday
        let days = holidays_for_year(2026);
        assert!(days.contains(&d(2026, 12, 28)));
    }

    #[test]
    fn test_easter_weekend_is_not_a_national_holiday() {
        let days = holidays_for_year(2026);
        assert!(days.contains(&d(2026, 4, 3)));
        assert!(!days.contains(&d(2026, 4, 4)));
        assert!(!days.contains(&d(2026, 4, 5)));
        assert!(days.contains(&d(2026, 4, 6)));
        assert!(is_service_day(d(2026, 4, 4)));
        assert!(!is_service_day(d(2026, 4, 3)));
    }

    #[test]
    fn test_service_day_rule() {
        assert!(is_service_day(d(2025, 11, 10))); // Monday
        assert!(is_service_day(d(2025, 11, 15))); // Saturday
        assert!(!is_service_day(d(2025, 11, 16))); // Sunday
        assert!(!is_service_day(d(2025, 12, 25))); // Christmas, Thursday
        assert!(!is_service_day(d(2025, 4, 18))); // Good Friday
    }

    #[test]
    fn test_service_days_matches_single_day_rule() {
        let from = d(2025, 12, 20);
        let to = d(2026, 1, 31);
        let listed = service_days(from, to);
        let expected: Vec<_> = from
            .iter_days()
            .take_while(|day| *day <= to)
            .filter(|day| is_service_day(*day))
            .collect();
        assert_eq!(listed, expected);
        assert!(!listed.contains(&d(2026, 1, 1)));
        assert!(!listed.contains(&d(2026, 1, 26)));
    }

    #[test]
    fn test_service_days_empty_range() {
        assert!(service_days(d(2025, 11, 10), d(2025, 11, 9)).is_empty());
    }
}
