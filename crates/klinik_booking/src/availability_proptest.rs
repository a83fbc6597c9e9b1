#[cfg(test)]
mod tests {
    use crate::availability::{is_bookable, AvailabilityRules};
    use crate::normalize::Slot;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn slot(day: u32, hour: u32, minute: u32, max: u32, current: u32, open: bool) -> Slot {
        Slot {
            row_number: 2,
            date: format!("2025-11-{:02}", day),
            time_slot: format!("{:02}:{:02}-{:02}:{:02}", hour, minute, hour, minute + 29),
            is_available: open,
            max_capacity: Some(max),
            current_bookings: Some(current),
        }
    }

    proptest! {
        // A slot that is not bookable at `now` stays unbookable at any later `now`
        #[test]
        fn test_bookability_monotonic_in_now(
            day in 1u32..=28,
            hour in 8u32..20,
            half in 0u32..2,
            max in 0u32..4,
            current in 0u32..4,
            open in any::<bool>(),
            offset_minutes in 0i64..(60 * 24 * 40),
            step_minutes in 0i64..(60 * 24 * 10),
        ) {
            let rules = AvailabilityRules::default();
            let s = slot(day, hour, half * 30, max, current, open);
            let base = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();
            let earlier = base + Duration::minutes(offset_minutes);
            let later = earlier + Duration::minutes(step_minutes);

            if !is_bookable(&s, earlier, &rules) {
                prop_assert!(!is_bookable(&s, later, &rules));
            }
        }

        // Bookable slots always start inside business hours
        #[test]
        fn test_bookable_slots_inside_business_hours(
            day in 1u32..=28,
            hour in 0u32..24,
            half in 0u32..2,
        ) {
            let rules = AvailabilityRules::default();
            let s = slot(day, hour, half * 30, 1, 0, true);
            let now = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
            if is_bookable(&s, now, &rules) {
                prop_assert!((10..18).contains(&hour));
            }
        }
    }
}
