#[cfg(test)]
mod tests {
    use crate::availability::AvailabilityRules;
    use crate::booking::*;
    use crate::error::BookingError;
    use crate::events::{DomainEvent, EventPublisher};
    use crate::memory::MemorySheetStore;
    use crate::models::BookingRequest;
    use crate::normalize::Slot;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Australia::Sydney;
    use klinik_common::services::{Row, SheetStore};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Sydney
            .with_ymd_and_hms(2025, 11, 1, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn slot_rows(rows: &[[&str; 5]]) -> Vec<Row> {
        let mut out = vec![vec![
            json!("date"),
            json!("time_slot"),
            json!("is_available"),
            json!("max_capacity"),
            json!("current_bookings"),
        ]];
        out.extend(
            rows.iter()
                .map(|r| r.iter().map(|c| json!(c)).collect::<Row>()),
        );
        out
    }

    fn request(date: &str, time: &str) -> BookingRequest {
        BookingRequest {
            customer_name: Some("Jane Doe".to_string()),
            customer_email: Some("jane@example.com".to_string()),
            customer_phone: Some("0412345678".to_string()),
            appointment_date: Some(date.to_string()),
            appointment_time: Some(time.to_string()),
            concern: Some("Acne".to_string()),
            message: None,
        }
    }

    fn coordinator(store: &Arc<MemorySheetStore>) -> BookingCoordinator {
        BookingCoordinator::new(
            store.clone() as Arc<dyn SheetStore>,
            AvailabilityRules::default(),
            EventPublisher::disabled(),
        )
    }

    fn cell(store: &MemorySheetStore, sheet: &str, row: usize, col: usize) -> Value {
        store.rows(sheet)[row - 1].get(col).cloned().unwrap_or(Value::Null)
    }

    #[tokio::test]
    async fn test_booking_last_seat_closes_slot() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00-10:30", "TRUE", "1", "0"]]),
        ));
        let (events, mut rx) = EventPublisher::channel();
        let coordinator = BookingCoordinator::new(
            store.clone() as Arc<dyn SheetStore>,
            AvailabilityRules::default(),
            events,
        );

        let confirmation = coordinator
            .book(&request("2025-11-10", "10:00-10:30"), now())
            .await
            .unwrap();

        assert!(confirmation.appointment_id.starts_with("APT_"));
        assert_eq!(confirmation.message, "Appointment booked successfully");
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(1));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("FALSE"));

        let bookings = store.rows("bookings");
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[1][0], json!(confirmation.appointment_id));
        assert_eq!(bookings[1][6], json!(STATUS_PENDING));
        assert_eq!(bookings[1].len(), 11);

        match rx.try_recv().unwrap() {
            DomainEvent::BookingCreated(notice) => {
                assert_eq!(notice.appointment_id, confirmation.appointment_id);
                assert_eq!(notice.appointment_time, "10:00-10:30");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_booking_with_seats_left_keeps_slot_open() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00", "TRUE", "3", "1"]]),
        ));
        coordinator(&store)
            .book(&request("2025-11-10", "10:00"), now())
            .await
            .unwrap();

        assert_eq!(cell(&store, "time_slots", 2, 4), json!(2));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("TRUE"));
    }

    #[tokio::test]
    async fn test_full_slot_is_rejected_without_writes() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00-10:30", "TRUE", "2", "2"]]),
        ));
        let err = coordinator(&store)
            .book(&request("2025-11-10", "10:00-10:30"), now())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::SlotUnavailable));
        assert_eq!(err.code(), "SLOT_UNAVAILABLE");
        assert!(store.rows("bookings").is_empty());
        assert_eq!(cell(&store, "time_slots", 2, 4), json!("2"));
    }

    #[tokio::test]
    async fn test_missing_capacity_is_unavailable() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00", "TRUE", "", "0"]]),
        ));
        let err = coordinator(&store)
            .book(&request("2025-11-10", "10:00"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotUnavailable));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let store = Arc::new(MemorySheetStore::new());
        let coordinator = coordinator(&store);

        let mut missing = request("2025-11-10", "10:00");
        missing.customer_phone = Some("   ".to_string());
        let err = coordinator.book(&missing, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::MissingField("customer_phone")));

        let mut bad_email = request("2025-11-10", "10:00");
        bad_email.customer_email = Some("jane.example.com".to_string());
        let err = coordinator.book(&bad_email, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidEmail));

        let err = coordinator
            .book(&request("10th of November", "10:00"), now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }

    #[tokio::test]
    async fn test_booking_inside_lead_time_is_rejected() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-01", "14:00", "TRUE", "1", "0"]]),
        ));
        let err = coordinator(&store)
            .book(&request("2025-11-01", "14:00"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::BookingTooSoon));
        assert_eq!(cell(&store, "time_slots", 2, 4), json!("0"));
    }

    #[tokio::test]
    async fn test_unknown_slot() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00", "TRUE", "1", "0"]]),
        ));
        let err = coordinator(&store)
            .book(&request("2025-11-10", "11:00"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotNotFound));
    }

    #[tokio::test]
    async fn test_slot_found_by_start_time_when_labels_differ() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["10/11/2025", "10:00 – 10:30", "TRUE", "1", "0"]]),
        ));
        coordinator(&store)
            .book(&request("2025-11-10", "10:00-10:30"), now())
            .await
            .unwrap();
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(1));
    }

    #[tokio::test]
    async fn test_cancel_reopens_full_slot() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00-10:30", "TRUE", "1", "0"]]),
        ));
        let coordinator = coordinator(&store);
        let booked = coordinator
            .book(&request("2025-11-10", "10:00-10:30"), now())
            .await
            .unwrap();
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("FALSE"));

        let result = coordinator
            .cancel(Some(&booked.appointment_id), now())
            .await
            .unwrap();
        assert!(result.slot_released);
        assert_eq!(result.message, "Appointment cancelled successfully");
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(0));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("TRUE"));
        assert_eq!(cell(&store, "bookings", 2, 6), json!(STATUS_CANCELLED));
        assert_eq!(cell(&store, "bookings", 2, 10), json!(timestamp(now())));
    }

    #[tokio::test]
    async fn test_cancel_releases_the_row_that_was_booked() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[
                ["2025-11-10", "10:00", "TRUE", "1", "0"],
                ["2025-11-10", "10:00-10:30", "TRUE", "1", "0"],
            ]),
        ));
        let coordinator = coordinator(&store);
        let booked = coordinator
            .book(&request("2025-11-10", "10:00-10:30"), now())
            .await
            .unwrap();
        assert_eq!(cell(&store, "time_slots", 3, 4), json!(1));
        assert_eq!(cell(&store, "time_slots", 3, 2), json!("FALSE"));

        let result = coordinator
            .cancel(Some(&booked.appointment_id), now())
            .await
            .unwrap();
        assert!(result.slot_released);
        assert_eq!(cell(&store, "time_slots", 3, 4), json!(0));
        assert_eq!(cell(&store, "time_slots", 3, 2), json!("TRUE"));
        // the neighbouring row is untouched
        assert_eq!(cell(&store, "time_slots", 2, 4), json!("0"));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("TRUE"));
    }

    #[tokio::test]
    async fn test_cancel_releases_slot_with_free_text_label() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "Morning", "TRUE", "1", "0"]]),
        ));
        let coordinator = coordinator(&store);
        let booked = coordinator
            .book(&request("2025-11-10", "Morning"), now())
            .await
            .unwrap();
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(1));

        let result = coordinator
            .cancel(Some(&booked.appointment_id), now())
            .await
            .unwrap();
        assert!(result.slot_released);
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(0));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("TRUE"));
    }

    #[tokio::test]
    async fn test_cancel_keeps_operator_closed_slot_closed() {
        let store = Arc::new(
            MemorySheetStore::new()
                .with_sheet(
                    "time_slots",
                    slot_rows(&[["2025-11-10", "10:00", "FALSE", "3", "2"]]),
                )
                .with_sheet(
                    "bookings",
                    vec![
                        vec![json!("appointment_id")],
                        vec![
                            json!("APT_AAAA0001"),
                            json!("Jane"),
                            json!("jane@example.com"),
                            json!("0412345678"),
                            json!("2025-11-10"),
                            json!("10:00"),
                            json!("pending"),
                        ],
                    ],
                ),
        );
        let result = coordinator(&store)
            .cancel(Some("APT_AAAA0001"), now())
            .await
            .unwrap();
        assert!(result.slot_released);
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(1));
        assert_eq!(cell(&store, "time_slots", 2, 2), json!("FALSE"));
    }

    #[tokio::test]
    async fn test_cancel_twice_is_rejected() {
        let store = Arc::new(MemorySheetStore::new().with_sheet(
            "time_slots",
            slot_rows(&[["2025-11-10", "10:00", "TRUE", "2", "0"]]),
        ));
        let coordinator = coordinator(&store);
        let booked = coordinator
            .book(&request("2025-11-10", "10:00"), now())
            .await
            .unwrap();
        coordinator
            .cancel(Some(&booked.appointment_id), now())
            .await
            .unwrap();

        let err = coordinator
            .cancel(Some(&booked.appointment_id), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::AlreadyCancelled));
        assert_eq!(cell(&store, "time_slots", 2, 4), json!(0));
    }

    #[tokio::test]
    async fn test_cancel_unknown_or_missing_id() {
        let store = Arc::new(MemorySheetStore::new());
        let coordinator = coordinator(&store);

        let err = coordinator.cancel(Some("APT_NOPE0000"), now()).await.unwrap_err();
        assert!(matches!(err, BookingError::AppointmentNotFound));

        let err = coordinator.cancel(None, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::MissingField("appointment_id")));
    }

    #[tokio::test]
    async fn test_cancel_without_slot_row_still_cancels() {
        let store = Arc::new(
            MemorySheetStore::new()
                .with_sheet("time_slots", slot_rows(&[]))
                .with_sheet(
                    "bookings",
                    vec![
                        vec![json!("appointment_id")],
                        vec![
                            json!("APT_AAAA0002"),
                            json!("Jane"),
                            json!("jane@example.com"),
                            json!("0412345678"),
                            json!("2025-11-10"),
                            json!("10:00"),
                            json!("pending"),
                        ],
                    ],
                ),
        );
        let result = coordinator(&store)
            .cancel(Some("APT_AAAA0002"), now())
            .await
            .unwrap();
        assert!(!result.slot_released);
        assert_eq!(cell(&store, "bookings", 2, 6), json!(STATUS_CANCELLED));
    }

    #[test]
    fn test_reference_format() {
        let id = new_reference("APT_");
        assert_eq!(id.len(), 12);
        assert!(id.starts_with("APT_"));
        assert!(id[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(new_reference("APT_"), new_reference("APT_"));
    }

    #[test]
    fn test_locate_slot_prefers_exact_label() {
        let slot = |row: u32, label: &str| Slot {
            row_number: row,
            date: "2025-11-10".to_string(),
            time_slot: label.to_string(),
            is_available: true,
            max_capacity: Some(1),
            current_bookings: Some(0),
        };
        let slots = vec![slot(2, "10:00"), slot(3, "10:00-10:30")];
        let date = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();

        assert_eq!(locate_slot(&slots, date, "10:00-10:30").unwrap().row_number, 3);
        assert_eq!(locate_slot(&slots, date, "10:00").unwrap().row_number, 2);
        assert_eq!(locate_slot(&slots, date, "10:00 - 11:00").unwrap().row_number, 2);
        assert!(locate_slot(&slots, date, "11:00").is_none());
    }
}
