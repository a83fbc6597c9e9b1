// --- File: crates/klinik_booking/src/table.rs ---

/// The four worksheets the backend reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    TimeSlots,
    Bookings,
    Appointments,
    Contact,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::TimeSlots,
        Table::Bookings,
        Table::Appointments,
        Table::Contact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::TimeSlots => "time_slots",
            Table::Bookings => "bookings",
            Table::Appointments => "appointments",
            Table::Contact => "contact",
        }
    }

    /// Header row written when the worksheet is created.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Table::TimeSlots => &[
                "date",
                "time_slot",
                "is_available",
                "max_capacity",
                "current_bookings",
            ],
            Table::Bookings => &[
                "appointment_id",
                "customer_name",
                "customer_email",
                "customer_phone",
                "appointment_date",
                "appointment_time",
                "status",
                "concern",
                "message",
                "created_at",
                "updated_at",
            ],
            Table::Appointments => &[
                "created_at",
                "first_name",
                "last_name",
                "date_of_birth",
                "customer_email",
                "customer_phone",
                "concerns",
                "enquiries",
                "is_first_time",
                "duration_minutes",
                "deposit_required",
            ],
            Table::Contact => &[
                "message_id",
                "full_name",
                "email",
                "phone",
                "subject",
                "message",
                "created_at",
            ],
        }
    }

    /// Whole-table range, e.g. `time_slots!A:E`.
    pub fn full_range(self) -> String {
        let last = match self {
            Table::TimeSlots => 'E',
            Table::Bookings | Table::Appointments => 'K',
            Table::Contact => 'G',
        };
        format!("{}!A:{}", self.name(), last)
    }

    /// A single cell, e.g. `time_slots!E12`.
    pub fn cell(self, column: char, row_number: u32) -> String {
        format!("{}!{}{}", self.name(), column, row_number)
    }
}

// Column letters used by the coordinator's targeted writes.
pub const SLOT_AVAILABLE_COLUMN: char = 'C';
pub const SLOT_BOOKINGS_COLUMN: char = 'E';
pub const BOOKING_STATUS_COLUMN: char = 'G';
pub const BOOKING_UPDATED_COLUMN: char = 'K';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_every_header() {
        assert_eq!(Table::TimeSlots.full_range(), "time_slots!A:E");
        assert_eq!(Table::Bookings.full_range(), "bookings!A:K");
        assert_eq!(Table::Appointments.full_range(), "appointments!A:K");
        assert_eq!(Table::Contact.full_range(), "contact!A:G");
        assert_eq!(Table::TimeSlots.headers().len(), 5);
        assert_eq!(Table::Bookings.headers().len(), 11);
        assert_eq!(Table::Appointments.headers().len(), 11);
        assert_eq!(Table::Contact.headers().len(), 7);
        assert_eq!(Table::TimeSlots.cell('E', 12), "time_slots!E12");
    }
}
