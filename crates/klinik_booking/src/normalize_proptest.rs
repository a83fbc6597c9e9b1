#[cfg(test)]
mod tests {
    use crate::normalize::{clean_time_label, normalize_date};
    use proptest::prelude::*;

    proptest! {
        // Normalizing twice never changes the result
        #[test]
        fn test_normalize_date_idempotent(raw in "[0-9./ -]{0,14}") {
            let once = normalize_date(&raw);
            prop_assert_eq!(normalize_date(&once), once);
        }

        #[test]
        fn test_normalize_date_idempotent_any_text(raw in ".{0,20}") {
            let once = normalize_date(&raw);
            prop_assert_eq!(normalize_date(&once), once);
        }

        // Every accepted spelling of a valid date lands on the same canonical form
        #[test]
        fn test_formats_agree(year in 1990i32..2100, month in 1u32..=12, day in 1u32..=28) {
            let canonical = format!("{:04}-{:02}-{:02}", year, month, day);
            prop_assert_eq!(normalize_date(&format!("{}-{}-{}", year, month, day)), canonical.clone());
            prop_assert_eq!(normalize_date(&format!("{}/{}/{}", day, month, year)), canonical.clone());
            prop_assert_eq!(normalize_date(&format!("{}.{:02}.{:02}", year, month, day)), canonical.clone());
            prop_assert_eq!(normalize_date(&format!("{:02}.{:02}.{}", day, month, year)), canonical);
        }

        #[test]
        fn test_clean_time_label_idempotent(raw in "[0-9: \u{00A0}\u{2013}\u{2014}-]{0,16}") {
            let once = clean_time_label(&raw);
            prop_assert_eq!(clean_time_label(&once), once);
        }
    }
}
