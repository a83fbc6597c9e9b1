//! Runtime feature flags.
//!
//! Compile-time features (`openapi`) are handled with `#[cfg]`; the helpers here
//! check the `use_*` switches together with their configuration sections.

use klinik_config::AppConfig;

/// A feature is on when its flag is set and its section is present.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

pub fn is_sheets_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_sheets, config.sheets.as_ref())
}

pub fn is_gmail_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_gmail, config.gmail.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use klinik_config::SheetsConfig;

    #[test]
    fn flag_without_section_is_disabled() {
        let mut config = AppConfig::local(8080);
        config.use_sheets = true;
        assert!(!is_sheets_enabled(&config));

        config.sheets = Some(SheetsConfig::default());
        assert!(is_sheets_enabled(&config));
        assert!(!is_gmail_enabled(&config));
    }
}
