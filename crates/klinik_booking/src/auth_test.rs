#[cfg(test)]
mod tests {
    use crate::auth::create_sheets_hub;
    use klinik_config::SheetsConfig;

    #[tokio::test]
    async fn test_create_sheets_hub_missing_key_file() {
        let config = SheetsConfig {
            spreadsheet_id: "sheet".to_string(),
            key_path: Some("does/not/exist.json".to_string()),
            ..Default::default()
        };

        match create_sheets_hub(&config).await {
            Ok(_) => panic!("Expected an error but got Ok"),
            Err(err) => {
                let err_string = err.to_string();
                assert!(
                    err_string.contains("No such file")
                        || err_string.contains("not found")
                        || err_string.contains("cannot find"),
                    "Error message should indicate file not found, got: {}",
                    err_string
                );
            }
        }
    }

    #[tokio::test]
    async fn test_create_sheets_hub_without_credentials() {
        let config = SheetsConfig {
            spreadsheet_id: "sheet".to_string(),
            client_id: Some("client".to_string()),
            ..Default::default()
        };
        assert!(!config.has_credentials());

        match create_sheets_hub(&config).await {
            Ok(_) => panic!("Expected an error but got Ok"),
            Err(err) => assert_eq!(err.to_string(), "Missing sheets.client_secret"),
        }
    }
}
