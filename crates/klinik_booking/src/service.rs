// --- File: crates/klinik_booking/src/service.rs ---
//! Google Sheets implementation of [`SheetStore`].

use crate::auth::HubType;
use async_trait::async_trait;
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, DeleteDimensionRequest, DimensionRange,
    Request, Scope, SheetProperties, ValueRange,
};
use klinik_common::services::{Row, SheetStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Row deletions sent per `batchUpdate` call.
const DELETE_BATCH: usize = 100;

fn api_error(operation: &'static str, err: google_sheets4::Error) -> StoreError {
    match err {
        google_sheets4::Error::MissingToken(e) => StoreError::Auth(e.to_string()),
        other => StoreError::api(operation, other),
    }
}

/// Groups 1-based row numbers into half-open, 0-based `[start, end)` runs,
/// highest first, so earlier deletions never shift later ones.
pub fn descending_runs(row_numbers: &[u32]) -> Vec<(i32, i32)> {
    let mut rows: Vec<u32> = row_numbers.iter().copied().filter(|r| *r >= 1).collect();
    rows.sort_unstable_by(|a, b| b.cmp(a));
    rows.dedup();

    let mut runs: Vec<(i32, i32)> = Vec::new();
    for row in rows {
        let index = row as i32 - 1;
        match runs.last_mut() {
            Some((start, _)) if *start == index + 1 => *start = index,
            _ => runs.push((index, index + 1)),
        }
    }
    runs
}

pub struct GoogleSheetsStore {
    hub: Arc<HubType>,
    spreadsheet_id: String,
    sheet_ids: Mutex<HashMap<String, i32>>,
}

impl GoogleSheetsStore {
    pub fn new(hub: Arc<HubType>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            hub,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_ids: Mutex::new(HashMap::new()),
        }
    }

    fn ids(&self) -> MutexGuard<'_, HashMap<String, i32>> {
        self.sheet_ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reloads worksheet titles and ids from the spreadsheet metadata.
    async fn refresh_sheet_ids(&self) -> Result<(), StoreError> {
        let (_response, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .map_err(|e| api_error("get_spreadsheet", e))?;

        let fresh: HashMap<String, i32> = spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| {
                let properties = sheet.properties?;
                Some((properties.title?, properties.sheet_id?))
            })
            .collect();
        debug!("Spreadsheet has {} worksheets", fresh.len());
        *self.ids() = fresh;
        Ok(())
    }

    async fn sheet_id(&self, sheet: &str) -> Result<i32, StoreError> {
        if let Some(id) = self.ids().get(sheet).copied() {
            return Ok(id);
        }
        self.refresh_sheet_ids().await?;
        self.ids()
            .get(sheet)
            .copied()
            .ok_or_else(|| StoreError::MissingSheet(sheet.to_string()))
    }

    fn value_range(rows: Vec<Row>) -> ValueRange {
        ValueRange {
            values: Some(rows),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, StoreError> {
        let (_response, value_range) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, range)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .map_err(|e| api_error("values_get", e))?;
        Ok(value_range.values.unwrap_or_default())
    }

    async fn append_rows(&self, range: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let count = rows.len();
        self.hub
            .spreadsheets()
            .values_append(Self::value_range(rows), &self.spreadsheet_id, range)
            .value_input_option("RAW")
            .insert_data_option("INSERT_ROWS")
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .map_err(|e| api_error("values_append", e))?;
        debug!("Appended {} rows to {}", count, range);
        Ok(())
    }

    async fn update_range(&self, range: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        self.hub
            .spreadsheets()
            .values_update(Self::value_range(rows), &self.spreadsheet_id, range)
            .value_input_option("RAW")
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .map_err(|e| api_error("values_update", e))?;
        Ok(())
    }

    async fn delete_rows(&self, sheet: &str, row_numbers: &[u32]) -> Result<(), StoreError> {
        let sheet_id = self.sheet_id(sheet).await?;
        let requests: Vec<Request> = descending_runs(row_numbers)
            .into_iter()
            .map(|(start, end)| Request {
                delete_dimension: Some(DeleteDimensionRequest {
                    range: Some(DimensionRange {
                        sheet_id: Some(sheet_id),
                        dimension: Some("ROWS".to_string()),
                        start_index: Some(start),
                        end_index: Some(end),
                    }),
                }),
                ..Default::default()
            })
            .collect();

        for batch in requests.chunks(DELETE_BATCH) {
            let request = BatchUpdateSpreadsheetRequest {
                requests: Some(batch.to_vec()),
                ..Default::default()
            };
            self.hub
                .spreadsheets()
                .batch_update(request, &self.spreadsheet_id)
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
                .map_err(|e| api_error("delete_rows", e))?;
        }
        info!("Deleted {} rows from {}", row_numbers.len(), sheet);
        Ok(())
    }

    async fn sheet_exists(&self, sheet: &str) -> Result<bool, StoreError> {
        if self.ids().contains_key(sheet) {
            return Ok(true);
        }
        self.refresh_sheet_ids().await?;
        Ok(self.ids().contains_key(sheet))
    }

    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<(), StoreError> {
        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![Request {
                add_sheet: Some(AddSheetRequest {
                    properties: Some(SheetProperties {
                        title: Some(sheet.to_string()),
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let (_response, reply) = self
            .hub
            .spreadsheets()
            .batch_update(request, &self.spreadsheet_id)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await
            .map_err(|e| api_error("add_sheet", e))?;

        let new_id = reply
            .replies
            .unwrap_or_default()
            .into_iter()
            .find_map(|r| r.add_sheet?.properties?.sheet_id);
        if let Some(id) = new_id {
            self.ids().insert(sheet.to_string(), id);
        }

        let header: Row = headers.iter().map(|h| Value::from(*h)).collect();
        self.update_range(&format!("{}!A1", sheet), vec![header])
            .await?;
        info!("Created worksheet '{}' with {} columns", sheet, headers.len());
        Ok(())
    }
}
