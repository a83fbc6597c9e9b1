// --- File: crates/klinik_booking/src/memory.rs ---
//! In-process [`SheetStore`] that understands the A1 ranges the backend uses.
//!
//! Used by the test suites and by the backend when Google Sheets is disabled.

use async_trait::async_trait;
use klinik_common::services::{Row, SheetStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A parsed A1 range such as `time_slots!A:E`, `bookings!G7` or `contact!A1:G1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    /// 0-based first column.
    pub start_col: usize,
    /// 0-based last column, inclusive.
    pub end_col: Option<usize>,
    /// 1-based first row.
    pub start_row: Option<u32>,
    /// 1-based last row, inclusive.
    pub end_row: Option<u32>,
}

fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as usize - 'A' as usize + 1))
    })
    .map(|n| n - 1)
}

fn parse_cell(cell: &str) -> Option<(usize, Option<u32>)> {
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    let col = column_index(&letters.to_ascii_uppercase())?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<u32>().ok().filter(|r| *r > 0)?)
    };
    Some((col, row))
}

impl A1Range {
    pub fn parse(range: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidRange(range.to_string());
        let Some((sheet, cells)) = range.split_once('!') else {
            return Ok(Self {
                sheet: range.to_string(),
                start_col: 0,
                end_col: None,
                start_row: None,
                end_row: None,
            });
        };
        if sheet.is_empty() {
            return Err(invalid());
        }
        let (first, last) = match cells.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (cells, None),
        };
        let (start_col, start_row) = parse_cell(first).ok_or_else(invalid)?;
        let (end_col, end_row) = match last {
            Some(cell) => {
                let (col, row) = parse_cell(cell).ok_or_else(invalid)?;
                (Some(col), row)
            }
            // A single cell addresses exactly that cell
            None => (Some(start_col), start_row),
        };
        Ok(Self {
            sheet: sheet.to_string(),
            start_col,
            end_col,
            start_row,
            end_row,
        })
    }
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[derive(Default)]
pub struct MemorySheetStore {
    sheets: Mutex<BTreeMap<String, Vec<Row>>>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests: seeds a worksheet with the given rows.
    pub fn with_sheet(self, name: &str, rows: Vec<Row>) -> Self {
        self.lock().insert(name.to_string(), rows);
        self
    }

    /// Snapshot of a worksheet, header row included.
    pub fn rows(&self, name: &str) -> Vec<Row> {
        self.lock().get(name).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<Row>>> {
        self.sheets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, StoreError> {
        let a1 = A1Range::parse(range)?;
        let sheets = self.lock();
        let rows = sheets
            .get(&a1.sheet)
            .ok_or_else(|| StoreError::MissingSheet(a1.sheet.clone()))?;

        let first = a1.start_row.unwrap_or(1).saturating_sub(1) as usize;
        let last = a1
            .end_row
            .map_or(rows.len(), |r| (r as usize).min(rows.len()));

        let mut out: Vec<Row> = rows
            .get(first..last.max(first))
            .unwrap_or_default()
            .iter()
            .map(|row| {
                let end = a1.end_col.map_or(row.len(), |c| (c + 1).min(row.len()));
                let mut cells: Row = row
                    .get(a1.start_col..end.max(a1.start_col))
                    .unwrap_or_default()
                    .to_vec();
                while cells.last().is_some_and(is_blank) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    async fn append_rows(&self, range: &str, new_rows: Vec<Row>) -> Result<(), StoreError> {
        let a1 = A1Range::parse(range)?;
        let mut sheets = self.lock();
        let rows = sheets
            .get_mut(&a1.sheet)
            .ok_or_else(|| StoreError::MissingSheet(a1.sheet.clone()))?;

        while rows.last().is_some_and(|r| r.iter().all(is_blank)) {
            rows.pop();
        }
        for new_row in new_rows {
            let mut row = vec![Value::Null; a1.start_col];
            row.extend(new_row);
            rows.push(row);
        }
        Ok(())
    }

    async fn update_range(&self, range: &str, values: Vec<Row>) -> Result<(), StoreError> {
        let a1 = A1Range::parse(range)?;
        let mut sheets = self.lock();
        let rows = sheets
            .get_mut(&a1.sheet)
            .ok_or_else(|| StoreError::MissingSheet(a1.sheet.clone()))?;

        let first = a1.start_row.unwrap_or(1) as usize - 1;
        for (offset, new_cells) in values.into_iter().enumerate() {
            let index = first + offset;
            if rows.len() <= index {
                rows.resize_with(index + 1, Vec::new);
            }
            let row = &mut rows[index];
            for (col_offset, cell) in new_cells.into_iter().enumerate() {
                let col = a1.start_col + col_offset;
                if row.len() <= col {
                    row.resize(col + 1, Value::Null);
                }
                row[col] = cell;
            }
        }
        Ok(())
    }

    async fn delete_rows(&self, sheet: &str, row_numbers: &[u32]) -> Result<(), StoreError> {
        let mut sheets = self.lock();
        let rows = sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::MissingSheet(sheet.to_string()))?;

        let mut ordered: Vec<u32> = row_numbers.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        for number in ordered {
            let index = number as usize;
            if index >= 1 && index <= rows.len() {
                rows.remove(index - 1);
            }
        }
        Ok(())
    }

    async fn sheet_exists(&self, sheet: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(sheet))
    }

    async fn create_sheet(&self, sheet: &str, headers: &[&str]) -> Result<(), StoreError> {
        let mut sheets = self.lock();
        if sheets.contains_key(sheet) {
            return Err(StoreError::api(
                "create_sheet",
                format!("A sheet with the name \"{}\" already exists", sheet),
            ));
        }
        let header: Row = headers.iter().map(|h| Value::from(*h)).collect();
        sheets.insert(sheet.to_string(), vec![header]);
        Ok(())
    }
}
