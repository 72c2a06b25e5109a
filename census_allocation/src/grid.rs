use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::config::*;

/// A workbook seen as named sheets of cells addressed by (row, column), both 1-based.
///
/// Writes are only guaranteed to persist after `save` returns.
pub trait CellGrid {
    fn sheet_exists(&self, sheet: &str) -> bool;

    /// The value of a cell. Missing sheets and missing cells read as `CellValue::Empty`.
    fn get(&self, sheet: &str, row: u32, column: Column) -> CellValue;

    fn set(
        &mut self,
        sheet: &str,
        row: u32,
        column: Column,
        value: CellValue,
    ) -> Result<(), DistributionErrors>;

    /// The highest row holding a cell, 0 for an empty or missing sheet.
    fn highest_used_row(&self, sheet: &str) -> u32;

    fn save(&mut self) -> Result<(), DistributionErrors>;
}

/// A grid held entirely in memory.
///
/// Used for surveys read from CSV or xlsx exports, and as the store in tests.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct MemoryGrid {
    sheets: HashMap<String, BTreeMap<(u32, u32), CellValue>>,
    saves: usize,
}

impl MemoryGrid {
    pub fn new() -> MemoryGrid {
        MemoryGrid::default()
    }

    pub fn add_sheet(&mut self, name: &str) {
        self.sheets.entry(name.to_string()).or_default();
    }

    /// Builds a sheet from rows of values, starting at row 1 column A.
    pub fn with_rows(mut self, sheet: &str, rows: &[Vec<CellValue>]) -> MemoryGrid {
        self.add_sheet(sheet);
        for (ridx, row) in rows.iter().enumerate() {
            for (cidx, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    self.put(sheet, (ridx + 1) as u32, Column((cidx + 1) as u32), value.clone());
                }
            }
        }
        self
    }

    /// Writes a cell without any checks, creating the sheet if needed.
    pub fn put(&mut self, sheet: &str, row: u32, column: Column, value: CellValue) {
        let cells = self.sheets.entry(sheet.to_string()).or_default();
        if value == CellValue::Empty {
            cells.remove(&(row, column.0));
        } else {
            cells.insert((row, column.0), value);
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sheets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of times `save` was called.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl CellGrid for MemoryGrid {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }

    fn get(&self, sheet: &str, row: u32, column: Column) -> CellValue {
        self.sheets
            .get(sheet)
            .and_then(|cells| cells.get(&(row, column.0)))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    fn set(
        &mut self,
        sheet: &str,
        row: u32,
        column: Column,
        value: CellValue,
    ) -> Result<(), DistributionErrors> {
        if !self.sheet_exists(sheet) {
            return Err(DistributionErrors::MissingSheet {
                sheet: sheet.to_string(),
            });
        }
        self.put(sheet, row, column, value);
        Ok(())
    }

    fn highest_used_row(&self, sheet: &str) -> u32 {
        self.sheets
            .get(sheet)
            .and_then(|cells| cells.keys().map(|(r, _)| *r).max())
            .unwrap_or(0)
    }

    fn save(&mut self) -> Result<(), DistributionErrors> {
        self.saves += 1;
        debug!("MemoryGrid::save: save #{}", self.saves);
        Ok(())
    }
}
