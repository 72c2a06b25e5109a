// The census workbook, read and written in place with umya-spreadsheet.

use std::path::{Path, PathBuf};

use umya_spreadsheet::Spreadsheet;

use census_allocation::{CellGrid, CellValue, Column, DistributionErrors};

use crate::distrib::io_common::simplify_file_name;
use crate::distrib::*;

/// A census workbook loaded in memory.
///
/// `save` writes the whole workbook to the output path. Without an output path (dry run),
/// the changes stay in memory.
pub struct XlsxGrid {
    book: Spreadsheet,
    output: Option<PathBuf>,
}

impl XlsxGrid {
    pub fn open(path: &Path, output: Option<PathBuf>) -> DistribResult<XlsxGrid> {
        let p = path.display().to_string();
        info!("Opening census workbook {}", simplify_file_name(&p));
        let book = umya_spreadsheet::reader::xlsx::read(path).context(OpeningWorkbookSnafu { path: p })?;
        Ok(XlsxGrid { book, output })
    }
}

impl CellGrid for XlsxGrid {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.book.get_sheet_by_name(sheet).is_some()
    }

    fn get(&self, sheet: &str, row: u32, column: Column) -> CellValue {
        let cell = match self
            .book
            .get_sheet_by_name(sheet)
            .and_then(|ws| ws.get_cell((column.0, row)))
        {
            Some(c) => c,
            None => return CellValue::Empty,
        };
        let cv = cell.get_cell_value();
        match cv.get_raw_value() {
            umya_spreadsheet::CellRawValue::Numeric(n) => CellValue::Number(*n),
            _ => {
                let text = cv.get_value();
                if text.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(text.to_string())
                }
            }
        }
    }

    fn set(
        &mut self,
        sheet: &str,
        row: u32,
        column: Column,
        value: CellValue,
    ) -> Result<(), DistributionErrors> {
        let ws = self
            .book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| DistributionErrors::MissingSheet {
                sheet: sheet.to_string(),
            })?;
        let cell = ws.get_cell_mut((column.0, row));
        match value {
            CellValue::Empty => {
                cell.set_blank();
            }
            CellValue::Text(s) => {
                cell.set_value_string(s);
            }
            CellValue::Number(n) => {
                cell.set_value_number(n);
            }
        }
        Ok(())
    }

    fn highest_used_row(&self, sheet: &str) -> u32 {
        // Formatted cells without a value do not count.
        self.book
            .get_sheet_by_name(sheet)
            .map(|ws| {
                ws.get_cell_collection()
                    .iter()
                    .filter(|c| !c.get_cell_value().get_value().is_empty())
                    .map(|c| *c.get_coordinate().get_row_num())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    fn save(&mut self) -> Result<(), DistributionErrors> {
        match &self.output {
            None => {
                debug!("XlsxGrid::save: dry run, nothing written");
                Ok(())
            }
            Some(p) => {
                debug!("XlsxGrid::save: writing {:?}", p);
                umya_spreadsheet::writer::xlsx::write(&self.book, p).map_err(|e| {
                    DistributionErrors::Storage {
                        message: format!("could not write {}: {}", p.display(), e),
                    }
                })
            }
        }
    }
}
