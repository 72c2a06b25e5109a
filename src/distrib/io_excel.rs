// Reading survey exports in Excel format.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use census_allocation::{CellValue, Column, MemoryGrid};

use crate::distrib::*;

fn to_cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::DateTime(f) => CellValue::Number(*f),
        DataType::String(s) => CellValue::Text(s.clone()),
        DataType::Bool(b) => CellValue::Text(b.to_string()),
        _ => CellValue::Empty,
    }
}

/// Reads one worksheet of the survey into memory, keeping its cell addresses.
///
/// Without a worksheet name, the first worksheet of the workbook is read.
pub fn read_excel_survey(
    path: &str,
    worksheet_name_o: &Option<String>,
) -> DistribResult<(MemoryGrid, String)> {
    debug!(
        "read_excel_survey: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let worksheet_name = match worksheet_name_o {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .context(EmptyExcelSnafu { path })?,
    };
    let wrange = workbook
        .worksheet_range(&worksheet_name)
        .context(MissingWorksheetSnafu {
            path,
            worksheet: worksheet_name.clone(),
        })?
        .context(OpeningExcelSnafu { path })?;

    let mut grid = MemoryGrid::new();
    grid.add_sheet(&worksheet_name);
    // The range does not always start at A1.
    let (row_offset, col_offset) = wrange.start().unwrap_or((0, 0));
    for (ridx, row) in wrange.rows().enumerate() {
        for (cidx, cell) in row.iter().enumerate() {
            let value = to_cell_value(cell);
            if !value.is_empty() {
                grid.put(
                    &worksheet_name,
                    row_offset + ridx as u32 + 1,
                    Column(col_offset + cidx as u32 + 1),
                    value,
                );
            }
        }
    }
    info!(
        "read_excel_survey: {} rows read from worksheet {}",
        grid.highest_used_row(&worksheet_name),
        worksheet_name
    );
    Ok((grid, worksheet_name))
}
