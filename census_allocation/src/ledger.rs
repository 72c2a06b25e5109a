use log::{debug, info};

use crate::config::*;
use crate::grid::CellGrid;

/// Appends the failed requests to the error sheet, below anything already recorded there.
///
/// The first row of the error sheet is left for headers. Each record reuses the survey's
/// columns, plus the error column for the message.
pub fn append_errors(
    grid: &mut dyn CellGrid,
    sheet: &str,
    columns: &ColumnLayout,
    errors: &[ErrorRecord],
) -> Result<(), DistributionErrors> {
    if errors.is_empty() {
        return Ok(());
    }
    let existing = grid.highest_used_row(sheet).max(1);
    debug!("append_errors: existing rows in {}: {}", sheet, existing);
    for (idx, e) in errors.iter().enumerate() {
        let row = existing + idx as u32 + 1;
        grid.set(sheet, row, columns.name, CellValue::from(e.name.as_str()))?;
        grid.set(sheet, row, columns.phone, CellValue::from(e.phone.as_str()))?;
        grid.set(
            sheet,
            row,
            columns.first_preference,
            CellValue::from(e.first_preference.as_str()),
        )?;
        grid.set(
            sheet,
            row,
            columns.second_preference,
            CellValue::from(e.second_preference.as_str()),
        )?;
        grid.set(sheet, row, columns.quantity, CellValue::from(e.quantity))?;
        grid.set(sheet, row, columns.error, CellValue::from(e.code.message()))?;
    }
    info!("Recorded {} errors in sheet {}", errors.len(), sheet);
    Ok(())
}
