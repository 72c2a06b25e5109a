use log::{debug, error, info};

use crate::config::*;
use crate::grid::CellGrid;

/// Reads the last survey row already distributed.
///
/// All the copies listed in the layout must hold the same value. An empty set of copies
/// means that no distribution happened yet and reads as 0. Any disagreement, or a copy that
/// does not hold a non-negative integer, is reported as corruption: nothing else must be
/// attempted in that case.
pub fn read_checkpoint(
    grid: &dyn CellGrid,
    layout: &CheckpointLayout,
) -> Result<u32, DistributionErrors> {
    if !grid.sheet_exists(&layout.sheet) {
        return Err(DistributionErrors::MissingSheet {
            sheet: layout.sheet.clone(),
        });
    }

    let values: Vec<(CellRef, CellValue)> = layout
        .cells
        .iter()
        .map(|cell| (*cell, grid.get(&layout.sheet, cell.row, cell.column)))
        .collect();
    debug!("read_checkpoint: values: {:?}", values);

    let corrupt = || DistributionErrors::CorruptCheckpoint {
        sheet: layout.sheet.clone(),
        values: values.clone(),
    };

    let primary = match values.first() {
        Some((_, v)) => v,
        None => return Err(corrupt()),
    };
    if values.iter().any(|(_, v)| v != primary) {
        error!("Corruption in sheet {}: {:?}", layout.sheet, values);
        return Err(corrupt());
    }

    let last_row = match primary {
        v if v.is_empty() => 0,
        v => match v.as_integer() {
            Some(x) if x >= 0 && x <= u32::MAX as i64 => x as u32,
            _ => {
                error!(
                    "Corruption in sheet {}: checkpoint {:?} is not a row number",
                    layout.sheet, v
                );
                return Err(corrupt());
            }
        },
    };
    info!("Last distributed survey row: {}", last_row);
    Ok(last_row)
}

/// Writes the checkpoint to every copy. The caller saves the grid afterwards.
pub fn write_checkpoint(
    grid: &mut dyn CellGrid,
    layout: &CheckpointLayout,
    last_row: u32,
) -> Result<(), DistributionErrors> {
    for cell in layout.cells.iter() {
        grid.set(&layout.sheet, cell.row, cell.column, CellValue::from(last_row))?;
    }
    debug!(
        "write_checkpoint: {} copies set to {} in {}",
        layout.cells.len(),
        last_row,
        layout.sheet
    );
    Ok(())
}
