mod allocation;
mod checkpoint;
mod config;
mod grid;
mod ingest;
mod inventory;
mod ledger;
pub mod manual;

use log::info;

pub use crate::allocation::{allocate, write_assignments};
pub use crate::checkpoint::{read_checkpoint, write_checkpoint};
pub use crate::config::*;
pub use crate::grid::{CellGrid, MemoryGrid};
pub use crate::ingest::{load_requests, MAX_BOXES_PER_ROW};
pub use crate::inventory::{scan, CensusBlock, CollectionCenter, Inventory};
pub use crate::ledger::append_errors;

/// Runs one distribution: the survey rows added since the last run are matched with the
/// free census slots, and the results are written back to the census workbook.
///
/// Arguments:
/// * `survey` the survey responses, with headers in the first row. Only read.
/// * `census` the workbook holding the census sheets, the error sheet and the checkpoint.
/// * `settings` the layout of both workbooks.
///
/// Every check that can fail happens before the first write. The census workbook is saved
/// once with the assignments and the errors, and the checkpoint is only advanced and saved
/// after that. A run that fails at any point can be run again and resumes from the same
/// survey row.
pub fn run_distribution(
    survey: &dyn CellGrid,
    census: &mut dyn CellGrid,
    settings: &DistributionSettings,
) -> Result<RunReport, DistributionErrors> {
    let previous_checkpoint = read_checkpoint(census, &settings.checkpoint)?;

    if !survey.sheet_exists(&settings.survey_sheet) {
        return Err(DistributionErrors::MissingSheet {
            sheet: settings.survey_sheet.clone(),
        });
    }
    let batch = load_requests(
        survey,
        &settings.survey_sheet,
        &settings.columns,
        previous_checkpoint,
    )?;
    if batch.requests.is_empty() {
        info!("No new donors to distribute");
        return Ok(RunReport::NothingToDo {
            checkpoint: previous_checkpoint,
        });
    }

    if !census.sheet_exists(&settings.error_sheet) {
        return Err(DistributionErrors::MissingSheet {
            sheet: settings.error_sheet.clone(),
        });
    }
    let mut inventory = scan(
        census,
        &settings.centers,
        settings.columns.owner,
        &settings.separator,
        &settings.terminator,
    )?;

    let outcome = allocate(&batch.requests, &mut inventory);

    write_assignments(census, settings.columns.owner, &outcome.assignments)?;
    append_errors(
        census,
        &settings.error_sheet,
        &settings.columns,
        &outcome.failures,
    )?;
    census.save()?;

    write_checkpoint(census, &settings.checkpoint, batch.last_row)?;
    census.save()?;
    info!(
        "Distribution finished: {} boxes assigned, {} errors, survey read up to row {}",
        outcome.assignments.len(),
        outcome.failures.len(),
        batch.last_row
    );

    Ok(RunReport::Completed {
        previous_checkpoint,
        checkpoint: batch.last_row,
        requests: batch.requests.len(),
        outcome,
    })
}
