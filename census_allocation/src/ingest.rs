use log::{debug, info};

use crate::config::*;
use crate::grid::CellGrid;

/// The survey's first row only holds the headers.
const HEADER_ROW: u32 = 1;

/// Largest number of boxes a single survey row may pledge. Anything above is a typo.
pub const MAX_BOXES_PER_ROW: u32 = 1000;

/// Reads the survey rows past `resume_row` and expands each of them into one request per box.
///
/// Rows are read in order, and the requests of a row are contiguous. A quantity that is not a
/// positive integer up to `MAX_BOXES_PER_ROW`, or a row with neither a name nor a phone,
/// stops the ingestion: it means the survey export is malformed. The owner details are what
/// marks a census slot as taken, so a donor without any cannot be given one.
pub fn load_requests(
    survey: &dyn CellGrid,
    sheet: &str,
    columns: &ColumnLayout,
    resume_row: u32,
) -> Result<SurveyBatch, DistributionErrors> {
    let last_row = survey.highest_used_row(sheet);
    let first_row = resume_row.max(HEADER_ROW) + 1;
    debug!(
        "load_requests: sheet: {:?} resume_row: {} last_row: {}",
        sheet, resume_row, last_row
    );

    let mut requests: Vec<DonationRequest> = Vec::new();
    for row in first_row..=last_row {
        let quantity = read_quantity(survey, sheet, columns, row)?;
        let request = DonationRequest {
            name: survey.get(sheet, row, columns.name).to_text(),
            phone: survey.get(sheet, row, columns.phone).to_text(),
            first_preference: survey.get(sheet, row, columns.first_preference).to_text(),
            second_preference: survey.get(sheet, row, columns.second_preference).to_text(),
            quantity,
            survey_row: row,
        };
        if request.name.trim().is_empty() && request.phone.trim().is_empty() {
            return Err(DistributionErrors::MissingDonorDetails { row });
        }
        debug!("load_requests: row {}: {:?}", row, request);
        for _ in 0..quantity {
            requests.push(request.clone());
        }
    }

    info!(
        "Read {} boxes to distribute from survey rows {}..={}",
        requests.len(),
        first_row,
        last_row
    );
    Ok(SurveyBatch { requests, last_row })
}

fn read_quantity(
    survey: &dyn CellGrid,
    sheet: &str,
    columns: &ColumnLayout,
    row: u32,
) -> Result<u32, DistributionErrors> {
    let value = survey.get(sheet, row, columns.quantity);
    match value.as_integer() {
        Some(x) if x > 0 && x <= MAX_BOXES_PER_ROW as i64 => Ok(x as u32),
        _ => Err(DistributionErrors::InvalidQuantity { row, value }),
    }
}
