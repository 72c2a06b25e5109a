use std::path::Path;

use census_allocation::MemoryGrid;

use crate::distrib::config_reader::{SurveySource, CSV_SHEET};
use crate::distrib::io_csv::read_csv_survey;
use crate::distrib::io_excel::read_excel_survey;
use crate::distrib::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Reads the survey into memory.
///
/// Returns the grid and the name of the sheet holding the responses.
pub fn read_survey(path: &str, source: &SurveySource) -> DistribResult<(MemoryGrid, String)> {
    info!(
        "Reading survey {} with provider {}",
        simplify_file_name(path),
        source.provider
    );
    match source.provider.as_str() {
        "csv" => {
            let grid = read_csv_survey(path, source.csv_delimiter()?, CSV_SHEET)?;
            Ok((grid, CSV_SHEET.to_string()))
        }
        "xlsx" => read_excel_survey(path, &source.excel_worksheet_name),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/a/survey.csv"), "survey.csv");
        assert_eq!(simplify_file_name("survey.csv"), "survey.csv");
    }

    #[test]
    fn unknown_provider() {
        let source = SurveySource {
            provider: "ods".to_string(),
            file_path: "survey.ods".to_string(),
            excel_worksheet_name: None,
            csv_delimiter: None,
        };
        assert!(matches!(
            read_survey("survey.ods", &source),
            Err(DistribError::Whatever { .. })
        ));
    }
}
