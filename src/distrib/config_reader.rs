use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use census_allocation::{CellRef, CenterLayout, CheckpointLayout, Column, ColumnLayout};
use census_allocation::DistributionSettings;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::distrib::*;

const DEFAULT_ERROR_SHEET: &str = "CRISIS";
const DEFAULT_CHECKPOINT_SHEET: &str = "DATA_DELICADA";
const DEFAULT_CHECKPOINT_CELLS: [&str; 4] = ["A1", "A10", "A20", "A100"];
const DEFAULT_SEPARATOR: &str = "x";
const DEFAULT_TERMINATOR: &str = "yy";
// Sheet name given to the rows of a CSV survey.
pub const CSV_SHEET: &str = "DATA";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveySource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "csvDelimiter")]
    pub csv_delimiter: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(rename = "sheetName")]
    pub sheet_name: Option<String>,
    pub cells: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    pub owner: Option<JSValue>,
    pub name: Option<JSValue>,
    pub phone: Option<JSValue>,
    pub quantity: Option<JSValue>,
    #[serde(rename = "firstPreference")]
    pub first_preference: Option<JSValue>,
    #[serde(rename = "secondPreference")]
    pub second_preference: Option<JSValue>,
    pub error: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CenterConfig {
    pub name: String,
    pub blocks: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DistribConfig {
    #[serde(rename = "surveySource")]
    pub survey_source: SurveySource,
    #[serde(rename = "censusFilePath")]
    pub census_file_path: String,
    #[serde(rename = "resultsFilePath")]
    pub results_file_path: Option<String>,
    #[serde(rename = "errorSheetName")]
    pub error_sheet_name: Option<String>,
    pub checkpoint: Option<CheckpointConfig>,
    pub columns: Option<ColumnsConfig>,
    #[serde(rename = "separatorSymbol")]
    pub separator_symbol: Option<String>,
    #[serde(rename = "terminatorSymbol")]
    pub terminator_symbol: Option<String>,
    pub centers: Vec<CenterConfig>,
}

impl SurveySource {
    pub fn csv_delimiter(&self) -> DistribResult<u8> {
        match self.csv_delimiter.as_deref() {
            None => Ok(b','),
            Some(s) if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
            Some(s) => whatever!("the CSV delimiter must be a single character, got {:?}", s),
        }
    }
}

impl DistribConfig {
    fn columns(&self) -> DistribResult<ColumnLayout> {
        let d = ColumnLayout::DEFAULT_LAYOUT;
        let res = match &self.columns {
            None => d,
            Some(c) => ColumnLayout {
                owner: read_column(&c.owner, d.owner)?,
                name: read_column(&c.name, d.name)?,
                phone: read_column(&c.phone, d.phone)?,
                quantity: read_column(&c.quantity, d.quantity)?,
                first_preference: read_column(&c.first_preference, d.first_preference)?,
                second_preference: read_column(&c.second_preference, d.second_preference)?,
                error: read_column(&c.error, d.error)?,
            },
        };
        let overwritten = [
            res.name,
            res.phone,
            res.first_preference,
            res.second_preference,
        ];
        if overwritten.contains(&res.error) {
            return InvalidConfigSnafu {
                message: format!(
                    "the error column {} would overwrite the donor details",
                    res.error.letters()
                ),
            }
            .fail();
        }
        Ok(res)
    }

    fn checkpoint(&self) -> DistribResult<CheckpointLayout> {
        let sheet = self
            .checkpoint
            .as_ref()
            .and_then(|c| c.sheet_name.clone())
            .unwrap_or_else(|| DEFAULT_CHECKPOINT_SHEET.to_string());
        let cell_names: Vec<String> = self
            .checkpoint
            .as_ref()
            .and_then(|c| c.cells.clone())
            .unwrap_or_else(|| {
                DEFAULT_CHECKPOINT_CELLS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });
        let mut cells: Vec<CellRef> = Vec::new();
        for name in cell_names.iter() {
            match CellRef::parse(name) {
                Some(cell) if !cells.contains(&cell) => cells.push(cell),
                Some(_) => {
                    return InvalidConfigSnafu {
                        message: format!("checkpoint cell {} is given twice", name),
                    }
                    .fail()
                }
                None => {
                    return InvalidConfigSnafu {
                        message: format!("checkpoint cell {:?} is not a cell reference", name),
                    }
                    .fail()
                }
            }
        }
        if cells.len() < 2 {
            return InvalidConfigSnafu {
                message: "the checkpoint needs at least 2 cells".to_string(),
            }
            .fail();
        }
        Ok(CheckpointLayout { sheet, cells })
    }

    fn centers(&self) -> DistribResult<Vec<CenterLayout>> {
        if self.centers.is_empty() {
            return InvalidConfigSnafu {
                message: "no collection center defined".to_string(),
            }
            .fail();
        }
        let mut seen_centers: HashSet<&str> = HashSet::new();
        let mut seen_blocks: HashSet<&str> = HashSet::new();
        for c in self.centers.iter() {
            if !seen_centers.insert(c.name.as_str()) {
                return InvalidConfigSnafu {
                    message: format!("center {} is defined twice", c.name),
                }
                .fail();
            }
            if c.blocks.is_empty() {
                return InvalidConfigSnafu {
                    message: format!("center {} has no census", c.name),
                }
                .fail();
            }
            for b in c.blocks.iter() {
                if !seen_blocks.insert(b.as_str()) {
                    return InvalidConfigSnafu {
                        message: format!("census {} belongs to more than one center", b),
                    }
                    .fail();
                }
            }
        }
        Ok(self
            .centers
            .iter()
            .map(|c| CenterLayout {
                name: c.name.clone(),
                blocks: c.blocks.clone(),
            })
            .collect())
    }

    /// Validates the configuration and turns it into the settings of a run.
    pub fn settings(&self, survey_sheet: &str) -> DistribResult<DistributionSettings> {
        let separator = self
            .separator_symbol
            .clone()
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        let terminator = self
            .terminator_symbol
            .clone()
            .unwrap_or_else(|| DEFAULT_TERMINATOR.to_string());
        if separator.is_empty() || terminator.is_empty() || separator == terminator {
            return InvalidConfigSnafu {
                message: format!(
                    "the separator {:?} and the terminator {:?} must be distinct and not empty",
                    separator, terminator
                ),
            }
            .fail();
        }
        Ok(DistributionSettings {
            survey_sheet: survey_sheet.to_string(),
            error_sheet: self
                .error_sheet_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_SHEET.to_string()),
            checkpoint: self.checkpoint()?,
            columns: self.columns()?,
            separator,
            terminator,
            centers: self.centers()?,
        })
    }
}

pub fn read_config(config_path: &str) -> DistribResult<DistribConfig> {
    let config_str = fs::read_to_string(config_path).context(OpeningJsonSnafu {
        path: config_path.to_string(),
    })?;
    serde_json::from_str(&config_str).context(ParsingJsonSnafu {
        path: config_path.to_string(),
    })
}

/// The directory against which the relative paths of the configuration are resolved.
pub fn config_root(config_path: &str) -> DistribResult<PathBuf> {
    let config_p = Path::new(config_path);
    let root_p = config_p.parent().context(MissingParentDirSnafu {
        path: config_path.to_string(),
    })?;
    Ok(root_p.to_path_buf())
}

// Columns are accepted as Excel letters ("B") or as 1-based numbers (2 or "2").
fn read_column(x: &Option<JSValue>, default: Column) -> DistribResult<Column> {
    let res = match x {
        None | Some(JSValue::Null) => Some(default),
        Some(JSValue::Number(n)) => n.as_u64().and_then(|i| u32::try_from(i).ok()).map(Column),
        Some(JSValue::String(s)) if s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Column::from_letters(s)
        }
        Some(JSValue::String(s)) => s.trim().parse::<u32>().ok().map(Column),
        Some(_) => None,
    };
    match res {
        Some(Column(0)) | None => InvalidColumnSnafu {
            value: format!("{:?}", x),
        }
        .fail(),
        Some(c) => Ok(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(js: JSValue) -> DistribConfig {
        serde_json::from_value(js).unwrap()
    }

    fn minimal() -> JSValue {
        json!({
            "surveySource": { "provider": "csv", "filePath": "survey.csv" },
            "censusFilePath": "census.xlsx",
            "centers": [ { "name": "Escazu", "blocks": ["PUR", "CRP"] } ]
        })
    }

    #[test]
    fn defaults() {
        let s = parse(minimal()).settings("DATA").unwrap();
        assert_eq!(s.error_sheet, "CRISIS");
        assert_eq!(s.checkpoint.sheet, "DATA_DELICADA");
        let cells: Vec<String> = s.checkpoint.cells.iter().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["A1", "A10", "A20", "A100"]);
        assert_eq!(s.columns, ColumnLayout::DEFAULT_LAYOUT);
        assert_eq!(s.separator, "x");
        assert_eq!(s.terminator, "yy");
        assert_eq!(s.centers[0].blocks, vec!["PUR", "CRP"]);
    }

    #[test]
    fn columns_as_letters_or_numbers() {
        let mut js = minimal();
        js["columns"] = json!({ "name": "c", "phone": 4, "quantity": "5", "error": "AA" });
        let s = parse(js).settings("DATA").unwrap();
        assert_eq!(s.columns.name, Column(3));
        assert_eq!(s.columns.phone, Column(4));
        assert_eq!(s.columns.quantity, Column(5));
        assert_eq!(s.columns.error, Column(27));
        assert_eq!(s.columns.owner, Column(1));
    }

    #[test]
    fn rejects_bad_columns() {
        let mut js = minimal();
        js["columns"] = json!({ "name": 0 });
        assert!(matches!(
            parse(js).settings("DATA"),
            Err(DistribError::InvalidColumn { .. })
        ));

        let mut js = minimal();
        js["columns"] = json!({ "error": "B" });
        assert!(matches!(
            parse(js).settings("DATA"),
            Err(DistribError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_bad_checkpoint() {
        let mut js = minimal();
        js["checkpoint"] = json!({ "cells": ["A1"] });
        assert!(matches!(
            parse(js).settings("DATA"),
            Err(DistribError::InvalidConfig { .. })
        ));

        let mut js = minimal();
        js["checkpoint"] = json!({ "cells": ["A1", "10A"] });
        assert!(matches!(
            parse(js).settings("DATA"),
            Err(DistribError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_bad_centers() {
        let mut js = minimal();
        js["centers"] = json!([]);
        assert!(parse(js).settings("DATA").is_err());

        let mut js = minimal();
        js["centers"] = json!([ { "name": "Escazu", "blocks": [] } ]);
        assert!(parse(js).settings("DATA").is_err());

        let mut js = minimal();
        js["centers"] = json!([
            { "name": "Escazu", "blocks": ["PUR"] },
            { "name": "Santa Ana", "blocks": ["PUR"] }
        ]);
        assert!(parse(js).settings("DATA").is_err());
    }

    #[test]
    fn rejects_same_symbols() {
        let mut js = minimal();
        js["terminatorSymbol"] = json!("x");
        assert!(parse(js).settings("DATA").is_err());
    }

    #[test]
    fn csv_delimiter() {
        let mut js = minimal();
        js["surveySource"]["csvDelimiter"] = json!(";");
        assert_eq!(parse(js).survey_source.csv_delimiter().unwrap(), b';');
        assert_eq!(parse(minimal()).survey_source.csv_delimiter().unwrap(), b',');
    }
}
