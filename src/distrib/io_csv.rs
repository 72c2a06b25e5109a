// Reading survey exports in CSV format.

use census_allocation::{CellValue, Column, MemoryGrid};

use crate::distrib::*;

/// Reads every line of the CSV file into one sheet, the first line landing in row 1.
///
/// All the fields are kept as text. Lines may have different lengths.
pub fn read_csv_survey(path: &str, delimiter: u8, sheet: &str) -> DistribResult<MemoryGrid> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut grid = MemoryGrid::new();
    grid.add_sheet(sheet);
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_survey: lineno: {:?} line: {:?}", lineno, line);
        for (cidx, field) in line.iter().enumerate() {
            if !field.is_empty() {
                grid.put(
                    sheet,
                    lineno as u32,
                    Column(cidx as u32 + 1),
                    CellValue::from(field),
                );
            }
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_allocation::CellGrid;
    use std::fs;

    #[test]
    fn reads_lines_as_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("survey.csv");
        fs::write(
            &p,
            "Marca;Nombre;Telefono;Cajas\n;Ana;555-1111;2\n;\"Perez; Luis\";555-2222\n",
        )
        .unwrap();
        let g = read_csv_survey(&p.display().to_string(), b';', "DATA").unwrap();
        assert_eq!(g.highest_used_row("DATA"), 3);
        assert_eq!(g.get("DATA", 1, Column(2)), CellValue::from("Nombre"));
        assert_eq!(g.get("DATA", 2, Column(1)), CellValue::Empty);
        assert_eq!(g.get("DATA", 2, Column(4)), CellValue::from("2"));
        assert_eq!(g.get("DATA", 3, Column(2)), CellValue::from("Perez; Luis"));
        assert_eq!(g.get("DATA", 3, Column(4)), CellValue::Empty);
    }

    #[test]
    fn header_only() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("survey.csv");
        fs::write(&p, "Marca,Nombre\n").unwrap();
        let g = read_csv_survey(&p.display().to_string(), b',', "DATA").unwrap();
        assert!(g.sheet_exists("DATA"));
        assert_eq!(g.highest_used_row("DATA"), 1);
    }

    #[test]
    fn missing_file() {
        let res = read_csv_survey("/nonexistent/survey.csv", b',', "DATA");
        assert!(matches!(res, Err(DistribError::CsvOpen { .. })));
    }
}
