pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_xlsx;

use log::{debug, info, warn};

use census_allocation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;

use crate::args::Args;
use crate::distrib::config_reader::*;
use crate::distrib::io_xlsx::XlsxGrid;

#[derive(Debug, Snafu)]
pub enum DistribError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Configuration {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Could not understand column {value:?}"))]
    InvalidColumn { value: String },

    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { path: String, worksheet: String },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },

    #[snafu(display("Error opening census workbook {path}"))]
    OpeningWorkbook {
        source: umya_spreadsheet::XlsxError,
        path: String,
    },

    #[snafu(display("{source}"))]
    Distribution { source: DistributionErrors },

    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DistribResult<T> = Result<T, DistribError>;

fn summary_to_json(summary: &[BlockSummary]) -> Vec<JSValue> {
    summary
        .iter()
        .map(|s| {
            json!({
                "center": s.center,
                "census": s.block,
                "freeBefore": s.initial_free,
                "assigned": s.assigned(),
                "remaining": s.remaining,
            })
        })
        .collect()
}

fn failures_to_json(failures: &[ErrorRecord]) -> Vec<JSValue> {
    failures
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "phone": f.phone,
                "firstPreference": f.first_preference,
                "secondPreference": f.second_preference,
                "quantity": f.quantity,
                "error": f.code.message(),
            })
        })
        .collect()
}

pub fn build_summary_js(report: &RunReport, dry_run: bool) -> JSValue {
    match report {
        RunReport::NothingToDo { checkpoint } => json!({
            "status": "nothingToDo",
            "dryRun": dry_run,
            "checkpoint": checkpoint,
        }),
        RunReport::Completed {
            previous_checkpoint,
            checkpoint,
            requests,
            outcome,
        } => json!({
            "status": "completed",
            "dryRun": dry_run,
            "previousCheckpoint": previous_checkpoint,
            "checkpoint": checkpoint,
            "boxes": requests,
            "assigned": outcome.assignments.len(),
            "exhaustedCenters": outcome.exhausted_centers,
            "census": summary_to_json(&outcome.summary),
            "errors": failures_to_json(&outcome.failures),
        }),
    }
}

/// Prints the remaining census of each block, the report the operators work from.
fn print_summary(report: &RunReport) {
    match report {
        RunReport::NothingToDo { checkpoint } => {
            println!(
                "No new survey rows after row {}: nothing distributed",
                checkpoint
            );
        }
        RunReport::Completed {
            checkpoint,
            requests,
            outcome,
            ..
        } => {
            println!(
                "{} boxes read, {} assigned, {} errors. Survey distributed up to row {}.",
                requests,
                outcome.assignments.len(),
                outcome.failures.len(),
                checkpoint
            );
            for s in outcome.summary.iter() {
                println!(
                    "  {:<24} {:<12} {:>5} undistributed",
                    s.center, s.block, s.remaining
                );
            }
        }
    }
}

fn write_summary(out: &str, js: &JSValue) -> DistribResult<()> {
    let pretty_js = serde_json::to_string_pretty(js).context(SerializingSummarySnafu {})?;
    if out == "stdout" {
        println!("{}", pretty_js);
    } else {
        fs::write(out, pretty_js).context(WritingSummarySnafu {
            path: out.to_string(),
        })?;
        info!("Summary written to {}", out);
    }
    Ok(())
}

/// Runs one distribution as described by the configuration file.
///
/// Paths given on the command line take precedence over the ones in the configuration, which
/// are resolved against the directory of the configuration file.
pub fn run_distribution_from_config(
    config_path: &str,
    survey_override: Option<String>,
    census_override: Option<String>,
    dry_run: bool,
) -> DistribResult<RunReport> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = config_root(config_path)?;

    let survey_path: PathBuf = match survey_override {
        Some(p) => PathBuf::from(p),
        None => root_p.join(&config.survey_source.file_path),
    };
    let (survey, survey_sheet) =
        io_common::read_survey(&survey_path.display().to_string(), &config.survey_source)?;
    debug!("survey sheets: {:?}", survey.sheet_names());

    let settings = config.settings(&survey_sheet)?;

    let census_path: PathBuf = match census_override.clone() {
        Some(p) => PathBuf::from(p),
        None => root_p.join(&config.census_file_path),
    };
    let output_path: Option<PathBuf> = if dry_run {
        warn!("Dry run: no workbook will be saved");
        None
    } else {
        Some(match (&census_override, &config.results_file_path) {
            // The census given on the command line is updated in place.
            (Some(_), _) => census_path.clone(),
            (None, Some(results)) => root_p.join(results),
            (None, None) => census_path.clone(),
        })
    };
    let mut census = XlsxGrid::open(&census_path, output_path.clone())?;
    if let Some(results_path) = output_path.filter(|p| *p != census_path) {
        if let Some((census_row, results_row)) =
            results_ahead_of_census(&census, &results_path, &settings.checkpoint)
        {
            warn!(
                "The results workbook {} was distributed up to survey row {} but the census \
                 workbook only up to row {}: the rows in between will be distributed again. \
                 Use the results workbook as the census to continue from it.",
                results_path.display(),
                results_row,
                census_row
            );
        }
    }

    run_distribution(&survey, &mut census, &settings).context(DistributionSnafu {})
}

/// Compares the checkpoints of the census workbook and of an existing results workbook.
///
/// Returns both checkpoints when the results workbook is further along, which happens when
/// the census workbook is read again after a previous run saved its results elsewhere.
fn results_ahead_of_census(
    census: &dyn CellGrid,
    results_path: &Path,
    layout: &CheckpointLayout,
) -> Option<(u32, u32)> {
    if !results_path.exists() {
        return None;
    }
    let results = match XlsxGrid::open(results_path, None) {
        Ok(g) => g,
        Err(e) => {
            debug!("results_ahead_of_census: cannot read {:?}: {}", results_path, e);
            return None;
        }
    };
    let census_row = read_checkpoint(census, layout).ok()?;
    let results_row = read_checkpoint(&results, layout).ok()?;
    if results_row > census_row {
        Some((census_row, results_row))
    } else {
        None
    }
}

pub fn run_from_args(args: &Args) -> DistribResult<()> {
    let report = run_distribution_from_config(
        &args.config,
        args.survey.clone(),
        args.census.clone(),
        args.dry_run,
    )?;
    print_summary(&report);
    if let Some(out) = &args.out {
        write_summary(out, &build_summary_js(&report, args.dry_run))?;
    }
    Ok(())
}
