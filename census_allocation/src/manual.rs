/*!

This is the long-form manual for `census_allocation` and `censusdist`.

## Workbooks

Two workbooks take part in a distribution:
* the **survey**, one row per donor, exported from the online form (CSV or Excel);
* the **census workbook**, one sheet per census, plus an error sheet and a checkpoint sheet.
  This is the only workbook that gets modified.

### Survey

The first row holds the headers and is never read as a donor. Every following row holds,
in the configured columns:

| column | content                                      |
|--------|----------------------------------------------|
| B      | name of the donor                            |
| C      | phone of the donor                           |
| D      | number of boxes (a positive whole number)    |
| E      | preferred collection center                  |
| F      | second choice of collection center           |

A row pledging 3 boxes is handled as 3 donors with the same details. A number of boxes that
is missing, not a positive whole number, or above 1000 stops the distribution before anything
is written. So does a row with neither a name nor a phone: the census it would receive
would still look free.

### Census sheets

The owner column (A by default) of a census sheet is empty except for the separator
symbol (`x` by default), which marks the row just above each census:

```text
   A      B
1  x      family 1 ...
2         ...
3         ...
4  x      family 2 ...
5  Ana    ...
6  555-1  ...
7  yy
8  x      not distributed
```

The two rows below a separator receive the name and the phone of the donor. A census whose
two rows are empty is free (rows 1–3 above); any content makes it taken (rows 4–6). The
stop symbol (`yy` by default) ends the sheet: the census below it are never distributed.
Free census are handed out top to bottom.

Each collection center owns one or more census sheets. When a donor picks a center, its
sheets are tried in the configured order.

### Error sheet

Donors that could not receive a census are appended to the error sheet (`CRISIS` by
default), in the same columns as the survey, with the reason in the error column
(G by default). The first row is left for headers. Earlier errors are never overwritten.

There are two reasons:
* the first center is full and the second choice is the same center;
* both centers are full.

### Checkpoint sheet

The last survey row already distributed is written to several cells of the checkpoint sheet
(`DATA_DELICADA`, cells `A1`, `A10`, `A20` and `A100` by default). Before the first
distribution these cells are empty, or all hold `0`. If the copies disagree the workbook was
tampered with: the distribution stops and nothing is written.

A distribution only reads the survey rows below the checkpoint, so it can be run as often as
needed while the survey keeps receiving answers. The checkpoint is written last, after the
census and the errors were saved: a distribution that fails half-way is simply run again.

## Configuration

`censusdist` reads a configuration file in JSON. All the fields except `surveySource`,
`censusFilePath` and `centers` are optional.

```json
{
  "surveySource": {
    "provider": "csv",
    "filePath": "Cajas de la Amor.csv"
  },
  "censusFilePath": "Entregas NEJ 2018.xlsx",
  "resultsFilePath": "Entregas NEJ 2018.xlsx",
  "errorSheetName": "CRISIS",
  "checkpoint": {
    "sheetName": "DATA_DELICADA",
    "cells": ["A1", "A10", "A20", "A100"]
  },
  "columns": {
    "owner": "A", "name": "B", "phone": "C", "quantity": "D",
    "firstPreference": "E", "secondPreference": "F", "error": "G"
  },
  "separatorSymbol": "x",
  "terminatorSymbol": "yy",
  "centers": [
    { "name": "Tres Rios/Curridabat", "blocks": ["DUL"] },
    { "name": "Santa Ana", "blocks": ["LIA", "QUI", "CPN"] },
    { "name": "Escazu", "blocks": ["PUR", "CRP"] }
  ]
}
```

Notes:
 - `provider` is `csv` or `xlsx`. For `xlsx`, `excelWorksheetName` selects the sheet (the
   first one by default). For `csv`, `csvDelimiter` sets the delimiter (`,` by default).
 - columns are given as Excel letters or as numbers starting at 1.
 - the error column must not be one of the name, phone or center columns.
 - paths are relative to the directory of the configuration file.
 - `resultsFilePath` receives the updated census workbook, checkpoint included. The census
   workbook itself is then left untouched, so the next distribution must read from the
   results file. A warning is logged when the results file is further along than the census.

## Command line

```text
censusdist --config config.json [--survey export.csv] [--census census.xlsx]
           [--out summary.json|stdout] [--dry-run] [--verbose]
```

`--dry-run` computes and reports the distribution without saving any workbook. `--out`
writes a JSON summary: the survey rows read, the census left in every sheet, the centers
that ran out and the donors recorded in the error sheet.

The columns and symbols must not change once a family of workbooks has been distributed:
the census already handed out would not be recognized any more.

 */
