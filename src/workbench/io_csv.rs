// Primitives for reading CSV files.

use std::fs::File;
use std::io::Read;

use log::debug;
use snafu::prelude::*;

use crate::workbench::*;

/// Reads a CSV export with a header row into source rows.
pub fn read_csv_rows(path: &str) -> ToolResult<Vec<SourceRow>> {
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    read_csv_from(f, path)
}

/// Reads CSV content. `path` only labels the errors and logs.
pub fn read_csv_from<R: Read>(reader: R, path: &str) -> ToolResult<Vec<SourceRow>> {
    // Exports are not always rectangular: short and long lines are accepted.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context(CsvParseSnafu { path })?
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            if idx == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    debug!("read_csv_from: {:?} headers: {:?}", path, headers);

    let mut res: Vec<SourceRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // Header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvParseSnafu { path })?;
        if line.len() != headers.len() {
            debug!(
                "read_csv_from: {:?} line {}: {} field(s) for {} header(s)",
                path,
                lineno,
                line.len(),
                headers.len()
            );
        }
        let row = SourceRow::from_pairs(
            headers
                .iter()
                .cloned()
                .zip(line.iter().map(|s| s.to_string())),
        );
        res.push(row);
    }
    debug!("read_csv_from: {:?}: {} row(s)", path, res.len());
    Ok(res)
}
