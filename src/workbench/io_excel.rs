use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::{debug, warn};
use snafu::prelude::*;

use crate::workbench::*;

fn get_range(path: &str, worksheet_name: Option<&str>) -> ToolResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(MissingWorksheetSnafu {
                path,
                name: "(first)",
            })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) => f.to_string(),
        DataType::Empty => String::new(),
        other => {
            warn!("cell_text: unreadable cell {:?}, treated as empty", other);
            String::new()
        }
    }
}

/// Reads the first (or the named) worksheet of an Excel export. The first row holds the headers.
pub fn read_excel_rows(path: &str, worksheet_name: Option<&str>) -> ToolResult<Vec<SourceRow>> {
    let wrange = get_range(path, worksheet_name)?;
    let mut iter = wrange.rows();
    let headers: Vec<String> = match iter.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => {
            warn!("read_excel_rows: {:?} is empty", path);
            return Ok(Vec::new());
        }
    };
    debug!("read_excel_rows: {:?} headers: {:?}", path, headers);

    let res: Vec<SourceRow> = iter
        .map(|row| {
            SourceRow::from_pairs(
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(cell_text)),
            )
        })
        .collect();
    debug!("read_excel_rows: {:?}: {} row(s)", path, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_become_text() {
        assert_eq!(cell_text(&DataType::Float(4.0)), "4");
        assert_eq!(cell_text(&DataType::Float(2.5)), "2.5");
        assert_eq!(cell_text(&DataType::Int(3)), "3");
        assert_eq!(cell_text(&DataType::String("Tech".to_string())), "Tech");
        assert_eq!(cell_text(&DataType::Empty), "");
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let res = read_excel_rows("/nonexistent/dir/site.xlsx", None);
        assert!(matches!(res, Err(ToolError::OpeningExcel { .. })));
    }
}
