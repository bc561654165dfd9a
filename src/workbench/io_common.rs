use std::path::Path;
use std::str::FromStr;

use snafu::prelude::*;

use crate::workbench::*;

/// The file name of a path, used as the site token of an upload.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The lower-cased extension of a path, empty when there is none.
pub fn path_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Excel,
}

impl InputType {
    /// Excel for .xlsx and .xlsm files, CSV otherwise.
    pub fn from_path(path: &str) -> InputType {
        match path_extension(path).as_str() {
            "xlsx" | "xlsm" => InputType::Excel,
            _ => InputType::Csv,
        }
    }
}

impl FromStr for InputType {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "excel" | "xlsx" => Ok(InputType::Excel),
            x => whatever!("Input type not implemented {:?}", x),
        }
    }
}
