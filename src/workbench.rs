use log::{debug, info, warn};

use capability_consolidation::*;
use snafu::{prelude::*, Snafu};

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use text_diff::print_diff;

pub mod config_reader;
pub mod display;
pub mod export;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod session;
pub mod store;

use crate::workbench::config_reader::*;
use crate::workbench::export::OutputFormat;
use crate::workbench::io_common::{simplify_file_name, InputType};
use crate::workbench::session::{EditableField, Workbench};
use crate::workbench::store::JsonDirStore;

#[derive(Debug, Snafu)]
pub enum ToolError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading CSV file {path}"))]
    CsvParse { source: csv::Error, path: String },
    #[snafu(display("Error writing CSV output"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no worksheet {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing JSON"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output"))]
    WritingOutput { source: std::io::Error },
    #[snafu(display("Error accessing the row store at {path}"))]
    StoreIo {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Corrupted row store entry {key}"))]
    StoreFormat {
        source: serde_json::Error,
        key: String,
    },
    #[snafu(display("No stored rows for site {site}"))]
    UnknownSite { site: String },
    #[snafu(display("No role {role} stored for site {site}"))]
    UnknownRole { site: String, role: String },
    #[snafu(display("Unknown field {field}"))]
    UnknownField { field: String },
    #[snafu(display("Unknown column attribute {name} in the configuration"))]
    UnknownAttribute {
        source: capability_consolidation::columns::UnknownAttribute,
        name: String,
    },
    #[snafu(display("Field {field} expects a number, got {value:?}"))]
    InvalidScore { field: String, value: String },
    #[snafu(display("No input files: use --input or the sourceFiles of a configuration file"))]
    NoInput {},
    #[snafu(display("No row store: use --store or the storeDirectory of a configuration file"))]
    MissingStore {},
    #[snafu(display("Difference detected between the consolidation and the reference"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Where the rows of a run come from.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct InputOptions {
    pub config: Option<String>,
    pub inputs: Vec<String>,
    pub input_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
}

/// Where the working rows are kept.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct StoreOptions {
    pub store: Option<String>,
    pub config: Option<String>,
}

fn read_optional_config(path: &Option<String>) -> ToolResult<Option<ToolConfig>> {
    match path {
        Some(p) => read_config(p).map(Some),
        None => Ok(None),
    }
}

fn read_source(cfs: &FileSource, forced: Option<InputType>) -> ToolResult<SiteFileGroup> {
    let input_type = match (forced, cfs.provider.as_deref()) {
        (Some(t), _) => t,
        (None, Some(p)) => p.parse::<InputType>()?,
        (None, None) => InputType::from_path(&cfs.file_path),
    };
    info!(
        "Attempting to read {:?} file {:?}",
        input_type, cfs.file_path
    );
    let rows = match input_type {
        InputType::Csv => io_csv::read_csv_rows(&cfs.file_path)?,
        InputType::Excel => {
            io_excel::read_excel_rows(&cfs.file_path, cfs.worksheet_name.as_deref())?
        }
    };
    Ok(SiteFileGroup::new(simplify_file_name(&cfs.file_path), rows))
}

/// Reads every input file of the run, in order.
pub fn load_sources(opts: &InputOptions) -> ToolResult<(Option<ToolConfig>, Vec<SiteFileGroup>)> {
    let config = read_optional_config(&opts.config)?;
    let forced: Option<InputType> = match &opts.input_type {
        Some(s) => Some(s.parse::<InputType>()?),
        None => None,
    };

    let sources: Vec<FileSource> = if !opts.inputs.is_empty() {
        if config.as_ref().map_or(false, |c| !c.source_files.is_empty()) {
            warn!("Input files given on the command line, ignoring the configured source files");
        }
        opts.inputs
            .iter()
            .map(|p| FileSource::new(p, opts.excel_worksheet_name.clone()))
            .collect()
    } else {
        config
            .as_ref()
            .map(|c| c.source_files.clone())
            .unwrap_or_default()
    };
    ensure!(!sources.is_empty(), NoInputSnafu {});

    let mut groups: Vec<SiteFileGroup> = Vec::new();
    for cfs in sources.iter() {
        groups.push(read_source(cfs, forced)?);
    }
    Ok((config, groups))
}

fn consolidator_for(config: &Option<ToolConfig>) -> ToolResult<Consolidator> {
    match config {
        Some(c) => c.consolidator(),
        None => Ok(Consolidator::default()),
    }
}

/// Reads the inputs and runs the consolidation.
pub fn consolidate_inputs(
    opts: &InputOptions,
) -> ToolResult<(Option<ToolConfig>, Vec<ConsolidatedRow>)> {
    let (config, groups) = load_sources(opts)?;
    let consolidator = consolidator_for(&config)?;
    let rows = consolidator.run(&groups);
    Ok((config, rows))
}

fn open_output(destination: &str) -> ToolResult<Box<dyn Write>> {
    if destination == "stdout" || destination.is_empty() {
        Ok(Box::new(io::stdout()))
    } else {
        let f = File::create(destination).context(OpeningFileSnafu { path: destination })?;
        Ok(Box::new(f))
    }
}

fn check_reference(reference_path: &str, pretty_js: &str) -> ToolResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(WritingJsonSnafu {})?;
    if pretty_reference != pretty_js {
        warn!("Found differences with the reference file {:?}", reference_path);
        print_diff(pretty_reference.as_str(), pretty_js, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("Output matches the reference {:?}", reference_path);
    Ok(())
}

pub fn run_consolidate(
    opts: &InputOptions,
    out: Option<String>,
    format: Option<String>,
    reference: Option<String>,
) -> ToolResult<()> {
    let (config, consolidated) = consolidate_inputs(opts)?;
    let settings = config.map(|c| c.output_settings).unwrap_or_default();

    // Everything leaving the tool is scrubbed.
    let mut rows: Vec<PersistedRow> = consolidated.iter().map(PersistedRow::from).collect();
    sanitize_rows(&mut rows);

    let destination = out
        .or(settings.output_path)
        .unwrap_or_else(|| "stdout".to_string());
    let format = OutputFormat::select(
        format.or(settings.format).as_deref(),
        &destination,
        OutputFormat::Json,
    )?;
    debug!(
        "run_consolidate: {} row(s) as {:?} to {:?}",
        rows.len(),
        format,
        destination
    );

    let mut writer = open_output(&destination)?;
    if format == OutputFormat::Json {
        // Notes belong to the store only. Going through a JSON value gives the same key
        // order as the parsed reference.
        let plain: Vec<ConsolidatedRow> = rows.iter().map(ConsolidatedRow::from).collect();
        let js = serde_json::to_value(&plain).context(WritingJsonSnafu {})?;
        let pretty_js = serde_json::to_string_pretty(&js).context(WritingJsonSnafu {})?;
        writeln!(writer, "{}", pretty_js).context(WritingOutputSnafu {})?;
        if let Some(reference_path) = reference {
            check_reference(&reference_path, &pretty_js)?;
        }
    } else {
        if reference.is_some() {
            whatever!("A reference can only be checked against the json format");
        }
        export::write_rows(format, &rows, &mut writer)?;
    }
    writer.flush().context(WritingOutputSnafu {})?;
    Ok(())
}

fn open_workbench(opts: &StoreOptions) -> ToolResult<Workbench<JsonDirStore>> {
    let config = read_optional_config(&opts.config)?;
    let dir = opts
        .store
        .clone()
        .or_else(|| config.and_then(|c| c.store_directory))
        .context(MissingStoreSnafu {})?;
    let store = JsonDirStore::open(Path::new(&dir))?;
    Ok(Workbench::new(store))
}

pub fn run_update(opts: &InputOptions, store: Option<String>) -> ToolResult<()> {
    let (_, consolidated) = consolidate_inputs(opts)?;
    let mut workbench = open_workbench(&StoreOptions {
        store,
        config: opts.config.clone(),
    })?;
    let summary = workbench.update_tool_data(&consolidated)?;
    println!(
        "Updated {} site(s): {} row(s) added, {} row(s) updated",
        summary.sites, summary.added, summary.updated
    );
    Ok(())
}

pub fn run_show(opts: &StoreOptions, site: Option<String>) -> ToolResult<()> {
    let workbench = open_workbench(opts)?;
    let sites: Vec<(String, Vec<PersistedRow>)> = match site {
        Some(s) => {
            let rows = workbench.load_rows_for_site(&s)?;
            ensure!(!rows.is_empty(), UnknownSiteSnafu { site: s.clone() });
            vec![(s, rows)]
        }
        None => workbench.load_all()?,
    };
    if sites.is_empty() {
        println!("The row store is empty");
    }
    for (name, rows) in sites.iter() {
        println!("{}", display::render_site(name, rows));
    }
    Ok(())
}

pub fn run_edit(
    opts: &StoreOptions,
    site: &str,
    role: &str,
    field: &str,
    value: &str,
) -> ToolResult<()> {
    let field: EditableField = field.parse()?;
    let mut workbench = open_workbench(opts)?;
    let row = workbench.edit_field(site, role, field, value)?;
    println!("{}", display::render_site(site, &[row]));
    Ok(())
}

pub fn run_export(opts: &StoreOptions, out: &str, format: Option<String>) -> ToolResult<()> {
    let format = OutputFormat::select(format.as_deref(), out, OutputFormat::Csv)?;
    let workbench = open_workbench(opts)?;
    let mut writer = open_output(out)?;
    let count = workbench.export_all(format, &mut writer)?;
    writer.flush().context(WritingOutputSnafu {})?;
    info!("Exported {} row(s) to {:?}", count, out);
    Ok(())
}

pub fn run_scrub(opts: &StoreOptions) -> ToolResult<()> {
    let mut workbench = open_workbench(opts)?;
    let changed = workbench.scrub_all()?;
    println!("Scrubbed {} row(s)", changed);
    Ok(())
}
