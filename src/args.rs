use clap::{Parser, Subcommand};

/// Consolidates per-site capability and retention assessments, and keeps the reviewed
/// working rows.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Consolidates site exports into one row per site and role, and writes the result.
    Consolidate {
        #[clap(flatten)]
        input: InputArgs,

        /// (file path, 'stdout' or empty) Where to write the consolidated rows. Overrides the
        /// output path of the --config file.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (json, csv or html) The output format. Defaults to the extension of --out, then json.
        #[clap(long, value_parser)]
        format: Option<String>,

        /// (file path) A reference file with the expected consolidation in JSON format. If
        /// provided, millcap checks that its output matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Consolidates site exports and merges the result into the row store.
    Update {
        #[clap(flatten)]
        input: InputArgs,

        /// (directory) The row store. Overrides the store directory of the --config file.
        #[clap(short, long, value_parser)]
        store: Option<String>,
    },
    /// Prints the stored rows.
    Show {
        #[clap(flatten)]
        store: StoreArgs,

        /// (site name, optional) Only print this site.
        #[clap(long, value_parser)]
        site: Option<String>,
    },
    /// Changes one field of one stored row.
    Edit {
        #[clap(flatten)]
        store: StoreArgs,

        #[clap(long, value_parser)]
        site: String,

        #[clap(long, value_parser)]
        role: String,

        /// One of roleArea, criticality, capTech, capExperience, capCrisis, capLeadComm,
        /// capSafety, retentionRisk, capabilityComment, retentionComment, notes.
        #[clap(long, value_parser)]
        field: String,

        /// The new value. An empty value clears a score.
        #[clap(long, value_parser)]
        value: String,
    },
    /// Writes every stored row to a file.
    Export {
        #[clap(flatten)]
        store: StoreArgs,

        /// (file path or 'stdout') The export destination.
        #[clap(short, long, value_parser)]
        out: String,

        /// (csv, html or json) The export format. Defaults to the extension of --out, then csv.
        #[clap(long, value_parser)]
        format: Option<String>,
    },
    /// Removes decommissioned site names from every stored row.
    Scrub {
        #[clap(flatten)]
        store: StoreArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// (file path, repeatable) A site export. When given, the source files of the --config
    /// file are ignored.
    #[clap(short, long, value_parser)]
    pub input: Vec<String>,

    /// (file path, optional) A JSON configuration file. For more information about the file
    /// format, read the manual of the capability_consolidation crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (csv or excel) The type of the inputs. Defaults to the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the
    /// worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// (directory) The row store. Overrides the store directory of the --config file.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// (file path, optional) A JSON configuration file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
}
