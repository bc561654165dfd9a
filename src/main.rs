mod args;
mod workbench;

use clap::Parser;
use log::{debug, error, LevelFilter};
use std::error::Error;

use crate::args::{Args, Command};
use crate::workbench::{InputOptions, StoreOptions, ToolResult};

fn input_options(input: args::InputArgs) -> InputOptions {
    InputOptions {
        config: input.config,
        inputs: input.input,
        input_type: input.input_type,
        excel_worksheet_name: input.excel_worksheet_name,
    }
}

fn store_options(store: args::StoreArgs) -> StoreOptions {
    StoreOptions {
        store: store.store,
        config: store.config,
    }
}

fn run(command: Command) -> ToolResult<()> {
    match command {
        Command::Consolidate {
            input,
            out,
            format,
            reference,
        } => workbench::run_consolidate(&input_options(input), out, format, reference),
        Command::Update { input, store } => workbench::run_update(&input_options(input), store),
        Command::Show { store, site } => workbench::run_show(&store_options(store), site),
        Command::Edit {
            store,
            site,
            role,
            field,
            value,
        } => workbench::run_edit(&store_options(store), &site, &role, &field, &value),
        Command::Export { store, out, format } => {
            workbench::run_export(&store_options(store), &out, format)
        }
        Command::Scrub { store } => workbench::run_scrub(&store_options(store)),
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = run(args.command) {
        error!("{}", e);
        let mut source = e.source();
        while let Some(s) = source {
            error!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
