pub mod classify;
pub mod cli;
pub mod config;
pub mod csvt;
pub mod decimal;
pub mod error;
pub mod io_utils;
pub mod mkmeta;
pub mod scan;
pub mod schema;
pub mod stats;
pub mod table_meta;

use std::{env, io, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{LevelFilter, debug};

use crate::{
    cli::{Meta2CsvtCli, MkmetaCli},
    config::{CsvtConfig, MkmetaConfig},
    error::UsageError,
    io_utils::is_broken_pipe,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(quiet: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if quiet {
                LevelFilter::Error
            } else {
                LevelFilter::Info
            };
            builder.filter_module("csv_metadata", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Entry point of `csv-mkmeta`.
pub fn run_mkmeta() -> Result<()> {
    let cli = MkmetaCli::parse();
    init_logging(cli.common.quiet);
    let input = require_input::<MkmetaCli>(cli.input.clone())?;
    let config = MkmetaConfig::from_cli(&cli, &input)?;
    debug!("Resolved configuration: {config:?}");
    swallow_broken_pipe(mkmeta::execute(&config))
}

/// Entry point of `csv-meta2csvt`.
pub fn run_meta2csvt() -> Result<()> {
    let cli = Meta2CsvtCli::parse();
    init_logging(cli.common.quiet);
    let input = require_input::<Meta2CsvtCli>(cli.input.clone())?;
    let config = CsvtConfig::from_cli(&cli, &input)?;
    debug!("Resolved configuration: {config:?}");
    swallow_broken_pipe(csvt::execute(&config))
}

/// Without an input path there is nothing to do; show usage on stderr.
fn require_input<C: CommandFactory>(input: Option<PathBuf>) -> Result<PathBuf> {
    match input {
        Some(path) => Ok(path),
        None => {
            C::command()
                .write_help(&mut io::stderr())
                .context("Writing help text")?;
            Err(UsageError::MissingInput.into())
        }
    }
}

fn swallow_broken_pipe(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if is_broken_pipe(&err) => {
            debug!("Output pipe closed early: {err:#}");
            Ok(())
        }
        other => other,
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
