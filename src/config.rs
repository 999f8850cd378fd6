//! Immutable run configuration, built once from the parsed command line and
//! then handed to each stage by reference.

use std::path::{Path, PathBuf};

use anyhow::Result;
use encoding_rs::UTF_8;
use log::warn;

use crate::{
    cli::{CharsetErrorMode, CommonArgs, Meta2CsvtCli, MkmetaCli},
    csvt::{destination_for, resolve_paths},
    error::UsageError,
    io_utils::{Charset, RowTerminator, is_dash, resolve_charset},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: u8,
    pub terminator: RowTerminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    pub charset: Charset,
    pub error_mode: CharsetErrorMode,
    pub dialect: CsvDialect,
    pub cell_width_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub charset: Charset,
    pub error_mode: CharsetErrorMode,
    pub dialect: CsvDialect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFormat {
    #[default]
    Canonical,
    Transposed,
    Archive,
}

#[derive(Debug, Clone)]
pub struct MkmetaConfig {
    pub input_path: PathBuf,
    /// Path the sidecar names are derived from: `-o` if given, else the
    /// input, with `stdin` standing in for `-`.
    pub table_path: PathBuf,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub row_limit: Option<usize>,
    pub format: SchemaFormat,
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct CsvtConfig {
    pub schema_path: PathBuf,
    /// `None` writes to stdout.
    pub destination: Option<PathBuf>,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub overwrite: bool,
}

impl MkmetaConfig {
    pub fn from_cli(cli: &MkmetaCli, input_path: &Path) -> Result<Self> {
        let (input, output) = io_configs(&cli.common)?;
        let table_path = match &cli.common.output {
            Some(path) => path.clone(),
            None if is_dash(input_path) => PathBuf::from("stdin"),
            None => input_path.to_path_buf(),
        };
        Ok(Self {
            input_path: input_path.to_path_buf(),
            table_path,
            input,
            output,
            row_limit: cli.max_rows_in.as_option(),
            format: cli.format.unwrap_or_default(),
            overwrite: cli.common.overwrite,
        })
    }
}

impl CsvtConfig {
    pub fn from_cli(cli: &Meta2CsvtCli, input_path: &Path) -> Result<Self> {
        let (input, output) = io_configs(&cli.common)?;
        let schema_path = if is_dash(input_path) {
            input_path.to_path_buf()
        } else {
            resolve_paths(input_path).schema
        };
        Ok(Self {
            schema_path,
            destination: destination_for(input_path, cli.common.output.as_deref(), cli.stdout),
            input,
            output,
            overwrite: cli.common.overwrite,
        })
    }
}

/// Resolves the charsets, error modes and dialects shared by both tools.
pub fn io_configs(args: &CommonArgs) -> Result<(InputConfig, OutputConfig)> {
    let input_charset = resolve_charset(&args.charset_in)?;
    let output_charset = match &args.charset_out {
        Some(label) => {
            let charset = resolve_charset(label)?;
            if !charset.is_encodable() {
                return Err(UsageError::UnencodableCharset(label.clone()).into());
            }
            charset
        }
        None => default_output_charset(input_charset),
    };

    let input = InputConfig {
        charset: input_charset,
        error_mode: resolve_error_mode(args.charset_in_error_mode, args.charset_error_mode),
        dialect: CsvDialect {
            delimiter: args.separator_in,
            terminator: args.terminator_in,
        },
        cell_width_limit: (args.cell_width_limit > 0).then_some(args.cell_width_limit),
    };
    let output = OutputConfig {
        charset: output_charset,
        error_mode: resolve_error_mode(args.charset_out_error_mode, args.charset_error_mode),
        dialect: CsvDialect {
            delimiter: args.separator_out,
            terminator: args.terminator_out,
        },
    };
    Ok((input, output))
}

pub fn resolve_error_mode(
    specific: Option<CharsetErrorMode>,
    shared: Option<CharsetErrorMode>,
) -> CharsetErrorMode {
    specific.or(shared).unwrap_or_default()
}

/// Output follows the input encoding, minus any byte-order mark.
pub fn default_output_charset(input: Charset) -> Charset {
    let charset = Charset {
        bom: false,
        ..input
    };
    if charset.is_encodable() {
        charset
    } else {
        warn!(
            "Output cannot be encoded as {}; writing UTF-8 instead",
            input.encoding.name()
        );
        Charset::plain(UTF_8)
    }
}
