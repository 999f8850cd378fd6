use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};

use crate::{
    config::SchemaFormat,
    io_utils::{DEFAULT_CELL_WIDTH_LIMIT, RowTerminator},
};

#[derive(Debug, Parser)]
#[command(
    name = "csv-mkmeta",
    version,
    about = "Infer a CSV-Meta column schema and table metadata from a CSV file",
    long_about = None,
    disable_help_flag = true
)]
pub struct MkmetaCli {
    /// Input CSV table (`-` reads stdin)
    pub input: Option<PathBuf>,
    /// Maximum number of data rows to analyse (`all` scans the whole table)
    #[arg(short = 'N', long = "max-rows-in", value_parser = parse_row_limit, default_value = "all")]
    pub max_rows_in: RowLimit,
    /// Schema layout: `transposed`, `archive`, or canonical when unset
    #[arg(long, value_parser = parse_format)]
    pub format: Option<SchemaFormat>,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Parser)]
#[command(
    name = "csv-meta2csvt",
    version,
    about = "Translate a CSV-Meta column schema into a .csvt type-hint file",
    long_about = None,
    disable_help_flag = true
)]
pub struct Meta2CsvtCli {
    /// CSV-Meta schema file, or the table it describes
    pub input: Option<PathBuf>,
    /// Write the type hints to stdout instead of the .csvt file
    #[arg(short = 'c', long = "stdout")]
    pub stdout: bool,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Output path (table path for csv-mkmeta, .csvt path for csv-meta2csvt)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Character encoding of the input
    #[arg(
        short = 'E',
        long = "charset-in",
        visible_alias = "encoding-in",
        default_value = "utf-8-sig"
    )]
    pub charset_in: String,
    /// Character encoding of the output (defaults to the input encoding)
    #[arg(short = 'e', long = "charset-out", visible_alias = "encoding-out")]
    pub charset_out: Option<String>,
    /// How to handle undecodable input bytes
    #[arg(long = "charset-in-error-mode", value_enum)]
    pub charset_in_error_mode: Option<CharsetErrorMode>,
    /// How to handle characters the output encoding cannot represent
    #[arg(long = "charset-out-error-mode", value_enum)]
    pub charset_out_error_mode: Option<CharsetErrorMode>,
    /// Error mode for both directions unless overridden
    #[arg(long = "charset-error-mode", value_enum)]
    pub charset_error_mode: Option<CharsetErrorMode>,
    /// Input field separator (supports ',', 'tab', ';', '|', 'space')
    #[arg(
        short = 'S',
        long = "separator-in",
        visible_alias = "delimiter-in",
        value_parser = parse_delimiter,
        default_value = ","
    )]
    pub separator_in: u8,
    /// Output field separator
    #[arg(
        short = 's',
        long = "separator-out",
        visible_alias = "delimiter-out",
        value_parser = parse_delimiter,
        default_value = ","
    )]
    pub separator_out: u8,
    /// Input row terminator (`std` accepts any line break)
    #[arg(
        short = 'W',
        long = "terminator-in",
        visible_aliases = ["newline-in", "endline-in"],
        value_parser = parse_terminator,
        default_value = "std"
    )]
    pub terminator_in: RowTerminator,
    /// Output row terminator (`std` is the platform line break)
    #[arg(
        short = 'w',
        long = "terminator-out",
        visible_aliases = ["newline-out", "endline-out"],
        value_parser = parse_terminator,
        default_value = "std"
    )]
    pub terminator_out: RowTerminator,
    /// Longest cell accepted, in characters (0 disables the check)
    #[arg(long = "cell-width-limit", default_value_t = DEFAULT_CELL_WIDTH_LIMIT)]
    pub cell_width_limit: usize,
    /// Replace existing output files
    #[arg(short = 'f', long = "overwrite")]
    pub overwrite: bool,
    /// Only report errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
    /// Print help
    #[arg(short = '?', long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum CharsetErrorMode {
    #[default]
    Strict,
    Replace,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    All,
    Rows(usize),
}

impl RowLimit {
    pub fn as_option(self) -> Option<usize> {
        match self {
            RowLimit::All => None,
            RowLimit::Rows(n) => Some(n),
        }
    }
}

pub fn parse_row_limit(value: &str) -> Result<RowLimit, String> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(RowLimit::All);
    }
    value
        .trim()
        .parse::<usize>()
        .map(RowLimit::Rows)
        .map_err(|_| format!("Expected 'all' or a non-negative row count, got '{value}'"))
}

pub fn parse_format(value: &str) -> Result<SchemaFormat, String> {
    Ok(match value.trim().to_ascii_lowercase().as_str() {
        "transposed" => SchemaFormat::Transposed,
        "archive" => SchemaFormat::Archive,
        _ => SchemaFormat::Canonical,
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        "space" | " " => Ok(b' '),
        other => single_ascii(other, "Separator"),
    }
}

pub fn parse_terminator(value: &str) -> Result<RowTerminator, String> {
    match value {
        "std" => Ok(RowTerminator::Standard),
        "crlf" | "\\r\\n" | "\r\n" => Ok(RowTerminator::Crlf),
        "lf" | "\\n" | "\n" => Ok(RowTerminator::Byte(b'\n')),
        "cr" | "\\r" | "\r" => Ok(RowTerminator::Byte(b'\r')),
        other => single_ascii(other, "Terminator").map(RowTerminator::Byte),
    }
}

fn single_ascii(value: &str, what: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    let first = chars
        .next()
        .ok_or_else(|| format!("{what} cannot be empty"))?;
    if chars.next().is_some() {
        return Err(format!("{what} must be a single character"));
    }
    if !first.is_ascii() {
        return Err(format!("{what} must be ASCII"));
    }
    Ok(first as u8)
}
