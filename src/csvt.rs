//! `csv-meta2csvt`: reduce a CSV-Meta schema to the single-row `.csvt`
//! type-hint sidecar used by OGR-style CSV readers.

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    config::CsvtConfig,
    error::UsageError,
    io_utils::{OutputClaim, claim_output, is_dash, open_csv_writer, open_records, write_rows},
    schema::SchemaEntity,
};

const SCHEMA_SUFFIX: &str = "schema";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvtType {
    String,
    Integer,
    Real,
}

impl CsvtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CsvtType::String => "String",
            CsvtType::Integer => "Integer",
            CsvtType::Real => "Real",
        }
    }
}

impl fmt::Display for CsvtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the declared type name.
pub fn csvt_type(declared: Option<&str>) -> CsvtType {
    match declared {
        Some("int" | "integer") => CsvtType::Integer,
        Some("float" | "numeric" | "decimal") => CsvtType::Real,
        _ => CsvtType::String,
    }
}

/// One token per declared column, in declaration order.
pub fn translate(entity: &SchemaEntity) -> Vec<CsvtType> {
    entity
        .columns()
        .iter()
        .map(|column| {
            let declared = entity
                .column(&column.name)
                .and_then(|c| c.declared_type());
            csvt_type(declared)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvtPaths {
    pub schema: PathBuf,
    pub csvt: PathBuf,
}

/// `X.schema.csv` reads itself and writes `X.csvt`; a table `X.csv` reads
/// its `X.schema.csv` sibling and also writes `X.csvt`.
pub fn resolve_paths(input: &Path) -> CsvtPaths {
    let base = input.with_extension("");
    if base.extension().is_some_and(|ext| ext == SCHEMA_SUFFIX) {
        return CsvtPaths {
            schema: input.to_path_buf(),
            csvt: base.with_extension("csvt"),
        };
    }
    let mut schema = OsString::from(base.as_os_str());
    schema.push(".");
    schema.push(SCHEMA_SUFFIX);
    if let Some(ext) = input.extension() {
        schema.push(".");
        schema.push(ext);
    }
    let mut csvt = OsString::from(base.as_os_str());
    csvt.push(".csvt");
    CsvtPaths {
        schema: PathBuf::from(schema),
        csvt: PathBuf::from(csvt),
    }
}

pub fn execute(config: &CsvtConfig) -> Result<()> {
    let claim = match &config.destination {
        Some(path) => {
            let claim = claim_output(path, config.overwrite);
            if claim == OutputClaim::Skip {
                return Err(UsageError::OutputExists(path.clone()).into());
            }
            Some(claim)
        }
        None => None,
    };

    let records = open_records(&config.schema_path, &config.input)?;
    let Some(entity) = SchemaEntity::read_rows(records)
        .with_context(|| format!("Reading schema {:?}", config.schema_path))?
    else {
        warn!(
            "'{}' is not a CSV-Meta schema; nothing written",
            config.schema_path.display()
        );
        return Ok(());
    };

    let row = translate(&entity)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if claim == Some(OutputClaim::Overwrite)
        && let Some(path) = &config.destination
    {
        info!("Overwriting existing file {}", path.display());
    }
    let mut writer = open_csv_writer(config.destination.as_deref(), &config.output)?;
    write_rows(&mut writer, &[row]).context("Writing type hints")?;
    if claim == Some(OutputClaim::Create)
        && let Some(path) = &config.destination
    {
        info!("Created file: {}", path.display());
    }
    Ok(())
}

/// Where the hints go: `None` for stdout (`-c`, `-o -`, or stdin input
/// without `-o`), else `-o` or the derived `.csvt` path.
pub fn destination_for(input: &Path, output: Option<&Path>, to_stdout: bool) -> Option<PathBuf> {
    if to_stdout {
        return None;
    }
    match output {
        Some(path) if is_dash(path) => None,
        Some(path) => Some(path.to_path_buf()),
        None if is_dash(input) => None,
        None => Some(resolve_paths(input).csvt),
    }
}
