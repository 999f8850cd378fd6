//! `csv-mkmeta`: profile a table and write its `.meta.csv` and `.schema.csv`
//! companions next to it.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{Level, debug, info, log_enabled, warn};

use crate::{
    config::{MkmetaConfig, OutputConfig, SchemaFormat},
    io_utils::{OutputClaim, claim_output, open_csv_writer, open_records, write_rows},
    printable_delimiter,
    scan::{TableProfile, scan_rows},
    schema::{Orientation, SchemaEntity},
    table_meta::TableMeta,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarPaths {
    pub schema: PathBuf,
    pub meta: PathBuf,
    /// Table file name without its extension.
    pub table_name: String,
}

impl SidecarPaths {
    pub fn for_table(table_path: &Path) -> Self {
        let base = table_path.with_extension("");
        let table_name = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            schema: with_suffix(&base, ".schema.csv"),
            meta: with_suffix(&base, ".meta.csv"),
            table_name,
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes the table metadata first, since it needs nothing from the data.
/// The table is only scanned when a column schema will actually be written.
pub fn execute(config: &MkmetaConfig) -> Result<()> {
    info!(
        "Analysing '{}' with delimiter '{}'",
        config.input_path.display(),
        printable_delimiter(config.input.dialect.delimiter)
    );
    let records = open_records(&config.input_path, &config.input)?;

    let paths = SidecarPaths::for_table(&config.table_path);
    let table_meta = TableMeta::new(&config.output.charset, paths.table_name.clone());
    let meta_rows = table_meta.to_rows(config.format != SchemaFormat::Archive);
    if let Some(claim) = claim_sidecar(&paths.meta, config.overwrite) {
        write_sidecar(&paths.meta, claim, &config.output, &meta_rows)?;
    }

    let orientation = match config.format {
        SchemaFormat::Canonical => Orientation::Canonical,
        SchemaFormat::Transposed => Orientation::Transposed,
        SchemaFormat::Archive => {
            warn!(
                "Archive format has no column schema layout; skipping {}",
                paths.schema.display()
            );
            return Ok(());
        }
    };
    let Some(claim) = claim_sidecar(&paths.schema, config.overwrite) else {
        return Ok(());
    };

    let profile = scan_rows(records, config.row_limit)
        .with_context(|| format!("Scanning {:?}", config.input_path))?;
    let Some(profile) = profile else {
        warn!(
            "No header row in '{}'; column schema not written",
            config.input_path.display()
        );
        return Ok(());
    };
    info!(
        "Analysed {} row(s) across {} column(s)",
        profile.rows_scanned,
        profile.columns.len()
    );
    log_column_stats(&profile)?;

    let entity = SchemaEntity::from_classified(&profile.classify());
    write_sidecar(
        &paths.schema,
        claim,
        &config.output,
        &entity.to_rows(orientation),
    )
}

/// `None` when `path` exists and may not be overwritten.
fn claim_sidecar(path: &Path, overwrite: bool) -> Option<OutputClaim> {
    match claim_output(path, overwrite) {
        OutputClaim::Skip => {
            warn!("File already exists {}, will not overwrite.", path.display());
            None
        }
        claim => Some(claim),
    }
}

fn write_sidecar(
    path: &Path,
    claim: OutputClaim,
    output: &OutputConfig,
    rows: &[Vec<String>],
) -> Result<()> {
    if claim == OutputClaim::Overwrite {
        info!("Overwriting existing file {}", path.display());
    }
    let mut writer = open_csv_writer(Some(path), output)?;
    write_rows(&mut writer, rows).with_context(|| format!("Writing {path:?}"))?;
    if claim == OutputClaim::Create {
        info!("Created file: {}", path.display());
    }
    Ok(())
}

fn log_column_stats(profile: &TableProfile) -> Result<()> {
    if !log_enabled!(Level::Debug) {
        return Ok(());
    }
    for column in &profile.columns {
        let json = serde_json::to_string(&column.stats)
            .with_context(|| format!("Serializing statistics for '{}'", column.name))?;
        debug!("Column '{}' statistics: {json}", column.name);
    }
    Ok(())
}
