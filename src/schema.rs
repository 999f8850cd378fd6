//! CSV-Meta column schema: the in-memory entity and its two file layouts.
//!
//! A schema is an ordered list of table columns, each carrying a set of named
//! metafields (`type`, `size`, `title`, ...). The set of metafield names is
//! defined by the file, so each column keeps an insertion-ordered map.
//!
//! Two layouts encode the same entity:
//!
//! - **canonical**: header `name,<metafield>...`, then one row per column;
//! - **transposed**: header `,<column>...`, then one row per metafield.
//!
//! Layout only matters here, at the read/write boundary.

use anyhow::Result;
use indexmap::IndexMap;
use log::debug;

use crate::classify::ColumnClass;

/// Metafields written for every inferred column, in file order.
pub const INFERRED_METAFIELDS: [&str; 7] =
    ["type", "size", "pkey", "unit", "format", "title", "example"];

pub type Metafields = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Canonical,
    Transposed,
}

impl Orientation {
    /// Canonical files start with `name`; transposed ones with an empty cell.
    /// Anything else is not a schema file this reader understands.
    pub fn detect(header: &[String]) -> Option<Self> {
        match header.first().map(String::as_str) {
            None | Some("") => Some(Orientation::Transposed),
            Some("name") => Some(Orientation::Canonical),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    pub name: String,
    pub fields: Metafields,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Metafields::new(),
        }
    }

    pub fn metafield(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The declared `type` metafield, if present.
    pub fn declared_type(&self) -> Option<&str> {
        self.metafield("type")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaEntity {
    columns: Vec<SchemaColumn>,
}

impl SchemaEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: SchemaColumn) {
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Looks a column up by name. With duplicate names the last declaration wins.
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().rev().find(|c| c.name == name)
    }

    /// Union of all metafield names, in order of first appearance.
    pub fn metafield_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for column in &self.columns {
            for field in column.fields.keys() {
                if !names.contains(&field.as_str()) {
                    names.push(field.as_str());
                }
            }
        }
        names
    }

    /// Builds the schema written by the inference tool. Curation fields
    /// (`pkey`, `unit`, `format`, `title`) start out empty.
    pub fn from_classified(classes: &[ColumnClass]) -> Self {
        let columns = classes
            .iter()
            .map(|class| {
                let mut column = SchemaColumn::new(class.name.clone());
                for field in INFERRED_METAFIELDS {
                    let value = match field {
                        "type" => class.data_type.to_string(),
                        "size" => class.size.clone().unwrap_or_default(),
                        "example" => class.example.clone().unwrap_or_default(),
                        _ => String::new(),
                    };
                    column.fields.insert(field.to_string(), value);
                }
                column
            })
            .collect();
        Self { columns }
    }

    /// Parses a schema file given as rows, header first.
    ///
    /// Returns `Ok(None)` for an empty input or an unrecognised header; callers
    /// treat that as "no schema" rather than a failure.
    pub fn read_rows<I>(rows: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = Result<Vec<String>>>,
    {
        let mut rows = rows.into_iter();
        let Some(header) = rows.next().transpose()? else {
            return Ok(None);
        };
        let Some(orientation) = Orientation::detect(&header) else {
            debug!(
                "Unrecognised schema header starting with {:?}",
                header.first()
            );
            return Ok(None);
        };
        debug!("Reading {orientation:?} schema");

        let labels = header.into_iter().skip(1).collect::<Vec<_>>();
        let entity = match orientation {
            Orientation::Canonical => read_canonical(&labels, rows)?,
            Orientation::Transposed => read_transposed(labels, rows)?,
        };
        Ok(Some(entity))
    }

    pub fn to_rows(&self, orientation: Orientation) -> Vec<Vec<String>> {
        match orientation {
            Orientation::Canonical => self.canonical_rows(),
            Orientation::Transposed => self.transposed_rows(),
        }
    }

    fn canonical_rows(&self) -> Vec<Vec<String>> {
        let fields = self.metafield_names();
        let mut out = Vec::with_capacity(self.columns.len() + 1);
        let mut header = vec!["name".to_string()];
        header.extend(fields.iter().map(|f| f.to_string()));
        out.push(header);
        for column in &self.columns {
            let mut row = vec![column.name.clone()];
            row.extend(
                fields
                    .iter()
                    .map(|f| column.metafield(f).unwrap_or_default().to_string()),
            );
            out.push(row);
        }
        out
    }

    fn transposed_rows(&self) -> Vec<Vec<String>> {
        let fields = self.metafield_names();
        let mut out = Vec::with_capacity(fields.len() + 1);
        let mut header = vec![String::new()];
        header.extend(self.columns.iter().map(|c| c.name.clone()));
        out.push(header);
        for field in fields {
            let mut row = vec![field.to_string()];
            row.extend(
                self.columns
                    .iter()
                    .map(|c| c.metafield(field).unwrap_or_default().to_string()),
            );
            out.push(row);
        }
        out
    }
}

fn read_canonical<I>(metafield_names: &[String], rows: I) -> Result<SchemaEntity>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    let mut entity = SchemaEntity::new();
    for row in rows {
        let mut cells = row?.into_iter();
        let Some(name) = cells.next() else {
            continue;
        };
        let mut column = SchemaColumn::new(name);
        for (field, value) in metafield_names.iter().zip(cells) {
            column.fields.insert(field.clone(), value);
        }
        entity.push(column);
    }
    Ok(entity)
}

fn read_transposed<I>(column_names: Vec<String>, rows: I) -> Result<SchemaEntity>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    let mut entity = SchemaEntity {
        columns: column_names.into_iter().map(SchemaColumn::new).collect(),
    };
    for row in rows {
        let mut cells = row?.into_iter();
        let Some(field) = cells.next() else {
            continue;
        };
        for (column, value) in entity.columns.iter_mut().zip(cells) {
            column.fields.insert(field.clone(), value);
        }
    }
    Ok(entity)
}
