//! The table-level `.meta.csv` companion file: a fixed list of `name,value`
//! pairs, of which only `charset` and `name` are filled in automatically.

use crate::io_utils::Charset;

pub const TABLE_META_FIELDS: [&str; 15] = [
    "charset",
    "name",
    "title",
    "subject",
    "subject_title",
    "description",
    "revision",
    "release_time",
    "start_time",
    "end_time",
    "time",
    "source_name",
    "source_title",
    "source_url",
    "notes",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub charset: String,
    pub name: String,
}

impl TableMeta {
    pub fn new(charset: &Charset, table_name: impl Into<String>) -> Self {
        Self {
            charset: charset_label(charset),
            name: table_name.into(),
        }
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        match field {
            "charset" => Some(self.charset.as_str()),
            "name" => Some(self.name.as_str()),
            _ => None,
        }
    }

    /// One `field,value` row per table metafield, optionally preceded by a
    /// `name,value` header row.
    pub fn to_rows(&self, with_header: bool) -> Vec<Vec<String>> {
        let header = with_header.then(|| vec!["name".to_string(), "value".to_string()]);
        header
            .into_iter()
            .chain(TABLE_META_FIELDS.iter().map(|field| {
                vec![
                    field.to_string(),
                    self.value(field).unwrap_or_default().to_string(),
                ]
            }))
            .collect()
    }
}

/// The charset's alias if it has one, otherwise the upper-cased WHATWG name
/// of its encoding, e.g. `UTF-8`, `WINDOWS-1252`.
pub fn charset_label(charset: &Charset) -> String {
    charset.alias.map_or_else(
        || charset.encoding.name().to_ascii_uppercase(),
        str::to_string,
    )
}
