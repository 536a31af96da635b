//! Rich JSON workbook encoding of the markup log
//!
//! Typed named columns, multiple named tables per file. The markup log
//! occupies one `markups` table; the container leaves room for more.

use crate::codec::{CodecError, LogCodec};
use crate::flat::{parse_optional_timestamp, parse_timestamp};
use marklog_core::{MarkupEntry, MarkupKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const FORMAT_VERSION: u32 = 1;
const MARKUPS_TABLE: &str = "markups";

#[derive(Debug, Serialize, Deserialize)]
struct Workbook {
    version: u32,
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Column {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    nullable: bool,
}

impl Column {
    fn new(name: &str, kind: &str, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            nullable,
        }
    }
}

/// JSON workbook codec
pub struct RichCodec;

impl LogCodec for RichCodec {
    fn file_name(&self) -> &'static str {
        "markup_log.book.json"
    }

    fn encode(&self, rows: &[MarkupEntry]) -> Result<Vec<u8>, CodecError> {
        let columns = vec![
            Column::new("identity", "string", false),
            Column::new("display_name", "string", false),
            Column::new("kind", "string", false),
            Column::new("created_at", "timestamp", false),
            Column::new("deleted_at", "timestamp", true),
            Column::new("source_filename", "string", true),
        ];

        let rows = rows
            .iter()
            .map(|row| {
                vec![
                    Value::String(row.identity.clone()),
                    Value::String(row.display_name.clone()),
                    Value::String(row.kind.as_str().to_string()),
                    Value::String(row.created_at.to_rfc3339()),
                    row.deleted_at
                        .map(|t| Value::String(t.to_rfc3339()))
                        .unwrap_or(Value::Null),
                    row.source_filename
                        .clone()
                        .map(Value::String)
                        .unwrap_or(Value::Null),
                ]
            })
            .collect();

        let mut tables = BTreeMap::new();
        tables.insert(MARKUPS_TABLE.to_string(), Table { columns, rows });

        serde_json::to_vec_pretty(&Workbook {
            version: FORMAT_VERSION,
            tables,
        })
        .map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<MarkupEntry>, CodecError> {
        let workbook: Workbook =
            serde_json::from_slice(bytes).map_err(|e| CodecError(e.to_string()))?;
        if workbook.version != FORMAT_VERSION {
            return Err(CodecError(format!(
                "unsupported workbook version {}",
                workbook.version
            )));
        }

        let table = workbook
            .tables
            .get(MARKUPS_TABLE)
            .ok_or_else(|| CodecError(format!("missing {:?} table", MARKUPS_TABLE)))?;

        let column = |name: &str| -> Result<usize, CodecError> {
            table
                .columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| CodecError(format!("missing column {:?}", name)))
        };
        let identity = column("identity")?;
        let display_name = column("display_name")?;
        let kind = column("kind")?;
        let created_at = column("created_at")?;
        let deleted_at = column("deleted_at")?;
        let source_filename = column("source_filename")?;

        let mut entries = Vec::new();
        for row in &table.rows {
            if row.len() != table.columns.len() {
                return Err(CodecError(format!(
                    "expected {} cells, got {}",
                    table.columns.len(),
                    row.len()
                )));
            }
            let kind_str = cell_str(row, kind)?;
            entries.push(MarkupEntry {
                identity: cell_str(row, identity)?.to_string(),
                display_name: cell_str(row, display_name)?.to_string(),
                kind: MarkupKind::parse(kind_str)
                    .ok_or_else(|| CodecError(format!("unknown markup kind: {}", kind_str)))?,
                created_at: parse_timestamp(cell_str(row, created_at)?)?,
                deleted_at: parse_optional_timestamp(cell_opt_str(row, deleted_at)?)?,
                source_filename: match cell_opt_str(row, source_filename)? {
                    "" => None,
                    s => Some(s.to_string()),
                },
            });
        }
        Ok(entries)
    }
}

fn cell_str(row: &[Value], index: usize) -> Result<&str, CodecError> {
    row[index]
        .as_str()
        .ok_or_else(|| CodecError(format!("cell {} is not a string", index)))
}

/// Null cells read as the empty string, matching the flat encoding
fn cell_opt_str(row: &[Value], index: usize) -> Result<&str, CodecError> {
    match &row[index] {
        Value::Null => Ok(""),
        value => value
            .as_str()
            .ok_or_else(|| CodecError(format!("cell {} is not a string or null", index))),
    }
}
