//! Flat CSV encoding of the markup log

use crate::codec::{CodecError, LogCodec};
use chrono::{DateTime, Utc};
use marklog_core::{MarkupEntry, MarkupKind};

const HEADER: [&str; 6] = [
    "identity",
    "display_name",
    "kind",
    "created_at",
    "deleted_at",
    "source_filename",
];

/// CSV codec: one row per entry, empty string for nulls, timestamps in
/// RFC 3339
pub struct FlatCodec;

impl LogCodec for FlatCodec {
    fn file_name(&self) -> &'static str {
        "markup_log.csv"
    }

    fn encode(&self, rows: &[MarkupEntry]) -> Result<Vec<u8>, CodecError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(HEADER)
            .map_err(|e| CodecError(e.to_string()))?;

        for row in rows {
            let created = row.created_at.to_rfc3339();
            let deleted = row.deleted_at.map(|t| t.to_rfc3339()).unwrap_or_default();
            writer
                .write_record([
                    row.identity.as_str(),
                    row.display_name.as_str(),
                    row.kind.as_str(),
                    created.as_str(),
                    deleted.as_str(),
                    row.source_filename.as_deref().unwrap_or(""),
                ])
                .map_err(|e| CodecError(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError(e.error().to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<MarkupEntry>, CodecError> {
        let mut reader = csv::Reader::from_reader(bytes);

        let headers = reader.headers().map_err(|e| CodecError(e.to_string()))?;
        if headers.iter().ne(HEADER) {
            return Err(CodecError(format!("unexpected header: {:?}", headers)));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| CodecError(e.to_string()))?;
            if record.len() != HEADER.len() {
                return Err(CodecError(format!(
                    "expected {} fields, got {}",
                    HEADER.len(),
                    record.len()
                )));
            }

            let kind = MarkupKind::parse(&record[2])
                .ok_or_else(|| CodecError(format!("unknown markup kind: {}", &record[2])))?;

            rows.push(MarkupEntry {
                identity: record[0].to_string(),
                display_name: record[1].to_string(),
                kind,
                created_at: parse_timestamp(&record[3])?,
                deleted_at: parse_optional_timestamp(&record[4])?,
                source_filename: if record[5].is_empty() {
                    None
                } else {
                    Some(record[5].to_string())
                },
            });
        }
        Ok(rows)
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CodecError(format!("bad timestamp {:?}: {}", s, e)))
}

pub(crate) fn parse_optional_timestamp(s: &str) -> Result<Option<DateTime<Utc>>, CodecError> {
    if s.is_empty() {
        Ok(None)
    } else {
        parse_timestamp(s).map(Some)
    }
}
