//! Case-level progress log (`Report,Path,Done`)
//!
//! External table consumed by the session controller; the only cell it
//! owns is `Done`, flipped to `True` on clean session close.

use marklog_store::atomic_write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEADER: [&str; 3] = ["Report", "Path", "Done"];

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to read progress log")]
    Io(#[from] std::io::Error),
    #[error("malformed progress log: {0}")]
    Malformed(String),
    #[error("case {0:?} not present in progress log")]
    UnknownCase(String),
}

/// One case: identifier, session folder path, done flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    pub case_id: String,
    pub session_folder: String,
    pub done: bool,
}

#[derive(Debug)]
pub struct ProgressLog {
    path: PathBuf,
    rows: Vec<ProgressRow>,
}

impl ProgressLog {
    pub fn load(path: &Path) -> Result<Self, ProgressError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ProgressError::Malformed(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| ProgressError::Malformed(e.to_string()))?;
        if headers.iter().ne(HEADER) {
            return Err(ProgressError::Malformed(format!(
                "unexpected header: {:?}",
                headers
            )));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ProgressError::Malformed(e.to_string()))?;
            if record.len() < 2 {
                return Err(ProgressError::Malformed(format!(
                    "row with {} fields",
                    record.len()
                )));
            }
            rows.push(ProgressRow {
                case_id: record[0].to_string(),
                session_folder: record[1].to_string(),
                done: record.get(2).is_some_and(|d| d == "True"),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn rows(&self) -> &[ProgressRow] {
        &self.rows
    }

    pub fn get(&self, case_id: &str) -> Option<&ProgressRow> {
        self.rows.iter().find(|r| r.case_id == case_id)
    }

    /// Flip a case's done cell. Persisted by `save`.
    pub fn mark_done(&mut self, case_id: &str) -> Result<(), ProgressError> {
        match self.rows.iter_mut().find(|r| r.case_id == case_id) {
            Some(row) => {
                row.done = true;
                Ok(())
            }
            None => Err(ProgressError::UnknownCase(case_id.to_string())),
        }
    }

    /// Atomic rewrite of the whole table
    pub fn save(&self) -> Result<(), ProgressError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(HEADER)
            .map_err(|e| ProgressError::Malformed(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record([
                    row.case_id.as_str(),
                    row.session_folder.as_str(),
                    if row.done { "True" } else { "" },
                ])
                .map_err(|e| ProgressError::Malformed(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ProgressError::Malformed(e.error().to_string()))?;
        atomic_write(&self.path, &bytes)?;
        Ok(())
    }
}
