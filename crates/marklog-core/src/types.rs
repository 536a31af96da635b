//! Markup entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Markup artifact kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupKind {
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "roi")]
    Roi,
    #[serde(rename = "line")]
    Line,
}

impl MarkupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkupKind::Point => "point",
            MarkupKind::Roi => "roi",
            MarkupKind::Line => "line",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "point" => Some(MarkupKind::Point),
            "roi" => Some(MarkupKind::Roi),
            "line" => Some(MarkupKind::Line),
            _ => None,
        }
    }

    /// Infer the kind from a markup file stem following the
    /// `{kind}_{n}` naming convention. Unknown prefixes fall back to
    /// Point so a recovered file always yields a row.
    pub fn from_file_stem(stem: &str) -> Self {
        let lower = stem.to_ascii_lowercase();
        if lower.starts_with("roi") {
            MarkupKind::Roi
        } else if lower.starts_with("line") {
            MarkupKind::Line
        } else {
            MarkupKind::Point
        }
    }
}

/// Derived row status: Active iff `deleted_at` is unset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Active,
    Deleted,
}

/// One row per distinct markup artifact ever seen in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupEntry {
    /// Stable key, unique within a session's log. Derived from the
    /// markup's in-scene unique name at creation time; re-creations
    /// after deletion get a `~N` generation suffix.
    pub identity: String,
    /// Current user-visible label (mutable)
    pub display_name: String,
    pub kind: MarkupKind,
    /// Set once at first observation
    pub created_at: DateTime<Utc>,
    /// Set at most once; deletion is monotonic within a session
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// On-disk file this markup is (or was) serialized to, if any
    #[serde(default)]
    pub source_filename: Option<String>,
}

impl MarkupEntry {
    pub fn status(&self) -> EntryStatus {
        if self.deleted_at.is_none() {
            EntryStatus::Active
        } else {
            EntryStatus::Deleted
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == EntryStatus::Active
    }

    /// In-scene name this row was keyed on, without the generation suffix
    pub fn scene_key(&self) -> &str {
        scene_key_of(&self.identity)
    }
}

/// Split an identity into its scene key and generation number
pub(crate) fn split_identity(identity: &str) -> (&str, u32) {
    if let Some((key, gen)) = identity.rsplit_once('~') {
        if let Ok(n) = gen.parse::<u32>() {
            return (key, n);
        }
    }
    (identity, 1)
}

pub(crate) fn scene_key_of(identity: &str) -> &str {
    split_identity(identity).0
}

/// Filesystem evidence for one markup file: existence and mtime only,
/// never content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupFile {
    pub file_name: String,
    pub modified_at: DateTime<Utc>,
}

impl MarkupFile {
    pub fn new(file_name: impl Into<String>, modified_at: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            modified_at,
        }
    }

    /// File stem, used as the scene key for recovered markups
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(".json")
            .unwrap_or(&self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_str_roundtrip() {
        for kind in [MarkupKind::Point, MarkupKind::Roi, MarkupKind::Line] {
            assert_eq!(MarkupKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MarkupKind::parse("mesh"), None);
    }

    #[test]
    fn test_kind_from_file_stem() {
        assert_eq!(MarkupKind::from_file_stem("roi_3"), MarkupKind::Roi);
        assert_eq!(MarkupKind::from_file_stem("line_1"), MarkupKind::Line);
        assert_eq!(MarkupKind::from_file_stem("point_2"), MarkupKind::Point);
        assert_eq!(MarkupKind::from_file_stem("pt_2"), MarkupKind::Point);
        // Unknown prefix still yields a row
        assert_eq!(MarkupKind::from_file_stem("lesion_a"), MarkupKind::Point);
    }

    #[test]
    fn test_split_identity() {
        assert_eq!(split_identity("pt_1"), ("pt_1", 1));
        assert_eq!(split_identity("pt_1~3"), ("pt_1", 3));
        // A trailing non-numeric segment is part of the key itself
        assert_eq!(split_identity("odd~name"), ("odd~name", 1));
    }

    #[test]
    fn test_entry_status_derived() {
        let mut entry = MarkupEntry {
            identity: "pt_1".to_string(),
            display_name: "pt_1".to_string(),
            kind: MarkupKind::Point,
            created_at: Utc::now(),
            deleted_at: None,
            source_filename: None,
        };
        assert_eq!(entry.status(), EntryStatus::Active);
        entry.deleted_at = Some(Utc::now());
        assert_eq!(entry.status(), EntryStatus::Deleted);
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = MarkupEntry {
            identity: "roi_1~2".to_string(),
            display_name: "Lesion A".to_string(),
            kind: MarkupKind::Roi,
            created_at: Utc::now(),
            deleted_at: Some(Utc::now()),
            source_filename: Some("roi_1.json".to_string()),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: MarkupEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
        assert_eq!(parsed.scene_key(), "roi_1");
    }

    #[test]
    fn test_markup_file_stem() {
        let file = MarkupFile::new("roi_1.json", Utc::now());
        assert_eq!(file.stem(), "roi_1");
        let bare = MarkupFile::new("notes", Utc::now());
        assert_eq!(bare.stem(), "notes");
    }
}
