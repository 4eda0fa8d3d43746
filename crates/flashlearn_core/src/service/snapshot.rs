//! Portable snapshot export and import parsing.
//!
//! # Responsibility
//! - Project the current collections and cards into a JSON backup document.
//! - Decode and validate an incoming backup document before it replaces
//!   state.
//!
//! # Invariants
//! - Export never mutates state.
//! - A document is accepted only when it holds both `collections` and
//!   `cards` arrays whose elements decode to the data model.
//! - `exportedAt` is ignored on import.

use crate::model::card::Card;
use crate::model::collection::Collection;
use crate::model::state::StudyState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BACKUP_FILE_PREFIX: &str = "flashlearn-backup";

/// Snapshot rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Input is not well-formed JSON.
    Parse(String),
    /// JSON is well-formed but does not have the snapshot shape.
    Format(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "snapshot is not valid JSON: {message}"),
            Self::Format(message) => write!(f, "snapshot has an invalid format: {message}"),
        }
    }
}

impl Error for SnapshotError {}

/// Backup document exchanged by export/import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub collections: Vec<Collection>,
    pub cards: Vec<Card>,
    pub exported_at: DateTime<Utc>,
}

impl SnapshotDocument {
    /// Renders the document as two-space indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Validated import payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSnapshot {
    pub collections: Vec<Collection>,
    pub cards: Vec<Card>,
}

/// Builds a backup document from current state.
pub fn export_snapshot(state: &StudyState, exported_at: DateTime<Utc>) -> SnapshotDocument {
    SnapshotDocument {
        collections: state.collections().values().cloned().collect(),
        cards: state.cards().values().cloned().collect(),
        exported_at,
    }
}

/// Parses backup text into collections and cards.
///
/// # Errors
/// - `SnapshotError::Parse` when `text` is not JSON.
/// - `SnapshotError::Format` when either array is missing or an element
///   does not decode.
pub fn parse_snapshot(text: &str) -> Result<ImportedSnapshot, SnapshotError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| SnapshotError::Parse(err.to_string()))?;

    let Value::Object(mut fields) = value else {
        return Err(SnapshotError::Format(
            "expected a JSON object with `collections` and `cards`".to_string(),
        ));
    };

    let collections = take_array(&mut fields, "collections")?;
    let cards = take_array(&mut fields, "cards")?;

    let collections: Vec<Collection> = serde_json::from_value(Value::Array(collections))
        .map_err(|err| SnapshotError::Format(format!("invalid collection entry: {err}")))?;
    let cards: Vec<Card> = serde_json::from_value(Value::Array(cards))
        .map_err(|err| SnapshotError::Format(format!("invalid card entry: {err}")))?;

    Ok(ImportedSnapshot { collections, cards })
}

/// Suggested file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}-{}.json", date.format("%Y-%m-%d"))
}

fn take_array(
    fields: &mut serde_json::Map<String, Value>,
    name: &str,
) -> Result<Vec<Value>, SnapshotError> {
    match fields.remove(name) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(SnapshotError::Format(format!("`{name}` must be an array"))),
        None => Err(SnapshotError::Format(format!("missing `{name}` array"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, parse_snapshot, SnapshotError};
    use chrono::NaiveDate;

    #[test]
    fn rejects_non_json_as_parse_error() {
        assert!(matches!(
            parse_snapshot("not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn rejects_missing_arrays_as_format_error() {
        assert!(matches!(
            parse_snapshot(r#"{"foo":1}"#),
            Err(SnapshotError::Format(_))
        ));
        assert!(matches!(
            parse_snapshot(r#"{"collections":[]}"#),
            Err(SnapshotError::Format(_))
        ));
        assert!(matches!(
            parse_snapshot(r#"{"collections":{},"cards":[]}"#),
            Err(SnapshotError::Format(_))
        ));
        assert!(matches!(parse_snapshot("[]"), Err(SnapshotError::Format(_))));
    }

    #[test]
    fn rejects_malformed_card_entry() {
        let text = r#"{"collections":[],"cards":[{"id":"x"}]}"#;
        let err = parse_snapshot(text).unwrap_err();
        assert!(matches!(err, SnapshotError::Format(message) if message.contains("card")));
    }

    #[test]
    fn accepts_empty_snapshot_without_exported_at() {
        let imported = parse_snapshot(r#"{"collections":[],"cards":[]}"#).unwrap();
        assert!(imported.collections.is_empty());
        assert!(imported.cards.is_empty());
    }

    #[test]
    fn backup_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        assert_eq!(backup_file_name(date), "flashlearn-backup-2024-09-03.json");
    }
}
