//! Collection domain model.
//!
//! # Responsibility
//! - Define a named group of cards and its partial-update shape.
//!
//! # Invariants
//! - `id` is opaque and never reused for another collection.
//! - `card_count` is a denormalized cache, written only by `StudyState`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque collection identifier.
///
/// Imported snapshots may carry ids minted elsewhere, so this stays a string.
pub type CollectionId = String;

/// Named group of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Number of cards whose `collection_id` matches `id`.
    #[serde(default)]
    pub card_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    /// Creates an empty collection with a generated id.
    ///
    /// Name validation (non-blank after trim) is the caller's contract.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            card_count: 0,
            created_at,
        }
    }

    /// Merges the present fields of `patch` into this collection.
    pub fn apply_patch(&mut self, patch: &CollectionPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
    }
}

/// Partial update for a collection. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, CollectionPatch};
    use chrono::{TimeZone, Utc};

    #[test]
    fn patch_merges_only_present_fields() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut collection = Collection::new("Verbs", "irregular", created_at);
        collection.apply_patch(&CollectionPatch {
            name: Some("Verbs II".to_string()),
            description: None,
        });

        assert_eq!(collection.name, "Verbs II");
        assert_eq!(collection.description, "irregular");
        assert_eq!(collection.card_count, 0);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let collection = Collection::new("Verbs", "", created_at);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(value["cardCount"], 0);
        assert_eq!(value["createdAt"], "2024-03-01T09:00:00Z");
        assert!(value.get("card_count").is_none());
    }
}
