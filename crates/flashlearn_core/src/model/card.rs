//! Card domain model.
//!
//! # Responsibility
//! - Define the front/back pair and its review scheduling state.
//! - Define the partial-update shape used by card edits.
//!
//! # Invariants
//! - `next_review_date == None` means "never reviewed, always due".
//! - `collection_id` is fixed after creation; moving cards is not supported.

use crate::model::collection::CollectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque card identifier.
pub type CardId = String;

/// Last observed recall outcome label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question/answer pair with independent review scheduling state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub collection_id: CollectionId,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub next_review_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Creates an unreviewed card with a generated id.
    ///
    /// # Invariants
    /// - `difficulty` starts as `Medium`.
    /// - `next_review_date` starts as `None`; `review_count` as `0`.
    pub fn new(
        collection_id: impl Into<CollectionId>,
        front: impl Into<String>,
        back: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection_id: collection_id.into(),
            front: front.into(),
            back: back.into(),
            difficulty: Difficulty::Medium,
            next_review_date: None,
            review_count: 0,
            created_at,
        }
    }

    /// Returns whether this card should be shown for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_date {
            None => true,
            Some(next) => next <= now,
        }
    }

    pub fn is_hard(&self) -> bool {
        self.difficulty == Difficulty::Hard
    }

    /// Merges the present fields of `patch` into this card.
    ///
    /// Callers go through `StudyState` so `hard_cards` follows any
    /// difficulty change.
    pub(crate) fn apply_patch(&mut self, patch: &CardPatch) {
        if let Some(front) = &patch.front {
            self.front = front.clone();
        }
        if let Some(back) = &patch.back {
            self.back = back.clone();
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(next_review_date) = patch.next_review_date {
            self.next_review_date = next_review_date;
        }
        if let Some(review_count) = patch.review_count {
            self.review_count = review_count;
        }
    }
}

/// Partial update for a card. `None` fields are left unchanged.
///
/// `next_review_date: Some(None)` clears the schedule and makes the card due.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub front: Option<String>,
    pub back: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub next_review_date: Option<Option<DateTime<Utc>>>,
    pub review_count: Option<u32>,
}

impl CardPatch {
    /// Patch that edits only the visible text, the common UI edit.
    pub fn text(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: Some(front.into()),
            back: Some(back.into()),
            ..Self::default()
        }
    }
}
