//! In-memory study state and its single mutation path.
//!
//! # Responsibility
//! - Own every `Collection` and `Card` record, keyed by id and iterated in
//!   insertion order.
//! - Apply `StateChange` values atomically while keeping derived counters
//!   (`card_count`, `total_cards`, `hard_cards`) in sync.
//! - Provide read projections (due cards, per-collection breakdown).
//!
//! # Invariants
//! - All bookkeeping lives in `StudyState::apply`; callers never touch
//!   counters directly.
//! - A rejected change leaves the state untouched.
//! - Snapshot replacement does not roll daily counters over.

use crate::model::card::{Card, CardId, CardPatch, Difficulty};
use crate::model::collection::{Collection, CollectionId, CollectionPatch};
use crate::model::stats::Stats;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reducer rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    CollectionNotFound(CollectionId),
    CardNotFound(CardId),
    DuplicateCollectionId(CollectionId),
    DuplicateCardId(CardId),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::DuplicateCollectionId(id) => write!(f, "duplicate collection id: {id}"),
            Self::DuplicateCardId(id) => write!(f, "duplicate card id: {id}"),
        }
    }
}

impl Error for StateError {}

/// One logical mutation of the study state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    AddCollection(Collection),
    PatchCollection {
        id: CollectionId,
        patch: CollectionPatch,
    },
    RemoveCollection(CollectionId),
    AddCard(Card),
    PatchCard {
        id: CardId,
        patch: CardPatch,
    },
    RemoveCard(CardId),
    ReviewCard {
        id: CardId,
        next_review_date: DateTime<Utc>,
        difficulty: Difficulty,
    },
    /// Replaces every collection and card, as done by snapshot import.
    ReplaceAll {
        collections: Vec<Collection>,
        cards: Vec<Card>,
    },
}

/// Which persisted records a change touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touched {
    pub collections: bool,
    pub cards: bool,
    pub stats: bool,
}

impl Touched {
    pub fn all() -> Self {
        Self {
            collections: true,
            cards: true,
            stats: true,
        }
    }
}

/// Record produced by a successful change.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Collection(Collection),
    Card(Card),
    CollectionRemoved(CollectionRemoval),
    CardRemoved(Card),
    Replaced { collections: usize, cards: usize },
}

/// Summary of a cascading collection delete.
///
/// Callers holding an "active collection" selection clear it when
/// `collection.id` matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRemoval {
    pub collection: Collection,
    pub removed_card_ids: Vec<CardId>,
}

/// Result of `StudyState::apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub effect: Effect,
    pub touched: Touched,
}

/// Per-collection counters for the statistics view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionBreakdown {
    pub collection_id: CollectionId,
    pub name: String,
    pub total_cards: usize,
    pub easy_count: usize,
    pub hard_count: usize,
    pub due_count: usize,
}

/// Collections keyed by id, iterated in insertion order.
pub type CollectionMap = IndexMap<CollectionId, Collection>;

/// Cards keyed by id, iterated in insertion order.
pub type CardMap = IndexMap<CardId, Card>;

/// Complete in-memory study state.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyState {
    collections: CollectionMap,
    cards: CardMap,
    stats: Stats,
}

impl StudyState {
    /// Creates an empty state whose stats belong to `today`.
    pub fn empty(today: NaiveDate) -> Self {
        Self::from_parts(Vec::new(), Vec::new(), Stats::new(today))
    }

    /// Assembles a state from persisted records without recomputing stats.
    ///
    /// A repeated id keeps its first position and its last record.
    pub fn from_parts(collections: Vec<Collection>, cards: Vec<Card>, stats: Stats) -> Self {
        Self {
            collections: collections
                .into_iter()
                .map(|collection| (collection.id.clone(), collection))
                .collect(),
            cards: cards.into_iter().map(|card| (card.id.clone(), card)).collect(),
            stats,
        }
    }

    pub fn collections(&self) -> &CollectionMap {
        &self.collections
    }

    pub fn cards(&self) -> &CardMap {
        &self.cards
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.get(id)
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Resets daily counters if `today` is a new calendar day.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        self.stats.roll_over(today)
    }

    /// Applies one change atomically.
    ///
    /// Every change except `ReplaceAll` first rolls daily counters over to
    /// `today`.
    ///
    /// # Errors
    /// - `CollectionNotFound` / `CardNotFound` when the target id is absent.
    /// - `DuplicateCollectionId` / `DuplicateCardId` when an insert or
    ///   replacement would produce two records with the same id.
    pub fn apply(&mut self, change: StateChange, today: NaiveDate) -> Result<Applied, StateError> {
        let replacing = matches!(change, StateChange::ReplaceAll { .. });
        // Validate first so a rejected change leaves no rollover behind.
        self.validate(&change)?;

        let mut touched = Touched::default();
        if !replacing && self.stats.roll_over(today) {
            touched.stats = true;
        }

        let effect = match change {
            StateChange::AddCollection(collection) => {
                touched.collections = true;
                let mut collection = collection;
                collection.card_count = 0;
                self.collections
                    .insert(collection.id.clone(), collection.clone());
                Effect::Collection(collection)
            }
            StateChange::PatchCollection { id, patch } => {
                touched.collections = true;
                let collection = self.collection_mut(&id)?;
                collection.apply_patch(&patch);
                Effect::Collection(collection.clone())
            }
            StateChange::RemoveCollection(id) => {
                touched.collections = true;
                let removal = self.remove_collection(&id)?;
                if !removal.removed_card_ids.is_empty() {
                    touched.cards = true;
                    touched.stats = true;
                }
                Effect::CollectionRemoved(removal)
            }
            StateChange::AddCard(card) => {
                touched.collections = true;
                touched.cards = true;
                touched.stats = true;
                let collection = self.collection_mut(&card.collection_id)?;
                collection.card_count = collection.card_count.saturating_add(1);
                self.stats.record_added(card.difficulty, &card.id);
                self.cards.insert(card.id.clone(), card.clone());
                Effect::Card(card)
            }
            StateChange::PatchCard { id, patch } => {
                touched.cards = true;
                let card = self.card_mut(&id)?;
                let before = card.difficulty;
                card.apply_patch(&patch);
                let updated = card.clone();
                if updated.difficulty != before {
                    touched.stats = true;
                    self.stats.track_difficulty(&updated.id, updated.difficulty);
                }
                Effect::Card(updated)
            }
            StateChange::RemoveCard(id) => {
                touched.cards = true;
                touched.collections = true;
                touched.stats = true;
                Effect::CardRemoved(self.remove_card(&id)?)
            }
            StateChange::ReviewCard {
                id,
                next_review_date,
                difficulty,
            } => {
                touched.cards = true;
                touched.stats = true;
                let card = self.card_mut(&id)?;
                card.next_review_date = Some(next_review_date);
                card.difficulty = difficulty;
                card.review_count = card.review_count.saturating_add(1);
                let reviewed = card.clone();
                self.stats.record_reviewed(&reviewed.id, difficulty);
                Effect::Card(reviewed)
            }
            StateChange::ReplaceAll { collections, cards } => {
                touched = Touched::all();
                self.replace_all(collections, cards);
                Effect::Replaced {
                    collections: self.collections.len(),
                    cards: self.cards.len(),
                }
            }
        };

        Ok(Applied { effect, touched })
    }

    /// Cards due at `now`, optionally restricted to one collection.
    ///
    /// Insertion order is preserved; no overdue prioritization.
    pub fn due_cards(&self, now: DateTime<Utc>, collection_id: Option<&str>) -> Vec<Card> {
        self.cards
            .values()
            .filter(|card| collection_id.map_or(true, |id| card.collection_id == id))
            .filter(|card| card.is_due(now))
            .cloned()
            .collect()
    }

    /// All cards of one collection in insertion order.
    pub fn cards_in_collection(&self, collection_id: &str) -> Vec<Card> {
        self.cards
            .values()
            .filter(|card| card.collection_id == collection_id)
            .cloned()
            .collect()
    }

    /// Cards referenced by `stats.hard_cards`, in insertion order.
    pub fn hard_card_list(&self) -> Vec<Card> {
        self.cards
            .values()
            .filter(|card| self.stats.hard_cards.contains(&card.id))
            .cloned()
            .collect()
    }

    /// Per-collection totals for the statistics view, in one pass over cards.
    pub fn collection_breakdown(&self, now: DateTime<Utc>) -> Vec<CollectionBreakdown> {
        let mut rows: Vec<CollectionBreakdown> = self
            .collections
            .values()
            .map(|collection| CollectionBreakdown {
                collection_id: collection.id.clone(),
                name: collection.name.clone(),
                total_cards: 0,
                easy_count: 0,
                hard_count: 0,
                due_count: 0,
            })
            .collect();

        for card in self.cards.values() {
            let Some(index) = self.collections.get_index_of(card.collection_id.as_str()) else {
                continue;
            };
            let row = &mut rows[index];
            row.total_cards += 1;
            match card.difficulty {
                Difficulty::Easy => row.easy_count += 1,
                Difficulty::Hard => row.hard_count += 1,
                Difficulty::Medium => {}
            }
            if card.is_due(now) {
                row.due_count += 1;
            }
        }
        rows
    }

    /// Verifies derived counters against actual membership.
    ///
    /// Returns a description of the first mismatch.
    pub fn check_invariants(&self) -> Result<(), String> {
        let per_collection = count_per_collection(self.cards.values());
        for collection in self.collections.values() {
            let actual = per_collection
                .get(collection.id.as_str())
                .copied()
                .unwrap_or(0);
            if collection.card_count != actual {
                return Err(format!(
                    "collection {} card_count={} actual={}",
                    collection.id, collection.card_count, actual
                ));
            }
        }

        if self.stats.total_cards as usize != self.cards.len() {
            return Err(format!(
                "total_cards={} actual={}",
                self.stats.total_cards,
                self.cards.len()
            ));
        }

        let hard = hard_ids(self.cards.values());
        if hard != self.stats.hard_cards {
            return Err(format!(
                "hard_cards has {} ids, expected {}",
                self.stats.hard_cards.len(),
                hard.len()
            ));
        }

        Ok(())
    }

    /// Recomputes `total_cards` and `hard_cards` from the loaded cards.
    ///
    /// Daily counters and `last_updated` are left alone.
    pub fn reseed_card_totals(&mut self) {
        self.stats.total_cards = u32::try_from(self.cards.len()).unwrap_or(u32::MAX);
        self.stats.hard_cards = hard_ids(self.cards.values());
    }

    fn validate(&self, change: &StateChange) -> Result<(), StateError> {
        match change {
            StateChange::AddCollection(collection) => {
                if self.collections.contains_key(collection.id.as_str()) {
                    return Err(StateError::DuplicateCollectionId(collection.id.clone()));
                }
            }
            StateChange::PatchCollection { id, .. } | StateChange::RemoveCollection(id) => {
                if !self.collections.contains_key(id.as_str()) {
                    return Err(StateError::CollectionNotFound(id.clone()));
                }
            }
            StateChange::AddCard(card) => {
                if !self.collections.contains_key(card.collection_id.as_str()) {
                    return Err(StateError::CollectionNotFound(card.collection_id.clone()));
                }
                if self.cards.contains_key(card.id.as_str()) {
                    return Err(StateError::DuplicateCardId(card.id.clone()));
                }
            }
            StateChange::PatchCard { id, .. }
            | StateChange::RemoveCard(id)
            | StateChange::ReviewCard { id, .. } => {
                if !self.cards.contains_key(id.as_str()) {
                    return Err(StateError::CardNotFound(id.clone()));
                }
            }
            StateChange::ReplaceAll { collections, cards } => {
                let mut seen = HashSet::new();
                for collection in collections {
                    if !seen.insert(collection.id.as_str()) {
                        return Err(StateError::DuplicateCollectionId(collection.id.clone()));
                    }
                }
                let mut seen = HashSet::new();
                for card in cards {
                    if !seen.insert(card.id.as_str()) {
                        return Err(StateError::DuplicateCardId(card.id.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    fn collection_mut(&mut self, id: &str) -> Result<&mut Collection, StateError> {
        self.collections
            .get_mut(id)
            .ok_or_else(|| StateError::CollectionNotFound(id.to_string()))
    }

    fn card_mut(&mut self, id: &str) -> Result<&mut Card, StateError> {
        self.cards
            .get_mut(id)
            .ok_or_else(|| StateError::CardNotFound(id.to_string()))
    }

    fn remove_collection(&mut self, id: &str) -> Result<CollectionRemoval, StateError> {
        let collection = self
            .collections
            .shift_remove(id)
            .ok_or_else(|| StateError::CollectionNotFound(id.to_string()))?;

        let mut removed_card_ids = Vec::new();
        self.cards.retain(|card_id, card| {
            if card.collection_id == id {
                removed_card_ids.push(card_id.clone());
                false
            } else {
                true
            }
        });
        for card_id in &removed_card_ids {
            self.stats.record_removed(card_id);
        }

        Ok(CollectionRemoval {
            collection,
            removed_card_ids,
        })
    }

    fn remove_card(&mut self, id: &str) -> Result<Card, StateError> {
        let card = self
            .cards
            .shift_remove(id)
            .ok_or_else(|| StateError::CardNotFound(id.to_string()))?;

        if let Some(collection) = self.collections.get_mut(card.collection_id.as_str()) {
            collection.card_count = collection.card_count.saturating_sub(1);
        }
        self.stats.record_removed(&card.id);
        Ok(card)
    }

    fn replace_all(&mut self, collections: Vec<Collection>, cards: Vec<Card>) {
        let per_collection = count_per_collection(cards.iter());
        let collections: CollectionMap = collections
            .into_iter()
            .map(|mut collection| {
                collection.card_count = per_collection
                    .get(collection.id.as_str())
                    .copied()
                    .unwrap_or(0);
                (collection.id.clone(), collection)
            })
            .collect();

        self.collections = collections;
        self.cards = cards.into_iter().map(|card| (card.id.clone(), card)).collect();
        self.reseed_card_totals();
    }
}

fn count_per_collection<'a>(cards: impl Iterator<Item = &'a Card>) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for card in cards {
        *counts.entry(card.collection_id.clone()).or_default() += 1;
    }
    counts
}

fn hard_ids<'a>(cards: impl Iterator<Item = &'a Card>) -> BTreeSet<CardId> {
    cards
        .filter(|card| card.is_hard())
        .map(|card| card.id.clone())
        .collect()
}
