//! Study use-case service: the entity store facade.
//!
//! # Responsibility
//! - Expose the collaborator operation set (collection/card CRUD, review
//!   recording, due-card queries, snapshot export/import).
//! - Funnel every mutation through `StudyState::apply` and commit the
//!   touched records afterwards.
//!
//! # Invariants
//! - A failed operation leaves state and storage untouched.
//! - Persistence failures are never surfaced as `StudyError`.
//! - Logs carry ids and counts only, never card text.

use crate::clock::{Clock, SystemClock};
use crate::model::card::{Card, CardPatch};
use crate::model::collection::{Collection, CollectionPatch};
use crate::model::state::{
    CardMap, CollectionBreakdown, CollectionMap, CollectionRemoval, Effect, StateChange,
    StateError, StudyState, Touched,
};
use crate::model::stats::Stats;
use crate::repo::record_store::RecordStore;
use crate::service::persistence::PersistenceGateway;
use crate::service::review_scheduler::{schedule, InvalidOutcome, ReviewOutcome};
use crate::service::snapshot::{
    backup_file_name, export_snapshot, parse_snapshot, SnapshotDocument, SnapshotError,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entity kind named by a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Collection,
    Card,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection => f.write_str("collection"),
            Self::Card => f.write_str("card"),
        }
    }
}

/// Caller-facing error for study operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    /// Operation referenced an id that does not exist.
    NotFound { kind: EntityKind, id: String },
    /// Insert reused an id that already exists.
    Duplicate { kind: EntityKind, id: String },
    /// Review outcome outside `known|later|hard`.
    InvalidOutcome(String),
    /// Import text is not JSON.
    Parse(String),
    /// Import JSON does not have the snapshot shape.
    Format(String),
    /// Snapshot could not be rendered as JSON.
    Encode(String),
    /// Internal mismatch between a change and its effect.
    InconsistentState(&'static str),
}

impl Display for StudyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Duplicate { kind, id } => write!(f, "{kind} already exists: {id}"),
            Self::InvalidOutcome(value) => write!(
                f,
                "invalid review outcome `{value}`; expected known|later|hard"
            ),
            Self::Parse(message) => write!(f, "import failed, not valid JSON: {message}"),
            Self::Format(message) => write!(f, "import failed, invalid format: {message}"),
            Self::Encode(message) => write!(f, "export failed: {message}"),
            Self::InconsistentState(details) => write!(f, "inconsistent study state: {details}"),
        }
    }
}

impl Error for StudyError {}

impl From<StateError> for StudyError {
    fn from(value: StateError) -> Self {
        match value {
            StateError::CollectionNotFound(id) => Self::NotFound {
                kind: EntityKind::Collection,
                id,
            },
            StateError::CardNotFound(id) => Self::NotFound {
                kind: EntityKind::Card,
                id,
            },
            StateError::DuplicateCollectionId(id) => Self::Duplicate {
                kind: EntityKind::Collection,
                id,
            },
            StateError::DuplicateCardId(id) => Self::Duplicate {
                kind: EntityKind::Card,
                id,
            },
        }
    }
}

impl From<SnapshotError> for StudyError {
    fn from(value: SnapshotError) -> Self {
        match value {
            SnapshotError::Parse(message) => Self::Parse(message),
            SnapshotError::Format(message) => Self::Format(message),
        }
    }
}

impl From<InvalidOutcome> for StudyError {
    fn from(value: InvalidOutcome) -> Self {
        Self::InvalidOutcome(value.0)
    }
}

/// Counts of records installed by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub collections: usize,
    pub cards: usize,
}

/// Application state object: owns study state and commits through storage.
pub struct StudyService<S: RecordStore, C: Clock = SystemClock> {
    state: StudyState,
    gateway: PersistenceGateway<S>,
    clock: C,
}

impl<S: RecordStore> StudyService<S, SystemClock> {
    /// Loads persisted state using wall-clock time.
    pub fn open(store: S) -> Self {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> StudyService<S, C> {
    /// Loads persisted state once; unreadable records fall back to defaults.
    pub fn open_with_clock(store: S, clock: C) -> Self {
        let gateway = PersistenceGateway::new(store);
        let report = gateway.load(clock.today());
        if report.rolled_over || report.reseeded {
            gateway.commit(
                &report.state,
                Touched {
                    stats: true,
                    ..Touched::default()
                },
            );
        }
        for key in &report.degraded {
            warn!("event=service_open module=study status=degraded key={key}");
        }

        Self {
            state: report.state,
            gateway,
            clock,
        }
    }

    pub fn collections(&self) -> &CollectionMap {
        self.state.collections()
    }

    pub fn cards(&self) -> &CardMap {
        self.state.cards()
    }

    pub fn stats(&self) -> &Stats {
        self.state.stats()
    }

    pub fn state(&self) -> &StudyState {
        &self.state
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.state.collection(id)
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.state.card(id)
    }

    pub fn store(&self) -> &S {
        self.gateway.store()
    }

    /// Creates an empty collection.
    ///
    /// # Contract
    /// - Non-blank `name` is the caller's responsibility.
    pub fn add_collection(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Collection, StudyError> {
        let collection = Collection::new(name, description, self.clock.now());
        match self.transact(StateChange::AddCollection(collection))? {
            Effect::Collection(collection) => {
                info!(
                    "event=collection_add module=study status=ok collection_id={}",
                    collection.id
                );
                Ok(collection)
            }
            _ => Err(StudyError::InconsistentState(
                "collection add produced no collection",
            )),
        }
    }

    /// Merges `patch` into an existing collection.
    pub fn update_collection(
        &mut self,
        id: &str,
        patch: CollectionPatch,
    ) -> Result<Collection, StudyError> {
        let change = StateChange::PatchCollection {
            id: id.to_string(),
            patch,
        };
        match self.transact(change)? {
            Effect::Collection(collection) => Ok(collection),
            _ => Err(StudyError::InconsistentState(
                "collection update produced no collection",
            )),
        }
    }

    /// Deletes a collection and every card in it.
    pub fn delete_collection(&mut self, id: &str) -> Result<CollectionRemoval, StudyError> {
        match self.transact(StateChange::RemoveCollection(id.to_string()))? {
            Effect::CollectionRemoved(removal) => {
                info!(
                    "event=collection_delete module=study status=ok collection_id={} removed_cards={}",
                    id,
                    removal.removed_card_ids.len()
                );
                Ok(removal)
            }
            _ => Err(StudyError::InconsistentState(
                "collection delete produced no removal",
            )),
        }
    }

    /// Adds an unreviewed card to an existing collection.
    pub fn add_card(
        &mut self,
        collection_id: &str,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<Card, StudyError> {
        let card = Card::new(collection_id, front, back, self.clock.now());
        match self.transact(StateChange::AddCard(card))? {
            Effect::Card(card) => {
                info!(
                    "event=card_add module=study status=ok card_id={} collection_id={}",
                    card.id, card.collection_id
                );
                Ok(card)
            }
            _ => Err(StudyError::InconsistentState("card add produced no card")),
        }
    }

    /// Merges `patch` into an existing card.
    pub fn update_card(&mut self, id: &str, patch: CardPatch) -> Result<Card, StudyError> {
        let change = StateChange::PatchCard {
            id: id.to_string(),
            patch,
        };
        match self.transact(change)? {
            Effect::Card(card) => Ok(card),
            _ => Err(StudyError::InconsistentState("card update produced no card")),
        }
    }

    /// Deletes one card and returns the removed record.
    pub fn delete_card(&mut self, id: &str) -> Result<Card, StudyError> {
        match self.transact(StateChange::RemoveCard(id.to_string()))? {
            Effect::CardRemoved(card) => {
                info!("event=card_delete module=study status=ok card_id={id}");
                Ok(card)
            }
            _ => Err(StudyError::InconsistentState("card delete produced no card")),
        }
    }

    /// Records one review and reschedules the card.
    pub fn record_review(
        &mut self,
        card_id: &str,
        outcome: ReviewOutcome,
    ) -> Result<Card, StudyError> {
        let scheduled = schedule(self.clock.now(), outcome);
        let change = StateChange::ReviewCard {
            id: card_id.to_string(),
            next_review_date: scheduled.next_review_date,
            difficulty: scheduled.difficulty,
        };
        match self.transact(change)? {
            Effect::Card(card) => {
                info!(
                    "event=card_review module=study status=ok card_id={} outcome={} review_count={}",
                    card.id, outcome, card.review_count
                );
                Ok(card)
            }
            _ => Err(StudyError::InconsistentState("review produced no card")),
        }
    }

    /// Parses `outcome` text and records the review.
    ///
    /// # Errors
    /// - `InvalidOutcome` for text outside `known|later|hard`.
    /// - `NotFound` when the card does not exist.
    pub fn record_review_text(&mut self, card_id: &str, outcome: &str) -> Result<Card, StudyError> {
        let outcome = outcome.parse::<ReviewOutcome>()?;
        self.record_review(card_id, outcome)
    }

    /// Cards due now, optionally within one collection, in insertion order.
    pub fn cards_for_review(&self, collection_id: Option<&str>) -> Vec<Card> {
        self.state.due_cards(self.clock.now(), collection_id)
    }

    pub fn cards_in_collection(&self, collection_id: &str) -> Vec<Card> {
        self.state.cards_in_collection(collection_id)
    }

    pub fn hard_card_list(&self) -> Vec<Card> {
        self.state.hard_card_list()
    }

    pub fn collection_breakdown(&self) -> Vec<CollectionBreakdown> {
        self.state.collection_breakdown(self.clock.now())
    }

    /// Projects current collections and cards into a backup document.
    pub fn export_snapshot(&self) -> SnapshotDocument {
        export_snapshot(&self.state, self.clock.now())
    }

    /// Renders the backup document as indented JSON.
    pub fn export_snapshot_json(&self) -> Result<String, StudyError> {
        self.export_snapshot()
            .to_json_pretty()
            .map_err(|err| StudyError::Encode(err.to_string()))
    }

    /// Suggested file name for a backup taken today.
    pub fn backup_file_name(&self) -> String {
        backup_file_name(self.clock.today())
    }

    /// Replaces every collection and card with the snapshot contents.
    ///
    /// # Errors
    /// - `Parse` when `text` is not JSON.
    /// - `Format` when the document lacks either array, holds undecodable
    ///   entries, or repeats an id.
    pub fn import_snapshot(&mut self, text: &str) -> Result<ImportSummary, StudyError> {
        let imported = match parse_snapshot(text) {
            Ok(imported) => imported,
            Err(err) => {
                warn!(
                    "event=snapshot_import module=study status=error error_code={}",
                    match err {
                        SnapshotError::Parse(_) => "parse_error",
                        SnapshotError::Format(_) => "format_error",
                    }
                );
                return Err(err.into());
            }
        };

        let change = StateChange::ReplaceAll {
            collections: imported.collections,
            cards: imported.cards,
        };
        let effect = self.transact(change).map_err(|err| match err {
            StudyError::Duplicate { kind, id } => {
                warn!("event=snapshot_import module=study status=error error_code=duplicate_id kind={kind}");
                StudyError::Format(format!("duplicate {kind} id: {id}"))
            }
            other => other,
        })?;
        match effect {
            Effect::Replaced { collections, cards } => {
                info!(
                    "event=snapshot_import module=study status=ok collections={collections} cards={cards}"
                );
                Ok(ImportSummary { collections, cards })
            }
            _ => Err(StudyError::InconsistentState("import produced no replacement")),
        }
    }

    fn transact(&mut self, change: StateChange) -> Result<Effect, StudyError> {
        let applied = self.state.apply(change, self.clock.today())?;
        self.gateway.commit(&self.state, applied.touched);
        Ok(applied.effect)
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, StudyError};
    use crate::model::state::StateError;

    #[test]
    fn duplicate_ids_outside_import_are_not_format_errors() {
        let err = StudyError::from(StateError::DuplicateCardId("c1".to_string()));
        assert_eq!(
            err,
            StudyError::Duplicate {
                kind: EntityKind::Card,
                id: "c1".to_string()
            }
        );
        assert_eq!(err.to_string(), "card already exists: c1");

        let err = StudyError::from(StateError::DuplicateCollectionId("k1".to_string()));
        assert!(!err.to_string().contains("import failed"));
    }
}
