//! Flashcard domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core study logic.
//! - Own the single update path for derived bookkeeping (`StateChange`).
//!
//! # Invariants
//! - Every `Collection.card_count` equals the number of cards pointing at it.
//! - `Stats.total_cards` equals the number of cards.
//! - `Stats.hard_cards` equals the set of card ids with `Difficulty::Hard`.

pub mod card;
pub mod collection;
pub mod state;
pub mod stats;
