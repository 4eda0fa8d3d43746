//! Process-wide study statistics.
//!
//! # Responsibility
//! - Hold daily and lifetime counters plus the hard-card id set.
//! - Reset daily counters on calendar-day rollover.
//!
//! # Invariants
//! - Counters are maintained incrementally by `StudyState`, never rebuilt by
//!   scanning cards except on snapshot replacement.
//! - Rollover zeroes `today_*` only; `total_cards` and `hard_cards` survive.

use crate::model::card::{CardId, Difficulty};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregate counters derived from card mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub today_reviewed: u32,
    #[serde(default)]
    pub today_added: u32,
    #[serde(default)]
    pub total_cards: u32,
    /// Ids of cards whose current difficulty is `Hard`.
    #[serde(default)]
    pub hard_cards: BTreeSet<CardId>,
    /// Calendar day (UTC) the daily counters belong to.
    pub last_updated: NaiveDate,
}

impl Stats {
    /// Creates zeroed statistics for `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today_reviewed: 0,
            today_added: 0,
            total_cards: 0,
            hard_cards: BTreeSet::new(),
            last_updated: today,
        }
    }

    /// Resets daily counters when `today` differs from `last_updated`.
    ///
    /// Returns `true` when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_updated == today {
            return false;
        }

        self.today_reviewed = 0;
        self.today_added = 0;
        self.last_updated = today;
        true
    }

    pub fn hard_card_count(&self) -> usize {
        self.hard_cards.len()
    }

    pub(crate) fn record_added(&mut self, difficulty: Difficulty, card_id: &str) {
        self.today_added = self.today_added.saturating_add(1);
        self.total_cards = self.total_cards.saturating_add(1);
        self.track_difficulty(card_id, difficulty);
    }

    pub(crate) fn record_removed(&mut self, card_id: &str) {
        self.total_cards = self.total_cards.saturating_sub(1);
        self.hard_cards.remove(card_id);
    }

    pub(crate) fn record_reviewed(&mut self, card_id: &str, difficulty: Difficulty) {
        self.today_reviewed = self.today_reviewed.saturating_add(1);
        self.track_difficulty(card_id, difficulty);
    }

    pub(crate) fn track_difficulty(&mut self, card_id: &str, difficulty: Difficulty) {
        if difficulty == Difficulty::Hard {
            self.hard_cards.insert(card_id.to_string());
        } else {
            self.hard_cards.remove(card_id);
        }
    }
}
