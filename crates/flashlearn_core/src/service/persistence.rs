//! Persistence gateway between study state and the record store.
//!
//! # Responsibility
//! - Load collections, cards and stats once at startup.
//! - Write back every record touched by a successful change.
//!
//! # Invariants
//! - Each record loads independently; a missing or undecodable record
//!   becomes its default and is reported with `warn!`, never as an error.
//! - Loaded stats are rolled over to `today` before use.
//! - Without a usable stats record, card totals are rebuilt from the loaded
//!   cards.
//! - Write failures are logged and dropped; callers never see them.

use crate::model::card::Card;
use crate::model::collection::Collection;
use crate::model::state::{StudyState, Touched};
use crate::model::stats::Stats;
use crate::repo::record_store::{RecordKey, RecordStore};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

/// Startup load result.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub state: StudyState,
    /// Records that were present but could not be read or decoded.
    pub degraded: Vec<RecordKey>,
    /// Whether daily counters were reset because `lastUpdated` was stale.
    pub rolled_over: bool,
    /// Whether card totals were rebuilt because the stats record was missing
    /// or unreadable while cards were present.
    pub reseeded: bool,
}

/// Reads and writes the three study records through a `RecordStore`.
pub struct PersistenceGateway<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the full state, degrading per record to defaults.
    pub fn load(&self, today: NaiveDate) -> LoadReport {
        let started_at = Instant::now();
        let mut degraded = Vec::new();

        let collections: Vec<Collection> = self
            .read_or_default(RecordKey::Collections, &mut degraded)
            .unwrap_or_default();
        let cards: Vec<Card> = self
            .read_or_default(RecordKey::Cards, &mut degraded)
            .unwrap_or_default();
        let stats: Option<Stats> = self.read_or_default(RecordKey::Stats, &mut degraded);
        let reseeded = stats.is_none() && !cards.is_empty();

        let mut state =
            StudyState::from_parts(collections, cards, stats.unwrap_or_else(|| Stats::new(today)));
        if reseeded {
            state.reseed_card_totals();
            info!(
                "event=stats_reseed module=persistence status=ok total_cards={} hard_cards={}",
                state.stats().total_cards,
                state.stats().hard_card_count()
            );
        }
        let rolled_over = state.roll_over(today);
        if rolled_over {
            info!("event=stats_rollover module=persistence status=ok today={today}");
        }
        if let Err(details) = state.check_invariants() {
            warn!(
                "event=state_load module=persistence status=warn reason=derived_counters_drift details={details}"
            );
        }

        info!(
            "event=state_load module=persistence status=ok collections={} cards={} degraded={} duration_ms={}",
            state.collections().len(),
            state.cards().len(),
            degraded.len(),
            started_at.elapsed().as_millis()
        );

        LoadReport {
            state,
            degraded,
            rolled_over,
            reseeded,
        }
    }

    /// Writes every touched record in full.
    pub fn commit(&self, state: &StudyState, touched: Touched) {
        if touched.collections {
            let collections: Vec<&Collection> = state.collections().values().collect();
            self.write(RecordKey::Collections, &collections);
        }
        if touched.cards {
            let cards: Vec<&Card> = state.cards().values().collect();
            self.write(RecordKey::Cards, &cards);
        }
        if touched.stats {
            self.write(RecordKey::Stats, state.stats());
        }
    }

    fn read_or_default<T: DeserializeOwned>(
        &self,
        key: RecordKey,
        degraded: &mut Vec<RecordKey>,
    ) -> Option<T> {
        let payload = match self.store.read_record(key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("event=record_read module=persistence status=absent key={key}");
                return None;
            }
            Err(err) => {
                warn!(
                    "event=record_read module=persistence status=error key={key} error_code=record_read_failed error={err}"
                );
                degraded.push(key);
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=record_read module=persistence status=error key={key} error_code=record_decode_failed error={err}"
                );
                degraded.push(key);
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: RecordKey, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    "event=record_write module=persistence status=error key={key} error_code=record_encode_failed error={err}"
                );
                return;
            }
        };

        match self.store.write_record(key, &payload) {
            Ok(()) => debug!(
                "event=record_write module=persistence status=ok key={key} bytes={}",
                payload.len()
            ),
            Err(err) => warn!(
                "event=record_write module=persistence status=error key={key} error_code=record_write_failed error={err}"
            ),
        }
    }
}
