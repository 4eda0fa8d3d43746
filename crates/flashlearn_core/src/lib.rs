//! Core study logic for FlashLearn.
//! This crate is the single source of truth for scheduling and bookkeeping
//! invariants; presentation layers call into `StudyService`.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::card::{Card, CardId, CardPatch, Difficulty};
pub use model::collection::{Collection, CollectionId, CollectionPatch};
pub use model::state::{CardMap, CollectionBreakdown, CollectionMap, CollectionRemoval, StudyState};
pub use model::stats::Stats;
pub use repo::record_store::{
    MemoryRecordStore, RecordKey, RecordStore, RepoError, RepoResult, SqliteRecordStore,
};
pub use service::review_scheduler::{schedule, InvalidOutcome, ReviewOutcome, ScheduledReview};
pub use service::snapshot::{SnapshotDocument, SnapshotError};
pub use service::study_service::{EntityKind, ImportSummary, StudyError, StudyService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
