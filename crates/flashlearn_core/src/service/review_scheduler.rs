//! Fixed-interval review scheduling.
//!
//! # Responsibility
//! - Map a review outcome at a given instant to the next due instant and
//!   the card's new difficulty label.
//!
//! # Invariants
//! - `schedule` is pure: no storage access, no clock reads.
//! - Intervals are fixed: known = 7 days, later = 1 day, hard = 10 minutes.

use crate::model::card::Difficulty;
use chrono::{DateTime, Duration, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Recall outcome reported by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewOutcome {
    /// Recalled without trouble.
    Known,
    /// Partially recalled; see it again tomorrow.
    Later,
    /// Not recalled; see it again shortly.
    Hard,
}

impl ReviewOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Known => "known",
            Self::Later => "later",
            Self::Hard => "hard",
        }
    }

    /// Delay until the card is due again.
    pub fn interval(self) -> Duration {
        match self {
            Self::Known => Duration::days(7),
            Self::Later => Duration::days(1),
            Self::Hard => Duration::minutes(10),
        }
    }

    /// Difficulty label assigned after this outcome.
    pub fn difficulty(self) -> Difficulty {
        match self {
            Self::Known => Difficulty::Easy,
            Self::Later => Difficulty::Medium,
            Self::Hard => Difficulty::Hard,
        }
    }
}

impl Display for ReviewOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome text outside `known|later|hard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOutcome(pub String);

impl Display for InvalidOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid review outcome `{}`; expected known|later|hard",
            self.0
        )
    }
}

impl Error for InvalidOutcome {}

impl FromStr for ReviewOutcome {
    type Err = InvalidOutcome;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "known" => Ok(Self::Known),
            "later" => Ok(Self::Later),
            "hard" => Ok(Self::Hard),
            _ => Err(InvalidOutcome(value.to_string())),
        }
    }
}

/// Next scheduling state for a reviewed card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReview {
    pub next_review_date: DateTime<Utc>,
    pub difficulty: Difficulty,
}

/// Computes the next review instant and difficulty for `outcome` at `now`.
pub fn schedule(now: DateTime<Utc>, outcome: ReviewOutcome) -> ScheduledReview {
    ScheduledReview {
        next_review_date: now + outcome.interval(),
        difficulty: outcome.difficulty(),
    }
}
