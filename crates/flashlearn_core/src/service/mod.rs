//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate state changes, scheduling and persistence into use-case
//!   level APIs.
//! - Keep callers decoupled from storage details.

pub mod persistence;
pub mod review_scheduler;
pub mod snapshot;
pub mod study_service;
