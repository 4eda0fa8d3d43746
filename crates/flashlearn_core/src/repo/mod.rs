//! Durable record storage behind the persistence gateway.
//!
//! # Responsibility
//! - Define the key-value contract the gateway reads and writes through.
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - A write replaces the whole record; there are no partial writes.
//! - Missing records read as `None`, never as an error.

pub mod record_store;
