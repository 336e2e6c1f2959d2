//! rentwatch - matching and notification engine for aggregated rental
//! listings.
//!
//! This crate provides the core of a listing-alert service:
//! - Listing store with idempotent upsert keyed on `(source, external_id)`
//! - Pure predicate evaluation of saved-search filters against listings
//! - Throttled notification cycles with an at-most-once delivery ledger

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod repository;
pub mod service;
pub mod task;
