//! Domain model for the Gupta event log.
//!
//! Holds the `Event` / `Entity` types, their wire representation, and the
//! validation of query parameters. Nothing in this crate touches the
//! database; persistence lives in `gupta-db`.

pub mod coerce;
pub mod config;
pub mod error;
pub mod event;
pub mod query;
pub mod types;
