//! Repository layer: one zero-sized struct per aggregate, all operations take
//! the pool explicitly.

pub mod event_repo;

pub use event_repo::EventRepo;
