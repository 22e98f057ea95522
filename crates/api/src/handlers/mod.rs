//! Request handlers.
//!
//! Handlers validate input through `gupta_core`, delegate to the
//! repositories in `gupta_db`, and map errors via [`AppError`](crate::error::AppError).

pub mod events;
