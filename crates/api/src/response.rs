//! Response envelopes.
//!
//! Every response carries a `status` of `"ok"` or `"error"`; payload fields
//! sit next to it rather than under a nested key.

use gupta_core::event::Event;
use gupta_core::types::DbId;
use serde::Serialize;

/// Bare `{"status": ...}` envelope, with `message` on errors.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: "error",
            message: Some(message),
        }
    }
}

/// `{"status": "ok", "eventId": N}` returned after a successful save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub status: &'static str,
    pub event_id: DbId,
}

/// `{"status": "ok", "events": [...]}` returned by event queries.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub status: &'static str,
    pub events: Vec<Event>,
}
