pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Build the event route tree.
///
/// ```text
/// GET  /            -> index
/// POST /newEvent    -> create_event
/// GET  /getEvents   -> query_events
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::index))
        .route("/newEvent", post(events::create_event))
        .route("/getEvents", get(events::query_events))
}
