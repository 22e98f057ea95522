//! Handlers for creating and querying events.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use gupta_core::error::CoreError;
use gupta_core::event::Event;
use gupta_core::query::{EventQuery, RawEventQuery};
use gupta_db::repositories::EventRepo;

use crate::error::AppResult;
use crate::response::{CreatedResponse, EventsResponse, StatusResponse};
use crate::state::AppState;

/// GET /
pub async fn index() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// POST /newEvent
///
/// The body is the event's JSON wire representation. Responds with the
/// generated event id.
pub async fn create_event(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<CreatedResponse>> {
    let text = std::str::from_utf8(&body)
        .map_err(|e| CoreError::Parse(format!("request body is not UTF-8: {e}")))?;

    let mut event = Event::from_json(text)?;
    let event_id = EventRepo::save(&state.pool, &mut event).await?;

    tracing::info!(
        event_id,
        application_id = event.application_id,
        event_type_id = event.event_type_id,
        "Event created"
    );

    Ok(Json(CreatedResponse {
        status: "ok",
        event_id,
    }))
}

/// GET /getEvents?applicationId=&start=&end=&eventTypeId=&entityIds=
///
/// `entityIds` is JSON text mapping entity types to id lists,
/// e.g. `{"1":[14,15]}`.
pub async fn query_events(
    State(state): State<AppState>,
    params: Result<Query<RawEventQuery>, QueryRejection>,
) -> AppResult<Json<EventsResponse>> {
    let Query(params) = params?;
    let query = EventQuery::from_params(&params)?;
    let events = EventRepo::load(&state.pool, &query).await?;

    Ok(Json(EventsResponse {
        status: "ok",
        events,
    }))
}
