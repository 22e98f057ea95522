//! Typed parameters for loading events.
//!
//! [`RawEventQuery`] is what arrives on the query string; [`EventQuery`] is
//! the validated form the persistence layer accepts.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::coerce::{json_kind, parse_i64, value_to_i64};
use crate::error::CoreError;
use crate::event::Entity;
use crate::types::EpochMillis;

/// Entity type to the entity ids of that type an event may match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter(BTreeMap<i64, Vec<i64>>);

impl EntityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity_type: i64, entity_ids: impl IntoIterator<Item = i64>) -> Self {
        self.0.entry(entity_type).or_default().extend(entity_ids);
        self
    }

    /// Parse the JSON text form, e.g. `{"1": [14, 15]}`.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CoreError::Parse(format!("entityIds: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let groups = value.as_object().ok_or_else(|| {
            CoreError::invalid("entityIds", format!("expected an object, got {}", json_kind(value)))
        })?;

        let mut filter = Self::new();
        for (type_key, ids) in groups {
            let entity_type = parse_i64("entityIds", type_key)?;
            let ids = ids.as_array().ok_or_else(|| {
                CoreError::invalid(
                    "entityIds",
                    format!("ids for entity type {type_key} must be an array"),
                )
            })?;
            let ids = ids
                .iter()
                .map(|id| value_to_i64("entityIds", id))
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.with(entity_type, ids);
        }
        Ok(filter)
    }

    /// Every `(type, id)` pair, ordered by type then by insertion.
    pub fn pairs(&self) -> Vec<Entity> {
        self.0
            .iter()
            .flat_map(|(&entity_type, ids)| {
                ids.iter().map(move |&id| Entity::new(entity_type, id))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// Query-string parameters for `GET /getEvents`, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventQuery {
    pub application_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub event_type_id: Option<String>,
    pub entity_ids: Option<String>,
}

/// Validated filter for loading events.
///
/// Matches events of `application_id` with `start < event_time`, and when
/// set, `event_time < end`, the given event type, and at least one of the
/// given entity pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub application_id: i64,
    pub start: EpochMillis,
    pub end: Option<EpochMillis>,
    pub event_type_id: Option<i64>,
    pub entity_ids: Option<EntityFilter>,
}

impl EventQuery {
    pub fn new(application_id: i64, start: EpochMillis) -> Self {
        Self {
            application_id,
            start,
            end: None,
            event_type_id: None,
            entity_ids: None,
        }
    }

    pub fn with_end(mut self, end: EpochMillis) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_event_type(mut self, event_type_id: i64) -> Self {
        self.event_type_id = Some(event_type_id);
        self
    }

    pub fn with_entities(mut self, entity_ids: EntityFilter) -> Self {
        self.entity_ids = Some(entity_ids);
        self
    }

    /// Validate raw query-string parameters.
    ///
    /// Empty strings are treated as absent.
    pub fn from_params(raw: &RawEventQuery) -> Result<Self, CoreError> {
        let application_id = required(&raw.application_id, "applicationId")?;
        let start = required(&raw.start, "start")?;

        Ok(Self {
            application_id: parse_i64("applicationId", application_id)?,
            start: parse_i64("start", start)?,
            end: optional(&raw.end)
                .map(|v| parse_i64("end", v))
                .transpose()?,
            event_type_id: optional(&raw.event_type_id)
                .map(|v| parse_i64("eventTypeId", v))
                .transpose()?,
            entity_ids: optional(&raw.entity_ids)
                .map(EntityFilter::from_json)
                .transpose()?,
        })
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, CoreError> {
    optional(value).ok_or(CoreError::MissingField(field))
}
