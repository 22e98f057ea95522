//! Event and related-entity model.
//!
//! An [`Event`] is built in memory (from parameters, a JSON object, or JSON
//! text), optionally saved once, or restored from storage with its id set.
//! On the wire, related entities are grouped by entity type:
//!
//! ```text
//! { "applicationId": 1, "eventTypeId": 2, "headline": "...", "body": "...",
//!   "eventTime": 1700000000000, "relatedEntities": { "1": [14, 16], "2": [4] } }
//! ```

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::coerce::{json_kind, parse_i64, value_to_i64};
use crate::error::CoreError;
use crate::types::{now_millis, DbId, EpochMillis};

/// A tagged reference from an event to some external object.
///
/// Entities have no identity of their own; they only exist inside the
/// `related_entities` list of their owning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Namespace of the related id.
    pub entity_type: i64,
    /// Id within that namespace.
    pub entity_id: i64,
}

impl Entity {
    pub fn new(entity_type: i64, entity_id: i64) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

/// One logged occurrence.
///
/// `event_id` is `None` until the event is persisted and cannot change
/// afterwards; it is only reachable through [`Event::event_id`] and
/// [`Event::mark_saved`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_id: Option<DbId>,
    pub application_id: i64,
    pub event_type_id: i64,
    pub headline: String,
    pub body: String,
    pub event_time: EpochMillis,
    pub related_entities: Vec<Entity>,
}

impl Event {
    /// Create an unsaved event timestamped now, with no related entities.
    pub fn new(
        application_id: i64,
        event_type_id: i64,
        headline: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            event_id: None,
            application_id,
            event_type_id,
            headline: headline.into(),
            body: body.into(),
            event_time: now_millis(),
            related_entities: Vec::new(),
        }
    }

    /// Rebuild an event that already exists in storage.
    pub fn restore(
        event_id: DbId,
        application_id: i64,
        event_type_id: i64,
        headline: String,
        body: String,
        event_time: EpochMillis,
        related_entities: Vec<Entity>,
    ) -> Self {
        Self {
            event_id: Some(event_id),
            application_id,
            event_type_id,
            headline,
            body,
            event_time,
            related_entities,
        }
    }

    pub fn with_event_time(mut self, event_time: EpochMillis) -> Self {
        self.event_time = event_time;
        self
    }

    pub fn with_entity(mut self, entity_type: i64, entity_id: i64) -> Self {
        self.related_entities.push(Entity::new(entity_type, entity_id));
        self
    }

    pub fn event_id(&self) -> Option<DbId> {
        self.event_id
    }

    /// Return `true` if this event has already been persisted.
    pub fn is_saved(&self) -> bool {
        self.event_id.is_some()
    }

    /// Record the id assigned by the store.
    ///
    /// Fails with [`CoreError::AlreadySaved`] and leaves the existing id in
    /// place if the event was already saved.
    pub fn mark_saved(&mut self, event_id: DbId) -> Result<(), CoreError> {
        if let Some(existing) = self.event_id {
            return Err(CoreError::AlreadySaved(existing));
        }
        self.event_id = Some(event_id);
        Ok(())
    }

    /// Parse an event from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))?;
        Self::from_dict(&value)
    }

    /// Build an unsaved event from its wire representation.
    ///
    /// `applicationId`, `eventTypeId`, `headline` and `body` are required.
    /// `eventTime` falls back to now. `relatedEntities` maps entity type keys
    /// to lists of entity ids and is flattened into `(type, id)` pairs.
    pub fn from_dict(data: &Value) -> Result<Self, CoreError> {
        let map = data.as_object().ok_or_else(|| {
            CoreError::Parse(format!("expected a JSON object, got {}", json_kind(data)))
        })?;

        let application_id = value_to_i64("applicationId", require(map, "applicationId")?)?;
        let event_type_id = value_to_i64("eventTypeId", require(map, "eventTypeId")?)?;
        let headline = require_text(map, "headline")?;
        let body = require_text(map, "body")?;

        let mut event = Self::new(application_id, event_type_id, headline, body);

        match map.get("eventTime") {
            None | Some(Value::Null) => {}
            Some(v) => event.event_time = value_to_i64("eventTime", v)?,
        }

        match map.get("relatedEntities") {
            None | Some(Value::Null) => {}
            Some(v) => event.related_entities = entities_from_value(v)?,
        }

        Ok(event)
    }

    /// Wire representation of this event.
    ///
    /// `relatedEntities` is omitted when the event has no entities.
    pub fn to_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert("eventId".into(), json!(self.event_id));
        map.insert("applicationId".into(), json!(self.application_id));
        map.insert("eventTypeId".into(), json!(self.event_type_id));
        map.insert("eventTime".into(), json!(self.event_time));
        map.insert("headline".into(), json!(self.headline));
        map.insert("body".into(), json!(self.body));

        if !self.related_entities.is_empty() {
            let grouped: Map<String, Value> = group_by_type(&self.related_entities)
                .into_iter()
                .map(|(entity_type, ids)| (entity_type.to_string(), json!(ids)))
                .collect();
            map.insert("relatedEntities".into(), Value::Object(grouped));
        }

        Value::Object(map)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

fn require<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, CoreError> {
    map.get(key).ok_or(CoreError::MissingField(key))
}

fn require_text(map: &Map<String, Value>, key: &'static str) -> Result<String, CoreError> {
    match require(map, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(CoreError::invalid(
            key,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

/// Expand `{ "<type>": [id, ...], ... }` into a flat list of entities.
fn entities_from_value(value: &Value) -> Result<Vec<Entity>, CoreError> {
    let groups = value.as_object().ok_or_else(|| {
        CoreError::invalid(
            "relatedEntities",
            format!("expected an object, got {}", json_kind(value)),
        )
    })?;

    let mut entities = Vec::new();
    for (type_key, ids) in groups {
        let entity_type = parse_i64("relatedEntities", type_key)?;
        let ids = ids.as_array().ok_or_else(|| {
            CoreError::invalid(
                "relatedEntities",
                format!("ids for entity type {type_key} must be an array"),
            )
        })?;
        for id in ids {
            entities.push(Entity::new(entity_type, value_to_i64("relatedEntities", id)?));
        }
    }
    Ok(entities)
}

/// Group entity ids by type, keeping first-seen order for both types and ids.
fn group_by_type(entities: &[Entity]) -> Vec<(i64, Vec<i64>)> {
    let mut groups: Vec<(i64, Vec<i64>)> = Vec::new();
    for entity in entities {
        match groups.iter_mut().find(|(t, _)| *t == entity.entity_type) {
            Some((_, ids)) => ids.push(entity.entity_id),
            None => groups.push((entity.entity_type, vec![entity.entity_id])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample() -> Value {
        json!({
            "applicationId": 1,
            "eventTypeId": 1,
            "eventTime": 10,
            "headline": "headline for app 1, event type 1, time 10",
            "body": "body for app 1, event type 1, time 10",
            "relatedEntities": { "1": [14, 16], "2": [1, 4] }
        })
    }

    #[test]
    fn from_dict_reads_all_fields() {
        let evt = Event::from_dict(&sample()).unwrap();
        assert_eq!(evt.application_id, 1);
        assert_eq!(evt.event_type_id, 1);
        assert_eq!(evt.event_time, 10);
        assert_eq!(evt.headline, "headline for app 1, event type 1, time 10");
        assert_eq!(evt.body, "body for app 1, event type 1, time 10");
        assert_eq!(evt.related_entities.len(), 4);
        assert!(evt.related_entities.contains(&Entity::new(1, 14)));
        assert!(evt.related_entities.contains(&Entity::new(2, 4)));
        assert!(!evt.is_saved());
    }

    #[test]
    fn round_trip_preserves_scalar_fields() {
        let input = sample();
        let output = Event::from_dict(&input).unwrap().to_dict();
        for key in ["applicationId", "eventTypeId", "headline", "body", "eventTime"] {
            assert_eq!(output[key], input[key], "{key} should round-trip");
        }
        assert_eq!(output["eventId"], Value::Null);
    }

    #[test]
    fn missing_required_field_is_reported() {
        for key in ["applicationId", "eventTypeId", "headline", "body"] {
            let mut data = sample();
            data.as_object_mut().unwrap().remove(key);

            assert_matches!(Event::from_dict(&data), Err(CoreError::MissingField(k)) if k == key);

            let text = serde_json::to_string(&data).unwrap();
            assert_matches!(Event::from_json(&text), Err(CoreError::MissingField(k)) if k == key);
        }
    }

    #[test]
    fn empty_string_is_a_parse_error() {
        assert_matches!(Event::from_json(""), Err(CoreError::Parse(_)));
        assert_matches!(Event::from_json("{not json"), Err(CoreError::Parse(_)));
        assert_matches!(Event::from_json("[1, 2]"), Err(CoreError::Parse(_)));
    }

    #[test]
    fn non_numeric_ids_are_invalid_arguments() {
        let mut data = sample();
        data["applicationId"] = json!("app-one");
        assert_matches!(Event::from_dict(&data), Err(CoreError::InvalidArgument { .. }));

        let mut data = sample();
        data["relatedEntities"] = json!({ "users": [1] });
        assert_matches!(Event::from_dict(&data), Err(CoreError::InvalidArgument { .. }));

        let mut data = sample();
        data["relatedEntities"] = json!({ "1": 14 });
        assert_matches!(Event::from_dict(&data), Err(CoreError::InvalidArgument { .. }));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let mut data = sample();
        data["applicationId"] = json!("2");
        data["eventTime"] = json!("30");
        let evt = Event::from_dict(&data).unwrap();
        assert_eq!(evt.application_id, 2);
        assert_eq!(evt.event_time, 30);
    }

    #[test]
    fn event_time_defaults_to_now() {
        let mut data = sample();
        data.as_object_mut().unwrap().remove("eventTime");

        let before = now_millis();
        let evt = Event::from_dict(&data).unwrap();
        let after = now_millis();

        assert!(evt.event_time >= before && evt.event_time <= after);
        assert!((Event::new(1, 1, "h", "b").event_time - now_millis()).abs() < 1_000);
    }

    #[test]
    fn to_dict_omits_empty_entities() {
        let evt = Event::new(1, 2, "h", "b");
        let dict = evt.to_dict();
        assert!(dict.get("relatedEntities").is_none());
    }

    #[test]
    fn to_dict_groups_entities_by_type() {
        let evt = Event::new(1, 2, "h", "b")
            .with_entity(1, 15)
            .with_entity(2, 4)
            .with_entity(1, 1)
            .with_entity(1, 16);
        let dict = evt.to_dict();
        assert_eq!(
            dict["relatedEntities"],
            json!({ "1": [15, 1, 16], "2": [4] })
        );
    }

    #[test]
    fn serialize_matches_to_dict() {
        let evt = Event::restore(7, 1, 2, "h".into(), "b".into(), 20, vec![Entity::new(3, 9)]);
        assert_eq!(serde_json::to_value(&evt).unwrap(), evt.to_dict());
        assert_eq!(evt.to_dict()["eventId"], json!(7));
    }

    #[test]
    fn mark_saved_only_once() {
        let mut evt = Event::new(1, 1, "h", "b");
        evt.mark_saved(5).unwrap();
        assert!(evt.is_saved());

        assert_matches!(evt.mark_saved(6), Err(CoreError::AlreadySaved(5)));
        assert_eq!(evt.event_id(), Some(5));
    }
}
