//! Row shapes for the `event` and `event_entity` tables.

use gupta_core::event::{Entity, Event};
use gupta_core::types::{DbId, EpochMillis};
use sqlx::FromRow;

/// One row of `event LEFT JOIN event_entity`.
///
/// The entity columns are `NULL` for events without related entities.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntityRow {
    pub id: DbId,
    pub application_id: i64,
    pub event_time: EpochMillis,
    pub event_type_id: i64,
    pub headline: String,
    pub body: String,
    pub entity_type: Option<i64>,
    pub entity_id: Option<i64>,
}

impl EventEntityRow {
    fn entity(&self) -> Option<Entity> {
        match (self.entity_type, self.entity_id) {
            (Some(entity_type), Some(entity_id)) => Some(Entity::new(entity_type, entity_id)),
            _ => None,
        }
    }
}

/// Fold joined rows into events.
///
/// Rows must arrive grouped by event id (consecutive rows for the same
/// event). Each event appears once, carrying every entity found for it.
pub fn assemble_events(rows: Vec<EventEntityRow>) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();

    for row in rows {
        let entity = row.entity();
        match events.last_mut() {
            Some(last) if last.event_id() == Some(row.id) => {
                last.related_entities.extend(entity);
            }
            _ => {
                events.push(Event::restore(
                    row.id,
                    row.application_id,
                    row.event_type_id,
                    row.headline,
                    row.body,
                    row.event_time,
                    entity.into_iter().collect(),
                ));
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: DbId, entity: Option<(i64, i64)>) -> EventEntityRow {
        EventEntityRow {
            id,
            application_id: 1,
            event_time: id * 10,
            event_type_id: 1,
            headline: format!("headline {id}"),
            body: format!("body {id}"),
            entity_type: entity.map(|(t, _)| t),
            entity_id: entity.map(|(_, i)| i),
        }
    }

    #[test]
    fn rows_fold_into_events() {
        let events = assemble_events(vec![
            row(1, Some((1, 14))),
            row(1, Some((1, 16))),
            row(1, Some((2, 4))),
            row(2, None),
            row(3, Some((1, 15))),
        ]);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_id(), Some(1));
        assert_eq!(
            events[0].related_entities,
            vec![Entity::new(1, 14), Entity::new(1, 16), Entity::new(2, 4)]
        );
        assert!(events[1].related_entities.is_empty());
        assert_eq!(events[1].event_time, 20);
        assert_eq!(events[2].related_entities, vec![Entity::new(1, 15)]);
        assert!(events.iter().all(Event::is_saved));
    }

    #[test]
    fn no_rows_no_events() {
        assert!(assemble_events(Vec::new()).is_empty());
    }
}
