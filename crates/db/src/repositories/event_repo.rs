//! Repository for the `event` and `event_entity` tables.

use gupta_core::error::CoreError;
use gupta_core::event::{Entity, Event};
use gupta_core::query::EventQuery;
use gupta_core::types::DbId;
use sqlx::PgPool;

use crate::error::EventStoreError;
use crate::filter::{bind_filter_values, EventFilter};
use crate::models::event::{assemble_events, EventEntityRow};

/// Column list for `event e LEFT JOIN event_entity ee` queries.
const JOINED_COLUMNS: &str = "\
    e.id, e.application_id, e.event_time, e.event_type_id, e.headline, e.body, \
    ee.entity_type, ee.entity_id";

/// Join clause shared by all event reads. LEFT so events without entities
/// are kept.
const JOINED_FROM: &str = "event e LEFT JOIN event_entity ee ON ee.event_id = e.id";

/// Rows per multi-row INSERT into `event_entity` (3 binds each, well under
/// the PostgreSQL limit of 65535 bind parameters).
const ENTITY_INSERT_CHUNK: usize = 1000;

/// Provides save and query operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Persist a new event and its related entities in one transaction.
    ///
    /// Fails with [`CoreError::AlreadySaved`] if the event already has an id.
    /// On success the generated id is recorded on `event` and returned. On
    /// any storage failure the transaction is rolled back and `event` is left
    /// unsaved.
    pub async fn save(pool: &PgPool, event: &mut Event) -> Result<DbId, EventStoreError> {
        if let Some(existing) = event.event_id() {
            return Err(CoreError::AlreadySaved(existing).into());
        }

        let mut tx = pool.begin().await?;

        let event_id: DbId = sqlx::query_scalar(
            "INSERT INTO event \
                (application_id, event_time, event_type_id, headline, body) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(event.application_id)
        .bind(event.event_time)
        .bind(event.event_type_id)
        .bind(&event.headline)
        .bind(&event.body)
        .fetch_one(&mut *tx)
        .await?;

        if !event.related_entities.is_empty() {
            Self::insert_entities_inner(&mut tx, event_id, &event.related_entities).await?;
        }

        tx.commit().await?;
        event.mark_saved(event_id)?;

        tracing::debug!(
            event_id,
            application_id = event.application_id,
            entity_count = event.related_entities.len(),
            "Saved event"
        );

        Ok(event_id)
    }

    /// Load all events matching the query, each with its full entity list.
    ///
    /// The entity filter only selects which events match; matched events
    /// still carry every related entity. Results are ordered by event id.
    pub async fn load(pool: &PgPool, query: &EventQuery) -> Result<Vec<Event>, sqlx::Error> {
        let (where_clause, bind_values, _) = EventFilter::from_query(query).render(1);

        let sql = format!(
            "SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} {where_clause} ORDER BY e.id, ee.id"
        );

        let rows = bind_filter_values(sqlx::query_as::<_, EventEntityRow>(&sql), &bind_values)
            .fetch_all(pool)
            .await?;

        let events = assemble_events(rows);

        tracing::debug!(
            application_id = query.application_id,
            start = query.start,
            end = query.end,
            event_type_id = query.event_type_id,
            matched = events.len(),
            "Loaded events"
        );

        Ok(events)
    }

    /// Find a single event by id, with its related entities.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let sql =
            format!("SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} WHERE e.id = $1 ORDER BY ee.id");
        let rows = sqlx::query_as::<_, EventEntityRow>(&sql)
            .bind(id)
            .fetch_all(pool)
            .await?;
        Ok(assemble_events(rows).into_iter().next())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Bulk-insert entity rows for `event_id` within an existing transaction.
    async fn insert_entities_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
        entities: &[Entity],
    ) -> Result<(), sqlx::Error> {
        for chunk in entities.chunks(ENTITY_INSERT_CHUNK) {
            let mut query =
                String::from("INSERT INTO event_entity (event_id, entity_type, entity_id) VALUES ");
            let mut param_idx = 1u32;

            for (i, _) in chunk.iter().enumerate() {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!(
                    "(${}, ${}, ${})",
                    param_idx,
                    param_idx + 1,
                    param_idx + 2
                ));
                param_idx += 3;
            }

            let mut q = sqlx::query(&query);
            for entity in chunk {
                q = q.bind(event_id).bind(entity.entity_type).bind(entity.entity_id);
            }
            q.execute(&mut **tx).await?;
        }

        Ok(())
    }
}
