//! Predicate tree for event queries, rendered to parameterized SQL.
//!
//! Predicates are AND-ed together. The entity match is a single
//! [`Predicate::HasAnyEntity`] node that renders as an `EXISTS` semi-join
//! against `event_entity`, so its inner OR can never bleed into the
//! surrounding AND chain. Every value is emitted as a `$n` placeholder and
//! returned in the bind list; no value is ever written into the SQL text.
//!
//! Rendered SQL assumes the `event` table is aliased as `e`.

use gupta_core::event::Entity;
use gupta_core::query::EventQuery;

/// Filterable columns of the `event` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventColumn {
    ApplicationId,
    EventTime,
    EventTypeId,
}

impl EventColumn {
    fn as_sql(self) -> &'static str {
        match self {
            EventColumn::ApplicationId => "e.application_id",
            EventColumn::EventTime => "e.event_time",
            EventColumn::EventTypeId => "e.event_type_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(EventColumn, i64),
    Gt(EventColumn, i64),
    Lt(EventColumn, i64),
    /// The event has at least one related entity equal to one of the pairs.
    HasAnyEntity(Vec<Entity>),
}

/// Conjunction of [`Predicate`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    predicates: Vec<Predicate>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Translate validated query parameters into predicates.
    pub fn from_query(query: &EventQuery) -> Self {
        let mut filter = Self::new()
            .and(Predicate::Eq(EventColumn::ApplicationId, query.application_id))
            .and(Predicate::Gt(EventColumn::EventTime, query.start));

        if let Some(end) = query.end {
            filter = filter.and(Predicate::Lt(EventColumn::EventTime, end));
        }
        if let Some(event_type_id) = query.event_type_id {
            filter = filter.and(Predicate::Eq(EventColumn::EventTypeId, event_type_id));
        }
        if let Some(ref entity_ids) = query.entity_ids {
            filter = filter.and(Predicate::HasAnyEntity(entity_ids.pairs()));
        }
        filter
    }

    /// Render a WHERE clause with placeholders starting at `$first_bind_idx`.
    ///
    /// Returns `(where_clause, bind_values, next_bind_index)`.
    /// The `where_clause` is empty if there are no predicates, or starts with `WHERE `.
    pub fn render(&self, first_bind_idx: u32) -> (String, Vec<i64>, u32) {
        let mut conditions: Vec<String> = Vec::with_capacity(self.predicates.len());
        let mut bind_idx = first_bind_idx;
        let mut bind_values: Vec<i64> = Vec::new();

        for predicate in &self.predicates {
            let condition = match predicate {
                Predicate::Eq(col, v) => compare(*col, "=", *v, &mut bind_idx, &mut bind_values),
                Predicate::Gt(col, v) => compare(*col, ">", *v, &mut bind_idx, &mut bind_values),
                Predicate::Lt(col, v) => compare(*col, "<", *v, &mut bind_idx, &mut bind_values),
                Predicate::HasAnyEntity(pairs) => {
                    render_entity_exists(pairs, &mut bind_idx, &mut bind_values)
                }
            };
            conditions.push(condition);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, bind_values, bind_idx)
    }
}

fn compare(
    column: EventColumn,
    op: &str,
    value: i64,
    bind_idx: &mut u32,
    bind_values: &mut Vec<i64>,
) -> String {
    let sql = format!("{} {op} ${bind_idx}", column.as_sql());
    *bind_idx += 1;
    bind_values.push(value);
    sql
}

fn render_entity_exists(
    pairs: &[Entity],
    bind_idx: &mut u32,
    bind_values: &mut Vec<i64>,
) -> String {
    // OR over zero alternatives.
    if pairs.is_empty() {
        return "FALSE".to_string();
    }

    let alternatives: Vec<String> = pairs
        .iter()
        .map(|pair| {
            let sql = format!(
                "(m.entity_type = ${} AND m.entity_id = ${})",
                *bind_idx,
                *bind_idx + 1
            );
            *bind_idx += 2;
            bind_values.push(pair.entity_type);
            bind_values.push(pair.entity_id);
            sql
        })
        .collect();

    format!(
        "EXISTS (SELECT 1 FROM event_entity m WHERE m.event_id = e.id AND ({}))",
        alternatives.join(" OR ")
    )
}

/// Bind rendered filter values to a sqlx `QueryAs`.
pub fn bind_filter_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &[i64],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for &v in bind_values {
        q = q.bind(v);
    }
    q
}
