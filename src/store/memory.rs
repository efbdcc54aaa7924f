//! In-memory store for tests and local development. Uses RwLock for thread-safe access.

use super::{ListQuery, Store};
use crate::error::AppError;
use crate::model::{Changes, Row};
use crate::schema::Table;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct TableData {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

/// Tables keyed by name. Ids come from a per-table counter and are never reused.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<&'static str, TableData>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Store(format!("lock poisoned: {}", e))
}

fn matches_filters(row: &Row, filters: &[(&str, i64)]) -> bool {
    filters
        .iter()
        .all(|(col, want)| row.get(*col).and_then(Value::as_i64) == Some(*want))
}

#[async_trait]
impl Store for InMemoryStore {
    async fn fetch_one(&self, table: &Table, id: i64) -> Result<Option<Row>, AppError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(table.name).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn fetch_many(&self, table: &Table, query: &ListQuery) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let Some(data) = tables.get(table.name) else {
            return Ok(Vec::new());
        };
        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(data
            .rows
            .values()
            .filter(|row| matches_filters(row, &query.filters))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_where_in(&self, table: &Table, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let Some(data) = tables.get(table.name) else {
            return Ok(Vec::new());
        };
        Ok(data
            .rows
            .values()
            .filter(|row| {
                row.get(column)
                    .and_then(Value::as_i64)
                    .is_some_and(|v| values.contains(&v))
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, table: &Table, changes: &Changes) -> Result<i64, AppError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let data = tables.entry(table.name).or_default();
        data.last_id += 1;
        let id = data.last_id;

        let mut row = Row::new();
        row.insert(table.pk.to_string(), Value::from(id));
        for name in table.writable_names() {
            row.insert(name.to_string(), Value::Null);
        }
        for (name, value) in changes.iter() {
            row.insert(name.to_string(), value.clone());
        }
        data.rows.insert(id, row);
        Ok(id)
    }

    async fn update(&self, table: &Table, id: i64, changes: &Changes) -> Result<bool, AppError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let Some(row) = tables.get_mut(table.name).and_then(|t| t.rows.get_mut(&id)) else {
            return Ok(false);
        };
        for (name, value) in changes.iter() {
            row.insert(name.to_string(), value.clone());
        }
        Ok(true)
    }

    async fn delete(&self, table: &Table, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        Ok(tables
            .get_mut(table.name)
            .and_then(|t| t.rows.remove(&id))
            .is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.tables.read().map_err(poisoned)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GENRE, MOVIE};
    use serde_json::json;

    fn changes(table: &Table, v: Value) -> Changes {
        let Value::Object(body) = v else { panic!("not an object") };
        Changes::for_insert(table, body).unwrap()
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let a = store.insert(&GENRE, &changes(&GENRE, json!({"name": "Drama"}))).await.unwrap();
        assert!(store.delete(&GENRE, a).await.unwrap());
        let b = store.insert(&GENRE, &changes(&GENRE, json!({"name": "Noir"}))).await.unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(!store.delete(&GENRE, a).await.unwrap());
    }

    #[tokio::test]
    async fn insert_fills_missing_columns_with_null() {
        let store = InMemoryStore::new();
        let id = store.insert(&MOVIE, &changes(&MOVIE, json!({"title": "Ran"}))).await.unwrap();
        let row = store.fetch_one(&MOVIE, id).await.unwrap().unwrap();
        assert_eq!(row["title"], json!("Ran"));
        assert_eq!(row["director_id"], Value::Null);
        assert_eq!(row["id"], json!(id));
    }

    #[tokio::test]
    async fn fetch_many_filters_before_window() {
        let store = InMemoryStore::new();
        for genre in [1, 2, 1, 1, 2] {
            store
                .insert(&MOVIE, &changes(&MOVIE, json!({"genre_id": genre})))
                .await
                .unwrap();
        }
        let query = ListQuery {
            filters: vec![("genre_id", 1)],
            limit: Some(1),
            offset: Some(1),
        };
        let rows = store.fetch_many(&MOVIE, &query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(3));
    }

    #[tokio::test]
    async fn update_reports_missing_rows() {
        let store = InMemoryStore::new();
        assert!(!store.update(&GENRE, 5, &Changes::default()).await.unwrap());
    }

    #[tokio::test]
    async fn where_in_on_unknown_table_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.fetch_where_in(&GENRE, "id", &[1]).await.unwrap().is_empty());
    }
}
