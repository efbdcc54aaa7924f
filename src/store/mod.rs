//! Storage contract shared by the PostgreSQL and in-memory backends.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{ensure_database_exists, ensure_tables, PgStore};

use crate::error::AppError;
use crate::model::{Changes, Row};
use crate::schema::Table;
use async_trait::async_trait;

/// Ordered scan options: equality filters on integer columns, then offset and limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<(&'static str, i64)>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

/// Row-level access to the persisted tables. Every method is one implicit-commit operation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_one(&self, table: &Table, id: i64) -> Result<Option<Row>, AppError>;

    /// Rows matching every filter, ascending by primary key.
    async fn fetch_many(&self, table: &Table, query: &ListQuery) -> Result<Vec<Row>, AppError>;

    /// Rows whose `column` is one of `values`, ascending by primary key.
    async fn fetch_where_in(&self, table: &Table, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError>;

    /// Insert and return the assigned primary key.
    async fn insert(&self, table: &Table, changes: &Changes) -> Result<i64, AppError>;

    /// Apply `changes` to row `id`. `false` when no such row exists.
    async fn update(&self, table: &Table, id: i64, changes: &Changes) -> Result<bool, AppError>;

    /// `false` when no such row exists.
    async fn delete(&self, table: &Table, id: i64) -> Result<bool, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
