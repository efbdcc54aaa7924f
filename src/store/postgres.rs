//! PostgreSQL store and startup bootstrap (database + tables).

use super::{ListQuery, Store};
use crate::error::{AppError, ConfigError};
use crate::model::{Changes, Row};
use crate::schema::{ColumnType, Table, TABLES};
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::{ConnectOptions, PgPool, Postgres, Row as _};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn query_many(&self, table: &Table, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q).fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_json(table, r)).collect()
    }

    /// Runs a statement returning the pk of the affected row, if any.
    async fn returning_pk(&self, table: &Table, q: &QueryBuf) -> Result<Option<i64>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(&self.pool).await?;
        match row {
            Some(r) => Ok(Some(i64::from(r.try_get::<i32, _>(table.pk)?))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn fetch_one(&self, table: &Table, id: i64) -> Result<Option<Row>, AppError> {
        let q = sql::select_by_id(table, id);
        Ok(self.query_many(table, &q).await?.into_iter().next())
    }

    async fn fetch_many(&self, table: &Table, query: &ListQuery) -> Result<Vec<Row>, AppError> {
        let q = sql::select_list(table, &query.filters, query.limit, query.offset);
        self.query_many(table, &q).await
    }

    async fn fetch_where_in(&self, table: &Table, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_by_column_in(table, column, values);
        self.query_many(table, &q).await
    }

    async fn insert(&self, table: &Table, changes: &Changes) -> Result<i64, AppError> {
        let q = sql::insert(table, changes);
        self.returning_pk(table, &q)
            .await?
            .ok_or_else(|| AppError::Store(format!("insert into {} returned no id", table.name)))
    }

    async fn update(&self, table: &Table, id: i64, changes: &Changes) -> Result<bool, AppError> {
        if changes.is_empty() {
            return Ok(self.fetch_one(table, id).await?.is_some());
        }
        let q = sql::update(table, id, changes);
        Ok(self.returning_pk(table, &q).await?.is_some())
    }

    async fn delete(&self, table: &Table, id: i64) -> Result<bool, AppError> {
        let q = sql::delete(table, id);
        Ok(self.returning_pk(table, &q).await?.is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

/// Decode by the descriptor's column types rather than probing each cell.
fn row_to_json(table: &Table, row: &PgRow) -> Result<Row, AppError> {
    let mut map = Row::new();
    let id: i32 = row.try_get(table.pk)?;
    map.insert(table.pk.to_string(), Value::from(id));
    for c in table.columns {
        let v = match c.ty {
            ColumnType::Text => row.try_get::<Option<String>, _>(c.name)?.map(Value::String),
            ColumnType::Integer | ColumnType::Reference(_) => {
                row.try_get::<Option<i32>, _>(c.name)?.map(Value::from)
            }
            ColumnType::Float => row
                .try_get::<Option<f64>, _>(c.name)?
                .and_then(Number::from_f64)
                .map(Value::Number),
        };
        map.insert(c.name.to_string(), v.unwrap_or(Value::Null));
    }
    Ok(map)
}

/// Create the entity tables if missing, referenced tables first.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), AppError> {
    for table in TABLES {
        let ddl = sql::create_table(table);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// `postgres` maintenance database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|e| {
        tracing::debug!(error = %e, "unparsable DATABASE_URL");
        invalid_database_url(database_url)
    })?;
    let mut conn = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a connection URL into (maintenance-database URL, target database name).
fn split_database_name(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url.rfind('/').ok_or_else(|| invalid_database_url(url))? + 1;
    let (base, rest) = url.split_at(path_start);
    let (db_name, query) = match rest.split_once('?') {
        Some((name, query)) => (name.trim(), Some(query)),
        None => (rest.trim(), None),
    };
    let admin_url = match query {
        Some(query) => format!("{}postgres?{}", base, query),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_name.to_string()))
}

fn invalid_database_url(url: &str) -> ConfigError {
    ConfigError::InvalidVar {
        name: "DATABASE_URL",
        value: url.to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
