//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from table descriptors.

use crate::model::Changes;
use crate::schema::Table;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from descriptors).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// Placeholder with a cast to the column's type, so untyped NULLs and widened numbers bind correctly.
fn placeholder(table: &Table, column: &str, n: u32) -> String {
    table
        .column(column)
        .map(|c| format!("${}::{}", n, c.ty.pg_type()))
        .unwrap_or_else(|| format!("${}", n))
}

/// Primary key followed by every writable column.
fn select_column_list(table: &Table) -> String {
    std::iter::once(table.pk)
        .chain(table.writable_names())
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key. Binds the id as the sole param.
pub fn select_by_id(table: &Table, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(table),
        quoted(table.name),
        quoted(table.pk),
        n
    );
    q
}

/// SELECT with equality filters, ORDER BY pk, optional LIMIT/OFFSET. Filter params bind as
/// bigint without a cast, so an id wider than the column compares unequal instead of failing.
pub fn select_list(
    table: &Table,
    filters: &[(&str, i64)],
    limit: Option<u32>,
    offset: Option<u64>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if table.column(col).is_none() {
            continue;
        }
        let n = q.push_param(Value::from(*val));
        where_parts.push(format!("{} = ${}", quoted(col), n));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let order_clause = format!(" ORDER BY {} ASC", quoted(table.pk));
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(table),
        quoted(table.name),
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// SELECT WHERE column IN ($1, $2, ...) ORDER BY pk. Used for batch-fetching referenced rows.
pub fn select_by_column_in(table: &Table, column: &str, values: &[i64]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = select_column_list(table);
    if values.is_empty() {
        q.sql = format!("SELECT {} FROM {} WHERE 1 = 0", cols, quoted(table.name));
        return q;
    }
    let placeholders: Vec<String> = values
        .iter()
        .map(|v| format!("${}", q.push_param(Value::from(*v))))
        .collect();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {}",
        cols,
        quoted(table.name),
        quoted(column),
        placeholders.join(", "),
        quoted(table.pk)
    );
    q
}

/// INSERT the given columns; the pk comes from the table's sequence and is returned.
pub fn insert(table: &Table, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, value) in changes.iter() {
        let n = q.push_param(value.clone());
        cols.push(quoted(name));
        placeholders.push(placeholder(table, name, n));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(table.name),
            quoted(table.pk)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            quoted(table.pk)
        )
    };
    q
}

/// UPDATE by id: SET only the given columns. Returns the pk of the matched row.
pub fn update(table: &Table, id: i64, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, value) in changes.iter() {
        let n = q.push_param(value.clone());
        sets.push(format!("{} = {}", quoted(name), placeholder(table, name, n)));
    }
    let id_param = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        quoted(table.pk),
        id_param,
        quoted(table.pk)
    );
    q
}

/// DELETE by id.
pub fn delete(table: &Table, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        quoted(table.name),
        quoted(table.pk),
        n,
        quoted(table.pk)
    );
    q
}

/// CREATE TABLE IF NOT EXISTS from the descriptor. References become foreign keys.
pub fn create_table(table: &Table) -> String {
    let mut defs = vec![format!("{} SERIAL PRIMARY KEY", quoted(table.pk))];
    for c in table.columns {
        let def = match c.ty {
            crate::schema::ColumnType::Reference(target) => format!(
                "{} {} REFERENCES {} ({})",
                quoted(c.name),
                c.ty.pg_type(),
                quoted(target),
                quoted("id")
            ),
            _ => format!("{} {}", quoted(c.name), c.ty.pg_type()),
        };
        defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(table.name),
        defs.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::schema::{DIRECTOR, GENRE, MOVIE};
    use serde_json::json;

    fn changes(table: &Table, v: Value) -> Changes {
        let Value::Object(body) = v else { panic!("not an object") };
        let body: Row = body;
        Changes::for_merge(table, body).unwrap()
    }

    #[test]
    fn list_with_filters_and_window() {
        let q = select_list(&MOVIE, &[("genre_id", 3), ("director_id", 1)], Some(2), Some(4));
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"title\", \"description\", \"trailer\", \"year\", \"rating\", \"genre_id\", \"director_id\" \
             FROM \"movie\" WHERE \"genre_id\" = $1 AND \"director_id\" = $2 \
             ORDER BY \"id\" ASC LIMIT 2 OFFSET 4"
        );
        assert_eq!(q.params, vec![json!(3), json!(1)]);
    }

    #[test]
    fn wide_filter_values_bind_uncast() {
        let q = select_list(&MOVIE, &[("genre_id", 99_999_999_999)], None, None);
        assert!(q.sql.ends_with("WHERE \"genre_id\" = $1 ORDER BY \"id\" ASC"));
        assert_eq!(q.params, vec![json!(99_999_999_999_i64)]);
    }

    #[test]
    fn list_without_options_is_a_plain_ordered_scan() {
        let q = select_list(&GENRE, &[], None, None);
        assert_eq!(q.sql, "SELECT \"id\", \"name\" FROM \"genre\" ORDER BY \"id\" ASC");
        assert!(q.params.is_empty());
    }

    #[test]
    fn list_drops_filters_on_unknown_columns() {
        let q = select_list(&DIRECTOR, &[("genre_id", 3)], None, None);
        assert!(!q.sql.contains("WHERE"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn by_column_in_binds_every_value() {
        let q = select_by_column_in(&DIRECTOR, "id", &[4, 9]);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"name\" FROM \"director\" WHERE \"id\" IN ($1, $2) ORDER BY \"id\""
        );
        assert_eq!(q.params, vec![json!(4), json!(9)]);

        let empty = select_by_column_in(&DIRECTOR, "id", &[]);
        assert!(empty.sql.ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn insert_casts_each_value() {
        let q = insert(&MOVIE, &changes(&MOVIE, json!({"title": "Alien", "rating": 8.5})));
        assert_eq!(
            q.sql,
            "INSERT INTO \"movie\" (\"rating\", \"title\") VALUES ($1::double precision, $2::text) RETURNING \"id\""
        );
        assert_eq!(q.params, vec![json!(8.5), json!("Alien")]);
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        let q = insert(&GENRE, &Changes::default());
        assert_eq!(q.sql, "INSERT INTO \"genre\" DEFAULT VALUES RETURNING \"id\"");
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(&DIRECTOR, 12, &changes(&DIRECTOR, json!({"name": "Scott"})));
        assert_eq!(
            q.sql,
            "UPDATE \"director\" SET \"name\" = $1::text WHERE \"id\" = $2 RETURNING \"id\""
        );
        assert_eq!(q.params, vec![json!("Scott"), json!(12)]);
    }

    #[test]
    fn movie_ddl_declares_foreign_keys() {
        let ddl = create_table(&MOVIE);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"movie\" (\"id\" SERIAL PRIMARY KEY"));
        assert!(ddl.contains("\"genre_id\" integer REFERENCES \"genre\" (\"id\")"));
        assert!(ddl.contains("\"director_id\" integer REFERENCES \"director\" (\"id\")"));
        assert!(ddl.contains("\"rating\" double precision"));
    }
}
