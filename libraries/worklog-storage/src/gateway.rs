//! Query gateway
//!
//! SQL is written with portable `?` markers. Before execution each marker is
//! rewritten, left to right, into a SQLite numbered parameter (`?1`, `?2`, ...)
//! and the parameter list is normalized so that empty strings and absent
//! values bind as NULL.
//!
//! Statements run as persistent prepared statements, so each physical
//! connection keeps its own cache keyed by SQL text. The cache capacity is set
//! on the connect options (see [`crate::PoolSettings`]).

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Row, SqliteConnection};
use std::fmt::Write as _;

/// Storage format of creation timestamps (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format of calendar days
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// A bindable parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Empty strings bind as NULL
    pub fn normalized(self) -> Self {
        match self {
            Value::Text(text) if text.is_empty() => Value::Null,
            other => other,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Text(value.format(DAY_FORMAT).to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Text(value.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Rewrite `?` markers into numbered parameters.
///
/// Only bare `?` markers are supported; SQL must not carry its own `?N` or
/// named parameters. Markers inside single-quoted literals, double-quoted
/// identifiers and `--` line comments are left alone. Returns the rewritten
/// SQL and the number of markers found.
pub fn rewrite_placeholders(sql: &str) -> (String, usize) {
    #[derive(Clone, Copy)]
    enum Scan {
        Code,
        Literal,
        Identifier,
        Comment,
    }

    let mut rewritten = String::with_capacity(sql.len() + 8);
    let mut markers = 0;
    let mut state = Scan::Code;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match (state, ch) {
            (Scan::Code, '?') => {
                markers += 1;
                let _ = write!(rewritten, "?{markers}");
                continue;
            }
            (Scan::Code, '\'') => Scan::Literal,
            (Scan::Literal, '\'') => Scan::Code,
            (Scan::Code, '"') => Scan::Identifier,
            (Scan::Identifier, '"') => Scan::Code,
            (Scan::Code, '-') if chars.peek() == Some(&'-') => Scan::Comment,
            (Scan::Comment, '\n') => Scan::Code,
            (current, _) => current,
        };
        rewritten.push(ch);
    }

    (rewritten, markers)
}

/// Rewrite markers, check the parameter count and normalize parameters
pub fn prepare(sql: &str, params: Vec<Value>) -> Result<(String, Vec<Value>)> {
    let (sql, markers) = rewrite_placeholders(sql);
    if markers != params.len() {
        return Err(StorageError::ParameterMismatch {
            markers,
            params: params.len(),
        });
    }
    let params = params.into_iter().map(Value::normalized).collect();
    Ok((sql, params))
}

fn bind_all<'q>(
    sql: &'q str,
    params: Vec<Value>,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = sqlx::query(sql).persistent(true);
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<i64>),
            Value::Int(v) => query.bind(v),
            Value::Real(v) => query.bind(v),
            Value::Text(v) => query.bind(v),
            Value::Bool(v) => query.bind(v),
        };
    }
    query
}

/// Run prepared SQL on a connection and collect the rows
pub(crate) async fn fetch_on(
    conn: &mut SqliteConnection,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<SqliteRow>> {
    tracing::trace!(sql, "fetch");
    Ok(bind_all(sql, params).fetch_all(conn).await?)
}

/// Run prepared SQL on a connection and report affected rows
pub(crate) async fn execute_on(
    conn: &mut SqliteConnection,
    sql: &str,
    params: Vec<Value>,
) -> Result<u64> {
    tracing::trace!(sql, "execute");
    Ok(bind_all(sql, params).execute(conn).await?.rows_affected())
}

/// The query surface shared by pooled sessions and transactional connections.
///
/// Implementors provide the two primitives on already rewritten SQL; every
/// other operation is derived from them. Table and column names passed to
/// `insert`, `update` and `delete` are trusted identifiers and are
/// interpolated into the SQL text.
#[async_trait]
pub trait Gateway: Send {
    /// Run SQL using numbered parameters and return all rows
    async fn fetch_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<SqliteRow>>;

    /// Run SQL using numbered parameters and return the affected row count
    async fn execute_prepared(&mut self, sql: &str, params: Vec<Value>) -> Result<u64>;

    /// Run a query and return its rows
    async fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<SqliteRow>> {
        let (sql, params) = prepare(sql, params)?;
        self.fetch_prepared(&sql, params).await
    }

    /// First row, or `None` for an empty result
    async fn query_row(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<SqliteRow>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// First column of the first row; `None` for no rows or a NULL value
    async fn query_value<T>(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite> + Send,
    {
        match self.query_row(sql, params).await? {
            Some(row) => Ok(row.try_get::<Option<T>, _>(0)?),
            None => Ok(None),
        }
    }

    /// First column of every row
    async fn query_vector<T>(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<T>>
    where
        T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite> + Send,
    {
        let rows = self.query(sql, params).await?;
        let values = rows
            .iter()
            .map(|row| row.try_get::<T, _>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Run a statement, returning the number of affected rows
    async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        let (sql, params) = prepare(sql, params)?;
        self.execute_prepared(&sql, params).await
    }

    /// Insert a row; with `return_id` the generated id is returned
    async fn insert(
        &mut self,
        table: &str,
        fields: Vec<(&'static str, Value)>,
        return_id: bool,
    ) -> Result<Option<i64>> {
        let columns: Vec<&str> = fields.iter().map(|(column, _)| *column).collect();
        let markers = vec!["?"; fields.len()].join(",");
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({markers})",
            columns.join(",")
        );
        let values = fields.into_iter().map(|(_, value)| value).collect();

        if !return_id {
            self.execute(&sql, values).await?;
            return Ok(None);
        }

        sql.push_str(" RETURNING id");
        self.query_value::<i64>(&sql, values).await
    }

    /// Update a row by id. An empty field set succeeds without touching the DB
    async fn update(
        &mut self,
        table: &str,
        id: i64,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = fields
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect();
        let sql = format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "));

        let mut values: Vec<Value> = fields.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Int(id));

        self.execute(&sql, values).await?;
        Ok(())
    }

    /// Delete a row by id, returning how many rows went away
    async fn delete(&mut self, table: &str, id: i64) -> Result<u64> {
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        self.execute(&sql, vec![Value::Int(id)]).await
    }
}
