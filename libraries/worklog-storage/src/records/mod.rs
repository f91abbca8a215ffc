//! Work records

use crate::error::{translate, Result, StorageError};
use crate::gateway::{Gateway, Value, DAY_FORMAT, TIMESTAMP_FORMAT};
use crate::{Connection, Database};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::error::BoxDynError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use worklog_core::{ErrorKind, WorkRecord, WorkRecordPatch};

const SELECT_RECORDS: &str = "SELECT id, dt_created, user_id, dt_day, duration_sec, note, \
     is_under_hours, user_name FROM v_work";

/// Listing filter. `None` fields do not restrict the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub user_id: Option<i64>,
    /// First day included
    pub from: Option<NaiveDate>,
    /// Last day included
    pub to: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

/// Work record repository
#[derive(Debug, Clone)]
pub struct Records {
    db: Database,
}

impl Records {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist a new record and return it as stored (with creation time and
    /// computed fields).
    ///
    /// # Errors
    ///
    /// `unknown_user` when the owner does not exist, `duplicate_entry` on a
    /// uniqueness conflict, or the tag of the first missing required field.
    pub async fn add(&self, record: &WorkRecord) -> Result<WorkRecord> {
        if record.user_id() == 0 {
            return Err(ErrorKind::NoUserId.into());
        }
        let day = record.day().ok_or(ErrorKind::NoDate)?;
        if record.duration() == 0 {
            return Err(ErrorKind::NoDuration.into());
        }
        let note = record.note().ok_or(ErrorKind::NoNote)?;

        let fields = vec![
            ("dt_created", Value::from(Utc::now())),
            ("user_id", Value::from(record.user_id())),
            ("dt_day", Value::from(day)),
            ("duration_sec", Value::from(record.duration())),
            ("note", Value::from(note)),
        ];

        let mut conn = self.db.get_connection().await?;
        let inserted = conn.insert("work", fields, true).await;
        let id = conn
            .finish(inserted)
            .await
            .map_err(|e| {
                translate(
                    e,
                    Some(ErrorKind::DuplicateEntry),
                    Some(ErrorKind::UnknownUser),
                )
            })?
            .ok_or(sqlx::Error::RowNotFound)?;

        tracing::info!(record_id = id, user_id = record.user_id(), "Work record added");
        self.get(id)
            .await?
            .ok_or_else(|| ErrorKind::RecNotFound.into())
    }

    pub async fn get(&self, id: i64) -> Result<Option<WorkRecord>> {
        let mut session = self.db.session().await?;
        let row = session
            .query_row(&format!("{SELECT_RECORDS} WHERE id = ?"), vec![id.into()])
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    /// Records matching `filter`, ordered by day
    pub async fn get_all(&self, filter: &RecordFilter) -> Result<Vec<WorkRecord>> {
        let sql = format!(
            "{SELECT_RECORDS} \
             WHERE (? IS NULL OR user_id = ?) \
               AND (? IS NULL OR dt_day >= ?) \
               AND (? IS NULL OR dt_day <= ?) \
             ORDER BY dt_day, id"
        );
        let params = vec![
            Value::from(filter.user_id),
            Value::from(filter.user_id),
            Value::from(filter.from),
            Value::from(filter.from),
            Value::from(filter.to),
            Value::from(filter.to),
        ];

        let mut session = self.db.session().await?;
        let rows = session.query(&sql, params).await?;
        rows.iter().map(record_from_row).collect()
    }

    /// Apply the supplied fields and return the stored result.
    ///
    /// # Errors
    ///
    /// `rec_not_found` when no such record exists, `unknown_user` when the
    /// record is reassigned to a missing user.
    pub async fn update(&self, id: i64, patch: &WorkRecordPatch) -> Result<WorkRecord> {
        self.apply_update(id, None, patch).await
    }

    /// Like [`Records::update`], but only while the record still belongs to
    /// `owner`. The ownership check runs in the same transaction as the write,
    /// so a concurrent reassignment makes this fail with `rec_not_found`.
    pub async fn update_owned(
        &self,
        id: i64,
        owner: i64,
        patch: &WorkRecordPatch,
    ) -> Result<WorkRecord> {
        self.apply_update(id, Some(owner), patch).await
    }

    /// Delete a record, returning whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.apply_delete(id, None).await
    }

    /// Delete a record only while it still belongs to `owner`
    pub async fn delete_owned(&self, id: i64, owner: i64) -> Result<bool> {
        self.apply_delete(id, Some(owner)).await
    }

    async fn apply_update(
        &self,
        id: i64,
        owner: Option<i64>,
        patch: &WorkRecordPatch,
    ) -> Result<WorkRecord> {
        let mut conn = self.db.get_connection().await?;
        let outcome = update_existing(&mut conn, id, owner, patch_fields(patch)).await;
        conn.finish(outcome).await.map_err(|e| {
            translate(
                e,
                Some(ErrorKind::DuplicateEntry),
                Some(ErrorKind::UnknownUser),
            )
        })?;

        tracing::info!(record_id = id, "Work record updated");
        self.get(id)
            .await?
            .ok_or_else(|| ErrorKind::RecNotFound.into())
    }

    async fn apply_delete(&self, id: i64, owner: Option<i64>) -> Result<bool> {
        let mut conn = self.db.get_connection().await?;
        let deleted = conn
            .execute(
                "DELETE FROM work WHERE id = ? AND (? IS NULL OR user_id = ?)",
                vec![id.into(), owner.into(), owner.into()],
            )
            .await;
        let deleted = conn.finish(deleted).await?;

        if deleted > 0 {
            tracing::info!(record_id = id, "Work record deleted");
        }
        Ok(deleted > 0)
    }
}

async fn update_existing(
    conn: &mut Connection,
    id: i64,
    owner: Option<i64>,
    fields: Vec<(&'static str, Value)>,
) -> Result<()> {
    let current: Option<i64> = conn
        .query_value("SELECT user_id FROM work WHERE id = ?", vec![id.into()])
        .await?;
    match (current, owner) {
        (None, _) => return Err(ErrorKind::RecNotFound.into()),
        (Some(current), Some(expected)) if current != expected => {
            tracing::debug!(record_id = id, current, expected, "Record changed owner");
            return Err(ErrorKind::RecNotFound.into());
        }
        _ => {}
    }
    conn.update("work", id, fields).await
}

fn patch_fields(patch: &WorkRecordPatch) -> Vec<(&'static str, Value)> {
    let mut fields = Vec::new();
    if let Some(user_id) = patch.user_id() {
        fields.push(("user_id", Value::from(user_id)));
    }
    if let Some(day) = patch.day() {
        fields.push(("dt_day", Value::from(day)));
    }
    if let Some(duration) = patch.duration() {
        fields.push(("duration_sec", Value::from(duration)));
    }
    if let Some(note) = patch.note() {
        fields.push(("note", Value::from(note)));
    }
    fields
}

fn record_from_row(row: &SqliteRow) -> Result<WorkRecord> {
    read_record(row).map_err(|reason| {
        tracing::warn!(%reason, "Malformed work record row");
        StorageError::from(ErrorKind::BadFormat)
    })
}

fn read_record(row: &SqliteRow) -> std::result::Result<WorkRecord, BoxDynError> {
    let mut record = WorkRecord::default();
    record.set_id(row.try_get("id")?)?;
    record.set_user_id(row.try_get("user_id")?)?;
    record.set_duration(row.try_get("duration_sec")?)?;
    record.set_note(row.try_get::<&str, _>("note")?)?;

    let day = NaiveDate::parse_from_str(row.try_get::<&str, _>("dt_day")?, DAY_FORMAT)?;
    record.set_day_date(day);

    let created = parse_created(row.try_get::<&str, _>("dt_created")?)?;
    let is_under_hours = row.try_get::<i64, _>("is_under_hours")? != 0;
    let user_name: Option<String> = row.try_get("user_name")?;

    Ok(record.with_stored_fields(created, is_under_hours, user_name))
}

fn parse_created(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map(|dt| dt.and_utc())
}
