//! User accounts

use crate::error::{translate, Result, StorageError};
use crate::gateway::{Gateway, Value};
use crate::{Connection, Database};
use sqlx::error::BoxDynError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use worklog_core::{ErrorKind, Role, User, UserPatch};

const SELECT_USERS: &str =
    "SELECT id, role_id, email, pwd_hash, max_hours, full_name FROM v_users";

/// User repository
#[derive(Debug, Clone)]
pub struct Users {
    db: Database,
}

impl Users {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist a new user and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// `email_in_use` when the address is taken (case-insensitively), or the
    /// tag of the first missing required field.
    pub async fn add(&self, user: &User) -> Result<User> {
        let name = user.name().ok_or(ErrorKind::NoName)?;
        let email = user.email().ok_or(ErrorKind::NoEmail)?;
        let pwd_hash = user.password_hash().ok_or(ErrorKind::NoPassword)?;

        let fields = vec![
            ("full_name", Value::from(name)),
            ("role_id", Value::from(user.role().value())),
            ("email", Value::from(email)),
            ("pwd_hash", Value::from(pwd_hash)),
            ("max_hours", Value::from(user.working_hours_preference())),
        ];

        let mut conn = self.db.get_connection().await?;
        let inserted = conn.insert("users", fields, true).await;
        let id = conn
            .finish(inserted)
            .await
            .map_err(|e| translate(e, Some(ErrorKind::EmailInUse), None))?
            .ok_or(sqlx::Error::RowNotFound)?;

        tracing::info!(user_id = id, "User added");
        Ok(user.with_id(id)?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let mut session = self.db.session().await?;
        let row = session
            .query_row(&format!("{SELECT_USERS} WHERE id = ?"), vec![id.into()])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Look up by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut session = self.db.session().await?;
        let row = session
            .query_row(
                &format!("{SELECT_USERS} WHERE email = ? COLLATE NOCASE"),
                vec![email.to_lowercase().into()],
            )
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_all(&self) -> Result<Vec<User>> {
        let mut session = self.db.session().await?;
        let rows = session
            .query(&format!("{SELECT_USERS} ORDER BY id"), vec![])
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Apply the supplied fields and return the stored result.
    ///
    /// Existence is checked inside the same transaction as the write.
    ///
    /// # Errors
    ///
    /// `user_not_found` when no such user exists, `email_in_use` when the new
    /// address belongs to someone else.
    pub async fn update(&self, id: i64, patch: &UserPatch) -> Result<User> {
        let mut conn = self.db.get_connection().await?;
        let outcome = update_existing(&mut conn, id, patch_fields(patch)).await;
        conn.finish(outcome)
            .await
            .map_err(|e| translate(e, Some(ErrorKind::EmailInUse), None))?;

        tracing::info!(user_id = id, "User updated");
        self.get(id)
            .await?
            .ok_or_else(|| ErrorKind::UserNotFound.into())
    }

    /// Delete a user, returning whether a row was removed.
    ///
    /// # Errors
    ///
    /// `user_has_records` while work records still reference the user.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut conn = self.db.get_connection().await?;
        let deleted = conn.delete("users", id).await;
        let deleted = conn
            .finish(deleted)
            .await
            .map_err(|e| translate(e, None, Some(ErrorKind::UserHasRecords)))?;

        if deleted > 0 {
            tracing::info!(user_id = id, "User deleted");
        }
        Ok(deleted > 0)
    }
}

async fn update_existing(
    conn: &mut Connection,
    id: i64,
    fields: Vec<(&'static str, Value)>,
) -> Result<()> {
    let existing: Option<i64> = conn
        .query_value("SELECT id FROM users WHERE id = ?", vec![id.into()])
        .await?;
    if existing.is_none() {
        return Err(ErrorKind::UserNotFound.into());
    }
    conn.update("users", id, fields).await
}

fn patch_fields(patch: &UserPatch) -> Vec<(&'static str, Value)> {
    let mut fields = Vec::new();
    if let Some(name) = patch.name() {
        fields.push(("full_name", Value::from(name)));
    }
    if let Some(role) = patch.role() {
        fields.push(("role_id", Value::from(role.value())));
    }
    if let Some(email) = patch.email() {
        fields.push(("email", Value::from(email)));
    }
    if let Some(hash) = patch.password_hash() {
        fields.push(("pwd_hash", Value::from(hash)));
    }
    if let Some(seconds) = patch.working_hours() {
        // 0 clears the preference
        fields.push(("max_hours", Value::from((seconds > 0).then_some(seconds))));
    }
    fields
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    read_user(row).map_err(|reason| {
        tracing::warn!(%reason, "Malformed user row");
        StorageError::from(ErrorKind::BadFormat)
    })
}

fn read_user(row: &SqliteRow) -> std::result::Result<User, BoxDynError> {
    let id: i64 = row.try_get("id")?;
    let role_id: i64 = row.try_get("role_id")?;
    let role = Role::from_value(role_id).unwrap_or_else(|| {
        tracing::warn!(user_id = id, role_id, "Unknown role, using default");
        Role::default()
    });

    let mut user = User::new();
    user.set_id(id)?;
    user.set_role(role);
    user.set_name(row.try_get::<&str, _>("full_name")?)?;
    user.set_email(row.try_get::<&str, _>("email")?)?;
    user.set_password_hash(row.try_get::<&str, _>("pwd_hash")?)?;
    user.set_working_hours(row.try_get::<Option<i64>, _>("max_hours")?.unwrap_or(0))?;

    Ok(user)
}
