//! Field-presence updates
//!
//! A patch carries only the attributes a caller actually supplied. `None`
//! means "leave unchanged"; there is no way to express "clear to empty" for
//! required fields. The working-hours preference is the one optional
//! attribute, and `Some(0)` clears it.

use super::user::hash_password;
use super::Role;
use crate::error::Result;
use crate::validation;
use chrono::NaiveDate;

/// Partial update of a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    name: Option<String>,
    email: Option<String>,
    pwd_hash: Option<String>,
    role: Option<Role>,
    working_hours: Option<u32>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = Some(validation::validate_name(name)?.to_string());
        Ok(())
    }

    /// Stored lower-cased, matching how user emails are written
    pub fn set_email(&mut self, email: &str) -> Result<()> {
        self.email = Some(validation::validate_email(email)?.to_lowercase());
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.pwd_hash = Some(hash_password(password)?);
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    pub fn set_role_id(&mut self, role_id: i64) -> Result<()> {
        self.role = Some(Role::try_from(role_id)?);
        Ok(())
    }

    pub fn set_working_hours(&mut self, seconds: i64) -> Result<()> {
        self.working_hours = Some(validation::validate_working_hours(seconds)?);
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.pwd_hash.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn working_hours(&self) -> Option<u32> {
        self.working_hours
    }

    pub fn changes_role(&self) -> bool {
        self.role.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Partial update of a work record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkRecordPatch {
    user_id: Option<i64>,
    day: Option<NaiveDate>,
    duration: Option<u32>,
    note: Option<String>,
}

impl WorkRecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user_id(&mut self, user_id: i64) -> Result<()> {
        self.user_id = Some(validation::validate_user_id(user_id)?);
        Ok(())
    }

    pub fn set_day(&mut self, day: &str) -> Result<()> {
        self.day = Some(validation::parse_day(day)?);
        Ok(())
    }

    pub fn set_duration(&mut self, duration: i64) -> Result<()> {
        self.duration = Some(validation::validate_duration(duration)?);
        Ok(())
    }

    pub fn set_note(&mut self, note: &str) -> Result<()> {
        self.note = Some(validation::validate_note(note)?.to_string());
        Ok(())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
