/// User domain type
use super::Role;
use crate::error::{DomainError, ErrorKind, Result};
use crate::validation;
use std::fmt;

/// bcrypt work factor for stored password hashes
pub const PASSWORD_HASH_COST: u32 = 10;

/// User account
///
/// Every setter validates before assigning, so a rejected value leaves the
/// previous one in place.
#[derive(Clone, Default)]
pub struct User {
    id: i64,
    email: Option<String>,
    full_name: Option<String>,
    pwd_hash: Option<String>,
    role: Role,
    working_hours: u32,
}

impl User {
    /// Empty, unsaved user with the default role
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsaved user ids are 0
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) -> Result<()> {
        self.id = validation::validate_id(id)?;
        Ok(())
    }

    /// Copy of this user carrying a server-assigned id
    pub fn with_id(&self, id: i64) -> Result<Self> {
        let mut copy = self.clone();
        copy.set_id(id)?;
        Ok(copy)
    }

    pub fn name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.full_name = Some(validation::validate_name(name)?.to_string());
        Ok(())
    }

    /// The email address, always lower-cased
    pub fn email(&self) -> Option<String> {
        self.email.as_deref().map(str::to_lowercase)
    }

    pub fn set_email(&mut self, email: &str) -> Result<()> {
        self.email = Some(validation::validate_email(email)?.to_string());
        Ok(())
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.pwd_hash.as_deref()
    }

    /// Assign an already computed hash (e.g. loaded from storage)
    pub fn set_password_hash(&mut self, hash: &str) -> Result<()> {
        if hash.is_empty() {
            return Err(DomainError::with_message(
                ErrorKind::NoPassword,
                "Password hash is empty",
            ));
        }
        self.pwd_hash = Some(hash.to_string());
        Ok(())
    }

    /// Hash and store a plaintext password; the plaintext is not retained
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.pwd_hash = Some(hash_password(password)?);
        Ok(())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_role_id(&mut self, role_id: i64) -> Result<()> {
        self.role = Role::try_from(role_id)?;
        Ok(())
    }

    /// Preferred working time per day in seconds, 0 when unset
    pub fn working_hours(&self) -> u32 {
        self.working_hours
    }

    /// The preference as an optional value, `None` when unset
    pub fn working_hours_preference(&self) -> Option<u32> {
        (self.working_hours > 0).then_some(self.working_hours)
    }

    pub fn set_working_hours(&mut self, seconds: i64) -> Result<()> {
        self.working_hours = validation::validate_working_hours(seconds)?;
        Ok(())
    }

    /// Check a candidate password against the stored hash.
    ///
    /// A malformed candidate is rejected before the hash is touched. A stored
    /// hash bcrypt cannot parse is `bad_format`, not a mismatch.
    pub fn check_password(&self, candidate: &str) -> Result<bool> {
        validation::validate_password(candidate)?;

        let Some(hash) = self.pwd_hash.as_deref() else {
            return Ok(false);
        };
        bcrypt::verify(candidate, hash).map_err(|e| {
            DomainError::with_message(
                ErrorKind::BadFormat,
                format!("stored password hash for user {} is unusable: {e}", self.id),
            )
        })
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("pwd_hash", &self.pwd_hash.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("working_hours", &self.working_hours)
            .finish()
    }
}

/// Validate and hash a plaintext password
pub(crate) fn hash_password(password: &str) -> Result<String> {
    validation::validate_password(password)?;
    bcrypt::hash(password, PASSWORD_HASH_COST)
        .map_err(|e| DomainError::with_message(ErrorKind::BadPassword, e.to_string()))
}
