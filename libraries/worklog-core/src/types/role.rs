/// User roles
use crate::error::{DomainError, ErrorKind};
use std::fmt;

/// The closed set of roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Role {
    /// Regular user, manages only their own work
    #[default]
    User,
    /// May manage other user accounts
    Manager,
    /// Full access to users and work records
    Admin,
}

static ROLES: [Role; 3] = [Role::User, Role::Manager, Role::Admin];

impl Role {
    /// Stored numeric id of the role
    pub fn value(self) -> i64 {
        match self {
            Role::User => 1,
            Role::Manager => 2,
            Role::Admin => 3,
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Regular User",
            Role::Manager => "User Manager",
            Role::Admin => "Administrator",
        }
    }

    /// Look a role up by its stored id
    pub fn from_value(value: i64) -> Option<Self> {
        ROLES.iter().copied().find(|role| role.value() == value)
    }

    pub fn all() -> &'static [Role] {
        &ROLES
    }
}

impl TryFrom<i64> for Role {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Role::from_value(value).ok_or_else(|| {
            DomainError::with_message(ErrorKind::BadRole, format!("unknown role id {value}"))
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
