//! Per-operation authorization
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. hard denials: nobody changes their own role, nobody deletes their own
//!    account (admins included);
//! 2. self-service: a caller may view and update their own profile, and add,
//!    view, update and delete their own work records;
//! 3. elevated roles: admins may do anything, managers may add, list, view,
//!    update and delete other users (but not touch their work records);
//! 4. everything else is forbidden.
//!
//! Credential checks happen before this module is consulted.

use crate::types::Role;
use thiserror::Error;

/// The authenticated identity behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An operation a caller wants to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddUser,
    ListUsers,
    ViewUser { target: i64 },
    UpdateUser { target: i64, changes_role: bool },
    DeleteUser { target: i64 },
    AddRecord { owner: i64 },
    ViewRecord { owner: i64 },
    /// `new_owner` is set when the update reassigns the record
    UpdateRecord { owner: i64, new_owner: Option<i64> },
    DeleteRecord { owner: i64 },
}

/// The guard rejected the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("caller {caller} is not allowed to perform {action:?}")]
pub struct Forbidden {
    pub caller: i64,
    pub action: Action,
}

/// Decide whether `caller` may perform `action`
pub fn authorize(caller: &Caller, action: &Action) -> Result<(), Forbidden> {
    let allowed = match *action {
        Action::UpdateUser {
            target,
            changes_role: true,
        } if target == caller.id => false,
        Action::DeleteUser { target } if target == caller.id => false,

        Action::ViewUser { target } | Action::UpdateUser { target, .. } if target == caller.id => {
            true
        }
        Action::AddRecord { owner }
        | Action::ViewRecord { owner }
        | Action::DeleteRecord { owner }
            if owner == caller.id =>
        {
            true
        }
        Action::UpdateRecord { owner, new_owner }
            if owner == caller.id && new_owner.map_or(true, |new| new == caller.id) =>
        {
            true
        }

        _ if caller.role == Role::Admin => true,
        Action::AddUser
        | Action::ListUsers
        | Action::ViewUser { .. }
        | Action::UpdateUser { .. }
        | Action::DeleteUser { .. } => caller.role == Role::Manager,

        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(Forbidden {
            caller: caller.id,
            action: *action,
        })
    }
}

/// Effective owner filter for listing work records.
///
/// Admins see what they ask for (`None` = everyone); anyone else only sees
/// their own records regardless of the requested filter.
pub fn record_scope(caller: &Caller, requested: Option<i64>) -> Option<i64> {
    if caller.is_admin() {
        requested
    } else {
        Some(caller.id)
    }
}
