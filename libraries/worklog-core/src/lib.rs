//! Worklog Core
//!
//! Storage-agnostic domain types, field rules and access control for the
//! Worklog time-tracking service.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `WorkRecord` and the closed `Role` set
//! - **Patches**: `UserPatch` / `WorkRecordPatch` for field-presence updates
//! - **Validation**: guarded setters that never leave an entity half-assigned
//! - **Access Control**: the per-operation authorization guard
//! - **Error Handling**: `DomainError` carrying a machine-readable `ErrorKind` tag
//!
//! # Example
//!
//! ```rust
//! use worklog_core::{Role, User, WorkRecord};
//!
//! let mut user = User::new();
//! user.set_name("Alice").unwrap();
//! user.set_email("Alice@Example.com").unwrap();
//! user.set_role(Role::Manager);
//! assert_eq!(user.email().as_deref(), Some("alice@example.com"));
//!
//! let record = WorkRecord::new(1, "2016-08-24", 7200, "Planning").unwrap();
//! assert_eq!(record.duration(), 7200);
//! ```

#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use access::{authorize, record_scope, Action, Caller, Forbidden};
pub use error::{DomainError, ErrorKind, Result};
pub use types::{Role, User, UserPatch, WorkRecord, WorkRecordPatch};
