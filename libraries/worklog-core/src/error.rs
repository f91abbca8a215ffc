/// Domain error tags and the error type carried through every layer
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Result type alias using `DomainError`
pub type Result<T> = std::result::Result<T, DomainError>;

/// Machine-readable category of a domain failure.
///
/// The string form returned by [`ErrorKind::as_str`] is the tag callers see,
/// so the spelling of each tag is part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoId,
    BadId,
    NoName,
    NoEmail,
    BadEmail,
    NoPassword,
    BadPassword,
    BadRole,
    BadWorkingHours,
    NoUserId,
    BadUserId,
    NoDuration,
    BadDuration,
    NoDate,
    BadDate,
    NoNote,
    /// A stored row could not be turned back into an entity
    BadFormat,
    UserNotFound,
    RecNotFound,
    EmailInUse,
    UserHasRecords,
    UnknownUser,
    DuplicateEntry,
}

impl ErrorKind {
    /// The wire tag for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NoId => "no_id",
            ErrorKind::BadId => "bad_id",
            ErrorKind::NoName => "no_name",
            ErrorKind::NoEmail => "no_email",
            ErrorKind::BadEmail => "bad_email",
            ErrorKind::NoPassword => "no_password",
            ErrorKind::BadPassword => "bad_password",
            ErrorKind::BadRole => "bad_role",
            ErrorKind::BadWorkingHours => "bad_working_hours",
            ErrorKind::NoUserId => "no_userid",
            ErrorKind::BadUserId => "bad_userid",
            ErrorKind::NoDuration => "no_duration",
            ErrorKind::BadDuration => "bad_duration",
            ErrorKind::NoDate => "no_date",
            ErrorKind::BadDate => "bad_date",
            ErrorKind::NoNote => "no_note",
            ErrorKind::BadFormat => "bad_format",
            ErrorKind::UserNotFound => "user_not_found",
            ErrorKind::RecNotFound => "rec_not_found",
            ErrorKind::EmailInUse => "email_in_use",
            ErrorKind::UserHasRecords => "user_has_records",
            ErrorKind::UnknownUser => "unknown_user",
            ErrorKind::DuplicateEntry => "duplicate_entry",
        }
    }

    /// Default human-readable message for this kind
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::NoId => "The id is missing",
            ErrorKind::BadId => "The id has incorrect format",
            ErrorKind::NoName => "The name is missing",
            ErrorKind::NoEmail => "The email is missing",
            ErrorKind::BadEmail => "The email is incorrect",
            ErrorKind::NoPassword => "Password is empty",
            ErrorKind::BadPassword => "Password has wrong format",
            ErrorKind::BadRole => "The role is incorrect",
            ErrorKind::BadWorkingHours => "The working hours have incorrect format",
            ErrorKind::NoUserId => "The user id is missing",
            ErrorKind::BadUserId => "The user id has incorrect format",
            ErrorKind::NoDuration => "The duration is missing",
            ErrorKind::BadDuration => "The duration has incorrect format",
            ErrorKind::NoDate => "The date is missing",
            ErrorKind::BadDate => "The day has incorrect format",
            ErrorKind::NoNote => "The note is missing",
            ErrorKind::BadFormat => "Stored data has incorrect format",
            ErrorKind::UserNotFound => "User not found",
            ErrorKind::RecNotFound => "Work record not found",
            ErrorKind::EmailInUse => "The email is already in use",
            ErrorKind::UserHasRecords => "The user still owns work records",
            ErrorKind::UnknownUser => "The referenced user does not exist",
            ErrorKind::DuplicateEntry => "Duplicate entry",
        }
    }

    /// Whether the kind describes a missing entity rather than bad input
    pub fn is_not_found(self) -> bool {
        matches!(self, ErrorKind::UserNotFound | ErrorKind::RecNotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged domain error: the kind plus a message for logs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl DomainError {
    /// Create an error with the kind's default message
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: Cow::Borrowed(kind.description()),
        }
    }

    /// Create an error with a custom message
    pub fn with_message(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ErrorKind> for DomainError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
