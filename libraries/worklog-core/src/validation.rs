//! Field rules shared by the entities and their patches
//!
//! Every function here either returns the accepted (possibly converted) value
//! or a [`DomainError`] tagged with the matching `no_*` / `bad_*` kind. An
//! absent value maps to `no_*`, a present but unacceptable one to `bad_*`.

use crate::error::{DomainError, ErrorKind, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use validator::ValidateEmail;

/// Longest duration a single record may carry (one calendar day)
pub const MAX_DURATION_SECS: u32 = 24 * 60 * 60;

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Entity ids are server-assigned positive integers; 0 means "not assigned".
pub fn validate_id(id: i64) -> Result<i64> {
    match id {
        0 => Err(ErrorKind::NoId.into()),
        id if id < 0 => Err(ErrorKind::BadId.into()),
        id => Ok(id),
    }
}

/// Owner id of a work record.
pub fn validate_user_id(user_id: i64) -> Result<i64> {
    match user_id {
        0 => Err(ErrorKind::NoUserId.into()),
        id if id < 0 => Err(ErrorKind::BadUserId.into()),
        id => Ok(id),
    }
}

pub fn validate_name(name: &str) -> Result<&str> {
    if name.trim().is_empty() {
        return Err(ErrorKind::NoName.into());
    }
    Ok(name)
}

pub fn validate_email(email: &str) -> Result<&str> {
    if email.is_empty() {
        return Err(ErrorKind::NoEmail.into());
    }
    if !email.validate_email() {
        return Err(ErrorKind::BadEmail.into());
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<&str> {
    if password.is_empty() {
        return Err(ErrorKind::NoPassword.into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ErrorKind::BadPassword.into());
    }
    Ok(password)
}

/// Work durations are whole seconds in `1..=MAX_DURATION_SECS`.
pub fn validate_duration(duration: i64) -> Result<u32> {
    if duration <= 0 || duration > i64::from(MAX_DURATION_SECS) {
        return Err(DomainError::with_message(
            ErrorKind::BadDuration,
            format!("duration {duration}s is outside 1..={MAX_DURATION_SECS}"),
        ));
    }
    Ok(duration as u32)
}

/// Working-hours preference in seconds per day. Zero means "unset".
pub fn validate_working_hours(seconds: i64) -> Result<u32> {
    if seconds < 0 || seconds > i64::from(MAX_DURATION_SECS) {
        return Err(ErrorKind::BadDuration.into());
    }
    Ok(seconds as u32)
}

pub fn validate_note(note: &str) -> Result<&str> {
    if note.trim().is_empty() {
        return Err(ErrorKind::NoNote.into());
    }
    Ok(note)
}

/// Parse the calendar day a piece of work was done on.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`
/// timestamps. For timestamps the date is taken in the caller's own offset;
/// it is never shifted to UTC.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ErrorKind::NoDate.into());
    }

    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(DomainError::with_message(
        ErrorKind::BadDate,
        format!("'{value}' is not a valid day"),
    ))
}
