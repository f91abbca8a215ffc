/// Work record domain type
use crate::error::Result;
use crate::validation;
use chrono::{DateTime, NaiveDate, Utc};

/// A unit of work done by a user on a given day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkRecord {
    id: i64,
    created: Option<DateTime<Utc>>,
    user_id: i64,
    day: Option<NaiveDate>,
    duration: u32,
    note: Option<String>,

    // Computed by the storage view, only present on fetched records
    is_under_hours: bool,
    user_name: Option<String>,
}

impl WorkRecord {
    /// Build a validated, unsaved record
    pub fn new(user_id: i64, day: &str, duration: i64, note: &str) -> Result<Self> {
        let mut record = Self::default();
        record.set_user_id(user_id)?;
        record.set_day(day)?;
        record.set_duration(duration)?;
        record.set_note(note)?;
        Ok(record)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) -> Result<()> {
        self.id = validation::validate_id(id)?;
        Ok(())
    }

    /// Creation time (UTC), assigned by storage
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn set_user_id(&mut self, user_id: i64) -> Result<()> {
        self.user_id = validation::validate_user_id(user_id)?;
        Ok(())
    }

    /// The calendar day the work was done on, as given by the caller
    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn set_day(&mut self, day: &str) -> Result<()> {
        self.day = Some(validation::parse_day(day)?);
        Ok(())
    }

    pub fn set_day_date(&mut self, day: NaiveDate) {
        self.day = Some(day);
    }

    /// Duration in seconds, 0 on an empty record
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: i64) -> Result<()> {
        self.duration = validation::validate_duration(duration)?;
        Ok(())
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn set_note(&mut self, note: &str) -> Result<()> {
        self.note = Some(validation::validate_note(note)?.to_string());
        Ok(())
    }

    /// Whether the owner's logged time for the day is below their preference
    pub fn is_under_hours(&self) -> bool {
        self.is_under_hours
    }

    /// Owner's display name
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Attach the fields only storage can compute. Used when reading rows back.
    #[must_use]
    pub fn with_stored_fields(
        mut self,
        created: DateTime<Utc>,
        is_under_hours: bool,
        user_name: Option<String>,
    ) -> Self {
        self.created = Some(created);
        self.is_under_hours = is_under_hours;
        self.user_name = user_name;
        self
    }
}
