/// Work record API routes
use crate::{
    api::{int_field, path_id, supplied},
    error::Result,
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use worklog_core::{
    authorize, record_scope, validation, Action, ErrorKind, WorkRecord, WorkRecordPatch,
};
use worklog_storage::records::RecordFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub id: i64,
    pub created: Option<DateTime<Utc>>,
    pub user_id: i64,
    /// The work day, `YYYY-MM-DD`
    pub when: Option<NaiveDate>,
    /// Seconds
    pub duration: u32,
    pub note: Option<String>,
    pub is_under_hours: bool,
    pub user_name: Option<String>,
}

impl From<&WorkRecord> for RecordResponse {
    fn from(record: &WorkRecord) -> Self {
        Self {
            id: record.id(),
            created: record.created(),
            user_id: record.user_id(),
            when: record.day(),
            duration: record.duration(),
            note: record.note().map(str::to_string),
            is_under_hours: record.is_under_hours(),
            user_name: record.user_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordRequest {
    pub user_id: Option<Value>,
    pub when: Option<String>,
    pub duration: Option<Value>,
    pub note: Option<String>,
}

impl RecordRequest {
    fn user_id(&self) -> Result<Option<i64>> {
        // 0 reads as "not given"
        Ok(int_field(self.user_id.as_ref(), ErrorKind::BadUserId)?.filter(|id| *id != 0))
    }

    fn duration(&self) -> Result<Option<i64>> {
        int_field(self.duration.as_ref(), ErrorKind::BadDuration)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<RecordFilter> {
        let user_id = match supplied(self.user_id.as_ref()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ErrorKind::BadUserId)?,
            ),
            None => None,
        };
        let from = supplied(self.from.as_ref())
            .map(validation::parse_day)
            .transpose()?;
        let to = supplied(self.to.as_ref())
            .map(validation::parse_day)
            .transpose()?;

        Ok(RecordFilter { user_id, from, to })
    }
}

/// POST /v1/work
/// Add a record; the owner defaults to the caller
pub async fn add_record(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Result<Json<RecordResponse>> {
    let Json(req) = payload?;

    let owner = req.user_id()?.unwrap_or(caller.id);
    authorize(&caller, &Action::AddRecord { owner })?;

    let mut record = WorkRecord::default();
    record.set_user_id(owner)?;
    record.set_day(req.when.as_deref().unwrap_or_default())?;
    record.set_duration(req.duration()?.ok_or(ErrorKind::NoDuration)?)?;
    record.set_note(req.note.as_deref().unwrap_or_default())?;

    let record = app_state.records.add(&record).await?;
    Ok(Json(RecordResponse::from(&record)))
}

/// GET /v1/work?user_id=&from=&to=
/// Non-admins only ever see their own records
pub async fn list_records(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<RecordResponse>>> {
    let Query(query) = query?;

    let mut filter = query.filter()?;
    filter.user_id = record_scope(&caller, filter.user_id);

    let records = app_state.records.get_all(&filter).await?;
    Ok(Json(records.iter().map(RecordResponse::from).collect()))
}

/// GET /v1/work/:id
pub async fn get_record(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<RecordResponse>> {
    let id = path_id(&id)?;

    let record = app_state
        .records
        .get(id)
        .await?
        .ok_or(ErrorKind::RecNotFound)?;
    authorize(
        &caller,
        &Action::ViewRecord {
            owner: record.user_id(),
        },
    )?;

    Ok(Json(RecordResponse::from(&record)))
}

/// PUT /v1/work/:id
/// Partial update; only the supplied fields change
pub async fn update_record(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    payload: std::result::Result<Json<RecordRequest>, JsonRejection>,
) -> Result<Json<RecordResponse>> {
    let id = path_id(&id)?;
    let Json(req) = payload?;

    let mut patch = WorkRecordPatch::new();
    if let Some(when) = supplied(req.when.as_ref()) {
        patch.set_day(when)?;
    }
    if let Some(user_id) = req.user_id()? {
        patch.set_user_id(user_id)?;
    }
    if let Some(duration) = req.duration()? {
        patch.set_duration(duration)?;
    }
    if let Some(note) = supplied(req.note.as_ref()) {
        patch.set_note(note)?;
    }

    let current = app_state
        .records
        .get(id)
        .await?
        .ok_or(ErrorKind::RecNotFound)?;
    authorize(
        &caller,
        &Action::UpdateRecord {
            owner: current.user_id(),
            new_owner: patch.user_id(),
        },
    )?;

    // Non-admins were approved for this owner; the write re-checks it
    let record = if caller.is_admin() {
        app_state.records.update(id, &patch).await?
    } else {
        app_state
            .records
            .update_owned(id, current.user_id(), &patch)
            .await?
    };
    Ok(Json(RecordResponse::from(&record)))
}

/// DELETE /v1/work/:id
pub async fn delete_record(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Value>> {
    let id = path_id(&id)?;

    let current = app_state
        .records
        .get(id)
        .await?
        .ok_or(ErrorKind::RecNotFound)?;
    authorize(
        &caller,
        &Action::DeleteRecord {
            owner: current.user_id(),
        },
    )?;

    let deleted = if caller.is_admin() {
        app_state.records.delete(id).await?
    } else {
        app_state
            .records
            .delete_owned(id, current.user_id())
            .await?
    };
    if !deleted {
        return Err(ErrorKind::RecNotFound.into());
    }

    Ok(Json(json!({ "success": true })))
}
