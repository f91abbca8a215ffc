/// Shared application state
use crate::services::AuthService;
use std::sync::Arc;
use worklog_storage::records::Records;
use worklog_storage::users::Users;
use worklog_storage::Database;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub users: Users,
    pub records: Records,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: Database, auth_service: Arc<AuthService>) -> Self {
        Self {
            users: Users::new(db.clone()),
            records: Records::new(db.clone()),
            db,
            auth_service,
        }
    }
}
