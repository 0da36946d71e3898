use armed_core::Social;
use sea_orm::DatabaseConnection;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub social: Social,
    pub jwt_secret: String,
}

impl AppState {
    pub fn db(&self) -> &DatabaseConnection {
        self.social.db()
    }
}
