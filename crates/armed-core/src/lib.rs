//! Social core of the Armed App: follows, likes, comments, notifications,
//! search and the per-viewer feed, over the SeaORM entities of `armed-db`.
//!
//! Every operation takes an already-authenticated caller id; this crate only
//! authorizes (ownership checks), it never authenticates.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod comments;
pub mod content;
pub mod error;
pub mod events;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod notifications;
pub mod pagination;
pub mod profile;
pub mod search;
pub mod views;

pub use error::{SocialError, SocialResult};
pub use events::{EventSink, MemorySink, NotificationEvent, TracingSink};
pub use notifications::Notifier;
pub use pagination::{PageRequest, PaginationParams, MAX_OFFSET, MAX_PAGE_SIZE};

/// Entry point to the core operations.
///
/// Cheap to clone: the connection is a pool handle and the event sink is shared.
#[derive(Clone)]
pub struct Social {
    db: DatabaseConnection,
    notifier: Notifier,
}

impl Social {
    pub fn new(db: DatabaseConnection, sink: Arc<dyn EventSink>) -> Self {
        let notifier = Notifier::new(db.clone(), sink);
        Self { db, notifier }
    }

    /// Notification events go to `tracing`.
    pub fn with_tracing(db: DatabaseConnection) -> Self {
        Self::new(db, Arc::new(TracingSink))
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn notifications(&self) -> &Notifier {
        &self.notifier
    }
}
