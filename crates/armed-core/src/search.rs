//! Case-insensitive substring search over users, tracks and projects.
//!
//! Users match on username or display name (never on email). Tracks match on
//! name. Projects match on name or description. Each list is newest first and
//! capped at `limit`; a blank query yields empty lists without touching the
//! store.

use armed_db::entities::{project, track, user};
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::content::{find_projects_by_ids, find_users_by_ids};
use crate::error::SocialResult;
use crate::feed::FeedProject;
use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::views::{ProjectResponse, TrackResponse, UserSummary};
use crate::Social;

/// Query parameters `?q=&limit=`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchTrack {
    #[serde(flatten)]
    pub track: TrackResponse,
    pub project: FeedProject,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchProject {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub user: UserSummary,
    pub tracks_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub users: Vec<UserSummary>,
    pub tracks: Vec<SearchTrack>,
    pub projects: Vec<SearchProject>,
}

/// A normalized search term: trimmed, lowercased, LIKE wildcards escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    pattern: String,
    limit: u64,
}

impl Term {
    fn parse(q: &str, limit: Option<u64>) -> Option<Self> {
        let q = q.trim();
        if q.is_empty() {
            return None;
        }
        let escaped = q
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(Self {
            pattern: format!("%{escaped}%"),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        })
    }

    /// `LOWER(col) LIKE '%term%' ESCAPE '\'`
    fn matches(&self, col: impl IntoColumnRef) -> SimpleExpr {
        Expr::expr(Func::lower(Expr::col(col)))
            .like(LikeExpr::new(self.pattern.clone()).escape('\\'))
    }
}

/// Row of a `GROUP BY project_id` count.
#[derive(Debug, FromQueryResult)]
struct ProjectCount {
    project_id: Uuid,
    count: i64,
}

impl Social {
    /// Users, tracks and projects matching `q`, queried concurrently.
    pub async fn search(&self, q: &str, limit: Option<u64>) -> SocialResult<SearchResults> {
        let Some(term) = Term::parse(q, limit) else {
            return Ok(SearchResults::default());
        };
        let (users, tracks, projects) = tokio::try_join!(
            search_users(&self.db, &term),
            search_tracks(&self.db, &term),
            search_projects(&self.db, &term),
        )?;
        tracing::debug!(
            users = users.len(),
            tracks = tracks.len(),
            projects = projects.len(),
            "search complete"
        );
        Ok(SearchResults {
            users,
            tracks,
            projects,
        })
    }

    pub async fn search_users(&self, q: &str, limit: Option<u64>) -> SocialResult<Vec<UserSummary>> {
        match Term::parse(q, limit) {
            Some(term) => search_users(&self.db, &term).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn search_tracks(&self, q: &str, limit: Option<u64>) -> SocialResult<Vec<SearchTrack>> {
        match Term::parse(q, limit) {
            Some(term) => search_tracks(&self.db, &term).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn search_projects(
        &self,
        q: &str,
        limit: Option<u64>,
    ) -> SocialResult<Vec<SearchProject>> {
        match Term::parse(q, limit) {
            Some(term) => search_projects(&self.db, &term).await,
            None => Ok(Vec::new()),
        }
    }
}

async fn search_users(db: &DatabaseConnection, term: &Term) -> SocialResult<Vec<UserSummary>> {
    Ok(user::Entity::find()
        .filter(
            Condition::any()
                .add(term.matches(user::Column::Username))
                .add(term.matches(user::Column::Name)),
        )
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .limit(term.limit)
        .all(db)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect())
}

/// Matching tracks with their project and its owner. A track whose project or
/// owner cannot be resolved is dropped.
async fn search_tracks(db: &DatabaseConnection, term: &Term) -> SocialResult<Vec<SearchTrack>> {
    let tracks = track::Entity::find()
        .filter(term.matches(track::Column::Name))
        .order_by_desc(track::Column::CreatedAt)
        .order_by_desc(track::Column::Id)
        .limit(term.limit)
        .all(db)
        .await?;
    if tracks.is_empty() {
        return Ok(Vec::new());
    }

    let project_ids: Vec<Uuid> = tracks.iter().map(|t| t.project_id).collect();
    let projects = find_projects_by_ids(db, &project_ids).await?;
    let owner_ids: Vec<Uuid> = projects.values().map(|p| p.user_id).collect();
    let owners = find_users_by_ids(db, &owner_ids).await?;

    Ok(tracks
        .into_iter()
        .filter_map(|track| {
            let project = projects.get(&track.project_id)?;
            let owner = owners.get(&project.user_id)?;
            Some(SearchTrack {
                project: FeedProject {
                    project: ProjectResponse::from(project.clone()),
                    user: UserSummary::from(owner),
                },
                track: TrackResponse::from(track),
            })
        })
        .collect())
}

async fn search_projects(
    db: &DatabaseConnection,
    term: &Term,
) -> SocialResult<Vec<SearchProject>> {
    let projects = project::Entity::find()
        .filter(
            Condition::any()
                .add(term.matches(project::Column::Name))
                .add(term.matches(project::Column::Description)),
        )
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .limit(term.limit)
        .all(db)
        .await?;
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let owner_ids: Vec<Uuid> = projects.iter().map(|p| p.user_id).collect();
    let (counts, owners) = tokio::try_join!(
        track_counts_by_project(db, &project_ids),
        find_users_by_ids(db, &owner_ids),
    )?;

    Ok(projects
        .into_iter()
        .filter_map(|project| {
            let owner = owners.get(&project.user_id)?;
            Some(SearchProject {
                tracks_count: counts.get(&project.id).copied().unwrap_or(0),
                user: UserSummary::from(owner),
                project: ProjectResponse::from(project),
            })
        })
        .collect())
}

/// Track count per project in one grouped query. Empty projects are absent.
async fn track_counts_by_project(
    db: &DatabaseConnection,
    project_ids: &[Uuid],
) -> SocialResult<HashMap<Uuid, u64>> {
    let rows = track::Entity::find()
        .select_only()
        .column(track::Column::ProjectId)
        .column_as(track::Column::Id.count(), "count")
        .filter(track::Column::ProjectId.is_in(project_ids.to_vec()))
        .group_by(track::Column::ProjectId)
        .into_model::<ProjectCount>()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.project_id, u64::try_from(r.count).unwrap_or(0)))
        .collect())
}
