//! Feed aggregation (fan-out on read).
//!
//! The feed of a viewer is every track in a project owned by someone the
//! viewer follows, or by the viewer, newest first. Each track on the page
//! carries its project, the project owner, its like and comment counts and
//! whether the viewer liked it.
//!
//! `total` is counted over the same project set as the page query, before
//! tracks with an unresolvable project or owner are dropped from the page, so
//! it can overstate what is reachable. `has_more` derives from that total.

use armed_db::entities::{project, track, user};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::comments::comment_counts_by_track;
use crate::content::{
    count_tracks_by_project_ids, find_projects_by_owner_ids, find_tracks_by_project_ids,
    find_users_by_ids, unique_ids, TrackOrder,
};
use crate::error::SocialResult;
use crate::follows::following_ids;
use crate::likes::{like_counts_by_track, liked_track_ids};
use crate::pagination::PageRequest;
use crate::views::{ProjectResponse, TrackResponse, UserSummary};
use crate::Social;

#[derive(Debug, Clone, Serialize)]
pub struct FeedProject {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedTrack {
    #[serde(flatten)]
    pub track: TrackResponse,
    pub project: FeedProject,
    pub like_count: u64,
    pub comment_count: u64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub tracks: Vec<FeedTrack>,
    pub total: u64,
    pub has_more: bool,
}

impl Feed {
    pub fn empty() -> Self {
        Self {
            tracks: Vec::new(),
            total: 0,
            has_more: false,
        }
    }
}

/// A page track whose project and owner both resolved.
#[derive(Debug)]
struct Resolved {
    track: track::Model,
    project: project::Model,
    owner: user::Model,
}

/// Per-track engagement for one page.
#[derive(Debug, Default)]
struct TrackStats {
    likes: HashMap<Uuid, u64>,
    comments: HashMap<Uuid, u64>,
    liked: HashSet<Uuid>,
}

impl Social {
    pub async fn get_feed(&self, viewer_id: Uuid, page: PageRequest) -> SocialResult<Feed> {
        let mut visible = following_ids(&self.db, viewer_id).await?;
        visible.push(viewer_id);
        let visible = unique_ids(visible);

        let projects = find_projects_by_owner_ids(&self.db, &visible).await?;
        if projects.is_empty() {
            tracing::debug!(%viewer_id, "feed empty: no projects");
            return Ok(Feed::empty());
        }
        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

        let (tracks, total) = tokio::try_join!(
            find_tracks_by_project_ids(&self.db, &project_ids, TrackOrder::NewestFirst, page),
            count_tracks_by_project_ids(&self.db, &project_ids),
        )?;

        let projects: HashMap<Uuid, project::Model> =
            projects.into_iter().map(|p| (p.id, p)).collect();
        let owner_ids: Vec<Uuid> = tracks
            .iter()
            .filter_map(|t| projects.get(&t.project_id).map(|p| p.user_id))
            .collect();
        let owners = find_users_by_ids(&self.db, &owner_ids).await?;

        let resolved = resolve_page(tracks, &projects, &owners);
        let track_ids: Vec<Uuid> = resolved.iter().map(|r| r.track.id).collect();
        let stats = self.page_stats(viewer_id, &track_ids).await?;

        let feed = build_feed(resolved, &stats, total, page);
        tracing::debug!(
            %viewer_id,
            returned = feed.tracks.len(),
            total = feed.total,
            offset = page.offset,
            "feed assembled"
        );
        Ok(feed)
    }

    /// Three grouped queries for the whole page, run concurrently.
    async fn page_stats(&self, viewer_id: Uuid, track_ids: &[Uuid]) -> SocialResult<TrackStats> {
        let (likes, comments, liked) = tokio::try_join!(
            like_counts_by_track(&self.db, track_ids),
            comment_counts_by_track(&self.db, track_ids),
            liked_track_ids(&self.db, viewer_id, track_ids),
        )?;
        Ok(TrackStats {
            likes,
            comments,
            liked,
        })
    }
}

/// Attach project and owner to each page track, keeping page order. Tracks
/// with a dangling project or owner are dropped.
fn resolve_page(
    tracks: Vec<track::Model>,
    projects: &HashMap<Uuid, project::Model>,
    owners: &HashMap<Uuid, user::Model>,
) -> Vec<Resolved> {
    tracks
        .into_iter()
        .filter_map(|track| {
            let project = projects.get(&track.project_id)?;
            let owner = owners.get(&project.user_id)?;
            Some(Resolved {
                project: project.clone(),
                owner: owner.clone(),
                track,
            })
        })
        .collect()
}

fn build_feed(resolved: Vec<Resolved>, stats: &TrackStats, total: u64, page: PageRequest) -> Feed {
    let tracks = resolved
        .into_iter()
        .map(|r| {
            let id = r.track.id;
            FeedTrack {
                track: TrackResponse::from(r.track),
                project: FeedProject {
                    project: ProjectResponse::from(r.project),
                    user: UserSummary::from(r.owner),
                },
                like_count: stats.likes.get(&id).copied().unwrap_or(0),
                comment_count: stats.comments.get(&id).copied().unwrap_or(0),
                is_liked: stats.liked.contains(&id),
            }
        })
        .collect();

    Feed {
        tracks,
        total,
        has_more: page.has_more(total),
    }
}
