//! Per-group pagination and the attachment tasks it spawns.
//!
//! A walk owns its own `JoinSet`, so attachment tasks from one run can
//! never leak into another and completion is simply "every spawned task
//! joined".

use std::fmt;

use http::StatusCode;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::resources;

/// Terminal states of one attachment task. All of them count as done;
/// only `Failed` leaves a warning behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
    Failed,
}

/// Counters for one group walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupStats {
    pub pages: u64,
    pub users: u64,
    pub attached: u64,
    pub already_attached: u64,
    pub failed: u64,
}

/// Aggregate counters for a whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub groups: u64,
    pub pages: u64,
    pub users: u64,
    pub attached: u64,
    pub already_attached: u64,
    pub failed: u64,
}

impl RunSummary {
    pub fn aggregate(walks: impl IntoIterator<Item = GroupStats>) -> Self {
        let mut summary = Self::default();
        for stats in walks {
            summary.groups += 1;
            summary.pages += stats.pages;
            summary.users += stats.users;
            summary.attached += stats.attached;
            summary.already_attached += stats.already_attached;
            summary.failed += stats.failed;
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} groups, {} pages, {} users, {} attached, {} already attached, {} failed",
            self.groups, self.pages, self.users, self.attached, self.already_attached, self.failed
        )
    }
}

/// Attach one game to one user.
///
/// Failures are logged and absorbed here so a rejected attachment can
/// never take down the walk that spawned it. A `409 Conflict` means the
/// user already has the game and counts as success.
pub async fn attach_game(client: &ApiClient, user_id: &str, game_id: &str) -> AttachOutcome {
    info!("saving game {} to user {}", game_id, user_id);

    let response = match client
        .post_empty(&format!("user/{user_id}/game/{game_id}"))
        .await
    {
        Ok(response) => response,
        Err(error) => {
            warn!(
                "failed to attach game {} to user {}: {}",
                game_id, user_id, error
            );
            return AttachOutcome::Failed;
        }
    };

    let status = response.status();
    if status.is_success() {
        AttachOutcome::Attached
    } else if status == StatusCode::CONFLICT {
        debug!("user {} already has game {}", user_id, game_id);
        AttachOutcome::AlreadyAttached
    } else {
        warn!(
            "attaching game {} to user {} returned status {}",
            game_id, user_id, status
        );
        AttachOutcome::Failed
    }
}

/// Walk every page of a group's membership, spawning one attachment task
/// per (user, game) pair as each page arrives.
///
/// Pages are fetched strictly in order and never revisited; spawned
/// tasks run while the next page is in flight. Returns once the API
/// stops advertising a next page and every spawned task has reached a
/// terminal state. Page-fetch errors propagate; attachment failures do
/// not.
pub async fn walk_group(
    client: &ApiClient,
    group_id: &str,
    game_ids: &[String],
) -> Result<GroupStats, ApiError> {
    let mut tasks = JoinSet::new();
    let mut stats = GroupStats::default();
    let mut page: u32 = 1;

    loop {
        debug!(
            "processing page {} for group {} with games {:?}",
            page, group_id, game_ids
        );
        let batch = resources::group_users_page(client, group_id, page).await?;
        stats.pages += 1;
        stats.users += batch.user_ids.len() as u64;

        for user_id in batch.user_ids {
            for game_id in game_ids {
                let client = client.clone();
                let user_id = user_id.clone();
                let game_id = game_id.clone();
                tasks.spawn(async move { attach_game(&client, &user_id, &game_id).await });
            }
        }

        if !batch.has_next {
            break;
        }
        page += 1;
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(AttachOutcome::Attached) => stats.attached += 1,
            Ok(AttachOutcome::AlreadyAttached) => stats.already_attached += 1,
            Ok(AttachOutcome::Failed) => stats.failed += 1,
            Err(join_error) => {
                error!(
                    "attachment task for group {} aborted: {}",
                    group_id, join_error
                );
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
