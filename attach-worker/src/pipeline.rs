//! The resolution pipeline: regional games down to the groups that
//! should receive them, plus the run drivers that fan the result out to
//! per-group dispatch.
//!
//! Stages run strictly in order. Within a stage every lookup is issued
//! concurrently and the stage completes only when all of them have; a
//! single failed lookup fails the stage and with it the run.

use std::collections::HashMap;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::dispatch::{self, RunSummary};
use crate::error::{ApiError, RunError};
use crate::resources::{self, Game};

/// Games keyed by each zip code that unlocks them.
pub type ZipGameIndex = HashMap<String, Vec<String>>;

/// The games of one zip code, routed to the groups served by one of the
/// zip code's addresses.
///
/// Group resolution emits one placement per (zip code, address), each
/// carrying that single address's groups next to the zip code's full
/// game and address lists.
#[derive(Debug, Clone)]
pub struct Placement {
    pub zip_code: String,
    pub games: Vec<String>,
    pub addresses: Vec<String>,
    pub groups: Vec<String>,
}

/// Invert each game's zip-code list into a zip -> games index. A zip
/// code ends up mapped to every game that listed it.
pub fn index_games_by_zip(games: Vec<Game>) -> ZipGameIndex {
    let mut index = ZipGameIndex::new();
    for game in games {
        for zip_code in game.zipcodes {
            index
                .entry(zip_code)
                .or_default()
                .push(game.game_id.clone());
        }
    }
    index
}

/// Resolve every regional game down to placements carrying group ids.
///
/// Zip codes with no group-serving address are dropped after address
/// resolution; addresses with no groups still produce a placement with
/// an empty group list, which simply yields no downstream work.
pub async fn resolve_placements(client: &ApiClient) -> Result<Vec<Placement>, ApiError> {
    let games = resources::regional_games(client).await?;
    let index = index_games_by_zip(games);

    // One address lookup per zip code, all in flight together.
    let lookups = index.into_iter().map(|(zip_code, games)| async move {
        let addresses = resources::addresses_for_zip(client, &zip_code).await?;
        Ok::<_, ApiError>(Placement {
            zip_code,
            games,
            addresses,
            groups: Vec::new(),
        })
    });
    let mut placements = try_join_all(lookups).await?;

    placements.retain(|placement| !placement.addresses.is_empty());

    // One group lookup per (placement, address). Each address gets its
    // own copy of the placement rather than merging groups across the
    // zip code's addresses.
    let lookups = placements
        .iter()
        .flat_map(|placement| {
            placement
                .addresses
                .iter()
                .map(move |address_id| (placement, address_id))
        })
        .map(|(placement, address_id)| async move {
            let groups = resources::groups_for_address(client, address_id).await?;
            Ok::<_, ApiError>(Placement {
                groups,
                ..placement.clone()
            })
        });

    try_join_all(lookups).await
}

/// Process every regional game: walk every group of every placement.
pub async fn run_cron(client: &ApiClient) -> Result<RunSummary, RunError> {
    let placements = resolve_placements(client).await?;
    debug!("resolved {} placements", placements.len());

    let walks = placements
        .iter()
        .flat_map(|placement| {
            placement
                .groups
                .iter()
                .map(move |group_id| (group_id, &placement.games))
        })
        .map(|(group_id, games)| dispatch::walk_group(client, group_id, games));

    let summary = RunSummary::aggregate(try_join_all(walks).await?);
    info!("done processing cron: {}", summary);
    Ok(summary)
}

/// Process only the placements that route to `group_id`. A group id that
/// no placement routes to is a successful run with zero attachments.
pub async fn run_group(client: &ApiClient, group_id: &str) -> Result<RunSummary, RunError> {
    let placements = resolve_placements(client).await?;

    let walks = placements
        .iter()
        .filter(|placement| placement.groups.iter().any(|candidate| candidate == group_id))
        .map(|placement| dispatch::walk_group(client, group_id, &placement.games));

    let summary = RunSummary::aggregate(try_join_all(walks).await?);
    info!("done processing group {}: {}", group_id, summary);
    Ok(summary)
}
