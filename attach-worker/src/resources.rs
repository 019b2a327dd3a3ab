//! Thin projections over the API's `_embedded` collection envelopes.
//!
//! Each resolver wraps exactly one GET and flattens the relevant fragment
//! into plain identifier lists. A missing `_embedded` field (or a missing
//! collection inside it) is an empty result, not an error; transport and
//! status errors propagate untouched.

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::ApiError;

/// Page size used for every collection request.
pub const PER_PAGE: u32 = 100;

/// A game with its zip-code restrictions lifted out of the metadata blob.
#[derive(Debug, Clone)]
pub struct Game {
    pub game_id: String,
    pub zipcodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GamesEnvelope {
    #[serde(default, rename = "_embedded")]
    embedded: GamesEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct GamesEmbedded {
    #[serde(default)]
    game: Vec<GameDocument>,
}

#[derive(Debug, Deserialize)]
struct GameDocument {
    game_id: String,
    #[serde(default)]
    meta: GameMeta,
}

#[derive(Debug, Default, Deserialize)]
struct GameMeta {
    #[serde(default)]
    zipcodes: Vec<String>,
}

/// All games restricted to at least one zip code. Games without zip-code
/// metadata, or with an empty list, never enter the pipeline.
pub async fn regional_games(client: &ApiClient) -> Result<Vec<Game>, ApiError> {
    let envelope: GamesEnvelope = client
        .get("game", &[("per_page", PER_PAGE.to_string())])
        .await?;

    Ok(envelope
        .embedded
        .game
        .into_iter()
        .filter(|game| !game.meta.zipcodes.is_empty())
        .map(|game| Game {
            game_id: game.game_id,
            zipcodes: game.meta.zipcodes,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct AddressesEnvelope {
    #[serde(default, rename = "_embedded")]
    embedded: AddressesEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct AddressesEmbedded {
    #[serde(default)]
    address: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    address_id: String,
}

/// Address ids for a zip code, restricted to addresses serving a group.
pub async fn addresses_for_zip(
    client: &ApiClient,
    zip_code: &str,
) -> Result<Vec<String>, ApiError> {
    let envelope: AddressesEnvelope = client
        .get(
            "address",
            &[
                ("postal_code", zip_code.to_owned()),
                ("filter", "group".to_owned()),
                ("per_page", PER_PAGE.to_string()),
            ],
        )
        .await?;

    Ok(envelope
        .embedded
        .address
        .into_iter()
        .map(|address| address.address_id)
        .collect())
}

#[derive(Debug, Deserialize)]
struct GroupsEnvelope {
    #[serde(default, rename = "_embedded")]
    embedded: GroupsEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct GroupsEmbedded {
    #[serde(default)]
    group: Vec<GroupDocument>,
}

#[derive(Debug, Deserialize)]
struct GroupDocument {
    group_id: String,
}

/// Group ids served by an address.
pub async fn groups_for_address(
    client: &ApiClient,
    address_id: &str,
) -> Result<Vec<String>, ApiError> {
    let envelope: GroupsEnvelope = client
        .get(
            &format!("address/{address_id}/group"),
            &[("per_page", PER_PAGE.to_string())],
        )
        .await?;

    Ok(envelope
        .embedded
        .group
        .into_iter()
        .map(|group| group.group_id)
        .collect())
}

/// One page of a group's membership.
#[derive(Debug)]
pub struct UserPage {
    pub user_ids: Vec<String>,
    /// Whether the API advertised a further page.
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(default, rename = "_embedded")]
    embedded: UsersEmbedded,
    #[serde(default, rename = "_links")]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct UsersEmbedded {
    #[serde(default)]
    items: Vec<UserDocument>,
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    // Only the link's presence matters; its shape is the API's business.
    next: Option<serde_json::Value>,
}

/// Fetch page `page` of a group's users.
pub async fn group_users_page(
    client: &ApiClient,
    group_id: &str,
    page: u32,
) -> Result<UserPage, ApiError> {
    let envelope: UsersEnvelope = client
        .get(
            &format!("group/{group_id}/users"),
            &[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await?;

    Ok(UserPage {
        user_ids: envelope
            .embedded
            .items
            .into_iter()
            .map(|user| user.user_id)
            .collect(),
        has_next: envelope.links.next.is_some(),
    })
}
