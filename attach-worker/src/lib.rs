//! Attach regional games to the members of the groups that serve their
//! zip codes.
//!
//! Games carry an optional list of zip codes. For every such game the
//! pipeline resolves the addresses in each zip code, the groups those
//! addresses serve, and finally every member of those groups, page by
//! page, attaching the game to each member along the way.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod resources;
