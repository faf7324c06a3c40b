//! Access to the Bench Promos GraphQL API, which owns all persistent awards data.

use crate::error::Result;
use crate::model::{
    auth::AuthToken,
    awards::{Awards, PriorVote},
    vote::VoteInput,
};

pub mod cache;
mod graphql;
mod service;

#[cfg(test)]
pub mod fake;

pub use graphql::GraphQlClient;
pub use service::AwardsService;

/// The operations the voting flow needs from the API.
#[rocket::async_trait]
pub trait AwardsApi: Send + Sync {
    /// The current edition with its categories, options and products,
    /// or `None` if no edition exists.
    async fn current_awards(&self) -> Result<Option<Awards>>;

    /// The votes the caller already cast in an edition.
    async fn my_votes(&self, token: &AuthToken, awards_id: &str) -> Result<Vec<PriorVote>>;

    /// Cast a whole batch of votes in one mutation, returning the stored votes.
    async fn cast_votes(&self, token: &AuthToken, votes: &[VoteInput]) -> Result<Vec<PriorVote>>;
}
