//! An in-memory stand-in for the awards API, used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    awards::{Awards, PriorVote},
    vote::VoteInput,
};

use super::AwardsApi;

/// Shared handle to the fake, as injected into route tests.
pub type FakeApi = Arc<FakeAwardsApi>;

#[derive(Default)]
pub struct FakeAwardsApi {
    awards: Mutex<Option<Awards>>,
    /// Stored votes by bearer credential.
    votes: Mutex<HashMap<String, Vec<PriorVote>>>,
    cast_failure: Mutex<Option<String>>,
    awards_fetches: AtomicUsize,
    my_votes_fetches: AtomicUsize,
    cast_calls: AtomicUsize,
}

impl FakeAwardsApi {
    pub fn new(awards: Awards) -> Self {
        Self {
            awards: Mutex::new(Some(awards)),
            ..Self::default()
        }
    }

    /// No edition running.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set_awards(&self, awards: Awards) {
        *self.awards.lock().unwrap() = Some(awards);
    }

    /// Stop running any edition.
    pub fn clear_awards(&self) {
        *self.awards.lock().unwrap() = None;
    }

    /// Pretend the user already voted for these options.
    pub fn set_votes(&self, token: &AuthToken, option_ids: &[&str]) {
        let votes = option_ids.iter().map(|id| PriorVote::example(id)).collect();
        self.votes
            .lock()
            .unwrap()
            .insert(token.credential().to_string(), votes);
    }

    pub fn votes_of(&self, token: &AuthToken) -> Vec<PriorVote> {
        self.votes
            .lock()
            .unwrap()
            .get(token.credential())
            .cloned()
            .unwrap_or_default()
    }

    /// Make every following cast fail with this server message.
    pub fn fail_casts(&self, message: &str) {
        *self.cast_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn allow_casts(&self) {
        *self.cast_failure.lock().unwrap() = None;
    }

    pub fn awards_fetches(&self) -> usize {
        self.awards_fetches.load(Ordering::SeqCst)
    }

    pub fn my_votes_fetches(&self) -> usize {
        self.my_votes_fetches.load(Ordering::SeqCst)
    }

    pub fn cast_calls(&self) -> usize {
        self.cast_calls.load(Ordering::SeqCst)
    }
}

#[rocket::async_trait]
impl AwardsApi for FakeAwardsApi {
    async fn current_awards(&self) -> Result<Option<Awards>> {
        self.awards_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.awards.lock().unwrap().clone())
    }

    async fn my_votes(&self, token: &AuthToken, _awards_id: &str) -> Result<Vec<PriorVote>> {
        self.my_votes_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.votes_of(token))
    }

    async fn cast_votes(&self, token: &AuthToken, votes: &[VoteInput]) -> Result<Vec<PriorVote>> {
        self.cast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.cast_failure.lock().unwrap().clone() {
            return Err(Error::Api(message));
        }

        let stored: Vec<PriorVote> = votes
            .iter()
            .map(|vote| PriorVote::example(&vote.awards_category_option_id))
            .collect();
        self.votes
            .lock()
            .unwrap()
            .insert(token.credential().to_string(), stored.clone());
        Ok(stored)
    }
}
