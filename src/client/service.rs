use std::sync::Arc;

use log::{info, warn};
use rocket::serde::json::serde_json::json;

use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    awards::{Awards, PriorVote},
    flow::AwardsFlow,
    vote::VoteInput,
};

use super::{
    cache::{CacheKey, QueryCache},
    AwardsApi,
};

/// The awards API behind a query cache. The caller's own votes are refetched
/// as soon as a cast-votes mutation completes.
pub struct AwardsService {
    api: Arc<dyn AwardsApi>,
    cache: QueryCache,
}

impl AwardsService {
    pub fn new(api: Arc<dyn AwardsApi>, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn awards_key() -> CacheKey {
        CacheKey::operation("CurrentAwards")
    }

    /// `None` when no key can be built; the votes then bypass the cache.
    fn my_votes_key(token: &AuthToken, awards_id: &str) -> Option<CacheKey> {
        CacheKey::new(
            "MyAwardsVotes",
            &json!({ "awardsId": awards_id, "viewer": token.fingerprint() }),
        )
        .map_err(|e| warn!("Not caching votes for {awards_id}: {e}"))
        .ok()
    }

    /// The current edition. A missing edition is an error.
    pub async fn current_awards(&self) -> Result<Awards> {
        let key = Self::awards_key();
        if let Some(awards) = self.cache.read::<Awards>(&key) {
            return Ok(awards);
        }

        let awards = self
            .api
            .current_awards()
            .await?
            .ok_or_else(|| Error::not_found("No awards edition is running"))?;
        self.cache.write(key, &awards);
        Ok(awards)
    }

    /// Forget the cached edition so the next read sees the API's current flags.
    pub fn refresh_awards(&self) {
        self.cache.invalidate(&Self::awards_key());
    }

    pub async fn my_votes(&self, token: &AuthToken, awards_id: &str) -> Result<Vec<PriorVote>> {
        let key = Self::my_votes_key(token, awards_id);
        if let Some(votes) = key.as_ref().and_then(|key| self.cache.read::<Vec<PriorVote>>(key)) {
            return Ok(votes);
        }

        let votes = self.api.my_votes(token, awards_id).await?;
        if let Some(key) = key {
            self.cache.write(key, &votes);
        }
        Ok(votes)
    }

    /// Cast a batch of votes, then refetch the caller's votes into the cache.
    pub async fn cast_votes(
        &self,
        token: &AuthToken,
        awards_id: &str,
        votes: &[VoteInput],
    ) -> Result<Vec<PriorVote>> {
        let stored = self.api.cast_votes(token, votes).await?;
        info!("Cast {} awards votes in {awards_id}", stored.len());

        if let Some(key) = Self::my_votes_key(token, awards_id) {
            self.cache.invalidate(&key);
            match self.api.my_votes(token, awards_id).await {
                Ok(refreshed) => self.cache.write(key, &refreshed),
                Err(e) => warn!("Could not refetch votes after casting: {e}"),
            }
        }

        Ok(stored)
    }

    /// Fetch everything needed to mount a flow. Prior votes are only looked up
    /// for signed-in users.
    pub async fn mount(&self, token: Option<&AuthToken>) -> Result<AwardsFlow> {
        let awards = self.current_awards().await?;
        let my_votes = match token {
            Some(token) => self.my_votes(token, &awards.id).await?,
            None => Vec::new(),
        };
        Ok(AwardsFlow::mount(awards, &my_votes))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::fake::FakeAwardsApi;
    use crate::model::flow::Stage;

    use super::*;

    fn runtime() -> rocket::tokio::runtime::Runtime {
        rocket::tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn service(api: &Arc<FakeAwardsApi>) -> AwardsService {
        AwardsService::new(api.clone(), QueryCache::new())
    }

    #[test]
    fn awards_are_read_through() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::new(Awards::example()));
            let service = service(&api);

            service.current_awards().await.unwrap();
            service.current_awards().await.unwrap();
            assert_eq!(api.awards_fetches(), 1);

            service.refresh_awards();
            service.current_awards().await.unwrap();
            assert_eq!(api.awards_fetches(), 2);
        });
    }

    #[test]
    fn missing_edition() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::empty());
            assert!(matches!(
                service(&api).current_awards().await,
                Err(Error::NotFound(_))
            ));
        });
    }

    #[test]
    fn anonymous_mount_skips_my_votes() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::new(Awards::example()));
            let flow = service(&api).mount(None).await.unwrap();
            assert_eq!(flow.session().unwrap().stage(), Stage::Voting(0));
            assert_eq!(api.my_votes_fetches(), 0);
        });
    }

    #[test]
    fn cast_refetches_my_votes() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::new(Awards::example()));
            let service = service(&api);
            let token = AuthToken::example();

            assert!(service.my_votes(&token, "awards-2024").await.unwrap().is_empty());
            assert_eq!(api.my_votes_fetches(), 1);

            let batch = vec![VoteInput {
                awards_category_option_id: "rtx-4070".to_string(),
            }];
            let stored = service.cast_votes(&token, "awards-2024", &batch).await.unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(api.cast_calls(), 1);
            assert_eq!(api.my_votes_fetches(), 2);

            // Served from the refreshed cache entry.
            let mine = service.my_votes(&token, "awards-2024").await.unwrap();
            assert_eq!(mine.len(), 1);
            assert_eq!(api.my_votes_fetches(), 2);

            let flow = service.mount(Some(&token)).await.unwrap();
            assert_eq!(flow.session().unwrap().stage(), Stage::Submitted);
        });
    }

    #[test]
    fn failed_cast_keeps_cache() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::new(Awards::example()));
            let service = service(&api);
            let token = AuthToken::example();
            service.my_votes(&token, "awards-2024").await.unwrap();

            api.fail_casts("Voting is closed");
            let batch = vec![VoteInput {
                awards_category_option_id: "rtx-4070".to_string(),
            }];
            assert!(matches!(
                service.cast_votes(&token, "awards-2024", &batch).await,
                Err(Error::Api(_))
            ));
            assert_eq!(api.my_votes_fetches(), 1);
        });
    }

    #[test]
    fn my_votes_are_per_user() {
        runtime().block_on(async {
            let api = Arc::new(FakeAwardsApi::new(Awards::example()));
            let service = service(&api);
            let alice = AuthToken::new("alice").unwrap();
            let bob = AuthToken::new("bob").unwrap();

            service.my_votes(&alice, "awards-2024").await.unwrap();
            service.my_votes(&bob, "awards-2024").await.unwrap();
            assert_eq!(api.my_votes_fetches(), 2);
        });
    }
}
