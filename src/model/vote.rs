use serde::{Deserialize, Serialize};

use super::awards::{Awards, CategoryId, OptionId, PriorVote};

/// A local selection of one option in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub category_id: CategoryId,
    pub option_id: OptionId,
}

impl Vote {
    pub fn new(category_id: impl Into<CategoryId>, option_id: impl Into<OptionId>) -> Self {
        Self {
            category_id: category_id.into(),
            option_id: option_id.into(),
        }
    }
}

/// The batch entry sent by the cast-votes mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    pub awards_category_option_id: OptionId,
}

impl From<&Vote> for VoteInput {
    fn from(vote: &Vote) -> Self {
        Self {
            awards_category_option_id: vote.option_id.clone(),
        }
    }
}

/// Ordered votes, holding at most one vote per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VoteSet(Vec<Vote>);

impl VoteSet {
    /// Rebuild the votes the user already cast, keeping only options found in `awards`.
    pub fn seeded(awards: &Awards, prior: &[PriorVote]) -> Self {
        let mut votes = Self::default();
        for prior_vote in prior {
            if let Some(category) = awards.category_of_option(&prior_vote.awards_category_option_id)
            {
                votes.cast(Vote::new(
                    category.id.clone(),
                    prior_vote.awards_category_option_id.clone(),
                ));
            }
        }
        votes
    }

    /// Record a vote, replacing any earlier vote for the same category in place.
    pub fn cast(&mut self, vote: Vote) {
        match self.0.iter_mut().find(|v| v.category_id == vote.category_id) {
            Some(existing) => existing.option_id = vote.option_id,
            None => self.0.push(vote),
        }
    }

    /// The vote for a category, if any.
    pub fn get(&self, category_id: &str) -> Option<&Vote> {
        self.0.iter().find(|v| v.category_id == category_id)
    }

    pub fn contains(&self, category_id: &str) -> bool {
        self.get(category_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vote> {
        self.0.iter()
    }

    /// The mutation payload: one entry per vote.
    pub fn to_inputs(&self) -> Vec<VoteInput> {
        self.0.iter().map(VoteInput::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_vote_per_category() {
        let mut votes = VoteSet::default();
        votes.cast(Vote::new("gpu", "rtx-4070"));
        votes.cast(Vote::new("cpu", "i5-14600k"));
        votes.cast(Vote::new("gpu", "rx-7800"));
        votes.cast(Vote::new("cpu", "r7-7800x3d"));
        votes.cast(Vote::new("gpu", "rx-7800"));

        assert_eq!(votes.len(), 2);
        assert_eq!(votes.get("gpu").unwrap().option_id, "rx-7800");
        assert_eq!(votes.get("cpu").unwrap().option_id, "r7-7800x3d");
    }

    #[test]
    fn replace_keeps_position() {
        let mut votes = VoteSet::default();
        votes.cast(Vote::new("gpu", "rtx-4070"));
        votes.cast(Vote::new("cpu", "i5-14600k"));
        votes.cast(Vote::new("gpu", "rx-7800"));

        let order: Vec<_> = votes.iter().map(|v| v.category_id.as_str()).collect();
        assert_eq!(order, vec!["gpu", "cpu"]);
    }

    #[test]
    fn seeded_ignores_unknown_options() {
        let awards = Awards::example();
        let prior = vec![
            PriorVote::example("sn850x"),
            PriorVote::example("retired-option"),
            PriorVote::example("rtx-4070"),
        ];
        let votes = VoteSet::seeded(&awards, &prior);

        assert_eq!(votes.len(), 2);
        assert_eq!(votes.get("ssd").unwrap().option_id, "sn850x");
        assert_eq!(votes.get("gpu").unwrap().option_id, "rtx-4070");
        assert!(!votes.contains("cpu"));
    }

    #[test]
    fn inputs_are_keyed_by_option() {
        let mut votes = VoteSet::default();
        votes.cast(Vote::new("gpu", "rtx-4070"));
        votes.cast(Vote::new("ssd", "990-pro"));
        assert_eq!(
            votes.to_inputs(),
            vec![
                VoteInput {
                    awards_category_option_id: "rtx-4070".to_string()
                },
                VoteInput {
                    awards_category_option_id: "990-pro".to_string()
                },
            ]
        );
    }
}
