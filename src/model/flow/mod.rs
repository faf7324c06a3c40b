//! The awards voting flow: which view an edition is shown in, and the step
//! machine that walks a signed-in user through one vote per category.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    awards::{Awards, PriorVote},
    vote::{Vote, VoteInput, VoteSet},
};

mod progress;
mod views;

pub use progress::{Progress, StepMarker};
pub use views::*;

/// How an edition is presented. Decided once from the server flags when the
/// flow is mounted and never changed afterwards; a changed flag needs a remount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardsFlow {
    /// Results are published. No voting is offered.
    ResultsShown(Awards),
    /// Voting is over. `votes` holds what the user cast, if anything.
    VotingClosed { awards: Awards, votes: VoteSet },
    /// Voting is open.
    Open(VotingSession),
}

impl AwardsFlow {
    /// Mount a flow from the fetched edition and the user's prior votes.
    pub fn mount(awards: Awards, my_votes: &[PriorVote]) -> Self {
        if awards.show_results {
            info!("Awards {} mounted with results shown", awards.year);
            Self::ResultsShown(awards)
        } else if !awards.is_active {
            info!("Awards {} mounted with voting closed", awards.year);
            let votes = VoteSet::seeded(&awards, my_votes);
            Self::VotingClosed { awards, votes }
        } else {
            info!(
                "Awards {} mounted for voting ({} prior votes)",
                awards.year,
                my_votes.len()
            );
            Self::Open(VotingSession::new(awards, my_votes))
        }
    }

    pub fn awards(&self) -> &Awards {
        match self {
            Self::ResultsShown(awards) => awards,
            Self::VotingClosed { awards, .. } => awards,
            Self::Open(session) => session.awards(),
        }
    }

    /// The voting session, when voting is open.
    pub fn session(&self) -> Result<&VotingSession> {
        match self {
            Self::Open(session) => Ok(session),
            _ => Err(self.not_open()),
        }
    }

    /// The voting session, when voting is open.
    pub fn session_mut(&mut self) -> Result<&mut VotingSession> {
        match self {
            Self::Open(session) => Ok(session),
            Self::ResultsShown(_) => Err(Error::conflict("Results have been published.")),
            Self::VotingClosed { .. } => Err(Error::conflict("Voting is closed.")),
        }
    }

    fn not_open(&self) -> Error {
        match self {
            Self::ResultsShown(_) => Error::conflict("Results have been published."),
            _ => Error::conflict("Voting is closed."),
        }
    }

    /// Render the page for the current state.
    pub fn render(&self) -> AwardsPage {
        match self {
            Self::ResultsShown(awards) => AwardsPage::results(awards),
            Self::VotingClosed { awards, votes } => AwardsPage::closed(awards, votes),
            Self::Open(session) => session.render(),
        }
    }
}

/// Where an open session currently is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Choosing an option for the category at this index.
    Voting(usize),
    /// Reviewing all choices before submission.
    Summary,
    /// The votes have been accepted by the API.
    Submitted,
}

/// Step state for an open edition. Owns the working vote set; nothing else
/// writes to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotingSession {
    awards: Awards,
    votes: VoteSet,
    step: usize,
    submitted: bool,
    submitting: bool,
}

impl VotingSession {
    /// Start a session, keeping any votes already cast for categories in this edition.
    /// A user who has voted before starts on the success view.
    pub fn new(awards: Awards, my_votes: &[PriorVote]) -> Self {
        let votes = VoteSet::seeded(&awards, my_votes);
        Self {
            awards,
            votes,
            step: 0,
            submitted: !my_votes.is_empty(),
            submitting: false,
        }
    }

    pub fn awards(&self) -> &Awards {
        &self.awards
    }

    pub fn votes(&self) -> &VoteSet {
        &self.votes
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of categories. The summary sits at this step index.
    pub fn total_steps(&self) -> usize {
        self.awards.categories.len()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn stage(&self) -> Stage {
        if self.submitted {
            Stage::Submitted
        } else if self.step >= self.total_steps() {
            Stage::Summary
        } else {
            Stage::Voting(self.step)
        }
    }

    /// Every category has a vote.
    pub fn is_complete(&self) -> bool {
        self.awards
            .categories
            .iter()
            .all(|category| self.votes.contains(&category.id))
    }

    /// Select an option for a category. Anonymous users are refused and
    /// nothing changes. The step does not move.
    pub fn vote(
        &mut self,
        token: Option<&AuthToken>,
        category_id: &str,
        option_id: &str,
    ) -> Result<()> {
        if token.is_none() {
            return Err(Error::AuthRequired);
        }

        let category = self
            .awards
            .category(category_id)
            .ok_or_else(|| Error::not_found(format!("Category '{category_id}'")))?;
        if category.option(option_id).is_none() {
            return Err(Error::not_found(format!(
                "Option '{option_id}' in category '{category_id}'"
            )));
        }

        debug!("Vote {category_id} -> {option_id}");
        self.votes.cast(Vote::new(category_id, option_id));
        Ok(())
    }

    /// Move forward one step, stopping at the summary.
    pub fn next(&mut self) -> usize {
        if self.step < self.total_steps() {
            self.step += 1;
        }
        self.step
    }

    /// Move back one step, stopping at the first category.
    pub fn back(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.step
    }

    /// Submission is offered only on the summary with every category voted.
    pub fn can_submit(&self) -> bool {
        self.stage() == Stage::Summary && self.is_complete() && !self.submitting
    }

    /// Validate a submission and mark it in flight. Returns the batch to send.
    /// On error nothing changes and no request should be made.
    pub fn begin_submit(&mut self, token: Option<&AuthToken>) -> Result<Vec<VoteInput>> {
        if self.stage() != Stage::Summary {
            return Err(Error::conflict("Review your votes before submitting."));
        }
        if self.submitting {
            return Err(Error::conflict("Your votes are already being submitted."));
        }
        if token.is_none() {
            return Err(Error::AuthRequired);
        }
        if self.votes.is_empty() {
            return Err(Error::validation("Vote in at least one category."));
        }
        if !self.is_complete() {
            return Err(Error::validation(
                "Vote in every category before submitting.",
            ));
        }

        self.submitting = true;
        Ok(self.votes.to_inputs())
    }

    /// The API accepted the batch.
    pub fn complete_submit(&mut self) {
        self.submitting = false;
        self.submitted = true;
        info!("Awards {} votes submitted", self.awards.year);
    }

    /// The API rejected the batch. Votes and step are kept for a retry.
    pub fn abort_submit(&mut self) {
        self.submitting = false;
    }

    /// Go back to the first category after a submission, keeping the votes.
    pub fn restart(&mut self) -> Result<()> {
        if self.stage() != Stage::Submitted {
            return Err(Error::conflict("Nothing has been submitted yet."));
        }
        self.step = 0;
        self.submitted = false;
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress::derive(self.step, &self.awards.categories, &self.votes)
    }

    pub fn render(&self) -> AwardsPage {
        match self.stage() {
            Stage::Voting(step) => AwardsPage::voting(self, step),
            Stage::Summary => AwardsPage::summary(self),
            Stage::Submitted => AwardsPage::success(&self.awards, &self.votes),
        }
    }
}
