use serde::Serialize;

use crate::model::{
    awards::{Awards, AwardsCategory, AwardsCategoryOption, CategoryId, OptionId},
    results::{tally, CategoryResults},
    vote::VoteSet,
};

use super::{Progress, VotingSession};

/// Shown on the closed view to users who cast no votes.
pub const NO_VOTE_MESSAGE: &str = "You did not vote this edition.";

/// Everything a client needs to draw the awards page in its current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum AwardsPage {
    Results(ResultsView),
    Closed(ClosedView),
    Voting(StepView),
    Summary(SummaryView),
    Success(SuccessView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub year: i32,
    pub categories: Vec<CategoryResults>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedView {
    pub year: i32,
    pub voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rows: Vec<VoteRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub year: i32,
    pub progress: Progress,
    pub category: CategoryView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<OptionId>,
    pub can_go_back: bool,
    /// The current category has a vote.
    pub can_go_next: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub year: i32,
    pub progress: Progress,
    pub rows: Vec<VoteRow>,
    /// Every category has a vote and nothing is in flight.
    pub can_submit: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessView {
    pub year: i32,
    pub rows: Vec<VoteRow>,
    pub can_restart: bool,
}

/// A category with its options, as offered on a voting step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: CategoryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: OptionId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_slug: Option<String>,
    pub selected: bool,
}

/// One line of a review: a category and what was chosen in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRow {
    pub category_id: CategoryId,
    pub category_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    pub choice: Choice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Choice {
    #[serde(rename_all = "camelCase")]
    Chosen {
        option_id: OptionId,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        product_image: Option<String>,
    },
    NoVote,
}

impl AwardsPage {
    pub(super) fn results(awards: &Awards) -> Self {
        Self::Results(ResultsView {
            year: awards.year,
            categories: tally(awards),
        })
    }

    pub(super) fn closed(awards: &Awards, votes: &VoteSet) -> Self {
        let voted = !votes.is_empty();
        Self::Closed(ClosedView {
            year: awards.year,
            voted,
            message: (!voted).then(|| NO_VOTE_MESSAGE.to_string()),
            rows: if voted { vote_rows(awards, votes) } else { Vec::new() },
        })
    }

    pub(super) fn voting(session: &VotingSession, step: usize) -> Self {
        let awards = session.awards();
        let votes = session.votes();
        let category = &awards.categories[step];
        let selected = votes.get(&category.id).map(|vote| vote.option_id.clone());

        Self::Voting(StepView {
            year: awards.year,
            progress: session.progress(),
            category: CategoryView::new(category, selected.as_deref()),
            can_go_next: selected.is_some(),
            selected_option_id: selected,
            can_go_back: step > 0,
        })
    }

    pub(super) fn summary(session: &VotingSession) -> Self {
        Self::Summary(SummaryView {
            year: session.awards().year,
            progress: session.progress(),
            rows: vote_rows(session.awards(), session.votes()),
            can_submit: session.can_submit(),
            submitting: session.is_submitting(),
        })
    }

    pub(super) fn success(awards: &Awards, votes: &VoteSet) -> Self {
        Self::Success(SuccessView {
            year: awards.year,
            rows: vote_rows(awards, votes),
            can_restart: true,
        })
    }
}

impl CategoryView {
    fn new(category: &AwardsCategory, selected: Option<&str>) -> Self {
        Self {
            id: category.id.clone(),
            title: category.title.clone(),
            icon: category.icon.clone(),
            description: category.description.clone(),
            options: category
                .options
                .iter()
                .map(|option| OptionView::new(option, selected == Some(option.id.as_str())))
                .collect(),
        }
    }
}

impl OptionView {
    fn new(option: &AwardsCategoryOption, selected: bool) -> Self {
        Self {
            id: option.id.clone(),
            title: option.display_title().to_string(),
            brand: option.brand.clone(),
            subtitle: option.subtitle.clone(),
            badge: option.badge.clone(),
            product_image: option.product.image_url.clone(),
            product_slug: option.product.slug.clone(),
            selected,
        }
    }
}

/// One row per category in edition order, with a placeholder where no vote exists.
fn vote_rows(awards: &Awards, votes: &VoteSet) -> Vec<VoteRow> {
    awards
        .categories
        .iter()
        .map(|category| {
            let chosen = votes
                .get(&category.id)
                .and_then(|vote| category.option(&vote.option_id));
            VoteRow {
                category_id: category.id.clone(),
                category_title: category.title.clone(),
                category_icon: category.icon.clone(),
                choice: match chosen {
                    Some(option) => Choice::Chosen {
                        option_id: option.id.clone(),
                        title: option.display_title().to_string(),
                        product_image: option.product.image_url.clone(),
                    },
                    None => Choice::NoVote,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{serde_json, serde_json::json};

    use crate::model::{
        auth::AuthToken,
        awards::PriorVote,
        flow::{AwardsFlow, Stage},
    };

    use super::*;

    #[test]
    fn summary_with_skipped_category() {
        let mut session = VotingSession::new(Awards::example(), &[]);
        let token = AuthToken::example();
        session.vote(Some(&token), "gpu", "rtx-4070").unwrap();
        session.next();
        session.vote(Some(&token), "cpu", "i5-14600k").unwrap();
        session.next();
        session.next();
        assert_eq!(session.stage(), Stage::Summary);

        let view = match session.render() {
            AwardsPage::Summary(view) => view,
            other => panic!("unexpected page {other:?}"),
        };
        assert!(!view.can_submit);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(
            view.rows[0].choice,
            Choice::Chosen {
                option_id: "rtx-4070".to_string(),
                title: "Product rtx-4070".to_string(),
                product_image: Some("https://img.example/rtx-4070.png".to_string()),
            }
        );
        assert!(matches!(view.rows[1].choice, Choice::Chosen { .. }));
        assert_eq!(view.rows[2].choice, Choice::NoVote);
        assert_eq!(view.rows[2].category_icon.as_deref(), Some("ssd-icon"));
    }

    #[test]
    fn step_view_marks_selection() {
        let mut session = VotingSession::new(Awards::example(), &[]);
        let token = AuthToken::example();

        let view = match session.render() {
            AwardsPage::Voting(view) => view,
            other => panic!("unexpected page {other:?}"),
        };
        assert!(!view.can_go_back);
        assert!(!view.can_go_next);
        assert_eq!(view.category.id, "gpu");

        session.vote(Some(&token), "gpu", "rx-7800").unwrap();
        let view = match session.render() {
            AwardsPage::Voting(view) => view,
            other => panic!("unexpected page {other:?}"),
        };
        assert!(view.can_go_next);
        assert_eq!(view.selected_option_id.as_deref(), Some("rx-7800"));
        let selected: Vec<_> = view.category.options.iter().map(|o| o.selected).collect();
        assert_eq!(selected, vec![false, true]);
    }

    #[test]
    fn results_dominate() {
        let mut awards = Awards::results_example();
        awards.is_active = true;
        let flow = AwardsFlow::mount(awards, &[PriorVote::example("rtx-4070")]);
        let json = serde_json::to_value(flow.render()).unwrap();
        assert_eq!(json["view"], json!("results"));
        assert_eq!(json["categories"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn closed_without_votes() {
        let flow = AwardsFlow::mount(Awards::closed_example(), &[]);
        match flow.render() {
            AwardsPage::Closed(view) => {
                assert!(!view.voted);
                assert_eq!(view.message.as_deref(), Some(NO_VOTE_MESSAGE));
                assert!(view.rows.is_empty());
            }
            other => panic!("unexpected page {other:?}"),
        }
    }

    #[test]
    fn closed_with_votes_lists_them() {
        let flow = AwardsFlow::mount(Awards::closed_example(), &[PriorVote::example("990-pro")]);
        match flow.render() {
            AwardsPage::Closed(view) => {
                assert!(view.voted);
                assert_eq!(view.message, None);
                assert_eq!(view.rows[2].choice, Choice::Chosen {
                    option_id: "990-pro".to_string(),
                    title: "Product 990-pro".to_string(),
                    product_image: Some("https://img.example/990-pro.png".to_string()),
                });
                assert_eq!(view.rows[0].choice, Choice::NoVote);
            }
            other => panic!("unexpected page {other:?}"),
        }
    }

    #[test]
    fn wire_shape() {
        let session = VotingSession::new(Awards::example(), &[]);
        let json = serde_json::to_value(AwardsPage::summary(&session)).unwrap();
        assert_eq!(json["view"], json!("summary"));
        assert_eq!(json["canSubmit"], json!(false));
        assert_eq!(json["rows"][0]["choice"], json!({"kind": "no_vote"}));
    }
}
