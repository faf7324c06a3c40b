use serde::Serialize;

use crate::model::{
    awards::{AwardsCategory, CategoryId},
    vote::VoteSet,
};

/// Completion of a voting session. A pure projection of the step, the
/// categories and the votes; deriving it twice from the same inputs gives
/// the same result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_step: usize,
    pub total_steps: usize,
    pub completed: usize,
    /// Share of categories voted, in percent. Independent of `current_step`.
    pub percentage: f64,
    pub steps: Vec<StepMarker>,
}

/// One marker on the progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMarker {
    pub index: usize,
    pub category_id: CategoryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// A vote exists for this category, wherever the user currently is.
    pub completed: bool,
    pub current: bool,
}

impl Progress {
    pub fn derive(current_step: usize, categories: &[AwardsCategory], votes: &VoteSet) -> Self {
        let total_steps = categories.len();
        let steps: Vec<StepMarker> = categories
            .iter()
            .enumerate()
            .map(|(index, category)| StepMarker {
                index,
                category_id: category.id.clone(),
                title: category.marker_title().to_string(),
                icon: category.icon.clone(),
                completed: votes.contains(&category.id),
                current: index == current_step,
            })
            .collect();
        let completed = steps.iter().filter(|step| step.completed).count();

        let percentage = if total_steps == 0 {
            0.0
        } else {
            (votes.len() as f64 * 100.0) / total_steps as f64
        };

        Self {
            current_step,
            total_steps,
            completed,
            percentage,
            steps,
        }
    }
}
