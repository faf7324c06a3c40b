use serde::{Deserialize, Serialize};

use super::awards::{Awards, AwardsCategory, CategoryId, OptionId};

/// Published results for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResults {
    pub category_id: CategoryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub total_votes: u64,
    /// Most votes first.
    pub options: Vec<OptionTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option_id: OptionId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    pub votes: u64,
    /// Share of the category's votes, in percent.
    pub share: f64,
    pub winner: bool,
}

/// Tally every category of an edition from the options' vote counts.
pub fn tally(awards: &Awards) -> Vec<CategoryResults> {
    awards.categories.iter().map(tally_category).collect()
}

fn tally_category(category: &AwardsCategory) -> CategoryResults {
    let total_votes: u64 = category
        .options
        .iter()
        .map(|option| option.votes_count.unwrap_or(0))
        .sum();
    let top = category
        .options
        .iter()
        .map(|option| option.votes_count.unwrap_or(0))
        .max()
        .unwrap_or(0);

    let mut options: Vec<OptionTally> = category
        .options
        .iter()
        .map(|option| {
            let votes = option.votes_count.unwrap_or(0);
            OptionTally {
                option_id: option.id.clone(),
                title: option.display_title().to_string(),
                product_image: option.product.image_url.clone(),
                votes,
                share: if total_votes == 0 {
                    0.0
                } else {
                    (votes as f64 * 100.0) / total_votes as f64
                },
                // Ties share the win; nobody wins an empty category.
                winner: top > 0 && votes == top,
            }
        })
        .collect();
    // Stable, so ties keep edition order.
    options.sort_by(|a, b| b.votes.cmp(&a.votes));

    CategoryResults {
        category_id: category.id.clone(),
        title: category.title.clone(),
        icon: category.icon.clone(),
        total_votes,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_and_shares() {
        let results = tally(&Awards::results_example());
        let gpu = &results[0];
        assert_eq!(gpu.total_votes, 42);
        assert_eq!(gpu.options[0].option_id, "rx-7800");
        assert_eq!(gpu.options[0].votes, 30);
        assert!(gpu.options[0].winner);
        assert!(!gpu.options[1].winner);
        let total_share: f64 = gpu.options.iter().map(|o| o.share).sum();
        assert!((total_share - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_share_the_win() {
        let results = tally(&Awards::results_example());
        let cpu = &results[1];
        assert_eq!(cpu.options[0].option_id, "r7-7800x3d");
        assert!(cpu.options.iter().all(|o| o.winner));
        assert_eq!(cpu.options[0].share, 50.0);
    }

    #[test]
    fn empty_category_has_no_winner() {
        let results = tally(&Awards::results_example());
        let ssd = &results[2];
        assert_eq!(ssd.total_votes, 0);
        assert!(ssd.options.iter().all(|o| !o.winner && o.share == 0.0));
    }

    #[test]
    fn missing_counts_are_zero() {
        let results = tally(&Awards::example());
        assert!(results.iter().all(|c| c.total_votes == 0));
    }
}
