use serde::{Deserialize, Serialize};

pub type AwardsId = String;
pub type CategoryId = String;
pub type OptionId = String;
pub type ProductId = String;

/// One yearly edition of the awards, as returned by the current-edition query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Awards {
    pub id: AwardsId,
    pub year: i32,
    /// Voting is open.
    pub is_active: bool,
    /// Results are published. Takes precedence over `is_active`.
    pub show_results: bool,
    /// Categories in voting order.
    #[serde(default)]
    pub categories: Vec<AwardsCategory>,
}

impl Awards {
    /// Find a category by ID.
    pub fn category(&self, category_id: &str) -> Option<&AwardsCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Find the category that contains the given option.
    pub fn category_of_option(&self, option_id: &str) -> Option<&AwardsCategory> {
        self.categories
            .iter()
            .find(|c| c.option(option_id).is_some())
    }
}

/// A themed group of competing products within an edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardsCategory {
    pub id: CategoryId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<AwardsCategoryOption>,
}

impl AwardsCategory {
    /// Find an option of this category by ID.
    pub fn option(&self, option_id: &str) -> Option<&AwardsCategoryOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Label used on step markers.
    pub fn marker_title(&self) -> &str {
        self.short_title.as_deref().unwrap_or(&self.title)
    }
}

/// One selectable candidate within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardsCategoryOption {
    pub id: OptionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub product: Product,
    /// Only populated by the API once results are published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes_count: Option<u64>,
}

impl AwardsCategoryOption {
    /// The option's own title, or the product name when it has none.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.product.name)
    }
}

/// The product behind an option. Everything else about products is owned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// A vote the signed-in user already cast, as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorVote {
    pub id: String,
    pub awards_category_option_id: OptionId,
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn lookups() {
        let awards = Awards::example();
        assert_eq!(awards.category("cpu").unwrap().title, "Best Processor");
        assert!(awards.category("psu").is_none());
        assert_eq!(awards.category_of_option("990-pro").unwrap().id, "ssd");
        assert!(awards.category_of_option("nope").is_none());
    }

    #[test]
    fn display_title_falls_back_to_product() {
        let mut option = AwardsCategoryOption::example("sn850x");
        assert_eq!(option.display_title(), "Product sn850x");
        option.title = Some("WD Black SN850X".to_string());
        assert_eq!(option.display_title(), "WD Black SN850X");
    }

    #[test]
    fn deserialize_api_shape() {
        let raw = r#"{
            "id": "a1",
            "year": 2023,
            "isActive": true,
            "showResults": false,
            "categories": [{
                "id": "c1",
                "title": "Best Monitor",
                "shortTitle": "Monitor",
                "options": [{
                    "id": "o1",
                    "badge": "Editor's pick",
                    "product": {"id": "p1", "name": "Panel", "imageUrl": "x.png"}
                }]
            }]
        }"#;
        let awards: Awards = serde_json::from_str(raw).unwrap();
        assert_eq!(awards.year, 2023);
        let category = awards.category("c1").unwrap();
        assert_eq!(category.marker_title(), "Monitor");
        assert_eq!(category.options[0].badge.as_deref(), Some("Editor's pick"));
        assert_eq!(category.options[0].votes_count, None);
    }
}
