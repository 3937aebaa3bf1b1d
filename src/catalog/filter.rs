//! Client-style catalog filtering: a collection is fetched once and
//! narrowed synchronously, with no further queries per filter change.

use super::models::{Course, PodcastEpisode, Resource};
use crate::membership::Tier;

/// What a listing needs to know about an item to filter it.
pub trait CatalogItem {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    /// The exact-match category facet; None when the item kind has none.
    fn category(&self) -> Option<&str>;
    fn tier(&self) -> Tier;
}

impl CatalogItem for Course {
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
    fn tier(&self) -> Tier {
        self.tier
    }
}

impl CatalogItem for Resource {
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        Some(&self.resource_type)
    }
    fn tier(&self) -> Tier {
        self.tier_required
    }
}

impl CatalogItem for PodcastEpisode {
    fn title(&self) -> &str {
        &self.title
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> Option<&str> {
        None
    }
    fn tier(&self) -> Tier {
        // All episodes are free; tier filtering never hides them.
        Tier::Free
    }
}

/// Filters applied in a fixed order: search, then category, then tier.
/// A missing filter (or the literal "all") matches everything.
#[derive(Clone, Debug, Default)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tier: Option<String>,
}

fn is_all(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(v) => v.is_empty() || v == "all",
    }
}

impl CatalogFilter {
    pub fn matches<T: CatalogItem>(&self, item: &T) -> bool {
        if let Some(search) = &self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let in_title = item.title().to_lowercase().contains(&needle);
                let in_description = item.description().to_lowercase().contains(&needle);
                if !in_title && !in_description {
                    return false;
                }
            }
        }
        if !is_all(&self.category) {
            let wanted = self.category.as_deref().unwrap_or_default();
            if item.category() != Some(wanted) {
                return false;
            }
        }
        if !is_all(&self.tier) {
            // Exact-match facet: an unrecognized tier name matches nothing.
            // This is stricter than user tiers, which coerce to free.
            let wanted = self.tier.as_deref().unwrap_or_default();
            match Tier::ALL.iter().find(|tier| tier.as_str() == wanted) {
                Some(tier) => {
                    if item.tier() != *tier {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }

    pub fn apply<T: CatalogItem>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn course(title: &str, description: &str, category: &str, tier: Tier) -> Course {
        Course {
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            description: description.to_string(),
            thumbnail: String::new(),
            instructor: "Coach".to_string(),
            duration: "1h".to_string(),
            lesson_count: 1,
            tier,
            category: category.to_string(),
            difficulty: "beginner".to_string(),
            created_at: Utc::now(),
        }
    }

    fn sample_courses() -> Vec<Course> {
        vec![
            course("Listing Presentations", "Win more listings", "sales", Tier::Bronze),
            course("Social Media Marketing", "Grow your brand", "marketing", Tier::Silver),
            course("Negotiation Masterclass", "Close more deals", "negotiation", Tier::Gold),
            course("Luxury Market Excellence", "High-end listing strategies", "sales", Tier::Gold),
        ]
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let filter = CatalogFilter {
            search: Some("LISTING".to_string()),
            ..Default::default()
        };
        let found = filter.apply(sample_courses());
        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Listing Presentations", "Luxury Market Excellence"]
        );
    }

    #[test]
    fn filters_compose_in_order() {
        let filter = CatalogFilter {
            search: Some("listing".to_string()),
            category: Some("sales".to_string()),
            tier: Some("gold".to_string()),
        };
        let found = filter.apply(sample_courses());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Luxury Market Excellence");
    }

    #[test]
    fn all_and_empty_filters_match_everything() {
        let filter = CatalogFilter {
            search: Some(String::new()),
            category: Some("all".to_string()),
            tier: Some("all".to_string()),
        };
        assert_eq!(filter.apply(sample_courses()).len(), 4);
        assert_eq!(CatalogFilter::default().apply(sample_courses()).len(), 4);
    }

    #[test]
    fn filtering_is_idempotent() {
        let filter = CatalogFilter {
            search: Some("listing".to_string()),
            category: None,
            tier: None,
        };
        let once = filter.apply(sample_courses());
        let twice = filter.apply(once.clone());
        let once_titles: Vec<&str> = once.iter().map(|c| c.title.as_str()).collect();
        let twice_titles: Vec<&str> = twice.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(once_titles, twice_titles);
    }

    #[test]
    fn tier_filter_is_exact_match_not_gating() {
        let filter = CatalogFilter {
            tier: Some("bronze".to_string()),
            ..Default::default()
        };
        let found = filter.apply(sample_courses());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, Tier::Bronze);
    }

    #[test]
    fn unknown_tier_matches_nothing() {
        let filter = CatalogFilter {
            tier: Some("platinum".to_string()),
            ..Default::default()
        };
        assert!(filter.apply(sample_courses()).is_empty());
    }

    #[test]
    fn unknown_category_matches_nothing() {
        let filter = CatalogFilter {
            category: Some("mindfulness".to_string()),
            ..Default::default()
        };
        assert!(filter.apply(sample_courses()).is_empty());
    }
}
