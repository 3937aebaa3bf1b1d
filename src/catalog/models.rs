use crate::membership::Tier;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Random identifier for catalog items created on this server.
pub fn new_item_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(22)
        .map(char::from)
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub instructor: String,
    pub duration: String,
    pub lesson_count: u32,
    pub tier: Tier,
    pub category: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub video_url: Option<String>,
    pub order: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub thumbnail: Option<String>,
    pub download_url: Option<String>,
    pub tier_required: Tier,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PodcastEpisode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub duration: String,
    pub season: u32,
    pub episode: u32,
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub source: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// An external publication the news feed links out to. The list is static;
/// articles reference sources by name.
#[derive(Clone, Debug, Serialize)]
pub struct NewsSource {
    pub name: &'static str,
    pub logo: &'static str,
    pub url: &'static str,
}

pub fn news_sources() -> Vec<NewsSource> {
    vec![
        NewsSource {
            name: "HousingWire",
            logo: "https://via.placeholder.com/100x50?text=HousingWire",
            url: "https://www.housingwire.com",
        },
        NewsSource {
            name: "Inman",
            logo: "https://via.placeholder.com/100x50?text=Inman",
            url: "https://www.inman.com",
        },
        NewsSource {
            name: "Mortgage News Daily",
            logo: "https://via.placeholder.com/100x50?text=MND",
            url: "https://www.mortgagenewsdaily.com",
        },
        NewsSource {
            name: "Realtor Magazine",
            logo: "https://via.placeholder.com/100x50?text=Realtor",
            url: "https://www.nar.realtor/magazine",
        },
    ]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommunityPost {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub title: String,
    pub content: String,
    pub replies_count: u32,
    pub likes_count: u32,
    pub created_at: DateTime<Utc>,
}
