mod filter;
mod models;
mod seed;
mod sqlite_catalog_store;
mod store;

pub use filter::{CatalogFilter, CatalogItem};
pub use models::{
    new_item_id, news_sources, CommunityPost, Course, Lesson, NewsArticle, NewsSource,
    PodcastEpisode, Resource,
};
pub use seed::seed_demo_catalog;
pub use sqlite_catalog_store::SqliteCatalogStore;
pub use store::CatalogStore;
