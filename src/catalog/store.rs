use super::models::{CommunityPost, Course, Lesson, NewsArticle, PodcastEpisode, Resource};
use anyhow::Result;

/// Read access to the catalog plus the two mutation surfaces that exist:
/// inserts used by seeding, and the admin's whole-list podcast replacement.
/// Courses, lessons, resources and posts are otherwise immutable from this
/// layer's point of view.
pub trait CatalogStore: Send + Sync {
    fn get_courses(&self) -> Result<Vec<Course>>;
    fn get_course(&self, course_id: &str) -> Option<Course>;
    /// Lessons for a course, ordered by their position.
    fn get_course_lessons(&self, course_id: &str) -> Result<Vec<Lesson>>;

    fn get_resources(&self) -> Result<Vec<Resource>>;

    /// Episodes, newest first.
    fn get_podcast_episodes(&self) -> Result<Vec<PodcastEpisode>>;
    /// Replaces the full episode list. This is the admin bulk-update
    /// surface: the incoming list becomes the catalog, wholesale.
    fn replace_podcast_episodes(&self, episodes: &[PodcastEpisode]) -> Result<()>;

    /// Latest posts, newest first, capped at `limit`.
    fn get_community_posts(&self, limit: usize) -> Result<Vec<CommunityPost>>;
    fn get_community_post(&self, post_id: &str) -> Option<CommunityPost>;

    /// Latest articles, newest first, capped at `limit`.
    fn get_news_articles(&self, limit: usize) -> Result<Vec<NewsArticle>>;

    fn add_course(&self, course: &Course) -> Result<()>;
    fn add_lesson(&self, lesson: &Lesson) -> Result<()>;
    fn add_resource(&self, resource: &Resource) -> Result<()>;
    fn add_community_post(&self, post: &CommunityPost) -> Result<()>;
    fn add_news_article(&self, article: &NewsArticle) -> Result<()>;

    fn count_courses(&self) -> Result<usize>;
    fn count_podcast_episodes(&self) -> Result<usize>;
    fn count_community_posts(&self) -> Result<usize>;
    fn count_news_articles(&self) -> Result<usize>;
}
