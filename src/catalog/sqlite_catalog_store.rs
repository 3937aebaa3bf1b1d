use super::models::{CommunityPost, Course, Lesson, NewsArticle, PodcastEpisode, Resource};
use super::store::CatalogStore;
use crate::membership::Tier;
use crate::sqlite_persistence::{open_versioned, validate_columns, Table, VersionedSchema};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const COURSE_TABLE_V_0: Table = Table {
    name: "course",
    schema: "CREATE TABLE course (id TEXT PRIMARY KEY, title TEXT NOT NULL, description TEXT NOT NULL, thumbnail TEXT NOT NULL, instructor TEXT NOT NULL, duration TEXT NOT NULL, lesson_count INTEGER NOT NULL, tier TEXT NOT NULL, category TEXT NOT NULL, difficulty TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &["CREATE INDEX course_category_index ON course (category);"],
};
const LESSON_TABLE_V_0: Table = Table {
    name: "lesson",
    schema: "CREATE TABLE lesson (id TEXT PRIMARY KEY, course_id TEXT NOT NULL, title TEXT NOT NULL, description TEXT NOT NULL, duration TEXT NOT NULL, video_url TEXT, position INTEGER NOT NULL, CONSTRAINT course_id FOREIGN KEY (course_id) REFERENCES course (id) ON DELETE CASCADE);",
    indices: &["CREATE INDEX lesson_course_index ON lesson (course_id);"],
};
const RESOURCE_TABLE_V_0: Table = Table {
    name: "resource",
    schema: "CREATE TABLE resource (id TEXT PRIMARY KEY, title TEXT NOT NULL, description TEXT NOT NULL, resource_type TEXT NOT NULL, thumbnail TEXT, download_url TEXT, tier_required TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};
const PODCAST_EPISODE_TABLE_V_0: Table = Table {
    name: "podcast_episode",
    schema: "CREATE TABLE podcast_episode (id TEXT PRIMARY KEY, title TEXT NOT NULL, description TEXT NOT NULL, audio_url TEXT NOT NULL, duration TEXT NOT NULL, season INTEGER NOT NULL, episode INTEGER NOT NULL, thumbnail TEXT NOT NULL, published INTEGER NOT NULL);",
    indices: &["CREATE INDEX podcast_episode_published_index ON podcast_episode (published);"],
};
const COMMUNITY_POST_TABLE_V_0: Table = Table {
    name: "community_post",
    schema: "CREATE TABLE community_post (id TEXT PRIMARY KEY, user_id TEXT NOT NULL, user_name TEXT NOT NULL, title TEXT NOT NULL, content TEXT NOT NULL, replies_count INTEGER NOT NULL DEFAULT 0, likes_count INTEGER NOT NULL DEFAULT 0, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};
const NEWS_ARTICLE_TABLE_V_0: Table = Table {
    name: "news_article",
    schema: "CREATE TABLE news_article (id TEXT PRIMARY KEY, title TEXT NOT NULL, excerpt TEXT NOT NULL, source TEXT NOT NULL, url TEXT NOT NULL, thumbnail TEXT, published INTEGER NOT NULL);",
    indices: &["CREATE INDEX news_article_published_index ON news_article (published);"],
};

fn validate_schema_0(conn: &Connection) -> Result<()> {
    validate_columns(conn, "course", &["id", "title", "tier", "category"])?;
    validate_columns(conn, "lesson", &["id", "course_id", "position"])?;
    validate_columns(conn, "resource", &["id", "resource_type", "tier_required"])?;
    validate_columns(conn, "podcast_episode", &["id", "season", "episode", "published"])?;
    validate_columns(conn, "community_post", &["id", "user_name", "content"])?;
    validate_columns(conn, "news_article", &["id", "title", "source", "published"])
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        COURSE_TABLE_V_0,
        LESSON_TABLE_V_0,
        RESOURCE_TABLE_V_0,
        PODCAST_EPISODE_TABLE_V_0,
        COMMUNITY_POST_TABLE_V_0,
        NEWS_ARTICLE_TABLE_V_0,
    ],
    migration: None,
    validate: validate_schema_0,
}];

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn datetime_from_column_result(value: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(value, 0).unwrap_or_default()
}

fn course_from_row(row: &rusqlite::Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        thumbnail: row.get(3)?,
        instructor: row.get(4)?,
        duration: row.get(5)?,
        lesson_count: row.get(6)?,
        tier: Tier::parse_or_free(&row.get::<usize, String>(7)?),
        category: row.get(8)?,
        difficulty: row.get(9)?,
        created_at: datetime_from_column_result(row.get(10)?),
    })
}

const COURSE_COLUMNS: &str =
    "id, title, description, thumbnail, instructor, duration, lesson_count, tier, category, difficulty, created";

impl SqliteCatalogStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn count_table(&self, table: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM course ORDER BY created DESC",
            COURSE_COLUMNS
        ))?;
        let rows = stmt.query_map([], course_from_row)?;
        Ok(rows.collect::<Result<Vec<Course>, _>>()?)
    }

    fn get_course(&self, course_id: &str) -> Option<Course> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM course WHERE id = ?1", COURSE_COLUMNS))
            .ok()?;
        stmt.query_row(params![course_id], course_from_row).ok()
    }

    fn get_course_lessons(&self, course_id: &str) -> Result<Vec<Lesson>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, course_id, title, description, duration, video_url, position \
             FROM lesson WHERE course_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![course_id], |row| {
            Ok(Lesson {
                id: row.get(0)?,
                course_id: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                duration: row.get(4)?,
                video_url: row.get(5)?,
                order: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<Lesson>, _>>()?)
    }

    fn get_resources(&self) -> Result<Vec<Resource>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, resource_type, thumbnail, download_url, tier_required, created \
             FROM resource ORDER BY created DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Resource {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                resource_type: row.get(3)?,
                thumbnail: row.get(4)?,
                download_url: row.get(5)?,
                tier_required: Tier::parse_or_free(&row.get::<usize, String>(6)?),
                created_at: datetime_from_column_result(row.get(7)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<Resource>, _>>()?)
    }

    fn get_podcast_episodes(&self) -> Result<Vec<PodcastEpisode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, audio_url, duration, season, episode, thumbnail, published \
             FROM podcast_episode ORDER BY published DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PodcastEpisode {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                audio_url: row.get(3)?,
                duration: row.get(4)?,
                season: row.get(5)?,
                episode: row.get(6)?,
                thumbnail: row.get(7)?,
                published_at: datetime_from_column_result(row.get(8)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<PodcastEpisode>, _>>()?)
    }

    fn replace_podcast_episodes(&self, episodes: &[PodcastEpisode]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM podcast_episode", [])?;
        for episode in episodes {
            tx.execute(
                "INSERT INTO podcast_episode (id, title, description, audio_url, duration, season, episode, thumbnail, published) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    episode.id,
                    episode.title,
                    episode.description,
                    episode.audio_url,
                    episode.duration,
                    episode.season,
                    episode.episode,
                    episode.thumbnail,
                    episode.published_at.timestamp(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_community_posts(&self, limit: usize) -> Result<Vec<CommunityPost>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, user_name, title, content, replies_count, likes_count, created \
             FROM community_post ORDER BY created DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(CommunityPost {
                id: row.get(0)?,
                user_id: row.get(1)?,
                user_name: row.get(2)?,
                title: row.get(3)?,
                content: row.get(4)?,
                replies_count: row.get(5)?,
                likes_count: row.get(6)?,
                created_at: datetime_from_column_result(row.get(7)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<CommunityPost>, _>>()?)
    }

    fn get_community_post(&self, post_id: &str) -> Option<CommunityPost> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, user_name, title, content, replies_count, likes_count, created \
                 FROM community_post WHERE id = ?1",
            )
            .ok()?;
        stmt.query_row(params![post_id], |row| {
            Ok(CommunityPost {
                id: row.get(0)?,
                user_id: row.get(1)?,
                user_name: row.get(2)?,
                title: row.get(3)?,
                content: row.get(4)?,
                replies_count: row.get(5)?,
                likes_count: row.get(6)?,
                created_at: datetime_from_column_result(row.get(7)?),
            })
        })
        .ok()
    }

    fn get_news_articles(&self, limit: usize) -> Result<Vec<NewsArticle>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, excerpt, source, url, thumbnail, published \
             FROM news_article ORDER BY published DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(NewsArticle {
                id: row.get(0)?,
                title: row.get(1)?,
                excerpt: row.get(2)?,
                source: row.get(3)?,
                url: row.get(4)?,
                thumbnail: row.get(5)?,
                published_at: datetime_from_column_result(row.get(6)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<NewsArticle>, _>>()?)
    }

    fn add_course(&self, course: &Course) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO course (id, title, description, thumbnail, instructor, duration, lesson_count, tier, category, difficulty, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                course.id,
                course.title,
                course.description,
                course.thumbnail,
                course.instructor,
                course.duration,
                course.lesson_count,
                course.tier.as_str(),
                course.category,
                course.difficulty,
                course.created_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn add_lesson(&self, lesson: &Lesson) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO lesson (id, course_id, title, description, duration, video_url, position) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                lesson.id,
                lesson.course_id,
                lesson.title,
                lesson.description,
                lesson.duration,
                lesson.video_url,
                lesson.order,
            ],
        )?;
        Ok(())
    }

    fn add_resource(&self, resource: &Resource) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resource (id, title, description, resource_type, thumbnail, download_url, tier_required, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                resource.id,
                resource.title,
                resource.description,
                resource.resource_type,
                resource.thumbnail,
                resource.download_url,
                resource.tier_required.as_str(),
                resource.created_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn add_community_post(&self, post: &CommunityPost) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO community_post (id, user_id, user_name, title, content, replies_count, likes_count, created) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.id,
                post.user_id,
                post.user_name,
                post.title,
                post.content,
                post.replies_count,
                post.likes_count,
                post.created_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn add_news_article(&self, article: &NewsArticle) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO news_article (id, title, excerpt, source, url, thumbnail, published) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                article.id,
                article.title,
                article.excerpt,
                article.source,
                article.url,
                article.thumbnail,
                article.published_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    fn count_courses(&self) -> Result<usize> {
        self.count_table("course")
    }

    fn count_podcast_episodes(&self) -> Result<usize> {
        self.count_table("podcast_episode")
    }

    fn count_community_posts(&self) -> Result<usize> {
        self.count_table("community_post")
    }

    fn count_news_articles(&self) -> Result<usize> {
        self.count_table("news_article")
    }
}

#[cfg(test)]
mod tests {
    use super::super::models::new_item_id;
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteCatalogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(temp_dir.path().join("catalog.db")).unwrap();
        (store, temp_dir)
    }

    fn course(title: &str, tier: Tier) -> Course {
        Course {
            id: new_item_id(),
            title: title.to_string(),
            description: "About the course".to_string(),
            thumbnail: String::new(),
            instructor: "Coach".to_string(),
            duration: "2h".to_string(),
            lesson_count: 3,
            tier,
            category: "sales".to_string(),
            difficulty: "beginner".to_string(),
            created_at: Utc::now(),
        }
    }

    fn episode(season: u32, number: u32, published_at: DateTime<Utc>) -> PodcastEpisode {
        PodcastEpisode {
            id: new_item_id(),
            title: format!("S{}E{}", season, number),
            description: String::new(),
            audio_url: "https://example.com/audio.mp3".to_string(),
            duration: "40:00".to_string(),
            season,
            episode: number,
            thumbnail: String::new(),
            published_at,
        }
    }

    #[test]
    fn course_round_trip() {
        let (store, _temp_dir) = create_tmp_store();
        let added = course("Listing Presentations", Tier::Bronze);
        store.add_course(&added).unwrap();

        let loaded = store.get_course(&added.id).unwrap();
        assert_eq!(loaded.title, "Listing Presentations");
        assert_eq!(loaded.tier, Tier::Bronze);
        assert!(store.get_course("missing").is_none());
        assert_eq!(store.count_courses().unwrap(), 1);
    }

    #[test]
    fn lessons_come_back_in_position_order() {
        let (store, _temp_dir) = create_tmp_store();
        let parent = course("Course", Tier::Free);
        store.add_course(&parent).unwrap();

        for order in [3u32, 1, 2] {
            store
                .add_lesson(&Lesson {
                    id: new_item_id(),
                    course_id: parent.id.clone(),
                    title: format!("Lesson {}", order),
                    description: String::new(),
                    duration: "10min".to_string(),
                    video_url: None,
                    order,
                })
                .unwrap();
        }

        let lessons = store.get_course_lessons(&parent.id).unwrap();
        let orders: Vec<u32> = lessons.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn episodes_are_newest_first_and_replaceable() {
        let (store, _temp_dir) = create_tmp_store();
        let now = Utc::now();
        store
            .replace_podcast_episodes(&[
                episode(1, 1, now - Duration::days(14)),
                episode(1, 2, now - Duration::days(7)),
                episode(1, 3, now),
            ])
            .unwrap();

        let episodes = store.get_podcast_episodes().unwrap();
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["S1E3", "S1E2", "S1E1"]);

        // Bulk update replaces the list wholesale.
        store
            .replace_podcast_episodes(&[episode(2, 1, now)])
            .unwrap();
        assert_eq!(store.count_podcast_episodes().unwrap(), 1);
    }

    #[test]
    fn community_posts_respect_the_limit() {
        let (store, _temp_dir) = create_tmp_store();
        let now = Utc::now();
        for i in 0..5 {
            store
                .add_community_post(&CommunityPost {
                    id: new_item_id(),
                    user_id: new_item_id(),
                    user_name: "Poster".to_string(),
                    title: format!("Post {}", i),
                    content: String::new(),
                    replies_count: 0,
                    likes_count: 0,
                    created_at: now - Duration::hours(i),
                })
                .unwrap();
        }

        let posts = store.get_community_posts(3).unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].title, "Post 0");
        assert_eq!(store.count_community_posts().unwrap(), 5);

        let single = store.get_community_post(&posts[1].id).unwrap();
        assert_eq!(single.title, posts[1].title);
        assert!(store.get_community_post("missing").is_none());
    }

    #[test]
    fn news_articles_are_newest_first_and_capped() {
        let (store, _temp_dir) = create_tmp_store();
        let now = Utc::now();
        for i in 0..3i64 {
            store
                .add_news_article(&NewsArticle {
                    id: new_item_id(),
                    title: format!("Article {}", i),
                    excerpt: String::new(),
                    source: "HousingWire".to_string(),
                    url: "#".to_string(),
                    thumbnail: None,
                    published_at: now - Duration::hours(i),
                })
                .unwrap();
        }

        let articles = store.get_news_articles(2).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Article 0");
        assert_eq!(store.count_news_articles().unwrap(), 3);
    }
}
