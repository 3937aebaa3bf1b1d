//! Demo catalog seeding for fresh installations, so the site renders with
//! believable content before an admin has loaded anything real.

use super::models::{new_item_id, CommunityPost, Course, NewsArticle, PodcastEpisode, Resource};
use super::store::CatalogStore;
use crate::membership::Tier;
use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;

struct CourseSeed {
    title: &'static str,
    description: &'static str,
    instructor: &'static str,
    duration: &'static str,
    lesson_count: u32,
    tier: Tier,
    category: &'static str,
    difficulty: &'static str,
}

const COURSE_SEEDS: &[CourseSeed] = &[
    CourseSeed {
        title: "Mastering Listing Presentations",
        description:
            "Learn proven strategies to win more listings and impress sellers with confidence.",
        instructor: "Sarah Martinez",
        duration: "3h 20min",
        lesson_count: 12,
        tier: Tier::Bronze,
        category: "sales",
        difficulty: "intermediate",
    },
    CourseSeed {
        title: "Social Media Marketing for Agents",
        description: "Grow your brand and generate leads through strategic social media marketing.",
        instructor: "James Chen",
        duration: "4h 15min",
        lesson_count: 18,
        tier: Tier::Silver,
        category: "marketing",
        difficulty: "beginner",
    },
    CourseSeed {
        title: "Negotiation Masterclass",
        description: "Master the art of negotiation to close more deals at better prices.",
        instructor: "Michael Davis",
        duration: "2h 45min",
        lesson_count: 10,
        tier: Tier::Gold,
        category: "negotiation",
        difficulty: "advanced",
    },
    CourseSeed {
        title: "First-Time Homebuyer Specialist",
        description: "Become the go-to expert for first-time homebuyers in your market.",
        instructor: "Emily Rodriguez",
        duration: "3h 50min",
        lesson_count: 15,
        tier: Tier::Bronze,
        category: "specialization",
        difficulty: "beginner",
    },
    CourseSeed {
        title: "Building a Million Dollar Database",
        description:
            "Learn how to build and nurture a database that generates consistent referrals.",
        instructor: "David Thompson",
        duration: "5h 10min",
        lesson_count: 20,
        tier: Tier::Silver,
        category: "business",
        difficulty: "intermediate",
    },
    CourseSeed {
        title: "Luxury Real Estate Excellence",
        description:
            "Position yourself as the luxury market expert with proven high-end strategies.",
        instructor: "Victoria Sterling",
        duration: "4h 30min",
        lesson_count: 16,
        tier: Tier::Gold,
        category: "specialization",
        difficulty: "advanced",
    },
];

fn seed_courses(store: &dyn CatalogStore) -> Result<()> {
    let now = Utc::now();
    for seed in COURSE_SEEDS {
        store.add_course(&Course {
            id: new_item_id(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            thumbnail: format!(
                "https://via.placeholder.com/400x300?text={}",
                seed.title.replace(' ', "+")
            ),
            instructor: seed.instructor.to_string(),
            duration: seed.duration.to_string(),
            lesson_count: seed.lesson_count,
            tier: seed.tier,
            category: seed.category.to_string(),
            difficulty: seed.difficulty.to_string(),
            created_at: now,
        })?;
    }
    Ok(())
}

fn seed_podcast_episodes(store: &dyn CatalogStore) -> Result<()> {
    let now = Utc::now();
    let seeds = [
        (
            "5 Scripts That Close Every Listing",
            "Learn the exact words top agents use to win seller confidence and secure listings.",
            "42:15",
            1u32,
            now,
        ),
        (
            "From Zero to Hero: My First Year Success",
            "Interview with an agent who closed 38 deals in their first year. Hear their exact strategy.",
            "38:20",
            2,
            now - Duration::days(7),
        ),
        (
            "Market Shift Strategies: Thriving in Any Market",
            "How to adapt your business strategy during market shifts and economic uncertainty.",
            "45:30",
            3,
            now - Duration::days(14),
        ),
    ];
    let episodes: Vec<PodcastEpisode> = seeds
        .into_iter()
        .map(|(title, description, duration, number, published_at)| PodcastEpisode {
            id: new_item_id(),
            title: title.to_string(),
            description: description.to_string(),
            audio_url: format!(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{}.mp3",
                number
            ),
            duration: duration.to_string(),
            season: 1,
            episode: number,
            thumbnail: format!("https://via.placeholder.com/400x400?text=Episode+{}", number),
            published_at,
        })
        .collect();
    store.replace_podcast_episodes(&episodes)
}

fn seed_resources(store: &dyn CatalogStore) -> Result<()> {
    let now = Utc::now();
    let seeds = [
        (
            "Follow up with all new leads within 5 minutes",
            "Speed to lead matters. Studies show contacting leads within 5 minutes increases conversion by 391%.",
            "daily_tip",
            Tier::Free,
            None,
        ),
        (
            "The Complete Open House Playbook",
            "Everything you need to host successful open houses that generate leads and listings.",
            "ebook",
            Tier::Bronze,
            Some("https://via.placeholder.com/300x400?text=Open+House+eBook"),
        ),
        (
            "Buyer Consultation Workbook",
            "Step-by-step workbook to conduct professional buyer consultations that convert.",
            "workbook",
            Tier::Silver,
            Some("https://via.placeholder.com/300x400?text=Buyer+Workbook"),
        ),
    ];
    for (title, description, resource_type, tier_required, thumbnail) in seeds {
        store.add_resource(&Resource {
            id: new_item_id(),
            title: title.to_string(),
            description: description.to_string(),
            resource_type: resource_type.to_string(),
            thumbnail: thumbnail.map(str::to_string),
            download_url: thumbnail.map(|_| "#".to_string()),
            tier_required,
            created_at: now,
        })?;
    }
    Ok(())
}

fn seed_community_posts(store: &dyn CatalogStore) -> Result<()> {
    let now = Utc::now();
    let seeds = [
        (
            "Jennifer Mills",
            "Just closed my first $1M listing!",
            "Thanks to the negotiation course, I just closed my first million-dollar listing. The strategies really work!",
            24u32,
            87u32,
            now,
        ),
        (
            "Mark Stevens",
            "Best CRM for new agents?",
            "I'm looking for recommendations on CRM systems. What's everyone using?",
            15,
            42,
            now - Duration::hours(5),
        ),
    ];
    for (user_name, title, content, replies_count, likes_count, created_at) in seeds {
        store.add_community_post(&CommunityPost {
            id: new_item_id(),
            user_id: new_item_id(),
            user_name: user_name.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            replies_count,
            likes_count,
            created_at,
        })?;
    }
    Ok(())
}

fn seed_news_articles(store: &dyn CatalogStore) -> Result<()> {
    let now = Utc::now();
    let seeds = [
        (
            "Mortgage Rates Drop to Lowest Level in 6 Months",
            "Average 30-year fixed mortgage rates fell to 6.2% this week, providing relief to homebuyers.",
            "HousingWire",
            "Mortgage+Rates",
            now,
        ),
        (
            "NAR Settlement: What Agents Need to Know",
            "Breaking down the recent NAR settlement and how it impacts real estate commission practices.",
            "Inman",
            "NAR+Settlement",
            now - Duration::hours(3),
        ),
        (
            "Housing Inventory Increases for First Time This Year",
            "Active listings are up 12% year-over-year, signaling a shift toward more balanced market conditions.",
            "Realtor Magazine",
            "Housing+Inventory",
            now - Duration::hours(8),
        ),
    ];
    for (title, excerpt, source, thumbnail_text, published_at) in seeds {
        store.add_news_article(&NewsArticle {
            id: new_item_id(),
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            source: source.to_string(),
            url: "#".to_string(),
            thumbnail: Some(format!(
                "https://via.placeholder.com/600x400?text={}",
                thumbnail_text
            )),
            published_at,
        })?;
    }
    Ok(())
}

/// Populates any empty catalog collections with sample data. Collections
/// that already hold rows are left untouched.
pub fn seed_demo_catalog(store: &dyn CatalogStore) -> Result<()> {
    if store.count_courses()? == 0 {
        seed_courses(store)?;
        info!("Seeded sample courses");
    }
    if store.count_podcast_episodes()? == 0 {
        seed_podcast_episodes(store)?;
        info!("Seeded sample podcast episodes");
    }
    if store.get_resources()?.is_empty() {
        seed_resources(store)?;
        info!("Seeded sample resources");
    }
    if store.count_community_posts()? == 0 {
        seed_community_posts(store)?;
        info!("Seeded sample community posts");
    }
    if store.count_news_articles()? == 0 {
        seed_news_articles(store)?;
        info!("Seeded sample news articles");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_catalog_store::SqliteCatalogStore;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seeds_an_empty_catalog_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(temp_dir.path().join("catalog.db")).unwrap();

        seed_demo_catalog(&store).unwrap();
        assert_eq!(store.count_courses().unwrap(), 6);
        assert_eq!(store.count_podcast_episodes().unwrap(), 3);
        assert_eq!(store.get_resources().unwrap().len(), 3);
        assert_eq!(store.count_community_posts().unwrap(), 2);
        assert_eq!(store.count_news_articles().unwrap(), 3);

        // Idempotent on a populated catalog.
        seed_demo_catalog(&store).unwrap();
        assert_eq!(store.count_courses().unwrap(), 6);
    }
}
