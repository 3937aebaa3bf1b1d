use anyhow::Result;
use std::time::{Duration, SystemTime};

use crate::catalog::{news_sources, CatalogFilter, CatalogStore, PodcastEpisode};
use crate::content::{ContentStore, SectionData};
use crate::server_store::ServerStore;
use crate::membership::{tier_plans, Tier};
use crate::user::{is_valid_email, AuthToken, AuthTokenValue, PasswordCredentials, UserStore};

use axum_extra::extract::cookie::{Cookie, SameSite};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use super::error::ApiError;
use super::session::{AdminSession, Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::ServerState;
use super::upload::upload_file;

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Response {
    Json(json!({
        "uptime": format_uptime(state.start_time.elapsed()),
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

fn issue_token(store: &dyn UserStore, user_id: usize) -> Result<String> {
    let value = AuthTokenValue::generate();
    store.add_auth_token(AuthToken {
        user_id,
        created: SystemTime::now(),
        last_used: None,
        value: value.clone(),
    })?;
    Ok(value.0)
}

fn session_cookie(token: &str) -> String {
    Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

#[derive(Deserialize)]
struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

async fn register(
    State(state): State<ServerState>,
    Json(body): Json<RegisterBody>,
) -> Result<Response, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if !is_valid_email(&body.email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if state.user_store.get_user_by_email(&body.email).is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let user_id = state.user_store.create_user(name, &body.email)?;
    state
        .user_store
        .set_password_credentials(PasswordCredentials::new(user_id, &body.password)?)?;
    let token = issue_token(state.user_store.as_ref(), user_id)?;
    let user = state
        .user_store
        .get_user(user_id)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("User {} vanished", user_id)))?;

    info!("Registered user {} ({})", user_id, user.email);
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(json!({ "token": token, "user": user })),
    )
        .into_response())
}

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

async fn login(
    State(state): State<ServerState>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let user = state
        .user_store
        .get_user_by_email(&body.email)
        .ok_or(ApiError::InvalidCredentials)?;
    let credentials = state
        .user_store
        .get_password_credentials(user.id)
        .ok_or(ApiError::InvalidCredentials)?;
    if !credentials.verify(&body.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(state.user_store.as_ref(), user.id)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(json!({ "token": token, "user": user })),
    )
        .into_response())
}

async fn me(session: Session, State(state): State<ServerState>) -> Result<Response, ApiError> {
    let user = state
        .user_store
        .get_user(session.user_id)
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user).into_response())
}

async fn logout(session: Session, State(state): State<ServerState>) -> Response {
    if state
        .user_store
        .delete_auth_token(&AuthTokenValue(session.token))
        .is_none()
    {
        // The token passed extraction moments ago, so it vanished in
        // between (concurrent logout or store failure). Nothing for the
        // client to do, but worth a trace.
        warn!("Logout for user {} found no token to delete", session.user_id);
    }

    // Expire it in the past
    let expired = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();

    (
        AppendHeaders([(header::SET_COOKIE, expired.to_string())]),
        Json(json!({ "success": true })),
    )
        .into_response()
}

#[derive(Deserialize, Default)]
struct CourseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tier: Option<String>,
}

async fn list_courses(
    State(state): State<ServerState>,
    Query(query): Query<CourseQuery>,
) -> Result<Response, ApiError> {
    let filter = CatalogFilter {
        search: query.search,
        category: query.category,
        tier: query.tier,
    };
    let courses = filter.apply(state.catalog_store.get_courses()?);
    Ok(Json(courses).into_response())
}

async fn get_course(
    State(state): State<ServerState>,
    Path(course_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.catalog_store.get_course(&course_id) {
        Some(course) => Ok(Json(course).into_response()),
        None => Err(ApiError::NotFound("Course not found".to_string())),
    }
}

async fn get_course_lessons(
    session: Session,
    State(state): State<ServerState>,
    Path(course_id): Path<String>,
) -> Result<Response, ApiError> {
    let user = state
        .user_store
        .get_user(session.user_id)
        .ok_or(ApiError::Unauthorized)?;
    let course = state
        .catalog_store
        .get_course(&course_id)
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if !user.membership_tier.can_access(course.tier) {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": format!("This course requires a {} membership", course.tier),
                "required_tier": course.tier,
            })),
        )
            .into_response());
    }

    let lessons = state.catalog_store.get_course_lessons(&course_id)?;
    Ok(Json(lessons).into_response())
}

#[derive(Deserialize, Default)]
struct ResourceQuery {
    pub search: Option<String>,
    pub resource_type: Option<String>,
    pub tier: Option<String>,
}

async fn list_resources(
    State(state): State<ServerState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Response, ApiError> {
    let filter = CatalogFilter {
        search: query.search,
        category: query.resource_type,
        tier: query.tier,
    };
    let resources = filter.apply(state.catalog_store.get_resources()?);
    Ok(Json(resources).into_response())
}

#[derive(Deserialize, Default)]
struct PodcastQuery {
    pub search: Option<String>,
    pub season: Option<u32>,
}

async fn list_podcast_episodes(
    State(state): State<ServerState>,
    Query(query): Query<PodcastQuery>,
) -> Result<Response, ApiError> {
    let filter = CatalogFilter {
        search: query.search,
        ..Default::default()
    };
    let mut episodes = filter.apply(state.catalog_store.get_podcast_episodes()?);
    if let Some(season) = query.season {
        episodes.retain(|episode| episode.season == season);
    }
    Ok(Json(episodes).into_response())
}

const COMMUNITY_POSTS_LIMIT: usize = 50;
const NEWS_ARTICLES_LIMIT: usize = 50;

async fn list_community_posts(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let posts = state
        .catalog_store
        .get_community_posts(COMMUNITY_POSTS_LIMIT)?;
    Ok(Json(posts).into_response())
}

async fn get_community_post(
    State(state): State<ServerState>,
    Path(post_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.catalog_store.get_community_post(&post_id) {
        Some(post) => Ok(Json(post).into_response()),
        None => Err(ApiError::NotFound("Post not found".to_string())),
    }
}

async fn list_news_articles(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let articles = state.catalog_store.get_news_articles(NEWS_ARTICLES_LIMIT)?;
    Ok(Json(articles).into_response())
}

async fn list_news_sources() -> Response {
    Json(news_sources()).into_response()
}

async fn list_membership_tiers() -> Response {
    Json(tier_plans()).into_response()
}

async fn get_content_section(
    State(state): State<ServerState>,
    Path(section): Path<String>,
) -> Response {
    let data = state.content_repository().read_section(&section);
    Json(json!({ "data": data })).into_response()
}

async fn admin_get_content_section(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Path(section): Path<String>,
) -> Response {
    let data = state.content_repository().read_section(&section);
    Json(json!({ "section": section, "data": data })).into_response()
}

async fn admin_write_content_section(
    admin: AdminSession,
    State(state): State<ServerState>,
    Path(section): Path<String>,
    Json(data): Json<SectionData>,
) -> Result<Response, ApiError> {
    state.content_store.write_section(&section, &data)?;
    info!(
        "Admin {} wrote content section {} ({} fields)",
        admin.user.id,
        section,
        data.len()
    );
    Ok(Json(json!({ "success": true })).into_response())
}

async fn admin_list_podcast(
    _admin: AdminSession,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let episodes = state.catalog_store.get_podcast_episodes()?;
    Ok(Json(episodes).into_response())
}

async fn admin_update_podcast(
    admin: AdminSession,
    State(state): State<ServerState>,
    Json(episodes): Json<Vec<PodcastEpisode>>,
) -> Result<Response, ApiError> {
    state.catalog_store.replace_podcast_episodes(&episodes)?;
    info!(
        "Admin {} replaced the podcast list with {} episodes",
        admin.user.id,
        episodes.len()
    );
    Ok(Json(json!({ "success": true, "count": episodes.len() })).into_response())
}

async fn admin_list_files(
    _admin: AdminSession,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let files = state.server_store.get_uploaded_files()?;
    Ok(Json(files).into_response())
}

async fn admin_list_contact_messages(
    _admin: AdminSession,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let messages = state.server_store.get_contact_messages()?;
    Ok(Json(messages).into_response())
}

async fn admin_content_analytics(
    _admin: AdminSession,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let by_tier = state.user_store.count_users_by_tier()?;
    let mut membership_breakdown = serde_json::Map::new();
    for tier in Tier::ALL {
        let count = by_tier.get(&tier).copied().unwrap_or(0);
        membership_breakdown.insert(tier.as_str().to_string(), count.into());
    }

    Ok(Json(json!({
        "total_users": state.user_store.count_users()?,
        "total_courses": state.catalog_store.count_courses()?,
        "total_podcast_episodes": state.catalog_store.count_podcast_episodes()?,
        "total_community_posts": state.catalog_store.count_community_posts()?,
        "membership_breakdown": membership_breakdown,
    }))
    .into_response())
}

#[derive(Deserialize)]
struct ContactBody {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

async fn post_contact(
    State(state): State<ServerState>,
    Json(body): Json<ContactBody>,
) -> Result<Response, ApiError> {
    if !is_valid_email(&body.email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }
    state
        .server_store
        .add_contact_message(&body.name, &body.email, &body.subject, &body.message)?;
    Ok(Json(json!({ "success": true })).into_response())
}

pub fn make_app(state: ServerState) -> Router {
    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state.clone());

    let public_routes: Router = Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/lessons", get(get_course_lessons))
        .route("/resources", get(list_resources))
        .route("/podcast/episodes", get(list_podcast_episodes))
        .route("/community/posts", get(list_community_posts))
        .route("/community/posts/{id}", get(get_community_post))
        .route("/news/articles", get(list_news_articles))
        .route("/news/sources", get(list_news_sources))
        .route("/membership/tiers", get(list_membership_tiers))
        .route("/content/{section}", get(get_content_section))
        .route("/contact", post(post_contact))
        .with_state(state.clone());

    let admin_routes: Router = Router::new()
        .route(
            "/content/{section}",
            get(admin_get_content_section).post(admin_write_content_section),
        )
        .route("/podcast/list", get(admin_list_podcast))
        .route("/podcast/update", post(admin_update_podcast))
        .route("/upload", post(upload_file))
        .route("/files", get(admin_list_files))
        .route("/contact/messages", get(admin_list_contact_messages))
        .route("/analytics/content", get(admin_content_analytics))
        .with_state(state.clone());

    let api: Router = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .merge(public_routes);

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
}

pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
