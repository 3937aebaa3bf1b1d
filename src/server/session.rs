use super::error::ApiError;
use super::state::ServerState;
use crate::user::{AuthTokenValue, User, UserRole, UserStore};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar};

/// An authenticated request. The token is opaque; identity comes from
/// looking it up in the user store on every request.
#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
}

/// An authenticated request whose user holds the Admin role. Extracting
/// this is the authorization check for every admin route; whatever a
/// client believes about its own admin status is irrelevant here.
#[derive(Debug)]
pub struct AdminSession {
    pub user: User,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

async fn extract_session_token_from_cookies(parts: &mut Parts, ctx: &ServerState) -> Option<String> {
    CookieJar::from_request_parts(parts, ctx)
        .await
        .ok()?
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &mut Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<Session> {
    let token = match extract_session_token_from_headers(parts) {
        Some(token) => token,
        None => extract_session_token_from_cookies(parts, ctx).await?,
    };

    let auth_token = ctx.user_store.get_auth_token(&AuthTokenValue(token))?;
    let _ = ctx.user_store.touch_auth_token(&auth_token.value);
    Some(Session {
        user_id: auth_token.user_id,
        token: auth_token.value.0,
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await
            .ok_or(ApiError::Unauthorized)
    }
}

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        let user = ctx
            .user_store
            .get_user(session.user_id)
            .ok_or(ApiError::Unauthorized)?;
        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminSession {
            user,
            token: session.token,
        })
    }
}
