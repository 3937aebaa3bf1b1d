use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use super::models::{User, UserRole};
use crate::membership::Tier;
use anyhow::Result;
use std::collections::HashMap;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's password credentials, or None if the user has none.
    fn get_password_credentials(&self, user_id: usize) -> Option<PasswordCredentials>;

    /// Inserts or replaces the user's password credentials.
    fn set_password_credentials(&self, credentials: PasswordCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns the auth token for the given value, or None if it does not exist.
    fn get_auth_token(&self, token: &AuthTokenValue) -> Option<AuthToken>;

    /// Deletes an auth token. Returns the deleted token, None if it did not exist.
    fn delete_auth_token(&self, token: &AuthTokenValue) -> Option<AuthToken>;

    /// Stamps the token's last_used with the current time.
    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_auth_token(&self, token: AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user with the Free tier and returns its id.
    /// Fails if the email is already registered.
    fn create_user(&self, name: &str, email: &str) -> Result<usize>;

    /// Returns the user with the given id, or None if it does not exist.
    fn get_user(&self, user_id: usize) -> Option<User>;

    /// Returns the user with the given email, or None if it does not exist.
    fn get_user_by_email(&self, email: &str) -> Option<User>;

    /// Updates a user's membership tier. The billing collaborator is the
    /// only expected caller in production.
    fn set_membership_tier(&self, user_id: usize, tier: Tier) -> Result<()>;

    /// Updates a user's role.
    fn set_role(&self, user_id: usize, role: UserRole) -> Result<()>;

    /// Total number of registered users.
    fn count_users(&self) -> Result<usize>;

    /// Number of users per membership tier. Tiers with no users are present
    /// with a zero count.
    fn count_users_by_tier(&self) -> Result<HashMap<Tier, usize>>;
}
