pub mod auth;
mod models;
mod sqlite_user_store;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials};
pub use models::{is_valid_email, User, UserRole};
pub use sqlite_user_store::SqliteUserStore;
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
