use crate::membership::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Member,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Admin => "admin",
        }
    }

    /// Unknown role strings degrade to the unprivileged role.
    pub fn parse_or_member(s: &str) -> UserRole {
        match s {
            "admin" => UserRole::Admin,
            _ => UserRole::Member,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: usize,
    pub name: String,
    pub email: String,
    pub membership_tier: Tier,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

pub fn is_valid_email(email: &str) -> bool {
    // One @, something on both sides, a dot in the domain. Real validation
    // happens when the address is actually used.
    static PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
    regex::Regex::new(PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("coach@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("nodomain@"));
    }

    #[test]
    fn unknown_role_is_member() {
        assert_eq!(UserRole::parse_or_member("superuser"), UserRole::Member);
        assert_eq!(UserRole::parse_or_member("admin"), UserRole::Admin);
    }
}
