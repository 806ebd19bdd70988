use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Timestamp;

/// The two sides of the DealClosed marketplace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// A company posting assignments and courses.
    Business,
    /// A freelance sales agent taking them on.
    Agent,
}

impl AccountRole {
    /// Return the canonical string representation expected by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "business" => Ok(Self::Business),
            "agent" => Ok(Self::Agent),
            _ => Err("unknown account role"),
        }
    }
}

/// Represents a user in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier for the user.
    pub id: Uuid,

    /// Name shown to conversation peers.
    pub display_name: String,

    /// The user's email address.
    pub email: String,

    /// Which side of the marketplace the account belongs to.
    pub role: AccountRole,

    /// Optional avatar location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// When the user was created.
    pub created_at: Timestamp,
}

/// Credentials submitted to the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful authentication: the profile plus a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub expires_at: Timestamp,
}

/// Profile of the currently authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeResponse {
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_user() -> User {
        User {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            display_name: "Acme BV".to_string(),
            email: "sales@acme.example".to_string(),
            role: AccountRole::Business,
            avatar_url: None,
            created_at: Timestamp(Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_account_role_round_trip() {
        for role in [AccountRole::Business, AccountRole::Agent] {
            let parsed: AccountRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("admin".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_account_role_display() {
        assert_eq!(AccountRole::Business.to_string(), "business");
        assert_eq!(AccountRole::Agent.to_string(), "agent");
    }

    #[test]
    fn test_user_serialization() {
        let user = sample_user();

        let serialized = serde_json::to_string(&user).unwrap();
        let deserialized: User = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, user);
        assert!(serialized.contains("\"business\""));
        assert!(!serialized.contains("avatar_url"));
    }

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            user: sample_user(),
            token: "bearer-token".to_string(),
            expires_at: Timestamp(Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap()),
        };

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: LoginResponse = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, response);
        assert_eq!(deserialized.token, "bearer-token");
    }
}
