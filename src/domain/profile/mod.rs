//! Customer profile.
//!
//! The profile is the root record for a user. Memberships and access codes
//! reference it by `user_id`. Profiles are upserted (last write wins) and
//! never hard-deleted.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, UserId};

/// Authorization role stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub marketing_opt_in: bool,
    pub created_at: Timestamp,
}

impl Profile {
    /// New plain-user profile created now.
    pub fn new(user_id: UserId, email: Option<String>) -> Self {
        Self {
            user_id,
            email,
            role: Role::User,
            marketing_opt_in: false,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_marketing_opt_in(mut self, opt_in: bool) -> Self {
        self.marketing_opt_in = opt_in;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_plain_user() {
        let profile = Profile::new(UserId::new("u1").unwrap(), None);
        assert_eq!(profile.role, Role::User);
        assert!(!profile.is_admin());
        assert!(!profile.marketing_opt_in);
    }

    #[test]
    fn missing_role_deserializes_as_user() {
        let json = r#"{"user_id":"u1","email":null,"created_at":"2024-01-01T00:00:00Z"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn admin_role_is_detected() {
        let profile = Profile::new(UserId::new("a").unwrap(), None).with_role(Role::Admin);
        assert!(profile.is_admin());
    }
}
