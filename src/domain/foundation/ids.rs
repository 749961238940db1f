//! Identifiers.
//!
//! `UserId` is whatever the identity layer hands us (the hosted auth user id,
//! or a seeded id like `mock-admin` locally), so it stays an opaque string.
//! Rows this service creates get random v4 UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// # Errors
    ///
    /// `EmptyField` when `id` is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// One enrollment in a maintenance plan.
    MembershipId
);

uuid_id!(
    /// Row id of an access code; the code text itself is separately unique.
    AccessCodeId
);

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn generated_ids_differ() {
        assert_ne!(MembershipId::new(), MembershipId::new());
        assert_ne!(AccessCodeId::new(), AccessCodeId::new());
    }

    #[test]
    fn uuid_ids_parse_display_and_serialize_as_strings() {
        let id: MembershipId = SAMPLE.parse().unwrap();
        assert_eq!(id.to_string(), SAMPLE);

        let code_id: AccessCodeId = SAMPLE.parse().unwrap();
        assert_eq!(serde_json::to_string(&code_id).unwrap(), format!("\"{}\"", SAMPLE));

        assert!("not-a-uuid".parse::<MembershipId>().is_err());
    }

    #[test]
    fn user_id_is_opaque_but_not_blank() {
        let id = UserId::new("mock-admin").unwrap();
        assert_eq!(id.as_str(), "mock-admin");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mock-admin\"");

        match UserId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "user_id"),
            other => panic!("expected EmptyField, got {:?}", other),
        }
    }
}
