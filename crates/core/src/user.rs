//! Users of the registry.
//!
//! Presence is not stored; it is derived from `last_active` at read time
//! by [`crate::classifier::presence`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(CoreError::Validation(format!("Unknown presence '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub last_active: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "User name must not be empty"))]
    pub name: String,
    #[validate(email(message = "Email address is malformed"))]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "User name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Email address is malformed"))]
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply(&self, user: &User) -> User {
        User {
            id: user.id,
            name: self.name.clone().unwrap_or_else(|| user.name.clone()),
            email: self.email.clone().unwrap_or_else(|| user.email.clone()),
            role: self.role.unwrap_or(user.role),
            last_active: user.last_active,
        }
    }
}

/// Run `validator` rules and fold the failures into a single
/// [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(errors.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn new_user_requires_wellformed_email() {
        let input = NewUser {
            name: "Иван Петров".into(),
            email: "not-an-email".into(),
            role: Role::Viewer,
        };
        assert_matches!(validate_input(&input), Err(CoreError::Validation(_)));

        let input = NewUser {
            email: "ivan@example.ru".into(),
            ..input
        };
        assert!(validate_input(&input).is_ok());
    }

    #[test]
    fn empty_patch_is_valid_and_changes_nothing() {
        let user = User {
            id: 3,
            name: "Мария".into(),
            email: "maria@example.ru".into(),
            role: Role::Manager,
            last_active: None,
        };
        let patch = UserPatch::default();
        assert!(validate_input(&patch).is_ok());
        assert_eq!(patch.apply(&user), user);
    }
}
