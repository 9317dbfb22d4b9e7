use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{coerce, one_of, Resource};

pub const USER_ROLES: [&str; 3] = ["admin", "editor", "member"];

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username pattern"));

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct UserInput {
    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *USERNAME_RE, message = "Username must be 3-30 letters, digits or underscores"))]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 120, message = "Full name must be at most 120 characters"))]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,

    #[serde(default, deserialize_with = "coerce::lenient_bool", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(default, deserialize_with = "coerce::lenient_bool", skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl Resource for UserInput {
    const TABLE: &'static str = "users";
    const REQUIRED: &'static [&'static str] = &["username", "email"];

    fn apply_defaults(&mut self) {
        self.role.get_or_insert_with(|| "member".to_string());
        self.is_active.get_or_insert(true);
        self.is_verified.get_or_insert(false);
    }
}

fn validate_role(value: &str) -> Result<(), ValidationError> {
    one_of(value, &USER_ROLES, "Role must be admin, editor or member")
}
