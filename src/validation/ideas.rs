use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{coerce, one_of, Resource};

pub const IDEA_STATUSES: [&str; 3] = ["draft", "published", "archived"];

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug pattern"));

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct IdeaInput {
    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 150, message = "Title must be between 3 and 150 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *SLUG_RE, message = "Slug may only contain lowercase letters, digits and single hyphens"))]
    pub slug: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 60, message = "Category must be at most 60 characters"))]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_text", skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Website must be a valid URL"))]
    pub website_url: Option<String>,

    #[serde(default, deserialize_with = "coerce::lenient_bool", skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,

    #[serde(default, deserialize_with = "coerce::lenient_int", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Upvotes cannot be negative"))]
    pub upvotes: Option<i64>,

    #[serde(default, deserialize_with = "coerce::lenient_int", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Downvotes cannot be negative"))]
    pub downvotes: Option<i64>,
}

impl Resource for IdeaInput {
    const TABLE: &'static str = "ideas";
    const REQUIRED: &'static [&'static str] = &["title"];

    fn apply_defaults(&mut self) {
        if self.slug.is_none() {
            self.slug = self.title.as_deref().map(coerce::slugify).filter(|s| !s.is_empty());
        }
        self.status.get_or_insert_with(|| "draft".to_string());
        self.is_featured.get_or_insert(false);
        self.upvotes.get_or_insert(0);
        self.downvotes.get_or_insert(0);
    }
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    one_of(value, &IDEA_STATUSES, "Status must be draft, published or archived")
}
