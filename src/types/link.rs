use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label assigned to links whose category was deleted or never chosen.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Categories every user starts with, in display order.
pub const DEFAULT_CATEGORIES: [&str; 6] = ["Coding", "Design", "News", "Social", "AI Tools", "Travel"];

/// A category is a free-text label, not a stored entity.
pub type Category = String;

/// Returns the default category set as owned labels.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// A saved link as stored by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user_id")]
    pub owner_id: String,
}

/// Fields supplied when creating a link. The store assigns id, timestamp and owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLink {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub category: Category,
}

/// Replace-style update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl LinkPatch {
    /// Patch that only moves a link to another category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.title.is_none() && self.icon.is_none() && self.category.is_none()
    }
}

/// Links and the derived category set as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSnapshot {
    pub links: Vec<Link>,
    pub categories: Vec<Category>,
}

/// Unvalidated form input for a new or edited link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkDraft {
    pub url: String,
    pub title: String,
    pub icon: String,
    pub category: String,
}
