// LinkVault link view helpers
// Form validation plus the search filter and category grouping used by the dashboard.

use crate::types::errors::ValidationError;
use crate::types::link::{Category, Link, LinkDraft, NewLink, UNCATEGORIZED};

impl LinkDraft {
    /// Trims the form fields and converts them into a create request.
    pub fn validate(&self) -> Result<NewLink, ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingUrl);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let icon = self.icon.trim();
        let category = self.category.trim();

        Ok(NewLink {
            url: url.to_string(),
            title: title.to_string(),
            icon: (!icon.is_empty()).then(|| icon.to_string()),
            category: if category.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                category.to_string()
            },
        })
    }

    /// Pre-fills the form for editing an existing link.
    pub fn from_link(link: &Link) -> Self {
        Self {
            url: link.url.clone(),
            title: link.title.clone(),
            icon: link.icon.clone().unwrap_or_default(),
            category: link.category.clone(),
        }
    }
}

/// Links whose title or URL contains `query`, ignoring case.
pub fn filter_links<'a>(links: &'a [Link], query: &str) -> Vec<&'a Link> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return links.iter().collect();
    }
    links
        .iter()
        .filter(|link| {
            link.title.to_lowercase().contains(&needle) || link.url.to_lowercase().contains(&needle)
        })
        .collect()
}

/// A category heading with the links shown under it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: Category,
    pub links: Vec<&'a Link>,
}

/// Groups `links` under `categories` in order, skipping empty groups.
///
/// Links with a label outside `categories` land in the Uncategorized group.
pub fn group_by_category<'a>(links: &[&'a Link], categories: &[Category]) -> Vec<CategoryGroup<'a>> {
    let mut groups: Vec<CategoryGroup<'a>> = categories
        .iter()
        .map(|category| CategoryGroup {
            category: category.clone(),
            links: links.iter().copied().filter(|l| &l.category == category).collect(),
        })
        .filter(|group| !group.links.is_empty())
        .collect();

    let orphans: Vec<&'a Link> = links
        .iter()
        .copied()
        .filter(|l| !categories.contains(&l.category))
        .collect();
    if !orphans.is_empty() {
        match groups.iter_mut().find(|g| g.category == UNCATEGORIZED) {
            Some(group) => group.links.extend(orphans),
            None => groups.push(CategoryGroup {
                category: UNCATEGORIZED.to_string(),
                links: orphans,
            }),
        }
    }
    groups
}
