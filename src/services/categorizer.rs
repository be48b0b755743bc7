// LinkVault categorizer
// Suggests a category for a URL from fixed keyword groups. Pure and total.

use crate::types::link::UNCATEGORIZED;

/// Keyword groups checked in order; the first group with a hit wins.
const KEYWORD_GROUPS: [(&str, &[&str]); 6] = [
    ("Coding", &["github", "gitlab", "stackoverflow", "dev.to", "code"]),
    ("AI Tools", &["gpt", "ai", "openai", "claude", "midjourney"]),
    ("Design", &["dribbble", "behance", "figma", "design", "unsplash"]),
    ("News", &["bbc", "cnn", "nytimes", "news"]),
    ("Social", &["twitter", "x.com", "linkedin", "facebook", "instagram"]),
    ("Travel", &["flight", "hotel", "trip", "booking", "airbnb"]),
];

/// Returns the suggested category for `url`.
///
/// Matching is a case-insensitive substring test over the whole URL. With no
/// match the first known category is returned, or `"Uncategorized"` when the
/// list is empty or starts with a blank label.
pub fn categorize(url: &str, known: &[String]) -> String {
    let lower = url.to_lowercase();
    for (category, keywords) in KEYWORD_GROUPS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return category.to_string();
        }
    }
    known
        .first()
        .filter(|label| !label.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}
