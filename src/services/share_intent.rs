//! Share-target entry point.
//!
//! Other apps open the dashboard with `?title=..&text=..&url=..`. The
//! parameters pre-fill the add-link form and are stripped from the address
//! once the form closes so a reload does not reopen it.

use reqwest::Url;

use crate::services::categorizer::categorize;
use crate::services::link_metadata::{favicon_url, generate_title};
use crate::types::link::LinkDraft;

/// Query parameters consumed by the share target.
pub const SHARE_PARAMS: [&str; 3] = ["title", "text", "url"];

const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Data shared into the app by another application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareIntent {
    pub title: String,
    pub text: String,
    /// Shared URL; some apps only put it in `text`.
    pub url: String,
}

impl ShareIntent {
    /// Reads the share parameters from a query string (with or without `?`).
    ///
    /// Returns `None` when none of them carries a value.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut base = Url::parse(PLACEHOLDER_BASE).ok()?;
        base.set_query(Some(query.trim_start_matches('?')));

        let mut intent = ShareIntent::default();
        for (key, value) in base.query_pairs() {
            match &*key {
                "title" => intent.title = value.into_owned(),
                "text" => intent.text = value.into_owned(),
                "url" => intent.url = value.into_owned(),
                _ => {}
            }
        }

        if intent.title.is_empty() && intent.text.is_empty() && intent.url.is_empty() {
            return None;
        }
        if intent.url.is_empty() {
            intent.url = intent.text.clone();
        }
        Some(intent)
    }

    /// Builds the pre-filled form for this share.
    pub fn to_draft(&self, known_categories: &[String]) -> LinkDraft {
        let title = if self.title.trim().is_empty() {
            generate_title(&self.url)
        } else {
            self.title.clone()
        };
        LinkDraft {
            url: self.url.clone(),
            title,
            icon: favicon_url(&self.url).unwrap_or_default(),
            category: categorize(&self.url, known_categories),
        }
    }
}

/// Removes the share parameters from `address`, keeping everything else.
///
/// Accepts absolute URLs and root-relative paths. Input that cannot be parsed
/// either way is returned unchanged.
pub fn strip_share_params(address: &str) -> String {
    let (mut url, relative) = match Url::parse(address) {
        Ok(url) => (url, false),
        Err(_) => match Url::parse(PLACEHOLDER_BASE).and_then(|base| base.join(address)) {
            Ok(url) => (url, true),
            Err(_) => return address.to_string(),
        },
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !SHARE_PARAMS.iter().any(|param| param == key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept.iter());
    }

    if !relative {
        return url.to_string();
    }

    let mut out = url.path().to_string();
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
