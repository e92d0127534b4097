//! Domain types shared across the store, delivery and API layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media an advertisement carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Parses a stored column value. Unknown values default to `Image`,
    /// which is what every legacy row contains.
    pub fn parse(s: &str) -> Self {
        match s {
            "video" => MediaType::Video,
            _ => MediaType::Image,
        }
    }
}

/// Named slot determining which ads are eligible for a given surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Hero,
    AfterHero,
    Sidebar,
    Homepage,
    Popup,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Hero => "hero",
            Placement::AfterHero => "after-hero",
            Placement::Sidebar => "sidebar",
            Placement::Homepage => "homepage",
            Placement::Popup => "popup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hero" => Some(Placement::Hero),
            "after-hero" => Some(Placement::AfterHero),
            "sidebar" => Some(Placement::Sidebar),
            "homepage" => Some(Placement::Homepage),
            "popup" => Some(Placement::Popup),
            _ => None,
        }
    }
}

/// An advertisement as stored server-side and delivered to surfaces.
///
/// `clicks` and `impressions` only ever grow; the sole mutation path is the
/// atomic increment in the ad repository. Ads with `is_active == false` are
/// never returned by `list_active` and never rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub media_url: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub position: Placement,
    pub is_active: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub impressions: i64,
    pub created_at: DateTime<Utc>,
}

/// A job posting, as far as this subsystem cares about it: enough to render
/// a job page header and its view total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub views: i64,
}
