//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use adboard::{Advertisement, MediaType, Placement};

/// Builder for `Advertisement` test instances.
pub struct AdBuilder {
    id: String,
    title: String,
    media_url: String,
    media_type: MediaType,
    link: Option<String>,
    position: Placement,
    is_active: bool,
    featured: bool,
    created_at: DateTime<Utc>,
}

impl AdBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: format!("Ad {id}"),
            media_url: "uploads/banner.png".to_string(),
            media_type: MediaType::Image,
            link: Some("https://example.com".to_string()),
            position: Placement::Popup,
            is_active: true,
            featured: false,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn position(mut self, position: Placement) -> Self {
        self.position = position;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn no_link(mut self) -> Self {
        self.link = None;
        self
    }

    pub fn media_url(mut self, url: &str) -> Self {
        self.media_url = url.to_string();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn build(self) -> Advertisement {
        Advertisement {
            id: self.id,
            title: self.title,
            content: String::new(),
            media_url: self.media_url,
            media_type: self.media_type,
            link: self.link,
            position: self.position,
            is_active: self.is_active,
            featured: self.featured,
            clicks: 0,
            impressions: 0,
            created_at: self.created_at,
        }
    }
}
