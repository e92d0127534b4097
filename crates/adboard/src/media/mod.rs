//! Media URL resolution.
//!
//! Stored media references are messy: some rows hold absolute URLs, some
//! hold bare relative paths from one of several historical upload layouts.
//! Given a reference, this module produces an ordered list of candidate
//! URLs and drives try-until-success probing ([`resolver`]).

use url::Url;

use crate::config::DeliveryConfig;

pub mod resolver;

pub use resolver::{HttpProber, MediaResolver, Prober, ProbeError, ProbeSuccess, Resolved};

/// Base origin media URLs are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    base: Url,
}

impl Origin {
    /// Derives the API origin from the current page host: local
    /// development pages talk to `http://localhost:<port>`, deployed
    /// pages to the page's own host over https.
    pub fn detect(page_host: &str, config: &DeliveryConfig) -> Origin {
        let host_only = page_host.split(':').next().unwrap_or(page_host);
        let base = if host_only == "localhost" || host_only == "127.0.0.1" {
            format!("http://localhost:{}/", config.local_api_port)
        } else {
            format!("https://{}/", page_host)
        };
        // Both branches are well-formed for any non-empty host; fall back
        // to localhost if the page host is unparseable.
        let base = Url::parse(&base).unwrap_or_else(|_| {
            Url::parse(&format!("http://localhost:{}/", config.local_api_port)).unwrap()
        });
        Origin { base }
    }

    /// Uses an explicit base URL (e.g. from config).
    pub fn from_base(base: Url) -> Origin {
        Origin { base }
    }

    fn join(&self, path: &str) -> Option<Url> {
        self.base.join(path).ok()
    }
}

/// Returns `true` when the stored reference is already a full URL and
/// should be used as the sole candidate.
fn is_absolute(stored: &str) -> bool {
    match Url::parse(stored) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "data"),
        Err(_) => false,
    }
}

/// Generates the prioritized candidate list for a stored media reference.
///
/// Relative references expand to a fixed set of variants: the raw path,
/// the path under the upload root, and the bare filename under the ad
/// media subfolder. Duplicates collapse, order is preserved.
pub fn candidate_urls(stored: &str, origin: &Origin, config: &DeliveryConfig) -> Vec<Url> {
    if stored.trim().is_empty() {
        return Vec::new();
    }

    if is_absolute(stored) {
        return Url::parse(stored).into_iter().collect();
    }

    let trimmed = stored.trim_start_matches('/');
    let mut variants = vec![trimmed.to_string()];

    if !trimmed.starts_with(&format!("{}/", config.upload_root)) {
        variants.push(format!("{}/{}", config.upload_root, trimmed));
    }

    if let Some(filename) = trimmed.rsplit('/').next() {
        variants.push(format!(
            "{}/{}/{}",
            config.upload_root, config.media_subfolder, filename
        ));
    }

    let mut out: Vec<Url> = Vec::new();
    for variant in variants {
        if let Some(url) = origin.join(&variant) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}

/// Aspect-ratio class of a loaded image, driving container fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectClass {
    Landscape,
    Portrait,
    Square,
}

impl AspectClass {
    /// width/height > 1.5 is landscape, < 0.75 portrait, else square.
    pub fn classify(width: u32, height: u32) -> AspectClass {
        if height == 0 {
            return AspectClass::Square;
        }
        let ratio = width as f64 / height as f64;
        if ratio > 1.5 {
            AspectClass::Landscape
        } else if ratio < 0.75 {
            AspectClass::Portrait
        } else {
            AspectClass::Square
        }
    }

    /// Portrait media is letterboxed to avoid cropping subjects; other
    /// shapes fill the container.
    pub fn fit(&self) -> FitMode {
        match self {
            AspectClass::Portrait => FitMode::Contain,
            _ => FitMode::Cover,
        }
    }
}

/// How the rendered container should fit the media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    Cover,
    Contain,
}
