//! Attempt-until-success media loading.
//!
//! Resolution is a plain async loop over the candidate list rather than a
//! chain of render-error callbacks: the UI awaits [`resolve`] (or a
//! [`MediaResolver`] when it wants the manual retry budget) and swaps its
//! rendered source on success. Exhaustion must surface an explicit
//! "media unavailable" fallback, never an indefinite spinner.

use std::future::Future;
use std::time::Duration;

use url::Url;

use super::{AspectClass, FitMode};
use crate::error::MediaError;
use crate::model::MediaType;

/// Why a single candidate failed. Internal to the probing loop; callers
/// only ever see [`MediaError`].
#[derive(Debug, Clone)]
pub enum ProbeError {
    /// Transport-level failure (DNS, refused connection, timeout).
    Http(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Body did not decode as the expected media kind.
    Decode(String),
}

/// A candidate that loaded. Images carry their natural pixel dimensions;
/// video probes only confirm reachability.
#[derive(Debug, Clone)]
pub struct ProbeSuccess {
    pub dimensions: Option<(u32, u32)>,
}

/// Checks whether a candidate URL actually serves loadable media.
pub trait Prober: Send + Sync {
    fn probe(
        &self,
        url: &Url,
        media: MediaType,
    ) -> impl Future<Output = Result<ProbeSuccess, ProbeError>> + Send;
}

/// A successfully resolved media source.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub url: Url,
    /// Present for images, `None` for video.
    pub aspect: Option<AspectClass>,
    pub fit: FitMode,
}

/// Tries candidates strictly in list order, returning the first that
/// loads. Exhausting the list yields `AllCandidatesFailed` with the
/// attempt count so the caller can render the fallback exactly once.
pub async fn resolve<P: Prober>(
    prober: &P,
    media: MediaType,
    candidates: &[Url],
) -> Result<Resolved, MediaError> {
    if candidates.is_empty() {
        return Err(MediaError::NoCandidates);
    }

    for url in candidates {
        match prober.probe(url, media).await {
            Ok(success) => {
                let aspect = success
                    .dimensions
                    .map(|(w, h)| AspectClass::classify(w, h));
                let fit = aspect.map(|a| a.fit()).unwrap_or(FitMode::Cover);
                log::debug!("Media resolved: {}", url);
                return Ok(Resolved {
                    url: url.clone(),
                    aspect,
                    fit,
                });
            }
            Err(e) => {
                log::debug!("Media candidate failed ({}): {:?}", url, e);
            }
        }
    }

    Err(MediaError::AllCandidatesFailed {
        attempts: candidates.len(),
    })
}

/// Probes over HTTP with reqwest. Image bodies are decoded far enough to
/// read their natural dimensions; that both validates the bytes and
/// feeds the aspect classifier.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                log::error!("Failed to build media HTTP client: {}", e);
                MediaError::NoCandidates
            })?;
        Ok(Self { client })
    }
}

impl Prober for HttpProber {
    async fn probe(&self, url: &Url, media: MediaType) -> Result<ProbeSuccess, ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        match media {
            MediaType::Image => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ProbeError::Http(e.to_string()))?;
                let decoded = image::load_from_memory(&bytes)
                    .map_err(|e| ProbeError::Decode(e.to_string()))?;
                Ok(ProbeSuccess {
                    dimensions: Some((decoded.width(), decoded.height())),
                })
            }
            MediaType::Video => {
                // A full video download is wasteful; a success status with a
                // plausible content type is enough to commit to the URL.
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                if content_type.is_empty()
                    || content_type.starts_with("video/")
                    || content_type == "application/octet-stream"
                {
                    Ok(ProbeSuccess { dimensions: None })
                } else {
                    Err(ProbeError::Decode(format!(
                        "unexpected content type '{content_type}'"
                    )))
                }
            }
        }
    }
}

/// Resolution with a bounded manual retry budget.
///
/// After all candidates fail, the user may trigger up to `budget` manual
/// retries; once those are spent the fallback is permanent for this
/// resolver (i.e. for the surface's session).
pub struct MediaResolver<P: Prober> {
    prober: P,
    media: MediaType,
    candidates: Vec<Url>,
    budget: u32,
    retries_used: u32,
}

impl<P: Prober> MediaResolver<P> {
    pub fn new(prober: P, media: MediaType, candidates: Vec<Url>, budget: u32) -> Self {
        Self {
            prober,
            media,
            candidates,
            budget,
            retries_used: 0,
        }
    }

    /// Initial load attempt.
    pub async fn load(&self) -> Result<Resolved, MediaError> {
        resolve(&self.prober, self.media, &self.candidates).await
    }

    /// User-triggered retry. Consumes one unit of budget per call;
    /// past the budget every call fails with `RetriesExhausted`.
    pub async fn retry(&mut self) -> Result<Resolved, MediaError> {
        if self.retries_used >= self.budget {
            return Err(MediaError::RetriesExhausted);
        }
        self.retries_used += 1;
        resolve(&self.prober, self.media, &self.candidates).await
    }

    pub fn retries_remaining(&self) -> u32 {
        self.budget.saturating_sub(self.retries_used)
    }
}
