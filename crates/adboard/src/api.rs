//! REST client for the marketplace API.
//!
//! The delivery engine can run against a remote backend instead of the
//! local store; this client implements the same [`AdProvider`] surface
//! over HTTP. Status codes map to the three user-distinguishable fetch
//! failures (not found, server error, network/offline).

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::{FetchError, TrackingError};
use crate::model::{Advertisement, Job, Placement};
use crate::service::AdProvider;

/// HTTP client over the marketplace REST API.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewBody<'a> {
    user_id: &'a str,
    user_email: &'a str,
}

fn map_transport(e: reqwest::Error) -> FetchError {
    FetchError::Network(e.to_string())
}

fn check_status(response: &reqwest::Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        404 => Err(FetchError::NotFound),
        s => Err(FetchError::Server { status: s }),
    }
}

impl ApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base, client })
    }

    fn ads_url(&self, placement: Placement) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join("advertisements")
            .map_err(|e| FetchError::Network(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("placement", placement.as_str())
            .append_pair("isActive", "true");
        Ok(url)
    }

    fn ad_action_url(&self, ad_id: &str, action: &str) -> Result<Url, FetchError> {
        self.base
            .join(&format!("advertisements/{ad_id}/{action}"))
            .map_err(|e| FetchError::Network(e.to_string()))
    }

    fn job_url(&self, job_id: &str, suffix: &str) -> Result<Url, FetchError> {
        self.base
            .join(&format!("jobs/{job_id}{suffix}"))
            .map_err(|e| FetchError::Network(e.to_string()))
    }

    /// `GET /advertisements?placement=<p>&isActive=true`
    pub async fn fetch_ads(&self, placement: Placement) -> Result<Vec<Advertisement>, FetchError> {
        let url = self.ads_url(placement)?;
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        check_status(&response)?;
        response
            .json::<Vec<Advertisement>>()
            .await
            .map_err(|e| FetchError::Decode {
                message: e.to_string(),
            })
    }

    /// `GET /jobs/{id}`
    pub async fn fetch_job(&self, job_id: &str) -> Result<Job, FetchError> {
        let url = self.job_url(job_id, "")?;
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        check_status(&response)?;
        response.json::<Job>().await.map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })
    }

    async fn post_tracking(&self, url: Url) -> Result<(), TrackingError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| TrackingError::Http(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TrackingError::Http(format!("HTTP {}", status.as_u16())))
        }
    }

    /// `POST /jobs/{id}/view`. The server enforces ledger uniqueness; a
    /// 409 means the view was already counted and is treated as success.
    pub async fn record_view(
        &self,
        job_id: &str,
        user_id: &str,
        user_email: &str,
    ) -> Result<(), TrackingError> {
        let url = self
            .job_url(job_id, "/view")
            .map_err(|e| TrackingError::Http(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .json(&ViewBody {
                user_id,
                user_email,
            })
            .send()
            .await
            .map_err(|e| TrackingError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 409 {
            Ok(())
        } else {
            Err(TrackingError::Http(format!("HTTP {}", status.as_u16())))
        }
    }
}

impl AdProvider for ApiClient {
    async fn fetch_ads(&self, placement: Placement) -> Result<Vec<Advertisement>, FetchError> {
        ApiClient::fetch_ads(self, placement).await
    }

    /// `POST /advertisements/{id}/click`
    async fn track_click(&self, ad_id: &str) -> Result<(), TrackingError> {
        let url = self
            .ad_action_url(ad_id, "click")
            .map_err(|e| TrackingError::Http(e.to_string()))?;
        self.post_tracking(url).await
    }

    /// `POST /advertisements/{id}/impression`
    async fn track_impression(&self, ad_id: &str) -> Result<(), TrackingError> {
        let url = self
            .ad_action_url(ad_id, "impression")
            .map_err(|e| TrackingError::Http(e.to_string()))?;
        self.post_tracking(url).await
    }
}
