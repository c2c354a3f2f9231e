//! REST client for the homestay booking backend.
//!
//! Each method maps to exactly one endpoint. Records are validated before any
//! write so an invalid form never reaches the network.

pub mod models;

use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::calendar::ReportRange;
use crate::config::ApiConfig;
use models::{
    CancellationPolicy, DashboardStats, Homestay, PricingRule, Rating, RatingReply, Staff,
    ValidationError,
};

const WIRE_DATE: &str = "%Y-%m-%d";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("record has no id")]
    MissingId,
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Which dashboard the client speaks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Owner,
    Admin,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ApiClient {
    http:     Client,
    base_url: String,
    role:     Role,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("staydash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            role:     config.role,
        })
    }

    pub fn role(&self) -> Role { self.role }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let resp   = req.send().await?;
        let status = resp.status();
        let body   = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body).ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            tracing::warn!(status = status.as_u16(), %message, "api call failed");
            return Err(ApiError::Status { status: status.as_u16(), message });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, req: RequestBuilder) -> ApiResult<()> {
        let resp   = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.json::<ErrorBody>().await.ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            return Err(ApiError::Status { status: status.as_u16(), message });
        }
        Ok(())
    }

    // ── Homestays ─────────────────────────────────────────────────────────────

    pub async fn homestays(&self) -> ApiResult<Vec<Homestay>> {
        self.send(self.request(Method::GET, "/homestays")).await
    }

    pub async fn homestay(&self, id: &str) -> ApiResult<Homestay> {
        self.send(self.request(Method::GET, &format!("/homestays/{}", pct(id)))).await
    }

    pub async fn create_homestay(&self, h: &Homestay) -> ApiResult<Homestay> {
        h.validate()?;
        self.send(self.request(Method::POST, "/homestays").json(h)).await
    }

    pub async fn update_homestay(&self, h: &Homestay) -> ApiResult<Homestay> {
        h.validate()?;
        let id = h.id.as_deref().ok_or(ApiError::MissingId)?;
        self.send(self.request(Method::PUT, &format!("/homestays/{}", pct(id))).json(h)).await
    }

    pub async fn delete_homestay(&self, id: &str) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/homestays/{}", pct(id)))).await
    }

    // ── Staff ─────────────────────────────────────────────────────────────────

    pub async fn staff(&self, homestay_id: &str) -> ApiResult<Vec<Staff>> {
        let path = format!("/homestays/{}/staff", pct(homestay_id));
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn create_staff(&self, s: &Staff) -> ApiResult<Staff> {
        s.validate()?;
        let path = format!("/homestays/{}/staff", pct(&s.homestay_id));
        self.send(self.request(Method::POST, &path).json(s)).await
    }

    pub async fn update_staff(&self, s: &Staff) -> ApiResult<Staff> {
        s.validate()?;
        let id   = s.id.as_deref().ok_or(ApiError::MissingId)?;
        let path = format!("/homestays/{}/staff/{}", pct(&s.homestay_id), pct(id));
        self.send(self.request(Method::PUT, &path).json(s)).await
    }

    pub async fn delete_staff(&self, homestay_id: &str, staff_id: &str) -> ApiResult<()> {
        let path = format!("/homestays/{}/staff/{}", pct(homestay_id), pct(staff_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    // ── Pricing ───────────────────────────────────────────────────────────────

    pub async fn pricing(&self, homestay_id: &str) -> ApiResult<Vec<PricingRule>> {
        let path = format!("/homestays/{}/pricing", pct(homestay_id));
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn create_pricing(&self, rule: &PricingRule) -> ApiResult<PricingRule> {
        rule.validate()?;
        let path = format!("/homestays/{}/pricing", pct(&rule.homestay_id));
        self.send(self.request(Method::POST, &path).json(rule)).await
    }

    pub async fn delete_pricing(&self, homestay_id: &str, rule_id: &str) -> ApiResult<()> {
        let path = format!("/homestays/{}/pricing/{}", pct(homestay_id), pct(rule_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    // ── Cancellation policy ───────────────────────────────────────────────────

    pub async fn cancellation_policy(&self, homestay_id: &str) -> ApiResult<CancellationPolicy> {
        let path = format!("/homestays/{}/cancellation-policy", pct(homestay_id));
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn set_cancellation_policy(
        &self, policy: &CancellationPolicy,
    ) -> ApiResult<CancellationPolicy> {
        policy.validate()?;
        let path = format!("/homestays/{}/cancellation-policy", pct(&policy.homestay_id));
        self.send(self.request(Method::PUT, &path).json(policy)).await
    }

    // ── Ratings ───────────────────────────────────────────────────────────────

    /// Ratings with a score outside 1-5 are dropped.
    pub async fn ratings(&self, homestay_id: &str) -> ApiResult<Vec<Rating>> {
        let path = format!("/homestays/{}/ratings", pct(homestay_id));
        let ratings: Vec<Rating> = self.send(self.request(Method::GET, &path)).await?;
        Ok(ratings.into_iter()
            .filter(|r| match r.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(id = %r.id, "skipping rating: {e}");
                    false
                }
            })
            .collect())
    }

    pub async fn reply_to_rating(&self, rating_id: &str, text: &str) -> ApiResult<Rating> {
        let body = RatingReply { reply: text.trim().to_owned() };
        body.validate()?;
        let path = format!("/ratings/{}/reply", pct(rating_id));
        self.send(self.request(Method::POST, &path).json(&body)).await
    }

    // ── Dashboard ─────────────────────────────────────────────────────────────

    pub async fn dashboard_stats(
        &self, range: &ReportRange, homestay_id: Option<&str>,
    ) -> ApiResult<DashboardStats> {
        let path = match self.role {
            Role::Owner => "/dashboard/stats",
            Role::Admin => "/admin/dashboard/stats",
        };
        let mut query = vec![
            ("startDate", range.start.format(WIRE_DATE).to_string()),
            ("endDate",   range.end.format(WIRE_DATE).to_string()),
        ];
        if let Some(id) = homestay_id {
            query.push(("homestayId", id.to_owned()));
        }
        self.send(self.request(Method::GET, path).query(&query)).await
    }
}

/// Minimal percent-encoding for URL path segments.
fn pct(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
