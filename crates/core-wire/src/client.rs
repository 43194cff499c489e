use crate::{
    CacheSnapshot, PredictionRequest, PredictionResponse, ResetBranchRequest, ResetBranchResponse,
    WireError,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

/// The prediction backend as the grid sees it. `HttpPredictionClient` is the production
/// implementation; tests substitute scripted fakes.
#[async_trait]
pub trait PredictionService: Send + Sync + 'static {
    /// `POST /api/words`: authoritative words for the given context.
    async fn fetch_words(&self, req: &PredictionRequest) -> Result<PredictionResponse, WireError>;
    /// `POST /api/refresh`: alternative words for the same context.
    async fn refresh_words(&self, req: &PredictionRequest)
    -> Result<PredictionResponse, WireError>;
    /// `POST /api/generate-cache`: best-effort prefetch hint; the body is ignored.
    async fn generate_cache(&self, req: &PredictionRequest) -> Result<(), WireError>;
    async fn cache_snapshot(&self) -> Result<CacheSnapshot, WireError>;
    async fn clear_used(&self) -> Result<(), WireError>;
    async fn reset_branch(&self, req: &ResetBranchRequest)
    -> Result<ResetBranchResponse, WireError>;
    /// `GET /api/health`. Any failure, including transport errors, reads as unreachable.
    async fn check_health(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct HttpPredictionClient {
    http: Client,
    base_url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base(base_url.into()),
        }
    }

    /// Client with an optional per-request timeout. `None` leaves requests unbounded.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, WireError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: normalize_base(base_url.into()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &'static str, body: &B) -> Result<T, WireError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode(path, ensure_success(path, res).await?).await
    }

    async fn post_ignore<B>(&self, path: &'static str, body: Option<&B>) -> Result<(), WireError>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.http.post(self.endpoint(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        ensure_success(path, req.send().await?).await?;
        Ok(())
    }
}

fn normalize_base(raw: String) -> String {
    raw.trim_end_matches('/').to_string()
}

async fn ensure_success(path: &'static str, res: Response) -> Result<Response, WireError> {
    let status = res.status();
    trace!(target: "wire.http", path, status = status.as_u16(), "response_status");
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.text().await.unwrap_or_default();
        debug!(target: "wire.http", path, status = status.as_u16(), body_len = body.len(), "unexpected_status");
        Err(WireError::UnexpectedStatus { status, body })
    }
}

async fn decode<T: DeserializeOwned>(path: &'static str, res: Response) -> Result<T, WireError> {
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| {
        debug!(target: "wire.http", path, body_len = bytes.len(), %err, "decode_failed");
        WireError::Decode(err.to_string())
    })
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn fetch_words(&self, req: &PredictionRequest) -> Result<PredictionResponse, WireError> {
        self.post_json("/api/words", req).await
    }

    async fn refresh_words(
        &self,
        req: &PredictionRequest,
    ) -> Result<PredictionResponse, WireError> {
        self.post_json("/api/refresh", req).await
    }

    async fn generate_cache(&self, req: &PredictionRequest) -> Result<(), WireError> {
        self.post_ignore("/api/generate-cache", Some(req)).await
    }

    async fn cache_snapshot(&self) -> Result<CacheSnapshot, WireError> {
        let path = "/api/cache";
        let res = self.http.get(self.endpoint(path)).send().await?;
        decode(path, ensure_success(path, res).await?).await
    }

    async fn clear_used(&self) -> Result<(), WireError> {
        self.post_ignore::<()>("/api/clear-used", None).await
    }

    async fn reset_branch(
        &self,
        req: &ResetBranchRequest,
    ) -> Result<ResetBranchResponse, WireError> {
        self.post_json("/api/reset-branch", req).await
    }

    async fn check_health(&self) -> bool {
        match self.http.get(self.endpoint("/api/health")).send().await {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                debug!(target: "wire.http", %err, "health_unreachable");
                false
            }
        }
    }
}
