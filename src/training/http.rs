//! HTTP client for the training service
//!
//! Talks to `POST {base}/train` and `GET {base}/history`. Only compiled in
//! with the `remote-training` feature; without it every call fails with a
//! clear external-service error.

use super::service::TrainingService;
use super::types::{TrainingRequest, TrainingResponse};
use crate::config::EngineConfig;
use crate::error::{NetArchError, Result};

const SERVICE_NAME: &str = "training service";

/// Blocking HTTP training client
#[derive(Debug, Clone)]
pub struct HttpTrainingService {
    base_url: String,
    #[cfg_attr(not(feature = "remote-training"), allow(dead_code))]
    timeout_ms: u64,
}

impl HttpTrainingService {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.service_url.clone(), config.timeout_ms)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn external(message: impl Into<String>) -> NetArchError {
        NetArchError::ExternalService {
            service: SERVICE_NAME.to_string(),
            message: message.into(),
        }
    }

    #[cfg(feature = "remote-training")]
    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| Self::external(e.to_string()))
    }

    #[cfg(feature = "remote-training")]
    fn map_send_error(&self, e: reqwest::Error) -> NetArchError {
        if e.is_timeout() {
            Self::external(format!("timed out after {} ms", self.timeout_ms))
        } else if e.is_connect() {
            Self::external(format!("cannot connect to {}: {}", self.base_url, e))
        } else {
            Self::external(e.to_string())
        }
    }

    #[cfg(feature = "remote-training")]
    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(Self::external(format!("returned {}: {}", status, body)))
    }
}

#[cfg(feature = "remote-training")]
impl TrainingService for HttpTrainingService {
    fn train(&self, request: &TrainingRequest) -> Result<TrainingResponse> {
        let url = self.endpoint("train");
        log::debug!("POST {}", url);

        let response = self
            .client()?
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        Self::check_status(response)?
            .json::<TrainingResponse>()
            .map_err(|e| Self::external(format!("invalid response: {}", e)))
    }

    fn history(&self) -> Result<Vec<serde_json::Value>> {
        let url = self.endpoint("history");
        log::debug!("GET {}", url);

        let response = self
            .client()?
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        Self::check_status(response)?
            .json::<Vec<serde_json::Value>>()
            .map_err(|e| Self::external(format!("invalid response: {}", e)))
    }
}

#[cfg(not(feature = "remote-training"))]
impl TrainingService for HttpTrainingService {
    fn train(&self, _request: &TrainingRequest) -> Result<TrainingResponse> {
        Err(Self::external(format!(
            "cannot reach {}: remote training not compiled, build with --features remote-training",
            self.endpoint("train")
        )))
    }

    fn history(&self) -> Result<Vec<serde_json::Value>> {
        Err(Self::external(format!(
            "cannot reach {}: remote training not compiled, build with --features remote-training",
            self.endpoint("history")
        )))
    }
}
