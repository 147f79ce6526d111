use axum::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TwilioConfig;

const DEFAULT_BASE_URL: &str = "https://verify.twilio.com/v2";

/// Outcome of a verification check as reported by the provider. Only
/// `Approved` is ever treated as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Approved,
    Pending,
    Other(String),
}

impl VerificationStatus {
    fn from_provider(status: &str) -> Self {
        match status {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// Failure reported by the provider; the message is surfaced to clients.
    #[error("{0}")]
    Provider(String),
    #[error("verification provider unreachable: {0}")]
    Transport(String),
}

/// One-time-code verification, delegated to an external provider.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// Asks the provider to send an SMS code to `phone`.
    async fn start_verification(&self, phone: &str) -> Result<(), VerifyError>;

    /// Submits a code for `phone` and returns the provider's verdict.
    async fn check_verification(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<VerificationStatus, VerifyError>;
}

/// Twilio Verify v2 client. No retries; timeouts are whatever the transport
/// defaults to.
pub struct TwilioVerify {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    service_sid: String,
}

#[derive(Debug, Deserialize)]
struct VerificationResource {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl TwilioVerify {
    pub fn new(config: &TwilioConfig) -> Self {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(config: &TwilioConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            service_sid: config.verify_service_sid.clone(),
        }
    }

    async fn post_form(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<VerificationResource, VerifyError> {
        let url = format!(
            "{}/Services/{}/{}",
            self.base_url, self.service_sid, resource
        );
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("provider returned {status}"));
            warn!(%status, message = %message, "verification provider error");
            return Err(VerifyError::Provider(message));
        }

        response
            .json::<VerificationResource>()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))
    }
}

#[async_trait]
impl VerificationApi for TwilioVerify {
    async fn start_verification(&self, phone: &str) -> Result<(), VerifyError> {
        let resource = self
            .post_form("Verifications", &[("To", phone), ("Channel", "sms")])
            .await?;
        debug!(status = %resource.status, "verification started");
        Ok(())
    }

    async fn check_verification(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<VerificationStatus, VerifyError> {
        let resource = self
            .post_form("VerificationChecks", &[("To", phone), ("Code", code)])
            .await?;
        debug!(status = %resource.status, "verification checked");
        Ok(VerificationStatus::from_provider(&resource.status))
    }
}
