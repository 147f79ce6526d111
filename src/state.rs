use std::sync::Arc;

use axum::async_trait;

use crate::config::{AppConfig, GithubConfig, JwtConfig, TwilioConfig};
use crate::store::{MemoryStore, UserStore};
use crate::verify::client::{TwilioVerify, VerificationApi, VerificationStatus, VerifyError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub verify: Arc<dyn VerificationApi>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let users = Arc::new(MemoryStore::new()) as Arc<dyn UserStore>;
        let verify = Arc::new(TwilioVerify::new(&config.twilio)) as Arc<dyn VerificationApi>;
        Ok(Self {
            config,
            users,
            verify,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        verify: Arc<dyn VerificationApi>,
    ) -> Self {
        Self {
            config,
            users,
            verify,
        }
    }

    pub fn fake() -> Self {
        Self::fake_with(StubVerify::default(), false)
    }

    pub fn fake_with(verify: StubVerify, verify_link_account: bool) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60,
            },
            twilio: TwilioConfig {
                account_sid: "AC_test".into(),
                auth_token: "test".into(),
                verify_service_sid: "VA_test".into(),
            },
            github: GithubConfig {
                client_id: "test-client".into(),
                client_secret: String::new(),
            },
            verify_link_account,
        });
        Self {
            config,
            users: Arc::new(MemoryStore::new()),
            verify: Arc::new(verify),
        }
    }
}

/// Canned verification provider used by `AppState::fake`.
pub struct StubVerify {
    pub start: Result<(), String>,
    pub check: Result<VerificationStatus, String>,
}

impl Default for StubVerify {
    fn default() -> Self {
        Self {
            start: Ok(()),
            check: Ok(VerificationStatus::Approved),
        }
    }
}

#[async_trait]
impl VerificationApi for StubVerify {
    async fn start_verification(&self, _phone: &str) -> Result<(), VerifyError> {
        self.start.clone().map_err(VerifyError::Provider)
    }

    async fn check_verification(
        &self,
        _phone: &str,
        _code: &str,
    ) -> Result<VerificationStatus, VerifyError> {
        self.check.clone().map_err(VerifyError::Provider)
    }
}
