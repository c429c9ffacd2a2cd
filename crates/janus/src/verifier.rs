use std::time::Duration;

use async_trait::async_trait;
use janus_core::assertion::{interpret_verifier_body, VerifiedIdentity, VerifyRequest};

/// Verification failed. Deliberately carries no reason: callers must not be
/// able to tell a rejected assertion from an unreachable trust service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("assertion verification failed")]
pub struct VerificationFailure;

#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    /// Exchange a signed assertion bound to `audience` for a verified email.
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerificationFailure>;
}

/// Verifier backed by the remote trust service. Single attempt, no retries:
/// assertions are single-use and short-lived.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    client: reqwest::Client,
    url: String,
}

impl RemoteVerifier {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create verifier HTTP client: {e}"))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl AssertionVerifier for RemoteVerifier {
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerificationFailure> {
        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&VerifyRequest {
                assertion,
                audience,
            })
            .send()
            .await
            .map_err(|e| {
                log::warn!("Trust service unreachable: {e}");
                VerificationFailure
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            log::warn!("Failed to read trust service response: {e}");
            VerificationFailure
        })?;

        if !status.is_success() {
            log::warn!("Trust service answered {status}");
            return Err(VerificationFailure);
        }

        interpret_verifier_body(&body, audience).map_err(|e| {
            log::warn!("Assertion rejected for audience {audience}: {e}");
            VerificationFailure
        })
    }
}

/// Verifier answering from a fixed assertion → email table, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticVerifier {
    accepted: std::collections::HashMap<String, (String, String)>,
}

#[cfg(test)]
impl StaticVerifier {
    pub fn accept(mut self, assertion: &str, audience: &str, email: &str) -> Self {
        self.accepted.insert(
            assertion.to_string(),
            (audience.to_string(), email.to_string()),
        );
        self
    }
}

#[cfg(test)]
#[async_trait]
impl AssertionVerifier for StaticVerifier {
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerificationFailure> {
        match self.accepted.get(assertion) {
            Some((expected, email)) if expected == audience => Ok(VerifiedIdentity {
                email: email.clone(),
            }),
            _ => Err(VerificationFailure),
        }
    }
}
