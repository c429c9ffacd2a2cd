use serde::{Deserialize, Serialize};

/// Body returned by the assertion trust service.
///
/// The service answers with exactly one of two shapes, discriminated by
/// `status`. Anything else is treated as an unrecognized response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifierResponse {
    Okay {
        email: String,
        #[serde(default)]
        audience: Option<String>,
        #[serde(default)]
        issuer: Option<String>,
        #[serde(default)]
        expires: Option<i64>,
    },
    Failure {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Request body sent to the trust service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyRequest<'a> {
    pub assertion: &'a str,
    pub audience: &'a str,
}

/// The identity vouched for by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRejected {
    /// The service answered `status: "failure"`.
    Refused { reason: Option<String> },

    /// The service vouched for a different audience than the one we asked about.
    AudienceMismatch,

    /// `status: "okay"` but the email is empty or not an address.
    InvalidEmail,

    /// The body was not a recognizable verifier response.
    InvalidFormat,
}

impl std::fmt::Display for VerificationRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationRejected::Refused { reason } => {
                write!(f, "trust service refused the assertion")?;
                if let Some(reason) = reason {
                    if !reason.is_empty() {
                        write!(f, ": {reason}")?;
                    }
                }
                Ok(())
            }
            VerificationRejected::AudienceMismatch => {
                write!(f, "trust service verified a different audience")
            }
            VerificationRejected::InvalidEmail => {
                write!(f, "trust service returned an unusable email")
            }
            VerificationRejected::InvalidFormat => {
                write!(f, "trust service response had an unrecognized format")
            }
        }
    }
}

impl std::error::Error for VerificationRejected {}

/// Interpret a trust-service response body for the audience we asked about.
///
/// Only the outcome is returned; the raw body is never echoed back so that
/// assertion material does not end up in logs.
pub fn interpret_verifier_body(
    body: &str,
    expected_audience: &str,
) -> Result<VerifiedIdentity, VerificationRejected> {
    let response: VerifierResponse =
        serde_json::from_str(body).map_err(|_| VerificationRejected::InvalidFormat)?;

    match response {
        VerifierResponse::Failure { reason } => Err(VerificationRejected::Refused { reason }),
        VerifierResponse::Okay {
            email, audience, ..
        } => {
            if let Some(audience) = audience {
                if audience != expected_audience {
                    return Err(VerificationRejected::AudienceMismatch);
                }
            }
            if !crate::identity::is_plausible_email(&email) {
                return Err(VerificationRejected::InvalidEmail);
            }
            Ok(VerifiedIdentity { email })
        }
    }
}
