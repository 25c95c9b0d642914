use std::collections::HashSet;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::identity::Claims;
use crate::services::verifier::Secret;

/// Verifier failure; `Display` is the human-readable failure description
/// (e.g. `invalid signature`, `jwt expired`).
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct VerifyError {
    detail: String,
}

impl VerifyError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Claim constraints forwarded to the verifier.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    // Any of these must match `aud`; empty = not checked.
    pub audience: Vec<String>,
    // Any of these must match `iss`; empty = not checked.
    pub issuer: Vec<String>,
    pub subject: Option<String>,
    // Empty = the key family's defaults.
    pub algorithms: Vec<Algorithm>,
    // Clock skew tolerated for exp/nbf, seconds.
    pub leeway: u64,
    pub ignore_expiration: bool,
}

/// Signature + claim verification.
///
/// Implementations must be cheap to share (`Arc<dyn TokenVerifier>`).
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(
        &self,
        token: &str,
        secret: &Secret,
        options: &VerifyOptions,
    ) -> Result<Claims, VerifyError>;
}

/// Default verifier backed by the `jsonwebtoken` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWebTokenVerifier;

impl JsonWebTokenVerifier {
    pub fn validation(secret: &Secret, options: &VerifyOptions) -> Validation {
        let mut validation = Validation::default();

        validation.algorithms = if options.algorithms.is_empty() {
            secret.default_algorithms().to_vec()
        } else {
            options.algorithms.clone()
        };

        // `exp` is checked when present but not required.
        let mut required = HashSet::new();
        validation.validate_exp = !options.ignore_expiration;
        validation.validate_nbf = true;
        validation.leeway = options.leeway;

        if options.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(options.audience.as_slice());
            required.insert("aud".to_string());
        }

        if !options.issuer.is_empty() {
            validation.set_issuer(options.issuer.as_slice());
            required.insert("iss".to_string());
        }

        if let Some(subject) = &options.subject {
            validation.sub = Some(subject.clone());
            required.insert("sub".to_string());
        }

        validation.required_spec_claims = required;
        validation
    }

    /// Translate a `jsonwebtoken` error into the failure description exposed in debug mode.
    pub fn describe(err: &jsonwebtoken::errors::Error, options: &VerifyOptions) -> String {
        match err.kind() {
            ErrorKind::InvalidToken => "jwt malformed".to_string(),
            ErrorKind::InvalidSignature => "invalid signature".to_string(),
            ErrorKind::ExpiredSignature => "jwt expired".to_string(),
            ErrorKind::ImmatureSignature => "jwt not active".to_string(),
            ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingAlgorithm
            | ErrorKind::InvalidAlgorithmName => "invalid algorithm".to_string(),
            ErrorKind::InvalidAudience => audience_message(options),
            ErrorKind::InvalidIssuer => issuer_message(options),
            ErrorKind::InvalidSubject => subject_message(options),
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "aud" => audience_message(options),
                "iss" => issuer_message(options),
                "sub" => subject_message(options),
                other => format!("jwt {other} missing"),
            },
            ErrorKind::InvalidClaimFormat(claim) => format!("invalid {claim} value"),
            ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidEddsaKey
            | ErrorKind::InvalidRsaKey(_) => "invalid key".to_string(),
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                "invalid token".to_string()
            }
            _ => err.to_string(),
        }
    }
}

fn audience_message(options: &VerifyOptions) -> String {
    format!(
        "jwt audience invalid. expected: {}",
        options.audience.join(" or ")
    )
}

fn issuer_message(options: &VerifyOptions) -> String {
    format!("jwt issuer invalid. expected: {}", options.issuer.join(","))
}

fn subject_message(options: &VerifyOptions) -> String {
    format!(
        "jwt subject invalid. expected: {}",
        options.subject.as_deref().unwrap_or_default()
    )
}

#[async_trait]
impl TokenVerifier for JsonWebTokenVerifier {
    async fn verify(
        &self,
        token: &str,
        secret: &Secret,
        options: &VerifyOptions,
    ) -> Result<Claims, VerifyError> {
        let validation = Self::validation(secret, options);

        jsonwebtoken::decode::<Claims>(token, secret.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|err| VerifyError::new(Self::describe(&err, options)))
    }
}
