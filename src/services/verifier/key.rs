use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;

const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];
const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];
const ED_ALGORITHMS: &[Algorithm] = &[Algorithm::EdDSA];

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("invalid {kind} public key pem: {source}")]
    Pem {
        kind: &'static str,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Verification key plus the algorithms accepted for it when none are configured.
///
/// Debug never prints key material.
#[derive(Clone)]
pub struct Secret {
    key: DecodingKey,
    algorithms: &'static [Algorithm],
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("Secret")
            .field("algorithms", &self.algorithms)
            .finish_non_exhaustive()
    }
}

impl Secret {
    /// Shared HMAC secret (HS256 / HS384 / HS512).
    pub fn shared(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            algorithms: HMAC_ALGORITHMS,
        }
    }

    pub fn rsa_pem(pem: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let key = DecodingKey::from_rsa_pem(pem.as_ref())
            .map_err(|source| SecretError::Pem { kind: "rsa", source })?;
        Ok(Self {
            key,
            algorithms: RSA_ALGORITHMS,
        })
    }

    pub fn ec_pem(pem: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let key = DecodingKey::from_ec_pem(pem.as_ref())
            .map_err(|source| SecretError::Pem { kind: "ec", source })?;
        Ok(Self {
            key,
            algorithms: EC_ALGORITHMS,
        })
    }

    pub fn ed_pem(pem: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let key = DecodingKey::from_ed_pem(pem.as_ref())
            .map_err(|source| SecretError::Pem { kind: "ed25519", source })?;
        Ok(Self {
            key,
            algorithms: ED_ALGORITHMS,
        })
    }

    /// Try every supported PEM flavour in turn (RSA, EC, Ed25519).
    pub fn public_pem(pem: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let pem = pem.as_ref();
        Self::rsa_pem(pem)
            .or_else(|_| Self::ec_pem(pem))
            .or_else(|_| Self::ed_pem(pem))
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    pub fn default_algorithms(&self) -> &'static [Algorithm] {
        self.algorithms
    }
}
