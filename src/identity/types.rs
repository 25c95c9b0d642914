/*
 * Responsibility
 * - Types visible to downstream handlers after authentication
 *   - Claims: decoded token payload
 *   - RequestState: request-scoped bag written by the middleware (and by earlier stages)
 *
 * Notes
 * - RequestState lives in request extensions; one per request, dropped with it.
 * - Claims are never mutated after verification.
 */
use std::collections::HashMap;

use axum::http::Extensions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AuthError;
use crate::services::verifier::Secret;

/// Field name claims are stored under when none is configured.
pub const DEFAULT_CLAIMS_KEY: &str = "user";

/// Decoded token payload: claim name -> value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn jti(&self) -> Option<&str> {
        self.get_str("jti")
    }

    /// `exp` as a NumericDate; fractional and out-of-`i64` values included.
    pub fn exp(&self) -> Option<f64> {
        self.get("exp").and_then(Value::as_f64)
    }
}

/// Terminal authentication status recorded for downstream stages.
#[derive(Debug, Clone)]
pub enum AuthStatus {
    Authenticated,
    /// Authentication failed but `passthrough` let the request continue.
    PassthroughRejected(AuthError),
}

/// Request-scoped state shared between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    secret: Option<Secret>,
    claims: HashMap<String, Claims>,
    tokens: HashMap<String, String>,
    status: Option<AuthStatus>,
}

impl RequestState {
    /// Borrow the state of a request, creating an empty one if absent.
    pub fn of_mut(extensions: &mut Extensions) -> &mut Self {
        extensions.get_or_insert_default::<Self>()
    }

    pub fn of(extensions: &Extensions) -> Option<&Self> {
        extensions.get::<Self>()
    }

    /// Secret set by an earlier stage; wins over the configured one.
    pub fn secret(&self) -> Option<&Secret> {
        self.secret.as_ref()
    }

    pub fn set_secret(&mut self, secret: Secret) {
        self.secret = Some(secret);
    }

    pub fn claims(&self, key: &str) -> Option<&Claims> {
        self.claims.get(key)
    }

    /// Claims stored under the default key (`user`).
    pub fn user(&self) -> Option<&Claims> {
        self.claims(DEFAULT_CLAIMS_KEY)
    }

    pub fn token(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    pub fn status(&self) -> Option<&AuthStatus> {
        self.status.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, Some(AuthStatus::Authenticated))
    }

    pub(crate) fn authenticate(&mut self, key: &str, claims: Claims) {
        self.claims.insert(key.to_string(), claims);
        self.status = Some(AuthStatus::Authenticated);
    }

    pub(crate) fn set_token(&mut self, key: &str, token: String) {
        self.tokens.insert(key.to_string(), token);
    }

    pub(crate) fn reject(&mut self, err: AuthError) {
        self.status = Some(AuthStatus::PassthroughRejected(err));
    }
}
