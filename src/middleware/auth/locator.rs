//! Token discovery: custom source, then cookie, then `Authorization: Bearer`.
//!
//! The first source yielding a non-empty value wins. A located token is the
//! only one verified; there is no fallback to other sources when it fails.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, header, request::Parts};

use crate::error::AuthError;

/// Result of a custom token source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Token(String),
    /// Abort the request with this status and body (emitted as-is).
    Failed { status: StatusCode, message: String },
    /// Nothing here; built-in sources are tried next.
    NotFound,
}

impl Located {
    pub fn failed(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Failed {
            status,
            message: message.into(),
        }
    }
}

impl From<Option<String>> for Located {
    fn from(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => Self::Token(token),
            _ => Self::NotFound,
        }
    }
}

/// Caller-supplied token source, tried before cookie and header.
pub trait TokenSource: Send + Sync {
    fn locate(&self, parts: &Parts) -> Located;
}

impl<F> TokenSource for F
where
    F: Fn(&Parts) -> Located + Send + Sync,
{
    fn locate(&self, parts: &Parts) -> Located {
        self(parts)
    }
}

/// Token from a query string parameter, e.g. `?token=...` (WebSocket clients
/// cannot set headers).
#[derive(Debug, Clone)]
pub struct QueryParam(pub String);

impl QueryParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl TokenSource for QueryParam {
    fn locate(&self, parts: &Parts) -> Located {
        let token = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| *name == self.0)
                .map(|(_, value)| value.into_owned())
        });
        Located::from(token)
    }
}

#[derive(Clone, Default)]
pub(crate) struct TokenLocator {
    pub(crate) source: Option<Arc<dyn TokenSource>>,
    pub(crate) cookie: Option<String>,
}

impl TokenLocator {
    /// `Ok(None)` means no source carried a token.
    pub(crate) fn locate(&self, parts: &Parts) -> Result<Option<String>, AuthError> {
        if let Some(source) = &self.source {
            match source.locate(parts) {
                Located::Token(token) if !token.is_empty() => return Ok(Some(token)),
                Located::Failed { status, message } => {
                    return Err(AuthError::locator(status, message));
                }
                Located::Token(_) | Located::NotFound => {}
            }
        }

        if let Some(token) = self
            .cookie
            .as_deref()
            .and_then(|name| cookie_token(&parts.headers, name))
        {
            return Ok(Some(token.to_string()));
        }

        Ok(bearer_token(&parts.headers)?.map(str::to_string))
    }
}

/// Non-empty value of cookie `name`, looking through every `Cookie` header.
pub fn cookie_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
        .filter(|value| !value.is_empty())
}

/// Strict `Authorization: Bearer <token>` parsing.
///
/// Whitespace around the whole value is ignored; inside it nothing is.
///
/// - header absent (or blank): `Ok(None)`
/// - exactly `Bearer` + one space + non-empty token: `Ok(Some(token))`
/// - anything else: `Err(BadHeaderFormat)`
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| AuthError::BadHeaderFormat)?
        .trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let mut parts = raw.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(Some(token)),
        _ => Err(AuthError::BadHeaderFormat),
    }
}
