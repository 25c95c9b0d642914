use std::sync::Arc;

use axum::{
    body::Body,
    extract::OriginalUri,
    http::{Method, Request},
};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("invalid path pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// How a path rule is compared against the request path (query excluded).
#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    /// `*` = within one segment, `**` = any depth, `?` = one character.
    Glob(Regex),
    Regex(Regex),
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn glob(pattern: &str) -> Result<Self, ExclusionError> {
        compile(pattern, &glob_to_regex(pattern)).map(Self::Glob)
    }

    pub fn regex(pattern: &str) -> Result<Self, ExclusionError> {
        compile(pattern, pattern).map(Self::Regex)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == path,
            Self::Glob(re) | Self::Regex(re) => re.is_match(path),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(path: &str) -> Self {
        Self::exact(path)
    }
}

impl From<String> for PathPattern {
    fn from(path: String) -> Self {
        Self::Exact(path)
    }
}

impl From<Regex> for PathPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

fn compile(pattern: &str, source: &str) -> Result<Regex, ExclusionError> {
    Regex::new(source).map_err(|source| ExclusionError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

#[derive(Debug, Clone)]
struct PathRule {
    pattern: PathPattern,
    // Empty = every method.
    methods: Vec<Method>,
}

type Predicate = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// Requests that skip the wrapped middleware.
///
/// Rules are OR-ed: one match is enough.
#[derive(Clone)]
pub struct Exclusions {
    paths: Vec<PathRule>,
    methods: Vec<Method>,
    extensions: Vec<String>,
    custom: Option<Predicate>,
    use_original_uri: bool,
}

impl std::fmt::Debug for Exclusions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exclusions")
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("extensions", &self.extensions)
            .field("custom", &self.custom.is_some())
            .field("use_original_uri", &self.use_original_uri)
            .finish()
    }
}

impl Default for Exclusions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            methods: Vec::new(),
            extensions: Vec::new(),
            custom: None,
            use_original_uri: true,
        }
    }
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a path for every method. `&str` is an exact match.
    pub fn path(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.paths.push(PathRule {
            pattern: pattern.into(),
            methods: Vec::new(),
        });
        self
    }

    pub fn paths<I, P>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathPattern>,
    {
        patterns.into_iter().fold(self, |rules, pattern| rules.path(pattern))
    }

    /// Exclude a path only for the given methods.
    pub fn path_with_methods(
        mut self,
        pattern: impl Into<PathPattern>,
        methods: impl IntoIterator<Item = Method>,
    ) -> Self {
        self.paths.push(PathRule {
            pattern: pattern.into(),
            methods: methods.into_iter().collect(),
        });
        self
    }

    pub fn glob(self, pattern: &str) -> Result<Self, ExclusionError> {
        Ok(self.path(PathPattern::glob(pattern)?))
    }

    pub fn regex(self, pattern: &str) -> Result<Self, ExclusionError> {
        Ok(self.path(PathPattern::regex(pattern)?))
    }

    /// Exclude every request using `method`, whatever the path.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Exclude paths ending in this file extension (`css` or `.css`).
    pub fn extension(mut self, ext: &str) -> Self {
        let ext = ext.trim_start_matches('.');
        self.extensions.push(format!(".{ext}"));
        self
    }

    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request<Body>) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(predicate));
        self
    }

    /// Match the path the client sent rather than the one seen by a nested
    /// router (default `true`).
    pub fn use_original_uri(mut self, enabled: bool) -> Self {
        self.use_original_uri = enabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.methods.is_empty()
            && self.extensions.is_empty()
            && self.custom.is_none()
    }

    pub fn matches(&self, req: &Request<Body>) -> bool {
        if self.custom.as_ref().is_some_and(|custom| custom(req)) {
            return true;
        }

        let method = req.method();
        if self.methods.contains(method) {
            return true;
        }

        let path = match req.extensions().get::<OriginalUri>() {
            Some(OriginalUri(uri)) if self.use_original_uri => uri.path(),
            _ => req.uri().path(),
        };

        if self.extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return true;
        }

        self.paths.iter().any(|rule| {
            rule.pattern.matches(path) && (rule.methods.is_empty() || rule.methods.contains(method))
        })
    }
}
