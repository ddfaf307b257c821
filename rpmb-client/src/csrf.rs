//! Cross-site request forgery tokens
//!
//! Console proxies in front of the API server reject writes that do not
//! echo the session's CSRF token in a header. The token can be found in
//! several places; sources are consulted in priority order and the first
//! non-empty value wins. Finding nothing is not an error: servers that do
//! not check the header accept the request anyway.

use std::fmt;

/// Header carrying the token
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Cookie the console stores the token in
pub const CSRF_COOKIE: &str = "csrf-token";

/// Environment variable consulted as the last resort
pub const CSRF_ENV_VAR: &str = "RPMB_CSRF_TOKEN";

/// One place a CSRF token may be found
pub trait TokenSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// The token, or `None` if this source has none
    fn token(&self) -> Option<String>;
}

/// Reads the token out of a `Cookie` header value
#[derive(Debug, Clone)]
pub struct CookieSource {
    cookie_header: Option<String>,
    cookie_name: String,
}

impl CookieSource {
    pub fn new(cookie_header: Option<String>) -> Self {
        Self {
            cookie_header,
            cookie_name: CSRF_COOKIE.to_string(),
        }
    }
}

impl TokenSource for CookieSource {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn token(&self) -> Option<String> {
        let header = self.cookie_header.as_deref()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim().to_string())
    }
}

/// A token published in session metadata (e.g. a page `<meta>` tag)
#[derive(Debug, Clone)]
pub struct MetadataSource {
    content: Option<String>,
}

impl MetadataSource {
    pub fn new(content: Option<String>) -> Self {
        Self { content }
    }
}

impl TokenSource for MetadataSource {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn token(&self) -> Option<String> {
        self.content.as_ref().map(|c| c.trim().to_string())
    }
}

/// A token exported into the process environment
#[derive(Debug, Clone)]
pub struct EnvSource {
    var: String,
}

impl EnvSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new(CSRF_ENV_VAR)
    }
}

impl TokenSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Ordered list of token sources
#[derive(Debug, Default)]
pub struct CsrfResolver {
    sources: Vec<Box<dyn TokenSource>>,
}

impl CsrfResolver {
    pub fn new(sources: Vec<Box<dyn TokenSource>>) -> Self {
        Self { sources }
    }

    /// Cookies first, then session metadata, then the environment
    pub fn standard(cookie_header: Option<String>, metadata: Option<String>) -> Self {
        Self::new(vec![
            Box::new(CookieSource::new(cookie_header)),
            Box::new(MetadataSource::new(metadata)),
            Box::new(EnvSource::default()),
        ])
    }

    /// First non-empty token, `None` to proceed without one
    pub fn resolve(&self) -> Option<String> {
        self.sources.iter().find_map(|source| {
            source.token().filter(|t| !t.is_empty()).inspect(|_| {
                tracing::debug!(source = source.name(), "Resolved CSRF token");
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_source_finds_token() {
        let source = CookieSource::new(Some(
            "openshift-session-token=abc; csrf-token=tok123 ; other=1".to_string(),
        ));
        assert_eq!(source.token().as_deref(), Some("tok123"));
    }

    #[test]
    fn test_cookie_source_without_token() {
        let source = CookieSource::new(Some("openshift-session-token=abc".to_string()));
        assert_eq!(source.token(), None);
        assert_eq!(CookieSource::new(None).token(), None);
    }

    #[test]
    fn test_resolver_priority_order() {
        let resolver = CsrfResolver::new(vec![
            Box::new(CookieSource::new(Some("csrf-token=from-cookie".to_string()))),
            Box::new(MetadataSource::new(Some("from-meta".to_string()))),
        ]);
        assert_eq!(resolver.resolve().as_deref(), Some("from-cookie"));

        let resolver = CsrfResolver::new(vec![
            Box::new(CookieSource::new(None)),
            Box::new(MetadataSource::new(Some("from-meta".to_string()))),
        ]);
        assert_eq!(resolver.resolve().as_deref(), Some("from-meta"));
    }

    #[test]
    fn test_empty_token_skips_to_next_source() {
        let resolver = CsrfResolver::new(vec![
            Box::new(CookieSource::new(Some("csrf-token=".to_string()))),
            Box::new(MetadataSource::new(Some("  ".to_string()))),
            Box::new(EnvSource::new("RPMB_TEST_CSRF_TOKEN_THAT_IS_NEVER_SET")),
        ]);
        assert_eq!(resolver.resolve(), None);
    }

    #[test]
    fn test_empty_resolver() {
        assert_eq!(CsrfResolver::default().resolve(), None);
    }
}
