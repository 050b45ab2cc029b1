//! Which paths the identity gate lets through without a session.

use axum::http::Method;
use regex::RegexSet;

use super::IdentityError;

/// Paths that never require an identity.
///
/// The webhook endpoint is authenticated by its own signature instead.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    "/health",
    "/health/ready",
    "/api/webhooks",
    "/favicon.ico",
    "/static/*",
];

/// A compiled set of public path patterns.
///
/// Patterns are literal paths where `*` matches any run of characters,
/// including `/`. Each pattern must match the whole path.
#[derive(Debug, Clone)]
pub struct PublicRoutes {
    set: RegexSet,
}

impl PublicRoutes {
    /// Compile the default public routes plus `extra` patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex build error if the combined set exceeds the
    /// compiled size limit.
    pub fn new<I, S>(extra: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = DEFAULT_PUBLIC_ROUTES
            .iter()
            .map(|p| pattern_to_regex(p))
            .chain(extra.into_iter().map(|p| pattern_to_regex(p.as_ref())))
            .collect::<Vec<_>>();

        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    /// Whether `path` is exempt from requiring an identity.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

fn pattern_to_regex(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{body}$")
}

/// How a request without a valid identity is turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Send the browser to sign in, then back to `return_to`.
    RedirectToSignIn { return_to: String },
    /// Plain 401 for API calls and non-navigational requests.
    Unauthorized,
}

/// Identity-gate policy: public routes and where to send anonymous visitors.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    public: PublicRoutes,
    sign_in_url: String,
}

impl GatePolicy {
    #[must_use]
    pub fn new(public: PublicRoutes, sign_in_url: impl Into<String>) -> Self {
        Self {
            public,
            sign_in_url: sign_in_url.into(),
        }
    }

    /// Build the policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidKey` if a configured route pattern
    /// cannot be compiled.
    pub fn from_config(config: &crate::config::IdentityConfig) -> Result<Self, IdentityError> {
        let public = PublicRoutes::new(&config.public_routes)
            .map_err(|e| IdentityError::InvalidKey(format!("public route pattern: {e}")))?;
        Ok(Self::new(public, config.sign_in_url.clone()))
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.is_public(path)
    }

    /// Decide how to reject an anonymous request to a protected path.
    ///
    /// Page navigations (`GET`/`HEAD` outside `/api/`) are redirected to
    /// sign in; everything else gets a 401.
    #[must_use]
    pub fn denial(&self, method: &Method, path_and_query: &str) -> Denial {
        let is_api = path_and_query.starts_with("/api/");
        let is_navigation = *method == Method::GET || *method == Method::HEAD;

        if is_api || !is_navigation {
            Denial::Unauthorized
        } else {
            Denial::RedirectToSignIn {
                return_to: path_and_query.to_string(),
            }
        }
    }

    /// The sign-in URL carrying a `redirect_url` back to `return_to`.
    #[must_use]
    pub fn sign_in_redirect(&self, return_to: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_url", return_to)
            .finish();
        let separator = if self.sign_in_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.sign_in_url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy(extra: &[&str]) -> GatePolicy {
        GatePolicy::new(PublicRoutes::new(extra).unwrap(), "/sign-in")
    }

    #[test]
    fn test_default_public_routes() {
        let p = policy(&[]);
        assert!(p.is_public("/api/webhooks"));
        assert!(p.is_public("/health"));
        assert!(p.is_public("/static/css/main.css"));
        assert!(p.is_public("/favicon.ico"));
    }

    #[test]
    fn test_protected_by_default() {
        let p = policy(&[]);
        assert!(!p.is_public("/"));
        assert!(!p.is_public("/main"));
        assert!(!p.is_public("/api/tabs"));
        assert!(!p.is_public("/api/webhooks/extra"));
        assert!(!p.is_public("/healthz"));
    }

    #[test]
    fn test_patterns_are_literal_apart_from_wildcard() {
        let p = policy(&["/docs/v1.0/*"]);
        assert!(p.is_public("/docs/v1.0/intro"));
        assert!(!p.is_public("/docs/v1x0/intro"));
    }

    #[test]
    fn test_extra_routes() {
        let p = policy(&["/pricing", "/blog/*"]);
        assert!(p.is_public("/pricing"));
        assert!(p.is_public("/blog/2026/hello"));
        assert!(!p.is_public("/pricing/enterprise"));
    }

    #[test]
    fn test_denial_for_pages_and_api() {
        let p = policy(&[]);
        assert_eq!(
            p.denial(&Method::GET, "/main?x=1"),
            Denial::RedirectToSignIn {
                return_to: "/main?x=1".to_string()
            }
        );
        assert_eq!(p.denial(&Method::GET, "/api/tabs"), Denial::Unauthorized);
        assert_eq!(p.denial(&Method::POST, "/main"), Denial::Unauthorized);
    }

    #[test]
    fn test_sign_in_redirect_encodes_return_path() {
        let p = policy(&[]);
        assert_eq!(
            p.sign_in_redirect("/main?tab=1"),
            "/sign-in?redirect_url=%2Fmain%3Ftab%3D1"
        );

        let p = GatePolicy::new(PublicRoutes::new(&[] as &[&str]).unwrap(), "/login?app=x");
        assert_eq!(p.sign_in_redirect("/"), "/login?app=x&redirect_url=%2F");
    }
}
