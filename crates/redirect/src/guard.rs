//! The redirect decision: loop guard, auth guard, then path vetting.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum RedirectConfigError {
    #[error("invalid trusted origin `{0}`")]
    InvalidOrigin(String),
}

/// Outcome of one redirect decision.
///
/// `Router` targets live inside the single-page app and navigate without a
/// document reload; `Browser` targets are same-origin pages outside the app
/// router (server-rendered consoles, download endpoints) and need a full
/// navigation. Either way the path has been vetted and is never a foreign
/// absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectDecision {
    /// Do not navigate.
    Stay,
    /// Same-document navigation through the app router.
    Router { path: String },
    /// Full browser navigation to a same-origin page.
    Browser { path: String },
}

impl RedirectDecision {
    /// The vetted target, when the decision is to move at all.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Stay => None,
            Self::Router { path } | Self::Browser { path } => Some(path),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Guard
// ─────────────────────────────────────────────────────────────────────────────

/// Vets untrusted return paths against a single trusted origin.
///
/// The guard is pure configuration plus one decision function; it holds no
/// session state and never fails at decision time. Every malformed or
/// hostile input degrades to the configured default path.
#[derive(Debug, Clone)]
pub struct RedirectGuard {
    trusted_origin: Url,
    default_path: String,
    sign_in_path: String,
    router_prefixes: Vec<String>,
}

impl RedirectGuard {
    pub fn new(
        trusted_origin: Url,
        default_path: impl Into<String>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            trusted_origin,
            default_path: default_path.into(),
            sign_in_path: sign_in_path.into(),
            router_prefixes: Vec::new(),
        }
    }

    /// Build from a textual origin, as configuration files supply it.
    pub fn from_origin(
        origin: &str,
        default_path: impl Into<String>,
        sign_in_path: impl Into<String>,
    ) -> Result<Self, RedirectConfigError> {
        let url = Url::parse(origin)
            .map_err(|_| RedirectConfigError::InvalidOrigin(origin.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(RedirectConfigError::InvalidOrigin(origin.to_string()));
        }
        Ok(Self::new(url, default_path, sign_in_path))
    }

    /// Declare which path prefixes the app router owns.
    ///
    /// With no prefixes declared, every vetted target is treated as a router
    /// navigation; with prefixes, targets outside them get a full browser
    /// navigation instead.
    pub fn with_router_prefixes(mut self, prefixes: impl IntoIterator<Item = String>) -> Self {
        self.router_prefixes = prefixes.into_iter().collect();
        self
    }

    /// Decide what the auth page should do after a completed sign-in, or on
    /// arrival while already signed in.
    ///
    /// Guards run in order. On the sign-in entry path itself, never move,
    /// whatever the other inputs say; a redirect there bounces straight back
    /// and loops. Without an authenticated identity there is nowhere to go
    /// yet. When the signed-in user is deliberately adding another account,
    /// the form stays visible. Only then is the untrusted return path vetted
    /// and turned into a navigation.
    pub fn decide(
        &self,
        current_path: &str,
        raw_return_path: Option<&str>,
        authenticated: bool,
        explicit_account_add: bool,
    ) -> RedirectDecision {
        if current_path == self.sign_in_path {
            return RedirectDecision::Stay;
        }
        if !authenticated || explicit_account_add {
            return RedirectDecision::Stay;
        }
        self.route(self.vet(raw_return_path))
    }

    /// Reduce an untrusted return path to a safe same-origin path.
    ///
    /// Accepts rooted relative paths unchanged and same-origin http(s) URLs
    /// reduced to path plus query. Everything else, protocol-relative and
    /// backslashed forms included, falls back to the default path.
    pub fn vet(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return self.default_path.clone();
        };
        // Browsers fold backslashes into slashes before navigating, so a
        // backslashed path can smuggle a protocol-relative form past a
        // naive prefix check.
        if raw.contains('\\') {
            return self.reject(raw, "backslash");
        }
        if raw.starts_with("//") {
            return self.reject(raw, "protocol-relative");
        }
        match Url::parse(raw) {
            Ok(url) => {
                if !matches!(url.scheme(), "http" | "https") {
                    return self.reject(raw, "non-http scheme");
                }
                if url.origin() != self.trusted_origin.origin() {
                    return self.reject(raw, "foreign origin");
                }
                let mut target = url.path().to_string();
                // An empty-host form like `https:///x` or a doubled slash in
                // the path would reduce to a protocol-relative target.
                if target.starts_with("//") {
                    return self.reject(raw, "protocol-relative");
                }
                if let Some(query) = url.query() {
                    target.push('?');
                    target.push_str(query);
                }
                target
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if raw.starts_with('/') {
                    raw.to_string()
                } else {
                    self.reject(raw, "not rooted")
                }
            }
            Err(_) => self.reject(raw, "unparseable"),
        }
    }

    fn reject(&self, raw: &str, reason: &str) -> String {
        debug!(raw, reason, "rejected return path");
        self.default_path.clone()
    }

    fn route(&self, path: String) -> RedirectDecision {
        let in_router = self.router_prefixes.is_empty()
            || self
                .router_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()));
        if in_router {
            RedirectDecision::Router { path }
        } else {
            RedirectDecision::Browser { path }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
