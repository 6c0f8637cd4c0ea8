// src/config.rs

use crate::error::AlderOidcError;
use jsonwebtoken::Algorithm;
use std::time::Duration;
use url::Url;

/// Contains the validation settings applied to a bearer token.
///
/// This struct is used to configure the specific checks that will be
/// performed on the token's claims, such as allowed algorithms and clock
/// skew tolerance.
#[derive(Clone)]
pub struct ValidationDetails {
    /// The signing algorithms that are permitted for the token.
    /// Tokens signed with any other algorithm will be rejected.
    pub algorithms: Vec<Algorithm>,
    /// The tolerance for clock skew when validating time-based claims like `exp`.
    /// Defaults to 60 seconds.
    pub leeway: Duration,
}

impl Default for ValidationDetails {
    fn default() -> Self {
        Self {
            // Default to RS256, the most common algorithm for OIDC.
            algorithms: vec![Algorithm::RS256],
            leeway: Duration::from_secs(60),
        }
    }
}

/// The main configuration for the `alder-oidc` validator.
///
/// This struct holds all necessary information to connect to the OIDC
/// provider and verify tokens. It should be constructed using the
/// `ConfigBuilder`.
#[derive(Clone)]
pub struct Config {
    /// The issuer URL of the OIDC provider, normalized to carry no trailing
    /// slash. Used for discovery and to validate the `iss` claim exactly.
    pub issuer: String,
    /// The audience the tokens must be addressed to. Used to validate the
    /// `aud` claim.
    pub audience: String,
    /// Optional override for the JWKS endpoint URL. If `None`, the URL will
    /// be discovered from the issuer's `.well-known/openid-configuration`
    /// endpoint at construction time.
    pub jwks_uri: Option<Url>,
    /// The duration for which a fetched key set is cached when the JWKS
    /// response carries no `Cache-Control` header.
    pub cache_ttl: Duration,
    /// The specific validation parameters to apply to the token.
    pub validation: ValidationDetails,
    /// Optional HTTP client override for discovery and JWKS fetches. The
    /// client's timeout bounds every network call this library makes.
    pub http_client: Option<reqwest::Client>,
}

/// A builder for creating a `Config` instance.
///
/// This builder provides a fluent API to ensure that the configuration is
/// constructed correctly and with all required fields.
#[derive(Default)]
pub struct ConfigBuilder {
    issuer: Option<String>,
    audience: Option<String>,
    jwks_uri_option: Option<Url>,
    cache_ttl_option: Option<Duration>,
    http_client_option: Option<reqwest::Client>,
    validation: ValidationDetails,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuer URL of the OIDC provider. This is a required field.
    ///
    /// The URL is validated and stored without its trailing slash, so that
    /// the `iss` claim comparison matches what issuers actually emit.
    ///
    /// # Arguments
    ///
    /// * `url` - The issuer URL, e.g., "https://accounts.google.com".
    pub fn issuer_url(mut self, url: &str) -> Result<Self, AlderOidcError> {
        Url::parse(url).map_err(|e| AlderOidcError::InvalidUrl(e.to_string()))?;
        self.issuer = Some(url.trim_end_matches('/').to_string());
        Ok(self)
    }

    /// Sets the audience the tokens must carry. This is a required field.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets an explicit JWKS URI, bypassing OIDC discovery. This is optional.
    pub fn jwks_uri(mut self, url: &str) -> Result<Self, AlderOidcError> {
        let parsed_url = Url::parse(url).map_err(|e| AlderOidcError::InvalidUrl(e.to_string()))?;
        self.jwks_uri_option = Some(parsed_url);
        Ok(self)
    }

    /// Sets the fallback cache TTL for the JWKS. This is optional.
    /// Defaults to 5 minutes.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_option = Some(ttl);
        self
    }

    /// Sets the allowed signing algorithms.
    /// Defaults to `[Algorithm::RS256]` if not set.
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.validation.algorithms = algorithms;
        self
    }

    /// Sets the clock skew tolerance. This is optional.
    /// Defaults to 60 seconds.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway;
        self
    }

    /// Overrides the HTTP client used for discovery and JWKS fetches.
    /// Useful for injecting timeouts, proxies, or TLS settings.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client_option = Some(client);
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields (`issuer_url`, `audience`) are
    /// missing or empty.
    pub fn build(self) -> Result<Config, AlderOidcError> {
        let issuer = self
            .issuer
            .filter(|i| !i.trim().is_empty())
            .ok_or(AlderOidcError::MissingConfiguration("issuer_url".to_string()))?;
        let audience = self
            .audience
            .filter(|a| !a.trim().is_empty())
            .ok_or(AlderOidcError::MissingConfiguration("audience".to_string()))?;

        Ok(Config {
            issuer,
            audience,
            jwks_uri: self.jwks_uri_option,
            cache_ttl: self
                .cache_ttl_option
                .unwrap_or_else(|| Duration::from_secs(300)),
            validation: self.validation,
            http_client: self.http_client_option,
        })
    }
}
