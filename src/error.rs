// src/error.rs

use thiserror::Error;

/// The primary error type for the `alder-oidc` library.
///
/// Construction-time failures (configuration, discovery) are fatal to the
/// subsystem; per-descriptor parse failures are recovered by skipping the
/// descriptor; fetch failures may be absorbed by the stale-key fallback;
/// verification failures surface at the middleware boundary as a uniform
/// authentication rejection.
#[derive(Debug, Error)]
pub enum AlderOidcError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("A required configuration field is missing: {0}")]
    MissingConfiguration(String),

    #[error("OIDC discovery failed: {0}")]
    Discovery(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JWKS endpoint returned status {0}")]
    JwksStatus(reqwest::StatusCode),

    #[error("JWKS contained no usable keys")]
    NoUsableKeys,

    #[error("Key refresh task failed: {0}")]
    RefreshTask(String),

    #[error("Unsupported key family: {0:?}")]
    UnsupportedKeyFamily(String),

    #[error("Unsupported elliptic curve: {0:?}")]
    UnsupportedCurve(String),

    #[error("Invalid JWK format: {0}")]
    InvalidKeyFormat(String),

    #[error("EC point is not on the declared curve")]
    PointNotOnCurve,

    #[error("The JWT header is missing the 'kid' (Key ID) field")]
    MissingKeyId,

    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),

    #[error("Unsupported JWT algorithm: {0:?}")]
    UnsupportedAlgorithm(jsonwebtoken::Algorithm),

    #[error("The token is malformed")]
    MalformedToken,

    #[error("The token signature does not verify against the resolved key")]
    SignatureMismatch,

    #[error("The token issuer does not match the configured issuer")]
    IssuerMismatch,

    #[error("The token audience does not contain the configured audience")]
    AudienceMismatch,

    #[error("The token is expired")]
    TokenExpired,
}
