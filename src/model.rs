// src/model.rs

use serde::Deserialize;

/// Represents the data structure of an OIDC provider's discovery document.
/// Found at the `.well-known/openid-configuration` endpoint.
#[derive(Debug, Deserialize)]
pub struct OidcDiscoveryDocument {
    pub issuer: Option<String>,
    pub jwks_uri: String,
}

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517.
///
/// Every field is untrusted input. The key identifier is optional here so
/// that a single descriptor without one does not fail deserialization of the
/// whole set; such descriptors are skipped by the fetcher.
#[derive(Debug, Deserialize)]
pub struct JsonWebKey {
    pub kid: Option<String>,
    pub kty: String,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub alg: Option<String>,
    /// RSA modulus, base64url.
    pub n: Option<String>,
    /// RSA public exponent, base64url.
    pub e: Option<String>,
    /// Certificate chain, base64 standard encoding (not base64url).
    #[serde(default)]
    pub x5c: Vec<String>,
    /// EC curve name, e.g. "P-256".
    pub crv: Option<String>,
    /// EC X coordinate, base64url.
    pub x: Option<String>,
    /// EC Y coordinate, base64url.
    pub y: Option<String>,
}

/// Represents a JSON Web Key Set (JWKS), which is a collection of JWKs.
#[derive(Debug, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}
