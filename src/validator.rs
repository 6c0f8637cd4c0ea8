// src/validator.rs

use crate::claims::Claims;
use crate::client::JwksClient;
use crate::config::Config;
use crate::error::AlderOidcError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// The main bearer-token verifier.
///
/// This struct is initialized with a `Config` and should be created once
/// and reused for all verification requests. It owns the JWKS client and
/// performs all necessary validation steps.
#[derive(Clone)]
pub struct Validator {
    config: Config,
    jwks_client: JwksClient,
}

impl Validator {
    /// Creates a new `Validator` with the given configuration, resolving
    /// the issuer's JWKS endpoint through OIDC discovery.
    ///
    /// Discovery failures are fatal here: callers should treat an error as
    /// "do not start", not retry per request.
    pub async fn discover(config: Config) -> Result<Self, AlderOidcError> {
        let jwks_client = JwksClient::discover(&config).await?;
        Ok(Self {
            config,
            jwks_client,
        })
    }

    /// Verifies a bearer token.
    ///
    /// This method performs a full verification of the token:
    /// 1. Signature verification against the provider's published keys.
    /// 2. Validation of the `iss`, `aud` and `exp` claims against the
    ///    configured issuer and audience.
    /// 3. Mapping of the raw claim set into the structured [`Claims`].
    ///
    /// Every failure is a typed [`AlderOidcError`]; no path degrades to an
    /// unauthenticated-but-accepted outcome.
    #[instrument(skip(self, token), err)]
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AlderOidcError> {
        if token.trim().is_empty() {
            return Err(AlderOidcError::MalformedToken);
        }

        // Decode the header to get kid and alg without validating anything.
        let header = decode_header(token).map_err(|_| AlderOidcError::MalformedToken)?;

        if !self.config.validation.algorithms.contains(&header.alg) {
            return Err(AlderOidcError::UnsupportedAlgorithm(header.alg));
        }

        // A token that does not name its signing key is malformed; the
        // verifier never tries every published key.
        let kid = header.kid.ok_or(AlderOidcError::MissingKeyId)?;
        let decoding_key = self.jwks_client.get_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.validation.leeway.as_secs();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let token_data = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(map_jwt_error)?;

        debug!("Token validated for kid: {}", kid);
        Ok(Claims::from_raw(&token_data.claims))
    }
}

/// Maps `jsonwebtoken` failures onto the tagged verification outcomes.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AlderOidcError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AlderOidcError::TokenExpired,
        ErrorKind::InvalidSignature => AlderOidcError::SignatureMismatch,
        ErrorKind::InvalidIssuer => AlderOidcError::IssuerMismatch,
        ErrorKind::InvalidAudience => AlderOidcError::AudienceMismatch,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => AlderOidcError::IssuerMismatch,
            "aud" => AlderOidcError::AudienceMismatch,
            _ => AlderOidcError::MalformedToken,
        },
        _ => AlderOidcError::MalformedToken,
    }
}
