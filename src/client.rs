// src/client.rs

use crate::config::Config;
use crate::error::AlderOidcError;
use crate::jwk::decoding_key;
use crate::model::{JsonWebKeySet, OidcDiscoveryDocument};
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};
use url::Url;

/// A client for fetching and caching JSON Web Keys (JWKs) from an OIDC provider.
///
/// The JWKS endpoint is resolved exactly once, at construction. Keys are
/// cached as one map with one expiry and refreshed on demand when a lookup
/// misses or the cache has expired; there is no background refresh task.
#[derive(Clone)]
pub struct JwksClient {
    // The client is internally ref-counted to allow for cheap cloning.
    inner: Arc<Inner>,
}

struct Inner {
    http_client: reqwest::Client,
    jwks_uri: Url,
    cache_ttl: Duration,
    // The whole key set shares one expiry and is only ever replaced
    // wholesale, so a lookup can never observe a half-rotated set.
    cache: RwLock<Option<CachedKeys>>,
    // Serializes refreshes: at most one fetch in flight per cache.
    refresh_lock: Mutex<()>,
}

struct CachedKeys {
    keys: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

impl JwksClient {
    /// Creates a new `JwksClient`, resolving the JWKS endpoint from the
    /// issuer's `.well-known/openid-configuration` document unless the
    /// config carries an explicit override.
    ///
    /// Discovery failures are fatal: a subsystem that cannot learn where its
    /// keys live must not start.
    pub async fn discover(config: &Config) -> Result<Self, AlderOidcError> {
        let http_client = config.http_client.clone().unwrap_or_default();
        let jwks_uri = match &config.jwks_uri {
            Some(uri) => {
                debug!("Using JWKS URI from config override: {}", uri);
                uri.clone()
            }
            None => discover_jwks_uri(&http_client, &config.issuer).await?,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                http_client,
                jwks_uri,
                cache_ttl: config.cache_ttl,
                cache: RwLock::new(None),
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    /// Retrieves the decoding key for the given Key ID (`kid`).
    ///
    /// The fast path is a shared-lock lookup against the cached set. On a
    /// miss or an expired cache the whole set is re-fetched from the
    /// provider; if that fetch fails but a previously fetched set still
    /// contains the requested `kid`, the stale key is served so that a
    /// provider outage does not reject tokens signed with keys that were
    /// never rotated away.
    #[instrument(skip(self), err)]
    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AlderOidcError> {
        if let Some(key) = self.inner.fresh_key(kid).await {
            debug!("JWK cache hit for kid: {}", kid);
            return Ok(key);
        }

        debug!("JWK cache miss for kid: {}. Refreshing from provider.", kid);
        // The refresh runs on its own task so that cancellation of one
        // request cannot abort a refresh other callers are waiting on.
        let inner = Arc::clone(&self.inner);
        let kid = kid.to_string();
        tokio::spawn(refresh_and_get(inner, kid))
            .await
            .map_err(|err| AlderOidcError::RefreshTask(err.to_string()))?
    }
}

impl Inner {
    /// Fast-path lookup: a key from a cache that has not expired.
    async fn fresh_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;
        if Instant::now() < cached.expires_at {
            cached.keys.get(kid).cloned()
        } else {
            None
        }
    }

    /// Lookup that ignores expiry, for the stale fallback.
    async fn stale_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.cache.read().await;
        cache.as_ref().and_then(|cached| cached.keys.get(kid).cloned())
    }
}

async fn refresh_and_get(
    inner: Arc<Inner>,
    kid: String,
) -> Result<Arc<DecodingKey>, AlderOidcError> {
    let _refresh = inner.refresh_lock.lock().await;

    // Double-check: another caller may have refreshed while this one waited
    // on the refresh lock.
    if let Some(key) = inner.fresh_key(&kid).await {
        return Ok(key);
    }

    match fetch_keys(&inner).await {
        Ok((keys, cache_ttl)) => {
            let key = keys.get(&kid).cloned();
            let mut cache = inner.cache.write().await;
            *cache = Some(CachedKeys {
                keys,
                expires_at: Instant::now() + cache_ttl,
            });
            drop(cache);
            // Only the freshly published set decides whether the kid exists;
            // an identifier the issuer rotated away stays gone.
            key.ok_or(AlderOidcError::KeyNotFound(kid))
        }
        Err(err) => {
            if let Some(key) = inner.stale_key(&kid).await {
                warn!("JWKS refresh failed ({}); serving stale key for kid: {}", err, kid);
                return Ok(key);
            }
            Err(err)
        }
    }
}

/// Fetches the JWKS and parses every descriptor, skipping the unusable
/// ones. Returns the usable keys and the TTL they should be cached with.
#[instrument(skip(inner), err)]
async fn fetch_keys(
    inner: &Inner,
) -> Result<(HashMap<String, Arc<DecodingKey>>, Duration), AlderOidcError> {
    let response = inner.http_client.get(inner.jwks_uri.clone()).send().await?;
    if !response.status().is_success() {
        return Err(AlderOidcError::JwksStatus(response.status()));
    }

    let cache_ttl = parse_cache_control(&response).unwrap_or(inner.cache_ttl);
    let jwks: JsonWebKeySet = response.json().await?;

    let mut keys = HashMap::with_capacity(jwks.keys.len());
    for jwk in &jwks.keys {
        let Some(kid) = jwk.kid.as_deref().filter(|kid| !kid.is_empty()) else {
            debug!("Skipping JWK without a kid");
            continue;
        };
        match decoding_key(jwk) {
            Ok(key) => {
                keys.insert(kid.to_string(), Arc::new(key));
            }
            Err(err) => warn!("Skipping unusable JWK for kid {}: {}", kid, err),
        }
    }

    // An empty usable set is indistinguishable from a failed fetch.
    if keys.is_empty() {
        return Err(AlderOidcError::NoUsableKeys);
    }

    debug!("Fetched {} usable keys. Caching with TTL: {:?}", keys.len(), cache_ttl);
    Ok((keys, cache_ttl))
}

async fn discover_jwks_uri(
    http_client: &reqwest::Client,
    issuer: &str,
) -> Result<Url, AlderOidcError> {
    let discovery_url = format!("{issuer}/.well-known/openid-configuration");
    debug!("Performing OIDC discovery at: {}", discovery_url);

    let response = http_client
        .get(&discovery_url)
        .send()
        .await
        .map_err(|err| AlderOidcError::Discovery(format!("request failed: {err}")))?;
    if !response.status().is_success() {
        return Err(AlderOidcError::Discovery(format!(
            "unexpected status {}",
            response.status()
        )));
    }

    let document: OidcDiscoveryDocument = response
        .json()
        .await
        .map_err(|err| AlderOidcError::Discovery(format!("invalid document: {err}")))?;
    if document.jwks_uri.trim().is_empty() {
        return Err(AlderOidcError::Discovery(
            "jwks_uri missing from discovery document".to_string(),
        ));
    }

    Url::parse(&document.jwks_uri).map_err(|err| AlderOidcError::InvalidUrl(err.to_string()))
}

/// Parses the `Cache-Control` header to determine the TTL.
fn parse_cache_control(response: &reqwest::Response) -> Option<Duration> {
    max_age(
        response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)?
            .to_str()
            .ok()?,
    )
}

fn max_age(header: &str) -> Option<Duration> {
    header.split(',').find_map(|part| {
        part.trim()
            .strip_prefix("max-age=")?
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    })
}
