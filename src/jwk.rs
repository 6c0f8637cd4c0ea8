// src/jwk.rs

use crate::error::AlderOidcError;
use crate::model::JsonWebKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use rsa::{BigUint, RsaPublicKey};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// The key families this library can reconstruct. Anything else in a
/// descriptor's `kty` tag is rejected by the parser and skipped by the
/// fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyFamily {
    Rsa,
    Ec,
}

impl KeyFamily {
    fn from_tag(tag: &str) -> Result<Self, AlderOidcError> {
        match tag {
            "RSA" => Ok(KeyFamily::Rsa),
            "EC" => Ok(KeyFamily::Ec),
            other => Err(AlderOidcError::UnsupportedKeyFamily(other.to_string())),
        }
    }
}

/// The NIST curves accepted for EC descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    fn from_name(name: &str) -> Result<Self, AlderOidcError> {
        match name {
            "P-256" | "secp256r1" => Ok(EcCurve::P256),
            "P-384" | "secp384r1" => Ok(EcCurve::P384),
            "P-521" | "secp521r1" => Ok(EcCurve::P521),
            other => Err(AlderOidcError::UnsupportedCurve(other.to_string())),
        }
    }

    /// Width of one coordinate in bytes.
    fn field_width(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }

    /// Whether (x, y), already padded to `field_width`, is a valid point
    /// on this curve. Delegates to the curve crates, which reject off-curve
    /// and identity encodings.
    fn contains_point(self, x: &[u8], y: &[u8]) -> bool {
        let sec1 = sec1_uncompressed(x, y);
        match self {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(&sec1).is_ok(),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(&sec1).is_ok(),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(&sec1).is_ok(),
        }
    }
}

/// Reconstructs a verification key from a single untrusted JWK descriptor.
///
/// RSA descriptors prefer the first `x5c` certificate when one parses
/// cleanly, falling back to the raw `n`/`e` components. EC descriptors are
/// only accepted when the declared coordinates form a valid point on the
/// declared curve; this check is what keeps an attacker-controlled key set
/// from smuggling an invalid-curve point into signature verification.
pub(crate) fn decoding_key(jwk: &JsonWebKey) -> Result<DecodingKey, AlderOidcError> {
    match KeyFamily::from_tag(&jwk.kty)? {
        KeyFamily::Rsa => rsa_key(jwk),
        KeyFamily::Ec => ec_key(jwk),
    }
}

fn rsa_key(jwk: &JsonWebKey) -> Result<DecodingKey, AlderOidcError> {
    if let Some(encoded) = jwk.x5c.first() {
        if let Some(key) = rsa_key_from_certificate(encoded) {
            return Ok(key);
        }
    }

    let n = jwk
        .n
        .as_deref()
        .ok_or_else(|| AlderOidcError::InvalidKeyFormat("RSA key missing 'n' component".to_string()))?;
    let e = jwk
        .e
        .as_deref()
        .ok_or_else(|| AlderOidcError::InvalidKeyFormat("RSA key missing 'e' component".to_string()))?;
    let n_bytes = base64_url::decode(n)
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("RSA modulus is not base64url: {err}")))?;
    let e_bytes = base64_url::decode(e)
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("RSA exponent is not base64url: {err}")))?;
    rsa_key_from_integers(&n_bytes, &e_bytes)
}

/// Extracts the RSA public key from the first certificate of an `x5c`
/// chain. Any failure here is absorbed so the caller can fall back to the
/// raw components.
fn rsa_key_from_certificate(encoded: &str) -> Option<DecodingKey> {
    let der = STANDARD.decode(encoded).ok()?;
    let (_, certificate) = X509Certificate::from_der(&der).ok()?;
    match certificate.public_key().parsed().ok()? {
        x509_parser::public_key::PublicKey::RSA(key) => {
            rsa_key_from_integers(key.modulus, key.exponent).ok()
        }
        _ => None,
    }
}

fn rsa_key_from_integers(modulus: &[u8], exponent: &[u8]) -> Result<DecodingKey, AlderOidcError> {
    let modulus = strip_leading_zeros(modulus);
    let exponent = strip_leading_zeros(exponent);
    if exponent.is_empty() {
        return Err(AlderOidcError::InvalidKeyFormat(
            "RSA exponent must be positive".to_string(),
        ));
    }

    // Structural validation before the bytes are treated as a key.
    let n = BigUint::from_bytes_be(modulus);
    let e = BigUint::from_bytes_be(exponent);
    RsaPublicKey::new(n, e)
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("RSA key rejected: {err}")))?;

    Ok(DecodingKey::from_rsa_raw_components(modulus, exponent))
}

fn ec_key(jwk: &JsonWebKey) -> Result<DecodingKey, AlderOidcError> {
    let crv = jwk
        .crv
        .as_deref()
        .ok_or_else(|| AlderOidcError::InvalidKeyFormat("EC key missing 'crv' component".to_string()))?;
    let curve = EcCurve::from_name(crv)?;
    let x = jwk
        .x
        .as_deref()
        .ok_or_else(|| AlderOidcError::InvalidKeyFormat("EC key missing 'x' coordinate".to_string()))?;
    let y = jwk
        .y
        .as_deref()
        .ok_or_else(|| AlderOidcError::InvalidKeyFormat("EC key missing 'y' coordinate".to_string()))?;

    let x_bytes = base64_url::decode(x)
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("EC x coordinate is not base64url: {err}")))?;
    let y_bytes = base64_url::decode(y)
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("EC y coordinate is not base64url: {err}")))?;
    let x_bytes = fixed_width(&x_bytes, curve.field_width())?;
    let y_bytes = fixed_width(&y_bytes, curve.field_width())?;

    if !curve.contains_point(&x_bytes, &y_bytes) {
        return Err(AlderOidcError::PointNotOnCurve);
    }

    DecodingKey::from_ec_components(&base64_url::encode(&x_bytes), &base64_url::encode(&y_bytes))
        .map_err(|err| AlderOidcError::InvalidKeyFormat(format!("EC key rejected: {err}")))
}

/// Left-pads a big-endian coordinate to the curve's field width.
fn fixed_width(bytes: &[u8], width: usize) -> Result<Vec<u8>, AlderOidcError> {
    let significant = strip_leading_zeros(bytes);
    if significant.len() > width {
        return Err(AlderOidcError::InvalidKeyFormat(
            "EC coordinate wider than the curve field".to_string(),
        ));
    }
    let mut padded = vec![0u8; width];
    padded[width - significant.len()..].copy_from_slice(significant);
    Ok(padded)
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn sec1_uncompressed(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1 + x.len() + y.len());
    bytes.push(0x04);
    bytes.extend_from_slice(x);
    bytes.extend_from_slice(y);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2048-bit test modulus/exponent, base64url.
    const TEST_N: &str = "wsaBXCBDjT7ISLezpuI2l1g8E6OIjQdnFFaGrgA6-07Ys44mf7NaJqL5nODp5XRB5lGpCenll58gnBA6tUam8EQ_Mh8hUyuIwRyhEIcJevU_dudRFPHfsq4wrKL3X-wWS9tGgli2KeZjVpSDWYqiOJx2fGkpBK08cedPvxVu1Bdj6Z_vX_KL_qUR-fpyTQlGGhPe16WdJTCypoBLlg1ouiesmOjdxmsEBHLeWOjjju3d-QMeuldfvi21ZAHDqcFOYjGxR39C7kDTGqCr5_TYcIrYRM_x87Ebz7HWHcBXXRkVcAu8MzYI4Yk48r7gVfs_yv7zHuy7V9VCMpuUL_0Z9Q";
    const TEST_E: &str = "AQAB";

    // The P-256 base point, which lies on the curve by definition.
    const P256_GX: &str = "axfR8uEsQkf4vOblY6RA8ncDfYEt6zOg9KE5RdiYwpY";
    const P256_GY: &str = "T-NC4v4af5uO5-tKfA-eFivOM1drMV7Oy7ZAaDe_UfU";
    // 32-byte big-endian encoding of 1; (1, 1) is not on P-256.
    const ONE32: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAE";

    fn descriptor() -> JsonWebKey {
        JsonWebKey {
            kid: Some("test-key".to_string()),
            kty: "RSA".to_string(),
            use_purpose: Some("sig".to_string()),
            alg: None,
            n: Some(TEST_N.to_string()),
            e: Some(TEST_E.to_string()),
            x5c: Vec::new(),
            crv: None,
            x: None,
            y: None,
        }
    }

    fn ec_descriptor(crv: &str, x: &str, y: &str) -> JsonWebKey {
        JsonWebKey {
            kid: Some("ec-key".to_string()),
            kty: "EC".to_string(),
            use_purpose: Some("sig".to_string()),
            alg: None,
            n: None,
            e: None,
            x5c: Vec::new(),
            crv: Some(crv.to_string()),
            x: Some(x.to_string()),
            y: Some(y.to_string()),
        }
    }

    #[test]
    fn rsa_descriptor_with_components_is_accepted() {
        assert!(decoding_key(&descriptor()).is_ok());
    }

    #[test]
    fn rsa_descriptor_missing_modulus_is_rejected() {
        let mut jwk = descriptor();
        jwk.n = None;
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn rsa_descriptor_missing_exponent_is_rejected() {
        let mut jwk = descriptor();
        jwk.e = None;
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn rsa_zero_exponent_is_rejected() {
        let mut jwk = descriptor();
        // base64url of two zero bytes
        jwk.e = Some("AAA".to_string());
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn rsa_modulus_with_invalid_base64_is_rejected() {
        let mut jwk = descriptor();
        jwk.n = Some("!!!not-base64url!!!".to_string());
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn garbage_certificate_falls_back_to_components() {
        let mut jwk = descriptor();
        jwk.x5c = vec![STANDARD.encode(b"definitely not DER")];
        assert!(decoding_key(&jwk).is_ok());
    }

    #[test]
    fn garbage_certificate_without_components_is_rejected() {
        let mut jwk = descriptor();
        jwk.x5c = vec![STANDARD.encode(b"definitely not DER")];
        jwk.n = None;
        jwk.e = None;
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn unknown_key_family_is_rejected() {
        let mut jwk = descriptor();
        jwk.kty = "oct".to_string();
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::UnsupportedKeyFamily(tag)) if tag == "oct"
        ));
    }

    #[test]
    fn ec_point_on_curve_is_accepted() {
        let jwk = ec_descriptor("P-256", P256_GX, P256_GY);
        assert!(decoding_key(&jwk).is_ok());
    }

    #[test]
    fn ec_curve_alias_is_accepted() {
        let jwk = ec_descriptor("secp256r1", P256_GX, P256_GY);
        assert!(decoding_key(&jwk).is_ok());
    }

    #[test]
    fn ec_point_off_curve_is_rejected() {
        let jwk = ec_descriptor("P-256", ONE32, ONE32);
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::PointNotOnCurve)
        ));
    }

    #[test]
    fn ec_unknown_curve_is_rejected() {
        let jwk = ec_descriptor("P-192", P256_GX, P256_GY);
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::UnsupportedCurve(name)) if name == "P-192"
        ));
    }

    #[test]
    fn ec_missing_coordinate_is_rejected() {
        let mut jwk = ec_descriptor("P-256", P256_GX, P256_GY);
        jwk.y = None;
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn ec_oversized_coordinate_is_rejected() {
        // 33 significant bytes cannot fit the P-256 field.
        let wide = base64_url::encode(&[0xffu8; 33]);
        let jwk = ec_descriptor("P-256", &wide, P256_GY);
        assert!(matches!(
            decoding_key(&jwk),
            Err(AlderOidcError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn short_coordinates_are_left_padded() {
        let padded = fixed_width(&[0x01, 0x02], 4).unwrap();
        assert_eq!(padded, vec![0x00, 0x00, 0x01, 0x02]);
    }
}
