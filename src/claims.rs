// src/claims.rs

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Identity metadata extracted from a verified token.
///
/// The typed accessor fields cover the claims the rest of the system reads
/// directly; `raw` retains every scalar claim in the token so downstream
/// consumers can read claims this struct does not model without another
/// decode pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub username: String,
    pub given_name: String,
    pub family_name: String,
    pub email_verified: bool,
    pub roles: Vec<String>,
    pub raw: HashMap<String, ClaimValue>,
}

/// A single raw claim value.
///
/// A closed variant set instead of `serde_json::Value`: null, nested
/// objects, and non-string list items have no consumer and are dropped
/// during mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

impl ClaimValue {
    fn from_json(value: &Value) -> Option<ClaimValue> {
        match value {
            Value::String(s) => Some(ClaimValue::String(s.clone())),
            Value::Number(n) => n.as_f64().map(ClaimValue::Number),
            Value::Bool(b) => Some(ClaimValue::Bool(*b)),
            Value::Array(items) => Some(ClaimValue::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

impl Claims {
    /// Maps the raw claim set of a verified token into the structured form.
    ///
    /// Username prefers the `preferred_username` claim and falls back to a
    /// generic `username` claim. Roles accept a list of strings, a single
    /// string, or nothing at all. String fields copy string claims as-is and
    /// ignore other scalar shapes.
    pub(crate) fn from_raw(claims: &Map<String, Value>) -> Self {
        Claims {
            subject: string_claim(claims, "sub"),
            email: string_claim(claims, "email"),
            name: string_claim(claims, "name"),
            username: first_non_empty(
                string_claim(claims, "preferred_username"),
                string_claim(claims, "username"),
            ),
            given_name: string_claim(claims, "given_name"),
            family_name: string_claim(claims, "family_name"),
            email_verified: bool_claim(claims, "email_verified"),
            roles: string_list_claim(claims, "roles"),
            raw: claims
                .iter()
                .filter_map(|(key, value)| {
                    ClaimValue::from_json(value).map(|claim| (key.clone(), claim))
                })
                .collect(),
        }
    }
}

fn string_claim(claims: &Map<String, Value>, key: &str) -> String {
    match claims.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn bool_claim(claims: &Map<String, Value>, key: &str) -> bool {
    match claims.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn string_list_claim(claims: &Map<String, Value>, key: &str) -> Vec<String> {
    match claims.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn first_non_empty(primary: String, fallback: String) -> String {
    if primary.trim().is_empty() {
        fallback
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn maps_standard_profile_claims() {
        let claims = Claims::from_raw(&raw(json!({
            "sub": "user-123",
            "email": "user@example.com",
            "name": "Example User",
            "preferred_username": "example",
            "given_name": "Example",
            "family_name": "User",
            "email_verified": true,
            "roles": ["writer", "admin"],
        })));

        assert_eq!(claims.subject, "user-123");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.name, "Example User");
        assert_eq!(claims.username, "example");
        assert_eq!(claims.given_name, "Example");
        assert_eq!(claims.family_name, "User");
        assert!(claims.email_verified);
        assert_eq!(claims.roles, vec!["writer", "admin"]);
    }

    #[test]
    fn username_falls_back_to_generic_claim() {
        let claims = Claims::from_raw(&raw(json!({
            "sub": "user-123",
            "username": "fallback",
        })));
        assert_eq!(claims.username, "fallback");

        let claims = Claims::from_raw(&raw(json!({
            "sub": "user-123",
            "preferred_username": "  ",
            "username": "fallback",
        })));
        assert_eq!(claims.username, "fallback");
    }

    #[test]
    fn roles_accept_a_single_string() {
        let claims = Claims::from_raw(&raw(json!({ "roles": "admin" })));
        assert_eq!(claims.roles, vec!["admin"]);
    }

    #[test]
    fn roles_default_to_empty() {
        let claims = Claims::from_raw(&raw(json!({ "sub": "user-123" })));
        assert!(claims.roles.is_empty());

        let claims = Claims::from_raw(&raw(json!({ "roles": "" })));
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn roles_skip_non_string_items() {
        let claims = Claims::from_raw(&raw(json!({ "roles": ["admin", 7, null] })));
        assert_eq!(claims.roles, vec!["admin"]);
    }

    #[test]
    fn email_verified_coerces_strings_and_numbers() {
        assert!(Claims::from_raw(&raw(json!({ "email_verified": "TRUE" }))).email_verified);
        assert!(Claims::from_raw(&raw(json!({ "email_verified": 1 }))).email_verified);
        assert!(!Claims::from_raw(&raw(json!({ "email_verified": 0 }))).email_verified);
        assert!(!Claims::from_raw(&raw(json!({ "email_verified": "yes" }))).email_verified);
        assert!(!Claims::from_raw(&raw(json!({ "sub": "user-123" }))).email_verified);
    }

    #[test]
    fn string_fields_ignore_non_string_scalars() {
        let claims = Claims::from_raw(&raw(json!({ "sub": 42 })));
        assert_eq!(claims.subject, "");
    }

    #[test]
    fn raw_map_keeps_scalars_and_drops_structures() {
        let claims = Claims::from_raw(&raw(json!({
            "sub": "user-123",
            "exp": 1700000000,
            "email_verified": true,
            "roles": ["writer"],
            "address": { "street": "nowhere" },
            "middle_name": null,
        })));

        assert_eq!(
            claims.raw.get("sub"),
            Some(&ClaimValue::String("user-123".to_string()))
        );
        assert_eq!(claims.raw.get("exp"), Some(&ClaimValue::Number(1_700_000_000.0)));
        assert_eq!(claims.raw.get("email_verified"), Some(&ClaimValue::Bool(true)));
        assert_eq!(
            claims.raw.get("roles"),
            Some(&ClaimValue::List(vec!["writer".to_string()]))
        );
        assert!(!claims.raw.contains_key("address"));
        assert!(!claims.raw.contains_key("middle_name"));
    }
}
