//! OAuth1-HMAC-SHA256 request signing (`spec.md` §4.1).
//!
//! PLAINTEXT signing is not acceptable. The signature base string is the
//! HTTP method, the request URL, and the sorted set of OAuth parameters
//! (realm excluded); the signing key is `consumer_secret + "&" +
//! token_secret`; the signature is base64 of HMAC-SHA256 over the base
//! string.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use suitebridge_config::ErpCredentials;

type HmacSha256 = Hmac<Sha256>;

/// RFC 3986 unreserved characters are never percent-encoded; everything
/// else, including the characters `NON_ALPHANUMERIC` would otherwise
/// leave alone, is.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// The seven OAuth protocol parameters that participate in the signature
/// base string (realm participates in the header only).
pub struct OAuthParams {
    pub consumer_key: String,
    pub token: String,
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthParams {
    fn sorted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.nonce.clone()),
            ("oauth_signature_method".to_string(), "HMAC-SHA256".to_string()),
            ("oauth_timestamp".to_string(), self.timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        pairs.sort();
        pairs
    }
}

fn signature_base_string(method: &str, url: &str, params: &OAuthParams, extra_query: &[(String, String)]) -> String {
    let mut pairs = params.sorted_pairs();
    pairs.extend(extra_query.iter().cloned());
    pairs.sort();

    let param_string = pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(&k), percent_encode(&v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let signing_key = format!("{consumer_secret}&{token_secret}");
    let mut mac = HmacSha256::new_from_slice(signing_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization: OAuth ...` header value for one request.
/// `extra_query` is any query-string parameters on `url` that must also
/// participate in the signature (the account id's `realm` is included in
/// the header but deliberately excluded from the signature base).
pub fn authorization_header(
    method: &str,
    url: &str,
    credentials: &ErpCredentials,
    params: &OAuthParams,
    extra_query: &[(String, String)],
) -> String {
    let base_string = signature_base_string(method, url, params, extra_query);
    let signature = sign(&base_string, &credentials.consumer_secret, &credentials.token_secret);

    let mut header_params = vec![
        ("realm".to_string(), credentials.account_id.clone()),
        ("oauth_consumer_key".to_string(), params.consumer_key.clone()),
        ("oauth_token".to_string(), params.token.clone()),
        ("oauth_signature_method".to_string(), "HMAC-SHA256".to_string()),
        ("oauth_timestamp".to_string(), params.timestamp.to_string()),
        ("oauth_nonce".to_string(), params.nonce.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
        ("oauth_signature".to_string(), signature),
    ];

    let rendered = header_params
        .drain(..)
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(&v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {rendered}")
}

/// A fresh nonce: 32 hex characters from the OS RNG, the conventional
/// OAuth1 nonce shape.
pub fn generate_nonce() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ErpCredentials {
        ErpCredentials {
            account_id: "1234567".to_string(),
            consumer_key: "consumer-key".to_string(),
            consumer_secret: "consumer-secret".to_string(),
            token_id: "token-id".to_string(),
            token_secret: "token-secret".to_string(),
        }
    }

    fn params() -> OAuthParams {
        OAuthParams {
            consumer_key: "consumer-key".to_string(),
            token: "token-id".to_string(),
            nonce: "abc123".to_string(),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn realm_is_excluded_from_the_signature_base_but_present_in_the_header() {
        let base = signature_base_string("POST", "https://erp.example.com/query", &params(), &[]);
        assert!(!base.contains("1234567"));

        let header = authorization_header(
            "POST",
            "https://erp.example.com/query",
            &credentials(),
            &params(),
            &[],
        );
        assert!(header.contains("realm=\"1234567\""));
    }

    #[test]
    fn signature_is_deterministic_for_the_same_inputs() {
        let a = authorization_header("POST", "https://erp.example.com/query", &credentials(), &params(), &[]);
        let b = authorization_header("POST", "https://erp.example.com/query", &credentials(), &params(), &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn changing_the_url_changes_the_signature() {
        let a = authorization_header("POST", "https://erp.example.com/query", &credentials(), &params(), &[]);
        let b = authorization_header("POST", "https://erp.example.com/other", &credentials(), &params(), &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn header_contains_all_seven_oauth_fields_plus_realm() {
        let header = authorization_header("POST", "https://erp.example.com/query", &credentials(), &params(), &[]);
        for field in [
            "realm=",
            "oauth_consumer_key=",
            "oauth_token=",
            "oauth_signature_method=\"HMAC-SHA256\"",
            "oauth_timestamp=",
            "oauth_nonce=",
            "oauth_version=\"1.0\"",
            "oauth_signature=",
        ] {
            assert!(header.contains(field), "missing {field} in {header}");
        }
    }

    #[test]
    fn nonce_generation_yields_unique_values() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
