//! HMAC-SHA256 request signing shared by the gateway and its clients.
//!
//! A request is signed over the canonical string `api_name || date`, where
//! `date` is the exact `X-API-Date` header value. The signature is sent as
//! lowercase hex in `X-API-Key`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The string covered by the signature.
pub fn canonical_string(api_name: &str, date: &str) -> String {
    format!("{}{}", api_name, date)
}

/// Signs `api_name || date` with the shared secret, returning lowercase hex.
pub fn sign_request(secret: &[u8], api_name: &str, date: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(canonical_string(api_name, date).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a provided signature using constant-time comparison.
pub fn verify_signature(secret: &[u8], api_name: &str, date: &str, provided: &str) -> bool {
    let expected = sign_request(secret, api_name, date);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign_request(b"secret", "exchange", "2024-01-01 00:00:00");
        let b = sign_request(b"secret", "exchange", "2024-01-01 00:00:00");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?"
        let signature = sign_request(b"Jefe", "what do ya want ", "for nothing?");
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_verification() {
        let date = "2024-01-01 00:00:00";
        let signature = sign_request(b"secret", "exchange", date);

        assert!(verify_signature(b"secret", "exchange", date, &signature));
        assert!(!verify_signature(b"other", "exchange", date, &signature));
        assert!(!verify_signature(b"secret", "other", date, &signature));
        assert!(!verify_signature(
            b"secret",
            "exchange",
            "2024-01-01 00:00:01",
            &signature
        ));
    }

    #[test]
    fn test_verification_is_exact() {
        let date = "2024-01-01 00:00:00";
        let signature = sign_request(b"secret", "exchange", date);

        assert!(!verify_signature(
            b"secret",
            "exchange",
            date,
            &signature.to_uppercase()
        ));
        assert!(!verify_signature(b"secret", "exchange", date, &signature[..63]));
        assert!(!verify_signature(b"secret", "exchange", date, ""));
    }
}
