//! PKCE S256 challenge generation
//!
//! Implements the Proof Key for Code Exchange extension to OAuth 2.0
//! (RFC 7636), `S256` method only. The verifier stays on this side of the
//! wire; only the derived challenge travels in the authorization request,
//! and the verifier is revealed solely at the token exchange.

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A PKCE S256 challenge pair consisting of a verifier and its derived
/// challenge value.
///
/// Created by [`generate`] and consumed by the authorization flow in
/// `src/auth/flow.rs`. One pair per authorization attempt; never reused.
///
/// # Examples
///
/// ```
/// use toolgate::auth::pkce::generate;
///
/// let challenge = generate().expect("PKCE generation must not fail");
/// assert_eq!(challenge.method, "S256");
/// assert_eq!(challenge.verifier.len(), 43);
/// ```
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// The code verifier: a base64url-encoded (no padding) random string of
    /// exactly 43 characters derived from 32 random bytes.
    pub verifier: String,

    /// The code challenge: the base64url-encoded (no padding) SHA-256 digest
    /// of the UTF-8 representation of [`Self::verifier`].
    pub challenge: String,

    /// The challenge method. Always `"S256"`.
    pub method: String,
}

/// Generates a fresh PKCE S256 challenge.
///
/// The verifier is 32 cryptographically random bytes encoded as a base64url
/// string without padding (43 characters). The challenge is the base64url
/// encoding of the SHA-256 digest of the verifier string's UTF-8 bytes, per
/// RFC 7636 section 4.2.
///
/// # Errors
///
/// Infallible in practice; returns a `Result` so callers can use `?`
/// uniformly.
pub fn generate() -> Result<PkceChallenge> {
    use rand::RngCore as _;

    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);

    let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);

    // RFC 7636 section 4.2: ASCII(BASE64URL(SHA256(ASCII(code_verifier))))
    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());

    Ok(PkceChallenge {
        verifier,
        challenge,
        method: "S256".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use sha2::{Digest, Sha256};

    #[test]
    fn test_generate_produces_correct_verifier_length() {
        let pkce = generate().expect("generate must not fail");
        assert_eq!(
            pkce.verifier.len(),
            43,
            "32 random bytes in base64url without padding produces 43 chars"
        );
    }

    #[test]
    fn test_challenge_is_correct_s256_of_verifier() {
        let pkce = generate().expect("generate must not fail");

        let digest = Sha256::digest(pkce.verifier.as_bytes());
        let expected_challenge =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());

        assert_eq!(
            pkce.challenge, expected_challenge,
            "challenge must equal base64url(SHA256(verifier))"
        );
    }

    #[test]
    fn test_method_is_always_s256() {
        let pkce = generate().expect("generate must not fail");
        assert_eq!(pkce.method, "S256");
    }

    #[test]
    fn test_generate_produces_unique_verifiers() {
        let a = generate().expect("first call");
        let b = generate().expect("second call");
        assert_ne!(
            a.verifier, b.verifier,
            "successive calls must produce distinct verifiers"
        );
    }

    #[test]
    fn test_verifier_uses_url_safe_base64_no_padding() {
        let pkce = generate().expect("generate must not fail");
        // base64url characters are [A-Za-z0-9_-]; no '+', '/', or '=' allowed.
        assert!(
            pkce.verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "verifier must only contain base64url characters, got: {}",
            pkce.verifier
        );
        assert!(
            !pkce.verifier.contains('='),
            "verifier must not contain padding '='"
        );
    }

    #[test]
    fn test_challenge_uses_url_safe_base64_no_padding() {
        let pkce = generate().expect("generate must not fail");
        assert!(
            pkce.challenge
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "challenge must only contain base64url characters, got: {}",
            pkce.challenge
        );
        assert!(
            !pkce.challenge.contains('='),
            "challenge must not contain padding '='"
        );
    }

    #[test]
    fn test_verifier_and_challenge_are_distinct() {
        let pkce = generate().expect("generate must not fail");
        assert_ne!(pkce.verifier, pkce.challenge);
    }

    /// Verifies the S256 computation against the known test vector from
    /// RFC 7636 Appendix B.
    #[test]
    fn test_s256_known_answer_rfc7636_appendix_b() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice());
        assert_eq!(
            challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            "S256 challenge must match RFC 7636 Appendix B test vector"
        );
    }
}
