//! Payment notification signature verification.
//!
//! The payment provider signs each notification with an HMAC-SHA512 over the
//! raw request body, hex-encoded into an `HMAC` header. Verification computes
//! the same digest with the pre-shared secret and compares in constant time.
//!
//! A failed verification is a normal outcome, not an error: missing header,
//! malformed hex and plain mismatch all simply yield `false`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Verifier for inbound payment notifications.
pub struct IpnVerifier {
    secret: SecretString,
}

impl IpnVerifier {
    /// Creates a verifier with the pre-shared IPN secret.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Checks `presented` (hex-encoded) against HMAC-SHA512 of `raw_body`.
    pub fn verify(&self, raw_body: &[u8], presented: &str) -> bool {
        let presented = match hex::decode(presented) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = HmacSha512::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(raw_body);
        let expected = mac.finalize().into_bytes();

        constant_time_compare(&expected, &presented)
    }

    /// Hex digest of `raw_body` under the configured secret, the counterpart
    /// of `verify`. Tests use it to build authentic notification fixtures.
    pub fn sign(&self, raw_body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(raw_body);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak information about the expected
/// signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn verifier(secret: &str) -> IpnVerifier {
        IpnVerifier::new(SecretString::new(secret.to_string()))
    }

    #[test]
    fn valid_signature_verifies() {
        let v = verifier("test-secret");
        let body = b"status=100&email=a%40x.com";
        let sig = v.sign(body);
        assert!(v.verify(body, &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"status=100&email=a%40x.com";
        let sig = verifier("secret-a").sign(body);
        assert!(!verifier("secret-b").verify(body, &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let v = verifier("test-secret");
        let sig = v.sign(b"status=100&email=a%40x.com");
        assert!(!v.verify(b"status=100&email=b%40x.com", &sig));
    }

    #[test]
    fn malformed_hex_fails_without_panicking() {
        let v = verifier("test-secret");
        assert!(!v.verify(b"payload", "not hex at all"));
        assert!(!v.verify(b"payload", ""));
    }

    #[test]
    fn truncated_signature_fails() {
        let v = verifier("test-secret");
        let sig = v.sign(b"payload");
        assert!(!v.verify(b"payload", &sig[..sig.len() - 2]));
    }

    #[test]
    fn signature_is_sha512_sized() {
        let v = verifier("test-secret");
        // 64-byte digest, 128 hex chars
        assert_eq!(v.sign(b"payload").len(), 128);
    }

    proptest! {
        #[test]
        fn any_body_verifies_against_its_own_signature(body in proptest::collection::vec(any::<u8>(), 0..512)) {
            let v = verifier("prop-secret");
            let sig = v.sign(&body);
            prop_assert!(v.verify(&body, &sig));
        }

        #[test]
        fn arbitrary_presented_strings_never_panic(
            body in proptest::collection::vec(any::<u8>(), 0..128),
            presented in ".*",
        ) {
            let v = verifier("prop-secret");
            // Either outcome is fine; the property is that this never panics
            // and only the genuine signature verifies.
            let ok = v.verify(&body, &presented);
            if ok {
                prop_assert_eq!(presented, v.sign(&body));
            }
        }
    }
}
