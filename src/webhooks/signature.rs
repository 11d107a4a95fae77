//! Webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with the shared secret configured on the hook
//! and sends the result in `X-Hub-Signature-256` as `sha256=<hex>`. A
//! delivery whose signature does not verify is rejected before its body is
//! parsed.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature does not match payload")]
    Mismatch,
}

/// Parses a signature header (`sha256=<hex>`) into raw bytes.
///
/// Returns `None` for malformed headers. Never panics.
///
/// # Examples
///
/// ```
/// use pullrequestd::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=abcd"), Some(vec![0xab, 0xcd]));
/// assert!(parse_signature_header("sha1=abcd").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// The shared secret webhook deliveries are signed with.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        WebhookSecret(secret.into())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }

    /// Signs a payload, returning the header value GitHub would send.
    ///
    /// # Examples
    ///
    /// ```
    /// use pullrequestd::webhooks::WebhookSecret;
    ///
    /// let secret = WebhookSecret::new("It's a Secret to Everybody");
    /// let header = secret.sign(b"Hello, World!");
    /// assert!(secret.verify(b"Hello, World!", Some(&header)).is_ok());
    /// assert!(secret.verify(b"Hello, World?", Some(&header)).is_err());
    /// ```
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies a delivery's signature header against its raw body.
    ///
    /// Uses constant-time comparison.
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let expected = parse_signature_header(header).ok_or(SignatureError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod parse_signature_header {
        use super::*;

        #[test]
        fn full_length_signature() {
            let header = format!("sha256={}", "a".repeat(64));
            assert_eq!(parse_signature_header(&header).map(|s| s.len()), Some(32));
        }

        #[test]
        fn uppercase_hex() {
            assert_eq!(
                parse_signature_header("sha256=ABCD1234"),
                Some(vec![0xab, 0xcd, 0x12, 0x34])
            );
        }

        #[test]
        fn malformed_headers() {
            assert_eq!(parse_signature_header(""), None);
            assert_eq!(parse_signature_header("1234abcd"), None);
            assert_eq!(parse_signature_header("sha256=abc"), None);
            assert_eq!(parse_signature_header("sha256="), Some(vec![]));
        }
    }

    mod verify {
        use super::*;

        /// Test vector from GitHub's webhook validation documentation.
        #[test]
        fn github_documentation_example() {
            let secret = WebhookSecret::new("It's a Secret to Everybody");
            let header = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
            assert_eq!(secret.sign(b"Hello, World!"), header);
            assert_eq!(secret.verify(b"Hello, World!", Some(header)), Ok(()));
        }

        #[test]
        fn missing_header() {
            let secret = WebhookSecret::new("s");
            assert_eq!(secret.verify(b"{}", None), Err(SignatureError::Missing));
        }

        #[test]
        fn malformed_header() {
            let secret = WebhookSecret::new("s");
            assert_eq!(
                secret.verify(b"{}", Some("sha1=abcd")),
                Err(SignatureError::Malformed)
            );
        }

        #[test]
        fn wrong_secret() {
            let header = WebhookSecret::new("right").sign(b"{}");
            assert_eq!(
                WebhookSecret::new("wrong").verify(b"{}", Some(&header)),
                Err(SignatureError::Mismatch)
            );
        }

        #[test]
        fn truncated_signature_is_mismatch() {
            let secret = WebhookSecret::new("s");
            let header = secret.sign(b"{}");
            assert_eq!(
                secret.verify(b"{}", Some(&header[..header.len() - 2])),
                Err(SignatureError::Mismatch)
            );
        }

        #[test]
        fn debug_redacts_secret() {
            assert_eq!(format!("{:?}", WebhookSecret::new("hunter2")), "WebhookSecret(***)");
        }

        proptest! {
            #[test]
            fn sign_then_verify(payload: Vec<u8>, secret: Vec<u8>) {
                let secret = WebhookSecret::new(secret);
                let header = secret.sign(&payload);
                prop_assert_eq!(secret.verify(&payload, Some(&header)), Ok(()));
            }

            #[test]
            fn modified_payload_fails(original: Vec<u8>, modified: Vec<u8>, secret: Vec<u8>) {
                prop_assume!(original != modified);
                let secret = WebhookSecret::new(secret);
                let header = secret.sign(&original);
                prop_assert_eq!(
                    secret.verify(&modified, Some(&header)),
                    Err(SignatureError::Mismatch)
                );
            }

            #[test]
            fn arbitrary_header_never_panics(header: String, payload: Vec<u8>) {
                let _ = WebhookSecret::new("s").verify(&payload, Some(&header));
            }
        }
    }
}
