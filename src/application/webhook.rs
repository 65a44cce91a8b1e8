//! Webhook signature verification.
//!
//! Upstream signs each webhook with HMAC-SHA256 over the request body and
//! sends it as `x-ghost-signature: sha256=<hex>, t=<timestamp>`.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-ghost-signature";

const BLOCK_SIZE: usize = 64;
const INNER_PAD: u8 = 0x36;
const OUTER_PAD: u8 = 0x5c;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature does not match request body")]
    Mismatch,
}

pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Hex encoded HMAC-SHA256 of `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        hex::encode(hmac_sha256(&self.secret, body))
    }

    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let provided = extract_signature(header);
        if provided.is_empty() {
            return Err(SignatureError::Mismatch);
        }

        let expected = self.sign(body);
        if expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Pull the hash out of `sha256=<hex>, t=<ts>`. Anything malformed yields an
/// empty string, which never matches.
pub fn extract_signature(header: &str) -> &str {
    header
        .split(',')
        .next()
        .and_then(|segment| segment.trim().split('=').nth(1))
        .unwrap_or_default()
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut key = [0u8; BLOCK_SIZE];
    if secret.len() > BLOCK_SIZE {
        let digest = Sha256::digest(secret);
        key[..digest.len()].copy_from_slice(&digest[..]);
    } else {
        key[..secret.len()].copy_from_slice(secret);
    }

    let mut inner = Sha256::new();
    inner.update(key.map(|byte| byte ^ INNER_PAD));
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(key.map(|byte| byte ^ OUTER_PAD));
    outer.update(&inner_digest[..]);
    outer.finalize().to_vec()
}
