// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key materialization for NEAR ed25519 keys.
//!
//! Turns the `ed25519:<base58>` secret string handed to the relay into a
//! [`SigningCredential`]. The credential is a capability: it can sign bytes
//! and report its public key, but never hands the secret back out.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use zeroize::Zeroizing;

use super::types::AccountId;

/// Curve prefix used by NEAR key strings.
pub const ED25519_PREFIX: &str = "ed25519";

/// Other curve prefixes NEAR key strings may carry.
const KNOWN_CURVES: [&str; 1] = ["secp256k1"];

/// Length of an encoded NEAR ed25519 secret (seed followed by public key).
const KEYPAIR_LENGTH: usize = 64;

/// Reasons a secret fails to materialize.
///
/// None of the messages include any part of the secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("unsupported key type `{0}`, only ed25519 keys are accepted")]
    UnsupportedCurve(&'static str),

    #[error("unsupported key type, only ed25519 keys are accepted")]
    UnknownKeyType,

    #[error("private key is not valid base58")]
    InvalidEncoding,

    #[error("private key must decode to {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("private key checksum mismatch: public half does not match the secret seed")]
    ChecksumMismatch,
}

/// A NEAR ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ED25519_PREFIX}:{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Signing capability bound to one account on one network.
///
/// Owned by the call that materialized it and dropped with it; the underlying
/// key is zeroized on drop.
pub struct SigningCredential {
    account_id: AccountId,
    network_id: String,
    key: SigningKey,
}

impl SigningCredential {
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary payload.
    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        self.key.sign(payload).to_bytes()
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("account_id", &self.account_id)
            .field("network_id", &self.network_id)
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Materialize a signing credential from a NEAR secret key string.
///
/// # Arguments
/// * `account_id` - Account the key signs for
/// * `network_id` - Network the key is bound to (e.g. `testnet`)
/// * `secret` - `ed25519:<base58 of seed || public key>`; the prefix may be omitted
///
/// # Returns
/// * `Ok(SigningCredential)` - A credential that can sign payloads
/// * `Err(KeyError)` - If the string is not a valid ed25519 key pair
pub fn materialize(
    account_id: AccountId,
    network_id: &str,
    secret: &str,
) -> Result<SigningCredential, KeyError> {
    let encoded = match secret.trim().split_once(':') {
        Some((curve, data)) if curve.eq_ignore_ascii_case(ED25519_PREFIX) => data,
        Some((curve, _)) => {
            // Only a recognised curve name is echoed; anything else may be key material.
            return Err(KNOWN_CURVES
                .into_iter()
                .find(|known| curve.eq_ignore_ascii_case(known))
                .map_or(KeyError::UnknownKeyType, KeyError::UnsupportedCurve));
        }
        None => secret.trim(),
    };

    let bytes = Zeroizing::new(
        bs58::decode(encoded)
            .into_vec()
            .map_err(|_| KeyError::InvalidEncoding)?,
    );

    if bytes.len() != KEYPAIR_LENGTH {
        return Err(KeyError::InvalidLength {
            expected: KEYPAIR_LENGTH,
            actual: bytes.len(),
        });
    }

    let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
    seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);
    let key = SigningKey::from_bytes(&seed);

    if key.verifying_key().as_bytes()[..] != bytes[SECRET_KEY_LENGTH..] {
        return Err(KeyError::ChecksumMismatch);
    }

    Ok(SigningCredential {
        account_id,
        network_id: network_id.to_string(),
        key,
    })
}
