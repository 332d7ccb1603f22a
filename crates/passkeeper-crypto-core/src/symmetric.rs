//! AES-256-GCM authenticated encryption for the vault envelope.
//!
//! This module provides:
//! - [`seal`] — encrypt a payload with a random IV, returning the on-disk
//!   envelope `ciphertext ‖ iv ‖ tag`
//! - [`open`] — authenticate and decrypt an envelope, returning the payload
//!   as a [`SecretBuffer`]
//!
//! The envelope trailer order (IV before tag, both after the ciphertext) is
//! a wire-compatibility point and must not change.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::{SecretBuffer, SecretKey};

/// AES-256-GCM IV length in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Fixed envelope overhead: IV + tag appended after the ciphertext.
pub const ENVELOPE_OVERHEAD: usize = IV_LEN + TAG_LEN;

fn aead_key(key: &SecretKey) -> Result<aead::LessSafeKey, CryptoError> {
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key.bytes())
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

/// Encrypt a payload using AES-256-GCM with a random 96-bit IV.
///
/// Returns the envelope `ciphertext ‖ iv ‖ tag`. The ciphertext has the
/// payload's length; the IV comes from the system CSPRNG, not from the
/// generator pool. No additional authenticated data is used.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the CSPRNG refuses to produce an
/// IV or the underlying seal operation fails.
pub fn seal(payload: &[u8], key: &SecretKey) -> Result<Vec<u8>, CryptoError> {
    let sealing_key = aead_key(key)?;

    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::Encryption(format!("CSPRNG failure drawing IV: {e}")))?;
    let nonce = aead::Nonce::assume_unique_for_key(iv);

    // Encrypt in place — the payload copy becomes the ciphertext.
    let mut in_out = payload.to_vec();
    let Ok(tag) = sealing_key.seal_in_place_separate_tag(nonce, aead::Aad::empty(), &mut in_out)
    else {
        in_out.zeroize();
        return Err(CryptoError::Encryption(
            "AES-256-GCM encryption failed".into(),
        ));
    };

    let mut envelope = in_out;
    envelope.reserve_exact(ENVELOPE_OVERHEAD);
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(tag.as_ref());
    Ok(envelope)
}

/// Authenticate and decrypt an envelope produced by [`seal`].
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] for every failure mode — truncated
/// envelope, wrong key, tampered ciphertext, IV, or tag. The variants are
/// deliberately indistinguishable so a caller relaying the message cannot
/// become a decryption oracle.
pub fn open(envelope: &[u8], key: &SecretKey) -> Result<SecretBuffer, CryptoError> {
    if envelope.len() <= ENVELOPE_OVERHEAD {
        return Err(CryptoError::Decryption);
    }
    let ct_end = envelope.len().saturating_sub(ENVELOPE_OVERHEAD);
    let iv_end = ct_end.saturating_add(IV_LEN);

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&envelope[ct_end..iv_end]);
    let nonce = aead::Nonce::assume_unique_for_key(iv);

    let opening_key = aead_key(key).map_err(|_| CryptoError::Decryption)?;

    // ring expects ciphertext ‖ tag in one buffer.
    let mut ct_tag = Vec::with_capacity(ct_end.saturating_add(TAG_LEN));
    ct_tag.extend_from_slice(&envelope[..ct_end]);
    ct_tag.extend_from_slice(&envelope[iv_end..]);

    let plaintext = opening_key
        .open_in_place(nonce, aead::Aad::empty(), &mut ct_tag)
        .map_err(|_| CryptoError::Decryption)
        .map(|pt| SecretBuffer::new(pt));
    ct_tag.zeroize();
    plaintext
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
