//! Secret containers for key material and decrypted payloads.
//!
//! This module provides:
//! - [`SecretKey`] — fixed 32-byte derived key, zeroized on drop
//! - [`SecretBuffer`] — variable-length secret data, zeroized on drop
//!
//! Both mask their contents in `Debug`/`Display` so a stray log line or
//! panic message cannot leak bytes.

use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a derived symmetric key in bytes (256 bits).
pub const SECRET_KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// SecretKey — fixed-size
// ---------------------------------------------------------------------------

/// A derived 256-bit symmetric key.
///
/// The bytes are erased when the value goes out of scope. There is no
/// serialization surface on purpose — the key never leaves the process.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SECRET_KEY_LEN],
}

impl SecretKey {
    /// Wrap raw key bytes. The caller should zeroize its own copy afterwards.
    #[must_use]
    pub const fn new(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Expose the raw key bytes for a cryptographic operation.
    ///
    /// Keep exposure minimal — prefer using the slice within a single
    /// expression rather than binding it to a long-lived variable.
    #[must_use]
    pub const fn bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer — variable-length
// ---------------------------------------------------------------------------

/// Variable-length buffer for sensitive data (decrypted vault payloads).
///
/// Wraps [`SecretSlice<u8>`] from the `secrecy` crate, which zeroizes the
/// allocation on drop and keeps accidental exposure behind an explicit call.
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
}

impl SecretBuffer {
    /// Create a new `SecretBuffer` from the given data.
    ///
    /// The data is copied into a new allocation; the caller should zeroize
    /// the source afterwards.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self {
            inner: data.to_vec().into(),
        }
    }

    /// Expose the underlying bytes. Use sparingly — only when the raw
    /// bytes are needed for parsing or a cryptographic operation.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Returns the number of bytes in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
