//! Cryptographic error types for `passkeeper-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The system CSPRNG refused to produce bytes.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// Key derivation failed (key length validation, KDF primitive).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption failure (AES-256-GCM setup or seal).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption failed. Wrong password, tampered ciphertext, and truncated
    /// envelopes all map here — callers must not be able to tell them apart.
    #[error("decryption failed: wrong password or file corruption")]
    Decryption,

    /// Invalid generator parameter (zero modulo, out-of-range bit count).
    #[error("generation error: {0}")]
    Generation(String),
}
