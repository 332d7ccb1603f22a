//! Vault error types for `passkeeper-vault`.

use std::io;
use std::path::PathBuf;

use passkeeper_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by vault operations.
///
/// The two post-write variants ([`VaultError::RemoveOld`] and
/// [`VaultError::Rename`]) are recoverable: the freshly written temp file
/// survives and its path is part of the message so the user can finish the
/// replacement by hand.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Cryptographic operation failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// An operation needed the master key before `set_password` was called.
    #[error("no master password set")]
    NoKey,

    /// The vault file cannot be read.
    #[error("cannot open vault file {}: {source}", path.display())]
    FileOpen {
        /// The vault path that failed to open.
        path: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The decrypted payload is not a well-formed record sequence.
    #[error("vault structure corrupted: {0}")]
    Structure(String),

    /// Record encoding produced an unexpected length.
    #[error("record serialization failed: {0}")]
    Serialize(String),

    /// OS write error on the temp file; the temp has been removed.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        /// The temp path that failed to write.
        path: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The old vault file could not be removed. The new vault survives at
    /// the temp path.
    #[error(
        "cannot remove the old vault file: {source}; the new vault is intact at {}",
        temp.display()
    )]
    RemoveOld {
        /// The surviving temp path holding the new vault.
        temp: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },

    /// The temp file could not be renamed onto the vault path. The new
    /// vault survives at the temp path.
    #[error(
        "cannot rename the new vault into place: {source}; the new vault is intact at {}",
        temp.display()
    )]
    Rename {
        /// The surviving temp path holding the new vault.
        temp: PathBuf,
        /// The underlying OS error.
        source: io::Error,
    },
}
