//! The vault engine — key custody, the in-memory record set, and the
//! load/save pipeline gluing codec, crypto, and file replacement together.

use std::path::{Path, PathBuf};

use passkeeper_crypto_core::{derive_master_key, open, seal, SecretKey};
use zeroize::Zeroize;

use crate::codec;
use crate::error::VaultError;
use crate::file;
use crate::record::RecordSet;

/// One open vault: a path, the derived master key, and the records.
///
/// Construction does no I/O; [`set_password`](Self::set_password) must be
/// called before [`load`](Self::load) or [`save`](Self::save). Failures
/// leave the in-memory record set untouched so the caller can fix the
/// problem and retry; the message of the most recent failure stays
/// available through [`last_error`](Self::last_error) for the editor's
/// modal surface.
pub struct VaultEngine {
    path: PathBuf,
    key: Option<SecretKey>,
    records: RecordSet,
    last_error: Option<String>,
}

impl VaultEngine {
    /// Attach an engine to a vault path. No I/O happens here.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: None,
            records: RecordSet::new(),
            last_error: None,
        }
    }

    /// The vault path this engine reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Derive and store the master key for `password`.
    ///
    /// Idempotent; calling again replaces the previous key (the old one is
    /// zeroized on drop).
    pub fn set_password(&mut self, password: &str) {
        self.key = Some(derive_master_key(password));
    }

    /// Read, decrypt, and decode the vault file, replacing the in-memory
    /// record set on success.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NoKey`] before `set_password`,
    /// [`VaultError::FileOpen`] when the file cannot be read, the opaque
    /// decryption failure for a wrong password or damaged envelope, and
    /// [`VaultError::Structure`] for a malformed record sequence. The
    /// record set is untouched on every error path.
    pub fn load(&mut self) -> Result<(), VaultError> {
        let result = self.try_load();
        self.note(result)
    }

    /// Encode, encrypt, and atomically write the record set.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NoKey`] before `set_password`,
    /// [`VaultError::Serialize`] for a codec defect, an encryption error
    /// from the AEAD layer, and the write/swap errors of
    /// [`file::write_vault_file`]. The record set is preserved so the save
    /// can be retried.
    pub fn save(&mut self) -> Result<(), VaultError> {
        let result = self.try_save();
        self.note(result)
    }

    /// The records, in canonical order.
    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Mutable access to the records.
    pub fn records_mut(&mut self) -> &mut RecordSet {
        &mut self.records
    }

    /// The message of the most recent failed operation, if any. Cleared by
    /// the next successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn try_load(&mut self) -> Result<(), VaultError> {
        let key = self.key.as_ref().ok_or(VaultError::NoKey)?;
        let envelope = file::read_vault_file(&self.path)?;
        let payload = open(&envelope, key)?;
        let records = codec::decode_records(payload.expose())?;
        self.records = RecordSet::from_records(records);
        Ok(())
    }

    fn try_save(&mut self) -> Result<(), VaultError> {
        let key = self.key.as_ref().ok_or(VaultError::NoKey)?;
        let mut payload = codec::encode_records(&self.records)?;
        let sealed = seal(&payload, key);
        payload.zeroize();
        let envelope = sealed?;
        file::write_vault_file(&self.path, &envelope)
    }

    fn note(&mut self, result: Result<(), VaultError>) -> Result<(), VaultError> {
        match &result {
            Ok(()) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
