//! Durable, atomic vault file replacement.
//!
//! A save never touches the destination until the new bytes are safely on
//! disk: the envelope is written to a sibling temp file (`{path}_0`,
//! `{path}_1`, …), synced, and only then swapped into place. A reader
//! observes either the old vault or the new one, never a torn write. If the
//! swap itself fails, the error names the temp path so the user can finish
//! the replacement by hand.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Read the entire vault file.
///
/// # Errors
///
/// Returns [`VaultError::FileOpen`] when the path cannot be read.
pub fn read_vault_file(path: &Path) -> Result<Vec<u8>, VaultError> {
    fs::read(path).map_err(|source| VaultError::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace the vault file at `path` with `bytes`.
///
/// # Errors
///
/// Returns [`VaultError::Write`] when the temp file cannot be created or
/// written (the temp is removed), and the recoverable
/// [`VaultError::RemoveOld`] / [`VaultError::Rename`] when the already
/// durable temp cannot be swapped into place (the temp survives).
pub fn write_vault_file(path: &Path, bytes: &[u8]) -> Result<(), VaultError> {
    let (temp_path, mut temp) = create_sibling_temp(path)?;

    if let Err(source) = temp.write_all(bytes).and_then(|()| temp.sync_all()) {
        drop(temp);
        let _ = fs::remove_file(&temp_path);
        return Err(VaultError::Write {
            path: temp_path,
            source,
        });
    }
    drop(temp);

    if path.exists() {
        if let Err(source) = fs::remove_file(path) {
            return Err(VaultError::RemoveOld {
                temp: temp_path,
                source,
            });
        }
    }

    fs::rename(&temp_path, path).map_err(|source| VaultError::Rename {
        temp: temp_path,
        source,
    })
}

/// Create `{path}_{i}` for the smallest `i` not already taken.
///
/// Creation with `create_new` doubles as the existence check, so two
/// concurrent savers always end up on different temp names.
fn create_sibling_temp(path: &Path) -> Result<(PathBuf, File), VaultError> {
    for i in 0u32.. {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!("_{i}"));
        let candidate = PathBuf::from(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(VaultError::Write {
                    path: candidate,
                    source,
                })
            }
        }
    }
    Err(VaultError::Write {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::AlreadyExists, "no free temp name"),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
