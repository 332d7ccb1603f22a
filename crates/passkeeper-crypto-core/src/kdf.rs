//! Master-password key derivation.
//!
//! PBKDF2-HMAC-SHA256 with a fixed salt and a single iteration, producing
//! the 256-bit AES key. The parameters are frozen: every vault ever written
//! was keyed with exactly these, so changing any of them silently would make
//! existing files unreadable. The single iteration is an inherited format
//! decision, not a tunable (see DESIGN.md).

use core::num::NonZeroU32;

use ring::pbkdf2;
use zeroize::Zeroize;

use crate::memory::{SecretKey, SECRET_KEY_LEN};

/// KDF salt — 25 ASCII bytes, no terminator. Frozen.
pub const KDF_SALT: &[u8; 25] = b"PassKeeper key generation";

/// KDF iteration count. Frozen at 1.
pub const KDF_ITERATIONS: NonZeroU32 = NonZeroU32::MIN;

/// Derive the vault master key from the master password.
///
/// Deterministic across runs and platforms — the same password always
/// yields the same key. Strength against offline guessing comes from the
/// password itself, not from the KDF cost.
#[must_use]
pub fn derive_master_key(password: &str) -> SecretKey {
    let mut out = [0u8; SECRET_KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        KDF_ITERATIONS,
        KDF_SALT,
        password.as_bytes(),
        &mut out,
    );
    let key = SecretKey::new(out);
    out.zeroize();
    key
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_master_key("correct horse battery staple");
        let b = derive_master_key("correct horse battery staple");
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let a = derive_master_key("abc");
        let b = derive_master_key("abd");
        assert_ne!(a.bytes(), b.bytes());
    }

    // Known-answer vectors computed with an independent PBKDF2-HMAC-SHA256
    // implementation over the frozen salt and iteration count.

    #[test]
    fn known_answer_hunter2() {
        let key = derive_master_key("hunter2");
        assert_eq!(
            hex(key.bytes()),
            "f0bedc6adaf120b827340ab245c8d4615ce7a361c39bb2be5b20ec930dba7da4"
        );
    }

    #[test]
    fn known_answer_abc() {
        let key = derive_master_key("abc");
        assert_eq!(
            hex(key.bytes()),
            "14fa4f678e3e2b7f7d81de7da98de9e2e1709f5f4d32df938f012d527ad8e6be"
        );
    }

    #[test]
    fn known_answer_empty_password() {
        let key = derive_master_key("");
        assert_eq!(
            hex(key.bytes()),
            "890bd705d3f9cf9753af761d847b35cae254bc59a7b8e7005dacde1af8d7469f"
        );
    }

    #[test]
    fn salt_is_frozen() {
        assert_eq!(KDF_SALT.len(), 25);
        assert_eq!(&KDF_SALT[..], b"PassKeeper key generation".as_slice());
        assert_eq!(KDF_ITERATIONS.get(), 1);
    }
}
