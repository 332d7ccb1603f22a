//! `passkeeper-crypto-core` — Pure cryptographic primitives for PassKeeper.
//!
//! This crate is the audit target: zero I/O beyond the system CSPRNG, zero
//! async, zero UI dependencies. Everything that decides confidentiality,
//! integrity, or randomness quality lives here.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod kdf;
pub mod symmetric;

pub mod entropy;
pub mod generate;

pub use entropy::EntropyPool;
pub use error::CryptoError;
pub use generate::{
    make_hex_block, make_name, make_number, make_password, make_pin, PASSWORD_ALPHABET,
};
pub use kdf::{derive_master_key, KDF_ITERATIONS, KDF_SALT};
pub use memory::{SecretBuffer, SecretKey};
pub use symmetric::{open, seal, ENVELOPE_OVERHEAD, IV_LEN, KEY_LEN, TAG_LEN};
