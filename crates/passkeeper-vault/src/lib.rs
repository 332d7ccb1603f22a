//! `passkeeper-vault` — The storage engine behind the PassKeeper editor.
//!
//! A vault is one encrypted file: a tag-length-value record sequence sealed
//! with AES-256-GCM under a key derived from the master password. This crate
//! owns the record model, the wire codec, the atomic file replacement
//! protocol, and the engine that ties them together.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod codec;
pub mod engine;
pub mod error;
pub mod file;
pub mod record;

pub use engine::VaultEngine;
pub use error::VaultError;
pub use record::{CellRole, Record, RecordSet};
