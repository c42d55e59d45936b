//! Augur Types - primitive value types for the Augur DAO governance engine.
//!
//! This crate provides the identifiers every governance component shares:
//! - Addresses (20-byte, Bech32m encoded)
//! - Hashes (32-byte, blake3 digests)
//!
//! Token amounts and vote weights are plain `u128` base units (18 decimals)
//! and need no wrapper type.

pub mod address;
pub mod hash;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use error::TypesError;

/// One whole token expressed in base units (10^18).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Convert a whole-token amount into base units, saturating at `u128::MAX`.
pub const fn tokens(whole: u128) -> u128 {
    whole.saturating_mul(TOKEN_UNIT)
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{tokens, Address, Hash, TypesError, TOKEN_UNIT};
}
