use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 32-byte blake3 digest.
///
/// Used as the content identifier of queued timelock transactions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Self = Self([0u8; 32]);
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| TypesError::InvalidHashLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Compute blake3 hash of data
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute blake3 hash over several slices, each prefixed with its
    /// length so that `["ab", "c"]` and `["a", "bc"]` hash differently.
    pub fn compute_fields(fields: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl FromStr for Hash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_compute() {
        let hash = Hash::compute(b"queue");
        assert!(!hash.is_zero());
        assert_eq!(hash, Hash::compute(b"queue"));
        assert_ne!(hash, Hash::compute(b"queue!"));
    }

    #[test]
    fn test_compute_fields_is_length_prefixed() {
        let a = Hash::compute_fields(&[b"ab", b"c"]);
        let b = Hash::compute_fields(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_hex_parse() {
        let hash = Hash::compute(b"test");
        let parsed: Hash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
        assert!(Hash::from_str("0xabcd").is_err());
    }

    proptest! {
        #[test]
        fn prop_distinct_field_splits_differ(data in proptest::collection::vec(any::<u8>(), 2..64), split in 1usize..63) {
            let split = split.min(data.len() - 1);
            let (left, right) = data.split_at(split);
            prop_assert_ne!(
                Hash::compute_fields(&[left, right]),
                Hash::compute_fields(&[&data[..], &[][..]])
            );
        }
    }
}
