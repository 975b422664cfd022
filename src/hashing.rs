//! One-way digests for identifiers that must not reach the ledger in cleartext.
//!
//! Phone numbers, application ids, session ids and document ids are reduced
//! to keccak-256 digests before they leave the process. The same input always
//! yields the same digest, so digests double as cross-ledger lookup keys.
//! Surrounding whitespace is ignored; nothing else is normalized.

use alloy::primitives::{hex, keccak256, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::LedgerError;

/// 32-byte digest of a cleartext identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashedIdentifier(B256);

impl HashedIdentifier {
    /// Digest a cleartext identifier.
    pub fn of(cleartext: &str) -> Self {
        Self(keccak256(cleartext.trim().as_bytes()))
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(self.0)
    }
}

impl From<B256> for HashedIdentifier {
    fn from(digest: B256) -> Self {
        Self(digest)
    }
}

impl From<HashedIdentifier> for B256 {
    fn from(id: HashedIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for HashedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedIdentifier({})", self.to_hex())
    }
}

impl FromStr for HashedIdentifier {
    type Err = LedgerError;

    /// Parse an existing digest from hex (not a cleartext identifier).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<B256>()
            .map(Self)
            .map_err(|e| LedgerError::Encoding(format!("malformed digest '{}': {}", s, e)))
    }
}

impl Serialize for HashedIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HashedIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
