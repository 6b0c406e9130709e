use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── ValidatorKey ─────────────────────────────────────────────────────────────

/// 32-byte validator public key. The unique, immutable identity of a
/// validator; descriptors are compared by equality of this key only
/// (signature verification happens before a descriptor reaches this crate).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorKey(pub [u8; 32]);

impl ValidatorKey {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != 32 {
            return Err(bs58::decode::Error::BufferTooSmall);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorKey({})", &self.to_b58()[..8])
    }
}

// ── ValidatorDescriptor ──────────────────────────────────────────────────────

/// A validator as submitted at registration time.
///
/// `name` is immutable once first recorded for a given key; `core_address`
/// (and `voting_power`, submitted alongside it) may be re-registered at any
/// time, before or after genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDescriptor {
    pub public_key: ValidatorKey,
    pub name: String,
    pub voting_power: u64,
    /// Consensus-core endpoint of the validator (host:port).
    pub core_address: String,
}

// ── GenesisDocument ──────────────────────────────────────────────────────────

/// The canonical genesis document: the creation timestamp captured at the
/// instant of finalization plus the initial validator set.
///
/// `genesis_time` never changes once the document exists. The validator set
/// always has exactly the configured threshold of entries, kept sorted by
/// public key so repeated queries and reloads observe the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDocument {
    pub genesis_time: DateTime<Utc>,
    pub validators: Vec<ValidatorDescriptor>,
}

impl GenesisDocument {
    /// Build a document from a registration snapshot, normalising the
    /// validator order (sorted by public key bytes).
    pub fn new(
        genesis_time: DateTime<Utc>,
        mut validators: Vec<ValidatorDescriptor>,
    ) -> Self {
        validators.sort_by(|a, b| a.public_key.cmp(&b.public_key));
        Self {
            genesis_time,
            validators,
        }
    }

    /// Look up a validator entry by key.
    pub fn validator(&self, key: &ValidatorKey) -> Option<&ValidatorDescriptor> {
        self.validators.iter().find(|v| &v.public_key == key)
    }
}
