use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solstice_core::types::{GenesisDocument, ValidatorDescriptor, ValidatorKey};
use solstice_rendezvous::StoreStatus;

/// Wire form of a validator descriptor. The public key travels as a base-58
/// string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcValidator {
    pub public_key: String,
    pub name: String,
    pub voting_power: u64,
    pub core_address: String,
}

impl From<&ValidatorDescriptor> for RpcValidator {
    fn from(v: &ValidatorDescriptor) -> Self {
        Self {
            public_key: v.public_key.to_b58(),
            name: v.name.clone(),
            voting_power: v.voting_power,
            core_address: v.core_address.clone(),
        }
    }
}

impl TryFrom<RpcValidator> for ValidatorDescriptor {
    type Error = bs58::decode::Error;

    fn try_from(v: RpcValidator) -> Result<Self, Self::Error> {
        Ok(Self {
            public_key: ValidatorKey::from_b58(&v.public_key)?,
            name: v.name,
            voting_power: v.voting_power,
            core_address: v.core_address,
        })
    }
}

/// Wire form of the genesis document returned by `bootstrap_registerValidator`
/// and `bootstrap_queryGenesis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcGenesisDocument {
    pub genesis_time: DateTime<Utc>,
    pub validators: Vec<RpcValidator>,
}

impl From<&GenesisDocument> for RpcGenesisDocument {
    fn from(doc: &GenesisDocument) -> Self {
        Self {
            genesis_time: doc.genesis_time,
            validators: doc.validators.iter().map(RpcValidator::from).collect(),
        }
    }
}

impl TryFrom<RpcGenesisDocument> for GenesisDocument {
    type Error = bs58::decode::Error;

    fn try_from(doc: RpcGenesisDocument) -> Result<Self, Self::Error> {
        let validators = doc
            .validators
            .into_iter()
            .map(ValidatorDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // The coordinator already keeps validators sorted; `new` re-sorts so
        // a decoded document is identical to the coordinator's copy.
        Ok(GenesisDocument::new(doc.genesis_time, validators))
    }
}

/// Registration progress returned by `bootstrap_getStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcBootstrapStatus {
    pub registered: usize,
    pub threshold: usize,
    pub finalized: bool,
}

impl From<StoreStatus> for RpcBootstrapStatus {
    fn from(s: StoreStatus) -> Self {
        Self {
            registered: s.registered,
            threshold: s.threshold,
            finalized: s.finalized,
        }
    }
}
