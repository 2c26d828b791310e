//! Cross-chain vault root relay
//!
//! Accepts `setVaultRoot(uint256)` messages from allow-listed origins and forwards
//! the root to the processor under the relay's own identity. The processor's
//! role and override checks apply unchanged.

use alloy_primitives::{Address, U256, keccak256};
use exodus_proofs::FieldHasher;
use std::collections::HashSet;
use thiserror::Error;

use crate::errors::WithdrawalError;
use crate::processor::WithdrawalProcessor;
use crate::storage::StateStore;

const SET_VAULT_ROOT_SIGNATURE: &str = "setVaultRoot(uint256)";

/// Selector followed by one 32-byte word.
const PAYLOAD_LEN: usize = 4 + 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Unknown message source: chain={chain}, address={address}")]
    UnknownSource { chain: String, address: String },

    #[error("Malformed payload: expected {len} bytes, got {0}", len = PAYLOAD_LEN)]
    MalformedPayload(usize),

    #[error("Unknown command selector 0x{}", hex::encode(.0))]
    UnknownCommand([u8; 4]),

    #[error(transparent)]
    Processor(#[from] WithdrawalError),
}

pub fn set_vault_root_selector() -> [u8; 4] {
    let hash = keccak256(SET_VAULT_ROOT_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build a relay payload carrying `root`.
pub fn encode_set_vault_root(root: U256) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PAYLOAD_LEN);
    payload.extend_from_slice(&set_vault_root_selector());
    payload.extend_from_slice(&root.to_be_bytes::<32>());
    payload
}

pub struct RootRelay {
    address: Address,
    /// (chain, lowercased source address)
    sources: HashSet<(String, String)>,
}

impl RootRelay {
    pub fn new<I, C, A>(address: Address, sources: I) -> Self
    where
        I: IntoIterator<Item = (C, A)>,
        C: Into<String>,
        A: AsRef<str>,
    {
        Self {
            address,
            sources: sources
                .into_iter()
                .map(|(chain, addr)| (chain.into(), addr.as_ref().to_ascii_lowercase()))
                .collect(),
        }
    }

    /// Identity the relay acts under
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_allowed(&self, chain: &str, address: &str) -> bool {
        self.sources
            .contains(&(chain.to_string(), address.to_ascii_lowercase()))
    }

    /// Decode a payload into the root it carries.
    pub fn decode(payload: &[u8]) -> Result<U256, RelayError> {
        if payload.len() != PAYLOAD_LEN {
            return Err(RelayError::MalformedPayload(payload.len()));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&payload[..4]);
        if selector != set_vault_root_selector() {
            return Err(RelayError::UnknownCommand(selector));
        }
        Ok(U256::from_be_slice(&payload[4..]))
    }

    /// Check the origin, decode, and forward the root.
    pub fn handle_message<S: StateStore, H: FieldHasher>(
        &self,
        processor: &mut WithdrawalProcessor<S, H>,
        source_chain: &str,
        source_address: &str,
        payload: &[u8],
    ) -> Result<U256, RelayError> {
        if !self.is_allowed(source_chain, source_address) {
            log::warn!("Relay message dropped from {source_chain}/{source_address}");
            return Err(RelayError::UnknownSource {
                chain: source_chain.to_string(),
                address: source_address.to_string(),
            });
        }

        let root = Self::decode(payload)?;
        processor.set_vault_root(self.address, root)?;
        log::info!("Relayed vault root {root:#x} from {source_chain}");
        Ok(root)
    }
}
