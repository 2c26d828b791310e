//! Error definitions for the withdrawal processor.
use alloy_primitives::{Address, U256};
use exodus_proofs::ProofError;
use thiserror::Error;

use crate::roles::Role;

/// Broad class of a failure, used for reporting and operator triage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller lacks the required role
    Authorization,
    /// Paused, or not yet configured
    Liveness,
    /// Proof length or parity out of bounds
    InputShape,
    /// Decoded values fail validity checks
    InputContent,
    /// Path does not hash to the expected root
    Cryptographic,
    /// Already claimed, unresolved asset, zero amount, overflow
    BusinessInvariant,
    /// Insufficient balance or rejected transfer
    Transfer,
    /// Backing store failure
    Storage,
}

/// Errors raised by the withdrawal processor and its registries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("Unauthorized: {caller} lacks role {role}")]
    Unauthorized { caller: Address, role: Role },

    #[error("Processor is paused")]
    Paused,

    #[error("Processor is not paused")]
    NotPaused,

    #[error("Processor not initialized")]
    NotInitialized,

    #[error("Processor already initialized")]
    AlreadyInitialized,

    #[error("Vault root not set")]
    VaultRootNotSet,

    #[error("Account root not set")]
    AccountRootNotSet,

    /// Root already committed and overrides are disabled
    #[error("Root already set and override is not allowed")]
    RootAlreadySet,

    #[error("Recipient must not be the zero address")]
    ZeroRecipient,

    #[error("Address must not be zero")]
    ZeroAddress,

    #[error("Root must not be zero")]
    ZeroRoot,

    /// Vault roots live in the STARK field
    #[error("Vault root is not a field element: {0:#x}")]
    InvalidRoot(U256),

    #[error("Quantum out of range (0, 2^128): {0}")]
    InvalidQuantum(U256),

    #[error("Asset address for id {asset_id:#x} must not be zero")]
    ZeroAssetAddress { asset_id: U256 },

    #[error("Asset id {0:#x} appears more than once in the batch")]
    DuplicateMapping(U256),

    #[error("Amount {amount} is not a multiple of quantum {quantum}")]
    InexactQuantization { amount: U256, quantum: U256 },

    #[error(transparent)]
    Proof(#[from] ProofError),

    /// The proof is valid for some tree, but not the one we trust
    #[error("Vault root mismatch: stored {stored:#x}, proof claims {claimed:#x}")]
    VaultRootMismatch { stored: U256, claimed: U256 },

    #[error("Vault has zero balance")]
    ZeroBalance,

    #[error("Asset id {0:#x} is not mapped")]
    AssetNotMapped(U256),

    #[error("Asset id {0:#x} is already mapped")]
    AssetAlreadyMapped(U256),

    #[error("Withdrawal already processed: owner_key={owner_key:#x}, asset_id={asset_id:#x}")]
    AlreadyProcessed { owner_key: U256, asset_id: U256 },

    #[error("Quantum overflow: {quantized} * {quantum}")]
    QuantumOverflow { quantized: U256, quantum: U256 },

    #[error("Insufficient balance of {asset}: available {available}, required {required}")]
    InsufficientBalance {
        asset: Address,
        available: U256,
        required: U256,
    },

    #[error("Balance overflow crediting {holder}")]
    BalanceOverflow { holder: Address },

    /// Recipient refuses inbound native value
    #[error("Transfer to {recipient} rejected")]
    TransferRejected { recipient: Address },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WithdrawalError {
    pub fn category(&self) -> ErrorCategory {
        use WithdrawalError::*;
        match self {
            Unauthorized { .. } => ErrorCategory::Authorization,
            Paused | NotPaused | NotInitialized | VaultRootNotSet | AccountRootNotSet => {
                ErrorCategory::Liveness
            }
            ZeroRecipient
            | ZeroAddress
            | ZeroRoot
            | InvalidRoot(_)
            | InvalidQuantum(_)
            | ZeroAssetAddress { .. }
            | DuplicateMapping(_)
            | InexactQuantization { .. } => ErrorCategory::InputContent,
            Proof(e) => proof_category(e),
            VaultRootMismatch { .. } => ErrorCategory::Cryptographic,
            AlreadyInitialized
            | RootAlreadySet
            | ZeroBalance
            | AssetNotMapped(_)
            | AssetAlreadyMapped(_)
            | AlreadyProcessed { .. }
            | QuantumOverflow { .. } => ErrorCategory::BusinessInvariant,
            InsufficientBalance { .. } | BalanceOverflow { .. } | TransferRejected { .. } => {
                ErrorCategory::Transfer
            }
            Storage(_) => ErrorCategory::Storage,
        }
    }
}

fn proof_category(err: &ProofError) -> ErrorCategory {
    match err {
        ProofError::ProofTooShort { .. }
        | ProofError::ProofTooLong { .. }
        | ProofError::ProofLengthOdd { .. }
        | ProofError::VaultIdOutOfRange { .. }
        | ProofError::InvalidTreeHeight(_)
        | ProofError::EmptyTree => ErrorCategory::InputShape,
        ProofError::BadKeyOrAsset { .. } | ProofError::InvalidFieldElement(_) => {
            ErrorCategory::InputContent
        }
        ProofError::BadMerklePath { .. } | ProofError::InvalidAccountProof { .. } => {
            ErrorCategory::Cryptographic
        }
    }
}

impl From<anyhow::Error> for WithdrawalError {
    fn from(err: anyhow::Error) -> Self {
        WithdrawalError::Storage(format!("{err:#}"))
    }
}

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, WithdrawalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            WithdrawalError::Unauthorized {
                caller: Address::ZERO,
                role: Role::Disburse
            }
            .category(),
            ErrorCategory::Authorization
        );
        assert_eq!(WithdrawalError::Paused.category(), ErrorCategory::Liveness);
        assert_eq!(
            WithdrawalError::VaultRootNotSet.category(),
            ErrorCategory::Liveness
        );
        assert_eq!(
            WithdrawalError::from(ProofError::ProofTooShort { len: 2 }).category(),
            ErrorCategory::InputShape
        );
        assert_eq!(
            WithdrawalError::from(ProofError::BadMerklePath { row: 3 }).category(),
            ErrorCategory::Cryptographic
        );
        assert_eq!(
            WithdrawalError::AlreadyProcessed {
                owner_key: U256::from(1u64),
                asset_id: U256::from(2u64)
            }
            .category(),
            ErrorCategory::BusinessInvariant
        );
        assert_eq!(
            WithdrawalError::TransferRejected {
                recipient: Address::ZERO
            }
            .category(),
            ErrorCategory::Transfer
        );
    }

    #[test]
    fn test_already_processed_message_carries_both_fields() {
        let err = WithdrawalError::AlreadyProcessed {
            owner_key: U256::from(0xabu64),
            asset_id: U256::from(0xcdu64),
        };
        assert_eq!(
            err.to_string(),
            "Withdrawal already processed: owner_key=0xab, asset_id=0xcd"
        );
    }

    #[test]
    fn test_storage_from_anyhow() {
        let err: WithdrawalError = anyhow::anyhow!("disk gone").into();
        assert_eq!(err, WithdrawalError::Storage("disk gone".into()));
        assert_eq!(err.category(), ErrorCategory::Storage);
    }
}
