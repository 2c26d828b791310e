//! Exodus Core
//!
//! Proof-gated withdrawal engine for a retired legacy ledger: roles, token
//! mappings, the claim registry, state storage and the withdrawal processor.

pub mod claims;
pub mod errors;
pub mod ledger;
pub mod processor;
pub mod quantum;
pub mod registry;
pub mod relay;
pub mod roles;
pub mod storage;

pub use claims::{ClaimRecord, claim_key};
pub use errors::{ErrorCategory, Result, WithdrawalError};
pub use processor::{
    Lifecycle, ProcessorSettings, WithdrawalProcessor, WithdrawalReceipt, lifecycle_of,
};
pub use quantum::{dequantize, quantize};
pub use registry::{NATIVE_ASSET, TokenMapping, TokenMappingEntry};
pub use relay::{RelayError, RootRelay, encode_set_vault_root};
pub use roles::{Role, RoleSet};
pub use storage::{MemoryStore, RocksDbStore, StateBatch, StateStore};
