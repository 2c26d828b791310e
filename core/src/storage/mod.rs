pub mod db;
pub mod memory;
pub mod state;

pub use db::RocksDbStore;
pub use memory::MemoryStore;
pub use state::{ProcessorMeta, StateBatch, StateStore, mint, set_rejects_native};
