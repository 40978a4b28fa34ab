//! Record store for gift cards.
//! - `store::CardStore` owns CRUD and search over one snapshot.
//! - `storage` holds the pluggable persistence backends (flat JSON file, key/value slot).
//! - `sample` generates demo cards on the caller side; the store never invents card tokens.

pub mod errors;
pub mod sample;
pub mod storage;
pub mod store;

pub use errors::ServiceError;
pub use storage::{json_file::JsonFileBackend, kv_slot::KvSlotBackend, SnapshotBackend};
pub use store::{CardStore, SearchScope};
