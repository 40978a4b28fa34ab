//! Gift card data model shared by the store, its backends and the HTTP layer.
//! - `card`: the persisted record plus its create/merge inputs.
//! - `snapshot`: the unit that is loaded and saved as a whole.

pub mod card;
pub mod snapshot;

pub use card::{CardFields, CardPatch, CardRecord, DeleteReceipt};
pub use snapshot::Snapshot;
