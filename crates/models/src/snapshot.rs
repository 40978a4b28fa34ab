use serde::{Deserialize, Serialize};

use crate::card::CardRecord;

fn default_next_id() -> u64 { 1 }

/// The whole persisted state: every record plus the id counter.
///
/// Serialized as `{ "giftCards": [...], "nextId": n }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub gift_cards: Vec<CardRecord>,
    #[serde(default = "default_next_id")]
    pub next_id: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self { gift_cards: Vec::new(), next_id: default_next_id() }
    }
}

impl Snapshot {
    pub fn position(&self, id: u64) -> Option<usize> {
        self.gift_cards.iter().position(|c| c.id == id)
    }

    pub fn find(&self, id: u64) -> Option<&CardRecord> {
        self.gift_cards.iter().find(|c| c.id == id)
    }
}
