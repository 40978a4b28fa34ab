//! Demo data for an empty catalog.
//!
//! Card tokens (number, CVV, code) are produced here on the caller side; the
//! record store stores whatever it is given.

use std::collections::BTreeMap;

use models::{CardFields, CardRecord};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::errors::ServiceError;
use crate::store::CardStore;

pub const CARD_TITLES: [&str; 10] = [
    "Netflix",
    "Apple-Music",
    "Spotify",
    "Apple-TV",
    "Snapchat+",
    "Hulu",
    "Disney-Plus",
    "YouTube-Premium",
    "Amazon-Prime",
    "Steam",
];

pub const DEFAULT_SAMPLE_COUNT: usize = 20;

/// One card with random tokens: 10-digit number, 3-digit CVV, `GIFT-CARD-CODE-NNNN`.
pub fn random_card<R: Rng + ?Sized>(title: &str, value: f64, rng: &mut R) -> CardFields {
    CardFields {
        title: title.to_string(),
        value,
        card_number: format!("{:010}", rng.gen_range(0..10_000_000_000u64)),
        holder: Some("John Doe".to_string()),
        expires: Some("12/25".to_string()),
        cvv: format!("{:03}", rng.gen_range(0..999u32)),
        code: format!("GIFT-CARD-CODE-{:04}", rng.gen_range(0..10_000u32)),
    }
}

/// `count` cards with catalog titles and values from 25 to 120 in steps of 5.
pub fn sample_cards<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<CardFields> {
    (0..count)
        .map(|_| {
            let title = CARD_TITLES.choose(rng).copied().unwrap_or("Netflix");
            let value = f64::from((rng.gen_range(0..20u32) + 5) * 5);
            random_card(title, value, rng)
        })
        .collect()
}

/// Fill an empty store with `count` sample cards. Returns how many were created;
/// a store that already holds records is left alone.
pub async fn seed_if_empty(store: &CardStore, count: usize) -> Result<usize, ServiceError> {
    if !store.list().await.is_empty() {
        return Ok(0);
    }
    let cards = sample_cards(count, &mut rand::thread_rng());
    for card in cards {
        store.create(card).await?;
    }
    info!(count, "sample gift cards generated");
    Ok(count)
}

/// Records grouped by title, titles in sorted order, snapshot order within a group.
pub fn group_by_title(records: &[CardRecord]) -> BTreeMap<String, Vec<CardRecord>> {
    let mut groups: BTreeMap<String, Vec<CardRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.title.clone()).or_default().push(record.clone());
    }
    groups
}
