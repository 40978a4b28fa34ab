use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `null` reads as the type's default. Older documents carry `"value": null`
/// for unparseable prices and explicit nulls for blank tokens.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored gift card.
///
/// `id` and `created_at` are assigned by the store and never change;
/// `updated_at` stays `None` until the first merge.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub card_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cvv: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create input: everything the caller supplies, without `id`/timestamps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardFields {
    pub title: String,
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub card_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cvv: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
}

/// Merge input for updates. Only fields that are `Some` overwrite.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Response body for a successful delete.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    pub message: String,
    pub deleted_card: CardRecord,
}

impl CardRecord {
    /// Build a fresh record from caller fields.
    pub fn new(id: u64, fields: CardFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            value: fields.value,
            card_number: fields.card_number,
            holder: fields.holder,
            expires: fields.expires,
            cvv: fields.cvv,
            code: fields.code,
            created_at,
            updated_at: None,
        }
    }

    /// Overwrite the fields present in `patch` and stamp `updated_at`.
    pub fn apply(&mut self, patch: CardPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title { self.title = title; }
        if let Some(value) = patch.value { self.value = value; }
        if let Some(card_number) = patch.card_number { self.card_number = card_number; }
        if let Some(holder) = patch.holder { self.holder = Some(holder); }
        if let Some(expires) = patch.expires { self.expires = Some(expires); }
        if let Some(cvv) = patch.cvv { self.cvv = cvv; }
        if let Some(code) = patch.code { self.code = code; }
        self.updated_at = Some(now);
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub fn matches(&self, needle: &str, include_holder: bool) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.code.to_lowercase().contains(needle)
            || (include_holder
                && self
                    .holder
                    .as_deref()
                    .map(|h| h.to_lowercase().contains(needle))
                    .unwrap_or(false))
    }
}

impl DeleteReceipt {
    pub fn new(deleted_card: CardRecord) -> Self {
        Self { message: "Gift card deleted successfully".to_string(), deleted_card }
    }
}
