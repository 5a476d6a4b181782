//! Items and the validated roster a round is played over.

use crate::error::{LoteriaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Item identifier. Valid ids are `1..=N`.
pub type ItemId = u32;

/// One card of the deck, supplied by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub image_url: String,
    pub description: String,
}

impl Item {
    pub fn new(id: ItemId, image_url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            image_url: image_url.into(),
            description: description.into(),
        }
    }
}

/// The full deck, keyed by id.
///
/// Construction guarantees the ids are exactly `1..=N` with `N >= 1`, which
/// is what every round algorithm assumes.
#[derive(Debug, Clone)]
pub struct Roster {
    items: BTreeMap<ItemId, Item>,
}

impl Roster {
    /// Validates a fetched item collection. Input order is irrelevant.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        if items.is_empty() {
            return Err(LoteriaError::data_unavailable("no items found"));
        }

        let mut by_id = BTreeMap::new();
        for item in items {
            if item.id == 0 {
                return Err(LoteriaError::invalid_roster("item id 0 is not allowed"));
            }
            let id = item.id;
            if by_id.insert(id, item).is_some() {
                return Err(LoteriaError::invalid_roster(format!("duplicate item id {}", id)));
            }
        }

        let total = by_id.len() as ItemId;
        if let Some((&max_id, _)) = by_id.last_key_value() {
            if max_id != total {
                return Err(LoteriaError::invalid_roster(format!(
                    "ids must be 1..={} but the largest is {}",
                    total, max_id
                )));
            }
        }

        Ok(Self { items: by_id })
    }

    /// Parses a JSON array of items.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let items: Vec<Item> = serde_json::from_str(raw)?;
        Self::from_items(items)
    }

    /// Loads a JSON array of items from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Builds a placeholder deck of `n` items (for simulation).
    pub fn synthetic(n: u32) -> Result<Self> {
        let items = (1..=n)
            .map(|id| Item::new(id, format!("cards/{:03}.png", id), format!("Card {}", id)))
            .collect();
        Self::from_items(items)
    }

    /// Total number of items, `N`.
    pub fn len(&self) -> u32 {
        self.items.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }
}
