//! Serializable round snapshot for presentation layers.

use crate::cursor::CursorPhase;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a presentation layer needs to draw the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub generation: u64,
    pub winning_start: ItemId,
    pub run_length: u32,
    pub locked_ids: BTreeSet<ItemId>,
    pub order: Vec<ItemId>,
    pub navigable_len: usize,
    pub order_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<ItemId>,
    pub viewed_ids: BTreeSet<ItemId>,
    pub phase: CursorPhase,
    pub is_navigating: bool,
    pub is_image_visible: bool,
    pub win: bool,
    pub unwinnable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degenerate: Option<String>,
}

impl RoundView {
    /// `viewed/total` counter shown in the header.
    pub fn progress(&self) -> (usize, usize) {
        (self.viewed_ids.len(), self.order.len())
    }
}
