//! Persisted session state.

use serde::{Deserialize, Serialize};

/// Progress persisted between sessions.
///
/// Terrain is regenerated from `seed` and entities are spawned fresh on load,
/// so only the player and quest counters are stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    /// Seed the terrain was generated from.
    pub seed: u32,
    /// Player statistics and position.
    pub player: SavedPlayer,
    /// Coins collected toward the quest target.
    pub quest_progress: u32,
    /// Indicates whether the quest reward was already granted.
    pub quest_completed: bool,
}

/// Persisted player record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlayer {
    /// Column of the player's cell.
    pub x: u32,
    /// Row of the player's cell.
    pub y: u32,
    /// Current health.
    pub hp: u32,
    /// Maximum health.
    pub max_hp: u32,
    /// Current mana.
    pub mp: u32,
    /// Maximum mana.
    pub max_mp: u32,
    /// Coins carried.
    pub coins: u32,
    /// Potions collected.
    pub potions: u32,
    /// Current level.
    pub level: u32,
    /// Experience toward the next level.
    pub experience: u32,
}
