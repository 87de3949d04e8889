//! JSON codec and validation for persisted sessions.

use thiserror::Error;
use tilequest_core::{CellCoord, ProgressionRules, Rules, SaveState, SavedPlayer};

use crate::{
    progression::{experience_needed_for, Quest},
    terrain::Terrain,
};

/// Reasons a persisted session cannot be restored.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The document is not a valid save.
    #[error("malformed save document: {0}")]
    Json(#[from] serde_json::Error),
    /// The player stands outside the grid or on blocked terrain.
    #[error("player position ({x}, {y}) is not walkable")]
    InvalidPosition {
        /// Saved column.
        x: u32,
        /// Saved row.
        y: u32,
    },
    /// The level lies outside `1..=max`.
    #[error("level {level} is outside 1..={max}")]
    InvalidLevel {
        /// Saved level.
        level: u32,
        /// Highest reachable level.
        max: u32,
    },
    /// Health exceeds its maximum.
    #[error("health {hp} exceeds maximum {max_hp}")]
    InvalidHealth {
        /// Saved health.
        hp: u32,
        /// Saved maximum health.
        max_hp: u32,
    },
    /// Experience already pays for the next level.
    #[error("experience {experience} at level {level} must stay below {needed}")]
    InvalidExperience {
        /// Saved experience.
        experience: u32,
        /// Saved level.
        level: u32,
        /// Threshold for the saved level.
        needed: u32,
    },
    /// Quest progress exceeds the target.
    #[error("quest progress {progress} exceeds target {target}")]
    InvalidQuest {
        /// Saved progress.
        progress: u32,
        /// Configured target.
        target: u32,
    },
}

/// Serializes the state as a JSON document.
pub fn encode(state: &SaveState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(state)?)
}

/// Parses a JSON document into a save state without validating it.
pub fn decode(document: &str) -> Result<SaveState, PersistenceError> {
    Ok(serde_json::from_str(document)?)
}

/// Checks a saved player against the regenerated terrain and the rules.
pub fn validate_player(
    player: &SavedPlayer,
    terrain: &Terrain,
    rules: &Rules,
) -> Result<(), PersistenceError> {
    if !terrain.is_walkable(CellCoord::new(player.x, player.y)) {
        return Err(PersistenceError::InvalidPosition {
            x: player.x,
            y: player.y,
        });
    }

    let max = rules.progression.max_level;
    if player.level == 0 || player.level > max {
        return Err(PersistenceError::InvalidLevel {
            level: player.level,
            max,
        });
    }

    if player.hp > player.max_hp {
        return Err(PersistenceError::InvalidHealth {
            hp: player.hp,
            max_hp: player.max_hp,
        });
    }

    if player.level < max {
        let needed = experience_needed_for(player.level, &rules.progression);
        if player.experience >= needed {
            return Err(PersistenceError::InvalidExperience {
                experience: player.experience,
                level: player.level,
                needed,
            });
        }
    }

    Ok(())
}

pub(crate) fn restore_quest(
    state: &SaveState,
    rules: &ProgressionRules,
) -> Result<Quest, PersistenceError> {
    if state.quest_progress > rules.quest_target {
        return Err(PersistenceError::InvalidQuest {
            progress: state.quest_progress,
            target: rules.quest_target,
        });
    }

    Ok(Quest::restore(state.quest_progress, state.quest_completed))
}
