//! Experience curve, leveling and the coin quest.

use tilequest_core::ProgressionRules;

/// Experience required to advance from `level` to the next level:
/// `floor(base * level^exponent)`.
#[must_use]
pub fn experience_needed_for(level: u32, rules: &ProgressionRules) -> u32 {
    let needed = (rules.experience_base * f64::from(level).powf(rules.experience_exponent)).floor();
    if needed <= 0.0 {
        0
    } else if needed >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        needed as u32
    }
}

/// Player level and the experience accumulated toward the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    level: u32,
    experience: u32,
}

impl Progress {
    /// Level one with no experience.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }

    /// Restores a persisted level and experience without normalizing them.
    #[must_use]
    pub const fn restore(level: u32, experience: u32) -> Self {
        Self { level, experience }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience accumulated toward the next level.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Experience still required for the next level, or zero at the cap.
    #[must_use]
    pub fn experience_to_next(&self, rules: &ProgressionRules) -> u32 {
        if self.level >= rules.max_level {
            0
        } else {
            experience_needed_for(self.level, rules).saturating_sub(self.experience)
        }
    }

    /// Adds experience and performs every level-up it pays for.
    ///
    /// Returns the number of levels gained. Experience granted at the level cap
    /// is discarded, and reaching the cap clears any remainder.
    pub fn grant(&mut self, amount: u32, rules: &ProgressionRules) -> u32 {
        if self.level >= rules.max_level {
            self.experience = 0;
            return 0;
        }

        let starting_level = self.level;
        self.experience = self.experience.saturating_add(amount);

        while self.level < rules.max_level {
            let needed = experience_needed_for(self.level, rules);
            if self.experience < needed {
                break;
            }
            self.experience -= needed;
            self.level += 1;
        }

        if self.level >= rules.max_level {
            self.experience = 0;
        }

        self.level - starting_level
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of recording a coin against the quest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestUpdate {
    /// The quest was already complete; nothing changed.
    Unchanged,
    /// Progress moved forward without reaching the target.
    Advanced {
        /// Progress after the coin.
        progress: u32,
    },
    /// The coin reached the target; the reward is due.
    Completed {
        /// Progress after the coin, equal to the target.
        progress: u32,
    },
}

/// Coin-collection quest with a single-fire reward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quest {
    progress: u32,
    completed: bool,
}

impl Quest {
    /// Restores persisted quest counters.
    #[must_use]
    pub const fn restore(progress: u32, completed: bool) -> Self {
        Self {
            progress,
            completed,
        }
    }

    /// Coins counted toward the target.
    #[must_use]
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Indicates whether the reward was already granted.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Counts one coin toward `target`, capping progress at the target.
    pub fn record_coin(&mut self, target: u32) -> QuestUpdate {
        if self.completed {
            return QuestUpdate::Unchanged;
        }

        self.progress = self.progress.saturating_add(1).min(target);
        if self.progress >= target {
            self.completed = true;
            QuestUpdate::Completed {
                progress: self.progress,
            }
        } else {
            QuestUpdate::Advanced {
                progress: self.progress,
            }
        }
    }

    /// Clears progress so the quest can be completed once more.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
