//! Run progress across dungeons: completion count and boss unlock.
//!
//! The session controller never reads this directly; callers turn it into a
//! `SessionRequest` (boss-mode flag) so generation stays testable without it.

use serde::{Deserialize, Serialize};

use crate::options::{DungeonRun, Upgrade};

/// Something observers of progress should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Enough dungeons are complete; the boss dungeon can be entered.
    BossDungeonAvailable,
    /// The boss dungeon has been cleared (the run is won).
    BossDungeonCompleted,
    /// A regular dungeon was cleared and grants its reward.
    UpgradeGranted(Upgrade),
}

/// Dungeon completion state for one playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonProgress {
    dungeons_completed: u32,
    dungeons_needed_for_boss: u32,
    boss_available: bool,
    boss_completed: bool,
}

impl Default for DungeonProgress {
    fn default() -> Self {
        Self::new(3)
    }
}

impl DungeonProgress {
    pub fn new(dungeons_needed_for_boss: u32) -> Self {
        Self {
            dungeons_completed: 0,
            dungeons_needed_for_boss,
            boss_available: false,
            boss_completed: false,
        }
    }

    /// Record that the current dungeon was cleared.
    ///
    /// Clearing while the boss dungeon is open completes the boss instead of
    /// counting. Otherwise `run` (when known) grants its upgrade, the count
    /// goes up and the boss unlocks once the threshold is reached.
    pub fn complete_dungeon(&mut self, run: Option<&DungeonRun>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        if self.boss_available && !self.boss_completed {
            if let Some(event) = self.set_boss_completed() {
                events.push(event);
            }
            return events;
        }

        if let Some(run) = run {
            events.push(ProgressEvent::UpgradeGranted(run.upgrade.clone()));
        }

        self.dungeons_completed += 1;

        if self.dungeons_completed >= self.dungeons_needed_for_boss && !self.boss_available {
            self.boss_available = true;
            log::info!(
                "Boss dungeon unlocked after {} dungeons",
                self.dungeons_completed
            );
            events.push(ProgressEvent::BossDungeonAvailable);
        }

        events
    }

    /// Mark the boss dungeon cleared. Returns the event only the first time.
    pub fn set_boss_completed(&mut self) -> Option<ProgressEvent> {
        if self.boss_completed {
            return None;
        }
        self.boss_completed = true;
        Some(ProgressEvent::BossDungeonCompleted)
    }

    pub fn is_boss_dungeon_available(&self) -> bool {
        self.boss_available
    }

    pub fn is_boss_dungeon_completed(&self) -> bool {
        self.boss_completed
    }

    pub fn dungeons_completed(&self) -> u32 {
        self.dungeons_completed
    }

    pub fn dungeons_needed_for_boss(&self) -> u32 {
        self.dungeons_needed_for_boss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::UpgradeKind;

    fn run() -> DungeonRun {
        DungeonRun {
            dungeon_name: "Sunken Vault".into(),
            upgrade: Upgrade {
                name: "Iron Skin".into(),
                kind: UpgradeKind::PlayerArmour,
                value: 5.0,
            },
            room_count: 12,
        }
    }

    #[test]
    fn boss_unlocks_after_threshold() {
        let mut progress = DungeonProgress::default();
        assert!(progress.complete_dungeon(None).is_empty());
        assert!(progress.complete_dungeon(None).is_empty());
        assert!(!progress.is_boss_dungeon_available());
        let events = progress.complete_dungeon(None);
        assert_eq!(events, vec![ProgressEvent::BossDungeonAvailable]);
        assert!(progress.is_boss_dungeon_available());
        assert_eq!(progress.dungeons_completed(), 3);
    }

    #[test]
    fn regular_completion_grants_upgrade() {
        let mut progress = DungeonProgress::new(5);
        let events = progress.complete_dungeon(Some(&run()));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProgressEvent::UpgradeGranted(u) if u.name == "Iron Skin"));
    }

    #[test]
    fn clearing_with_boss_open_completes_boss() {
        let mut progress = DungeonProgress::new(1);
        progress.complete_dungeon(None);
        assert!(progress.is_boss_dungeon_available());

        let events = progress.complete_dungeon(Some(&run()));
        assert_eq!(events, vec![ProgressEvent::BossDungeonCompleted]);
        assert!(progress.is_boss_dungeon_completed());
        // Count does not move and no upgrade is granted for the boss
        assert_eq!(progress.dungeons_completed(), 1);
    }

    #[test]
    fn boss_completion_fires_once() {
        let mut progress = DungeonProgress::new(1);
        assert_eq!(
            progress.set_boss_completed(),
            Some(ProgressEvent::BossDungeonCompleted)
        );
        assert_eq!(progress.set_boss_completed(), None);
    }

    #[test]
    fn unlock_event_not_repeated() {
        let mut progress = DungeonProgress::new(1);
        progress.set_boss_completed();
        assert_eq!(
            progress.complete_dungeon(None),
            vec![ProgressEvent::BossDungeonAvailable]
        );
        assert!(progress.complete_dungeon(None).is_empty());
    }
}
