// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Role categories and the classification of raw spawn types.

use serde::{Deserialize, Serialize};

/// The category an agent belongs to for inclusion-policy purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    /// Regular scavengers.
    Scav,
    /// Sniper scavengers.
    Sniper,
    /// Rogues.
    Rogue,
    /// Raiders.
    Raider,
    /// Simulated operators.
    Pmc,
    /// Cultists.
    Cultist,
    /// Bosses.
    Boss,
    /// Boss followers and guards.
    Follower,
    /// Gunner of a scripted vehicle event. Never throttled.
    VehicleGunner,
    /// Anything not covered above.
    Other,
}

impl AgentRole {
    /// Every role, in declaration order.
    pub const ALL: [AgentRole; 10] = [
        AgentRole::Scav,
        AgentRole::Sniper,
        AgentRole::Rogue,
        AgentRole::Raider,
        AgentRole::Pmc,
        AgentRole::Cultist,
        AgentRole::Boss,
        AgentRole::Follower,
        AgentRole::VehicleGunner,
        AgentRole::Other,
    ];

    /// Dense index, usable as a table slot.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Classifies a raw engine spawn type name. Unknown names map to [`AgentRole::Other`].
    pub fn from_spawn_type(spawn_type: &str) -> Self {
        SPAWN_TYPES
            .iter()
            .find(|(name, _)| *name == spawn_type)
            .map(|(_, role)| *role)
            .unwrap_or(AgentRole::Other)
    }
}

const SPAWN_TYPES: &[(&str, AgentRole)] = &[
    ("assault", AgentRole::Scav),
    ("cursedAssault", AgentRole::Scav),
    ("assaultGroup", AgentRole::Scav),
    ("marksman", AgentRole::Sniper),
    ("exUsec", AgentRole::Rogue),
    ("pmcBot", AgentRole::Raider),
    ("pmcUSEC", AgentRole::Pmc),
    ("pmcBEAR", AgentRole::Pmc),
    ("sectantPriest", AgentRole::Cultist),
    ("sectantWarrior", AgentRole::Cultist),
    ("bossKnight", AgentRole::Boss),
    ("bossBully", AgentRole::Boss),
    ("bossKilla", AgentRole::Boss),
    ("bossKojaniy", AgentRole::Boss),
    ("bossSanitar", AgentRole::Boss),
    ("bossTagilla", AgentRole::Boss),
    ("bossGluhar", AgentRole::Boss),
    ("bossZryachiy", AgentRole::Boss),
    ("bossKolontay", AgentRole::Boss),
    ("bossPartisan", AgentRole::Boss),
    ("bossBoar", AgentRole::Boss),
    ("bossBoarSniper", AgentRole::Boss),
    ("followerBully", AgentRole::Follower),
    ("followerKojaniy", AgentRole::Follower),
    ("followerSanitar", AgentRole::Follower),
    ("followerTagilla", AgentRole::Follower),
    ("followerGluharAssault", AgentRole::Follower),
    ("followerGluharScout", AgentRole::Follower),
    ("followerGluharSecurity", AgentRole::Follower),
    ("followerGluharSnipe", AgentRole::Follower),
    ("followerBigPipe", AgentRole::Follower),
    ("followerBirdEye", AgentRole::Follower),
    ("followerZryachiy", AgentRole::Follower),
    ("followerBoar", AgentRole::Follower),
    ("followerBoarClose1", AgentRole::Follower),
    ("followerBoarClose2", AgentRole::Follower),
    ("followerKolontayAssault", AgentRole::Follower),
    ("followerKolontaySecurity", AgentRole::Follower),
    ("shooterBTR", AgentRole::VehicleGunner),
];
