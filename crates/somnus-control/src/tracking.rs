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

//! Membership of the agents that are candidates for throttling.

use somnus_core::agent::{AgentHandle, AgentId, AgentRole};
use somnus_core::config::InclusionSettings;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Precomputed role → "may be throttled" table.
///
/// Rebuilt only when the inclusion settings change, so the per-agent lookup is
/// a single array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionTable {
    included: [bool; AgentRole::ALL.len()],
}

impl InclusionTable {
    /// Builds the table from configured flags.
    ///
    /// Vehicle gunners are never throttled; unclassified roles always are.
    pub fn from_settings(settings: &InclusionSettings) -> Self {
        let mut included = [false; AgentRole::ALL.len()];
        for role in AgentRole::ALL {
            included[role.index()] = match role {
                AgentRole::VehicleGunner => false,
                AgentRole::Other => true,
                _ => settings.get(role).unwrap_or(true),
            };
        }
        Self { included }
    }

    /// Whether agents of `role` may be throttled.
    #[inline]
    pub fn accepts(&self, role: AgentRole) -> bool {
        self.included[role.index()]
    }
}

impl Default for InclusionTable {
    fn default() -> Self {
        Self::from_settings(&InclusionSettings::default())
    }
}

/// Returns true if `agent` is simulation-driven and not the local actor.
pub fn is_candidate(agent: &dyn AgentHandle) -> bool {
    !agent.is_local_player() && agent.is_simulated()
}

/// The set of tracked agents, held by weak reference.
#[derive(Default)]
pub struct TrackingSet {
    agents: HashMap<AgentId, Weak<dyn AgentHandle>>,
}

impl TrackingSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `agent`. Returns `false` if it was already tracked.
    pub fn insert(&mut self, agent: &Arc<dyn AgentHandle>) -> bool {
        let id = agent.id();
        if self.agents.contains_key(&id) {
            return false;
        }
        self.agents.insert(id, Arc::downgrade(agent));
        true
    }

    /// Stops tracking an agent. Returns `false` if it was not tracked.
    pub fn remove(&mut self, id: AgentId) -> bool {
        self.agents.remove(&id).is_some()
    }

    /// Whether `id` is tracked.
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Resolves a tracked agent. `None` if untracked or destroyed.
    pub fn get(&self, id: AgentId) -> Option<Arc<dyn AgentHandle>> {
        self.agents.get(&id).and_then(Weak::upgrade)
    }

    /// Number of tracked agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Stops tracking everything.
    pub fn clear(&mut self) {
        self.agents.clear();
    }
}
