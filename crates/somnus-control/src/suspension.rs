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

//! Suspend/resume state machine.
//!
//! Each agent is either Active or Suspended. Suspension strips the agent of
//! everything that costs simulation time and deactivates its representation;
//! resumption reverses it. The set of suspended agents must always match what
//! the engine shows: an agent is in the set iff its suspension has been
//! applied and not yet reversed.

use somnus_core::agent::{AgentHandle, AgentId};
use somnus_core::ThrottleError;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Attack cooldown applied on resumption so agents do not fire instantly.
pub const RESUME_ATTACK_BLOCK: Duration = Duration::from_secs(1);

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The agent went from Active to Suspended.
    Suspended,
    /// The agent went from Suspended to Active.
    Resumed,
    /// Nothing to do; the request was already satisfied or not applicable.
    Unchanged,
}

/// Tracks which agents are currently suspended and applies the transitions.
#[derive(Default)]
pub struct SuspensionState {
    suspended: HashMap<AgentId, Weak<dyn AgentHandle>>,
}

impl SuspensionState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends `agent`.
    ///
    /// A dead or already inactive agent is left untouched. Any other active
    /// agent in `bystanders` that is targeting `agent` has its target cleared,
    /// so nothing keeps hunting an agent that no longer exists in the world.
    pub fn suspend(
        &mut self,
        agent: &Arc<dyn AgentHandle>,
        bystanders: &[Arc<dyn AgentHandle>],
    ) -> Transition {
        if !agent.is_alive() || !agent.is_active() {
            return Transition::Unchanged;
        }

        let id = agent.id();
        log::debug!("Suspending {} ({})", agent.name(), id);

        agent.clear_pending_decisions();
        agent.clear_target();
        agent.pause_movement();
        agent.end_attack();
        agent.set_attack_allowed(false);
        agent.pause_effects();
        agent.pause_standby();
        agent.set_standby_allowed(false);
        agent.set_active(false);

        if self.suspended.insert(id, Arc::downgrade(agent)).is_some() {
            log::warn!(
                "{}",
                ThrottleError::InconsistentState(format!(
                    "{} was already marked suspended while still active",
                    id
                ))
            );
        }

        for other in bystanders {
            if other.id() == id || !other.is_active() {
                continue;
            }
            if other.current_target() == Some(id) {
                other.clear_target();
            }
        }

        Transition::Suspended
    }

    /// Resumes `agent`.
    ///
    /// An agent that is active and not marked suspended is left untouched.
    pub fn resume(&mut self, agent: &Arc<dyn AgentHandle>) -> Transition {
        let id = agent.id();
        let marked = self.suspended.remove(&id).is_some();
        let active = agent.is_active();
        if active && !marked {
            return Transition::Unchanged;
        }
        if active {
            log::warn!(
                "{}",
                ThrottleError::InconsistentState(format!(
                    "{} was marked suspended but is active",
                    id
                ))
            );
        }

        log::debug!("Resuming {} ({})", agent.name(), id);

        agent.set_active(true);
        agent.resume_movement();
        agent.resume_effects();
        agent.activate_standby();
        agent.set_standby_allowed(true);
        agent.set_attack_allowed(true);
        agent.block_attack_for(RESUME_ATTACK_BLOCK);

        Transition::Resumed
    }

    /// Resumes every suspended agent regardless of distance and empties the set.
    ///
    /// Returns the number of agents resumed. Agents destroyed in the meantime
    /// are dropped silently.
    pub fn resume_all(&mut self) -> usize {
        let snapshot: Vec<Weak<dyn AgentHandle>> = self.suspended.values().cloned().collect();
        let mut resumed = 0;
        for weak in snapshot {
            if let Some(agent) = weak.upgrade() {
                if self.resume(&agent) == Transition::Resumed {
                    resumed += 1;
                }
            }
        }
        self.suspended.clear();
        resumed
    }

    /// Drops an agent from the set without touching it. Returns `false` if it
    /// was not suspended.
    pub fn forget(&mut self, id: AgentId) -> bool {
        self.suspended.remove(&id).is_some()
    }

    /// Whether `id` is suspended.
    pub fn is_suspended(&self, id: AgentId) -> bool {
        self.suspended.contains_key(&id)
    }

    /// Number of suspended agents.
    pub fn len(&self) -> usize {
        self.suspended.len()
    }

    /// Returns true if no agent is suspended.
    pub fn is_empty(&self) -> bool {
        self.suspended.is_empty()
    }

    /// Forgets every agent without resuming them.
    pub fn clear(&mut self) {
        self.suspended.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use somnus_core::agent::AgentRole;
    use somnus_core::math::Vec3;
    use somnus_core::sim::SimAgent;

    fn sim(id: u32) -> (Arc<SimAgent>, Arc<dyn AgentHandle>) {
        let agent = Arc::new(SimAgent::new(id, AgentRole::Scav, Vec3::ZERO));
        let handle: Arc<dyn AgentHandle> = agent.clone();
        (agent, handle)
    }

    #[test]
    fn test_suspend_applies_every_side_effect() {
        let mut state = SuspensionState::new();
        let (agent, handle) = sim(1);
        agent.engage(AgentId(99));

        assert_eq!(state.suspend(&handle, &[]), Transition::Suspended);

        let s = agent.state();
        assert!(!s.active);
        assert_eq!(s.pending_decisions, 0);
        assert_eq!(s.target, None);
        assert!(s.movement_paused);
        assert!(!s.attacking);
        assert!(!s.attack_allowed);
        assert!(s.effects_paused);
        assert!(s.standby_paused);
        assert!(!s.standby_allowed);
        assert!(state.is_suspended(AgentId(1)));
    }

    #[test]
    fn test_resume_reverses_and_blocks_attack() {
        let mut state = SuspensionState::new();
        let (agent, handle) = sim(1);
        state.suspend(&handle, &[]);

        assert_eq!(state.resume(&handle), Transition::Resumed);

        let s = agent.state();
        assert!(s.active);
        assert!(!s.movement_paused);
        assert!(!s.effects_paused);
        assert!(!s.standby_paused);
        assert!(s.standby_allowed);
        assert!(s.attack_allowed);
        assert_eq!(s.attack_blocked_for, Some(RESUME_ATTACK_BLOCK));
        assert!(state.is_empty());
    }

    #[test]
    fn test_repeated_transitions_are_idempotent() {
        let mut state = SuspensionState::new();
        let (agent, handle) = sim(1);

        assert_eq!(state.resume(&handle), Transition::Unchanged);
        assert_eq!(state.suspend(&handle, &[]), Transition::Suspended);
        assert_eq!(state.suspend(&handle, &[]), Transition::Unchanged);
        assert_eq!(state.resume(&handle), Transition::Resumed);
        assert_eq!(state.resume(&handle), Transition::Unchanged);

        let s = agent.state();
        assert_eq!(s.deactivations, 1);
        assert_eq!(s.activations, 1);
    }

    #[test]
    fn test_dead_agent_is_never_deactivated() {
        let mut state = SuspensionState::new();
        let (agent, handle) = sim(1);
        agent.kill();

        assert_eq!(state.suspend(&handle, &[]), Transition::Unchanged);
        assert_eq!(agent.state().deactivations, 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_suspend_clears_bystander_targets() {
        let mut state = SuspensionState::new();
        let (_target, target_handle) = sim(1);
        let (hunter, hunter_handle) = sim(2);
        let (sleeper, sleeper_handle) = sim(3);
        let (other, other_handle) = sim(4);
        hunter.set_target(Some(AgentId(1)));
        other.set_target(Some(AgentId(42)));
        sleeper.set_target(Some(AgentId(1)));
        state.suspend(&sleeper_handle, &[]);
        sleeper.set_target(Some(AgentId(1)));

        let bystanders = vec![
            target_handle.clone(),
            hunter_handle,
            sleeper_handle,
            other_handle,
        ];
        state.suspend(&target_handle, &bystanders);

        assert_eq!(hunter.state().target, None);
        assert_eq!(other.state().target, Some(AgentId(42)));
        assert_eq!(
            sleeper.state().target,
            Some(AgentId(1)),
            "inactive bystanders are not touched"
        );
    }

    #[test]
    fn test_resume_all_resumes_every_member() {
        let mut state = SuspensionState::new();
        let agents: Vec<_> = (0..5).map(sim).collect();
        for (_, handle) in &agents {
            state.suspend(handle, &[]);
        }
        assert_eq!(state.len(), 5);

        assert_eq!(state.resume_all(), 5);
        assert!(state.is_empty());
        for (agent, _) in &agents {
            assert!(agent.state().active);
        }

        assert_eq!(state.resume_all(), 0);
    }

    #[test]
    fn test_resume_all_skips_destroyed_agents() {
        let mut state = SuspensionState::new();
        let (_keep, keep_handle) = sim(1);
        {
            let (_gone, gone_handle) = sim(2);
            state.suspend(&gone_handle, &[]);
        }
        state.suspend(&keep_handle, &[]);

        assert_eq!(state.resume_all(), 1);
        assert!(state.is_empty());
    }
}
