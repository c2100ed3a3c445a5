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

use crate::agent::{AgentHandle, AgentId, AgentRole, Readiness};
use crate::math::Vec3;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Observable state of a simulated agent.
#[derive(Debug, Clone, PartialEq)]
pub struct SimAgentState {
    /// World-space position.
    pub position: Vec3,
    /// Health-wise liveness.
    pub alive: bool,
    /// Whether the external representation is active.
    pub active: bool,
    /// Brain readiness.
    pub readiness: Readiness,
    /// Current target.
    pub target: Option<AgentId>,
    /// Number of queued decisions.
    pub pending_decisions: usize,
    /// Patrol/movement paused.
    pub movement_paused: bool,
    /// An attack is in progress.
    pub attacking: bool,
    /// Attacking is allowed by state.
    pub attack_allowed: bool,
    /// Last attack block requested.
    pub attack_blocked_for: Option<Duration>,
    /// Status effects paused.
    pub effects_paused: bool,
    /// Standby scheduler paused.
    pub standby_paused: bool,
    /// Standby scheduler allowed to act.
    pub standby_allowed: bool,
    /// Number of times the representation was deactivated.
    pub deactivations: u32,
    /// Number of times the representation was activated.
    pub activations: u32,
}

impl Default for SimAgentState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            alive: true,
            active: true,
            readiness: Readiness::Active,
            target: None,
            pending_decisions: 0,
            movement_paused: false,
            attacking: false,
            attack_allowed: true,
            attack_blocked_for: None,
            effects_paused: false,
            standby_paused: false,
            standby_allowed: true,
            deactivations: 0,
            activations: 0,
        }
    }
}

/// A simulated agent that records every primitive applied to it.
#[derive(Debug)]
pub struct SimAgent {
    id: AgentId,
    name: String,
    role: AgentRole,
    local_player: bool,
    simulated: bool,
    state: Mutex<SimAgentState>,
}

impl SimAgent {
    /// Creates a live, active, fully ready simulated agent.
    pub fn new(id: u32, role: AgentRole, position: Vec3) -> Self {
        Self {
            id: AgentId(id),
            name: format!("{:?}_{}", role, id).to_lowercase(),
            role,
            local_player: false,
            simulated: true,
            state: Mutex::new(SimAgentState {
                position,
                ..SimAgentState::default()
            }),
        }
    }

    /// Marks the agent as the local controller's own actor.
    pub fn as_local_player(mut self) -> Self {
        self.local_player = true;
        self
    }

    /// Marks the agent as driven by a person rather than the simulation.
    pub fn as_person_driven(mut self) -> Self {
        self.simulated = false;
        self
    }

    /// Sets the initial readiness.
    pub fn with_readiness(self, readiness: Readiness) -> Self {
        self.lock().readiness = readiness;
        self
    }

    /// Returns a copy of the observable state.
    pub fn state(&self) -> SimAgentState {
        self.lock().clone()
    }

    /// Moves the agent to `position`.
    pub fn set_position(&self, position: Vec3) {
        self.lock().position = position;
    }

    /// Moves the agent by `delta`.
    pub fn translate(&self, delta: Vec3) {
        let mut state = self.lock();
        state.position = state.position + delta;
    }

    /// Changes readiness.
    pub fn set_readiness(&self, readiness: Readiness) {
        self.lock().readiness = readiness;
    }

    /// Kills the agent.
    pub fn kill(&self) {
        self.lock().alive = false;
    }

    /// Points the agent at a target.
    pub fn set_target(&self, target: Option<AgentId>) {
        self.lock().target = target;
    }

    /// Queues a decision and starts an attack.
    pub fn engage(&self, target: AgentId) {
        let mut state = self.lock();
        state.target = Some(target);
        state.pending_decisions += 1;
        state.attacking = true;
    }

    fn lock(&self) -> MutexGuard<'_, SimAgentState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AgentHandle for SimAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> AgentRole {
        self.role
    }

    fn is_local_player(&self) -> bool {
        self.local_player
    }

    fn is_simulated(&self) -> bool {
        self.simulated
    }

    fn readiness(&self) -> Readiness {
        self.lock().readiness
    }

    fn position(&self) -> Vec3 {
        self.lock().position
    }

    fn is_alive(&self) -> bool {
        self.lock().alive
    }

    fn is_active(&self) -> bool {
        self.lock().active
    }

    fn current_target(&self) -> Option<AgentId> {
        self.lock().target
    }

    fn clear_target(&self) {
        self.lock().target = None;
    }

    fn clear_pending_decisions(&self) {
        self.lock().pending_decisions = 0;
    }

    fn pause_movement(&self) {
        self.lock().movement_paused = true;
    }

    fn resume_movement(&self) {
        self.lock().movement_paused = false;
    }

    fn end_attack(&self) {
        self.lock().attacking = false;
    }

    fn set_attack_allowed(&self, allowed: bool) {
        self.lock().attack_allowed = allowed;
    }

    fn block_attack_for(&self, duration: Duration) {
        self.lock().attack_blocked_for = Some(duration);
    }

    fn pause_effects(&self) {
        self.lock().effects_paused = true;
    }

    fn resume_effects(&self) {
        self.lock().effects_paused = false;
    }

    fn pause_standby(&self) {
        self.lock().standby_paused = true;
    }

    fn activate_standby(&self) {
        self.lock().standby_paused = false;
    }

    fn set_standby_allowed(&self, allowed: bool) {
        self.lock().standby_allowed = allowed;
    }

    fn set_active(&self, active: bool) {
        let mut state = self.lock();
        if active {
            state.activations += 1;
        } else {
            state.deactivations += 1;
        }
        state.active = active;
    }
}
