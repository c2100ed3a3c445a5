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

//! Contracts for the simulated agents the controller may throttle.
//!
//! The host engine owns every agent. The controller only ever sees them through
//! [`AgentHandle`], a narrow set of queries and side-effect primitives, and holds
//! weak references so that an agent destroyed by the engine simply stops
//! resolving.

mod role;

pub use self::role::AgentRole;

use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable identity of an agent for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Internal readiness of an agent's brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    /// Spawned but still initializing. Must never be suspended.
    #[default]
    Initializing,
    /// Fully active and making decisions.
    Active,
    /// Shut down by the engine; the handle is about to go away.
    Disposed,
}

/// The engine-side view of one simulated agent.
///
/// Every method takes `&self`: engines hand out shared handles and keep their
/// own interior mutability. Calls are made from the simulation thread only.
pub trait AgentHandle: Send + Sync {
    /// Returns the agent's identity.
    fn id(&self) -> AgentId;

    /// Human-readable name, used for diagnostics only.
    fn name(&self) -> &str;

    /// Role category used for inclusion-policy lookup.
    fn role(&self) -> AgentRole;

    /// True if this is the local controller's own actor.
    fn is_local_player(&self) -> bool;

    /// True if the agent is driven by the simulation rather than a person.
    fn is_simulated(&self) -> bool;

    /// Current readiness of the agent's brain.
    fn readiness(&self) -> Readiness;

    /// World-space position.
    fn position(&self) -> Vec3;

    /// Health-wise liveness.
    fn is_alive(&self) -> bool;

    /// Whether the agent's external representation is currently active.
    fn is_active(&self) -> bool;

    /// The agent this one is currently hunting, if any.
    fn current_target(&self) -> Option<AgentId>;

    /// Forgets the current target.
    fn clear_target(&self);

    /// Drops every queued decision and action.
    fn clear_pending_decisions(&self);

    /// Pauses patrol and movement data.
    fn pause_movement(&self);

    /// Resumes patrol and movement data.
    fn resume_movement(&self);

    /// Ends an attack in progress.
    fn end_attack(&self);

    /// Allows or forbids attacking.
    fn set_attack_allowed(&self, allowed: bool);

    /// Blocks attacking for the given duration.
    fn block_attack_for(&self, duration: Duration);

    /// Pauses status-effect processing.
    fn pause_effects(&self);

    /// Resumes status-effect processing.
    fn resume_effects(&self);

    /// Puts the standby scheduler into its paused mode.
    fn pause_standby(&self);

    /// Re-activates the standby scheduler.
    fn activate_standby(&self);

    /// Allows or forbids the standby scheduler to act on this agent.
    fn set_standby_allowed(&self, allowed: bool);

    /// Activates or deactivates the agent's external representation.
    fn set_active(&self, active: bool);
}
