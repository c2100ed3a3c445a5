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

//! Contracts for the session the controller runs inside.

use crate::agent::{AgentHandle, AgentId};
use crate::event::SubscriptionId;
use crate::math::Vec3;
use std::fmt;
use std::sync::Arc;

/// A live actor controlled by an actual person.
pub trait Participant: Send + Sync {
    /// World-space position.
    fn position(&self) -> Vec3;

    /// Health-wise liveness.
    fn is_alive(&self) -> bool;
}

/// Notification raised by the agent spawn system.
#[derive(Clone)]
pub enum SpawnEvent {
    /// An agent was instantiated.
    Created(Arc<dyn AgentHandle>),
    /// An agent was removed from the session.
    Removed(AgentId),
}

impl fmt::Debug for SpawnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnEvent::Created(agent) => f.debug_tuple("Created").field(&agent.id()).finish(),
            SpawnEvent::Removed(id) => f.debug_tuple("Removed").field(id).finish(),
        }
    }
}

/// The agent spawn system of the host.
pub trait AgentSpawner: Send + Sync {
    /// Registers a sink for creation and removal notifications.
    fn subscribe(&self, sink: flume::Sender<SpawnEvent>) -> SubscriptionId;

    /// Removes a sink registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Accessor for the session/world the controller is attached to.
pub trait SessionAccess: Send + Sync {
    /// Raw identifier of the active region (map).
    fn location_id(&self) -> String;

    /// True if this process simulates the agents (the session host).
    fn is_authoritative(&self) -> bool;

    /// Name of another AI limiter already active in the session, if any.
    fn competing_limiter(&self) -> Option<String> {
        None
    }

    /// The real participants currently in the session.
    fn human_participants(&self) -> Vec<Arc<dyn Participant>>;

    /// Every agent currently alive in the session, throttled or not.
    fn live_agents(&self) -> Vec<Arc<dyn AgentHandle>>;

    /// The spawn system, if the session has one yet.
    fn spawner(&self) -> Option<Arc<dyn AgentSpawner>>;
}
