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

use super::agent::SimAgent;
use crate::agent::{AgentHandle, AgentId};
use crate::event::{Subscribers, SubscriptionId};
use crate::math::Vec3;
use crate::session::{AgentSpawner, Participant, SessionAccess, SpawnEvent};
use std::sync::{Arc, Mutex, MutexGuard};

/// A simulated real participant.
#[derive(Debug)]
pub struct SimParticipant {
    state: Mutex<(Vec3, bool)>,
}

impl SimParticipant {
    /// Creates a live participant at `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            state: Mutex::new((position, true)),
        }
    }

    /// Moves the participant.
    pub fn set_position(&self, position: Vec3) {
        lock(&self.state).0 = position;
    }

    /// Kills the participant.
    pub fn kill(&self) {
        lock(&self.state).1 = false;
    }
}

impl Participant for SimParticipant {
    fn position(&self) -> Vec3 {
        lock(&self.state).0
    }

    fn is_alive(&self) -> bool {
        lock(&self.state).1
    }
}

/// A spawn system that broadcasts notifications to its subscribers.
#[derive(Debug, Default)]
pub struct SimSpawner {
    subscribers: Subscribers<SpawnEvent>,
}

impl SimSpawner {
    /// Broadcasts a notification.
    pub fn announce(&self, event: SpawnEvent) {
        self.subscribers.publish(event);
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl AgentSpawner for SimSpawner {
    fn subscribe(&self, sink: flume::Sender<SpawnEvent>) -> SubscriptionId {
        self.subscribers.subscribe(sink)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

/// A simulated session holding participants and agents.
#[derive(Debug)]
pub struct SimSession {
    location_id: String,
    authoritative: bool,
    competing_limiter: Option<String>,
    spawner: Option<Arc<SimSpawner>>,
    humans: Mutex<Vec<Arc<SimParticipant>>>,
    agents: Mutex<Vec<Arc<SimAgent>>>,
}

impl SimSession {
    /// Creates an authoritative session with a spawn system.
    pub fn new(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            authoritative: true,
            competing_limiter: None,
            spawner: Some(Arc::new(SimSpawner::default())),
            humans: Mutex::new(Vec::new()),
            agents: Mutex::new(Vec::new()),
        }
    }

    /// Removes the spawn system.
    pub fn without_spawner(mut self) -> Self {
        self.spawner = None;
        self
    }

    /// Makes this a client-side view of the session.
    pub fn as_client(mut self) -> Self {
        self.authoritative = false;
        self
    }

    /// Reports another limiter as active.
    pub fn with_competing_limiter(mut self, name: impl Into<String>) -> Self {
        self.competing_limiter = Some(name.into());
        self
    }

    /// Returns the concrete spawn system.
    pub fn sim_spawner(&self) -> Option<&Arc<SimSpawner>> {
        self.spawner.as_ref()
    }

    /// Adds a live participant at `position`.
    pub fn add_human(&self, position: Vec3) -> Arc<SimParticipant> {
        let human = Arc::new(SimParticipant::new(position));
        lock(&self.humans).push(Arc::clone(&human));
        human
    }

    /// Removes every participant.
    pub fn clear_humans(&self) {
        lock(&self.humans).clear();
    }

    /// Inserts an agent and announces its creation.
    pub fn spawn(&self, agent: SimAgent) -> Arc<SimAgent> {
        let agent = Arc::new(agent);
        lock(&self.agents).push(Arc::clone(&agent));
        if let Some(spawner) = &self.spawner {
            spawner.announce(SpawnEvent::Created(agent.clone() as Arc<dyn AgentHandle>));
        }
        agent
    }

    /// Inserts an agent without announcing it.
    pub fn insert_quietly(&self, agent: SimAgent) -> Arc<SimAgent> {
        let agent = Arc::new(agent);
        lock(&self.agents).push(Arc::clone(&agent));
        agent
    }

    /// Removes an agent and announces the removal.
    pub fn despawn(&self, id: AgentId) -> Option<Arc<SimAgent>> {
        let removed = self.remove_quietly(id);
        if removed.is_some() {
            if let Some(spawner) = &self.spawner {
                spawner.announce(SpawnEvent::Removed(id));
            }
        }
        removed
    }

    /// Removes an agent without announcing it, as a crashed engine would.
    pub fn remove_quietly(&self, id: AgentId) -> Option<Arc<SimAgent>> {
        let mut agents = lock(&self.agents);
        let index = agents.iter().position(|a| a.id() == id)?;
        Some(agents.remove(index))
    }

    /// Returns the agent with the given id.
    pub fn agent(&self, id: AgentId) -> Option<Arc<SimAgent>> {
        lock(&self.agents).iter().find(|a| a.id() == id).cloned()
    }

    /// Returns every agent.
    pub fn agents(&self) -> Vec<Arc<SimAgent>> {
        lock(&self.agents).clone()
    }
}

impl SessionAccess for SimSession {
    fn location_id(&self) -> String {
        self.location_id.clone()
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn competing_limiter(&self) -> Option<String> {
        self.competing_limiter.clone()
    }

    fn human_participants(&self) -> Vec<Arc<dyn Participant>> {
        lock(&self.humans)
            .iter()
            .map(|h| Arc::clone(h) as Arc<dyn Participant>)
            .collect()
    }

    fn live_agents(&self) -> Vec<Arc<dyn AgentHandle>> {
        lock(&self.agents)
            .iter()
            .map(|a| Arc::clone(a) as Arc<dyn AgentHandle>)
            .collect()
    }

    fn spawner(&self) -> Option<Arc<dyn AgentSpawner>> {
        self.spawner
            .as_ref()
            .map(|s| Arc::clone(s) as Arc<dyn AgentSpawner>)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
