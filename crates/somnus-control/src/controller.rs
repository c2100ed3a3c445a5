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

//! The throttling controller for one session.

use crate::scheduler::IntervalScheduler;
use crate::spatial::{self, SpatialVerdict};
use crate::suspension::{SuspensionState, Transition};
use crate::tracking::{is_candidate, InclusionTable, TrackingSet};
use flume::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use somnus_core::agent::{AgentHandle, AgentId, Readiness};
use somnus_core::config::{ConfigEvent, ConfigSource, RateSetting, Region};
use somnus_core::event::SubscriptionId;
use somnus_core::session::{AgentSpawner, Participant, SessionAccess, SpawnEvent};
use somnus_core::{ThrottleError, ThrottleResult};
use std::sync::{Arc, Weak};

/// Construction options for a [`Controller`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    /// Seed for the scheduling jitter. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Newly tracked agents given their first deadline.
    pub seeded: usize,
    /// Agents run through the spatial check.
    pub evaluated: usize,
    /// Active → Suspended transitions.
    pub suspended: usize,
    /// Suspended → Active transitions.
    pub resumed: usize,
    /// Agents dropped because their handle no longer resolved.
    pub dropped_stale: usize,
    /// Agents resumed because throttling is disabled for the region.
    pub force_resumed: usize,
}

/// What a re-scan of the session changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Agents that started being tracked.
    pub added: usize,
    /// Agents that stopped being tracked.
    pub removed: usize,
}

/// Decides, per agent and per tick, whether to suspend or resume it.
///
/// Owns the tracked set, the schedule and the suspended set for the lifetime
/// of one session. All methods run on the simulation thread.
pub struct Controller {
    session: Arc<dyn SessionAccess>,
    config: Arc<dyn ConfigSource>,
    spawner: Arc<dyn AgentSpawner>,
    region: Option<Region>,
    participants: Vec<Weak<dyn Participant>>,
    inclusion: InclusionTable,
    tracking: TrackingSet,
    scheduler: IntervalScheduler,
    suspension: SuspensionState,
    spawn_events: Option<(SubscriptionId, Receiver<SpawnEvent>)>,
    config_events: Option<(SubscriptionId, Receiver<ConfigEvent>)>,
    region_enabled: bool,
    torn_down: bool,
}

impl Controller {
    /// Attaches a controller to `session`.
    ///
    /// Fails with [`ThrottleError::MissingDependency`] if the session has no
    /// spawn system, and with [`ThrottleError::Superseded`] if another limiter
    /// already runs in it. Agents and participants already present are picked
    /// up immediately.
    pub fn new(
        session: Arc<dyn SessionAccess>,
        config: Arc<dyn ConfigSource>,
        options: ControllerOptions,
    ) -> ThrottleResult<Self> {
        if let Some(limiter) = session.competing_limiter() {
            return Err(ThrottleError::Superseded(limiter));
        }
        let spawner = session
            .spawner()
            .ok_or(ThrottleError::MissingDependency("agent spawner"))?;

        let location_id = session.location_id();
        let region = Region::from_location_id(&location_id);
        if region.is_none() {
            log::info!(
                "Unknown region '{}', using the fallback range",
                location_id
            );
        }

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (spawn_tx, spawn_rx) = flume::unbounded();
        let spawn_sub = spawner.subscribe(spawn_tx);
        let (config_tx, config_rx) = flume::unbounded();
        let config_sub = config.subscribe(config_tx);

        let mut controller = Self {
            scheduler: IntervalScheduler::new(config.rate(), rng),
            inclusion: InclusionTable::from_settings(&config.inclusion()),
            region_enabled: config.resolve(region).enabled,
            session,
            config,
            spawner,
            region,
            participants: Vec::new(),
            tracking: TrackingSet::new(),
            suspension: SuspensionState::new(),
            spawn_events: Some((spawn_sub, spawn_rx)),
            config_events: Some((config_sub, config_rx)),
            torn_down: false,
        };

        controller.notify_humans_joined();
        controller.refresh();

        log::info!(
            "Throttling controller started (region={:?}, tracked={}, participants={})",
            controller.region,
            controller.tracking.len(),
            controller.participants.len()
        );
        Ok(controller)
    }

    /// Runs one simulation tick at absolute time `now` (seconds).
    pub fn tick(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        if self.torn_down {
            return report;
        }

        self.pump_events();

        let settings = self.config.resolve(self.region);
        if !settings.enabled {
            if self.region_enabled {
                log::info!("Throttling disabled for region {:?}", self.region);
                self.region_enabled = false;
            }
            if !self.suspension.is_empty() {
                report.force_resumed = self.resume_all();
            }
            return report;
        }
        if !self.region_enabled {
            log::info!("Throttling re-enabled for region {:?}", self.region);
            self.region_enabled = true;
            self.scheduler.restagger(now);
        }

        report.seeded = self.scheduler.seed_pending(now);

        let mut bystanders: Option<Vec<Arc<dyn AgentHandle>>> = None;
        while let Some(id) = self.scheduler.pop_due(now) {
            let Some(agent) = self
                .tracking
                .get(id)
                .filter(|a| a.readiness() != Readiness::Disposed)
            else {
                log::debug!("{}", ThrottleError::StaleReference(id));
                self.untrack(id);
                report.dropped_stale += 1;
                continue;
            };

            let verdict = spatial::evaluate(agent.as_ref(), &self.participants, settings.range);
            report.evaluated += 1;

            if let SpatialVerdict::Evaluated { in_range, .. } = verdict {
                let active = agent.is_active();
                if !in_range && active {
                    let others = bystanders.get_or_insert_with(|| self.session.live_agents());
                    if self.suspension.suspend(&agent, others) == Transition::Suspended {
                        report.suspended += 1;
                    }
                } else if in_range
                    && !active
                    && self.suspension.resume(&agent) == Transition::Resumed
                {
                    report.resumed += 1;
                }
            }

            self.scheduler
                .reschedule(id, now, verdict.min_distance_sq());
        }

        log::trace!(
            "Tick {:.2}: {:?} (tracked={}, suspended={})",
            now,
            report,
            self.tracking.len(),
            self.suspension.len()
        );
        report
    }

    /// Drains pending spawn and configuration notifications and applies them.
    pub fn pump_events(&mut self) {
        let spawn_events: Vec<SpawnEvent> = match &self.spawn_events {
            Some((_, rx)) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in spawn_events {
            match event {
                SpawnEvent::Created(agent) => self.on_agent_created(agent),
                SpawnEvent::Removed(id) => self.on_agent_removed(id),
            }
        }

        let config_events: Vec<ConfigEvent> = match &self.config_events {
            Some((_, rx)) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in config_events {
            match event {
                ConfigEvent::RateChanged(rate) => self.on_rate_setting_changed(rate),
                ConfigEvent::InclusionChanged => self.on_inclusion_policy_changed(),
                ConfigEvent::RegionChanged(region) => {
                    log::debug!("Region settings changed for {:?}", region);
                }
            }
        }
    }

    /// Starts tracking a newly spawned agent if the inclusion policy accepts it.
    pub fn on_agent_created(&mut self, agent: Arc<dyn AgentHandle>) {
        if self.torn_down || !is_candidate(agent.as_ref()) {
            return;
        }
        if !self.inclusion.accepts(agent.role()) {
            log::debug!(
                "Not tracking {} ({:?} excluded)",
                agent.name(),
                agent.role()
            );
            return;
        }
        if self.tracking.insert(&agent) {
            self.start_tracking(&agent);
            log::debug!("Tracking {} ({})", agent.name(), agent.id());
        }
    }

    /// Forgets an agent removed from the session. Idempotent.
    pub fn on_agent_removed(&mut self, id: AgentId) {
        self.untrack(id);
    }

    /// Applies a new rate setting to future intervals.
    pub fn on_rate_setting_changed(&mut self, rate: RateSetting) {
        self.scheduler.set_rate(rate);
        log::info!(
            "Rate set to {:?} (multiplier {:.2})",
            rate,
            self.scheduler.rate_multiplier()
        );
    }

    /// Rebuilds the inclusion table and re-scans the session.
    pub fn on_inclusion_policy_changed(&mut self) {
        if self.torn_down {
            return;
        }
        self.inclusion = InclusionTable::from_settings(&self.config.inclusion());
        let outcome = self.refresh();
        log::info!(
            "Inclusion policy changed: {} agents added, {} removed",
            outcome.added,
            outcome.removed
        );
    }

    /// Re-scans every live agent against the current inclusion table.
    ///
    /// Newly accepted agents start tracked and unsuspended; newly rejected
    /// agents are resumed if needed and then untracked.
    pub fn refresh(&mut self) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        if self.torn_down {
            return outcome;
        }

        for agent in self.session.live_agents() {
            if !is_candidate(agent.as_ref()) {
                continue;
            }
            let id = agent.id();
            let wanted = self.inclusion.accepts(agent.role());
            let tracked = self.tracking.contains(id);

            if wanted && !tracked {
                self.tracking.insert(&agent);
                self.start_tracking(&agent);
                outcome.added += 1;
                log::debug!("[Refresh] Tracking {} ({:?})", agent.name(), agent.role());
            } else if !wanted && tracked {
                if self.suspension.is_suspended(id) {
                    self.suspension.resume(&agent);
                }
                self.untrack(id);
                outcome.removed += 1;
                log::debug!(
                    "[Refresh] Stopped tracking {} ({:?})",
                    agent.name(),
                    agent.role()
                );
            }
        }
        outcome
    }

    /// Replaces the participant list with the session's current one.
    pub fn notify_humans_joined(&mut self) {
        if self.torn_down {
            return;
        }
        self.participants = self
            .session
            .human_participants()
            .iter()
            .map(Arc::downgrade)
            .collect();
        log::debug!("{} participants tracked", self.participants.len());
    }

    /// Resumes every suspended agent. Returns how many were resumed.
    pub fn resume_all(&mut self) -> usize {
        let resumed = self.suspension.resume_all();
        if resumed > 0 {
            log::info!("Resumed {} suspended agents", resumed);
        }
        resumed
    }

    /// Unsubscribes from every collaborator, then drops all state. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some((id, _)) = self.spawn_events.take() {
            self.spawner.unsubscribe(id);
        }
        if let Some((id, _)) = self.config_events.take() {
            self.config.unsubscribe(id);
        }

        self.tracking.clear();
        self.scheduler.clear();
        self.suspension.clear();
        self.participants.clear();
        log::info!("Throttling controller torn down");
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Region resolved for this session, if it is a known one.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Number of tracked agents.
    pub fn tracked_count(&self) -> usize {
        self.tracking.len()
    }

    /// Number of suspended agents.
    pub fn suspended_count(&self) -> usize {
        self.suspension.len()
    }

    /// Number of participants tracked.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Whether `id` is tracked.
    pub fn is_tracked(&self, id: AgentId) -> bool {
        self.tracking.contains(id)
    }

    /// Whether `id` is suspended.
    pub fn is_suspended(&self, id: AgentId) -> bool {
        self.suspension.is_suspended(id)
    }

    /// Next scheduled check of `id`, once it has been seeded.
    pub fn next_check(&self, id: AgentId) -> Option<f64> {
        self.scheduler.next_check(id)
    }

    /// Current rate multiplier.
    pub fn rate_multiplier(&self) -> f32 {
        self.scheduler.rate_multiplier()
    }

    /// Schedules a freshly tracked agent. An agent left deactivated by an
    /// earlier controller is reactivated so the engine matches the empty
    /// suspended set.
    fn start_tracking(&mut self, agent: &Arc<dyn AgentHandle>) {
        if agent.is_alive()
            && !agent.is_active()
            && self.suspension.resume(agent) == Transition::Resumed
        {
            log::debug!(
                "Reactivated {} ({}), it was inactive when tracked",
                agent.name(),
                agent.id()
            );
        }
        self.scheduler.track(agent.id());
    }

    fn untrack(&mut self, id: AgentId) {
        self.tracking.remove(id);
        self.scheduler.forget(id);
        self.suspension.forget(id);
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.teardown();
    }
}
