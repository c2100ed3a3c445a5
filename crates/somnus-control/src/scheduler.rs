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

//! Per-agent check scheduling with distance tiers and jitter.
//!
//! | Squared distance to the nearest participant | Base interval |
//! |---|---|
//! | ≤ 70² | 0.25 s |
//! | ≤ 200² | 0.5 s |
//! | ≤ 500² | 1.0 s |
//! | farther | 3.0 s |
//!
//! The base interval is scaled by the rate multiplier and a uniform jitter in
//! `[0, 0.1)` s is added to the resulting deadline. Agents seen for the first
//! time are seeded at `now + U[0, 0.5)` s so that a wave of spawns does not turn
//! into a wave of checks.

use rand::rngs::StdRng;
use rand::Rng;
use somnus_core::agent::AgentId;
use somnus_core::config::RateSetting;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Upper bound of the stagger applied to first-seen agents, in seconds.
pub const INITIAL_STAGGER: f32 = 0.5;
/// Upper bound of the jitter added to every recheck, in seconds.
pub const RECHECK_JITTER: f32 = 0.1;

/// Interval used beyond the last tier, in seconds.
pub const FAR_INTERVAL: f32 = 3.0;

/// Distance tiers as `(max squared distance, interval in seconds)`, nearest first.
pub const TIERS: [(f32, f32); 3] = [
    (70.0 * 70.0, 0.25),
    (200.0 * 200.0, 0.5),
    (500.0 * 500.0, 1.0),
];

/// Base interval for a squared distance, before the rate multiplier.
pub fn base_interval(min_distance_sq: f32) -> f32 {
    TIERS
        .iter()
        .find(|(max_distance_sq, _)| min_distance_sq <= *max_distance_sq)
        .map(|(_, interval)| *interval)
        .unwrap_or(FAR_INTERVAL)
}

/// Interval until the next check, scaled by `rate_multiplier`. Jitter excluded.
pub fn next_interval(min_distance_sq: f32, rate_multiplier: f32) -> f32 {
    base_interval(min_distance_sq) * rate_multiplier
}

#[derive(Debug, Clone, Copy)]
struct ScheduleEntry {
    next_check: f64,
    stamp: u64,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: f64,
    stamp: u64,
    id: AgentId,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then(self.stamp.cmp(&other.stamp))
    }
}

/// Owns every agent's next-check timestamp.
///
/// Entries live in a map (at most one per agent); deadlines live in a min-heap
/// whose stale items are skipped lazily, so finding the due agents costs
/// O(due · log n) instead of a scan of every tracked agent.
#[derive(Debug)]
pub struct IntervalScheduler {
    entries: HashMap<AgentId, ScheduleEntry>,
    deadlines: BinaryHeap<Reverse<Deadline>>,
    unseeded: HashSet<AgentId>,
    rate_multiplier: f32,
    next_stamp: u64,
    rng: StdRng,
}

impl IntervalScheduler {
    /// Creates an empty scheduler.
    pub fn new(rate: RateSetting, rng: StdRng) -> Self {
        Self {
            entries: HashMap::new(),
            deadlines: BinaryHeap::new(),
            unseeded: HashSet::new(),
            rate_multiplier: rate.multiplier(),
            next_stamp: 0,
            rng,
        }
    }

    /// Changes the multiplier used for future intervals.
    ///
    /// Deadlines already scheduled are left as they are.
    pub fn set_rate(&mut self, rate: RateSetting) {
        self.rate_multiplier = rate.multiplier();
    }

    /// Current rate multiplier.
    pub fn rate_multiplier(&self) -> f32 {
        self.rate_multiplier
    }

    /// Registers an agent. It gets its first deadline on the next
    /// [`seed_pending`](Self::seed_pending).
    pub fn track(&mut self, id: AgentId) {
        if !self.entries.contains_key(&id) {
            self.unseeded.insert(id);
        }
    }

    /// Drops an agent's entry. Returns `false` if it had none.
    pub fn forget(&mut self, id: AgentId) -> bool {
        let pending = self.unseeded.remove(&id);
        self.entries.remove(&id).is_some() || pending
    }

    /// Gives every newly tracked agent a staggered first deadline.
    ///
    /// Returns the number of agents seeded.
    pub fn seed_pending(&mut self, now: f64) -> usize {
        let mut ids: Vec<AgentId> = self.unseeded.drain().collect();
        ids.sort_unstable();
        for &id in &ids {
            let stagger = self.rng.gen_range(0.0..INITIAL_STAGGER);
            self.schedule(id, now + f64::from(stagger));
        }
        ids.len()
    }

    /// Pops the next agent whose deadline is at or before `now`.
    ///
    /// The agent keeps its entry; the caller must either
    /// [`reschedule`](Self::reschedule) or [`forget`](Self::forget) it.
    pub fn pop_due(&mut self, now: f64) -> Option<AgentId> {
        while let Some(Reverse(top)) = self.deadlines.peek().copied() {
            if top.at > now {
                return None;
            }
            self.deadlines.pop();
            let current = self
                .entries
                .get(&top.id)
                .is_some_and(|entry| entry.stamp == top.stamp);
            if current {
                return Some(top.id);
            }
        }
        None
    }

    /// Schedules the next check from the distance just measured.
    ///
    /// Returns the new deadline.
    pub fn reschedule(&mut self, id: AgentId, now: f64, min_distance_sq: f32) -> f64 {
        let interval = next_interval(min_distance_sq, self.rate_multiplier);
        let jitter = self.rng.gen_range(0.0..RECHECK_JITTER);
        let at = now + f64::from(interval) + f64::from(jitter);
        self.schedule(id, at);
        at
    }

    /// Re-seeds every entry as if its agent had just been seen.
    pub fn restagger(&mut self, now: f64) {
        let mut ids: Vec<AgentId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        self.deadlines.clear();
        for id in ids {
            let stagger = self.rng.gen_range(0.0..INITIAL_STAGGER);
            self.schedule(id, now + f64::from(stagger));
        }
    }

    /// Next deadline of an agent, if it has been seeded.
    pub fn next_check(&self, id: AgentId) -> Option<f64> {
        self.entries.get(&id).map(|entry| entry.next_check)
    }

    /// Number of seeded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is scheduled or waiting to be seeded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unseeded.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
        self.unseeded.clear();
    }

    fn schedule(&mut self, id: AgentId, at: f64) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.entries.insert(
            id,
            ScheduleEntry {
                next_check: at,
                stamp,
            },
        );
        self.deadlines.push(Reverse(Deadline { at, stamp, id }));

        // Forgotten agents leave dead deadlines behind.
        if self.deadlines.len() > 2 * self.entries.len() + 64 {
            self.compact();
        }
    }

    fn compact(&mut self) {
        self.deadlines = self
            .entries
            .iter()
            .map(|(&id, entry)| {
                Reverse(Deadline {
                    at: entry.next_check,
                    stamp: entry.stamp,
                    id,
                })
            })
            .collect();
    }
}
