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

//! Distance check between one agent and every tracked participant.

use somnus_core::agent::{AgentHandle, Readiness};
use somnus_core::session::Participant;
use std::sync::Weak;

/// Outcome of a spatial check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialVerdict {
    /// The agent is still initializing and must be left alone.
    NotReady,
    /// The agent was measured.
    Evaluated {
        /// Smallest squared distance to a live participant, or `f32::MAX` if
        /// there is none.
        min_distance_sq: f32,
        /// True iff at least one live participant is within range.
        in_range: bool,
    },
}

impl SpatialVerdict {
    /// Squared distance used to pick the next check interval.
    ///
    /// Agents that are not ready are treated as close so they are looked at
    /// again soon.
    pub fn min_distance_sq(&self) -> f32 {
        match self {
            SpatialVerdict::NotReady => 0.0,
            SpatialVerdict::Evaluated {
                min_distance_sq, ..
            } => *min_distance_sq,
        }
    }
}

/// Measures `agent` against `participants`.
///
/// Dead or dropped participants never contribute to the minimum distance and
/// always count as out of range, so an agent with no live participant around
/// is always out of range.
pub fn evaluate(
    agent: &dyn AgentHandle,
    participants: &[Weak<dyn Participant>],
    range: f32,
) -> SpatialVerdict {
    if agent.readiness() != Readiness::Active {
        return SpatialVerdict::NotReady;
    }

    let range_sq = range * range;
    let position = agent.position();
    let mut out_of_range = 0usize;
    let mut min_distance_sq = f32::MAX;

    for participant in participants {
        let Some(participant) = participant.upgrade().filter(|p| p.is_alive()) else {
            out_of_range += 1;
            continue;
        };

        let distance_sq = position.distance_squared(participant.position());
        min_distance_sq = min_distance_sq.min(distance_sq);
        if distance_sq > range_sq {
            out_of_range += 1;
        }
    }

    SpatialVerdict::Evaluated {
        min_distance_sq,
        in_range: out_of_range < participants.len(),
    }
}
