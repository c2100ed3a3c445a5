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

//! Configuration model for agent throttling.
//!
//! The controller never owns configuration. It reads it live through a
//! [`ConfigSource`] and reacts to the [`ConfigEvent`]s the source publishes.
//! [`SharedConfig`] is the in-memory source used by headless hosts and tests.

mod shared;

pub use self::shared::SharedConfig;

use crate::agent::AgentRole;
use crate::event::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest accepted range threshold, in metres.
pub const MIN_RANGE: f32 = 50.0;
/// Largest accepted range threshold, in metres.
pub const MAX_RANGE: f32 = 1000.0;
/// Range used when nothing more specific is configured, in metres.
pub const DEFAULT_RANGE: f32 = 100.0;

/// Clamps a range threshold into `[MIN_RANGE, MAX_RANGE]`.
///
/// Non-finite values fall back to [`DEFAULT_RANGE`].
pub fn clamp_range(range: f32) -> f32 {
    if range.is_finite() {
        range.clamp(MIN_RANGE, MAX_RANGE)
    } else {
        DEFAULT_RANGE
    }
}

/// How often agents are re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateSetting {
    /// Least frequent checks.
    Low,
    /// Default cadence.
    #[default]
    Medium,
    /// Most frequent checks.
    High,
}

impl RateSetting {
    /// Multiplier applied to every computed check interval.
    ///
    /// A lower multiplier means more frequent checks.
    pub fn multiplier(self) -> f32 {
        match self {
            RateSetting::Low => 1.5,
            RateSetting::Medium => 1.0,
            RateSetting::High => 0.5,
        }
    }
}

/// A known region (map) with its own settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Factory, day and night.
    Factory,
    /// Customs.
    Customs,
    /// Woods.
    Woods,
    /// Shoreline.
    Shoreline,
    /// Interchange.
    Interchange,
    /// Reserve.
    Reserve,
    /// Lighthouse.
    Lighthouse,
    /// Streets.
    Streets,
    /// Ground Zero.
    GroundZero,
    /// Labs.
    Labs,
}

impl Region {
    /// Maps a raw location identifier to a known region, ignoring case.
    pub fn from_location_id(location_id: &str) -> Option<Self> {
        let region = match location_id.to_ascii_lowercase().as_str() {
            "factory4_day" | "factory4_night" => Region::Factory,
            "bigmap" => Region::Customs,
            "woods" => Region::Woods,
            "shoreline" => Region::Shoreline,
            "interchange" => Region::Interchange,
            "rezervbase" => Region::Reserve,
            "lighthouse" => Region::Lighthouse,
            "tarkovstreets" => Region::Streets,
            "sandbox" | "sandbox_high" => Region::GroundZero,
            "laboratory" => Region::Labs,
            _ => return None,
        };
        Some(region)
    }
}

/// Per-region enablement and range threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Whether throttling runs at all in this region.
    pub enabled: bool,
    /// Distance beyond which agents are suspended, in metres.
    pub range: f32,
}

impl RegionSettings {
    /// Settings for a region with nothing specific configured.
    pub fn fallback(range: f32) -> Self {
        Self {
            enabled: true,
            range,
        }
    }
}

/// Which role categories may be throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclusionSettings {
    /// Regular scavengers.
    pub scavs: bool,
    /// Sniper scavengers.
    pub snipers: bool,
    /// Rogues.
    pub rogues: bool,
    /// Raiders.
    pub raiders: bool,
    /// Simulated operators.
    pub pmcs: bool,
    /// Cultists.
    pub cultists: bool,
    /// Bosses.
    pub bosses: bool,
    /// Boss followers.
    pub followers: bool,
}

impl Default for InclusionSettings {
    fn default() -> Self {
        Self {
            scavs: true,
            snipers: true,
            rogues: true,
            raiders: true,
            pmcs: true,
            cultists: true,
            bosses: true,
            followers: true,
        }
    }
}

impl InclusionSettings {
    /// Returns the configured flag for a role, or `None` for roles that are
    /// not configurable.
    pub fn get(&self, role: AgentRole) -> Option<bool> {
        match role {
            AgentRole::Scav => Some(self.scavs),
            AgentRole::Sniper => Some(self.snipers),
            AgentRole::Rogue => Some(self.rogues),
            AgentRole::Raider => Some(self.raiders),
            AgentRole::Pmc => Some(self.pmcs),
            AgentRole::Cultist => Some(self.cultists),
            AgentRole::Boss => Some(self.bosses),
            AgentRole::Follower => Some(self.followers),
            AgentRole::VehicleGunner | AgentRole::Other => None,
        }
    }

    /// Sets the flag for a configurable role. Returns `false` if the role is
    /// not configurable.
    pub fn set(&mut self, role: AgentRole, included: bool) -> bool {
        let slot = match role {
            AgentRole::Scav => &mut self.scavs,
            AgentRole::Sniper => &mut self.snipers,
            AgentRole::Rogue => &mut self.rogues,
            AgentRole::Raider => &mut self.raiders,
            AgentRole::Pmc => &mut self.pmcs,
            AgentRole::Cultist => &mut self.cultists,
            AgentRole::Boss => &mut self.bosses,
            AgentRole::Follower => &mut self.followers,
            AgentRole::VehicleGunner | AgentRole::Other => return false,
        };
        *slot = included;
        true
    }
}

/// The complete throttling configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Range used for regions without their own entry.
    pub fallback_range: f32,
    /// Check cadence.
    pub rate: RateSetting,
    /// Per-region overrides.
    pub regions: BTreeMap<Region, RegionSettings>,
    /// Role categories that may be throttled.
    pub inclusion: InclusionSettings,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            fallback_range: DEFAULT_RANGE,
            rate: RateSetting::default(),
            regions: BTreeMap::new(),
            inclusion: InclusionSettings::default(),
        }
    }
}

impl ThrottleConfig {
    /// Clamps every range in the document into the accepted interval.
    pub fn normalized(mut self) -> Self {
        self.fallback_range = clamp_range(self.fallback_range);
        for settings in self.regions.values_mut() {
            settings.range = clamp_range(settings.range);
        }
        self
    }
}

/// Notification published when a configuration value changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigEvent {
    /// The rate setting changed.
    RateChanged(RateSetting),
    /// One or more inclusion flags changed.
    InclusionChanged,
    /// A region's settings changed. `None` means the fallback range.
    RegionChanged(Option<Region>),
}

/// The external configuration store.
///
/// Reads are live: the controller calls these every time it needs a value.
pub trait ConfigSource: Send + Sync {
    /// Settings configured for a known region, if any.
    fn region_settings(&self, region: Region) -> Option<RegionSettings>;

    /// Range used for regions without their own entry.
    fn fallback_range(&self) -> f32;

    /// Current rate setting.
    fn rate(&self) -> RateSetting;

    /// Current inclusion flags.
    fn inclusion(&self) -> InclusionSettings;

    /// Registers a sink for change notifications.
    fn subscribe(&self, sink: flume::Sender<ConfigEvent>) -> SubscriptionId;

    /// Removes a sink registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriptionId);

    /// Resolves the effective settings for an optional region.
    ///
    /// Unknown regions, and known regions without an entry, are enabled and
    /// use the fallback range.
    fn resolve(&self, region: Option<Region>) -> RegionSettings {
        region
            .and_then(|r| self.region_settings(r))
            .unwrap_or_else(|| RegionSettings::fallback(self.fallback_range()))
    }
}
