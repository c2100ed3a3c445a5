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

//! In-memory configuration store with change notifications.

use super::{
    clamp_range, ConfigEvent, ConfigSource, InclusionSettings, RateSetting, Region, RegionSettings,
    ThrottleConfig,
};
use crate::agent::AgentRole;
use crate::error::ThrottleResult;
use crate::event::{Subscribers, SubscriptionId};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A [`ConfigSource`] backed by an in-memory [`ThrottleConfig`].
///
/// Every setter publishes a [`ConfigEvent`] when, and only when, the value
/// actually changes.
#[derive(Debug, Default)]
pub struct SharedConfig {
    config: RwLock<ThrottleConfig>,
    subscribers: Subscribers<ConfigEvent>,
}

impl SharedConfig {
    /// Creates a store holding `config`, with ranges clamped.
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config: RwLock::new(config.normalized()),
            subscribers: Subscribers::new(),
        }
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> ThrottleResult<Self> {
        let config: ThrottleConfig = serde_json::from_str(json)?;
        Ok(Self::new(config))
    }

    /// Returns a copy of the whole document.
    pub fn snapshot(&self) -> ThrottleConfig {
        self.read().clone()
    }

    /// Changes the rate setting.
    pub fn set_rate(&self, rate: RateSetting) {
        {
            let mut config = self.write();
            if config.rate == rate {
                return;
            }
            config.rate = rate;
        }
        log::info!("Throttle rate set to {:?}", rate);
        self.subscribers.publish(ConfigEvent::RateChanged(rate));
    }

    /// Changes the inclusion flag of a single role.
    ///
    /// Returns `false` if the role is not configurable.
    pub fn set_role_included(&self, role: AgentRole, included: bool) -> bool {
        {
            let mut config = self.write();
            if config.inclusion.get(role) == Some(included) {
                return true;
            }
            if !config.inclusion.set(role, included) {
                return false;
            }
        }
        log::info!("Throttling of {:?} set to {}", role, included);
        self.subscribers.publish(ConfigEvent::InclusionChanged);
        true
    }

    /// Replaces every inclusion flag at once.
    pub fn set_inclusion(&self, inclusion: InclusionSettings) {
        {
            let mut config = self.write();
            if config.inclusion == inclusion {
                return;
            }
            config.inclusion = inclusion;
        }
        self.subscribers.publish(ConfigEvent::InclusionChanged);
    }

    /// Sets the settings of a known region. The range is clamped.
    pub fn set_region(&self, region: Region, settings: RegionSettings) {
        let settings = RegionSettings {
            range: clamp_range(settings.range),
            ..settings
        };
        {
            let mut config = self.write();
            if config.regions.get(&region) == Some(&settings) {
                return;
            }
            config.regions.insert(region, settings);
        }
        log::info!(
            "Region {:?}: enabled={} range={:.0}m",
            region,
            settings.enabled,
            settings.range
        );
        self.subscribers
            .publish(ConfigEvent::RegionChanged(Some(region)));
    }

    /// Sets the range used by regions without their own entry. The range is clamped.
    pub fn set_fallback_range(&self, range: f32) {
        let range = clamp_range(range);
        {
            let mut config = self.write();
            if config.fallback_range == range {
                return;
            }
            config.fallback_range = range;
        }
        self.subscribers.publish(ConfigEvent::RegionChanged(None));
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, ThrottleConfig> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ThrottleConfig> {
        self.config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigSource for SharedConfig {
    fn region_settings(&self, region: Region) -> Option<RegionSettings> {
        self.read().regions.get(&region).copied()
    }

    fn fallback_range(&self) -> f32 {
        self.read().fallback_range
    }

    fn rate(&self) -> RateSetting {
        self.read().rate
    }

    fn inclusion(&self) -> InclusionSettings {
        self.read().inclusion
    }

    fn subscribe(&self, sink: flume::Sender<ConfigEvent>) -> SubscriptionId {
        self.subscribers.subscribe(sink)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if !self.subscribers.unsubscribe(id) {
            log::debug!("Config subscription {:?} was already removed", id);
        }
    }
}
