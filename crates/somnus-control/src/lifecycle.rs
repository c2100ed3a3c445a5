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

//! Owns the controller across session boundaries.

use crate::controller::{Controller, ControllerOptions, TickReport};
use somnus_core::config::ConfigSource;
use somnus_core::session::SessionAccess;
use somnus_core::ThrottleError;
use std::sync::Arc;

/// Creates a [`Controller`] when a session starts and tears it down when it
/// ends.
///
/// Hosts keep one `SessionLifecycle` and route their session hooks into it;
/// anything that needs the controller asks the lifecycle for it instead of
/// reaching for a global.
#[derive(Default)]
pub struct SessionLifecycle {
    controller: Option<Controller>,
    options: ControllerOptions,
}

impl SessionLifecycle {
    /// Creates a lifecycle that builds controllers with `options`.
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            controller: None,
            options,
        }
    }

    /// Attaches a controller to a freshly started session.
    ///
    /// Any previous controller is torn down first. Returns `true` if a
    /// controller is now running; otherwise throttling stays disabled for the
    /// session and the reason has been logged.
    pub fn start_session(
        &mut self,
        session: Arc<dyn SessionAccess>,
        config: Arc<dyn ConfigSource>,
    ) -> bool {
        self.end_session();

        if !session.is_authoritative() {
            log::debug!("Session is not authoritative, throttling stays off");
            return false;
        }

        match Controller::new(session, config, self.options) {
            Ok(controller) => {
                self.controller = Some(controller);
                true
            }
            Err(ThrottleError::Superseded(limiter)) => {
                log::warn!(
                    "{} is active, throttling disabled for this session. Use its limiter instead.",
                    limiter
                );
                false
            }
            Err(e) => {
                log::error!(
                    "Could not start throttling: {}. Disabled for this session.",
                    e
                );
                false
            }
        }
    }

    /// Forwards a participant-list change to the running controller.
    pub fn humans_joined(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.notify_humans_joined();
        }
    }

    /// Ticks the running controller, if any.
    pub fn tick(&mut self, now: f64) -> Option<TickReport> {
        self.controller.as_mut().map(|c| c.tick(now))
    }

    /// Tears down the running controller. Idempotent.
    pub fn end_session(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.teardown();
        }
    }

    /// Whether a controller is running.
    pub fn is_active(&self) -> bool {
        self.controller.is_some()
    }

    /// The running controller.
    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    /// The running controller, mutably.
    pub fn controller_mut(&mut self) -> Option<&mut Controller> {
        self.controller.as_mut()
    }
}

impl Drop for SessionLifecycle {
    fn drop(&mut self) {
        self.end_session();
    }
}
