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

//! # Somnus Control
//!
//! The control loop that suspends simulated agents far from every real
//! participant and resumes them when someone comes close again.
//!
//! Per tick the [`Controller`] asks the [`IntervalScheduler`] which agents are
//! due, runs the spatial check on each, applies the implied transition through
//! the [`SuspensionState`] and reschedules the agent on a tier derived from the
//! distance it just measured. Far agents are checked rarely, near agents often.

#![warn(missing_docs)]

pub mod controller;
pub mod lifecycle;
pub mod scheduler;
pub mod spatial;
pub mod suspension;
pub mod tracking;

pub use controller::{Controller, ControllerOptions, RefreshOutcome, TickReport};
pub use lifecycle::SessionLifecycle;
pub use scheduler::IntervalScheduler;
pub use spatial::SpatialVerdict;
pub use suspension::{SuspensionState, Transition};
pub use tracking::{InclusionTable, TrackingSet};
