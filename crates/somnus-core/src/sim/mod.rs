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

//! In-memory implementations of the session contracts.
//!
//! These back the headless sandbox and the test suites. Every side effect the
//! controller applies to a [`SimAgent`] is recorded in its [`SimAgentState`]
//! so it can be inspected afterwards.

mod agent;
mod session;

pub use self::agent::{SimAgent, SimAgentState};
pub use self::session::{SimParticipant, SimSession, SimSpawner};
