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

//! Error types shared by the throttling crates.

use crate::agent::AgentId;
use thiserror::Error;

/// Errors raised while setting up or running the throttling controller.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// A collaborator the controller cannot work without is absent.
    /// Fatal to the controller instance being created.
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// Another AI limiter already owns agent throttling in this session.
    #[error("throttling superseded by {0}")]
    Superseded(String),

    /// A transition was requested that is already satisfied.
    /// Logged as a diagnostic; the operation proceeds idempotently.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// An agent handle no longer resolves to a live engine object.
    #[error("stale reference to agent {0}")]
    StaleReference(AgentId),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Convenience alias for results carrying a [`ThrottleError`].
pub type ThrottleResult<T> = Result<T, ThrottleError>;
