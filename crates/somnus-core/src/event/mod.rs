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

//! Provides the primitives collaborators use to push change notifications.
//!
//! Notifications travel over `flume` channels. A collaborator keeps a
//! [`Subscribers`] list of senders; a consumer hands in a sender, keeps the
//! receiving end, and gets back a [`SubscriptionId`] it must give back on
//! teardown so that nothing is ever delivered into released state.

mod subscribers;

pub use self::subscribers::{Subscribers, SubscriptionId};
