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

//! # Candela Lanes
//!
//! Rendering execution paths built on the `candela-core` abstractions. The
//! crate currently ships one lane: the clustered deferred renderer in
//! [`deferred_lane`].

#![warn(missing_docs)]

pub mod deferred_lane;

pub use deferred_lane::{
    ClusteredDeferredLane, DeferredConfig, FrameOutcome, FrameStats, GeometryStrategy,
    SurfaceProvider,
};
