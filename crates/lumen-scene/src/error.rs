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

//! Errors returned while building or rendering a [`Scene`](crate::Scene).
//!
//! Misconfiguration of the scene itself (a full slot, an out-of-range index, a draw
//! issued before any pass) is a programming error and panics. What remains here are
//! failures reported by the device and malformed frame descriptions.

use lumen_core::renderer::{RenderError, ResourceError};

/// An error raised by the scene layer.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The device failed to create, update or destroy a resource.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The device failed while executing frame work.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A RON frame description could not be parsed.
    #[error("Frame description parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// A frame description parsed but refers to things that do not exist.
    #[error("Invalid frame description: {0}")]
    InvalidDescription(String),

    /// Decoded asset data the builders cannot turn into device resources.
    #[error("Unsupported asset data: {0}")]
    UnsupportedAsset(String),
}

/// Convenience alias used throughout the scene crate.
pub type Result<T, E = SceneError> = std::result::Result<T, E>;
