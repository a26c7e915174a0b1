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

//! Global settings for the rendering system.

use crate::math::Extent2D;
use serde::{Deserialize, Serialize};

/// A collection of global settings that affect how a device presents frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// The initial size of the output surface.
    pub surface_size: Extent2D,
    /// If `true`, presentation waits for vertical sync.
    pub vsync: bool,
    /// The color the surface is cleared to before the first blit of a frame.
    pub surface_clear_color: [f32; 4],
    /// A label prefix used for backend debug names.
    pub label: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            surface_size: Extent2D::new(1600, 1200),
            vsync: true,
            surface_clear_color: [0.0, 0.0, 0.0, 1.0],
            label: "lumen".to_string(),
        }
    }
}
