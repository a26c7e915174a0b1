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

//! The fixed-function state applied around draw calls.

use super::enums::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ColorWrites: u8 {
        /// Enable writes to the Red channel.
        const R = 0b0001;
        /// Enable writes to the Green channel.
        const G = 0b0010;
        /// Enable writes to the Blue channel.
        const B = 0b0100;
        /// Enable writes to the Alpha channel.
        const A = 0b1000;
        /// Enable writes to all channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

impl Default for ColorWrites {
    fn default() -> Self {
        ColorWrites::ALL
    }
}

/// Depth testing and depth writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthState {
    /// If `false`, every fragment passes and nothing is written to depth.
    pub test_enabled: bool,
    /// The comparison used when the test is enabled.
    pub compare: CompareFunction,
    /// If `true`, passing fragments write their depth.
    pub write_enabled: bool,
}

impl DepthState {
    /// Depth testing with the given compare function, writes enabled.
    pub const fn testing(compare: CompareFunction) -> Self {
        Self {
            test_enabled: true,
            compare,
            write_enabled: true,
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            compare: CompareFunction::Less,
            write_enabled: true,
        }
    }
}

/// The complete fixed-function state of a draw call.
///
/// `DrawState::default()` is the engine-wide neutral state every pass resets to:
/// depth test off, depth write on, compare `Less`, all color channels written,
/// no culling and no blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawState {
    /// Depth testing and writes.
    pub depth: DepthState,
    /// Color channel write mask, applied to every color target.
    pub color_writes: ColorWrites,
    /// Face culling.
    pub cull: CullMode,
    /// Blending, applied to every color target.
    pub blend: BlendMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_state_matches_reset_values() {
        let state = DrawState::default();
        assert!(!state.depth.test_enabled);
        assert!(state.depth.write_enabled);
        assert_eq!(state.depth.compare, CompareFunction::Less);
        assert_eq!(state.color_writes, ColorWrites::ALL);
        assert_eq!(state.cull, CullMode::Off);
        assert_eq!(state.blend, BlendMode::Off);
    }
}
