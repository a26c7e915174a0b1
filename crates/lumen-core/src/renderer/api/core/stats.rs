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

//! Per-frame statistics.

/// Counters gathered while executing one frame's command list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// The number of passes bound, including implicit re-binds.
    pub passes: u32,
    /// The number of draw calls issued.
    pub draw_calls: u32,
    /// The number of vertices or indices submitted.
    pub elements: u64,
    /// The number of blits, including the terminal blit to the surface.
    pub blits: u32,
}
