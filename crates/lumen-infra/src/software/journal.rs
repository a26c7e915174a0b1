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

//! The call journal kept by the software device.

use lumen_core::math::{Extent3D, Rect2D};
use lumen_core::renderer::{
    AttachmentPoint, DrawCall, DrawState, FramebufferTarget, IndexSourceId, PrimitiveTopology,
    ProgramId, RenderTarget, TextureId, UniformValue, VertexSourceId,
};

/// One state-changing call received by a [`SoftwareDevice`](super::SoftwareDevice).
///
/// Resource creation and destruction are not journaled; binding, clearing, drawing
/// and blitting are, in the order they were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// `bind_framebuffer`
    BindFramebuffer {
        /// The binding point.
        target: FramebufferTarget,
        /// What was bound to it.
        render_target: RenderTarget,
    },
    /// `set_viewport`
    Viewport(Rect2D),
    /// `attach_texture`
    Attach {
        /// The attachment point.
        point: AttachmentPoint,
        /// The attached texture.
        texture: TextureId,
    },
    /// `detach`
    Detach(AttachmentPoint),
    /// `set_draw_buffers`
    DrawBuffers(Vec<AttachmentPoint>),
    /// `reallocate_texture`
    Reallocate {
        /// The texture.
        texture: TextureId,
        /// Its new size.
        size: Extent3D,
    },
    /// `clear_color`
    ClearColor {
        /// The render target cleared.
        target: RenderTarget,
        /// The draw buffer index.
        draw_buffer: u32,
        /// The clear color.
        color: [f32; 4],
    },
    /// `clear_depth`
    ClearDepth {
        /// The render target cleared.
        target: RenderTarget,
        /// The clear depth.
        depth: f32,
    },
    /// `set_draw_state`
    DrawState(DrawState),
    /// `bind_vertex_source`
    BindVertexSource(VertexSourceId),
    /// `unbind_vertex_source`
    UnbindVertexSource,
    /// `bind_index_source`
    BindIndexSource(IndexSourceId),
    /// `unbind_index_source`
    UnbindIndexSource,
    /// `bind_program`
    BindProgram(ProgramId),
    /// `unbind_program`
    UnbindProgram,
    /// `bind_texture`
    BindTexture {
        /// The texture unit.
        unit: u32,
        /// The bound texture.
        texture: TextureId,
    },
    /// `unbind_texture`
    UnbindTexture {
        /// The texture unit.
        unit: u32,
    },
    /// `set_uniform`
    SetUniform {
        /// The uniform or sampler name.
        name: String,
        /// The uploaded value.
        value: UniformValue,
        /// Whether the current program declares the name.
        found: bool,
    },
    /// `draw`
    Draw {
        /// The render target drawn into.
        target: RenderTarget,
        /// The program used.
        program: ProgramId,
        /// The primitive topology.
        topology: PrimitiveTopology,
        /// The call shape.
        call: DrawCall,
        /// The fixed-function state in effect.
        state: DrawState,
    },
    /// `blit_framebuffer`
    Blit {
        /// The read target.
        src: RenderTarget,
        /// The draw target.
        dst: RenderTarget,
        /// The source region.
        src_rect: Rect2D,
        /// The destination region.
        dst_rect: Rect2D,
    },
    /// `present`
    Present,
}
