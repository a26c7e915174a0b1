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

use crate::math::{Extent2D, Extent3D, Rect2D};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::fmt::Debug;

/// A graphics device: the capability the scene layer renders through.
///
/// The contract is a binding state machine. Resources are created and destroyed
/// through opaque IDs; framebuffers, programs, geometry and textures are *bound*
/// and subsequent clears, uniform uploads and draws act on whatever is bound.
/// Every method takes `&mut self`: a device is driven from a single thread and the
/// borrow checker enforces exclusive access.
///
/// Bind and unbind calls are infallible. Problems with bound state (an unknown ID,
/// a missing program) surface from the call that consumes it, usually [`draw`].
///
/// [`draw`]: GraphicsDevice::draw
pub trait GraphicsDevice: Debug {
    // --- Textures ---

    /// Creates a new GPU texture.
    /// ## Arguments
    /// * `descriptor` - A reference to a `TextureDescriptor` containing the texture configuration.
    /// ## Returns
    /// A `Result` containing the ID of the created texture or an error if the creation fails.
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError>;

    /// Uploads pixel data into one array layer (one cubemap face, or the whole
    /// texture otherwise) of the top mip level.
    /// ## Arguments
    /// * `id` - The texture to write to.
    /// * `layer` - The array layer (cube face) to fill.
    /// * `data` - Tightly packed pixels in the texture's format.
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If `data` does not match the layer size.
    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Reallocates the storage of a texture at a new size, keeping its ID, format and
    /// usage. The previous contents are discarded. Framebuffer objects that have the
    /// texture attached observe the new storage.
    fn reallocate_texture(&mut self, id: TextureId, size: Extent3D) -> Result<(), ResourceError>;

    /// Returns the size of a texture, or `None` for an unknown ID.
    fn texture_size(&self, id: TextureId) -> Option<Extent3D>;

    /// Destroys a GPU texture.
    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError>;

    // --- Geometry ---

    /// Creates a vertex source from one or more vertex buffers.
    /// ## Arguments
    /// * `descriptor` - The buffers and their attribute layouts.
    /// ## Returns
    /// The ID of the new vertex source.
    fn create_vertex_source(
        &mut self,
        descriptor: &VertexSourceDescriptor,
    ) -> Result<VertexSourceId, ResourceError>;

    /// Destroys a vertex source.
    fn destroy_vertex_source(&mut self, id: VertexSourceId) -> Result<(), ResourceError>;

    /// Creates an index source. Backends without 8-bit indices widen them on upload.
    fn create_index_source(
        &mut self,
        descriptor: &IndexSourceDescriptor,
    ) -> Result<IndexSourceId, ResourceError>;

    /// Destroys an index source.
    fn destroy_index_source(&mut self, id: IndexSourceId) -> Result<(), ResourceError>;

    // --- Programs ---

    /// Compiles and links a shader program.
    /// ## Arguments
    /// * `descriptor` - The WGSL source, entry points and the names of its inputs.
    /// ## Errors
    /// * `ResourceError::Shader` - Carrying the compiler log if compilation fails.
    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramId, ResourceError>;

    /// Destroys a shader program.
    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError>;

    // --- Framebuffer objects ---

    /// Creates an empty framebuffer object.
    fn create_framebuffer_object(
        &mut self,
        label: Option<&str>,
    ) -> Result<FramebufferObjectId, ResourceError>;

    /// Destroys a framebuffer object. Attached textures are not destroyed.
    fn destroy_framebuffer_object(&mut self, id: FramebufferObjectId) -> Result<(), ResourceError>;

    /// Attaches a texture to an attachment point of the framebuffer object currently
    /// bound to the draw target.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If no framebuffer object is bound to the draw target.
    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        texture: TextureId,
    ) -> Result<(), ResourceError>;

    /// Detaches whatever is attached at `point` of the framebuffer object bound to
    /// the draw target.
    fn detach(&mut self, point: AttachmentPoint) -> Result<(), ResourceError>;

    /// Sets the list of color attachments fragment outputs `0..n` write to, for the
    /// framebuffer object bound to the draw target.
    fn set_draw_buffers(&mut self, buffers: &[AttachmentPoint]) -> Result<(), ResourceError>;

    /// Returns the draw buffer list of a framebuffer object.
    fn draw_buffers(&self, id: FramebufferObjectId) -> Vec<AttachmentPoint>;

    /// Checks whether a framebuffer object can be rendered to.
    fn framebuffer_status(&self, id: FramebufferObjectId) -> FramebufferStatus;

    // --- Binding state ---

    /// Binds a render target to a framebuffer binding point.
    fn bind_framebuffer(&mut self, target: FramebufferTarget, render_target: RenderTarget);

    /// Returns what is bound to a framebuffer binding point.
    fn bound_framebuffer(&self, target: FramebufferTarget) -> RenderTarget;

    /// Sets the viewport draws are mapped to.
    fn set_viewport(&mut self, viewport: Rect2D);

    /// Replaces the whole fixed-function state.
    fn set_draw_state(&mut self, state: &DrawState);

    /// Returns the current fixed-function state.
    fn draw_state(&self) -> DrawState;

    /// Binds a vertex source for subsequent draws.
    fn bind_vertex_source(&mut self, id: VertexSourceId);

    /// Unbinds the vertex source.
    fn unbind_vertex_source(&mut self);

    /// Binds an index source for subsequent indexed draws.
    fn bind_index_source(&mut self, id: IndexSourceId);

    /// Unbinds the index source.
    fn unbind_index_source(&mut self);

    /// Makes a program current. Uniform uploads target the current program.
    fn bind_program(&mut self, id: ProgramId);

    /// Clears the current program.
    fn unbind_program(&mut self);

    /// Binds a texture to a texture unit.
    fn bind_texture(&mut self, unit: u32, id: TextureId);

    /// Unbinds whatever texture is bound to a texture unit.
    fn unbind_texture(&mut self, unit: u32);

    /// Uploads a uniform of the current program by name. Sampler names take an
    /// [`UniformValue::Int`] holding the texture unit to sample from.
    /// ## Returns
    /// `false` if the current program has no input of that name (or no program is
    /// bound); the value is then dropped. Callers treat this as a no-op.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool;

    // --- Work ---

    /// Clears one draw buffer of the draw target (index into its draw buffer list;
    /// the surface has a single draw buffer `0`).
    fn clear_color(&mut self, draw_buffer: u32, color: [f32; 4]) -> Result<(), RenderError>;

    /// Clears the depth attachment of the draw target, if it has one.
    fn clear_depth(&mut self, depth: f32) -> Result<(), RenderError>;

    /// Issues a draw with the bound geometry, program, textures and state into the
    /// draw target.
    /// ## Errors
    /// * `PipelineError::FeatureNotSupported` - If the backend cannot draw `topology`.
    /// * `PipelineError::MissingProgram` / `MissingVertexSource` / `MissingIndexSource`.
    fn draw(&mut self, topology: PrimitiveTopology, call: DrawCall) -> Result<(), RenderError>;

    /// Copies the first color attachment of the read target into every draw buffer of
    /// the draw target, scaling `src` onto `dst`.
    fn blit_framebuffer(
        &mut self,
        src: Rect2D,
        dst: Rect2D,
        filter: FilterMode,
    ) -> Result<(), RenderError>;

    /// Reads back a region of the read target's first color attachment as linear RGBA
    /// floats, row by row from the top.
    fn read_pixels(&mut self, rect: Rect2D) -> Result<Vec<[f32; 4]>, RenderError>;

    // --- Surface ---

    /// Returns the current size of the output surface.
    fn surface_size(&self) -> Extent2D;

    /// Resizes the output surface.
    fn resize_surface(&mut self, size: Extent2D) -> Result<(), RenderError>;

    /// Submits all recorded work and presents the surface.
    fn present(&mut self) -> Result<(), RenderError>;
}
