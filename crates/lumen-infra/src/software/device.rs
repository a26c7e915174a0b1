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

use std::collections::{BTreeMap, HashMap};

use lumen_core::math::{Extent2D, Extent3D, Rect2D};
use lumen_core::renderer::{
    AttachmentPoint, DrawCall, DrawState, FilterMode, FramebufferObjectId, FramebufferStatus,
    FramebufferTarget, GraphicsDevice, IndexFormat, IndexSourceDescriptor, IndexSourceId,
    PipelineError, PrimitiveTopology, ProgramDescriptor, ProgramId, RenderError, RenderSettings,
    RenderTarget, ResourceError, ShaderError, TextureDescriptor, TextureFormat, TextureId,
    TextureViewDimension, UniformType, UniformValue, VertexSourceDescriptor, VertexSourceId,
    MAX_COLOR_ATTACHMENTS,
};

use super::journal::DeviceCall;
use crate::texel;

#[derive(Debug)]
struct SoftTexture {
    label: String,
    dimension: TextureViewDimension,
    format: TextureFormat,
    size: Extent3D,
    texels: Vec<[f32; 4]>,
}

impl SoftTexture {
    fn new(
        label: String,
        dimension: TextureViewDimension,
        format: TextureFormat,
        size: Extent3D,
    ) -> Self {
        let len = size.width as usize * size.height as usize * size.depth_or_array_layers as usize;
        Self {
            label,
            dimension,
            format,
            size,
            texels: vec![[0.0; 4]; len],
        }
    }

    fn layer_len(&self) -> usize {
        match self.dimension {
            TextureViewDimension::D3 => self.texels.len(),
            _ => self.size.width as usize * self.size.height as usize,
        }
    }

    fn extent(&self) -> Extent2D {
        self.size.to_2d()
    }

    fn fill(&mut self, color: [f32; 4]) {
        let color = texel::quantize(self.format, color);
        let layer = self.size.width as usize * self.size.height as usize;
        self.texels[..layer].fill(color);
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[(y * self.size.width + x) as usize]
    }

    fn set_texel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let index = (y * self.size.width + x) as usize;
        self.texels[index] = texel::quantize(self.format, color);
    }

    /// Bilinear or nearest sample at pixel coordinates `(u, v)`, clamped to `bounds`.
    fn sample(&self, u: f32, v: f32, bounds: Rect2D, filter: FilterMode) -> [f32; 4] {
        let min_x = bounds.origin.x;
        let min_y = bounds.origin.y;
        let max_x = bounds.origin.x + bounds.extent.width - 1;
        let max_y = bounds.origin.y + bounds.extent.height - 1;
        match filter {
            FilterMode::Nearest => {
                let x = (u.floor() as i64).clamp(min_x as i64, max_x as i64) as u32;
                let y = (v.floor() as i64).clamp(min_y as i64, max_y as i64) as u32;
                self.texel(x, y)
            }
            FilterMode::Linear => {
                let fx = (u - 0.5).clamp(min_x as f32, max_x as f32);
                let fy = (v - 0.5).clamp(min_y as f32, max_y as f32);
                let x0 = fx.floor() as u32;
                let y0 = fy.floor() as u32;
                let x1 = (x0 + 1).min(max_x);
                let y1 = (y0 + 1).min(max_y);
                let tx = fx - x0 as f32;
                let ty = fy - y0 as f32;
                let lerp = |a: [f32; 4], b: [f32; 4], t: f32| {
                    [0, 1, 2, 3].map(|i| a[i] + (b[i] - a[i]) * t)
                };
                let top = lerp(self.texel(x0, y0), self.texel(x1, y0), tx);
                let bottom = lerp(self.texel(x0, y1), self.texel(x1, y1), tx);
                lerp(top, bottom, ty)
            }
        }
    }
}

#[derive(Debug, Default)]
struct SoftFramebuffer {
    colors: [Option<TextureId>; MAX_COLOR_ATTACHMENTS],
    depth: Option<TextureId>,
    draw_buffers: Vec<AttachmentPoint>,
}

impl SoftFramebuffer {
    fn attachment(&self, point: AttachmentPoint) -> Option<TextureId> {
        match point {
            AttachmentPoint::Color(n) => self.colors.get(n as usize).copied().flatten(),
            AttachmentPoint::Depth => self.depth,
        }
    }

    fn slot_mut(
        &mut self,
        point: AttachmentPoint,
    ) -> Result<&mut Option<TextureId>, ResourceError> {
        match point {
            AttachmentPoint::Color(n) => self
                .colors
                .get_mut(n as usize)
                .ok_or(ResourceError::OutOfBounds),
            AttachmentPoint::Depth => Ok(&mut self.depth),
        }
    }

    fn attached(&self) -> impl Iterator<Item = (AttachmentPoint, TextureId)> + '_ {
        let colors = self
            .colors
            .iter()
            .enumerate()
            .filter_map(|(n, tex)| tex.map(|t| (AttachmentPoint::Color(n as u8), t)));
        colors.chain(self.depth.map(|t| (AttachmentPoint::Depth, t)))
    }
}

#[derive(Debug)]
struct SoftProgram {
    uniforms: HashMap<String, UniformType>,
    samplers: Vec<String>,
    values: HashMap<String, UniformValue>,
}

#[derive(Debug)]
struct SoftIndexSource {
    format: IndexFormat,
    count: u32,
}

#[derive(Debug, Default)]
struct BindingState {
    draw: RenderTarget,
    read: RenderTarget,
    viewport: Rect2D,
    draw_state: DrawState,
    vertex_source: Option<VertexSourceId>,
    index_source: Option<IndexSourceId>,
    program: Option<ProgramId>,
    textures: BTreeMap<u32, TextureId>,
}

/// Where texels live: the surface or a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Store {
    Surface,
    Texture(TextureId),
}

/// A CPU implementation of [`GraphicsDevice`].
///
/// Clears, blits and readbacks operate on real texel storage, so the contents of
/// framebuffers and of the surface can be inspected after a frame. Draw calls are
/// validated and journaled but not rasterized. Every state-changing call is appended
/// to a [`DeviceCall`] journal, which makes the device suitable for asserting the
/// exact order in which the scene layer drives a backend.
///
/// The device does not compile WGSL: program creation checks that the declared entry
/// points are present in the source and that input names are unique.
#[derive(Debug)]
pub struct SoftwareDevice {
    textures: HashMap<TextureId, SoftTexture>,
    vertex_sources: HashMap<VertexSourceId, Option<u32>>,
    index_sources: HashMap<IndexSourceId, SoftIndexSource>,
    programs: HashMap<ProgramId, SoftProgram>,
    framebuffers: HashMap<FramebufferObjectId, SoftFramebuffer>,
    surface: SoftTexture,
    state: BindingState,
    next_id: usize,
    journal: Vec<DeviceCall>,
}

impl SoftwareDevice {
    /// Creates a device whose surface has the given size.
    pub fn new(surface_size: Extent2D) -> Self {
        log::info!(
            "SoftwareDevice: created with a {}x{} surface",
            surface_size.width,
            surface_size.height
        );
        Self {
            textures: HashMap::new(),
            vertex_sources: HashMap::new(),
            index_sources: HashMap::new(),
            programs: HashMap::new(),
            framebuffers: HashMap::new(),
            surface: Self::make_surface(surface_size),
            state: BindingState {
                viewport: Rect2D::from_extent(surface_size),
                ..Default::default()
            },
            next_id: 0,
            journal: Vec::new(),
        }
    }

    /// Creates a device from render settings; the surface starts out cleared to
    /// `settings.surface_clear_color`.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let mut device = Self::new(settings.surface_size);
        device.surface.fill(settings.surface_clear_color);
        device
    }

    /// The calls journaled since creation or the last [`take_journal`](Self::take_journal).
    pub fn journal(&self) -> &[DeviceCall] {
        &self.journal
    }

    /// Drains the journal.
    pub fn take_journal(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.journal)
    }

    /// The number of live resources of every kind.
    pub fn live_resources(&self) -> usize {
        self.textures.len()
            + self.vertex_sources.len()
            + self.index_sources.len()
            + self.programs.len()
            + self.framebuffers.len()
    }

    /// The last value uploaded to a program input, if any.
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.programs.get(&program)?.values.get(name).copied()
    }

    /// The texture bound to a unit, if any.
    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.state.textures.get(&unit).copied()
    }

    /// The debug label a texture was created with.
    pub fn texture_label(&self, id: TextureId) -> Option<&str> {
        self.textures.get(&id).map(|t| t.label.as_str())
    }

    fn make_surface(size: Extent2D) -> SoftTexture {
        SoftTexture::new(
            "surface".to_string(),
            TextureViewDimension::D2,
            TextureFormat::Rgba8Unorm,
            Extent3D::from_2d(Extent2D::new(size.width.max(1), size.height.max(1))),
        )
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn store(&self, store: Store) -> Result<&SoftTexture, ResourceError> {
        match store {
            Store::Surface => Ok(&self.surface),
            Store::Texture(id) => self.textures.get(&id).ok_or(ResourceError::InvalidHandle),
        }
    }

    fn store_mut(&mut self, store: Store) -> Result<&mut SoftTexture, ResourceError> {
        match store {
            Store::Surface => Ok(&mut self.surface),
            Store::Texture(id) => self
                .textures
                .get_mut(&id)
                .ok_or(ResourceError::InvalidHandle),
        }
    }

    fn bound_fbo_mut(&mut self) -> Result<&mut SoftFramebuffer, ResourceError> {
        match self.state.draw {
            RenderTarget::Framebuffer(id) => self
                .framebuffers
                .get_mut(&id)
                .ok_or(ResourceError::InvalidHandle),
            RenderTarget::Surface => Err(ResourceError::InvalidHandle),
        }
    }

    /// The stores fragment outputs `0..n` of `target` land in.
    fn draw_stores(&self, target: RenderTarget) -> Result<Vec<Store>, ResourceError> {
        match target {
            RenderTarget::Surface => Ok(vec![Store::Surface]),
            RenderTarget::Framebuffer(id) => {
                let fbo = self.framebuffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
                Ok(fbo
                    .draw_buffers
                    .iter()
                    .filter_map(|point| fbo.attachment(*point))
                    .map(Store::Texture)
                    .collect())
            }
        }
    }

    /// The store blits and readbacks read from: the first color attachment.
    fn read_store(&self, target: RenderTarget) -> Result<Store, ResourceError> {
        match target {
            RenderTarget::Surface => Ok(Store::Surface),
            RenderTarget::Framebuffer(id) => {
                let fbo = self.framebuffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
                fbo.colors[0]
                    .map(Store::Texture)
                    .ok_or(ResourceError::NotFound)
            }
        }
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let mut size = descriptor.size;
        if descriptor.dimension == TextureViewDimension::Cube {
            size.depth_or_array_layers = 6;
        }
        let id = TextureId(self.next_id());
        let label = descriptor.label.as_deref().unwrap_or("texture").to_string();
        log::debug!(
            "SoftwareDevice: texture {:?} '{}' {:?} {}x{}x{}",
            id,
            label,
            descriptor.format,
            size.width,
            size.height,
            size.depth_or_array_layers
        );
        self.textures.insert(
            id,
            SoftTexture::new(label, descriptor.dimension, descriptor.format, size),
        );
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let texture = self.textures.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        let layer_len = texture.layer_len();
        let layers = texture.texels.len() / layer_len.max(1);
        if layer as usize >= layers
            || data.len() != layer_len * texture.format.bytes_per_pixel() as usize
        {
            return Err(ResourceError::OutOfBounds);
        }
        let decoded = texel::decode_texels(texture.format, data);
        let start = layer as usize * layer_len;
        texture.texels[start..start + layer_len].copy_from_slice(&decoded);
        Ok(())
    }

    fn reallocate_texture(&mut self, id: TextureId, size: Extent3D) -> Result<(), ResourceError> {
        let texture = self.textures.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        let replacement = SoftTexture::new(
            std::mem::take(&mut texture.label),
            texture.dimension,
            texture.format,
            size,
        );
        *texture = replacement;
        self.journal.push(DeviceCall::Reallocate { texture: id, size });
        Ok(())
    }

    fn texture_size(&self, id: TextureId) -> Option<Extent3D> {
        self.textures.get(&id).map(|t| t.size)
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        self.textures
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_vertex_source(
        &mut self,
        descriptor: &VertexSourceDescriptor,
    ) -> Result<VertexSourceId, ResourceError> {
        let mut vertex_count: Option<u32> = None;
        for buffer in &descriptor.buffers {
            if buffer.layout.array_stride == 0 {
                return Err(ResourceError::BackendError(
                    "vertex buffer with zero stride".to_string(),
                ));
            }
            let count = (buffer.data.len() as u64 / buffer.layout.array_stride) as u32;
            vertex_count = Some(vertex_count.map_or(count, |c| c.min(count)));
        }
        let id = VertexSourceId(self.next_id());
        self.vertex_sources.insert(id, vertex_count);
        Ok(id)
    }

    fn destroy_vertex_source(&mut self, id: VertexSourceId) -> Result<(), ResourceError> {
        self.vertex_sources
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_index_source(
        &mut self,
        descriptor: &IndexSourceDescriptor,
    ) -> Result<IndexSourceId, ResourceError> {
        let id = IndexSourceId(self.next_id());
        self.index_sources.insert(
            id,
            SoftIndexSource {
                format: descriptor.format,
                count: descriptor.index_count(),
            },
        );
        Ok(id)
    }

    fn destroy_index_source(&mut self, id: IndexSourceId) -> Result<(), ResourceError> {
        self.index_sources
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramId, ResourceError> {
        let label = descriptor.label_or_default().to_string();
        for entry in [&descriptor.vertex_entry, &descriptor.fragment_entry] {
            if !descriptor.source.contains(&format!("fn {entry}")) {
                return Err(ShaderError::InvalidEntryPoint {
                    label,
                    entry_point: entry.to_string(),
                }
                .into());
            }
        }

        let mut uniforms = HashMap::new();
        for decl in &descriptor.uniforms {
            if uniforms.insert(decl.name.clone(), decl.ty).is_some() {
                return Err(ShaderError::CompilationError {
                    label,
                    details: format!("uniform '{}' declared twice", decl.name),
                }
                .into());
            }
        }
        let samplers: Vec<String> = descriptor.samplers.iter().map(|s| s.name.clone()).collect();
        if let Some(clash) = samplers.iter().find(|s| uniforms.contains_key(*s)) {
            return Err(ShaderError::CompilationError {
                label,
                details: format!("'{clash}' declared as both uniform and sampler"),
            }
            .into());
        }

        let id = ProgramId(self.next_id());
        log::debug!("SoftwareDevice: program {id:?} '{label}'");
        self.programs.insert(
            id,
            SoftProgram {
                uniforms,
                samplers,
                values: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError> {
        self.programs
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_framebuffer_object(
        &mut self,
        label: Option<&str>,
    ) -> Result<FramebufferObjectId, ResourceError> {
        let id = FramebufferObjectId(self.next_id());
        log::debug!("SoftwareDevice: framebuffer object {id:?} {label:?}");
        self.framebuffers.insert(id, SoftFramebuffer::default());
        Ok(id)
    }

    fn destroy_framebuffer_object(&mut self, id: FramebufferObjectId) -> Result<(), ResourceError> {
        self.framebuffers
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        texture: TextureId,
    ) -> Result<(), ResourceError> {
        if !self.textures.contains_key(&texture) {
            return Err(ResourceError::InvalidHandle);
        }
        *self.bound_fbo_mut()?.slot_mut(point)? = Some(texture);
        self.journal.push(DeviceCall::Attach { point, texture });
        Ok(())
    }

    fn detach(&mut self, point: AttachmentPoint) -> Result<(), ResourceError> {
        *self.bound_fbo_mut()?.slot_mut(point)? = None;
        self.journal.push(DeviceCall::Detach(point));
        Ok(())
    }

    fn set_draw_buffers(&mut self, buffers: &[AttachmentPoint]) -> Result<(), ResourceError> {
        let valid = buffers.iter().all(|p| {
            matches!(p, AttachmentPoint::Color(n) if (*n as usize) < MAX_COLOR_ATTACHMENTS)
        });
        if !valid {
            return Err(ResourceError::OutOfBounds);
        }
        self.bound_fbo_mut()?.draw_buffers = buffers.to_vec();
        self.journal.push(DeviceCall::DrawBuffers(buffers.to_vec()));
        Ok(())
    }

    fn draw_buffers(&self, id: FramebufferObjectId) -> Vec<AttachmentPoint> {
        self.framebuffers
            .get(&id)
            .map(|fbo| fbo.draw_buffers.clone())
            .unwrap_or_default()
    }

    fn framebuffer_status(&self, id: FramebufferObjectId) -> FramebufferStatus {
        let Some(fbo) = self.framebuffers.get(&id) else {
            return FramebufferStatus::MissingAttachment;
        };
        let mut size: Option<Extent2D> = None;
        for (point, texture) in fbo.attached() {
            let Some(texture) = self.textures.get(&texture) else {
                return FramebufferStatus::IncompleteAttachment(point);
            };
            if texture.format.is_depth() == point.is_color() {
                return FramebufferStatus::IncompleteAttachment(point);
            }
            match size {
                Some(s) if s != texture.extent() => return FramebufferStatus::MismatchedDimensions,
                _ => size = Some(texture.extent()),
            }
        }
        if size.is_none() {
            FramebufferStatus::MissingAttachment
        } else {
            FramebufferStatus::Complete
        }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, render_target: RenderTarget) {
        match target {
            FramebufferTarget::Draw => self.state.draw = render_target,
            FramebufferTarget::Read => self.state.read = render_target,
        }
        self.journal.push(DeviceCall::BindFramebuffer {
            target,
            render_target,
        });
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> RenderTarget {
        match target {
            FramebufferTarget::Draw => self.state.draw,
            FramebufferTarget::Read => self.state.read,
        }
    }

    fn set_viewport(&mut self, viewport: Rect2D) {
        self.state.viewport = viewport;
        self.journal.push(DeviceCall::Viewport(viewport));
    }

    fn set_draw_state(&mut self, state: &DrawState) {
        self.state.draw_state = *state;
        self.journal.push(DeviceCall::DrawState(*state));
    }

    fn draw_state(&self) -> DrawState {
        self.state.draw_state
    }

    fn bind_vertex_source(&mut self, id: VertexSourceId) {
        self.state.vertex_source = Some(id);
        self.journal.push(DeviceCall::BindVertexSource(id));
    }

    fn unbind_vertex_source(&mut self) {
        self.state.vertex_source = None;
        self.journal.push(DeviceCall::UnbindVertexSource);
    }

    fn bind_index_source(&mut self, id: IndexSourceId) {
        self.state.index_source = Some(id);
        self.journal.push(DeviceCall::BindIndexSource(id));
    }

    fn unbind_index_source(&mut self) {
        self.state.index_source = None;
        self.journal.push(DeviceCall::UnbindIndexSource);
    }

    fn bind_program(&mut self, id: ProgramId) {
        self.state.program = Some(id);
        self.journal.push(DeviceCall::BindProgram(id));
    }

    fn unbind_program(&mut self) {
        self.state.program = None;
        self.journal.push(DeviceCall::UnbindProgram);
    }

    fn bind_texture(&mut self, unit: u32, id: TextureId) {
        self.state.textures.insert(unit, id);
        self.journal.push(DeviceCall::BindTexture { unit, texture: id });
    }

    fn unbind_texture(&mut self, unit: u32) {
        self.state.textures.remove(&unit);
        self.journal.push(DeviceCall::UnbindTexture { unit });
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        let program = self.state.program.and_then(|id| self.programs.get_mut(&id));
        let found = match program {
            Some(program) => {
                let accepted = match program.uniforms.get(name) {
                    Some(ty) => *ty == value.uniform_type(),
                    None => {
                        program.samplers.iter().any(|s| s == name)
                            && matches!(value, UniformValue::Int(_))
                    }
                };
                if accepted {
                    program.values.insert(name.to_string(), value);
                }
                accepted
            }
            None => false,
        };
        self.journal.push(DeviceCall::SetUniform {
            name: name.to_string(),
            value,
            found,
        });
        found
    }

    fn clear_color(&mut self, draw_buffer: u32, color: [f32; 4]) -> Result<(), RenderError> {
        let target = self.state.draw;
        let stores = self.draw_stores(target)?;
        let store = *stores
            .get(draw_buffer as usize)
            .ok_or(ResourceError::OutOfBounds)?;
        self.store_mut(store)?.fill(color);
        self.journal.push(DeviceCall::ClearColor {
            target,
            draw_buffer,
            color,
        });
        Ok(())
    }

    fn clear_depth(&mut self, depth: f32) -> Result<(), RenderError> {
        let target = self.state.draw;
        if let RenderTarget::Framebuffer(id) = target {
            let fbo = self.framebuffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
            if let Some(texture) = fbo.depth {
                self.store_mut(Store::Texture(texture))?
                    .fill([depth, 0.0, 0.0, 1.0]);
            }
        }
        self.journal.push(DeviceCall::ClearDepth { target, depth });
        Ok(())
    }

    fn draw(&mut self, topology: PrimitiveTopology, call: DrawCall) -> Result<(), RenderError> {
        let program = self
            .state
            .program
            .filter(|id| self.programs.contains_key(id))
            .ok_or(PipelineError::MissingProgram)?;
        let vertex_count = self
            .state
            .vertex_source
            .and_then(|id| self.vertex_sources.get(&id))
            .ok_or(PipelineError::MissingVertexSource)?;

        match call {
            DrawCall::Arrays { first, count } => {
                if let Some(available) = vertex_count {
                    if first as u64 + count as u64 > *available as u64 {
                        return Err(ResourceError::OutOfBounds.into());
                    }
                }
            }
            DrawCall::Indexed { format, count } => {
                let indices = self
                    .state
                    .index_source
                    .and_then(|id| self.index_sources.get(&id))
                    .ok_or(PipelineError::MissingIndexSource)?;
                if indices.format != format || count > indices.count {
                    return Err(ResourceError::OutOfBounds.into());
                }
            }
        }

        let target = self.state.draw;
        if let RenderTarget::Framebuffer(id) = target {
            let status = self.framebuffer_status(id);
            if !status.is_complete() {
                return Err(RenderError::RenderingFailed(format!(
                    "draw into incomplete framebuffer {id:?}: {status:?}"
                )));
            }
        }

        log::trace!("SoftwareDevice: draw {topology:?} {call:?} into {target:?}");
        self.journal.push(DeviceCall::Draw {
            target,
            program,
            topology,
            call,
            state: self.state.draw_state,
        });
        Ok(())
    }

    fn blit_framebuffer(
        &mut self,
        src: Rect2D,
        dst: Rect2D,
        filter: FilterMode,
    ) -> Result<(), RenderError> {
        let read_target = self.state.read;
        let draw_target = self.state.draw;
        let source = self.store(self.read_store(read_target)?)?;
        if src.extent.is_empty() || !src.fits_in(source.extent()) {
            return Err(ResourceError::OutOfBounds.into());
        }

        let scale_x = src.extent.width as f32 / dst.extent.width.max(1) as f32;
        let scale_y = src.extent.height as f32 / dst.extent.height.max(1) as f32;
        let mut samples = Vec::with_capacity(dst.extent.area());
        for y in 0..dst.extent.height {
            for x in 0..dst.extent.width {
                let u = src.origin.x as f32 + (x as f32 + 0.5) * scale_x;
                let v = src.origin.y as f32 + (y as f32 + 0.5) * scale_y;
                samples.push(source.sample(u, v, src, filter));
            }
        }

        for store in self.draw_stores(draw_target)? {
            let destination = self.store_mut(store)?;
            let bounds = destination.extent();
            for y in 0..dst.extent.height {
                for x in 0..dst.extent.width {
                    let (tx, ty) = (dst.origin.x + x, dst.origin.y + y);
                    if tx < bounds.width && ty < bounds.height {
                        let sample = samples[(y * dst.extent.width + x) as usize];
                        destination.set_texel(tx, ty, sample);
                    }
                }
            }
        }

        self.journal.push(DeviceCall::Blit {
            src: read_target,
            dst: draw_target,
            src_rect: src,
            dst_rect: dst,
        });
        Ok(())
    }

    fn read_pixels(&mut self, rect: Rect2D) -> Result<Vec<[f32; 4]>, RenderError> {
        let source = self.store(self.read_store(self.state.read)?)?;
        if !rect.fits_in(source.extent()) {
            return Err(ResourceError::OutOfBounds.into());
        }
        let mut pixels = Vec::with_capacity(rect.extent.area());
        for y in rect.origin.y..rect.origin.y + rect.extent.height {
            for x in rect.origin.x..rect.origin.x + rect.extent.width {
                pixels.push(source.texel(x, y));
            }
        }
        Ok(pixels)
    }

    fn surface_size(&self) -> Extent2D {
        self.surface.extent()
    }

    fn resize_surface(&mut self, size: Extent2D) -> Result<(), RenderError> {
        log::debug!("SoftwareDevice: surface resized to {}x{}", size.width, size.height);
        self.surface = Self::make_surface(size);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.journal.push(DeviceCall::Present);
        Ok(())
    }
}
