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

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;

use wgpu::util::DeviceExt;

use lumen_core::math::{Extent2D, Extent3D, Rect2D};
use lumen_core::renderer::{
    AttachmentPoint, DrawCall, DrawState, FilterMode, FramebufferObjectId, FramebufferStatus,
    FramebufferTarget, GraphicsDevice, IndexFormat, IndexSourceDescriptor, IndexSourceId,
    PipelineError, PrimitiveTopology, ProgramDescriptor, ProgramId, RenderError, RenderSettings,
    RenderTarget, ResourceError, SampleType, ShaderError, TextureDescriptor, TextureFormat,
    TextureId, TextureUsage, TextureViewDimension, UniformValue, VertexBufferLayoutDescriptor,
    VertexSourceDescriptor, VertexSourceId, MAX_COLOR_ATTACHMENTS,
};

use super::blit::{BlitEndpoint, Blitter};
use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;
use super::pipeline::{create_render_pipeline, PipelineKey, ProgramEntry};
use super::recorder::{clamp_viewport, PendingPass, RecordedDraw};
use crate::texel;

#[derive(Debug)]
struct WgpuTextureEntry {
    texture: wgpu::Texture,
    /// The view shaders sample through.
    view: wgpu::TextureView,
    /// Mip 0, layer 0 as a 2D view, for attachments and blits.
    target_view: Option<wgpu::TextureView>,
    label: String,
    format: TextureFormat,
    dimension: TextureViewDimension,
    size: Extent3D,
    usage: TextureUsage,
    mip_level_count: u32,
}

impl WgpuTextureEntry {
    fn allocate(
        device: &wgpu::Device,
        label: &str,
        dimension: TextureViewDimension,
        format: TextureFormat,
        mut size: Extent3D,
        usage: TextureUsage,
        mip_level_count: u32,
    ) -> Self {
        size.width = size.width.max(1);
        size.height = size.height.max(1);
        size.depth_or_array_layers = match dimension {
            TextureViewDimension::Cube => 6,
            TextureViewDimension::D3 => size.depth_or_array_layers.max(1),
            _ => 1,
        };
        if dimension == TextureViewDimension::D1 {
            size.height = 1;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: size.into_wgpu(),
            mip_level_count: mip_level_count.max(1),
            sample_count: 1,
            dimension: dimension.into_wgpu(),
            format: format.into_wgpu(),
            usage: usage.into_wgpu() | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(dimension.into_wgpu()),
            ..Default::default()
        });
        let target_view = matches!(dimension, TextureViewDimension::D2 | TextureViewDimension::Cube)
            .then(|| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(label),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_mip_level: 0,
                    mip_level_count: Some(1),
                    base_array_layer: 0,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            });
        Self {
            texture,
            view,
            target_view,
            label: label.to_string(),
            format,
            dimension,
            size,
            usage,
            mip_level_count: mip_level_count.max(1),
        }
    }

    fn extent(&self) -> Extent2D {
        self.size.to_2d()
    }

    fn target_view(&self) -> Result<&wgpu::TextureView, ResourceError> {
        self.target_view.as_ref().ok_or_else(|| {
            ResourceError::BackendError(format!(
                "texture '{}' ({:?}) cannot be used as a render target",
                self.label, self.dimension
            ))
        })
    }
}

#[derive(Debug)]
struct WgpuVertexSourceEntry {
    buffers: Vec<wgpu::Buffer>,
    layouts: Vec<VertexBufferLayoutDescriptor>,
    vertex_count: Option<u32>,
}

#[derive(Debug)]
struct WgpuIndexSourceEntry {
    buffer: wgpu::Buffer,
    format: IndexFormat,
    count: u32,
}

#[derive(Debug, Default)]
struct WgpuFramebufferEntry {
    colors: [Option<TextureId>; MAX_COLOR_ATTACHMENTS],
    depth: Option<TextureId>,
    draw_buffers: Vec<AttachmentPoint>,
}

impl WgpuFramebufferEntry {
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

/// Where texels live: the offscreen backbuffer or a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Store {
    Backbuffer,
    Texture(TextureId),
}

fn lookup<'a>(
    textures: &'a HashMap<TextureId, WgpuTextureEntry>,
    backbuffer: &'a WgpuTextureEntry,
    store: Store,
) -> Result<&'a WgpuTextureEntry, ResourceError> {
    match store {
        Store::Backbuffer => Ok(backbuffer),
        Store::Texture(id) => textures.get(&id).ok_or(ResourceError::InvalidHandle),
    }
}

/// The wgpu implementation of [`GraphicsDevice`].
///
/// The surface is an offscreen `Rgba8Unorm` backbuffer; [`present`](GraphicsDevice::present)
/// copies it to the swapchain when the context has one. Clears and draws are
/// recorded per draw target and submitted lazily, see [`PendingPass`].
#[derive(Debug)]
pub struct WgpuDevice {
    context: WgpuGraphicsContext,
    textures: HashMap<TextureId, WgpuTextureEntry>,
    vertex_sources: HashMap<VertexSourceId, WgpuVertexSourceEntry>,
    index_sources: HashMap<IndexSourceId, WgpuIndexSourceEntry>,
    programs: HashMap<ProgramId, ProgramEntry>,
    framebuffers: HashMap<FramebufferObjectId, WgpuFramebufferEntry>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fallbacks: HashMap<(TextureViewDimension, SampleType), WgpuTextureEntry>,
    backbuffer: WgpuTextureEntry,
    blitter: Blitter,
    filtering_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    state: BindingState,
    pending: Option<PendingPass>,
    next_id: usize,
}

impl WgpuDevice {
    /// Wraps an initialized context.
    pub fn new(context: WgpuGraphicsContext, settings: &RenderSettings) -> Self {
        let device = &context.device;
        let backbuffer = WgpuTextureEntry::allocate(
            device,
            "Lumen Backbuffer",
            TextureViewDimension::D2,
            TextureFormat::Rgba8Unorm,
            Extent3D::from_2d(settings.surface_size),
            TextureUsage::ATTACHMENT,
            1,
        );
        let fallbacks = Self::create_fallbacks(&context);
        let blitter = Blitter::new(device);
        let filtering_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lumen Filtering Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let nearest_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lumen Nearest Sampler"),
            ..Default::default()
        });
        log::info!(
            "WgpuDevice: created on \"{}\" with a {}x{} backbuffer",
            context.adapter_name,
            settings.surface_size.width,
            settings.surface_size.height
        );

        let mut this = Self {
            context,
            textures: HashMap::new(),
            vertex_sources: HashMap::new(),
            index_sources: HashMap::new(),
            programs: HashMap::new(),
            framebuffers: HashMap::new(),
            pipelines: HashMap::new(),
            fallbacks,
            backbuffer,
            blitter,
            filtering_sampler,
            nearest_sampler,
            state: BindingState {
                viewport: Rect2D::from_extent(settings.surface_size),
                ..Default::default()
            },
            pending: None,
            next_id: 0,
        };
        let mut initial = PendingPass::new(RenderTarget::Surface, 1);
        initial.clear_color(0, settings.surface_clear_color);
        this.pending = Some(initial);
        this
    }

    /// Creates a headless device on the default adapter.
    ///
    /// ## Errors
    /// Returns [`RenderError::InitializationFailed`] when no adapter or device is available.
    pub fn headless(settings: &RenderSettings) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let context = pollster::block_on(WgpuGraphicsContext::new_headless(&instance))
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(context, settings))
    }

    /// The graphics context the device renders with.
    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.context
    }

    fn create_fallbacks(
        context: &WgpuGraphicsContext,
    ) -> HashMap<(TextureViewDimension, SampleType), WgpuTextureEntry> {
        let mut fallbacks = HashMap::new();
        let dims = [
            TextureViewDimension::D1,
            TextureViewDimension::D2,
            TextureViewDimension::Cube,
            TextureViewDimension::D3,
        ];
        for dimension in dims {
            let entry = WgpuTextureEntry::allocate(
                &context.device,
                "Lumen Fallback Texture",
                dimension,
                TextureFormat::Rgba8Unorm,
                Extent3D::from_2d(Extent2D::new(1, 1)),
                TextureUsage::SAMPLED,
                1,
            );
            for layer in 0..entry.size.depth_or_array_layers {
                write_layer(&context.queue, &entry, layer, &[255; 4]);
            }
            fallbacks.insert((dimension, SampleType::Float), entry);
        }
        for dimension in [TextureViewDimension::D2, TextureViewDimension::Cube] {
            let entry = WgpuTextureEntry::allocate(
                &context.device,
                "Lumen Fallback Depth Texture",
                dimension,
                TextureFormat::Depth32Float,
                Extent3D::from_2d(Extent2D::new(1, 1)),
                TextureUsage::ATTACHMENT,
                1,
            );
            // Depth formats cannot be written from buffers; clear every layer instead.
            let mut encoder = context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Lumen Fallback Depth Clear"),
                });
            for layer in 0..entry.size.depth_or_array_layers {
                let view = entry.texture.create_view(&wgpu::TextureViewDescriptor {
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                });
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Lumen Fallback Depth Clear"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }
            context.queue.submit(Some(encoder.finish()));
            fallbacks.insert((dimension, SampleType::Depth), entry);
        }
        fallbacks
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn bound_fbo_mut(&mut self) -> Result<&mut WgpuFramebufferEntry, ResourceError> {
        match self.state.draw {
            RenderTarget::Framebuffer(id) => self
                .framebuffers
                .get_mut(&id)
                .ok_or(ResourceError::InvalidHandle),
            RenderTarget::Surface => Err(ResourceError::InvalidHandle),
        }
    }

    /// The stores fragment outputs `0..n` of `target` land in.
    fn color_stores(&self, target: RenderTarget) -> Result<Vec<Store>, ResourceError> {
        match target {
            RenderTarget::Surface => Ok(vec![Store::Backbuffer]),
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

    fn depth_texture(&self, target: RenderTarget) -> Option<TextureId> {
        match target {
            RenderTarget::Surface => None,
            RenderTarget::Framebuffer(id) => self.framebuffers.get(&id)?.depth,
        }
    }

    fn read_store(&self, target: RenderTarget) -> Result<Store, ResourceError> {
        match target {
            RenderTarget::Surface => Ok(Store::Backbuffer),
            RenderTarget::Framebuffer(id) => {
                let fbo = self.framebuffers.get(&id).ok_or(ResourceError::InvalidHandle)?;
                fbo.colors[0]
                    .map(Store::Texture)
                    .ok_or(ResourceError::NotFound)
            }
        }
    }

    fn target_extent(&self, target: RenderTarget) -> Result<Extent2D, ResourceError> {
        let store = match self.color_stores(target)?.first() {
            Some(store) => *store,
            None => match self.depth_texture(target) {
                Some(depth) => Store::Texture(depth),
                None => return Ok(Extent2D::default()),
            },
        };
        Ok(lookup(&self.textures, &self.backbuffer, store)?.extent())
    }

    /// The pending pass of the current draw target, flushing work for any other target.
    fn pending_for_draw_target(&mut self) -> Result<&mut PendingPass, ResourceError> {
        let target = self.state.draw;
        if self.pending.as_ref().is_some_and(|p| p.target != target) {
            self.flush()?;
        }
        let color_count = self.color_stores(target)?.len();
        Ok(self
            .pending
            .get_or_insert_with(|| PendingPass::new(target, color_count)))
    }

    /// Encodes and submits the pending pass, if any.
    fn flush(&mut self) -> Result<(), ResourceError> {
        let Some(pass) = self.pending.take() else {
            return Ok(());
        };
        if pass.is_empty() {
            return Ok(());
        }
        let colors = self.color_stores(pass.target)?;
        let depth = self.depth_texture(pass.target);
        let extent = self.target_extent(pass.target)?;
        if colors.is_empty() && depth.is_none() {
            log::warn!("WgpuDevice: dropping work for {:?}, which has no attachments", pass.target);
            return Ok(());
        }

        let mut color_views = Vec::with_capacity(colors.len());
        for store in &colors {
            color_views.push(lookup(&self.textures, &self.backbuffer, *store)?.target_view()?);
        }
        let depth_view = match depth {
            Some(id) => {
                let entry = lookup(&self.textures, &self.backbuffer, Store::Texture(id))?;
                Some(entry.target_view()?)
            }
            None => None,
        };

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen Pass Encoder"),
            });
        {
            let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_views
                .iter()
                .enumerate()
                .map(|(i, view)| {
                    Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: pass.color_load(i),
                            store: wgpu::StoreOp::Store,
                        },
                    })
                })
                .collect();
            let depth_stencil_attachment =
                depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: pass.depth_load(),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lumen Render Pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &pass.draws {
                let (Some(pipeline), Some(vertices)) = (
                    self.pipelines.get(&draw.pipeline),
                    self.vertex_sources.get(&draw.vertex_source),
                ) else {
                    continue;
                };
                let Some([x, y, w, h]) = clamp_viewport(draw.viewport, extent) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                for (slot, buffer) in vertices.buffers.iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                match draw.call {
                    DrawCall::Arrays { first, count } => {
                        render_pass.draw(first..first + count, 0..1);
                    }
                    DrawCall::Indexed { count, .. } => {
                        let Some(indices) =
                            draw.index_source.and_then(|id| self.index_sources.get(&id))
                        else {
                            continue;
                        };
                        render_pass
                            .set_index_buffer(indices.buffer.slice(..), indices.format.into_wgpu());
                        render_pass.draw_indexed(0..count, 0, 0..1);
                    }
                }
            }
        }
        self.context.queue.submit(Some(encoder.finish()));
        log::trace!(
            "WgpuDevice: submitted pass for {:?} ({} draws)",
            pass.target,
            pass.draws.len()
        );
        Ok(())
    }

    fn sampled_view(
        &self,
        unit: u32,
        dimension: TextureViewDimension,
        sample_type: SampleType,
    ) -> &wgpu::TextureView {
        let bound = self
            .state
            .textures
            .get(&unit)
            .and_then(|id| self.textures.get(id))
            .filter(|entry| {
                entry.dimension == dimension
                    && entry.format.is_depth() == (sample_type == SampleType::Depth)
            });
        if let Some(entry) = bound {
            return &entry.view;
        }
        let fallback = self
            .fallbacks
            .get(&(dimension, sample_type))
            .or_else(|| self.fallbacks.get(&(TextureViewDimension::D2, sample_type)));
        match fallback {
            Some(entry) => &entry.view,
            None => &self.backbuffer.view,
        }
    }

    fn build_bind_group(&self, program: &ProgramEntry) -> wgpu::BindGroup {
        let device = &self.context.device;
        let uniform_buffer = program.uniform_block().map(|bytes| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lumen Uniform Block"),
                contents: bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });

        let mut entries = Vec::with_capacity(1 + program.samplers.len() * 2);
        if let Some(buffer) = &uniform_buffer {
            entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }
        for (i, decl) in program.samplers.iter().enumerate() {
            let binding = 1 + 2 * i as u32;
            let view =
                self.sampled_view(program.sampler_units[i], decl.dimension, decl.sample_type);
            let sampler = match decl.sample_type {
                SampleType::Float => &self.filtering_sampler,
                SampleType::Depth => &self.nearest_sampler,
            };
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.label.as_str()),
            layout: &program.bind_group_layout,
            entries: &entries,
        })
    }
}

fn write_layer(queue: &wgpu::Queue, entry: &WgpuTextureEntry, layer: u32, data: &[u8]) {
    let depth = match entry.dimension {
        TextureViewDimension::D3 => entry.size.depth_or_array_layers,
        _ => 1,
    };
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &entry.texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(entry.size.width * entry.format.bytes_per_pixel()),
            rows_per_image: Some(entry.size.height),
        },
        wgpu::Extent3d {
            width: entry.size.width,
            height: entry.size.height,
            depth_or_array_layers: depth,
        },
    );
}

impl GraphicsDevice for WgpuDevice {
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let label = descriptor.label.as_deref().unwrap_or("texture");
        let entry = WgpuTextureEntry::allocate(
            &self.context.device,
            label,
            descriptor.dimension,
            descriptor.format,
            descriptor.size,
            descriptor.usage,
            descriptor.mip_level_count,
        );
        let id = TextureId(self.next_id());
        log::debug!(
            "WgpuDevice: texture {:?} '{}' {:?} {}x{}x{}",
            id,
            label,
            descriptor.format,
            entry.size.width,
            entry.size.height,
            entry.size.depth_or_array_layers
        );
        self.textures.insert(id, entry);
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let entry = self.textures.get(&id).ok_or(ResourceError::InvalidHandle)?;
        if entry.format.is_depth() {
            return Err(ResourceError::BackendError(format!(
                "depth texture '{}' cannot be written from the CPU",
                entry.label
            )));
        }
        let size = entry.size;
        let (layers, layer_texels) = match entry.dimension {
            TextureViewDimension::D3 => (1, size.width * size.height * size.depth_or_array_layers),
            _ => (size.depth_or_array_layers, size.width * size.height),
        };
        let layer_bytes = (layer_texels * entry.format.bytes_per_pixel()) as usize;
        if layer >= layers || data.len() != layer_bytes {
            return Err(ResourceError::OutOfBounds);
        }
        write_layer(&self.context.queue, entry, layer, data);
        Ok(())
    }

    fn reallocate_texture(&mut self, id: TextureId, size: Extent3D) -> Result<(), ResourceError> {
        self.flush()?;
        let entry = self.textures.get(&id).ok_or(ResourceError::InvalidHandle)?;
        let replacement = WgpuTextureEntry::allocate(
            &self.context.device,
            &entry.label,
            entry.dimension,
            entry.format,
            size,
            entry.usage,
            entry.mip_level_count,
        );
        log::debug!(
            "WgpuDevice: reallocated texture {:?} to {}x{}",
            id,
            replacement.size.width,
            replacement.size.height
        );
        self.textures.insert(id, replacement);
        Ok(())
    }

    fn texture_size(&self, id: TextureId) -> Option<Extent3D> {
        self.textures.get(&id).map(|t| t.size)
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        self.flush()?;
        let entry = self.textures.remove(&id).ok_or(ResourceError::InvalidHandle)?;
        entry.texture.destroy();
        log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn create_vertex_source(
        &mut self,
        descriptor: &VertexSourceDescriptor,
    ) -> Result<VertexSourceId, ResourceError> {
        let label = descriptor.label.as_deref().unwrap_or("vertex source");
        let mut buffers = Vec::with_capacity(descriptor.buffers.len());
        let mut layouts = Vec::with_capacity(descriptor.buffers.len());
        let mut vertex_count: Option<u32> = None;
        for buffer in &descriptor.buffers {
            if buffer.layout.array_stride == 0 {
                return Err(ResourceError::BackendError(
                    "vertex buffer with zero stride".to_string(),
                ));
            }
            let count = (buffer.data.len() as u64 / buffer.layout.array_stride) as u32;
            vertex_count = Some(vertex_count.map_or(count, |c| c.min(count)));
            // Zero-sized buffers cannot be bound.
            let contents: &[u8] = if buffer.data.is_empty() { &[0; 4] } else { &buffer.data };
            buffers.push(self.context.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage: wgpu::BufferUsages::VERTEX,
                },
            ));
            layouts.push(buffer.layout.clone());
        }
        let id = VertexSourceId(self.next_id());
        self.vertex_sources.insert(
            id,
            WgpuVertexSourceEntry {
                buffers,
                layouts,
                vertex_count,
            },
        );
        Ok(id)
    }

    fn destroy_vertex_source(&mut self, id: VertexSourceId) -> Result<(), ResourceError> {
        self.flush()?;
        self.vertex_sources
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_index_source(
        &mut self,
        descriptor: &IndexSourceDescriptor,
    ) -> Result<IndexSourceId, ResourceError> {
        let contents: Cow<[u8]> = match descriptor.format {
            IndexFormat::Uint8 => {
                let widened: Vec<u16> = descriptor.data.iter().map(|i| *i as u16).collect();
                Cow::Owned(bytemuck::cast_slice(&widened).to_vec())
            }
            _ => Cow::Borrowed(descriptor.data.as_ref()),
        };
        let contents: &[u8] = if contents.is_empty() { &[0; 4] } else { &contents };
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents,
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = IndexSourceId(self.next_id());
        self.index_sources.insert(
            id,
            WgpuIndexSourceEntry {
                buffer,
                format: descriptor.format,
                count: descriptor.index_count(),
            },
        );
        Ok(id)
    }

    fn destroy_index_source(&mut self, id: IndexSourceId) -> Result<(), ResourceError> {
        self.flush()?;
        self.index_sources
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramId, ResourceError> {
        let entry = ProgramEntry::compile(&self.context.device, descriptor)?;
        let id = ProgramId(self.next_id());
        log::info!(
            "WgpuDevice: Successfully created program '{}' with ID: {:?}",
            entry.label,
            id
        );
        self.programs.insert(id, entry);
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError> {
        self.flush()?;
        if self.programs.remove(&id).is_none() {
            return Err(ShaderError::NotFound { id }.into());
        }
        self.pipelines.retain(|key, _| key.program != id);
        log::debug!("WgpuDevice: Destroyed program with ID: {id:?}");
        Ok(())
    }

    fn create_framebuffer_object(
        &mut self,
        label: Option<&str>,
    ) -> Result<FramebufferObjectId, ResourceError> {
        let id = FramebufferObjectId(self.next_id());
        log::debug!("WgpuDevice: framebuffer object {id:?} {label:?}");
        self.framebuffers.insert(id, WgpuFramebufferEntry::default());
        Ok(id)
    }

    fn destroy_framebuffer_object(&mut self, id: FramebufferObjectId) -> Result<(), ResourceError> {
        self.flush()?;
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
        self.flush()?;
        *self.bound_fbo_mut()?.slot_mut(point)? = Some(texture);
        Ok(())
    }

    fn detach(&mut self, point: AttachmentPoint) -> Result<(), ResourceError> {
        self.flush()?;
        *self.bound_fbo_mut()?.slot_mut(point)? = None;
        Ok(())
    }

    fn set_draw_buffers(&mut self, buffers: &[AttachmentPoint]) -> Result<(), ResourceError> {
        let valid = buffers.iter().all(|p| {
            matches!(p, AttachmentPoint::Color(n) if (*n as usize) < MAX_COLOR_ATTACHMENTS)
        });
        if !valid {
            return Err(ResourceError::OutOfBounds);
        }
        self.flush()?;
        self.bound_fbo_mut()?.draw_buffers = buffers.to_vec();
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
        let attached = fbo
            .colors
            .iter()
            .enumerate()
            .filter_map(|(n, t)| t.map(|t| (AttachmentPoint::Color(n as u8), t)))
            .chain(fbo.depth.map(|t| (AttachmentPoint::Depth, t)));
        let mut size: Option<Extent2D> = None;
        for (point, texture) in attached {
            let Some(texture) = self.textures.get(&texture) else {
                return FramebufferStatus::IncompleteAttachment(point);
            };
            if texture.format.is_depth() == point.is_color() || texture.target_view.is_none() {
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
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> RenderTarget {
        match target {
            FramebufferTarget::Draw => self.state.draw,
            FramebufferTarget::Read => self.state.read,
        }
    }

    fn set_viewport(&mut self, viewport: Rect2D) {
        self.state.viewport = viewport;
    }

    fn set_draw_state(&mut self, state: &DrawState) {
        self.state.draw_state = *state;
    }

    fn draw_state(&self) -> DrawState {
        self.state.draw_state
    }

    fn bind_vertex_source(&mut self, id: VertexSourceId) {
        self.state.vertex_source = Some(id);
    }

    fn unbind_vertex_source(&mut self) {
        self.state.vertex_source = None;
    }

    fn bind_index_source(&mut self, id: IndexSourceId) {
        self.state.index_source = Some(id);
    }

    fn unbind_index_source(&mut self) {
        self.state.index_source = None;
    }

    fn bind_program(&mut self, id: ProgramId) {
        self.state.program = Some(id);
    }

    fn unbind_program(&mut self) {
        self.state.program = None;
    }

    fn bind_texture(&mut self, unit: u32, id: TextureId) {
        self.state.textures.insert(unit, id);
    }

    fn unbind_texture(&mut self, unit: u32) {
        self.state.textures.remove(&unit);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        self.state
            .program
            .and_then(|id| self.programs.get_mut(&id))
            .is_some_and(|program| program.set_uniform(name, value))
    }

    fn clear_color(&mut self, draw_buffer: u32, color: [f32; 4]) -> Result<(), RenderError> {
        let count = self.color_stores(self.state.draw)?.len();
        if draw_buffer as usize >= count {
            return Err(ResourceError::OutOfBounds.into());
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.target == self.state.draw && p.has_draws())
        {
            self.flush()?;
        }
        self.pending_for_draw_target()?
            .clear_color(draw_buffer as usize, color);
        Ok(())
    }

    fn clear_depth(&mut self, depth: f32) -> Result<(), RenderError> {
        if self.depth_texture(self.state.draw).is_none() {
            return Ok(());
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.target == self.state.draw && p.has_draws())
        {
            self.flush()?;
        }
        self.pending_for_draw_target()?.depth_clear = Some(depth);
        Ok(())
    }

    fn draw(&mut self, topology: PrimitiveTopology, call: DrawCall) -> Result<(), RenderError> {
        let program_id = self
            .state
            .program
            .filter(|id| self.programs.contains_key(id))
            .ok_or(PipelineError::MissingProgram)?;
        let vertex_id = self
            .state
            .vertex_source
            .filter(|id| self.vertex_sources.contains_key(id))
            .ok_or(PipelineError::MissingVertexSource)?;
        let vertices = self
            .vertex_sources
            .get(&vertex_id)
            .ok_or(PipelineError::MissingVertexSource)?;

        let index_source = match call {
            DrawCall::Arrays { first, count } => {
                if let Some(available) = vertices.vertex_count {
                    if first as u64 + count as u64 > available as u64 {
                        return Err(ResourceError::OutOfBounds.into());
                    }
                }
                None
            }
            DrawCall::Indexed { format, count } => {
                let id = self
                    .state
                    .index_source
                    .filter(|id| self.index_sources.contains_key(id))
                    .ok_or(PipelineError::MissingIndexSource)?;
                let indices = self
                    .index_sources
                    .get(&id)
                    .ok_or(PipelineError::MissingIndexSource)?;
                if indices.format != format || count > indices.count {
                    return Err(ResourceError::OutOfBounds.into());
                }
                Some(id)
            }
        };

        let target = self.state.draw;
        if let RenderTarget::Framebuffer(id) = target {
            let status = self.framebuffer_status(id);
            if !status.is_complete() {
                return Err(RenderError::RenderingFailed(format!(
                    "draw into incomplete framebuffer {id:?}: {status:?}"
                )));
            }
        }

        let mut color_formats = Vec::new();
        for store in self.color_stores(target)? {
            color_formats.push(lookup(&self.textures, &self.backbuffer, store)?.format);
        }
        let depth_format = match self.depth_texture(target) {
            Some(id) => Some(lookup(&self.textures, &self.backbuffer, Store::Texture(id))?.format),
            None => None,
        };
        let key = PipelineKey {
            program: program_id,
            topology,
            state: self.state.draw_state,
            color_formats,
            depth_format,
            vertex_layouts: vertices.layouts.clone(),
        };

        let program = self
            .programs
            .get(&program_id)
            .ok_or(PipelineError::MissingProgram)?;
        if !self.pipelines.contains_key(&key) {
            let pipeline = create_render_pipeline(&self.context.device, program, &key)?;
            self.pipelines.insert(key.clone(), pipeline);
        }
        let bind_group = self.build_bind_group(program);

        let recorded = RecordedDraw {
            pipeline: key,
            bind_group,
            vertex_source: vertex_id,
            index_source,
            call,
            viewport: self.state.viewport,
        };
        self.pending_for_draw_target()?.draws.push(recorded);
        Ok(())
    }

    fn blit_framebuffer(
        &mut self,
        src: Rect2D,
        dst: Rect2D,
        filter: FilterMode,
    ) -> Result<(), RenderError> {
        self.flush()?;
        let src_store = self.read_store(self.state.read)?;
        let dst_stores = self.color_stores(self.state.draw)?;
        let source = lookup(&self.textures, &self.backbuffer, src_store)?;
        if src.extent.is_empty() || !src.fits_in(source.extent()) {
            return Err(ResourceError::OutOfBounds.into());
        }
        if source.format.is_depth() {
            let unsupported = PipelineError::FeatureNotSupported(
                "blitting depth attachments".to_string(),
            );
            return Err(unsupported.into());
        }
        let src_endpoint = BlitEndpoint {
            view: source.target_view()?,
            size: source.extent(),
            rect: src,
        };

        let device = &self.context.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Lumen Blit Encoder"),
        });
        for store in dst_stores {
            if store == src_store {
                log::warn!("WgpuDevice: skipping blit of {store:?} onto itself");
                continue;
            }
            let destination = lookup(&self.textures, &self.backbuffer, store)?;
            let dst_endpoint = BlitEndpoint {
                view: destination.target_view()?,
                size: destination.extent(),
                rect: dst,
            };
            self.blitter.encode(
                device,
                &mut encoder,
                &src_endpoint,
                &dst_endpoint,
                destination.format.into_wgpu(),
                filter,
            );
        }
        self.context.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&mut self, rect: Rect2D) -> Result<Vec<[f32; 4]>, RenderError> {
        self.flush()?;
        let store = self.read_store(self.state.read)?;
        let entry = lookup(&self.textures, &self.backbuffer, store)?;
        if !rect.fits_in(entry.extent()) {
            return Err(ResourceError::OutOfBounds.into());
        }
        if rect.extent.is_empty() {
            return Ok(Vec::new());
        }

        let device = &self.context.device;
        let unpadded = rect.extent.width * entry.format.bytes_per_pixel();
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen Readback Buffer"),
            size: padded as u64 * rect.extent.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Lumen Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.origin.x,
                    y: rect.origin.y,
                    z: 0,
                },
                aspect: if entry.format.is_depth() {
                    wgpu::TextureAspect::DepthOnly
                } else {
                    wgpu::TextureAspect::All
                },
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(rect.extent.height),
                },
            },
            wgpu::Extent3d {
                width: rect.extent.width,
                height: rect.extent.height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| RenderError::RenderingFailed(format!("device poll failed: {e}")))?;
        receiver
            .recv()
            .map_err(|e| RenderError::RenderingFailed(format!("readback channel closed: {e}")))?
            .map_err(|e| RenderError::RenderingFailed(format!("readback mapping failed: {e}")))?;

        let mut pixels = Vec::with_capacity(rect.extent.area());
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                pixels.extend(texel::decode_texels(entry.format, &row[..unpadded as usize]));
            }
        }
        buffer.unmap();
        Ok(pixels)
    }

    fn surface_size(&self) -> Extent2D {
        self.backbuffer.extent()
    }

    fn resize_surface(&mut self, size: Extent2D) -> Result<(), RenderError> {
        self.flush()?;
        self.backbuffer = WgpuTextureEntry::allocate(
            &self.context.device,
            "Lumen Backbuffer",
            TextureViewDimension::D2,
            TextureFormat::Rgba8Unorm,
            Extent3D::from_2d(size),
            TextureUsage::ATTACHMENT,
            1,
        );
        self.context.resize(size.width, size.height);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.flush()?;
        let Some(frame) = self.context.get_current_texture() else {
            return Ok(());
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("WgpuDevice: surface {e}, reconfiguring and skipping this frame");
                let size = self.backbuffer.extent();
                self.context.resize(size.width, size.height);
                return Ok(());
            }
            Err(e) => return Err(RenderError::SurfaceAcquisitionFailed(e.to_string())),
        };
        let format = self
            .context
            .surface_format()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let frame_size = Extent2D::new(frame.texture.width(), frame.texture.height());

        let source = self.backbuffer.target_view()?;
        let device = &self.context.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Lumen Present Encoder"),
        });
        self.blitter.encode(
            device,
            &mut encoder,
            &BlitEndpoint {
                view: source,
                size: self.backbuffer.extent(),
                rect: Rect2D::from_extent(self.backbuffer.extent()),
            },
            &BlitEndpoint {
                view: &view,
                size: frame_size,
                rect: Rect2D::from_extent(frame_size),
            },
            format,
            FilterMode::Linear,
        );
        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
