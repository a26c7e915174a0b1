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

//! Rectangle-to-rectangle texture copies with filtering.
//!
//! wgpu has no scaled blit, so copies run as a textured full-viewport triangle whose
//! viewport is the destination rectangle.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::FilterMode;
use wgpu::util::DeviceExt;

use super::conversions::IntoWgpu;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct BlitRectUniform {
    offset: [f32; 2],
    scale: [f32; 2],
}

impl BlitRectUniform {
    /// Maps the destination viewport onto `src`, restricted to the fraction
    /// `[from, to]` of the destination rectangle that survives clipping.
    fn new(src: Rect2D, src_size: Extent2D, from: [f32; 2], to: [f32; 2]) -> Self {
        let w = src_size.width.max(1) as f32;
        let h = src_size.height.max(1) as f32;
        let scale = [src.extent.width as f32 / w, src.extent.height as f32 / h];
        Self {
            offset: [
                src.origin.x as f32 / w + from[0] * scale[0],
                src.origin.y as f32 / h + from[1] * scale[1],
            ],
            scale: [(to[0] - from[0]) * scale[0], (to[1] - from[1]) * scale[1]],
        }
    }
}

/// One end of a blit.
#[derive(Debug)]
pub(crate) struct BlitEndpoint<'a> {
    pub view: &'a wgpu::TextureView,
    pub size: Extent2D,
    pub rect: Rect2D,
}

/// Shader, layout and per-format pipelines for blits.
#[derive(Debug)]
pub(crate) struct Blitter {
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    linear: wgpu::Sampler,
    nearest: wgpu::Sampler,
}

impl Blitter {
    pub fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lumen Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lumen Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lumen Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let sampler = |filter: FilterMode, label| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter.into_wgpu(),
                min_filter: filter.into_wgpu(),
                ..Default::default()
            })
        };
        Self {
            module,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            linear: sampler(FilterMode::Linear, "Lumen Blit Linear Sampler"),
            nearest: sampler(FilterMode::Nearest, "Lumen Blit Nearest Sampler"),
        }
    }

    fn pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let module = &self.module;
        let layout = &self.pipeline_layout;
        self.pipelines.entry(format).or_insert_with(|| {
            log::debug!("Blitter: creating pipeline for {format:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Lumen Blit Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    /// Records a copy of `src.rect` into `dst.rect` of a target with `dst_format`.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        src: &BlitEndpoint<'_>,
        dst: &BlitEndpoint<'_>,
        dst_format: wgpu::TextureFormat,
        filter: FilterMode,
    ) {
        let Some((x, y, w, h)) = clip(dst.rect, dst.size) else {
            return;
        };
        let dw = dst.rect.extent.width as f32;
        let dh = dst.rect.extent.height as f32;
        let from = [
            (x - dst.rect.origin.x) as f32 / dw,
            (y - dst.rect.origin.y) as f32 / dh,
        ];
        let to = [
            (x + w - dst.rect.origin.x) as f32 / dw,
            (y + h - dst.rect.origin.y) as f32 / dh,
        ];
        let rect = BlitRectUniform::new(src.rect, src.size, from, to);
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lumen Blit Rect"),
            contents: bytemuck::bytes_of(&rect),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = match filter {
            FilterMode::Linear => &self.linear,
            FilterMode::Nearest => &self.nearest,
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lumen Blit Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });
        let pipeline = self.pipeline(device, dst_format);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lumen Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: dst.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
        pass.draw(0..3, 0..1);
    }
}

/// Intersects `rect` with a target of `size`, returning `(x, y, width, height)`.
pub(crate) fn clip(rect: Rect2D, size: Extent2D) -> Option<(u32, u32, u32, u32)> {
    let x = rect.origin.x.min(size.width);
    let y = rect.origin.y.min(size.height);
    let right = (rect.origin.x + rect.extent.width).min(size.width);
    let bottom = (rect.origin.y + rect.extent.height).min(size.height);
    (right > x && bottom > y).then(|| (x, y, right - x, bottom - y))
}
