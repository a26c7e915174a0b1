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

//! Programs and the render pipelines derived from them.
//!
//! A program owns its shader module, its bind group layout and a CPU shadow of its
//! uniform block. Pipelines are created lazily per combination of program, fixed
//! function state, target formats and vertex layout, then cached.

use lumen_core::renderer::{
    DrawState, PipelineError, PrimitiveTopology, ProgramDescriptor, ProgramId, SampleType,
    SamplerDecl, ShaderError, TextureFormat, UniformDecl, UniformValue,
    VertexBufferLayoutDescriptor,
};

use super::conversions::{depth_stencil_state, IntoWgpu};

/// Everything that selects one concrete pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: ProgramId,
    pub topology: PrimitiveTopology,
    pub state: DrawState,
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
    pub vertex_layouts: Vec<VertexBufferLayoutDescriptor>,
}

#[derive(Debug)]
pub(crate) struct ProgramEntry {
    pub label: String,
    pub module: wgpu::ShaderModule,
    pub vertex_entry: String,
    pub fragment_entry: String,
    uniforms: Vec<UniformDecl>,
    offsets: Vec<usize>,
    shadow: Vec<u8>,
    pub samplers: Vec<SamplerDecl>,
    /// The texture unit each sampler reads, settable through an `Int` uniform.
    pub sampler_units: Vec<u32>,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub layout: wgpu::PipelineLayout,
}

impl ProgramEntry {
    /// Compiles `descriptor`, reporting WGSL errors as [`ShaderError::CompilationError`].
    pub fn compile(
        device: &wgpu::Device,
        descriptor: &ProgramDescriptor,
    ) -> Result<Self, ShaderError> {
        let label = descriptor.label_or_default().to_string();
        for entry in [&descriptor.vertex_entry, &descriptor.fragment_entry] {
            if !descriptor.source.contains(&format!("fn {entry}")) {
                return Err(ShaderError::InvalidEntryPoint {
                    label,
                    entry_point: entry.to_string(),
                });
            }
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Wgsl(descriptor.source.clone()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::CompilationError {
                label,
                details: error.to_string(),
            });
        }

        let mut entries = Vec::with_capacity(1 + descriptor.samplers.len() * 2);
        if !descriptor.uniforms.is_empty() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for (i, sampler) in descriptor.samplers.iter().enumerate() {
            let binding = 1 + 2 * i as u32;
            entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: sampler.sample_type.into_wgpu(),
                    view_dimension: sampler.dimension.into_wgpu(),
                    multisampled: false,
                },
                count: None,
            });
            let sampler_type = match sampler.sample_type {
                SampleType::Float => wgpu::SamplerBindingType::Filtering,
                SampleType::Depth => wgpu::SamplerBindingType::NonFiltering,
            };
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: binding + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(sampler_type),
                count: None,
            });
        }
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label.as_str()),
            entries: &entries,
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label.as_str()),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let (offsets, block_size) = descriptor.uniform_block_layout();
        Ok(Self {
            label,
            module,
            vertex_entry: descriptor.vertex_entry.to_string(),
            fragment_entry: descriptor.fragment_entry.to_string(),
            uniforms: descriptor.uniforms.clone(),
            offsets,
            shadow: vec![0; block_size],
            samplers: descriptor.samplers.clone(),
            sampler_units: (0..descriptor.samplers.len() as u32).collect(),
            bind_group_layout,
            layout,
        })
    }

    /// Stores `value` for the next draw. Returns `false` when the program has no
    /// input of that name and type.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        if let Some(index) = self.uniforms.iter().position(|u| u.name == name) {
            if self.uniforms[index].ty != value.uniform_type() {
                return false;
            }
            let offset = self.offsets[index];
            let size = self.uniforms[index].ty.size();
            value.write_std140(&mut self.shadow[offset..offset + size]);
            return true;
        }
        match (self.samplers.iter().position(|s| s.name == name), value) {
            (Some(index), UniformValue::Int(unit)) if unit >= 0 => {
                self.sampler_units[index] = unit as u32;
                true
            }
            _ => false,
        }
    }

    /// The uniform block bytes, or `None` when the program declares no uniforms.
    pub fn uniform_block(&self) -> Option<&[u8]> {
        (!self.uniforms.is_empty()).then_some(self.shadow.as_slice())
    }
}

/// Builds the pipeline `key` describes, reporting validation errors as
/// [`PipelineError::CompilationFailed`].
pub(crate) fn create_render_pipeline(
    device: &wgpu::Device,
    program: &ProgramEntry,
    key: &PipelineKey,
) -> Result<wgpu::RenderPipeline, PipelineError> {
    let topology: wgpu::PrimitiveTopology = key
        .topology
        .into_wgpu()
        .ok_or_else(|| PipelineError::FeatureNotSupported(format!("{:?} topology", key.topology)))?;

    let attributes: Vec<Vec<wgpu::VertexAttribute>> = key
        .vertex_layouts
        .iter()
        .map(|layout| {
            layout
                .attributes
                .iter()
                .map(|a| wgpu::VertexAttribute {
                    format: a.format.into_wgpu(),
                    offset: a.offset,
                    shader_location: a.shader_location,
                })
                .collect()
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout> = key
        .vertex_layouts
        .iter()
        .zip(&attributes)
        .map(|(layout, attributes)| wgpu::VertexBufferLayout {
            array_stride: layout.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect();

    let targets: Vec<Option<wgpu::ColorTargetState>> = key
        .color_formats
        .iter()
        .map(|format| {
            Some(wgpu::ColorTargetState {
                format: format.into_wgpu(),
                blend: key.state.blend.into_wgpu(),
                write_mask: key.state.color_writes.into_wgpu(),
            })
        })
        .collect();

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label.as_str()),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some(program.vertex_entry.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some(program.fragment_entry.as_str()),
            compilation_options: Default::default(),
            targets: &targets,
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.state.cull.into_wgpu(),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: key
            .depth_format
            .map(|format| depth_stencil_state(&key.state.depth, format)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(PipelineError::CompilationFailed {
            label: Some(program.label.clone()),
            details: error.to_string(),
        });
    }
    log::debug!(
        "WgpuDevice: created pipeline for '{}' ({:?}, {} color targets)",
        program.label,
        key.topology,
        key.color_formats.len()
    );
    Ok(pipeline)
}
