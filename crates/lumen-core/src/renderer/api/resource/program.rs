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

//! Shader program descriptors.
//!
//! A program is a vertex and a fragment stage compiled from WGSL source. Unlike a
//! raw pipeline, a program exposes its inputs by *name*: loose uniforms declared in
//! [`ProgramDescriptor::uniforms`] are gathered by the backend into a single uniform
//! block (`@group(0) @binding(0)`), and every sampler slot `i` declared in
//! [`ProgramDescriptor::samplers`] occupies `@binding(1 + 2 * i)` for the texture and
//! `@binding(2 + 2 * i)` for its sampler.

use crate::renderer::api::resource::texture::{SampleType, TextureViewDimension};
use std::borrow::Cow;

/// An opaque handle representing a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// The type of a loose uniform declared by a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `f32`
    Float,
    /// `vec2<f32>`
    Vec2,
    /// `vec3<f32>`
    Vec3,
    /// `vec4<f32>`
    Vec4,
    /// `i32`
    Int,
    /// `vec2<i32>`
    IVec2,
    /// `vec3<i32>`
    IVec3,
    /// `vec4<i32>`
    IVec4,
    /// `mat2x2<f32>`
    Mat2,
    /// `mat3x3<f32>`
    Mat3,
    /// `mat4x4<f32>`
    Mat4,
}

impl UniformType {
    /// Alignment of the type inside a WGSL uniform block.
    pub fn align(&self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec2 | UniformType::IVec2 | UniformType::Mat2 => 8,
            _ => 16,
        }
    }

    /// Size of the type inside a WGSL uniform block (matrix columns are padded to
    /// their alignment).
    pub fn size(&self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec2 | UniformType::IVec2 => 8,
            UniformType::Vec3 | UniformType::IVec3 => 12,
            UniformType::Vec4 | UniformType::IVec4 => 16,
            UniformType::Mat2 => 16,
            UniformType::Mat3 => 48,
            UniformType::Mat4 => 64,
        }
    }
}

/// A loose uniform the program reads, addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformDecl {
    /// The uniform name, e.g. `u_MVP`.
    pub name: String,
    /// The declared type.
    pub ty: UniformType,
}

impl UniformDecl {
    /// Shorthand constructor.
    pub fn new(name: impl Into<String>, ty: UniformType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A sampler slot the program reads, addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SamplerDecl {
    /// The sampler name, e.g. `s_albedo`.
    pub name: String,
    /// The dimension of the texture bound to this slot.
    pub dimension: TextureViewDimension,
    /// The kind of data sampled.
    pub sample_type: SampleType,
}

impl SamplerDecl {
    /// A filterable float sampler of the given dimension.
    pub fn float(name: impl Into<String>, dimension: TextureViewDimension) -> Self {
        Self {
            name: name.into(),
            dimension,
            sample_type: SampleType::Float,
        }
    }
}

/// A descriptor used to create a [`ProgramId`].
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The WGSL source holding both stages.
    pub source: Cow<'a, str>,
    /// The name of the vertex entry point.
    pub vertex_entry: Cow<'a, str>,
    /// The name of the fragment entry point.
    pub fragment_entry: Cow<'a, str>,
    /// Loose uniforms, in uniform block order.
    pub uniforms: Vec<UniformDecl>,
    /// Sampler slots, in binding order.
    pub samplers: Vec<SamplerDecl>,
}

impl<'a> ProgramDescriptor<'a> {
    /// A descriptor using the conventional `vs_main` / `fs_main` entry points.
    pub fn new(label: &'a str, source: &'a str) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            source: Cow::Borrowed(source),
            vertex_entry: Cow::Borrowed("vs_main"),
            fragment_entry: Cow::Borrowed("fs_main"),
            uniforms: Vec::new(),
            samplers: Vec::new(),
        }
    }

    /// Adds a loose uniform.
    pub fn with_uniform(mut self, name: &str, ty: UniformType) -> Self {
        self.uniforms.push(UniformDecl::new(name, ty));
        self
    }

    /// Adds a sampler slot.
    pub fn with_sampler(mut self, sampler: SamplerDecl) -> Self {
        self.samplers.push(sampler);
        self
    }

    /// The label, or `"unnamed"`.
    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("unnamed")
    }

    /// Byte offsets of every declared uniform inside the uniform block, followed by
    /// the total block size rounded up to 16 bytes.
    pub fn uniform_block_layout(&self) -> (Vec<usize>, usize) {
        let mut offsets = Vec::with_capacity(self.uniforms.len());
        let mut cursor = 0usize;
        for decl in &self.uniforms {
            let align = decl.ty.align();
            cursor = cursor.div_ceil(align) * align;
            offsets.push(cursor);
            cursor += decl.ty.size();
        }
        (offsets, cursor.div_ceil(16) * 16)
    }
}
