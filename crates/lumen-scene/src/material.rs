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

//! Materials: a program plus its named textures, parameters and draw state.

use crate::index::{MaterialIndex, ParameterIndex, ProgramIndex, TextureIndex};
use crate::scene::Scene;
use lumen_core::renderer::{ColorWrites, CompareFunction, CullMode, DepthState, DrawState};
use serde::{Deserialize, Serialize};

/// The part of the draw state a material controls. Blending stays with the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialState {
    /// Depth test and writes.
    pub depth: DepthState,
    /// Color channel write mask.
    pub color_writes: ColorWrites,
    /// Face culling.
    pub cull: CullMode,
}

impl MaterialState {
    /// Less-equal depth test with writes, back-face culling and full color writes.
    pub const OPAQUE: MaterialState = MaterialState {
        depth: DepthState::testing(CompareFunction::LessEqual),
        color_writes: ColorWrites::ALL,
        cull: CullMode::Back,
    };

    /// Overrides the depth, color-write and cull fields of a pass state.
    pub fn apply_to(&self, pass: DrawState) -> DrawState {
        DrawState {
            depth: self.depth,
            color_writes: self.color_writes,
            cull: self.cull,
            blend: pass.blend,
        }
    }
}

impl Default for MaterialState {
    /// No depth test, no depth writes, no culling, full color writes.
    fn default() -> Self {
        Self {
            depth: DepthState {
                test_enabled: false,
                compare: CompareFunction::Less,
                write_enabled: false,
            },
            color_writes: ColorWrites::ALL,
            cull: CullMode::Off,
        }
    }
}

/// A program with its named texture and parameter bindings.
///
/// Names are the sampler and uniform names the program declares. Each name binds at
/// most once; binding a name again replaces the previous binding in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// The shader program.
    pub program: ProgramIndex,
    /// The draw state the material imposes.
    pub state: MaterialState,
    textures: Vec<(String, TextureIndex)>,
    parameters: Vec<(String, ParameterIndex)>,
}

impl Material {
    /// A material without bindings.
    pub fn new(program: ProgramIndex) -> Self {
        Self {
            program,
            state: MaterialState::default(),
            textures: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Sets the draw state.
    pub fn with_state(mut self, state: MaterialState) -> Self {
        self.state = state;
        self
    }

    /// Binds a texture to a sampler name.
    pub fn add_texture(&mut self, name: impl Into<String>, texture: TextureIndex) {
        upsert(&mut self.textures, name.into(), texture);
    }

    /// Binds a parameter to a uniform name.
    pub fn add_parameter(&mut self, name: impl Into<String>, parameter: ParameterIndex) {
        upsert(&mut self.parameters, name.into(), parameter);
    }

    /// Texture bindings, in binding order. Texture units follow this order.
    pub fn textures(&self) -> &[(String, TextureIndex)] {
        &self.textures
    }

    /// Parameter bindings, in binding order.
    pub fn parameters(&self) -> &[(String, ParameterIndex)] {
        &self.parameters
    }

    /// The texture bound to `name`.
    pub fn texture(&self, name: &str) -> Option<TextureIndex> {
        lookup(&self.textures, name)
    }

    /// The parameter bound to `name`.
    pub fn parameter(&self, name: &str) -> Option<ParameterIndex> {
        lookup(&self.parameters, name)
    }
}

fn upsert<T>(bindings: &mut Vec<(String, T)>, name: String, value: T) {
    match bindings.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, slot)) => *slot = value,
        None => bindings.push((name, value)),
    }
}

fn lookup<T: Copy>(bindings: &[(String, T)], name: &str) -> Option<T> {
    bindings
        .iter()
        .find(|(existing, _)| existing == name)
        .map(|(_, value)| *value)
}

impl Scene {
    /// Registers a material using `program`.
    pub fn create_material(&mut self, program: ProgramIndex) -> MaterialIndex {
        assert!(
            self.programs.contains(program),
            "material refers to missing {program}"
        );
        self.materials.push(Material::new(program))
    }
}
