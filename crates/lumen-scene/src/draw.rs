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

//! The per-drawable draw protocol.

use crate::error::Result;
use crate::guard::{BindGuard, TextureUnits};
use crate::index::{DrawableIndex, PassIndex};
use crate::scene::Scene;
use lumen_core::renderer::{DrawCall, GraphicsDevice, UniformValue};

impl Scene {
    /// Draws one drawable inside the bound pass.
    ///
    /// Geometry, program and textures are bound through nested guards and released
    /// when the draw returns: textures in the order they were bound, the rest in
    /// reverse order of acquisition. Sampler and uniform names the program does not
    /// declare are skipped.
    ///
    /// ## Returns
    /// The draw call that was issued.
    ///
    /// # Panics
    /// On an out-of-range index, or if the material binds an integer matrix
    /// parameter.
    pub fn draw(
        &self,
        device: &mut dyn GraphicsDevice,
        pass: PassIndex,
        drawable: DrawableIndex,
    ) -> Result<DrawCall> {
        let pass_state = self.passes[pass].state;
        let drawable_ref = &self.drawables[drawable];
        let mesh = &self.meshes[drawable_ref.mesh];
        let material = &self.materials[drawable_ref.material];
        let program = self.programs[material.program];

        let vertex_source = self.vertex_sources[mesh.vertex_source];
        let index_source = mesh.indices.map(|indices| self.index_sources[indices.source]);
        let mut geometry = BindGuard::new(device, vertex_source);
        let mut indices = BindGuard::new(&mut *geometry, index_source);

        let mut program_guard = BindGuard::new(&mut *indices, program);

        let units = material
            .textures()
            .iter()
            .enumerate()
            .map(|(unit, (_, texture))| (unit as u32, self.textures[*texture].id()))
            .collect();
        let mut device = BindGuard::new(&mut *program_guard, TextureUnits(units));
        for (unit, (name, _)) in material.textures().iter().enumerate() {
            if !device.set_uniform(name, UniformValue::Int(unit as i32)) {
                log::trace!("Scene: {} has no sampler '{name}', skipped", material.program);
            }
        }

        for (name, parameter) in material.parameters() {
            let Some(value) = self.parameters[*parameter].uniform_value() else {
                panic!("unsupported parameter type for uniform '{name}' ({parameter})");
            };
            if !device.set_uniform(name, value) {
                log::trace!("Scene: {} has no uniform '{name}', skipped", material.program);
            }
        }

        device.set_draw_state(&material.state.apply_to(pass_state));

        let call = mesh.draw_call();
        log::trace!("Scene: drawing {drawable} ({call:?}, {:?})", drawable_ref.topology);
        device.draw(drawable_ref.topology, call)?;
        Ok(call)
    }
}
