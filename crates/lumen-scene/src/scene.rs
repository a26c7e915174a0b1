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

//! The scene: every GPU resource of a loaded asset in flat, index-addressed
//! registries, plus the node graph and the command list describing a frame.

use crate::attachment::Attachment;
use crate::command::RenderCommand;
use crate::error::Result;
use crate::framebuffer::Framebuffer;
use crate::index::{
    AttachmentIndex, DrawableIndex, FboIndex, FramebufferIndex, IndexSourceIndex, MaterialIndex,
    MeshIndex, ParameterIndex, PassIndex, ProgramIndex, Registry, TextureIndex,
    VertexSourceIndex,
};
use crate::material::Material;
use crate::mesh::{Drawable, Mesh};
use crate::node::NodeArena;
use crate::parameter::Parameter;
use crate::pass::Pass;
use crate::texture::Texture;
use lumen_core::renderer::{
    FramebufferObjectId, GraphicsDevice, IndexSourceDescriptor, IndexSourceId, ProgramDescriptor,
    ProgramId, TextureDescriptor, VertexSourceDescriptor, VertexSourceId,
};

/// Owns all resources of a loaded scene.
///
/// Registries only grow; every cross-reference is an index into one of them and
/// out-of-range lookups panic. The scene is move-only and releases its device
/// resources through [`Scene::destroy`].
#[derive(Debug, Default)]
pub struct Scene {
    /// Geometry descriptions.
    pub meshes: Registry<MeshIndex, Mesh>,
    /// Materials.
    pub materials: Registry<MaterialIndex, Material>,
    /// Mesh and material pairs.
    pub drawables: Registry<DrawableIndex, Drawable>,
    /// Render-target images.
    pub attachments: Registry<AttachmentIndex, Attachment>,
    /// Render targets.
    pub framebuffers: Registry<FramebufferIndex, Framebuffer>,
    /// Passes.
    pub passes: Registry<PassIndex, Pass>,
    /// Sampled images and attachment storage.
    pub textures: Registry<TextureIndex, Texture>,
    /// Uniform values.
    pub parameters: Registry<ParameterIndex, Parameter>,
    /// Device shader programs.
    pub programs: Registry<ProgramIndex, ProgramId>,
    /// Device vertex sources.
    pub vertex_sources: Registry<VertexSourceIndex, VertexSourceId>,
    /// Device index sources.
    pub index_sources: Registry<IndexSourceIndex, IndexSourceId>,
    /// Device framebuffer objects.
    pub framebuffer_objects: Registry<FboIndex, FramebufferObjectId>,
    /// The node hierarchy.
    pub nodes: NodeArena,
    /// The frame, in execution order. May be replaced between frames.
    pub commands: Vec<RenderCommand>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        log::info!("Scene: created");
        Self::default()
    }

    /// Creates a device texture and registers it.
    pub fn create_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureIndex> {
        let id = device.create_texture(descriptor)?;
        Ok(self.textures.push(Texture::new(descriptor.dimension, id)))
    }

    /// Registers a texture created elsewhere (e.g. an environment map provider).
    pub fn add_texture(&mut self, texture: Texture) -> TextureIndex {
        self.textures.push(texture)
    }

    /// Compiles a program and registers it.
    ///
    /// ## Errors
    /// The device's compilation error, carrying the compiler log.
    pub fn create_program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramIndex> {
        let id = device.create_program(descriptor)?;
        let index = self.programs.push(id);
        log::debug!(
            "Scene: created {index} from '{}'",
            descriptor.label_or_default()
        );
        Ok(index)
    }

    /// Uploads a vertex source and registers it.
    pub fn create_vertex_source(
        &mut self,
        device: &mut dyn GraphicsDevice,
        descriptor: &VertexSourceDescriptor,
    ) -> Result<VertexSourceIndex> {
        let id = device.create_vertex_source(descriptor)?;
        Ok(self.vertex_sources.push(id))
    }

    /// Uploads an index source and registers it.
    pub fn create_index_source(
        &mut self,
        device: &mut dyn GraphicsDevice,
        descriptor: &IndexSourceDescriptor,
    ) -> Result<IndexSourceIndex> {
        let id = device.create_index_source(descriptor)?;
        Ok(self.index_sources.push(id))
    }

    /// Replaces the command list.
    pub fn set_commands(&mut self, commands: Vec<RenderCommand>) {
        self.commands = commands;
    }

    /// Releases every device resource the scene owns.
    ///
    /// All resources are released even if some fail; the first error is returned.
    pub fn destroy(self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let mut first_error = None;
        let mut keep = |result: std::result::Result<(), _>| {
            if let Err(err) = result {
                log::warn!("Scene: failed to release a resource: {err}");
                first_error.get_or_insert(err);
            }
        };

        for fbo in self.framebuffer_objects.into_values() {
            keep(device.destroy_framebuffer_object(fbo));
        }
        for texture in self.textures.into_values() {
            keep(device.destroy_texture(texture.id()));
        }
        for program in self.programs.into_values() {
            keep(device.destroy_program(program));
        }
        for source in self.index_sources.into_values() {
            keep(device.destroy_index_source(source));
        }
        for source in self.vertex_sources.into_values() {
            keep(device.destroy_vertex_source(source));
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => {
                log::debug!("Scene: destroyed");
                Ok(())
            }
        }
    }
}
