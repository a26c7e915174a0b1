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

//! The stock builder stages.

use super::{
    CommandBuilder, DecodedImage, DecodedSubset, DrawableBuilder, ImageBuilder, MaterialBuilder,
    MaterialInput, MeshBuilder, ParameterBuilder, SceneBuilder,
};
use crate::attachment::AttachmentType;
use crate::camera::{mat4_parameter, GlobalParameters, ObjectParameters};
use crate::command::RenderCommand;
use crate::error::SceneError;
use crate::framebuffer::AttachmentSlot;
use crate::index::{MaterialIndex, MeshIndex, NodeIndex, ProgramIndex};
use crate::material::MaterialState;
use crate::mesh::{Mesh, MeshIndices};
use crate::parameter::{BaseType, ComponentType, Parameter};
use crate::scene::Scene;
use lumen_core::math::{Extent2D, Extent3D};
use lumen_core::renderer::{
    DrawState, GraphicsDevice, IndexSourceDescriptor, PrimitiveTopology, ProgramDescriptor,
    TextureDescriptor, TextureFormat, TextureUsage, TextureViewDimension, VertexBufferData,
    VertexBufferLayoutDescriptor, VertexSourceDescriptor,
};
use std::borrow::Cow;

/// The size of the framebuffer the stock command stage renders into.
pub const DEFAULT_FRAMEBUFFER_SIZE: Extent2D = Extent2D::new(1600, 1200);

/// The clear color of the stock framebuffer.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

/// Sampler names of the stock material stage, matching [`super::DecodedMaterial`]'s fields.
pub const MATERIAL_SAMPLERS: [&str; 5] = [
    "s_albedo",
    "s_metallic_roughness",
    "s_normal",
    "s_emissive",
    "s_occlusion",
];

impl SceneBuilder {
    /// The stock stages, with materials using `program` and the default framebuffer
    /// size.
    pub fn common(program: ProgramDescriptor<'static>) -> Self {
        Self {
            images: image_builder(),
            meshes: mesh_builder(),
            materials: material_builder(program),
            parameters: parameter_builder(),
            drawables: drawable_builder(),
            commands: command_builder(DEFAULT_FRAMEBUFFER_SIZE),
        }
    }
}

/// Uploads every image as a single-mip 2D texture. Three-channel images are widened
/// to RGBA.
pub fn image_builder() -> ImageBuilder {
    Box::new(|scene: &mut Scene, device: &mut dyn GraphicsDevice, image: &DecodedImage| {
        let expected = image.width as usize * image.height as usize * image.components as usize;
        if image.pixels.len() != expected {
            return Err(SceneError::UnsupportedAsset(format!(
                "{}x{} image with {} channels holds {} bytes, expected {expected}",
                image.width,
                image.height,
                image.components,
                image.pixels.len()
            )));
        }

        let (format, pixels) = match image.components {
            3 => (
                TextureFormat::Rgba8Unorm,
                Cow::Owned(
                    image
                        .pixels
                        .chunks_exact(3)
                        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                        .collect(),
                ),
            ),
            components => match TextureFormat::unorm8_for_components(components) {
                Some(format) => (format, Cow::Borrowed(image.pixels.as_slice())),
                None => {
                    return Err(SceneError::UnsupportedAsset(format!(
                        "images with {components} channels"
                    )))
                }
            },
        };

        let label = format!("image{}", scene.textures.len());
        let texture = scene.create_texture(
            device,
            &TextureDescriptor {
                label: Some(Cow::Borrowed(&label)),
                size: Extent3D {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                dimension: TextureViewDimension::D2,
                format,
                usage: TextureUsage::SAMPLED,
            },
        )?;
        device.write_texture(scene.textures[texture].id(), 0, &pixels)?;
        Ok(texture)
    })
}

/// Uploads one vertex buffer per attribute, at the attribute's location, and the
/// index stream if there is one.
pub fn mesh_builder() -> MeshBuilder {
    Box::new(|scene: &mut Scene, device: &mut dyn GraphicsDevice, subset: &DecodedSubset| {
        let buffers = subset
            .attributes
            .iter()
            .map(|attribute| VertexBufferData {
                data: Cow::Borrowed(attribute.data.as_slice()),
                layout: VertexBufferLayoutDescriptor::single(
                    attribute.kind.location(),
                    attribute.format,
                ),
            })
            .collect();
        let label = format!("mesh{}", scene.meshes.len());
        let vertex_source = scene.create_vertex_source(
            device,
            &VertexSourceDescriptor {
                label: Some(Cow::Borrowed(&label)),
                buffers,
            },
        )?;

        let mesh = match &subset.indices {
            Some(indices) => {
                let source = scene.create_index_source(
                    device,
                    &IndexSourceDescriptor {
                        label: Some(Cow::Borrowed(&label)),
                        data: Cow::Borrowed(indices.data.as_slice()),
                        format: indices.format,
                    },
                )?;
                Mesh::indexed(
                    vertex_source,
                    subset.vertex_count,
                    MeshIndices {
                        source,
                        format: indices.format,
                        count: indices.count(),
                    },
                )
            }
            None => Mesh::non_indexed(vertex_source, subset.vertex_count),
        };
        Ok(scene.create_mesh(mesh))
    })
}

/// Creates one opaque material per subset, all sharing `program` (compiled on
/// first use), with the subset's images bound to [`MATERIAL_SAMPLERS`].
pub fn material_builder(program: ProgramDescriptor<'static>) -> MaterialBuilder {
    let mut compiled: Option<ProgramIndex> = None;
    Box::new(move |scene: &mut Scene, device: &mut dyn GraphicsDevice, input: &MaterialInput<'_>| {
        let program_index = match compiled {
            Some(index) => index,
            None => *compiled.insert(scene.create_program(device, &program)?),
        };

        let index = scene.create_material(program_index);
        let material = &mut scene.materials[index];
        material.state = MaterialState::OPAQUE;
        if let Some(decoded) = input.material {
            let images = [
                decoded.albedo,
                decoded.metallic_roughness,
                decoded.normal,
                decoded.emissive,
                decoded.occlusion,
            ];
            for (name, image) in MATERIAL_SAMPLERS.iter().zip(images) {
                if let Some(texture) = image.and_then(|i| input.images.get(i)) {
                    material.add_texture(*name, *texture);
                }
            }
        }
        Ok(index)
    })
}

/// Creates `u_MVP`, `u_MODEL` and `u_ANIM_KEY` for the material and binds them
/// together with the camera's `u_PROJECTION` and `u_VIEW`.
pub fn parameter_builder() -> ParameterBuilder {
    Box::new(
        |scene: &mut Scene,
         globals: &GlobalParameters,
         material: MaterialIndex,
         node: Option<NodeIndex>| {
            let anim_key = Parameter::new(BaseType::F32, ComponentType::Scalar);
            let object = ObjectParameters {
                node,
                mvp: scene.create_parameter(mat4_parameter()),
                model: scene.create_parameter(mat4_parameter()),
                anim_key: scene.create_parameter(anim_key),
            };
            let material = &mut scene.materials[material];
            material.add_parameter("u_MVP", object.mvp);
            material.add_parameter("u_MODEL", object.model);
            material.add_parameter("u_ANIM_KEY", object.anim_key);
            material.add_parameter("u_PROJECTION", globals.projection);
            material.add_parameter("u_VIEW", globals.view);
            object
        },
    )
}

/// One drawable per placed subset.
pub fn drawable_builder() -> DrawableBuilder {
    Box::new(
        |scene: &mut Scene, mesh: MeshIndex, material: MaterialIndex, topology: PrimitiveTopology| {
            scene.create_drawable(mesh, material, topology)
        },
    )
}

/// A single pass over a `size` framebuffer with a color attachment cleared to
/// [`DEFAULT_CLEAR_COLOR`] and a depth attachment, drawing every drawable in order.
pub fn command_builder(size: Extent2D) -> CommandBuilder {
    Box::new(move |scene: &mut Scene, device: &mut dyn GraphicsDevice| {
        let framebuffer = scene.create_framebuffer(device, size.width, size.height)?;
        let color = scene.add_attachment(
            device,
            framebuffer,
            AttachmentSlot::Color0,
            AttachmentType::Color8,
        )?;
        scene.attachments[color].clear_values = DEFAULT_CLEAR_COLOR;
        scene.add_attachment(
            device,
            framebuffer,
            AttachmentSlot::Depth,
            AttachmentType::Depth24F,
        )?;
        let pass = scene.create_pass(framebuffer, DrawState::default());

        let mut commands = vec![RenderCommand::Pass(pass)];
        commands.extend(scene.drawables.iter().map(|(index, _)| RenderCommand::Draw(index)));
        scene.set_commands(commands);
        Ok(())
    })
}
