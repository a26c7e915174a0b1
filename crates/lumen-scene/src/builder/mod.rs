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

//! Scene construction from decoded asset data.
//!
//! Asset parsing and image decoding happen elsewhere; their output arrives as the
//! `Decoded*` types below. A [`SceneBuilder`] is a set of closures, one per kind of
//! resource, that turn decoded data into registry entries. The [`common`] module
//! provides the stock closures; callers swap individual ones to customize a stage.

pub mod common;

use crate::camera::{FrameBindings, GlobalParameters, ObjectParameters};
use crate::error::Result;
use crate::index::{DrawableIndex, MaterialIndex, MeshIndex, NodeIndex, TextureIndex};
use crate::node::Node;
use crate::scene::Scene;
use crate::texture::Texture;
use glam::{Quat, Vec3};
use lumen_core::renderer::{GraphicsDevice, IndexFormat, PrimitiveTopology, VertexFormat};
use std::collections::HashMap;

/// A decoded image, tightly packed, 8 bits per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub components: u32,
    /// Row-major pixel bytes.
    pub pixels: Vec<u8>,
}

/// The semantic of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Vertex position.
    Position,
    /// First texture coordinate set.
    Uv0,
    /// Vertex normal.
    Normal,
    /// Vertex tangent.
    Tangent,
    /// Skinning joint indices.
    Joints,
    /// Skinning weights.
    Weights,
    /// Second texture coordinate set.
    Uv1,
    /// Vertex color.
    Color,
}

impl AttributeKind {
    /// The shader input location the attribute is bound to.
    pub fn location(self) -> u32 {
        match self {
            AttributeKind::Position => 0,
            AttributeKind::Uv0 => 1,
            AttributeKind::Normal => 2,
            AttributeKind::Tangent => 3,
            AttributeKind::Joints => 4,
            AttributeKind::Weights => 5,
            AttributeKind::Uv1 => 6,
            AttributeKind::Color => 7,
        }
    }
}

/// One tightly packed vertex attribute stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttribute {
    /// The semantic.
    pub kind: AttributeKind,
    /// The element format.
    pub format: VertexFormat,
    /// The raw elements.
    pub data: Vec<u8>,
}

/// An index stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedIndices {
    /// The element type.
    pub format: IndexFormat,
    /// The raw indices.
    pub data: Vec<u8>,
}

impl DecodedIndices {
    /// The number of indices.
    pub fn count(&self) -> u32 {
        (self.data.len() / self.format.size()) as u32
    }
}

/// A part of a mesh drawn with a single material.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSubset {
    /// The attribute streams.
    pub attributes: Vec<DecodedAttribute>,
    /// The number of vertices in every stream.
    pub vertex_count: u32,
    /// The index stream, for indexed subsets.
    pub indices: Option<DecodedIndices>,
    /// How vertices assemble into primitives.
    pub topology: PrimitiveTopology,
    /// The material, as an index into [`DecodedAsset::materials`].
    pub material: Option<usize>,
}

/// A mesh of the source asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedMesh {
    /// The parts of the mesh.
    pub subsets: Vec<DecodedSubset>,
}

/// The texture references of a material, as indices into [`DecodedAsset::images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedMaterial {
    /// Base color.
    pub albedo: Option<usize>,
    /// Metallic (blue) and roughness (green).
    pub metallic_roughness: Option<usize>,
    /// Tangent-space normals.
    pub normal: Option<usize>,
    /// Emitted light.
    pub emissive: Option<usize>,
    /// Ambient occlusion.
    pub occlusion: Option<usize>,
}

/// A node of the source asset. Parents precede their children.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNode {
    /// An optional name.
    pub name: Option<String>,
    /// The parent, as an index into [`DecodedAsset::nodes`].
    pub parent: Option<usize>,
    /// Local translation.
    pub translation: Vec3,
    /// Local rotation.
    pub rotation: Quat,
    /// Local scale.
    pub scale: Vec3,
    /// The mesh placed by the node, as an index into [`DecodedAsset::meshes`].
    pub mesh: Option<usize>,
    /// The skin deforming the mesh.
    pub skin: Option<u32>,
}

/// Everything decoded from one asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedAsset {
    /// Images.
    pub images: Vec<DecodedImage>,
    /// Meshes.
    pub meshes: Vec<DecodedMesh>,
    /// Materials.
    pub materials: Vec<DecodedMaterial>,
    /// Nodes.
    pub nodes: Vec<DecodedNode>,
}

/// The four maps of image-based lighting, already uploaded by their provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentMaps {
    /// The environment cubemap (`s_env`).
    pub environment: Texture,
    /// The diffuse irradiance cubemap (`s_ibl_diff`).
    pub irradiance: Texture,
    /// The prefiltered specular cubemap (`s_ibl_spec`).
    pub specular: Texture,
    /// The BRDF lookup table (`s_brdf`).
    pub brdf: Texture,
}

/// What a material builder gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct MaterialInput<'a> {
    /// The subset's decoded material, if it has one.
    pub material: Option<&'a DecodedMaterial>,
    /// The registry textures built from [`DecodedAsset::images`], in image order.
    pub images: &'a [TextureIndex],
}

/// Builds one registry texture per decoded image.
pub type ImageBuilder =
    Box<dyn FnMut(&mut Scene, &mut dyn GraphicsDevice, &DecodedImage) -> Result<TextureIndex>>;
/// Builds one mesh per decoded subset.
pub type MeshBuilder =
    Box<dyn FnMut(&mut Scene, &mut dyn GraphicsDevice, &DecodedSubset) -> Result<MeshIndex>>;
/// Builds one material per placed subset.
pub type MaterialBuilder = Box<
    dyn FnMut(&mut Scene, &mut dyn GraphicsDevice, &MaterialInput<'_>) -> Result<MaterialIndex>,
>;
/// Creates the per-object parameters of a material and binds them. The node is the
/// placement whose world transform the parameters follow.
pub type ParameterBuilder = Box<
    dyn FnMut(&mut Scene, &GlobalParameters, MaterialIndex, Option<NodeIndex>) -> ObjectParameters,
>;
/// Creates one drawable per placed subset.
pub type DrawableBuilder =
    Box<dyn FnMut(&mut Scene, MeshIndex, MaterialIndex, PrimitiveTopology) -> DrawableIndex>;
/// Creates render targets, passes and the command list.
pub type CommandBuilder = Box<dyn FnMut(&mut Scene, &mut dyn GraphicsDevice) -> Result<()>>;

/// The stages that turn a decoded asset into a [`Scene`].
pub struct SceneBuilder {
    /// Image stage.
    pub images: ImageBuilder,
    /// Mesh stage.
    pub meshes: MeshBuilder,
    /// Material stage.
    pub materials: MaterialBuilder,
    /// Parameter stage.
    pub parameters: ParameterBuilder,
    /// Drawable stage.
    pub drawables: DrawableBuilder,
    /// Command stage.
    pub commands: CommandBuilder,
}

/// A freshly built scene and the parameters its frames refresh.
#[derive(Debug)]
pub struct BuiltScene {
    /// The scene.
    pub scene: Scene,
    /// Where per-frame input is written.
    pub frame: FrameBindings,
}

impl SceneBuilder {
    /// Builds a scene from a decoded asset.
    ///
    /// Stages run in order: images, meshes, the node hierarchy, materials with their
    /// parameters, the environment maps, drawables and finally commands. Geometry is
    /// uploaded once per subset; every node placing a mesh gets its own material,
    /// parameters and drawable per subset, in depth-first node order. Meshes no node
    /// places are drawn once at the origin.
    ///
    /// ## Errors
    /// The first error a stage returns.
    pub fn build(
        &mut self,
        device: &mut dyn GraphicsDevice,
        asset: &DecodedAsset,
        environment: Option<EnvironmentMaps>,
    ) -> Result<BuiltScene> {
        let mut scene = Scene::new();

        let images = asset
            .images
            .iter()
            .map(|image| (self.images)(&mut scene, &mut *device, image))
            .collect::<Result<Vec<_>>>()?;

        let mut subsets = HashMap::new();
        let mut mesh_groups = Vec::with_capacity(asset.meshes.len());
        for mesh in &asset.meshes {
            let mut group = Vec::with_capacity(mesh.subsets.len());
            for subset in &mesh.subsets {
                let index = (self.meshes)(&mut scene, &mut *device, subset)?;
                group.push(index);
                subsets.insert(index, subset);
            }
            mesh_groups.push(group);
        }

        for (i, node) in asset.nodes.iter().enumerate() {
            let parent = node.parent.map(|parent| {
                assert!(parent < i, "node {i} precedes its parent {parent}");
                NodeIndex(parent as u32)
            });
            let meshes = node
                .mesh
                .map(|mesh| mesh_groups[mesh].clone())
                .unwrap_or_default();
            scene.nodes.add(
                parent,
                Node {
                    name: node.name.clone(),
                    translation: node.translation,
                    rotation: node.rotation,
                    scale: node.scale,
                    meshes,
                    skin: node.skin,
                    ..Default::default()
                },
            );
        }

        let mut placements = Vec::new();
        scene.nodes.traverse(|index, node| {
            placements.extend(node.meshes.iter().map(|mesh| (Some(index), *mesh)));
            true
        });
        let unplaced = mesh_groups
            .iter()
            .flatten()
            .filter(|mesh| !placements.iter().any(|(_, placed)| placed == *mesh))
            .map(|mesh| (None, *mesh))
            .collect::<Vec<_>>();
        placements.extend(unplaced);

        let globals = GlobalParameters::create(&mut scene);
        let mut objects = Vec::with_capacity(placements.len());
        let mut draws = Vec::with_capacity(placements.len());
        for (node, mesh) in placements {
            let subset = subsets[&mesh];
            let input = MaterialInput {
                material: subset.material.and_then(|i| asset.materials.get(i)),
                images: &images,
            };
            let material = (self.materials)(&mut scene, &mut *device, &input)?;
            objects.push((self.parameters)(&mut scene, &globals, material, node));
            draws.push((mesh, material, subset.topology));
        }

        if let Some(environment) = environment {
            scene.add_environment(&environment);
        }

        for (mesh, material, topology) in draws {
            (self.drawables)(&mut scene, mesh, material, topology);
        }

        (self.commands)(&mut scene, &mut *device)?;

        log::info!(
            "SceneBuilder: built {} drawables, {} textures, {} nodes",
            scene.drawables.len(),
            scene.textures.len(),
            scene.nodes.len()
        );
        Ok(BuiltScene {
            scene,
            frame: FrameBindings { globals, objects },
        })
    }
}

impl Scene {
    /// Registers the environment maps and binds them to every material as `s_env`,
    /// `s_ibl_diff`, `s_ibl_spec` and `s_brdf`.
    pub fn add_environment(&mut self, maps: &EnvironmentMaps) -> [TextureIndex; 4] {
        let indices = [
            self.add_texture(maps.environment),
            self.add_texture(maps.irradiance),
            self.add_texture(maps.specular),
            self.add_texture(maps.brdf),
        ];
        let names = ["s_env", "s_ibl_diff", "s_ibl_spec", "s_brdf"];
        for material in self.materials.values_mut() {
            for (name, texture) in names.iter().zip(indices) {
                material.add_texture(*name, texture);
            }
        }
        indices
    }
}
