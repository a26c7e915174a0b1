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

use glam::{Mat4, Quat, Vec3};
use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::{
    FramebufferTarget, GraphicsDevice, PrimitiveTopology, ProgramDescriptor, RenderTarget,
    SamplerDecl, TextureDescriptor, TextureFormat, TextureViewDimension, UniformType,
    UniformValue, VertexFormat,
};
use lumen_infra::SoftwareDevice;
use lumen_scene::builder::common::DEFAULT_CLEAR_COLOR;
use lumen_scene::builder::{
    AttributeKind, DecodedAsset, DecodedAttribute, DecodedImage, DecodedMaterial, DecodedMesh,
    DecodedNode, DecodedSubset,
};
use lumen_scene::{
    Camera, DrawableIndex, EnvironmentMaps, FrameDescription, FrameInput, NodeIndex, PassIndex,
    RenderCommand, SceneBuilder, SceneError, Texture, TextureIndex,
};

/// A software device with test logging enabled.
fn device(surface: Extent2D) -> SoftwareDevice {
    let _ = env_logger::builder().is_test(true).try_init();
    SoftwareDevice::new(surface)
}

fn program() -> ProgramDescriptor<'static> {
    ProgramDescriptor::new("pbr", "fn vs_main() {} fn fs_main() {}")
        .with_uniform("u_MVP", UniformType::Mat4)
        .with_uniform("u_MODEL", UniformType::Mat4)
        .with_uniform("u_PROJECTION", UniformType::Mat4)
        .with_uniform("u_VIEW", UniformType::Mat4)
        .with_uniform("u_ANIM_KEY", UniformType::Float)
        .with_sampler(SamplerDecl::float("s_albedo", TextureViewDimension::D2))
}

fn triangle_asset() -> DecodedAsset {
    let positions: [f32; 9] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0];
    DecodedAsset {
        images: vec![DecodedImage {
            width: 1,
            height: 1,
            components: 3,
            pixels: vec![255, 0, 0],
        }],
        meshes: vec![DecodedMesh {
            subsets: vec![DecodedSubset {
                attributes: vec![DecodedAttribute {
                    kind: AttributeKind::Position,
                    format: VertexFormat::Float32x3,
                    data: bytemuck::cast_slice(&positions).to_vec(),
                }],
                vertex_count: 3,
                indices: None,
                topology: PrimitiveTopology::TriangleList,
                material: Some(0),
            }],
        }],
        materials: vec![DecodedMaterial {
            albedo: Some(0),
            ..Default::default()
        }],
        nodes: vec![DecodedNode {
            name: Some("root".to_string()),
            parent: None,
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: Some(0),
            skin: None,
        }],
    }
}

#[test]
fn test_common_builder_produces_a_renderable_scene() {
    // --- 1. ARRANGE ---
    let surface = Extent2D::new(4, 3);
    let mut device = device(surface);
    let mut builder = SceneBuilder::common(program());

    // --- 2. ACT ---
    let mut built = builder.build(&mut device, &triangle_asset(), None).unwrap();
    let input = FrameInput {
        camera: Camera::default(),
        viewport: surface,
        anim_key: 0.5,
    };
    input.refresh(&mut built.scene, &built.frame);
    let stats = built.scene.render(&mut device, surface).unwrap();

    // --- 3. ASSERT ---
    let scene = &built.scene;
    assert_eq!(scene.drawables.len(), 1);
    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(
        scene.materials.values().next().unwrap().texture("s_albedo"),
        Some(TextureIndex(0))
    );
    assert_eq!(
        scene.commands,
        vec![
            RenderCommand::Pass(PassIndex(0)),
            RenderCommand::Draw(DrawableIndex(0))
        ]
    );
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.elements, 3);

    let program = *scene.programs.values().next().unwrap();
    let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(
        device.uniform_value(program, "u_MODEL"),
        Some(UniformValue::Mat4(model.to_cols_array_2d()))
    );
    assert_eq!(
        device.uniform_value(program, "u_ANIM_KEY"),
        Some(UniformValue::Float(0.5))
    );

    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    let pixels = device.read_pixels(Rect2D::from_extent(surface)).unwrap();
    assert!(pixels.iter().all(|pixel| *pixel == DEFAULT_CLEAR_COLOR));
}

#[test]
fn test_mesh_placed_by_two_nodes_is_drawn_twice() {
    // --- 1. ARRANGE ---
    let surface = Extent2D::new(4, 3);
    let mut device = device(surface);
    let mut asset = triangle_asset();
    asset.nodes = [-5.0, 5.0]
        .into_iter()
        .map(|x| DecodedNode {
            name: None,
            parent: None,
            translation: Vec3::new(x, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: Some(0),
            skin: None,
        })
        .collect();
    let mut builder = SceneBuilder::common(program());

    // --- 2. ACT ---
    let mut built = builder.build(&mut device, &asset, None).unwrap();
    let input = FrameInput {
        camera: Camera::default(),
        viewport: surface,
        anim_key: 0.0,
    };
    input.refresh(&mut built.scene, &built.frame);
    let stats = built.scene.render(&mut device, surface).unwrap();

    // --- 3. ASSERT ---
    let scene = &built.scene;
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.drawables.len(), 2);
    assert_eq!(scene.materials.len(), 2);
    assert_eq!(stats.draw_calls, 2);

    let placements: Vec<_> = built.frame.objects.iter().map(|object| object.node).collect();
    assert_eq!(placements, vec![Some(NodeIndex(0)), Some(NodeIndex(1))]);
    let models: Vec<_> = built
        .frame
        .objects
        .iter()
        .map(|object| scene.parameters[object.model].uniform_value())
        .collect();
    for (model, x) in models.into_iter().zip([-5.0, 5.0]) {
        let expected = Mat4::from_translation(Vec3::new(x, 0.0, 0.0));
        assert_eq!(model, Some(UniformValue::Mat4(expected.to_cols_array_2d())));
    }
}

#[test]
fn test_unplaced_mesh_is_drawn_at_the_origin() {
    // --- 1. ARRANGE ---
    let mut device = device(Extent2D::new(2, 2));
    let mut asset = triangle_asset();
    asset.nodes.clear();
    let mut builder = SceneBuilder::common(program());

    // --- 2. ACT ---
    let built = builder.build(&mut device, &asset, None).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(built.scene.drawables.len(), 1);
    assert_eq!(built.frame.objects.len(), 1);
    assert_eq!(built.frame.objects[0].node, None);
}

#[test]
fn test_environment_maps_are_bound_to_every_material() {
    // --- 1. ARRANGE ---
    let mut device = device(Extent2D::new(2, 2));
    let mut textures = Vec::new();
    for label in ["env", "irradiance", "specular", "brdf"] {
        let descriptor = TextureDescriptor::attachment(label, 1, 1, TextureFormat::Rgba8Unorm);
        textures.push(Texture::D2(device.create_texture(&descriptor).unwrap()));
    }
    let maps = EnvironmentMaps {
        environment: textures[0],
        irradiance: textures[1],
        specular: textures[2],
        brdf: textures[3],
    };
    let mut builder = SceneBuilder::common(program());

    // --- 2. ACT ---
    let built = builder
        .build(&mut device, &triangle_asset(), Some(maps))
        .unwrap();

    // --- 3. ASSERT ---
    let material = built.scene.materials.values().next().unwrap();
    let names: Vec<&str> = material.textures().iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["s_albedo", "s_env", "s_ibl_diff", "s_ibl_spec", "s_brdf"]);
}

#[test]
fn test_malformed_image_is_rejected() {
    // --- 1. ARRANGE ---
    let mut device = device(Extent2D::new(2, 2));
    let mut asset = triangle_asset();
    asset.images[0].pixels.pop();
    let mut builder = SceneBuilder::common(program());

    // --- 2. ACT ---
    let result = builder.build(&mut device, &asset, None);

    // --- 3. ASSERT ---
    assert!(matches!(result, Err(SceneError::UnsupportedAsset(_))));
}

#[test]
fn test_frame_description_renders_end_to_end() {
    // --- 1. ARRANGE ---
    let surface = Extent2D::new(8, 6);
    let mut device = device(surface);
    let mut builder = SceneBuilder::common(program());
    let mut built = builder.build(&mut device, &triangle_asset(), None).unwrap();
    let description = FrameDescription::from_ron(
        r#"(
            framebuffers: [
                (
                    width: 16,
                    height: 12,
                    attachments: [
                        (slot: Color0, ty: Color8, clear_values: (0.0, 0.0, 1.0, 1.0)),
                        (slot: Depth, ty: Depth24F),
                    ],
                ),
            ],
            passes: [(framebuffer: 0, state: (cull: Back))],
            commands: [Pass(0), Draw(0)],
        )"#,
    )
    .unwrap();

    // --- 2. ACT ---
    let passes = built
        .scene
        .apply_frame_description(&mut device, &description)
        .unwrap();
    let stats = built.scene.render(&mut device, surface).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(passes, vec![PassIndex(1)]);
    assert_eq!(built.scene.commands[0], RenderCommand::Pass(PassIndex(1)));
    assert_eq!(stats.draw_calls, 1);
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    let pixels = device.read_pixels(Rect2D::from_extent(surface)).unwrap();
    assert!(pixels.iter().all(|pixel| *pixel == [0.0, 0.0, 1.0, 1.0]));
}

#[test]
fn test_invalid_frame_description_leaves_the_scene_untouched() {
    // --- 1. ARRANGE ---
    let mut device = device(Extent2D::new(2, 2));
    let mut builder = SceneBuilder::common(program());
    let mut built = builder.build(&mut device, &triangle_asset(), None).unwrap();
    let description = FrameDescription::from_ron(
        r#"(
            framebuffers: [(width: 2, height: 2, attachments: [(slot: Color0, ty: Color8)])],
            passes: [(framebuffer: 0)],
            commands: [Pass(0), Draw(7)],
        )"#,
    )
    .unwrap();
    let framebuffers = built.scene.framebuffers.len();

    // --- 2. ACT ---
    let result = built.scene.apply_frame_description(&mut device, &description);

    // --- 3. ASSERT ---
    assert!(matches!(result, Err(SceneError::InvalidDescription(_))));
    assert_eq!(built.scene.framebuffers.len(), framebuffers);
}
