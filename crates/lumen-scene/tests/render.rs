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

use approx::assert_abs_diff_eq;
use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::{
    BlendMode, CullMode, DrawCall, DrawState, FramebufferTarget, GraphicsDevice, IndexFormat,
    PrimitiveTopology, ProgramDescriptor, RenderTarget, SamplerDecl, TextureDescriptor,
    TextureFormat, TextureViewDimension, UniformType, UniformValue,
};
use lumen_infra::{DeviceCall, SoftwareDevice};
use lumen_scene::{
    AttachmentSlot, AttachmentType, BaseType, ComponentType, FramebufferIndex, MaterialIndex,
    MaterialState, MeshIndex, Parameter, PassIndex, ProgramIndex, RenderCommand, Scene,
};

const SHADER: &str = "fn vs_main() {} fn fs_main() {}";

/// Tolerance of one 8-bit quantization step.
const UNORM8_EPSILON: f32 = 1.0 / 255.0;

/// A software device with test logging enabled.
fn device(surface: Extent2D) -> SoftwareDevice {
    let _ = env_logger::builder().is_test(true).try_init();
    SoftwareDevice::new(surface)
}

fn program(scene: &mut Scene, device: &mut SoftwareDevice) -> ProgramIndex {
    let descriptor = ProgramDescriptor::new("test", SHADER)
        .with_uniform("u_tint", UniformType::Vec4)
        .with_sampler(SamplerDecl::float("s_a", TextureViewDimension::D2))
        .with_sampler(SamplerDecl::float("s_b", TextureViewDimension::D2));
    scene.create_program(device, &descriptor).unwrap()
}

fn framebuffer(
    scene: &mut Scene,
    device: &mut SoftwareDevice,
    size: Extent2D,
    clear: [f32; 4],
) -> FramebufferIndex {
    let fb = scene.create_framebuffer(device, size.width, size.height).unwrap();
    let color = scene
        .add_attachment(device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    scene.attachments[color].clear_values = clear;
    scene
        .add_attachment(device, fb, AttachmentSlot::Depth, AttachmentType::Depth24F)
        .unwrap();
    fb
}

fn cube_material(
    scene: &mut Scene,
    device: &mut SoftwareDevice,
) -> (MeshIndex, MaterialIndex) {
    let program = program(scene, device);
    let mesh = scene.create_cube_mesh(device).unwrap();
    let material = scene.create_material(program);
    (mesh, material)
}

fn position(journal: &[DeviceCall], predicate: impl Fn(&DeviceCall) -> bool) -> usize {
    journal
        .iter()
        .position(predicate)
        .expect("call not found in the journal")
}

fn read_surface(device: &mut SoftwareDevice, size: Extent2D) -> Vec<[f32; 4]> {
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    device.read_pixels(Rect2D::from_extent(size)).unwrap()
}

#[test]
fn test_cleared_framebuffer_reaches_the_surface() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(800, 600);
    let clear = [0.2, 0.3, 0.3, 1.0];
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, clear);
    let pass = scene.create_pass(fb, DrawState::default());
    let (mesh, material) = cube_material(&mut scene, &mut device);
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Draw(drawable)]);

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();
    let pixels = read_surface(&mut device, size);

    // --- 3. ASSERT ---
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.elements, 36);
    assert_eq!(stats.blits, 1);
    assert_eq!(pixels.len(), size.area());
    for pixel in pixels {
        for (channel, expected) in pixel.iter().zip(clear) {
            assert_abs_diff_eq!(*channel, expected, epsilon = UNORM8_EPSILON);
        }
    }
    assert_eq!(
        device.bound_framebuffer(FramebufferTarget::Draw),
        RenderTarget::Surface
    );
}

#[test]
fn test_single_pixel_framebuffer_blits_green() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(1, 1);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0, 1.0, 0.0, 1.0]);
    let pass = scene.create_pass(fb, DrawState::default());
    scene.set_commands(vec![RenderCommand::Pass(pass)]);

    // --- 2. ACT ---
    scene.render(&mut device, size).unwrap();
    let pixels = read_surface(&mut device, size);

    // --- 3. ASSERT ---
    assert_eq!(pixels, vec![[0.0, 1.0, 0.0, 1.0]]);
}

#[test]
fn test_commands_run_in_order_across_passes() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(4, 4);
    let mut device = device(size);
    let mut scene = Scene::new();
    let first_fb = framebuffer(&mut scene, &mut device, size, [1.0, 0.0, 0.0, 1.0]);
    let second_fb = framebuffer(&mut scene, &mut device, size, [0.0, 0.0, 1.0, 1.0]);
    let first = scene.create_pass(first_fb, DrawState::default());
    let second = scene.create_pass(second_fb, DrawState::default());
    let (mesh, material) = cube_material(&mut scene, &mut device);
    let a = scene.create_drawable(mesh, material, PrimitiveTopology::PointList);
    let b = scene.create_drawable(mesh, material, PrimitiveTopology::LineList);
    let c = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![
        RenderCommand::Pass(first),
        RenderCommand::Draw(a),
        RenderCommand::Draw(b),
        RenderCommand::Pass(second),
        RenderCommand::Draw(c),
    ]);
    let first_fbo =
        RenderTarget::Framebuffer(scene.framebuffer_objects[scene.framebuffers[first_fb].fbo]);
    let second_fbo =
        RenderTarget::Framebuffer(scene.framebuffer_objects[scene.framebuffers[second_fb].fbo]);
    device.take_journal();

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();

    // --- 3. ASSERT ---
    let journal = device.take_journal();
    let draw_of = |topology: PrimitiveTopology| {
        move |call: &DeviceCall| {
            matches!(call, DeviceCall::Draw { topology: t, .. } if *t == topology)
        }
    };
    let draw_a = position(&journal, draw_of(PrimitiveTopology::PointList));
    let draw_b = position(&journal, draw_of(PrimitiveTopology::LineList));
    let draw_c = position(&journal, draw_of(PrimitiveTopology::TriangleList));
    let bind_second = position(&journal, |call| {
        *call
            == DeviceCall::BindFramebuffer {
                target: FramebufferTarget::Draw,
                render_target: second_fbo,
            }
    });
    let unbind_first = position(&journal, |call| {
        *call
            == DeviceCall::BindFramebuffer {
                target: FramebufferTarget::Draw,
                render_target: RenderTarget::Surface,
            }
    });

    assert!(draw_a < draw_b);
    assert!(draw_b < unbind_first);
    assert!(unbind_first < bind_second);
    assert!(bind_second < draw_c);
    assert!(matches!(journal[draw_a], DeviceCall::Draw { target, .. } if target == first_fbo));
    assert!(matches!(journal[draw_c], DeviceCall::Draw { target, .. } if target == second_fbo));
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.draw_calls, 3);
}

#[test]
fn test_draw_binds_and_releases_in_protocol_order() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(4, 4);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    let pass = scene.create_pass(fb, DrawState::default());
    let program = program(&mut scene, &mut device);
    let mesh = scene.create_plane_mesh(&mut device).unwrap();
    let texture_descriptor = TextureDescriptor::attachment("t", 1, 1, TextureFormat::Rgba8Unorm);
    let t0 = scene.create_texture(&mut device, &texture_descriptor).unwrap();
    let t1 = scene.create_texture(&mut device, &texture_descriptor).unwrap();
    let tint =
        scene.create_parameter(Parameter::from_f32(ComponentType::Vec4, &[1.0, 0.5, 0.25, 1.0]));
    let material = scene.create_material(program);
    scene.materials[material].add_texture("s_a", t0);
    scene.materials[material].add_texture("s_b", t1);
    scene.materials[material].add_parameter("u_tint", tint);
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.bind_pass(&mut device, pass).unwrap();
    device.take_journal();

    // --- 2. ACT ---
    let call = scene.draw(&mut device, pass, drawable).unwrap();

    // --- 3. ASSERT ---
    let vertex_source = scene.vertex_sources[scene.meshes[mesh].vertex_source];
    let index_source = scene.index_sources[scene.meshes[mesh].indices.unwrap().source];
    let program_id = scene.programs[program];
    let target = RenderTarget::Framebuffer(scene.framebuffer_objects[scene.framebuffers[fb].fbo]);
    let state = MaterialState::default().apply_to(DrawState::default());
    let expected_call = DrawCall::Indexed {
        format: IndexFormat::Uint32,
        count: 6,
    };
    assert_eq!(call, expected_call);
    assert_eq!(
        device.take_journal(),
        vec![
            DeviceCall::BindVertexSource(vertex_source),
            DeviceCall::BindIndexSource(index_source),
            DeviceCall::BindProgram(program_id),
            DeviceCall::BindTexture { unit: 0, texture: scene.textures[t0].id() },
            DeviceCall::BindTexture { unit: 1, texture: scene.textures[t1].id() },
            DeviceCall::SetUniform { name: "s_a".into(), value: UniformValue::Int(0), found: true },
            DeviceCall::SetUniform { name: "s_b".into(), value: UniformValue::Int(1), found: true },
            DeviceCall::SetUniform {
                name: "u_tint".into(),
                value: UniformValue::Vec4([1.0, 0.5, 0.25, 1.0]),
                found: true,
            },
            DeviceCall::DrawState(state),
            DeviceCall::Draw {
                target,
                program: program_id,
                topology: PrimitiveTopology::TriangleList,
                call: expected_call,
                state,
            },
            DeviceCall::UnbindTexture { unit: 0 },
            DeviceCall::UnbindTexture { unit: 1 },
            DeviceCall::UnbindProgram,
            DeviceCall::UnbindIndexSource,
            DeviceCall::UnbindVertexSource,
        ]
    );
    assert_eq!(device.bound_texture(0), None);
}

#[test]
fn test_material_state_overrides_the_pass_except_blending() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    let pass_state = DrawState {
        blend: BlendMode::Additive,
        cull: CullMode::Front,
        ..DrawState::default()
    };
    let pass = scene.create_pass(fb, pass_state);
    let (mesh, material) = cube_material(&mut scene, &mut device);
    scene.materials[material].state = MaterialState::OPAQUE;
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Draw(drawable)]);

    // --- 2. ACT ---
    scene.render(&mut device, size).unwrap();

    // --- 3. ASSERT ---
    let state = device
        .journal()
        .iter()
        .find_map(|call| match call {
            DeviceCall::Draw { state, .. } => Some(*state),
            _ => None,
        })
        .unwrap();
    assert_eq!(state.blend, BlendMode::Additive);
    assert_eq!(state.cull, CullMode::Back);
    assert_eq!(state.depth, MaterialState::OPAQUE.depth);
    assert_eq!(device.draw_state(), DrawState::default());
}

#[test]
fn test_unknown_names_are_skipped() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    let pass = scene.create_pass(fb, DrawState::default());
    let (mesh, material) = cube_material(&mut scene, &mut device);
    let texture = scene
        .create_texture(
            &mut device,
            &TextureDescriptor::attachment("t", 1, 1, TextureFormat::Rgba8Unorm),
        )
        .unwrap();
    let missing = scene.create_parameter(Parameter::new(BaseType::F32, ComponentType::Scalar));
    scene.materials[material].add_texture("s_missing", texture);
    scene.materials[material].add_parameter("u_missing", missing);
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Draw(drawable)]);

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(stats.draw_calls, 1);
    let misses = device
        .journal()
        .iter()
        .filter(|call| matches!(call, DeviceCall::SetUniform { found: false, .. }))
        .count();
    assert_eq!(misses, 2);
}

#[test]
#[should_panic(expected = "unsupported parameter type")]
fn test_integer_matrix_parameter_panics() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    let pass = scene.create_pass(fb, DrawState::default());
    let (mesh, material) = cube_material(&mut scene, &mut device);
    let matrix = scene.create_parameter(Parameter::new(BaseType::I32, ComponentType::Mat4));
    scene.materials[material].add_parameter("u_tint", matrix);
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Draw(drawable)]);

    // --- 2. ACT ---
    let _ = scene.render(&mut device, size);
}

#[test]
#[should_panic(expected = "issued before any pass")]
fn test_draw_before_any_pass_panics() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let (mesh, material) = cube_material(&mut scene, &mut device);
    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);
    scene.set_commands(vec![RenderCommand::Draw(drawable)]);

    // --- 2. ACT ---
    let _ = scene.render(&mut device, size);
}

#[test]
fn test_blit_command_copies_between_passes() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let red = framebuffer(&mut scene, &mut device, size, [1.0, 0.0, 0.0, 1.0]);
    let blue = framebuffer(&mut scene, &mut device, size, [0.0, 0.0, 1.0, 1.0]);
    let first = scene.create_pass(red, DrawState::default());
    let second = scene.create_pass(blue, DrawState::default());
    scene.set_commands(vec![
        RenderCommand::Pass(first),
        RenderCommand::Pass(second),
        RenderCommand::Blit(first, second),
    ]);

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();
    let pixels = read_surface(&mut device, size);

    // --- 3. ASSERT ---
    assert_eq!(stats.blits, 2);
    assert!(pixels.iter().all(|pixel| *pixel == [1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn test_empty_command_list_touches_nothing() {
    // --- 1. ARRANGE ---
    let mut device = device(Extent2D::new(2, 2));
    let scene = Scene::new();

    // --- 2. ACT ---
    let stats = scene.render(&mut device, Extent2D::new(2, 2)).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(stats, Default::default());
    assert!(device.journal().is_empty());
}

#[test]
fn test_destroy_releases_every_device_resource() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    scene.create_pass(fb, DrawState::default());
    cube_material(&mut scene, &mut device);
    scene.create_plane_mesh(&mut device).unwrap();
    assert!(device.live_resources() > 0);

    // --- 2. ACT ---
    scene.destroy(&mut device).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(device.live_resources(), 0);
}

#[test]
fn test_pass_index_is_reused_by_multiple_commands() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(2, 2);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0; 4]);
    let pass: PassIndex = scene.create_pass(fb, DrawState::default());
    scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Pass(pass)]);

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(stats.passes, 2);
    let clears = device
        .journal()
        .iter()
        .filter(|call| matches!(call, DeviceCall::ClearColor { .. }))
        .count();
    assert_eq!(clears, 2);
}

#[test]
fn test_rendering_survives_a_zero_size_resize() {
    // --- 1. ARRANGE ---
    let size = Extent2D::new(4, 4);
    let mut device = device(size);
    let mut scene = Scene::new();
    let fb = framebuffer(&mut scene, &mut device, size, [0.0, 0.0, 1.0, 1.0]);
    let pass = scene.create_pass(fb, DrawState::default());
    scene.set_commands(vec![RenderCommand::Pass(pass)]);
    scene.resize_framebuffer(&mut device, fb, 0, 0).unwrap();

    // --- 2. ACT ---
    let stats = scene.render(&mut device, size).unwrap();
    let pixels = read_surface(&mut device, size);

    // --- 3. ASSERT ---
    assert_eq!(stats.blits, 1);
    assert!(pixels.iter().all(|p| *p == [0.0, 0.0, 1.0, 1.0]));
}
