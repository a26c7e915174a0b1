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

//! Renders a spinning cube into an offscreen framebuffer, blits it to a headless
//! surface and logs what came back.
//!
//! Usage: `headless [frame.ron]`. Without an argument a single pass over an
//! 800x600 framebuffer is used; otherwise the RON frame description replaces it.
//! Falls back to the software device when no GPU adapter is available.

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::{
    DrawState, FramebufferTarget, GraphicsDevice, PrimitiveTopology, ProgramDescriptor,
    RenderSettings, RenderTarget, UniformType,
};
use lumen_infra::{SoftwareDevice, WgpuDevice};
use lumen_scene::camera::{GlobalParameters, ObjectParameters};
use lumen_scene::{
    AttachmentSlot, AttachmentType, BaseType, Camera, ComponentType, FrameBindings,
    FrameDescription, FrameInput, MaterialState, Node, NodeIndex, Parameter, RenderCommand, Scene,
};

const SHADER: &str = include_str!("cube.wgsl");
const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];
const FRAMES: u32 = 3;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let description = match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read frame description '{path}'"))?;
            Some(FrameDescription::from_ron(&source)?)
        }
        None => None,
    };

    let settings = RenderSettings {
        surface_size: Extent2D::new(800, 600),
        ..Default::default()
    };
    match WgpuDevice::headless(&settings) {
        Ok(mut device) => run(&mut device, &settings, description.as_ref()),
        Err(err) => {
            log::warn!("Headless: no GPU available ({err}), using the software device");
            let mut device = SoftwareDevice::from_settings(&settings);
            run(&mut device, &settings, description.as_ref())
        }
    }
}

fn run(
    device: &mut dyn GraphicsDevice,
    settings: &RenderSettings,
    description: Option<&FrameDescription>,
) -> Result<()> {
    let surface = settings.surface_size;
    let (mut scene, bindings, node) = build_scene(device, surface, description)?;

    let mut input = FrameInput {
        camera: Camera {
            position: Vec3::new(1.5, 1.5, 2.5),
            direction: Vec3::new(-1.5, -1.5, -2.5).normalize(),
            ..Default::default()
        },
        viewport: surface,
        anim_key: 0.0,
    };

    for frame in 0..FRAMES {
        input.anim_key = frame as f32 / FRAMES as f32;
        scene.nodes.get_mut(node).rotation =
            Quat::from_rotation_y(input.anim_key * std::f32::consts::TAU);
        input.refresh(&mut scene, &bindings);

        let stats = scene.render(device, surface)?;
        device.present()?;
        log::info!("Headless: frame {frame}: {stats:?}");
    }

    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    let pixels = device.read_pixels(Rect2D::from_extent(surface))?;
    let pixel = |x: u32, y: u32| pixels[(y * surface.width + x) as usize];
    log::info!("Headless: corner pixel {:?}", pixel(0, 0));
    log::info!(
        "Headless: center pixel {:?}",
        pixel(surface.width / 2, surface.height / 2)
    );

    scene.destroy(device)?;
    Ok(())
}

fn build_scene(
    device: &mut dyn GraphicsDevice,
    surface: Extent2D,
    description: Option<&FrameDescription>,
) -> Result<(Scene, FrameBindings, NodeIndex)> {
    let mut scene = Scene::new();

    let program = ProgramDescriptor::new("cube", SHADER)
        .with_uniform("u_MVP", UniformType::Mat4)
        .with_uniform("u_MODEL", UniformType::Mat4);
    let program = scene.create_program(device, &program)?;
    let mesh = scene.create_cube_mesh(device)?;
    let material = scene.create_material(program);
    scene.materials[material].state = MaterialState::OPAQUE;

    let node = scene.nodes.add(
        None,
        Node {
            name: Some("cube".to_string()),
            meshes: vec![mesh],
            ..Default::default()
        },
    );

    let globals = GlobalParameters::create(&mut scene);
    let object = ObjectParameters {
        node: Some(node),
        mvp: scene.create_parameter(Parameter::new(BaseType::F32, ComponentType::Mat4)),
        model: scene.create_parameter(Parameter::new(BaseType::F32, ComponentType::Mat4)),
        anim_key: scene.create_parameter(Parameter::new(BaseType::F32, ComponentType::Scalar)),
    };
    let bound = &mut scene.materials[material];
    bound.add_parameter("u_MVP", object.mvp);
    bound.add_parameter("u_MODEL", object.model);
    // Not declared by the shader; the draw skips them.
    bound.add_parameter("u_ANIM_KEY", object.anim_key);
    bound.add_parameter("u_PROJECTION", globals.projection);

    let drawable = scene.create_drawable(mesh, material, PrimitiveTopology::TriangleList);

    match description {
        Some(description) => {
            scene.apply_frame_description(device, description)?;
        }
        None => {
            let framebuffer = scene.create_framebuffer(device, surface.width, surface.height)?;
            let color = scene.add_attachment(
                device,
                framebuffer,
                AttachmentSlot::Color0,
                AttachmentType::Color8,
            )?;
            scene.attachments[color].clear_values = CLEAR_COLOR;
            scene.add_attachment(
                device,
                framebuffer,
                AttachmentSlot::Depth,
                AttachmentType::Depth24F,
            )?;
            let pass = scene.create_pass(framebuffer, DrawState::default());
            scene.set_commands(vec![RenderCommand::Pass(pass), RenderCommand::Draw(drawable)]);
        }
    }

    let bindings = FrameBindings {
        globals,
        objects: vec![object],
    };
    Ok((scene, bindings, node))
}
