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

use lumen_core::math::{Extent2D, Extent3D, Origin2D, Rect2D};
use lumen_core::renderer::{
    AttachmentPoint, DrawCall, FilterMode, FramebufferStatus, FramebufferTarget, GraphicsDevice,
    IndexFormat, IndexSourceDescriptor, PipelineError, PrimitiveTopology, ProgramDescriptor,
    RenderError, RenderTarget, ResourceError, ShaderError, TextureDescriptor, TextureFormat,
    UniformType, UniformValue, VertexBufferData, VertexBufferLayoutDescriptor, VertexFormat,
    VertexSourceDescriptor,
};
use lumen_infra::{DeviceCall, SoftwareDevice};
use std::borrow::Cow;

const SHADER: &str = "fn vs_main() {} fn fs_main() {}";

fn color_fbo(
    device: &mut SoftwareDevice,
    width: u32,
    height: u32,
) -> lumen_core::renderer::FramebufferObjectId {
    let fbo = device.create_framebuffer_object(Some("test")).unwrap();
    let descriptor =
        TextureDescriptor::attachment("color", width, height, TextureFormat::Rgba8Unorm);
    let color = device.create_texture(&descriptor).unwrap();
    device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
    device.attach_texture(AttachmentPoint::Color(0), color).unwrap();
    device.set_draw_buffers(&[AttachmentPoint::Color(0)]).unwrap();
    fbo
}

#[test]
fn test_clear_then_blit_fills_the_surface() {
    // --- 1. ARRANGE ---
    let mut device = SoftwareDevice::new(Extent2D::new(4, 4));
    let fbo = color_fbo(&mut device, 2, 2);

    // --- 2. ACT ---
    device.clear_color(0, [0.0, 1.0, 0.0, 1.0]).unwrap();
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Framebuffer(fbo));
    device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Surface);
    device
        .blit_framebuffer(
            Rect2D::from_extent(Extent2D::new(2, 2)),
            Rect2D::from_extent(Extent2D::new(4, 4)),
            FilterMode::Linear,
        )
        .unwrap();
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    let pixels = device
        .read_pixels(Rect2D::from_extent(Extent2D::new(4, 4)))
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(pixels.len(), 16);
    assert!(pixels.iter().all(|p| *p == [0.0, 1.0, 0.0, 1.0]));
}

#[test]
fn test_framebuffer_status_reports_mismatched_sizes() {
    let mut device = SoftwareDevice::new(Extent2D::new(4, 4));
    let fbo = device.create_framebuffer_object(None).unwrap();
    assert_eq!(device.framebuffer_status(fbo), FramebufferStatus::MissingAttachment);

    let color = device
        .create_texture(&TextureDescriptor::attachment("c", 8, 8, TextureFormat::Rgba8Unorm))
        .unwrap();
    let depth = device
        .create_texture(&TextureDescriptor::attachment("d", 4, 4, TextureFormat::Depth32Float))
        .unwrap();
    device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
    device.attach_texture(AttachmentPoint::Color(0), color).unwrap();
    assert!(device.framebuffer_status(fbo).is_complete());

    device.attach_texture(AttachmentPoint::Depth, depth).unwrap();
    assert_eq!(device.framebuffer_status(fbo), FramebufferStatus::MismatchedDimensions);

    device
        .reallocate_texture(depth, Extent3D::from_2d(Extent2D::new(8, 8)))
        .unwrap();
    assert!(device.framebuffer_status(fbo).is_complete());

    // A depth texture on a color point is incomplete.
    device.attach_texture(AttachmentPoint::Color(1), depth).unwrap();
    assert_eq!(
        device.framebuffer_status(fbo),
        FramebufferStatus::IncompleteAttachment(AttachmentPoint::Color(1))
    );
}

#[test]
fn test_attach_without_bound_framebuffer_is_rejected() {
    let mut device = SoftwareDevice::new(Extent2D::new(1, 1));
    let color = device
        .create_texture(&TextureDescriptor::attachment("c", 1, 1, TextureFormat::Rgba8Unorm))
        .unwrap();
    assert!(matches!(
        device.attach_texture(AttachmentPoint::Color(0), color),
        Err(ResourceError::InvalidHandle)
    ));
}

#[test]
fn test_draw_requires_program_and_geometry() {
    // --- 1. ARRANGE ---
    let mut device = SoftwareDevice::new(Extent2D::new(2, 2));
    let positions = [0.0f32; 9];
    let vertices = device
        .create_vertex_source(&VertexSourceDescriptor {
            label: Some("triangle".into()),
            buffers: vec![VertexBufferData {
                data: Cow::Borrowed(bytemuck::cast_slice(&positions)),
                layout: VertexBufferLayoutDescriptor::single(0, VertexFormat::Float32x3),
            }],
        })
        .unwrap();
    let indices = device
        .create_index_source(&IndexSourceDescriptor {
            label: None,
            data: Cow::Owned(vec![0, 1, 2]),
            format: IndexFormat::Uint8,
        })
        .unwrap();
    let program = device
        .create_program(&ProgramDescriptor::new("flat", SHADER))
        .unwrap();
    let call = DrawCall::Arrays { first: 0, count: 3 };

    // --- 2. ACT / 3. ASSERT ---
    assert!(matches!(
        device.draw(PrimitiveTopology::TriangleList, call),
        Err(RenderError::ResourceError(ResourceError::Pipeline(PipelineError::MissingProgram)))
    ));
    device.bind_program(program);
    assert!(matches!(
        device.draw(PrimitiveTopology::TriangleList, call),
        Err(RenderError::ResourceError(ResourceError::Pipeline(PipelineError::MissingVertexSource)))
    ));
    device.bind_vertex_source(vertices);
    device.draw(PrimitiveTopology::TriangleList, call).unwrap();
    assert!(device
        .draw(PrimitiveTopology::TriangleList, DrawCall::Arrays { first: 1, count: 3 })
        .is_err());

    let indexed = DrawCall::Indexed { format: IndexFormat::Uint8, count: 3 };
    assert!(device.draw(PrimitiveTopology::TriangleList, indexed).is_err());
    device.bind_index_source(indices);
    device.draw(PrimitiveTopology::TriangleList, indexed).unwrap();

    let draws = device
        .journal()
        .iter()
        .filter(|call| matches!(call, DeviceCall::Draw { .. }))
        .count();
    assert_eq!(draws, 2);
}

#[test]
fn test_program_creation_checks_entry_points() {
    let mut device = SoftwareDevice::new(Extent2D::new(1, 1));
    let err = device
        .create_program(&ProgramDescriptor::new("broken", "fn vs_main() {}"))
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Shader(ShaderError::InvalidEntryPoint { ref entry_point, .. })
            if entry_point == "fs_main"
    ));
}

#[test]
fn test_set_uniform_reports_unknown_names() {
    let mut device = SoftwareDevice::new(Extent2D::new(1, 1));
    let descriptor = ProgramDescriptor::new("p", SHADER).with_uniform("u_time", UniformType::Float);
    let program = device.create_program(&descriptor).unwrap();

    assert!(!device.set_uniform("u_time", UniformValue::Float(1.0)), "no program bound");
    device.bind_program(program);
    assert!(device.set_uniform("u_time", UniformValue::Float(2.0)));
    assert!(!device.set_uniform("u_missing", UniformValue::Float(2.0)));
    assert!(!device.set_uniform("u_time", UniformValue::Int(2)), "type mismatch");
    assert_eq!(device.uniform_value(program, "u_time"), Some(UniformValue::Float(2.0)));
}

#[test]
fn test_read_pixels_rejects_out_of_bounds() {
    let mut device = SoftwareDevice::new(Extent2D::new(2, 2));
    let rect = Rect2D {
        origin: Origin2D { x: 1, y: 1 },
        extent: Extent2D::new(2, 2),
    };
    assert!(device.read_pixels(rect).is_err());
}

#[test]
fn test_nearest_blit_preserves_hard_edges() {
    // --- 1. ARRANGE ---
    let mut device = SoftwareDevice::new(Extent2D::new(4, 1));
    let fbo = device.create_framebuffer_object(None).unwrap();
    let color = device
        .create_texture(&TextureDescriptor::attachment("c", 2, 1, TextureFormat::Rgba8Unorm))
        .unwrap();
    device
        .write_texture(color, 0, &[255, 0, 0, 255, 0, 0, 255, 255])
        .unwrap();
    device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
    device.attach_texture(AttachmentPoint::Color(0), color).unwrap();

    // --- 2. ACT ---
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Framebuffer(fbo));
    device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Surface);
    device
        .blit_framebuffer(
            Rect2D::from_extent(Extent2D::new(2, 1)),
            Rect2D::from_extent(Extent2D::new(4, 1)),
            FilterMode::Nearest,
        )
        .unwrap();
    device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
    let pixels = device
        .read_pixels(Rect2D::from_extent(Extent2D::new(4, 1)))
        .unwrap();

    // --- 3. ASSERT ---
    let red = [1.0, 0.0, 0.0, 1.0];
    let blue = [0.0, 0.0, 1.0, 1.0];
    assert_eq!(pixels, vec![red, red, blue, blue]);
}
