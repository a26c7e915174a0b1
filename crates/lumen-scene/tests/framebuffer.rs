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

use lumen_core::math::{Extent2D, Extent3D};
use lumen_core::renderer::{
    AttachmentPoint, FramebufferTarget, GraphicsDevice, RenderTarget,
};
use lumen_infra::{DeviceCall, SoftwareDevice};
use lumen_scene::{AttachmentSlot, AttachmentType, BindTarget, Scene};

fn device() -> SoftwareDevice {
    SoftwareDevice::new(Extent2D::new(8, 8))
}

#[test]
#[should_panic(expected = "the depth slot only holds Depth24F")]
fn test_depth_slot_rejects_color_attachment() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();

    // --- 2. ACT ---
    let _ = scene.add_attachment(&mut device, fb, AttachmentSlot::Depth, AttachmentType::Color8);
}

#[test]
#[should_panic(expected = "cannot hold a Depth24F attachment")]
fn test_color_slot_rejects_depth_attachment() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();

    // --- 2. ACT ---
    let _ = scene.add_attachment(&mut device, fb, AttachmentSlot::Color1, AttachmentType::Depth24F);
}

#[test]
#[should_panic(expected = "is already occupied")]
fn test_occupied_slot_panics() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();

    // --- 2. ACT ---
    let _ = scene.add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color16F);
}

#[test]
#[should_panic(expected = "already occupies a framebuffer slot")]
fn test_attachment_cannot_be_shared_between_framebuffers() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let first = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let second = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let shared = scene
        .add_attachment(&mut device, first, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();

    // --- 2. ACT ---
    let _ = scene.attach(&mut device, second, AttachmentSlot::Color0, shared);
}

#[test]
fn test_resize_is_idempotent() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let color = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    let depth = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Depth, AttachmentType::Depth24F)
        .unwrap();
    let color_id = scene.textures[scene.attachments[color].texture].id();
    let depth_id = scene.textures[scene.attachments[depth].texture].id();

    // --- 2. ACT ---
    scene.resize_framebuffer(&mut device, fb, 32, 16).unwrap();
    let once = (device.texture_size(color_id), device.texture_size(depth_id));
    scene.resize_framebuffer(&mut device, fb, 32, 16).unwrap();
    let twice = (device.texture_size(color_id), device.texture_size(depth_id));

    // --- 3. ASSERT ---
    assert_eq!(once, twice);
    assert_eq!(once.0, Some(Extent3D::from_2d(Extent2D::new(32, 16))));
    assert_eq!(scene.framebuffers[fb].size(), Extent2D::new(32, 16));
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];
    assert!(device.framebuffer_status(fbo).is_complete());
}

#[test]
fn test_attachments_follow_the_framebuffer_size() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 20, 10).unwrap();

    // --- 2. ACT ---
    let color = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color16F)
        .unwrap();

    // --- 3. ASSERT ---
    let id = scene.textures[scene.attachments[color].texture].id();
    assert_eq!(device.texture_size(id), Some(Extent3D::from_2d(Extent2D::new(20, 10))));
}

#[test]
fn test_draw_buffers_track_occupied_color_slots() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];

    // --- 2. ACT ---
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color2, AttachmentType::Color8)
        .unwrap();
    let both = device.draw_buffers(fbo);
    let removed = scene
        .remove_attachment(&mut device, fb, AttachmentSlot::Color0)
        .unwrap();
    let remaining = device.draw_buffers(fbo);

    // --- 3. ASSERT ---
    assert_eq!(both, vec![AttachmentPoint::Color(0), AttachmentPoint::Color(2)]);
    assert!(removed.is_some());
    assert_eq!(remaining, vec![AttachmentPoint::Color(2)]);
    assert_eq!(
        scene.framebuffers[fb].draw_buffer_index(AttachmentSlot::Color2),
        Some(0)
    );
    let last = device
        .journal()
        .iter()
        .rev()
        .find(|call| matches!(call, DeviceCall::DrawBuffers(_)));
    assert_eq!(last, Some(&DeviceCall::DrawBuffers(vec![AttachmentPoint::Color(2)])));
}

#[test]
fn test_removing_an_empty_slot_is_a_no_op() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    device.take_journal();

    // --- 2. ACT ---
    let removed = scene
        .remove_attachment(&mut device, fb, AttachmentSlot::Color3)
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(removed, None);
    assert!(device.journal().is_empty());
}

#[test]
fn test_attach_restores_the_previous_draw_target() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();

    // --- 2. ACT ---
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(
        device.bound_framebuffer(FramebufferTarget::Draw),
        RenderTarget::Surface
    );
    assert_eq!(
        device.bound_framebuffer(FramebufferTarget::Read),
        RenderTarget::Surface
    );
}

#[test]
fn test_bind_clears_only_attachments_marked_clear() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let cleared = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    let kept = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color1, AttachmentType::Color8)
        .unwrap();
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Depth, AttachmentType::Depth24F)
        .unwrap();
    scene.attachments[cleared].clear_values = [0.5, 0.0, 0.0, 1.0];
    scene.attachments[kept].start = lumen_scene::AttachmentBehavior::Preserve;
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];
    device.take_journal();

    // --- 2. ACT ---
    scene.bind_framebuffer(&mut device, fb, BindTarget::Both).unwrap();

    // --- 3. ASSERT ---
    let target = RenderTarget::Framebuffer(fbo);
    let clears: Vec<_> = device
        .journal()
        .iter()
        .filter(|call| {
            matches!(
                call,
                DeviceCall::ClearColor { .. } | DeviceCall::ClearDepth { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        clears,
        vec![
            DeviceCall::ClearColor {
                target,
                draw_buffer: 0,
                color: [0.5, 0.0, 0.0, 1.0],
            },
            DeviceCall::ClearDepth { target, depth: 1.0 },
        ]
    );
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Read), target);
}

#[test]
fn test_read_only_bind_does_not_clear() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    device.take_journal();

    // --- 2. ACT ---
    scene.bind_framebuffer(&mut device, fb, BindTarget::Read).unwrap();

    // --- 3. ASSERT ---
    assert!(!device
        .journal()
        .iter()
        .any(|call| matches!(call, DeviceCall::ClearColor { .. } | DeviceCall::Viewport(_))));
    assert_eq!(
        device.bound_framebuffer(FramebufferTarget::Draw),
        RenderTarget::Surface
    );
}

#[test]
#[should_panic(expected = "is not complete")]
fn test_binding_an_empty_framebuffer_panics() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();

    // --- 2. ACT ---
    let _ = scene.bind_framebuffer(&mut device, fb, BindTarget::Draw);
}

#[test]
fn test_unbind_sweeps_before_returning_to_the_surface() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let color = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    scene.attachments[color].end = lumen_scene::AttachmentBehavior::Clear;
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];
    scene.bind_framebuffer(&mut device, fb, BindTarget::Both).unwrap();
    device.take_journal();

    // --- 2. ACT ---
    scene.unbind_framebuffer(&mut device, fb).unwrap();

    // --- 3. ASSERT ---
    let journal = device.journal();
    assert!(matches!(
        journal[0],
        DeviceCall::ClearColor { target, .. } if target == RenderTarget::Framebuffer(fbo)
    ));
    assert_eq!(
        device.bound_framebuffer(FramebufferTarget::Draw),
        RenderTarget::Surface
    );
}

#[test]
fn test_zero_size_resize_keeps_the_current_size() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let color = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    let id = scene.textures[scene.attachments[color].texture].id();

    // --- 2. ACT ---
    scene.resize_framebuffer(&mut device, fb, 0, 0).unwrap();
    scene.resize_framebuffer(&mut device, fb, 6, 0).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(scene.framebuffers[fb].size(), Extent2D::new(4, 4));
    assert_eq!(device.texture_size(id), Some(Extent3D::from_2d(Extent2D::new(4, 4))));
}

#[test]
fn test_failed_attach_leaves_the_slot_empty() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];
    let color = scene.create_attachment(&mut device, AttachmentType::Color8).unwrap();
    device.destroy_framebuffer_object(fbo).unwrap();

    // --- 2. ACT ---
    let result = scene.attach(&mut device, fb, AttachmentSlot::Color0, color);

    // --- 3. ASSERT ---
    assert!(result.is_err());
    assert_eq!(scene.framebuffers[fb].attachment(AttachmentSlot::Color0), None);
    assert!(scene.framebuffers[fb].draw_buffers().is_empty());
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Draw), RenderTarget::Surface);
}

#[test]
fn test_failed_removal_keeps_the_attachment() {
    // --- 1. ARRANGE ---
    let mut device = device();
    let mut scene = Scene::new();
    let fb = scene.create_framebuffer(&mut device, 4, 4).unwrap();
    let color = scene
        .add_attachment(&mut device, fb, AttachmentSlot::Color0, AttachmentType::Color8)
        .unwrap();
    let fbo = scene.framebuffer_objects[scene.framebuffers[fb].fbo];
    device.destroy_framebuffer_object(fbo).unwrap();

    // --- 2. ACT ---
    let result = scene.remove_attachment(&mut device, fb, AttachmentSlot::Color0);

    // --- 3. ASSERT ---
    assert!(result.is_err());
    assert_eq!(scene.framebuffers[fb].attachment(AttachmentSlot::Color0), Some(color));
    assert_eq!(scene.framebuffers[fb].draw_buffers(), vec![AttachmentPoint::Color(0)]);
}
