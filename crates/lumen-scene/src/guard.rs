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

//! Scoped bind/unbind pairing.
//!
//! A [`BindGuard`] binds a resource when it is created and unbinds it when it is
//! dropped. Guards borrow the device mutably and dereference to it, so nested guards
//! are built from the outer one (`BindGuard::new(&mut *outer, ...)`) and release in
//! reverse order of acquisition.

use lumen_core::renderer::{
    FramebufferTarget, GraphicsDevice, IndexSourceId, ProgramId, RenderTarget, TextureId,
    VertexSourceId,
};
use std::ops::{Deref, DerefMut};

/// Something that can be bound to and unbound from a device.
pub trait Bindable {
    /// Binds the resource.
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D);

    /// Releases the binding made by [`bind`](Bindable::bind).
    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D);
}

impl Bindable for VertexSourceId {
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_vertex_source(*self);
    }

    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.unbind_vertex_source();
    }
}

impl Bindable for IndexSourceId {
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_index_source(*self);
    }

    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.unbind_index_source();
    }
}

impl Bindable for ProgramId {
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.bind_program(*self);
    }

    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.unbind_program();
    }
}

impl<B: Bindable> Bindable for Option<B> {
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        if let Some(inner) = self {
            inner.bind(device);
        }
    }

    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        if let Some(inner) = self {
            inner.unbind(device);
        }
    }
}

/// Textures bound to consecutive texture units.
///
/// Unlike the other bindables, the units are released in the order they were bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureUnits(pub Vec<(u32, TextureId)>);

impl Bindable for TextureUnits {
    fn bind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        for &(unit, texture) in &self.0 {
            device.bind_texture(unit, texture);
        }
    }

    fn unbind<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        for &(unit, _) in &self.0 {
            device.unbind_texture(unit);
        }
    }
}

/// Keeps a resource bound for as long as the guard lives.
pub struct BindGuard<'d, D: GraphicsDevice + ?Sized, B: Bindable> {
    device: &'d mut D,
    resource: B,
}

impl<'d, D: GraphicsDevice + ?Sized, B: Bindable> BindGuard<'d, D, B> {
    /// Binds `resource` and returns the guard releasing it.
    pub fn new(device: &'d mut D, resource: B) -> Self {
        resource.bind(device);
        Self { device, resource }
    }

    /// The guarded resource.
    pub fn resource(&self) -> &B {
        &self.resource
    }
}

impl<D: GraphicsDevice + ?Sized, B: Bindable> Deref for BindGuard<'_, D, B> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized, B: Bindable> DerefMut for BindGuard<'_, D, B> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized, B: Bindable> Drop for BindGuard<'_, D, B> {
    fn drop(&mut self) {
        self.resource.unbind(self.device);
    }
}

/// Remembers the draw and read targets and rebinds them when dropped.
pub struct TargetRestore<'d, D: GraphicsDevice + ?Sized> {
    device: &'d mut D,
    draw: RenderTarget,
    read: RenderTarget,
}

impl<'d, D: GraphicsDevice + ?Sized> TargetRestore<'d, D> {
    /// Captures the currently bound targets.
    pub fn new(device: &'d mut D) -> Self {
        let draw = device.bound_framebuffer(FramebufferTarget::Draw);
        let read = device.bound_framebuffer(FramebufferTarget::Read);
        Self { device, draw, read }
    }
}

impl<D: GraphicsDevice + ?Sized> Deref for TargetRestore<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized> DerefMut for TargetRestore<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for TargetRestore<'_, D> {
    fn drop(&mut self) {
        self.device
            .bind_framebuffer(FramebufferTarget::Read, self.read);
        self.device
            .bind_framebuffer(FramebufferTarget::Draw, self.draw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Extent2D;
    use lumen_core::renderer::FramebufferObjectId;
    use lumen_infra::{DeviceCall, SoftwareDevice};

    #[test]
    fn nested_guards_release_in_reverse_order() {
        // --- 1. ARRANGE ---
        let mut device = SoftwareDevice::new(Extent2D::new(1, 1));

        // --- 2. ACT ---
        {
            let mut vertices = BindGuard::new(&mut device, VertexSourceId(1));
            let mut indices = BindGuard::new(&mut *vertices, Some(IndexSourceId(2)));
            let _program = BindGuard::new(&mut *indices, ProgramId(3));
        }

        // --- 3. ASSERT ---
        assert_eq!(
            device.journal(),
            &[
                DeviceCall::BindVertexSource(VertexSourceId(1)),
                DeviceCall::BindIndexSource(IndexSourceId(2)),
                DeviceCall::BindProgram(ProgramId(3)),
                DeviceCall::UnbindProgram,
                DeviceCall::UnbindIndexSource,
                DeviceCall::UnbindVertexSource,
            ]
        );
    }

    #[test]
    fn texture_units_release_in_binding_order() {
        let mut device = SoftwareDevice::new(Extent2D::new(1, 1));

        drop(BindGuard::new(
            &mut device,
            TextureUnits(vec![(0, TextureId(4)), (1, TextureId(5))]),
        ));

        let unbinds: Vec<_> = device
            .journal()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::UnbindTexture { unit } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(unbinds, vec![0, 1]);
    }

    #[test]
    fn target_restore_rebinds_previous_targets() {
        let mut device = SoftwareDevice::new(Extent2D::new(1, 1));
        let fbo = RenderTarget::Framebuffer(FramebufferObjectId(0));

        {
            let mut restore = TargetRestore::new(&mut device);
            restore.bind_framebuffer(FramebufferTarget::Draw, fbo);
            assert_eq!(restore.bound_framebuffer(FramebufferTarget::Draw), fbo);
        }

        assert_eq!(
            device.bound_framebuffer(FramebufferTarget::Draw),
            RenderTarget::Surface
        );
    }
}
