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

//! Framebuffers: up to four color attachments and one depth attachment forming a
//! single render target.

use crate::attachment::{Attachment, AttachmentBehavior, AttachmentType};
use crate::error::Result;
use crate::guard::TargetRestore;
use crate::index::{AttachmentIndex, FboIndex, FramebufferIndex};
use crate::scene::Scene;
use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::{
    AttachmentPoint, FilterMode, FramebufferTarget, GraphicsDevice, RenderTarget,
};
use serde::{Deserialize, Serialize};

/// The number of attachment slots of a framebuffer.
pub const SLOT_COUNT: usize = 5;

/// An attachment slot of a [`Framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentSlot {
    /// Color attachment 0.
    Color0,
    /// Color attachment 1.
    Color1,
    /// Color attachment 2.
    Color2,
    /// Color attachment 3.
    Color3,
    /// The depth attachment.
    Depth,
}

impl AttachmentSlot {
    /// Every slot, in slot order.
    pub const ALL: [AttachmentSlot; SLOT_COUNT] = [
        AttachmentSlot::Color0,
        AttachmentSlot::Color1,
        AttachmentSlot::Color2,
        AttachmentSlot::Color3,
        AttachmentSlot::Depth,
    ];

    /// The position of the slot in [`Framebuffer::slots`].
    pub fn index(self) -> usize {
        match self {
            AttachmentSlot::Color0 => 0,
            AttachmentSlot::Color1 => 1,
            AttachmentSlot::Color2 => 2,
            AttachmentSlot::Color3 => 3,
            AttachmentSlot::Depth => 4,
        }
    }

    /// Returns `true` for the four color slots.
    pub fn is_color(self) -> bool {
        !matches!(self, AttachmentSlot::Depth)
    }

    /// The device attachment point the slot maps to.
    pub fn attachment_point(self) -> AttachmentPoint {
        match self {
            AttachmentSlot::Depth => AttachmentPoint::Depth,
            color => AttachmentPoint::Color(color.index() as u8),
        }
    }
}

/// Which framebuffer binding points [`Scene::bind_framebuffer`] binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindTarget {
    /// The target draws and clears write to.
    Draw,
    /// The target blits and readbacks read from.
    Read,
    /// Both binding points.
    Both,
}

/// A render target made of attachment slots over one framebuffer object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The framebuffer object in [`Scene::framebuffer_objects`].
    pub fbo: FboIndex,
    /// Slots 0 to 3 are color attachments 0 to 3, slot 4 is depth.
    pub slots: [Option<AttachmentIndex>; SLOT_COUNT],
}

impl Framebuffer {
    /// An empty framebuffer of the given size.
    pub fn new(fbo: FboIndex, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fbo,
            slots: [None; SLOT_COUNT],
        }
    }

    /// The framebuffer size.
    pub fn size(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// The attachment in `slot`, if any.
    pub fn attachment(&self, slot: AttachmentSlot) -> Option<AttachmentIndex> {
        self.slots[slot.index()]
    }

    /// Iterates over the occupied slots in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (AttachmentSlot, AttachmentIndex)> + '_ {
        AttachmentSlot::ALL
            .into_iter()
            .filter_map(|slot| self.attachment(slot).map(|attachment| (slot, attachment)))
    }

    /// The draw buffer list: the occupied color slots, in slot order.
    pub fn draw_buffers(&self) -> Vec<AttachmentPoint> {
        self.occupied()
            .filter(|(slot, _)| slot.is_color())
            .map(|(slot, _)| slot.attachment_point())
            .collect()
    }

    /// The index of a color slot inside the draw buffer list.
    pub fn draw_buffer_index(&self, slot: AttachmentSlot) -> Option<u32> {
        let point = slot.attachment_point();
        self.draw_buffers()
            .iter()
            .position(|p| *p == point)
            .map(|i| i as u32)
    }
}

impl Scene {
    /// Creates an empty framebuffer and its framebuffer object.
    pub fn create_framebuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<FramebufferIndex> {
        let label = format!("framebuffer{}", self.framebuffers.len());
        let fbo = device.create_framebuffer_object(Some(&label))?;
        let fbo = self.framebuffer_objects.push(fbo);
        let (width, height) = (width.max(1), height.max(1));
        let index = self.framebuffers.push(Framebuffer::new(fbo, width, height));
        log::debug!("Scene: created {index} ({width}x{height})");
        Ok(index)
    }

    /// Creates an attachment of type `ty` and attaches it to `slot`.
    ///
    /// # Panics
    /// See [`Scene::attach`].
    pub fn add_attachment(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        slot: AttachmentSlot,
        ty: AttachmentType,
    ) -> Result<AttachmentIndex> {
        let attachment = self.create_attachment(device, ty)?;
        self.attach(device, framebuffer, slot, attachment)?;
        Ok(attachment)
    }

    /// Attaches an existing attachment to `slot`.
    ///
    /// The attachment is resized to the framebuffer, recorded in the slot and attached
    /// to the framebuffer object; a color slot also refreshes the draw buffer list.
    /// The previously bound draw target is restored afterwards.
    ///
    /// # Panics
    /// If the slot is occupied, if the attachment type does not fit the slot
    /// (`Depth24F` only in the depth slot, never in a color slot), or if the
    /// attachment already occupies a framebuffer slot.
    pub fn attach(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        slot: AttachmentSlot,
        attachment: AttachmentIndex,
    ) -> Result<()> {
        let target = &self.framebuffers[framebuffer];
        assert!(
            target.attachment(slot).is_none(),
            "{framebuffer} slot {slot:?} is already occupied"
        );
        let ty = self.attachments[attachment].ty;
        if slot.is_color() {
            assert!(
                !ty.is_depth(),
                "color slot {slot:?} cannot hold a {ty:?} attachment"
            );
        } else {
            assert!(
                ty.is_depth(),
                "the depth slot only holds Depth24F attachments, got {ty:?}"
            );
        }
        assert!(
            !self
                .framebuffers
                .values()
                .any(|fb| fb.slots.contains(&Some(attachment))),
            "{attachment} already occupies a framebuffer slot"
        );

        let mut updated = target.clone();
        updated.slots[slot.index()] = Some(attachment);
        self.resize_attachment(device, attachment, updated.width, updated.height)?;

        // The slot is only recorded once the framebuffer object accepted it.
        let fbo = self.framebuffer_objects[updated.fbo];
        let texture = self.textures[self.attachments[attachment].texture].id();
        let mut device = TargetRestore::new(device);
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
        device.attach_texture(slot.attachment_point(), texture)?;
        if slot.is_color() {
            if let Err(err) = device.set_draw_buffers(&updated.draw_buffers()) {
                let _ = device.detach(slot.attachment_point());
                return Err(err.into());
            }
        }
        self.framebuffers[framebuffer] = updated;
        log::debug!("Scene: attached {attachment} to {framebuffer} {slot:?}");
        Ok(())
    }

    /// Detaches the attachment in `slot` and empties the slot. The attachment stays
    /// in the registry. Returns the removed attachment, or `None` for an empty slot.
    pub fn remove_attachment(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        slot: AttachmentSlot,
    ) -> Result<Option<AttachmentIndex>> {
        let mut updated = self.framebuffers[framebuffer].clone();
        let Some(attachment) = updated.slots[slot.index()].take() else {
            return Ok(None);
        };

        let fbo = self.framebuffer_objects[updated.fbo];
        let mut device = TargetRestore::new(device);
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
        device.detach(slot.attachment_point())?;
        if slot.is_color() {
            if let Err(err) = device.set_draw_buffers(&updated.draw_buffers()) {
                let texture = self.textures[self.attachments[attachment].texture].id();
                let _ = device.attach_texture(slot.attachment_point(), texture);
                return Err(err.into());
            }
        }
        self.framebuffers[framebuffer] = updated;
        log::debug!("Scene: removed {attachment} from {framebuffer} {slot:?}");
        Ok(Some(attachment))
    }

    /// Resizes a framebuffer and every attachment it holds.
    ///
    /// A request with a zero dimension (a minimized window) is ignored and the
    /// framebuffer keeps its current size.
    pub fn resize_framebuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            log::warn!(
                "Scene: ignoring resize of {framebuffer} to zero dimensions: {width}x{height}"
            );
            return Ok(());
        }

        let target = &self.framebuffers[framebuffer];
        let fbo = self.framebuffer_objects[target.fbo];
        let mut device = TargetRestore::new(device);
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(fbo));
        for (_, attachment) in target.occupied() {
            self.resize_attachment(&mut *device, attachment, width, height)?;
        }
        let target = &mut self.framebuffers[framebuffer];
        target.width = width;
        target.height = height;
        log::debug!("Scene: resized {framebuffer} to {width}x{height}");
        Ok(())
    }

    /// Binds a framebuffer, sets the viewport to its size and clears every attachment
    /// whose start behaviour is [`AttachmentBehavior::Clear`].
    ///
    /// Clears only happen when the draw binding point is bound.
    ///
    /// # Panics
    /// If the framebuffer object is not complete.
    pub fn bind_framebuffer(
        &self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        target: BindTarget,
    ) -> Result<()> {
        let fb = &self.framebuffers[framebuffer];
        let fbo = self.framebuffer_objects[fb.fbo];
        let status = device.framebuffer_status(fbo);
        assert!(
            status.is_complete(),
            "{framebuffer} is not complete: {status:?}"
        );

        let render_target = RenderTarget::Framebuffer(fbo);
        if matches!(target, BindTarget::Read | BindTarget::Both) {
            device.bind_framebuffer(FramebufferTarget::Read, render_target);
        }
        if matches!(target, BindTarget::Draw | BindTarget::Both) {
            device.bind_framebuffer(FramebufferTarget::Draw, render_target);
            device.set_viewport(Rect2D::from_extent(fb.size()));
            self.sweep(device, fb, |a| a.start)?;
        }
        Ok(())
    }

    /// Runs the end-of-pass sweep of a bound framebuffer, then binds the surface to
    /// both binding points.
    pub fn unbind_framebuffer(
        &self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
    ) -> Result<()> {
        self.sweep(device, &self.framebuffers[framebuffer], |a| a.end)?;
        device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Surface);
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Surface);
        Ok(())
    }

    /// Copies the color contents of a framebuffer onto the whole surface, scaled to
    /// `width` x `height` with linear filtering.
    pub fn blit_framebuffer_to_surface(
        &self,
        device: &mut dyn GraphicsDevice,
        framebuffer: FramebufferIndex,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let src = &self.framebuffers[framebuffer];
        let fbo = self.framebuffer_objects[src.fbo];
        let mut device = TargetRestore::new(device);
        device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Framebuffer(fbo));
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Surface);
        device.blit_framebuffer(
            Rect2D::from_extent(src.size()),
            Rect2D::from_extent(Extent2D::new(width, height)),
            FilterMode::Linear,
        )?;
        Ok(())
    }

    /// Copies the color contents of `src` into every draw buffer of `dst`, scaled
    /// with linear filtering.
    pub fn blit_framebuffer(
        &self,
        device: &mut dyn GraphicsDevice,
        src: FramebufferIndex,
        dst: FramebufferIndex,
    ) -> Result<()> {
        let (src, dst) = (&self.framebuffers[src], &self.framebuffers[dst]);
        let src_fbo = self.framebuffer_objects[src.fbo];
        let dst_fbo = self.framebuffer_objects[dst.fbo];
        let mut device = TargetRestore::new(device);
        device.bind_framebuffer(FramebufferTarget::Read, RenderTarget::Framebuffer(src_fbo));
        device.bind_framebuffer(FramebufferTarget::Draw, RenderTarget::Framebuffer(dst_fbo));
        device.blit_framebuffer(
            Rect2D::from_extent(src.size()),
            Rect2D::from_extent(dst.size()),
            FilterMode::Linear,
        )?;
        Ok(())
    }

    /// Clears the attachments selected by `behavior` into the bound draw target.
    fn sweep(
        &self,
        device: &mut dyn GraphicsDevice,
        framebuffer: &Framebuffer,
        behavior: impl Fn(&Attachment) -> AttachmentBehavior,
    ) -> Result<()> {
        for (slot, index) in framebuffer.occupied() {
            let attachment = &self.attachments[index];
            if behavior(attachment) != AttachmentBehavior::Clear {
                continue;
            }
            if slot.is_color() {
                // Occupied color slots always have a draw buffer.
                if let Some(draw_buffer) = framebuffer.draw_buffer_index(slot) {
                    device.clear_color(draw_buffer, attachment.clear_values)?;
                }
            } else {
                device.clear_depth(attachment.clear_values[0])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_buffers_skip_empty_color_slots() {
        let mut framebuffer = Framebuffer::new(FboIndex(0), 4, 4);
        framebuffer.slots[AttachmentSlot::Color0.index()] = Some(AttachmentIndex(0));
        framebuffer.slots[AttachmentSlot::Color2.index()] = Some(AttachmentIndex(1));
        framebuffer.slots[AttachmentSlot::Depth.index()] = Some(AttachmentIndex(2));

        assert_eq!(
            framebuffer.draw_buffers(),
            vec![AttachmentPoint::Color(0), AttachmentPoint::Color(2)]
        );
        assert_eq!(framebuffer.draw_buffer_index(AttachmentSlot::Color2), Some(1));
        assert_eq!(framebuffer.draw_buffer_index(AttachmentSlot::Color1), None);
    }

    #[test]
    fn slots_map_to_attachment_points() {
        assert_eq!(
            AttachmentSlot::Color3.attachment_point(),
            AttachmentPoint::Color(3)
        );
        assert_eq!(AttachmentSlot::Depth.attachment_point(), AttachmentPoint::Depth);
        assert!(!AttachmentSlot::Depth.is_color());
    }
}
