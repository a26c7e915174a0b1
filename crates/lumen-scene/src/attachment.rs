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

//! Render-target images: their pixel type, load/store behaviour and backing texture.

use crate::error::Result;
use crate::index::{AttachmentIndex, TextureIndex};
use crate::scene::Scene;
use crate::texture::Texture;
use lumen_core::math::Extent3D;
use lumen_core::renderer::{GraphicsDevice, TextureDescriptor, TextureFormat};
use serde::{Deserialize, Serialize};

/// The pixel format of a render-target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentType {
    /// 8-bit normalized RGBA.
    Color8,
    /// 16-bit float RGBA.
    Color16F,
    /// Floating-point depth.
    Depth24F,
}

impl AttachmentType {
    /// The device format backing this attachment type. Depth uses a 32-bit float
    /// format, the narrowest floating-point depth format every backend offers.
    pub fn format(self) -> TextureFormat {
        match self {
            AttachmentType::Color8 => TextureFormat::Rgba8Unorm,
            AttachmentType::Color16F => TextureFormat::Rgba16Float,
            AttachmentType::Depth24F => TextureFormat::Depth32Float,
        }
    }

    /// Returns `true` for the depth type.
    pub fn is_depth(self) -> bool {
        matches!(self, AttachmentType::Depth24F)
    }
}

/// What happens to an attachment's contents at the start or end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentBehavior {
    /// The attachment is cleared to its clear values.
    Clear,
    /// The contents are kept.
    Preserve,
}

/// One render-target image and its load/store behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// The pixel format.
    pub ty: AttachmentType,
    /// The registry texture holding the image.
    pub texture: TextureIndex,
    /// Behaviour when a pass using the attachment begins.
    pub start: AttachmentBehavior,
    /// Behaviour when a pass using the attachment ends.
    pub end: AttachmentBehavior,
    /// RGBA clear color, or the clear depth in the first component.
    pub clear_values: [f32; 4],
}

impl Attachment {
    /// An attachment cleared to white at pass start and preserved at pass end.
    pub fn new(ty: AttachmentType, texture: TextureIndex) -> Self {
        Self {
            ty,
            texture,
            start: AttachmentBehavior::Clear,
            end: AttachmentBehavior::Preserve,
            clear_values: [1.0; 4],
        }
    }

    /// Sets the clear values.
    pub fn with_clear_values(mut self, clear_values: [f32; 4]) -> Self {
        self.clear_values = clear_values;
        self
    }

    /// Sets the start and end behaviours.
    pub fn with_behavior(mut self, start: AttachmentBehavior, end: AttachmentBehavior) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl Scene {
    /// Creates an attachment of the given type with a 1x1 backing texture. The
    /// texture takes the framebuffer's size when the attachment is attached.
    pub fn create_attachment(
        &mut self,
        device: &mut dyn GraphicsDevice,
        ty: AttachmentType,
    ) -> Result<AttachmentIndex> {
        let label = format!("attachment{}", self.attachments.len());
        let descriptor = TextureDescriptor::attachment(&label, 1, 1, ty.format());
        let texture = device.create_texture(&descriptor)?;
        let texture = self.textures.push(Texture::D2(texture));
        let index = self.attachments.push(Attachment::new(ty, texture));
        log::debug!("Scene: created {index} ({ty:?})");
        Ok(index)
    }

    /// Reallocates the backing texture of an attachment at `width` x `height`. The
    /// texture keeps its registry index and device ID.
    pub fn resize_attachment(
        &self,
        device: &mut dyn GraphicsDevice,
        attachment: AttachmentIndex,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let texture = self.textures[self.attachments[attachment].texture].id();
        let size = Extent3D {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        device.reallocate_texture(texture, size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_clear_to_white_and_preserve() {
        let attachment = Attachment::new(AttachmentType::Color8, TextureIndex(0));

        assert_eq!(attachment.start, AttachmentBehavior::Clear);
        assert_eq!(attachment.end, AttachmentBehavior::Preserve);
        assert_eq!(attachment.clear_values, [1.0; 4]);
    }

    #[test]
    fn only_depth24f_is_a_depth_type() {
        assert!(AttachmentType::Depth24F.is_depth());
        assert!(AttachmentType::Depth24F.format().is_depth());
        assert!(!AttachmentType::Color8.is_depth());
        assert!(!AttachmentType::Color16F.format().is_depth());
    }
}
