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

//! Framebuffer-object handles and the binding targets they are used through.

use std::fmt;

/// An opaque handle to a backend framebuffer object (a set of attachment points).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferObjectId(pub usize);

/// The highest number of color attachment points a framebuffer object exposes.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

/// An attachment point of a framebuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    /// Color attachment `n` (`0..MAX_COLOR_ATTACHMENTS`).
    Color(u8),
    /// The depth attachment.
    Depth,
}

impl AttachmentPoint {
    /// Returns `true` for color attachment points.
    pub fn is_color(&self) -> bool {
        matches!(self, AttachmentPoint::Color(_))
    }
}

impl fmt::Display for AttachmentPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentPoint::Color(n) => write!(f, "color{n}"),
            AttachmentPoint::Depth => write!(f, "depth"),
        }
    }
}

/// Which framebuffer binding point an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// The target draws and clears write to.
    Draw,
    /// The target blits and readbacks read from.
    Read,
}

/// What is bound to a framebuffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderTarget {
    /// The default framebuffer: the output surface.
    #[default]
    Surface,
    /// A framebuffer object.
    Framebuffer(FramebufferObjectId),
}

/// Completeness of a framebuffer object, as checked before it is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// No image is attached at all.
    MissingAttachment,
    /// Attached images disagree in size.
    MismatchedDimensions,
    /// An attached texture is unknown or unsuitable (e.g. a depth format at a color point).
    IncompleteAttachment(AttachmentPoint),
}

impl FramebufferStatus {
    /// Returns `true` when the framebuffer is complete.
    pub fn is_complete(&self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}
