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

//! Provides structs for representing extents (sizes), origins (offsets) and rectangles.
//!
//! These types describe the dimensions of textures, framebuffers and the output
//! surface, and regions within them. They use integer (`u32`) components, making
//! them suitable for pixel-based coordinates and sizes.

use serde::{Deserialize, Serialize};

/// A two-dimensional extent, typically representing width and height.
///
/// This is commonly used for framebuffer dimensions or surface sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the number of pixels covered by this extent.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the width divided by the height, or `1.0` for an empty extent.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// A three-dimensional extent, representing width, height, and depth.
///
/// This is used for 3D textures and cubemaps (six array layers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth or number of array layers.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// Creates a single-layer extent from a 2D size.
    pub const fn from_2d(size: Extent2D) -> Self {
        Self {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        }
    }

    /// Drops the third dimension.
    pub const fn to_2d(self) -> Extent2D {
        Extent2D {
            width: self.width,
            height: self.height,
        }
    }
}

/// A two-dimensional origin, typically representing an (x, y) offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Origin2D {
    /// The x-coordinate of the origin.
    pub x: u32,
    /// The y-coordinate of the origin.
    pub y: u32,
}

/// An axis-aligned pixel rectangle, used for viewports, blit regions and readbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect2D {
    /// The top-left corner of the rectangle.
    pub origin: Origin2D,
    /// The size of the rectangle.
    pub extent: Extent2D,
}

impl Rect2D {
    /// A rectangle anchored at the origin covering `extent`.
    pub const fn from_extent(extent: Extent2D) -> Self {
        Self {
            origin: Origin2D { x: 0, y: 0 },
            extent,
        }
    }

    /// Returns `true` if the rectangle lies entirely within `bounds`.
    pub fn fits_in(&self, bounds: Extent2D) -> bool {
        self.origin.x as u64 + self.extent.width as u64 <= bounds.width as u64
            && self.origin.y as u64 + self.extent.height as u64 <= bounds.height as u64
    }
}

impl From<Extent2D> for Rect2D {
    fn from(extent: Extent2D) -> Self {
        Rect2D::from_extent(extent)
    }
}
