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

use lumen_core::math::Extent3D;
use lumen_core::renderer::{
    BlendMode, ColorWrites, CompareFunction, CullMode, DepthState, FilterMode, IndexFormat,
    PrimitiveTopology, SampleType, TextureFormat, TextureUsage, TextureViewDimension,
    VertexFormat,
};

/// A local extension trait to convert our engine's types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

// --- Dimensions ---

impl IntoWgpu<wgpu::Extent3d> for Extent3D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.depth_or_array_layers,
        }
    }
}

// --- Texture related Enums ---

impl IntoWgpu<wgpu::TextureDimension> for TextureViewDimension {
    fn into_wgpu(self) -> wgpu::TextureDimension {
        match self {
            TextureViewDimension::D1 => wgpu::TextureDimension::D1,
            TextureViewDimension::D2 | TextureViewDimension::Cube => wgpu::TextureDimension::D2,
            TextureViewDimension::D3 => wgpu::TextureDimension::D3,
        }
    }
}

impl IntoWgpu<wgpu::TextureViewDimension> for TextureViewDimension {
    fn into_wgpu(self) -> wgpu::TextureViewDimension {
        match self {
            TextureViewDimension::D1 => wgpu::TextureViewDimension::D1,
            TextureViewDimension::D2 => wgpu::TextureViewDimension::D2,
            TextureViewDimension::Cube => wgpu::TextureViewDimension::Cube,
            TextureViewDimension::D3 => wgpu::TextureViewDimension::D3,
        }
    }
}

impl IntoWgpu<wgpu::FilterMode> for FilterMode {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }
}

/// Converts a WGPU texture format into its engine equivalent, if there is one.
/// This is a free function because we cannot implement `From` due to orphan rules.
pub fn from_wgpu_texture_format(format: wgpu::TextureFormat) -> Option<TextureFormat> {
    Some(match format {
        wgpu::TextureFormat::R8Unorm => TextureFormat::R8Unorm,
        wgpu::TextureFormat::Rg8Unorm => TextureFormat::Rg8Unorm,
        wgpu::TextureFormat::Rgba8Unorm => TextureFormat::Rgba8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => TextureFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Bgra8UnormSrgb => TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rg16Float => TextureFormat::Rg16Float,
        wgpu::TextureFormat::Rgba16Float => TextureFormat::Rgba16Float,
        wgpu::TextureFormat::Rgba32Float => TextureFormat::Rgba32Float,
        wgpu::TextureFormat::Depth32Float => TextureFormat::Depth32Float,
        _ => return None,
    })
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        if self.contains(TextureUsage::COPY_SRC) {
            usages |= wgpu::TextureUsages::COPY_SRC;
        }
        if self.contains(TextureUsage::COPY_DST) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        if self.contains(TextureUsage::TEXTURE_BINDING) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(TextureUsage::RENDER_ATTACHMENT) {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureSampleType> for SampleType {
    fn into_wgpu(self) -> wgpu::TextureSampleType {
        match self {
            SampleType::Float => wgpu::TextureSampleType::Float { filterable: true },
            SampleType::Depth => wgpu::TextureSampleType::Depth,
        }
    }
}

// --- Pipeline state ---

impl IntoWgpu<wgpu::CompareFunction> for CompareFunction {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunction::Less => wgpu::CompareFunction::Less,
            CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunction::Equal => wgpu::CompareFunction::Equal,
        }
    }
}

impl IntoWgpu<Option<wgpu::Face>> for CullMode {
    fn into_wgpu(self) -> Option<wgpu::Face> {
        match self {
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
            CullMode::Off => None,
        }
    }
}

impl IntoWgpu<Option<wgpu::BlendState>> for BlendMode {
    fn into_wgpu(self) -> Option<wgpu::BlendState> {
        let component = |src_factor, dst_factor| wgpu::BlendComponent {
            src_factor,
            dst_factor,
            operation: wgpu::BlendOperation::Add,
        };
        match self {
            BlendMode::Off => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::Additive => {
                let add = component(wgpu::BlendFactor::One, wgpu::BlendFactor::One);
                Some(wgpu::BlendState {
                    color: add,
                    alpha: add,
                })
            }
            BlendMode::Multiply => {
                let multiply = component(wgpu::BlendFactor::Dst, wgpu::BlendFactor::Zero);
                Some(wgpu::BlendState {
                    color: multiply,
                    alpha: multiply,
                })
            }
        }
    }
}

impl IntoWgpu<wgpu::ColorWrites> for ColorWrites {
    fn into_wgpu(self) -> wgpu::ColorWrites {
        wgpu::ColorWrites::from_bits_truncate(self.bits() as u32)
    }
}

/// Builds the depth attachment state for a pass whose depth target has `format`.
///
/// A disabled depth test still needs a depth-stencil state when the target has a
/// depth attachment: it always passes and never writes.
pub fn depth_stencil_state(depth: &DepthState, format: TextureFormat) -> wgpu::DepthStencilState {
    let (compare, write) = if depth.test_enabled {
        (depth.compare.into_wgpu(), depth.write_enabled)
    } else {
        (wgpu::CompareFunction::Always, false)
    };
    wgpu::DepthStencilState {
        format: format.into_wgpu(),
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

// --- Geometry ---

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Uint8x4 => wgpu::VertexFormat::Uint8x4,
            VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
            VertexFormat::Uint16x4 => wgpu::VertexFormat::Uint16x4,
            VertexFormat::Unorm16x4 => wgpu::VertexFormat::Unorm16x4,
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Uint32x4 => wgpu::VertexFormat::Uint32x4,
        }
    }
}

/// wgpu has no 8-bit indices; those are widened to 16 bits on upload.
impl IntoWgpu<wgpu::IndexFormat> for IndexFormat {
    fn into_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::Uint8 | IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Topologies without a wgpu counterpart map to `None`.
impl IntoWgpu<Option<wgpu::PrimitiveTopology>> for PrimitiveTopology {
    fn into_wgpu(self) -> Option<wgpu::PrimitiveTopology> {
        match self {
            PrimitiveTopology::PointList => Some(wgpu::PrimitiveTopology::PointList),
            PrimitiveTopology::LineList => Some(wgpu::PrimitiveTopology::LineList),
            PrimitiveTopology::LineStrip => Some(wgpu::PrimitiveTopology::LineStrip),
            PrimitiveTopology::TriangleList => Some(wgpu::PrimitiveTopology::TriangleList),
            PrimitiveTopology::TriangleStrip => Some(wgpu::PrimitiveTopology::TriangleStrip),
            PrimitiveTopology::LineLoop
            | PrimitiveTopology::TriangleFan
            | PrimitiveTopology::LineListAdjacency
            | PrimitiveTopology::LineStripAdjacency
            | PrimitiveTopology::TriangleListAdjacency
            | PrimitiveTopology::TriangleStripAdjacency => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent3d_to_wgpu_extent3d() {
        let extent = Extent3D {
            width: 1,
            height: 2,
            depth_or_array_layers: 3,
        };
        let w: wgpu::Extent3d = extent.into_wgpu();
        assert_eq!(w.width, 1);
        assert_eq!(w.height, 2);
        assert_eq!(w.depth_or_array_layers, 3);
    }

    #[test]
    fn test_cube_maps_to_2d_storage() {
        let dim: wgpu::TextureDimension = TextureViewDimension::Cube.into_wgpu();
        assert_eq!(dim, wgpu::TextureDimension::D2);
        let view: wgpu::TextureViewDimension = TextureViewDimension::Cube.into_wgpu();
        assert_eq!(view, wgpu::TextureViewDimension::Cube);
    }

    #[test]
    fn test_texture_format_round_trip() {
        for format in [
            TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba16Float,
            TextureFormat::Depth32Float,
        ] {
            assert_eq!(from_wgpu_texture_format(format.into_wgpu()), Some(format));
        }
        assert_eq!(from_wgpu_texture_format(wgpu::TextureFormat::R32Uint), None);
    }

    #[test]
    fn test_unsupported_topologies() {
        let fan: Option<wgpu::PrimitiveTopology> = PrimitiveTopology::TriangleFan.into_wgpu();
        assert!(fan.is_none());
        let adjacency: Option<wgpu::PrimitiveTopology> =
            PrimitiveTopology::TriangleListAdjacency.into_wgpu();
        assert!(adjacency.is_none());
    }

    #[test]
    fn test_disabled_depth_test_always_passes() {
        let state = depth_stencil_state(&DepthState::default(), TextureFormat::Depth32Float);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write_enabled);

        let state = depth_stencil_state(
            &DepthState::testing(CompareFunction::LessEqual),
            TextureFormat::Depth32Float,
        );
        assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(state.depth_write_enabled);
    }

    #[test]
    fn test_attachment_usage() {
        let usages: wgpu::TextureUsages = TextureUsage::ATTACHMENT.into_wgpu();
        assert!(usages.contains(
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC
        ));
        let sampled: wgpu::TextureUsages = TextureUsage::SAMPLED.into_wgpu();
        assert!(!sampled.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }

    #[test]
    fn test_color_write_mask() {
        let mask: wgpu::ColorWrites = (ColorWrites::R | ColorWrites::A).into_wgpu();
        assert_eq!(mask, wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA);
    }
}
