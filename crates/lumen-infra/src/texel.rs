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

//! Conversions between raw texel bytes and RGBA floats.
//!
//! Used by the software device for storage and by the GPU backend for readbacks.
//! Channels a format does not store read back as `0.0`, alpha as `1.0`.

use lumen_core::renderer::TextureFormat;

/// Decodes tightly packed texels of `format` into RGBA floats.
///
/// Trailing bytes that do not form a whole texel are ignored.
pub fn decode_texels(format: TextureFormat, bytes: &[u8]) -> Vec<[f32; 4]> {
    let stride = format.bytes_per_pixel() as usize;
    bytes
        .chunks_exact(stride)
        .map(|texel| decode_texel(format, texel))
        .collect()
}

fn decode_texel(format: TextureFormat, texel: &[u8]) -> [f32; 4] {
    let unorm = |b: u8| b as f32 / 255.0;
    let f32_at =
        |i: usize| f32::from_le_bytes([texel[i], texel[i + 1], texel[i + 2], texel[i + 3]]);
    let f16_at = |i: usize| f16_to_f32(u16::from_le_bytes([texel[i], texel[i + 1]]));
    match format {
        TextureFormat::R8Unorm => [unorm(texel[0]), 0.0, 0.0, 1.0],
        TextureFormat::Rg8Unorm => [unorm(texel[0]), unorm(texel[1]), 0.0, 1.0],
        TextureFormat::Rgba8Unorm => [
            unorm(texel[0]),
            unorm(texel[1]),
            unorm(texel[2]),
            unorm(texel[3]),
        ],
        TextureFormat::Rgba8UnormSrgb => [
            srgb_to_linear(unorm(texel[0])),
            srgb_to_linear(unorm(texel[1])),
            srgb_to_linear(unorm(texel[2])),
            unorm(texel[3]),
        ],
        TextureFormat::Bgra8UnormSrgb => [
            srgb_to_linear(unorm(texel[2])),
            srgb_to_linear(unorm(texel[1])),
            srgb_to_linear(unorm(texel[0])),
            unorm(texel[3]),
        ],
        TextureFormat::Rg16Float => [f16_at(0), f16_at(2), 0.0, 1.0],
        TextureFormat::Rgba16Float => [f16_at(0), f16_at(2), f16_at(4), f16_at(6)],
        TextureFormat::Rgba32Float => [f32_at(0), f32_at(4), f32_at(8), f32_at(12)],
        TextureFormat::Depth32Float => [f32_at(0), 0.0, 0.0, 1.0],
    }
}

/// Rounds a color to the precision `format` stores it with.
pub fn quantize(format: TextureFormat, color: [f32; 4]) -> [f32; 4] {
    let unorm = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() / 255.0;
    match format {
        TextureFormat::R8Unorm => [unorm(color[0]), 0.0, 0.0, 1.0],
        TextureFormat::Rg8Unorm => [unorm(color[0]), unorm(color[1]), 0.0, 1.0],
        TextureFormat::Rgba8Unorm
        | TextureFormat::Rgba8UnormSrgb
        | TextureFormat::Bgra8UnormSrgb => color.map(unorm),
        TextureFormat::Rg16Float => [color[0], color[1], 0.0, 1.0],
        TextureFormat::Depth32Float => [color[0], 0.0, 0.0, 1.0],
        TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => color,
    }
}

/// Converts an IEEE 754 half-precision value to `f32`.
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f32;
    match exponent {
        0 => sign * mantissa * 2f32.powi(-24),
        0x1f if mantissa == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    }
}

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn half_floats_decode() {
        assert_eq!(f16_to_f32(0x3c00), 1.0);
        assert_eq!(f16_to_f32(0xc000), -2.0);
        assert_eq!(f16_to_f32(0x0000), 0.0);
        assert_relative_eq!(f16_to_f32(0x3555), 0.333_251_95, epsilon = 1e-6);
        assert!(f16_to_f32(0x7c00).is_infinite());
    }

    #[test]
    fn rgba8_round_trips_through_quantize() {
        let bytes = [0u8, 255, 51, 255];
        let decoded = decode_texels(TextureFormat::Rgba8Unorm, &bytes);
        assert_eq!(decoded, vec![[0.0, 1.0, 0.2, 1.0]]);
        assert_eq!(quantize(TextureFormat::Rgba8Unorm, decoded[0]), decoded[0]);
    }

    #[test]
    fn depth_texels_carry_depth_in_red() {
        let bytes = 0.5f32.to_le_bytes();
        assert_eq!(
            decode_texels(TextureFormat::Depth32Float, &bytes),
            vec![[0.5, 0.0, 0.0, 1.0]]
        );
    }
}
