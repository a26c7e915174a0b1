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

//! Uniform values uploaded to programs by name.

use crate::renderer::api::resource::UniformType;

/// A value uploaded to a named uniform. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `f32`
    Float(f32),
    /// `vec2<f32>`
    Vec2([f32; 2]),
    /// `vec3<f32>`
    Vec3([f32; 3]),
    /// `vec4<f32>`
    Vec4([f32; 4]),
    /// `i32`, also used to point a sampler at a texture unit.
    Int(i32),
    /// `vec2<i32>`
    IVec2([i32; 2]),
    /// `vec3<i32>`
    IVec3([i32; 3]),
    /// `vec4<i32>`
    IVec4([i32; 4]),
    /// `mat2x2<f32>`
    Mat2([[f32; 2]; 2]),
    /// `mat3x3<f32>`
    Mat3([[f32; 3]; 3]),
    /// `mat4x4<f32>`
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// The uniform type this value uploads to.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::IVec2(_) => UniformType::IVec2,
            UniformValue::IVec3(_) => UniformType::IVec3,
            UniformValue::IVec4(_) => UniformType::IVec4,
            UniformValue::Mat2(_) => UniformType::Mat2,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    /// Writes the value into `dst` using WGSL uniform-block layout
    /// (`mat3x3` columns padded to 16 bytes). `dst` must be at least
    /// [`UniformType::size`] bytes long.
    pub fn write_std140(&self, dst: &mut [u8]) {
        fn put<T: bytemuck::Pod>(dst: &mut [u8], offset: usize, value: &[T]) {
            let bytes: &[u8] = bytemuck::cast_slice(value);
            dst[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        match self {
            UniformValue::Float(v) => put(dst, 0, &[*v]),
            UniformValue::Vec2(v) => put(dst, 0, v),
            UniformValue::Vec3(v) => put(dst, 0, v),
            UniformValue::Vec4(v) => put(dst, 0, v),
            UniformValue::Int(v) => put(dst, 0, &[*v]),
            UniformValue::IVec2(v) => put(dst, 0, v),
            UniformValue::IVec3(v) => put(dst, 0, v),
            UniformValue::IVec4(v) => put(dst, 0, v),
            UniformValue::Mat2(m) => {
                for (i, column) in m.iter().enumerate() {
                    put(dst, i * 8, column);
                }
            }
            UniformValue::Mat3(m) => {
                for (i, column) in m.iter().enumerate() {
                    put(dst, i * 16, column);
                }
            }
            UniformValue::Mat4(m) => {
                for (i, column) in m.iter().enumerate() {
                    put(dst, i * 16, column);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat3_columns_are_padded() {
        let value = UniformValue::Mat3([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let mut block = [0u8; 48];

        value.write_std140(&mut block);

        let floats: &[f32] = bytemuck::cast_slice(&block);
        assert_eq!(
            floats,
            &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]
        );
    }

    #[test]
    fn sampler_unit_is_an_int() {
        assert_eq!(UniformValue::Int(3).uniform_type(), UniformType::Int);
    }
}
