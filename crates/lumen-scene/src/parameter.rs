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

//! Typed, byte-backed uniform values shared between materials.

use crate::index::ParameterIndex;
use crate::scene::Scene;
use lumen_core::renderer::UniformValue;
use serde::{Deserialize, Serialize};

/// The scalar type of a parameter's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
}

/// The shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// One component.
    Scalar,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// A column-major 2x2 matrix.
    Mat2,
    /// A column-major 3x3 matrix.
    Mat3,
    /// A column-major 4x4 matrix.
    Mat4,
}

impl ComponentType {
    /// The number of scalar components.
    pub fn component_count(self) -> usize {
        match self {
            ComponentType::Scalar => 1,
            ComponentType::Vec2 => 2,
            ComponentType::Vec3 => 3,
            ComponentType::Vec4 | ComponentType::Mat2 => 4,
            ComponentType::Mat3 => 9,
            ComponentType::Mat4 => 16,
        }
    }
}

/// A uniform value stored as raw bytes.
///
/// The byte length is fixed at creation to `component_count * 4`; updates copy bytes
/// in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    data: Vec<u8>,
    base_type: BaseType,
    component_type: ComponentType,
}

impl Parameter {
    /// A zero-filled parameter.
    pub fn new(base_type: BaseType, component_type: ComponentType) -> Self {
        Self {
            data: vec![0; component_type.component_count() * 4],
            base_type,
            component_type,
        }
    }

    /// A parameter initialized from raw bytes.
    ///
    /// # Panics
    /// If `data` does not have the parameter's byte length.
    pub fn with_data(base_type: BaseType, component_type: ComponentType, data: &[u8]) -> Self {
        let mut parameter = Self::new(base_type, component_type);
        parameter.write(data);
        parameter
    }

    /// An `f32` parameter holding `values`.
    pub fn from_f32(component_type: ComponentType, values: &[f32]) -> Self {
        Self::with_data(BaseType::F32, component_type, bytemuck::cast_slice(values))
    }

    /// An `i32` parameter holding `values`.
    pub fn from_i32(component_type: ComponentType, values: &[i32]) -> Self {
        Self::with_data(BaseType::I32, component_type, bytemuck::cast_slice(values))
    }

    /// The scalar type.
    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    /// The shape.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw bytes. The length cannot change.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrites the contents.
    ///
    /// # Panics
    /// If `data` does not have the parameter's byte length.
    pub fn write(&mut self, data: &[u8]) {
        assert_eq!(
            data.len(),
            self.data.len(),
            "{:?} {:?} parameter holds {} bytes",
            self.base_type,
            self.component_type,
            self.data.len()
        );
        self.data.copy_from_slice(data);
    }

    /// Overwrites the contents with a plain-old-data value of the same size.
    pub fn write_pod<T: bytemuck::Pod>(&mut self, value: &T) {
        self.write(bytemuck::bytes_of(value));
    }

    /// The value to upload, or `None` for integer matrices, which no program
    /// uniform can receive.
    pub fn uniform_value(&self) -> Option<UniformValue> {
        let value = match (self.base_type, self.component_type) {
            (BaseType::F32, ComponentType::Scalar) => UniformValue::Float(self.read()),
            (BaseType::F32, ComponentType::Vec2) => UniformValue::Vec2(self.read()),
            (BaseType::F32, ComponentType::Vec3) => UniformValue::Vec3(self.read()),
            (BaseType::F32, ComponentType::Vec4) => UniformValue::Vec4(self.read()),
            (BaseType::F32, ComponentType::Mat2) => UniformValue::Mat2(self.read()),
            (BaseType::F32, ComponentType::Mat3) => UniformValue::Mat3(self.read()),
            (BaseType::F32, ComponentType::Mat4) => UniformValue::Mat4(self.read()),
            (BaseType::I32, ComponentType::Scalar) => UniformValue::Int(self.read()),
            (BaseType::I32, ComponentType::Vec2) => UniformValue::IVec2(self.read()),
            (BaseType::I32, ComponentType::Vec3) => UniformValue::IVec3(self.read()),
            (BaseType::I32, ComponentType::Vec4) => UniformValue::IVec4(self.read()),
            (BaseType::I32, ComponentType::Mat2 | ComponentType::Mat3 | ComponentType::Mat4) => {
                return None
            }
        };
        Some(value)
    }

    fn read<T: bytemuck::AnyBitPattern>(&self) -> T {
        // The byte vector carries no alignment guarantee.
        bytemuck::pod_read_unaligned(&self.data)
    }
}

impl Scene {
    /// Registers a parameter.
    pub fn create_parameter(&mut self, parameter: Parameter) -> ParameterIndex {
        self.parameters.push(parameter)
    }

    /// Overwrites the bytes of a parameter.
    ///
    /// # Panics
    /// If the index is out of range or `data` has the wrong length.
    pub fn write_parameter(&mut self, parameter: ParameterIndex, data: &[u8]) {
        self.parameters[parameter].write(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn mat4_identity_round_trips_as_64_bytes() {
        // --- 1. ARRANGE ---
        let identity = Mat4::IDENTITY.to_cols_array();
        let bytes: &[u8] = bytemuck::cast_slice(&identity);
        let mut parameter = Parameter::new(BaseType::F32, ComponentType::Mat4);

        // --- 2. ACT ---
        parameter.write(bytes);

        // --- 3. ASSERT ---
        assert_eq!(parameter.bytes().len(), 64);
        assert_eq!(parameter.bytes(), bytes);
        assert_eq!(
            parameter.uniform_value(),
            Some(UniformValue::Mat4(Mat4::IDENTITY.to_cols_array_2d()))
        );
    }

    #[test]
    fn new_parameters_are_zeroed() {
        let parameter = Parameter::new(BaseType::I32, ComponentType::Vec3);
        assert_eq!(parameter.bytes(), &[0u8; 12]);
        assert_eq!(parameter.uniform_value(), Some(UniformValue::IVec3([0; 3])));
    }

    #[test]
    #[should_panic(expected = "parameter holds 4 bytes")]
    fn writes_cannot_change_the_size() {
        let mut parameter = Parameter::new(BaseType::F32, ComponentType::Scalar);
        parameter.write(&[0u8; 8]);
    }

    #[test]
    fn integer_matrices_have_no_uniform_value() {
        let parameter = Parameter::new(BaseType::I32, ComponentType::Mat3);
        assert_eq!(parameter.uniform_value(), None);
    }

    #[test]
    fn mat3_reads_back_column_major() {
        let columns = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let parameter = Parameter::from_f32(ComponentType::Mat3, &columns);

        assert_eq!(
            parameter.uniform_value(),
            Some(UniformValue::Mat3([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]))
        );
    }
}
