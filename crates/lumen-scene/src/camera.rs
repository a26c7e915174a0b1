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

//! Camera and per-frame parameter refresh.
//!
//! Nothing here is global: the caller builds a [`FrameInput`] every frame and writes
//! it into the scene parameters named by a [`FrameBindings`].

use crate::index::{NodeIndex, ParameterIndex};
use crate::parameter::{ComponentType, Parameter};
use crate::scene::Scene;
use glam::{Mat4, Vec3};
use lumen_core::math::{degrees_to_radians, Extent2D};

/// A perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view, in degrees.
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Eye position.
    pub position: Vec3,
    /// Viewing direction.
    pub direction: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near: 0.01,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        }
    }
}

impl Camera {
    /// The projection matrix for a viewport of the given aspect ratio, mapping depth
    /// to `[0, 1]`.
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            degrees_to_radians(self.fov_degrees),
            aspect_ratio,
            self.near,
            self.far,
        )
    }

    /// The view matrix, with +Y up.
    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction, Vec3::Y)
    }
}

/// The camera parameters shared by every material (`u_PROJECTION`, `u_VIEW`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalParameters {
    /// The projection matrix.
    pub projection: ParameterIndex,
    /// The view matrix.
    pub view: ParameterIndex,
}

impl GlobalParameters {
    /// Registers two identity-initialized mat4 parameters.
    pub fn create(scene: &mut Scene) -> Self {
        Self {
            projection: scene.create_parameter(mat4_parameter()),
            view: scene.create_parameter(mat4_parameter()),
        }
    }
}

/// The per-object parameters of one mesh placement (`u_MVP`, `u_MODEL`,
/// `u_ANIM_KEY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectParameters {
    /// The node whose world transform is the model matrix. `None` places the object
    /// at the origin.
    pub node: Option<NodeIndex>,
    /// Model-view-projection matrix.
    pub mvp: ParameterIndex,
    /// Model matrix.
    pub model: ParameterIndex,
    /// Animation time key.
    pub anim_key: ParameterIndex,
}

/// Where per-frame values are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBindings {
    /// Camera parameters.
    pub globals: GlobalParameters,
    /// Per-object parameters.
    pub objects: Vec<ObjectParameters>,
}

/// The explicit per-frame input of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// The camera.
    pub camera: Camera,
    /// The size the frame is rendered at; sets the aspect ratio.
    pub viewport: Extent2D,
    /// The animation time key.
    pub anim_key: f32,
}

impl FrameInput {
    /// Writes the camera matrices once and the matrices and animation key of every
    /// object. Objects without a node use the identity model matrix.
    pub fn refresh(&self, scene: &mut Scene, bindings: &FrameBindings) {
        let projection = self.camera.projection(self.viewport.aspect_ratio());
        let view = self.camera.view();
        write_mat4(scene, bindings.globals.projection, &projection);
        write_mat4(scene, bindings.globals.view, &view);

        let world = scene.nodes.world_transforms();
        let view_projection = projection * view;
        for object in &bindings.objects {
            let model = object
                .node
                .and_then(|node| world.get(node.0 as usize).copied())
                .unwrap_or(Mat4::IDENTITY);
            write_mat4(scene, object.model, &model);
            write_mat4(scene, object.mvp, &(view_projection * model));
            scene.write_parameter(object.anim_key, bytemuck::bytes_of(&self.anim_key));
        }
    }
}

pub(crate) fn mat4_parameter() -> Parameter {
    Parameter::from_f32(ComponentType::Mat4, &Mat4::IDENTITY.to_cols_array())
}

fn write_mat4(scene: &mut Scene, parameter: ParameterIndex, matrix: &Mat4) {
    scene.write_parameter(parameter, bytemuck::cast_slice(&matrix.to_cols_array()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MeshIndex;
    use crate::node::Node;
    use crate::parameter::BaseType;
    use approx::assert_relative_eq;
    use lumen_core::renderer::UniformValue;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();

        let eye_space = camera.view().transform_point3(Vec3::ZERO);

        // The origin sits ten units in front of the camera.
        assert_relative_eq!(eye_space.z, -10.0);
    }

    #[test]
    fn refresh_writes_world_placement() {
        // --- 1. ARRANGE ---
        let mut scene = Scene::new();
        let globals = GlobalParameters::create(&mut scene);
        let node = scene.nodes.add(
            None,
            Node {
                translation: Vec3::new(0.0, 3.0, 0.0),
                meshes: vec![MeshIndex(0)],
                ..Default::default()
            },
        );
        let object = ObjectParameters {
            node: Some(node),
            mvp: scene.create_parameter(mat4_parameter()),
            model: scene.create_parameter(mat4_parameter()),
            anim_key: scene.create_parameter(Parameter::new(BaseType::F32, ComponentType::Scalar)),
        };
        let bindings = FrameBindings {
            globals,
            objects: vec![object],
        };
        let input = FrameInput {
            camera: Camera::default(),
            viewport: Extent2D::new(800, 600),
            anim_key: 0.5,
        };

        // --- 2. ACT ---
        input.refresh(&mut scene, &bindings);

        // --- 3. ASSERT ---
        let Some(UniformValue::Mat4(model)) = scene.parameters[object.model].uniform_value() else {
            panic!("model is not a mat4");
        };
        assert_relative_eq!(model[3][1], 3.0);
        assert_eq!(
            scene.parameters[object.anim_key].uniform_value(),
            Some(UniformValue::Float(0.5))
        );
        let Some(UniformValue::Mat4(view)) = scene.parameters[globals.view].uniform_value() else {
            panic!("view is not a mat4");
        };
        assert_relative_eq!(view[3][2], -10.0);
    }
}
