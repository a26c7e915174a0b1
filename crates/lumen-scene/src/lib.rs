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

//! # Lumen Scene
//!
//! The scene graph and render-command engine of Lumen.
//!
//! A [`Scene`] owns every GPU resource of a loaded asset in flat registries addressed
//! by typed indices. Render targets are [`Framebuffer`]s made of [`Attachment`]s;
//! [`Pass`]es pair a framebuffer with a fixed draw state; [`Drawable`]s pair a
//! [`Mesh`] with a [`Material`]. A frame is an ordered list of [`RenderCommand`]s
//! executed by [`Scene::render`] against any [`GraphicsDevice`].
//!
//! [`GraphicsDevice`]: lumen_core::renderer::GraphicsDevice

#![warn(missing_docs)]

pub mod attachment;
pub mod builder;
pub mod camera;
pub mod command;
pub mod config;
mod draw;
pub mod error;
pub mod framebuffer;
pub mod guard;
pub mod index;
pub mod material;
pub mod mesh;
pub mod node;
pub mod parameter;
pub mod pass;
pub mod primitives;
pub mod scene;
pub mod texture;

pub use self::attachment::{Attachment, AttachmentBehavior, AttachmentType};
pub use self::builder::{BuiltScene, EnvironmentMaps, SceneBuilder};
pub use self::camera::{Camera, FrameBindings, FrameInput};
pub use self::command::RenderCommand;
pub use self::config::FrameDescription;
pub use self::error::SceneError;
pub use self::framebuffer::{AttachmentSlot, BindTarget, Framebuffer};
pub use self::index::*;
pub use self::material::{Material, MaterialState};
pub use self::mesh::{Drawable, Mesh, MeshIndices};
pub use self::node::{Node, NodeArena};
pub use self::parameter::{BaseType, ComponentType, Parameter};
pub use self::pass::Pass;
pub use self::scene::Scene;
pub use self::texture::Texture;
