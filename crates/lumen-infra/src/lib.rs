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

//! # Lumen Infra
//!
//! Concrete implementations of the [`GraphicsDevice`](lumen_core::renderer::GraphicsDevice)
//! contract:
//!
//! - [`software::SoftwareDevice`]: a CPU reference device that performs clears, blits
//!   and readbacks for real, records draws without rasterizing them, and keeps a
//!   journal of every call. Always available.
//! - [`graphics::wgpu::WgpuDevice`]: the GPU backend, behind the `wgpu` feature.

#![warn(missing_docs)]

#[cfg(feature = "wgpu")]
pub mod graphics;
pub mod software;
pub mod texel;

pub use software::{DeviceCall, SoftwareDevice};

#[cfg(feature = "wgpu")]
pub use graphics::wgpu::{WgpuDevice, WgpuGraphicsContext};
