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

//! Render passes.

use crate::error::Result;
use crate::framebuffer::BindTarget;
use crate::index::{FramebufferIndex, PassIndex};
use crate::scene::Scene;
use lumen_core::renderer::{DrawState, GraphicsDevice};

/// A framebuffer plus the fixed GPU state draws inside it start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    /// The framebuffer rendered into.
    pub framebuffer: FramebufferIndex,
    /// Depth, color-write, culling and blend state of the pass.
    pub state: DrawState,
}

impl Pass {
    /// A pass over `framebuffer` with the given state.
    pub fn new(framebuffer: FramebufferIndex, state: DrawState) -> Self {
        Self { framebuffer, state }
    }
}

impl Scene {
    /// Registers a pass.
    pub fn create_pass(&mut self, framebuffer: FramebufferIndex, state: DrawState) -> PassIndex {
        assert!(
            self.framebuffers.contains(framebuffer),
            "pass refers to missing {framebuffer}"
        );
        self.passes.push(Pass::new(framebuffer, state))
    }

    /// Binds the pass framebuffer to both binding points (running its start-of-pass
    /// sweep) and applies the pass state.
    pub fn bind_pass(&self, device: &mut dyn GraphicsDevice, pass: PassIndex) -> Result<()> {
        let pass_ref = &self.passes[pass];
        self.bind_framebuffer(device, pass_ref.framebuffer, BindTarget::Both)?;
        device.set_draw_state(&pass_ref.state);
        log::debug!("Scene: bound {pass}");
        Ok(())
    }

    /// Unbinds the pass framebuffer (running its end-of-pass sweep) and resets the
    /// device to the neutral state.
    pub fn unbind_pass(&self, device: &mut dyn GraphicsDevice, pass: PassIndex) -> Result<()> {
        self.unbind_framebuffer(device, self.passes[pass].framebuffer)?;
        device.set_draw_state(&DrawState::default());
        log::debug!("Scene: unbound {pass}");
        Ok(())
    }
}
