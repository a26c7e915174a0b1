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

//! The render command list and its interpreter.

use crate::error::Result;
use crate::index::{DrawableIndex, PassIndex};
use crate::scene::Scene;
use lumen_core::math::Extent2D;
use lumen_core::renderer::{FrameStats, GraphicsDevice};
use serde::{Deserialize, Serialize};

/// One step of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Ends the current pass, if any, and begins this one.
    Pass(PassIndex),
    /// Draws a drawable inside the current pass.
    Draw(DrawableIndex),
    /// Copies the framebuffer of the first pass into the framebuffer of the second.
    Blit(PassIndex, PassIndex),
}

impl Scene {
    /// Executes [`Scene::commands`] once.
    ///
    /// The only state carried between commands is the current pass. Once the list is
    /// exhausted the current pass, if any, is blitted onto the surface at `surface`
    /// size and unbound. Presenting is left to the caller.
    ///
    /// ## Returns
    /// Counts of the work done.
    ///
    /// ## Errors
    /// Device failures are propagated; the frame stops at the failing command.
    ///
    /// # Panics
    /// If a `Draw` command comes before any `Pass` command, or on any scene
    /// misconfiguration (see [`Scene::bind_framebuffer`] and [`Scene::draw`]).
    pub fn render(&self, device: &mut dyn GraphicsDevice, surface: Extent2D) -> Result<FrameStats> {
        let mut stats = FrameStats::default();
        let mut current: Option<PassIndex> = None;

        for command in &self.commands {
            match *command {
                RenderCommand::Pass(pass) => {
                    if let Some(previous) = current.take() {
                        self.unbind_pass(device, previous)?;
                    }
                    self.bind_pass(device, pass)?;
                    current = Some(pass);
                    stats.passes += 1;
                }
                RenderCommand::Draw(drawable) => {
                    let Some(pass) = current else {
                        panic!("draw of {drawable} issued before any pass");
                    };
                    let call = self.draw(device, pass, drawable)?;
                    stats.draw_calls += 1;
                    stats.elements += u64::from(call.element_count());
                }
                RenderCommand::Blit(src, dst) => {
                    let src = self.passes[src].framebuffer;
                    let dst = self.passes[dst].framebuffer;
                    self.blit_framebuffer(device, src, dst)?;
                    stats.blits += 1;
                }
            }
        }

        if let Some(pass) = current {
            let framebuffer = self.passes[pass].framebuffer;
            self.blit_framebuffer_to_surface(device, framebuffer, surface.width, surface.height)?;
            stats.blits += 1;
            self.unbind_pass(device, pass)?;
        }

        log::trace!("Scene: frame done ({stats:?})");
        Ok(stats)
    }
}
