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

//! RON frame descriptions.
//!
//! A [`FrameDescription`] lists framebuffers with their attachments, passes and the
//! command list of a frame. Pass indices inside the description are local to it;
//! draw indices address drawables already in the scene.
//!
//! ```ron
//! (
//!     framebuffers: [
//!         (
//!             width: 800,
//!             height: 600,
//!             attachments: [
//!                 (slot: Color0, ty: Color8, clear_values: (0.2, 0.3, 0.3, 1.0)),
//!                 (slot: Depth, ty: Depth24F),
//!             ],
//!         ),
//!     ],
//!     passes: [(framebuffer: 0)],
//!     commands: [Pass(0), Draw(0)],
//! )
//! ```

use crate::attachment::{AttachmentBehavior, AttachmentType};
use crate::command::RenderCommand;
use crate::error::{Result, SceneError};
use crate::framebuffer::AttachmentSlot;
use crate::index::{PassIndex, RegistryIndex};
use crate::scene::Scene;
use lumen_core::renderer::{DrawState, GraphicsDevice};
use serde::{Deserialize, Serialize};

/// One attachment of a described framebuffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDescription {
    /// The slot it occupies.
    pub slot: AttachmentSlot,
    /// Its pixel format.
    pub ty: AttachmentType,
    /// Clear color, or clear depth in the first component.
    #[serde(default = "default_clear_values")]
    pub clear_values: [f32; 4],
    /// Behaviour at pass start.
    #[serde(default = "default_start")]
    pub start: AttachmentBehavior,
    /// Behaviour at pass end.
    #[serde(default = "default_end")]
    pub end: AttachmentBehavior,
}

fn default_clear_values() -> [f32; 4] {
    [1.0; 4]
}

fn default_start() -> AttachmentBehavior {
    AttachmentBehavior::Clear
}

fn default_end() -> AttachmentBehavior {
    AttachmentBehavior::Preserve
}

/// A described framebuffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramebufferDescription {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Attachments, created in order.
    #[serde(default)]
    pub attachments: Vec<AttachmentDescription>,
}

/// A described pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassDescription {
    /// Index into [`FrameDescription::framebuffers`].
    pub framebuffer: usize,
    /// The pass state; unspecified fields take the neutral default.
    #[serde(default)]
    pub state: DrawState,
}

/// Render targets, passes and commands of a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameDescription {
    /// Framebuffers.
    #[serde(default)]
    pub framebuffers: Vec<FramebufferDescription>,
    /// Passes.
    #[serde(default)]
    pub passes: Vec<PassDescription>,
    /// The command list; pass indices are local to this description.
    #[serde(default)]
    pub commands: Vec<RenderCommand>,
}

impl FrameDescription {
    /// Parses a RON document.
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Checks every index and slot against the description and `scene`.
    pub fn validate(&self, scene: &Scene) -> Result<()> {
        for (i, framebuffer) in self.framebuffers.iter().enumerate() {
            let mut used = [false; AttachmentSlot::ALL.len()];
            for attachment in &framebuffer.attachments {
                let slot = attachment.slot;
                if std::mem::replace(&mut used[slot.index()], true) {
                    return Err(invalid(format!("framebuffer {i} fills slot {slot:?} twice")));
                }
                if slot.is_color() == attachment.ty.is_depth() {
                    return Err(invalid(format!(
                        "framebuffer {i} puts a {:?} attachment in slot {slot:?}",
                        attachment.ty
                    )));
                }
            }
        }

        for (i, pass) in self.passes.iter().enumerate() {
            if pass.framebuffer >= self.framebuffers.len() {
                return Err(invalid(format!(
                    "pass {i} uses framebuffer {} of {}",
                    pass.framebuffer,
                    self.framebuffers.len()
                )));
            }
        }

        let check_pass = |pass: PassIndex| {
            if pass.to_usize() < self.passes.len() {
                Ok(())
            } else {
                Err(invalid(format!("command uses pass {} of {}", pass.0, self.passes.len())))
            }
        };
        for command in &self.commands {
            match *command {
                RenderCommand::Pass(pass) => check_pass(pass)?,
                RenderCommand::Blit(src, dst) => {
                    check_pass(src)?;
                    check_pass(dst)?;
                }
                RenderCommand::Draw(drawable) => {
                    if !scene.drawables.contains(drawable) {
                        return Err(invalid(format!("command draws missing {drawable}")));
                    }
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> SceneError {
    SceneError::InvalidDescription(message)
}

impl Scene {
    /// Creates the framebuffers, attachments and passes of a description and makes
    /// its command list the scene's.
    ///
    /// The description is validated first; an invalid one leaves the scene untouched.
    ///
    /// ## Returns
    /// The scene indices of the described passes, in description order.
    pub fn apply_frame_description(
        &mut self,
        device: &mut dyn GraphicsDevice,
        description: &FrameDescription,
    ) -> Result<Vec<PassIndex>> {
        description.validate(self)?;

        let mut framebuffers = Vec::with_capacity(description.framebuffers.len());
        for fb in &description.framebuffers {
            let framebuffer = self.create_framebuffer(device, fb.width, fb.height)?;
            for attachment in &fb.attachments {
                let index =
                    self.add_attachment(device, framebuffer, attachment.slot, attachment.ty)?;
                let created = &mut self.attachments[index];
                created.clear_values = attachment.clear_values;
                created.start = attachment.start;
                created.end = attachment.end;
            }
            framebuffers.push(framebuffer);
        }

        let passes: Vec<PassIndex> = description
            .passes
            .iter()
            .map(|pass| self.create_pass(framebuffers[pass.framebuffer], pass.state))
            .collect();

        let remap = |pass: PassIndex| passes[pass.to_usize()];
        let commands = description
            .commands
            .iter()
            .map(|command| match *command {
                RenderCommand::Pass(pass) => RenderCommand::Pass(remap(pass)),
                RenderCommand::Blit(src, dst) => RenderCommand::Blit(remap(src), remap(dst)),
                draw @ RenderCommand::Draw(_) => draw,
            })
            .collect();
        self.set_commands(commands);

        log::info!(
            "Scene: applied frame description ({} framebuffers, {} passes, {} commands)",
            framebuffers.len(),
            passes.len(),
            self.commands.len()
        );
        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::renderer::CullMode;

    const DESCRIPTION: &str = r#"
        (
            framebuffers: [
                (
                    width: 800,
                    height: 600,
                    attachments: [
                        (slot: Color0, ty: Color8, clear_values: (0.2, 0.3, 0.3, 1.0)),
                        (slot: Depth, ty: Depth24F, end: Clear),
                    ],
                ),
            ],
            passes: [(framebuffer: 0, state: (cull: Back))],
            commands: [Pass(0), Blit(0, 0)],
        )
    "#;

    #[test]
    fn parses_with_defaults() {
        let description = FrameDescription::from_ron(DESCRIPTION).unwrap();

        let depth = &description.framebuffers[0].attachments[1];
        assert_eq!(depth.clear_values, [1.0; 4]);
        assert_eq!(depth.start, AttachmentBehavior::Clear);
        assert_eq!(depth.end, AttachmentBehavior::Clear);
        assert_eq!(description.passes[0].state.cull, CullMode::Back);
        assert!(!description.passes[0].state.depth.test_enabled);
        assert_eq!(
            description.commands,
            vec![
                RenderCommand::Pass(PassIndex(0)),
                RenderCommand::Blit(PassIndex(0), PassIndex(0))
            ]
        );
    }

    #[test]
    fn malformed_documents_report_parse_errors() {
        let err = FrameDescription::from_ron("(framebuffers: [").unwrap_err();
        assert!(matches!(err, SceneError::Config(_)));
    }

    #[test]
    fn validation_rejects_depth_in_color_slot() {
        let mut description = FrameDescription::from_ron(DESCRIPTION).unwrap();
        description.framebuffers[0].attachments[0].ty = AttachmentType::Depth24F;

        let err = description.validate(&Scene::new()).unwrap_err();

        assert!(matches!(err, SceneError::InvalidDescription(_)));
    }

    #[test]
    fn validation_rejects_draws_of_missing_drawables() {
        let mut description = FrameDescription::from_ron(DESCRIPTION).unwrap();
        description
            .commands
            .push(RenderCommand::Draw(crate::index::DrawableIndex(0)));

        assert!(description.validate(&Scene::new()).is_err());
    }
}
