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

//! Deferred recording of render passes.
//!
//! wgpu clears attachments only when a pass begins, while the device contract
//! allows clears and draws in any order. Work aimed at the bound draw target is
//! therefore collected into a [`PendingPass`] and encoded when the target changes
//! or when a blit, readback or present needs the results.

use lumen_core::math::{Extent2D, Rect2D};
use lumen_core::renderer::{DrawCall, IndexSourceId, RenderTarget, VertexSourceId};

use super::pipeline::PipelineKey;

/// One draw call with everything resolved at record time.
#[derive(Debug)]
pub(crate) struct RecordedDraw {
    pub pipeline: PipelineKey,
    pub bind_group: wgpu::BindGroup,
    pub vertex_source: VertexSourceId,
    pub index_source: Option<IndexSourceId>,
    pub call: DrawCall,
    pub viewport: Rect2D,
}

/// Work collected for one draw target.
#[derive(Debug)]
pub(crate) struct PendingPass {
    pub target: RenderTarget,
    /// Clear values per draw buffer; `None` loads the existing contents.
    pub color_clears: Vec<Option<wgpu::Color>>,
    pub depth_clear: Option<f32>,
    pub draws: Vec<RecordedDraw>,
}

impl PendingPass {
    pub fn new(target: RenderTarget, color_count: usize) -> Self {
        Self {
            target,
            color_clears: vec![None; color_count],
            depth_clear: None,
            draws: Vec::new(),
        }
    }

    /// `true` once draws have been recorded; a later clear must start a new pass.
    pub fn has_draws(&self) -> bool {
        !self.draws.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
            && self.depth_clear.is_none()
            && self.color_clears.iter().all(Option::is_none)
    }

    pub fn clear_color(&mut self, draw_buffer: usize, color: [f32; 4]) {
        if let Some(slot) = self.color_clears.get_mut(draw_buffer) {
            *slot = Some(wgpu::Color {
                r: color[0] as f64,
                g: color[1] as f64,
                b: color[2] as f64,
                a: color[3] as f64,
            });
        }
    }

    pub fn color_load(&self, draw_buffer: usize) -> wgpu::LoadOp<wgpu::Color> {
        match self.color_clears.get(draw_buffer).copied().flatten() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        }
    }

    pub fn depth_load(&self) -> wgpu::LoadOp<f32> {
        match self.depth_clear {
            Some(depth) => wgpu::LoadOp::Clear(depth),
            None => wgpu::LoadOp::Load,
        }
    }
}

/// Clamps a viewport to the target, as wgpu rejects viewports outside it.
pub(crate) fn clamp_viewport(viewport: Rect2D, target: Extent2D) -> Option<[f32; 4]> {
    super::blit::clip(viewport, target).map(|(x, y, w, h)| [x as f32, y as f32, w as f32, h as f32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Origin2D;

    #[test]
    fn clears_become_load_ops() {
        let mut pass = PendingPass::new(RenderTarget::Surface, 2);
        assert!(pass.is_empty());
        pass.clear_color(1, [0.0, 1.0, 0.0, 1.0]);
        pass.depth_clear = Some(1.0);

        assert!(matches!(pass.color_load(0), wgpu::LoadOp::Load));
        assert!(matches!(pass.color_load(1), wgpu::LoadOp::Clear(c) if c.g == 1.0));
        assert!(matches!(pass.depth_load(), wgpu::LoadOp::Clear(d) if d == 1.0));
        assert!(!pass.is_empty());
        assert!(!pass.has_draws());
    }

    #[test]
    fn viewport_is_clamped_to_target() {
        let viewport = Rect2D {
            origin: Origin2D { x: 0, y: 0 },
            extent: Extent2D::new(1600, 1200),
        };
        assert_eq!(
            clamp_viewport(viewport, Extent2D::new(800, 600)),
            Some([0.0, 0.0, 800.0, 600.0])
        );
    }
}
