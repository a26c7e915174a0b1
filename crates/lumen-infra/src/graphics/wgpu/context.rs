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

use anyhow::anyhow;
use anyhow::Result;
use lumen_core::math::Extent2D;
use wgpu::{Adapter, Features, Instance};

/// Holds the core WGPU state objects required for rendering.
///
/// The context is created either headless, for offscreen rendering and readback, or
/// around a caller-supplied surface. Window management stays with the caller: any
/// `wgpu::Surface<'static>` can be handed in.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The presentation surface, if any.
    pub surface: Option<wgpu::Surface<'static>>,
    /// The adapter the device was requested from.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue.
    pub queue: wgpu::Queue,

    /// Configuration for the surface's swapchain behavior, present with a surface.
    pub surface_config: Option<wgpu::SurfaceConfiguration>,

    /// Name of the adapter.
    pub adapter_name: String,
    /// Backend of the adapter.
    pub adapter_backend: wgpu::Backend,
    /// Device type of the adapter.
    pub adapter_device_type: wgpu::DeviceType,
    /// Features enabled on the device.
    pub active_device_features: wgpu::Features,
}

impl WgpuGraphicsContext {
    /// Initializes a context without a presentation surface.
    ///
    /// ## Errors
    /// Fails when no adapter is available or the device cannot be created.
    pub async fn new_headless(instance: &Instance) -> Result<Self> {
        log::info!("Initializing headless WGPU Graphics Context...");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("No suitable graphics adapter: {}", e))?;
        Self::from_adapter(adapter, None, Extent2D::new(1, 1), true).await
    }

    /// Initializes a context that presents to `surface`.
    ///
    /// ## Arguments
    /// * `instance` - The instance the surface was created from.
    /// * `surface` - The presentation surface.
    /// * `size` - The initial physical size of the surface.
    /// * `vsync` - Whether presentation waits for vertical blank.
    ///
    /// ## Errors
    /// Fails when no compatible adapter exists or the device cannot be created.
    pub async fn with_surface(
        instance: &Instance,
        surface: wgpu::Surface<'static>,
        size: Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context for a surface...");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .map_err(|e| anyhow!("No adapter compatible with the surface: {}", e))?;
        Self::from_adapter(adapter, Some(surface), size, vsync).await
    }

    async fn from_adapter(
        adapter: Adapter,
        surface: Option<wgpu::Surface<'static>>,
        size: Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // --- 1. Create Logical Device and Command Queue from Adapter ---
        let wanted_features: Features = wgpu::Features::FLOAT32_FILTERABLE;
        let features_to_enable: Features = adapter.features() & wanted_features;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Lumen Logical Device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let active_device_features = device.features();
        log::debug!("Active device features: {active_device_features:?}");

        // --- 2. Configure Surface ---
        let surface_config = surface.as_ref().map(|surface| {
            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
            let present_mode = if vsync {
                wgpu::PresentMode::Fifo
            } else {
                caps.present_modes
                    .iter()
                    .copied()
                    .find(|m| {
                        *m == wgpu::PresentMode::Mailbox || *m == wgpu::PresentMode::Immediate
                    })
                    .unwrap_or(wgpu::PresentMode::Fifo)
            };
            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width.max(1),
                height: size.height.max(1),
                present_mode,
                alpha_mode: caps
                    .alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            surface.configure(&device, &config);
            config
        });

        Ok(WgpuGraphicsContext {
            surface,
            adapter,
            device,
            queue,
            surface_config,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            active_device_features,
        })
    }

    /// Reconfigures the underlying surface (swapchain) when the window is resized.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            log::warn!(
                "WGPUGraphicsContext: Ignoring resize request to zero dimensions: {new_width}x{new_height}"
            );
            return;
        }
        if let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) {
            log::info!(
                "WGPUGraphicsContext: Resizing surface configuration to {new_width}x{new_height}"
            );
            config.width = new_width;
            config.height = new_height;
            surface.configure(&self.device, config);
        }
    }

    /// The swapchain format, when presenting to a surface.
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.surface_config.as_ref().map(|c| c.format)
    }

    /// Acquires the next swapchain image, when presenting to a surface.
    pub fn get_current_texture(&self) -> Option<Result<wgpu::SurfaceTexture, wgpu::SurfaceError>> {
        self.surface.as_ref().map(|s| s.get_current_texture())
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
