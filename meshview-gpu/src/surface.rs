//! Window surface with its depth buffer

use crate::device::GpuContext;
use log::warn;
use meshview_core::{Error, Result};
use winit::dpi::PhysicalSize;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Presentation surface and the depth attachment sized to it
pub struct RenderSurface {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
}

impl RenderSurface {
    pub fn new(context: &GpuContext, surface: wgpu::Surface<'static>, size: PhysicalSize<u32>) -> Result<Self> {
        let caps = surface.get_capabilities(&context.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no texture formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);
        let depth_view = create_depth_view(&context.device, config.width, config.height);

        Ok(Self {
            surface,
            config,
            depth_view,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Reconfigure for a new window size; zero sizes (minimised) are ignored
    pub fn resize(&mut self, context: &GpuContext, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&context.device, &self.config);
            self.depth_view = create_depth_view(&context.device, new_size.width, new_size.height);
        }
    }

    /// Next frame to draw into
    pub fn acquire(&mut self, context: &GpuContext) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface {:?}, reconfiguring", e);
                self.surface.configure(&context.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| Error::Gpu(format!("Failed to get surface texture: {:?}", e)))
            }
            Err(e) => Err(Error::Gpu(format!("Failed to get surface texture: {:?}", e))),
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
