//! # meshview GPU
//!
//! wgpu plumbing for the viewer: device creation, the window surface with its
//! depth buffer, and the mesh renderer that draws loaded content.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use meshview_gpu::{GpuContext, MeshRenderer, RenderSurface};
//! use std::sync::Arc;
//! use winit::window::Window;
//!
//! async fn example(window: Arc<Window>) -> meshview_core::Result<()> {
//!     let size = window.inner_size();
//!     let (context, surface) = GpuContext::for_window(window).await?;
//!     let surface = RenderSurface::new(&context, surface, size)?;
//!     let renderer = MeshRenderer::new(&context, surface.format());
//!     assert_eq!(renderer.vertex_count(), 0);
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod surface;
pub mod mesh;

// Re-export commonly used items
pub use device::GpuContext;
pub use surface::{RenderSurface, DEPTH_FORMAT};
pub use mesh::{background_color, flatten_content, srgb_to_linear, MeshRenderer, MeshUniform, MeshVertex};
