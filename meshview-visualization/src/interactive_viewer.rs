//! Interactive viewer window
//!
//! Owns the winit event loop, the wgpu surface and the egui overlay, and
//! forwards window input to the [`Viewer`] model.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{info, warn};
use nalgebra::Matrix4;
use winit::{
    dpi::{LogicalPosition, LogicalSize, PhysicalPosition},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::{Window, WindowBuilder},
};

use meshview_core::{Error, Result};
use meshview_gpu::{background_color, GpuContext, MeshRenderer, RenderSurface};

use crate::config::ViewerConfig;
use crate::ui::{self, UiActions};
use crate::viewer::Viewer;

/// Wake-ups sent to the event loop from other threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    LoadFinished,
}

struct Graphics {
    context: GpuContext,
    surface: RenderSurface,
    meshes: MeshRenderer,
    overlay: egui_wgpu::Renderer,
}

impl Graphics {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let (context, surface) = pollster::block_on(GpuContext::for_window(window))?;
        let surface = RenderSurface::new(&context, surface, size)?;
        let meshes = MeshRenderer::new(&context, surface.format());
        let overlay = egui_wgpu::Renderer::new(&context.device, surface.format(), None, 1);
        Ok(Self {
            context,
            surface,
            meshes,
            overlay,
        })
    }

    fn render(&mut self, viewer: &mut Viewer, ctx: &egui::Context, output: egui::FullOutput) -> Result<()> {
        if viewer.take_content_changed() {
            self.meshes.upload(&self.context, viewer.content());
        }
        let model = viewer
            .content()
            .map(|content| content.model_transform().matrix)
            .unwrap_or_else(Matrix4::identity);
        let camera = viewer.camera();
        self.meshes.update_uniforms(
            &self.context.queue,
            camera.view_matrix(),
            camera.projection_matrix(self.surface.aspect_ratio()),
            model,
        );

        let frame = self.surface.acquire(&self.context)?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.surface.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.meshes.render(&mut pass);
        }

        let size = self.surface.size();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: output.pixels_per_point,
        };
        let jobs = ctx.tessellate(output.shapes, output.pixels_per_point);
        for (id, delta) in &output.textures_delta.set {
            self.overlay
                .update_texture(&self.context.device, &self.context.queue, *id, delta);
        }
        let overlay_commands = self.overlay.update_buffers(
            &self.context.device,
            &self.context.queue,
            &mut encoder,
            &jobs,
            &screen,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.overlay.render(&mut pass, &jobs, &screen);
        }

        for id in &output.textures_delta.free {
            self.overlay.free_texture(id);
        }

        self.context
            .queue
            .submit(overlay_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }
}

/// Window coordinates in logical pixels, the unit the camera works in
fn to_logical(position: PhysicalPosition<f64>, scale_factor: f64) -> LogicalPosition<f64> {
    position.to_logical(scale_factor)
}

/// Native open dialog filtered to the supported formats
fn pick_file(viewer: &Viewer) -> Option<PathBuf> {
    let extensions = viewer.extension_filters();
    let mut dialog = rfd::FileDialog::new()
        .set_title("Select file to load")
        .add_filter("Supported files", extensions.as_slice());
    if let Some(dir) = viewer.dialog_directory() {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_file()
}

/// Desktop window hosting a [`Viewer`]
pub struct InteractiveViewer {
    config: ViewerConfig,
}

impl InteractiveViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Open the window and run until it is closed
    pub fn run(self) -> Result<()> {
        let mut viewer = Viewer::new(&self.config).map_err(|e| Error::Visualization(e.to_string()))?;

        let event_loop = EventLoopBuilder::<ViewerEvent>::with_user_event()
            .build()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("meshview")
                .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let mut graphics = Graphics::new(Arc::clone(&window))?;
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
        );

        let proxy = Mutex::new(event_loop.create_proxy());
        viewer.set_load_notifier(move || {
            if let Ok(proxy) = proxy.lock() {
                // the loop is gone once the window closes
                let _ = proxy.send_event(ViewerEvent::LoadFinished);
            }
        });

        if let Some(path) = self.config.open.clone() {
            // failures are already on the status line
            let _ = viewer.open(path);
        }

        info!("Viewer window ready");

        let mut cursor: Option<LogicalPosition<f64>> = None;
        let mut last_frame = Instant::now();

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);

                match event {
                    Event::UserEvent(ViewerEvent::LoadFinished) | Event::AboutToWait => {
                        window.request_redraw();
                    }
                    Event::WindowEvent { event, .. } => {
                        let response = egui_state.on_window_event(&window, &event);
                        if response.repaint {
                            window.request_redraw();
                        }

                        match event {
                            WindowEvent::CloseRequested => target.exit(),
                            WindowEvent::Resized(size) => {
                                graphics.surface.resize(&graphics.context, size);
                            }
                            WindowEvent::HoveredFile(path) => viewer.drag_over(path),
                            WindowEvent::HoveredFileCancelled => viewer.drag_cancel(),
                            WindowEvent::DroppedFile(path) => {
                                viewer.drop_file(path);
                                if let Some(Err(e)) = viewer.finish_drop() {
                                    warn!("Drop not loaded: {}", e);
                                }
                            }
                            WindowEvent::MouseInput {
                                state,
                                button: MouseButton::Left,
                                ..
                            } => match state {
                                ElementState::Pressed if !response.consumed => {
                                    if let Some(position) = cursor {
                                        viewer.camera_mut().press(position.x, position.y);
                                    }
                                }
                                ElementState::Pressed => {}
                                ElementState::Released => viewer.camera_mut().release(),
                            },
                            WindowEvent::CursorMoved { position, .. } => {
                                let position = to_logical(position, window.scale_factor());
                                cursor = Some(position);
                                if viewer.camera().is_dragging() {
                                    viewer.camera_mut().drag(position.x, position.y);
                                }
                            }
                            WindowEvent::CursorLeft { .. } => cursor = None,
                            WindowEvent::MouseWheel { delta, .. } if !response.consumed => match delta {
                                MouseScrollDelta::LineDelta(_, y) => viewer.camera_mut().scroll_lines(y as f64),
                                MouseScrollDelta::PixelDelta(position) => {
                                    viewer.camera_mut().scroll(to_logical(position, window.scale_factor()).y)
                                }
                            },
                            WindowEvent::RedrawRequested => {
                                let now = Instant::now();
                                viewer.poll_loader();
                                viewer.tick(now - last_frame);
                                last_frame = now;

                                let input = egui_state.take_egui_input(&window);
                                let mut actions = UiActions::default();
                                let output = egui_ctx.run(input, |ctx| {
                                    actions = ui::draw(ctx, &mut viewer);
                                });
                                egui_state.handle_platform_output(&window, output.platform_output.clone());

                                if actions.toggle_rotation {
                                    viewer.toggle_rotation();
                                }
                                if actions.open {
                                    if let Some(path) = pick_file(&viewer) {
                                        let _ = viewer.open(path);
                                    }
                                }

                                match graphics.render(&mut viewer, &egui_ctx, output) {
                                    Ok(()) => {
                                        viewer.record_frame(Instant::now());
                                    }
                                    Err(e) => warn!("Frame skipped: {}", e),
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        Ok(())
    }
}
