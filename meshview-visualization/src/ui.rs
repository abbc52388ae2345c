//! egui controls overlay: toolbar, status line and loading indicator

use crate::viewer::Viewer;
use egui::{Align, Align2, Area, Context, Id, Layout, SelectableLabel, Slider, Spinner, TopBottomPanel};
use log::warn;

/// Requests from the overlay that need the window layer to act
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UiActions {
    pub open: bool,
    pub toggle_rotation: bool,
}

/// Draw the overlay for one frame
pub fn draw(ctx: &Context, viewer: &mut Viewer) -> UiActions {
    let mut actions = UiActions::default();
    let enabled = viewer.controls_enabled();

    TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.add_enabled(enabled, egui::Button::new("Open")).clicked() {
                actions.open = true;
            }

            let rotate = SelectableLabel::new(viewer.is_rotating(), "Rotate");
            if ui.add_enabled(viewer.can_rotate(), rotate).clicked() {
                actions.toggle_rotation = true;
            }

            ui.separator();
            ui.label("Near:");
            let mut near = viewer.near_slider().position();
            let domain = viewer.near_slider().domain();
            let response = ui
                .add_enabled(enabled, Slider::new(&mut near, domain).show_value(false))
                .on_hover_text("Camera near-clip value");
            if response.changed() {
                if let Err(e) = viewer.set_near_position(near) {
                    warn!("Ignoring near clip change: {}", e);
                }
            }
            ui.label(format!("{:.2}", viewer.near_slider().value()));

            ui.separator();
            ui.label("Far:");
            let mut far = viewer.far_slider().position();
            let domain = viewer.far_slider().domain();
            let response = ui
                .add_enabled(enabled, Slider::new(&mut far, domain).show_value(false))
                .on_hover_text("Camera far-clip value");
            if response.changed() {
                if let Err(e) = viewer.set_far_position(far) {
                    warn!("Ignoring far clip change: {}", e);
                }
            }
            ui.label(format!("{:.2}", viewer.far_slider().value()));

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(viewer.fps_text());
                ui.label("FPS:");
            });
        });
    });

    TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.label(viewer.status());
    });

    if viewer.is_loading() {
        Area::new(Id::new("loading"))
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add(Spinner::new().size(48.0));
            });
    } else if viewer.is_drag_hovering() && viewer.drag_accepted() {
        Area::new(Id::new("drop-hint"))
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.heading("Drop to load");
            });
    }

    actions
}
