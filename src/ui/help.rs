//! Help window with map controls and the annotation workflow.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

#[derive(Resource, Default)]
pub struct HelpWindowState {
    pub is_open: bool,
}

pub fn help_popup_ui(
    mut contexts: EguiContexts,
    mut help_state: ResMut<HelpWindowState>,
) -> Result {
    if !help_state.is_open {
        return Ok(());
    }

    let ctx = contexts.ctx_mut()?;

    egui::Window::new("Help")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_width(380.0)
        .show(ctx, |ui| {
            ui.heading("Buildmark");
            ui.horizontal(|ui| {
                ui.label("Version:");
                ui.strong(env!("CARGO_PKG_VERSION"));
            });

            ui.separator();
            render_annotation_section(ui);

            ui.add_space(10.0);
            ui.separator();
            render_camera_section(ui);

            ui.add_space(10.0);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                if ui.button("Close").clicked() {
                    help_state.is_open = false;
                }
            });
        });

    // Close on Escape key
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        help_state.is_open = false;
    }

    Ok(())
}

fn render_annotation_section(ui: &mut egui::Ui) {
    ui.heading("Annotations");
    egui::Grid::new("annotation_help_grid")
        .num_columns(2)
        .spacing([20.0, 4.0])
        .show(ui, |ui| {
            ui.strong("Hover");
            ui.label("Highlight a building and preview its note");
            ui.end_row();

            ui.strong("Click");
            ui.label("Select an annotated building");
            ui.end_row();

            ui.strong("Click again");
            ui.label("Open the selected building's page");
            ui.end_row();

            ui.strong("Ctrl+Click");
            ui.label("Annotate a building that has no note yet");
            ui.end_row();
        });
}

fn render_camera_section(ui: &mut egui::Ui) {
    ui.heading("Camera");
    egui::Grid::new("camera_help_grid")
        .num_columns(2)
        .spacing([20.0, 4.0])
        .show(ui, |ui| {
            ui.strong("Left/Middle drag");
            ui.label("Pan the map");
            ui.end_row();

            ui.strong("Scroll");
            ui.label("Zoom in/out");
            ui.end_row();

            ui.strong("H");
            ui.label("Toggle this window");
            ui.end_row();
        });
}

pub fn handle_help_shortcut(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut help_state: ResMut<HelpWindowState>,
    mut contexts: EguiContexts,
) {
    // Don't toggle if typing in a text field
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    if keyboard.just_pressed(KeyCode::KeyH) {
        help_state.is_open = !help_state.is_open;
    }
}
