use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::backend::{BackendError, BackendStatus, ReloadAnnotationsRequest};
use crate::config::{AppConfig, ConfigResetNotification, MissingFootprintsWarning, SaveConfigRequest};
use crate::map::{AnnotationEngine, FootprintLoadError, FootprintSource, LoadFootprintsRequest};
use crate::theme;

use super::help::HelpWindowState;
use super::intents::NavigationLog;
use super::settings_dialog::SettingsDialogState;

/// Shorten a path for display, keeping its tail.
pub fn truncate_path(path: &str, max_chars: usize) -> String {
    let count = path.chars().count();
    if count <= max_chars || max_chars <= 3 {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (max_chars - 3)).collect();
    format!("...{}", tail)
}

/// Top menu bar with file and annotation actions
#[allow(clippy::too_many_arguments)]
pub fn menu_bar_ui(
    mut contexts: EguiContexts,
    config: Res<AppConfig>,
    source: Res<FootprintSource>,
    status: Res<BackendStatus>,
    mut settings: ResMut<SettingsDialogState>,
    mut help: ResMut<HelpWindowState>,
    mut load_events: MessageWriter<LoadFootprintsRequest>,
    mut reload_events: MessageWriter<ReloadAnnotationsRequest>,
) -> Result {
    egui::TopBottomPanel::top("menu_bar").show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            ui.menu_button("File", |ui| {
                if ui
                    .add_enabled(!source.is_loading, egui::Button::new("Open Footprints..."))
                    .clicked()
                {
                    let mut dialog = rfd::FileDialog::new()
                        .add_filter("GeoJSON", &["geojson", "json"])
                        .set_title("Open Footprints");
                    if let Some(dir) = source.path.as_ref().and_then(|p| p.parent()) {
                        dialog = dialog.set_directory(dir);
                    }
                    if let Some(path) = dialog.pick_file() {
                        load_events.write(LoadFootprintsRequest { path });
                    }
                    ui.close();
                }

                let can_reload = !source.is_loading && source.path.is_some();
                if ui
                    .add_enabled(can_reload, egui::Button::new("Reload Footprints"))
                    .clicked()
                {
                    if let Some(path) = source.path.clone() {
                        load_events.write(LoadFootprintsRequest { path });
                    }
                    ui.close();
                }
            });

            ui.menu_button("Annotations", |ui| {
                if ui
                    .add_enabled(!status.is_busy(), egui::Button::new("Reload"))
                    .clicked()
                {
                    reload_events.write(ReloadAnnotationsRequest);
                    ui.close();
                }

                ui.separator();

                if ui.button("Backend Settings...").clicked() {
                    settings.load_from_config(&config);
                    settings.is_open = true;
                    ui.close();
                }
            });

            if ui.button("Help (H)").clicked() {
                help.is_open = true;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(config.data.backend_target().to_string())
                        .small()
                        .weak(),
                )
                .on_hover_text("Annotation backend");
            });
        });
    });
    Ok(())
}

/// Bottom status bar: footprint source, backend activity and the last route
pub fn status_bar_ui(
    mut contexts: EguiContexts,
    engine: Res<AnnotationEngine>,
    source: Res<FootprintSource>,
    status: Res<BackendStatus>,
    navigation: Res<NavigationLog>,
) -> Result {
    egui::TopBottomPanel::bottom("status_bar").show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            if source.is_loading {
                ui.spinner();
                ui.label("Loading footprints...");
            } else if let Some(ref path) = source.path {
                let path_str = path.to_string_lossy();
                let count = engine.driver.provider().footprints().len();
                ui.label(format!("{} footprints", count))
                    .on_hover_text(path_str.as_ref());
                ui.label(egui::RichText::new(truncate_path(&path_str, 40)).weak());
                if source.skipped > 0 {
                    ui.label(
                        egui::RichText::new(format!("({} skipped)", source.skipped))
                            .color(theme::ui::HINT_TEXT),
                    );
                }
            } else {
                ui.label(
                    egui::RichText::new("No footprints loaded. Use File > Open Footprints...")
                        .color(theme::ui::HINT_TEXT),
                );
            }

            ui.separator();

            if status.is_saving || !status.queued.is_empty() {
                ui.spinner();
                ui.label(format!("Saving ({} queued)", status.queued.len()));
            } else if let Some(summary) = &status.last_import {
                let mut text = format!("{} annotations loaded", summary.imported);
                if summary.rejected > 0 {
                    text.push_str(&format!(", {} rejected", summary.rejected));
                }
                let response = ui.label(text);
                if let Some(from) = &status.loaded_from {
                    response.on_hover_text(from.as_str());
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &navigation.last_route {
                    Some(route) => {
                        ui.label(egui::RichText::new(route.as_str()).monospace());
                    }
                    None => {
                        ui.label(
                            egui::RichText::new("Ctrl+click a building to annotate it")
                                .small()
                                .color(theme::ui::HINT_TEXT),
                        );
                    }
                }
            });
        });
    });
    Ok(())
}

/// Renders the missing footprints warning dialog (shown at startup if the last file doesn't exist)
pub fn missing_footprints_warning_ui(
    mut contexts: EguiContexts,
    mut warning: ResMut<MissingFootprintsWarning>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    if !warning.show {
        return Ok(());
    }

    egui::Window::new("Footprints Not Found")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The last opened footprints file no longer exists:");

            if let Some(ref path) = warning.path {
                ui.add_space(5.0);
                let path_str = path.to_string_lossy();
                ui.label(egui::RichText::new(truncate_path(&path_str, 50)).weak())
                    .on_hover_text(path_str.as_ref());
                ui.add_space(10.0);
            }

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    warning.show = false;
                }

                if ui.button("Forget this file").clicked() {
                    config.data.footprints_path = None;
                    config.dirty = true;
                    save_events.write(SaveConfigRequest);
                    warning.show = false;
                }
            });
        });

    Ok(())
}

/// Tells the user their config file could not be used and defaults were loaded
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be loaded and were reset to defaults.");
            if let Some(ref reason) = notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason.as_str()).small().weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}

/// Footprint load and backend failures
pub fn error_dialogs_ui(
    mut contexts: EguiContexts,
    mut footprint_error: ResMut<FootprintLoadError>,
    mut backend_error: ResMut<BackendError>,
    config: Res<AppConfig>,
    mut settings: ResMut<SettingsDialogState>,
) -> Result {
    if let Some(error) = footprint_error.message.clone() {
        egui::Window::new("Footprints Error")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(contexts.ctx_mut()?, |ui| {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    ui.colored_label(theme::ui::ERROR_TEXT, error.as_str());
                });
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    footprint_error.message = None;
                }
            });
    }

    if let Some(error) = backend_error.message.clone() {
        egui::Window::new("Annotation Backend Error")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 40.0])
            .show(contexts.ctx_mut()?, |ui| {
                egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                    ui.colored_label(theme::ui::ERROR_TEXT, error.as_str());
                });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        backend_error.message = None;
                    }
                    if ui.button("Backend Settings...").clicked() {
                        backend_error.message = None;
                        settings.load_from_config(&config);
                        settings.is_open = true;
                    }
                });
            });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_path_unchanged() {
        assert_eq!(truncate_path("city.geojson", 40), "city.geojson");
    }

    #[test]
    fn test_long_path_keeps_tail() {
        let path = "/home/user/data/georgia/tbilisi/footprints.geojson";
        let shown = truncate_path(path, 20);
        assert_eq!(shown, "...ootprints.geojson");
    }

    #[test]
    fn test_non_ascii_path_is_safe() {
        let path = "/данные/თბილისი/შენობები.geojson";
        let shown = truncate_path(path, 12);
        assert_eq!(shown.chars().count(), 12);
    }
}
