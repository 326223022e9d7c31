use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{egui, EguiContexts};
use futures_lite::future;
use std::path::PathBuf;

use crate::backend::ReloadAnnotationsRequest;
use crate::config::{AppConfig, SetBackendRequest};

/// State for the backend settings dialog
#[derive(Resource, Default)]
pub struct SettingsDialogState {
    /// Whether the dialog is open
    pub is_open: bool,
    /// Edited backend URL (empty means use the local file)
    pub backend_url: String,
    /// Edited annotations file path (empty means the default location)
    pub annotations_file: String,
    /// Whether changes have been made
    pub has_changes: bool,
    /// Pending async file dialog for choosing the annotations file
    pub pending_browse: Option<Task<Option<PathBuf>>>,
}

impl SettingsDialogState {
    /// Initialize the dialog state from current config
    pub fn load_from_config(&mut self, config: &AppConfig) {
        self.backend_url = config.data.backend_url.clone().unwrap_or_default();
        self.annotations_file = config
            .data
            .annotations_file
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        self.has_changes = false;
    }

    /// The edited fields as a backend change request.
    pub fn to_request(&self) -> SetBackendRequest {
        let backend_url = Some(self.backend_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        let annotations_file = Some(self.annotations_file.trim())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        SetBackendRequest {
            backend_url,
            annotations_file,
        }
    }
}

/// Renders the backend settings dialog
pub fn settings_dialog_ui(
    mut contexts: EguiContexts,
    mut dialog_state: ResMut<SettingsDialogState>,
    config: Res<AppConfig>,
    mut backend_events: MessageWriter<SetBackendRequest>,
    mut reload_events: MessageWriter<ReloadAnnotationsRequest>,
) -> Result {
    // Poll pending browse task (before early return so cleanup happens even if closed)
    if let Some(ref mut task) = dialog_state.pending_browse
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        dialog_state.pending_browse = None;
        if let Some(path) = result {
            dialog_state.annotations_file = path.to_string_lossy().to_string();
            dialog_state.has_changes = true;
        }
    }

    if !dialog_state.is_open {
        return Ok(());
    }

    let mut should_close = false;
    let mut should_save = false;
    let mut should_browse = false;

    egui::Window::new("Annotation Backend")
        .collapsible(false)
        .resizable(true)
        .min_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.group(|ui| {
                ui.label(egui::RichText::new("REST Backend").strong());
                ui.add_space(8.0);

                let response = ui.add(
                    egui::TextEdit::singleline(&mut dialog_state.backend_url)
                        .desired_width(360.0)
                        .hint_text("http://localhost:8080/api"),
                );
                if response.changed() {
                    dialog_state.has_changes = true;
                }

                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(
                        "Records are read from and posted to {url}/annotations. Leave empty to use a local file.",
                    )
                    .weak()
                    .small(),
                );
            });

            ui.add_space(12.0);

            ui.group(|ui| {
                ui.label(egui::RichText::new("Local File").strong());
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut dialog_state.annotations_file)
                            .desired_width(280.0)
                            .hint_text(
                                crate::paths::default_annotations_file()
                                    .to_string_lossy()
                                    .to_string(),
                            ),
                    );
                    if response.changed() {
                        dialog_state.has_changes = true;
                    }

                    if ui.button("Browse...").clicked() {
                        should_browse = true;
                    }
                });
            });

            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(format!("Current: {}", config.data.backend_target()))
                    .weak()
                    .small(),
            );

            ui.add_space(16.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(dialog_state.has_changes, egui::Button::new("Save"))
                    .clicked()
                {
                    should_save = true;
                }

                if ui.button("Cancel").clicked() {
                    should_close = true;
                }
            });
        });

    // Handle browse button - spawn async dialog
    if should_browse && dialog_state.pending_browse.is_none() {
        let task_pool = AsyncComputeTaskPool::get();
        dialog_state.pending_browse = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Annotations File")
                .add_filter("JSON", &["json"])
                .set_file_name("annotations.json")
                .save_file()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    if should_save {
        backend_events.write(dialog_state.to_request());
        reload_events.write(ReloadAnnotationsRequest);
        dialog_state.has_changes = false;
        should_close = true;
    }

    if should_close {
        dialog_state.is_open = false;
        dialog_state.pending_browse = None;
        dialog_state.load_from_config(&config);
    }

    Ok(())
}
