//! Form for annotating a building that has no record yet (ctrl-click flow).

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::backend::PersistAnnotationRequest;
use crate::engine::{AnnotationRecord, BuildingId, GeoPoint, ScreenPoint};
use crate::map::AnnotationEngine;
use crate::theme;

/// The building the open form is for.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingForm {
    pub id: BuildingId,
    pub anchor: GeoPoint,
    pub screen: ScreenPoint,
}

#[derive(Resource, Default)]
pub struct CreateFormState {
    form: Option<PendingForm>,
    pub title: String,
    pub description: String,
    /// Media URLs, one per line
    pub media: String,
    /// Validation or engine error from the last submit
    pub error: Option<String>,
}

impl CreateFormState {
    pub fn open(&mut self, id: BuildingId, anchor: GeoPoint, screen: ScreenPoint) {
        self.form = Some(PendingForm { id, anchor, screen });
        self.title.clear();
        self.description.clear();
        self.media.clear();
        self.error = None;
    }

    pub fn close(&mut self) {
        self.form = None;
        self.error = None;
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn pending(&self) -> Option<&PendingForm> {
        self.form.as_ref()
    }

    /// Record described by the current form fields.
    pub fn build_record(&self) -> Result<AnnotationRecord, String> {
        let form = self.form.as_ref().ok_or("No building is being annotated")?;
        let title = self.title.trim();
        if title.is_empty() {
            return Err("A title is required".to_string());
        }
        let media = self
            .media
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(AnnotationRecord {
            id: form.id.clone(),
            anchor: form.anchor,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            media,
        })
    }
}

pub fn create_form_ui(
    mut contexts: EguiContexts,
    mut form: ResMut<CreateFormState>,
    mut engine: ResMut<AnnotationEngine>,
    mut persist_events: MessageWriter<PersistAnnotationRequest>,
) -> Result {
    // The engine can leave the create flow on its own (footprints reloaded)
    if form.is_open() && !engine.driver.state().is_pending() {
        form.close();
    }
    let Some(pending) = form.pending().cloned() else {
        return Ok(());
    };

    let mut should_submit = false;
    let mut should_cancel = false;

    egui::Window::new("Annotate Building")
        .collapsible(false)
        .resizable(false)
        .default_width(320.0)
        .default_pos(egui::pos2(pending.screen.x + 16.0, pending.screen.y + 16.0))
        .show(contexts.ctx_mut()?, |ui| {
            ui.label(egui::RichText::new(format!("Building {}", pending.id)).strong());
            ui.label(
                egui::RichText::new(format!(
                    "{:.6}, {:.6}",
                    pending.anchor.lat, pending.anchor.lng
                ))
                .small()
                .weak(),
            );
            ui.add_space(8.0);

            ui.label("Title:");
            ui.add(
                egui::TextEdit::singleline(&mut form.title)
                    .desired_width(f32::INFINITY)
                    .hint_text("Required"),
            );

            ui.add_space(4.0);
            ui.label("Description:");
            ui.add(
                egui::TextEdit::multiline(&mut form.description)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );

            ui.add_space(4.0);
            ui.label("Media URLs (one per line):");
            ui.add(
                egui::TextEdit::multiline(&mut form.media)
                    .desired_rows(2)
                    .desired_width(f32::INFINITY),
            );

            if let Some(error) = &form.error {
                ui.add_space(4.0);
                ui.colored_label(theme::ui::ERROR_TEXT, error.as_str());
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let can_submit = !form.title.trim().is_empty();
                if ui
                    .add_enabled(can_submit, egui::Button::new("Save"))
                    .clicked()
                {
                    should_submit = true;
                }
                if ui.button("Cancel").clicked() {
                    should_cancel = true;
                }
            });
        });

    if should_submit {
        match form.build_record() {
            Ok(record) => match engine.driver.submit_create_form(record.clone()) {
                Ok(()) => {
                    info!("Annotated building {}", record.id);
                    persist_events.write(PersistAnnotationRequest { record });
                    form.close();
                }
                Err(e) => {
                    warn!("Annotation rejected: {}", e);
                    form.error = Some(e.to_string());
                }
            },
            Err(reason) => form.error = Some(reason),
        }
    } else if should_cancel {
        engine.driver.cancel_create_form();
        form.close();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> CreateFormState {
        let mut form = CreateFormState::default();
        form.open(
            BuildingId::Int(42),
            GeoPoint::new(41.71, 44.79),
            ScreenPoint::new(100.0, 80.0),
        );
        form
    }

    #[test]
    fn test_build_record_from_fields() {
        let mut form = opened();
        form.title = "  Old bathhouse ".to_string();
        form.description = "Built 1902".to_string();
        form.media = "https://example.com/a.jpg\n\n  https://example.com/b.jpg  \n".to_string();

        let record = form.build_record().unwrap();
        assert_eq!(record.id, BuildingId::Int(42));
        assert_eq!(record.anchor, GeoPoint::new(41.71, 44.79));
        assert_eq!(record.title, "Old bathhouse");
        assert_eq!(
            record.media,
            vec!["https://example.com/a.jpg", "https://example.com/b.jpg"]
        );
    }

    #[test]
    fn test_title_is_required() {
        let mut form = opened();
        form.title = "   ".to_string();
        assert_eq!(form.build_record().unwrap_err(), "A title is required");
    }

    #[test]
    fn test_closed_form_builds_nothing() {
        let form = CreateFormState::default();
        assert!(!form.is_open());
        assert!(form.build_record().is_err());
    }

    #[test]
    fn test_open_clears_previous_input() {
        let mut form = opened();
        form.title = "Leftover".to_string();
        form.error = Some("A title is required".to_string());
        form.open(
            BuildingId::from("way/17"),
            GeoPoint::new(0.0, 0.0),
            ScreenPoint::default(),
        );
        assert!(form.title.is_empty());
        assert!(form.error.is_none());
        assert_eq!(form.pending().map(|p| &p.id), Some(&BuildingId::from("way/17")));
    }
}
