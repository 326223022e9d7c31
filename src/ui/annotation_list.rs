//! Left side panel listing every annotated building.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::backend::BackendStatus;
use crate::engine::{AnnotationRecord, BuildingId, InteractionState};
use crate::map::{AnnotationEngine, FocusCameraRequest};
use crate::theme;

#[derive(Resource, Default)]
pub struct AnnotationListState {
    pub filter: String,
}

/// Records whose title, description or id contain `filter` (case-insensitive),
/// ordered by title.
pub fn filtered_records<'a>(
    records: impl IntoIterator<Item = &'a AnnotationRecord>,
    filter: &str,
) -> Vec<&'a AnnotationRecord> {
    let needle = filter.trim().to_lowercase();
    let mut matches: Vec<&AnnotationRecord> = records
        .into_iter()
        .filter(|record| {
            needle.is_empty()
                || record.title.to_lowercase().contains(&needle)
                || record.description.to_lowercase().contains(&needle)
                || record.id.to_string().to_lowercase().contains(&needle)
        })
        .collect();
    matches.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
    });
    matches
}

pub fn annotation_list_ui(
    mut contexts: EguiContexts,
    mut list_state: ResMut<AnnotationListState>,
    engine: Res<AnnotationEngine>,
    status: Res<BackendStatus>,
    mut focus_events: MessageWriter<FocusCameraRequest>,
) -> Result {
    let mut focus: Option<BuildingId> = None;

    egui::SidePanel::left("annotation_list")
        .default_width(220.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.heading("Annotations");

            let count = engine.driver.store().len();
            let summary = if status.is_loading {
                "Loading...".to_string()
            } else {
                format!("{} buildings annotated", count)
            };
            ui.label(egui::RichText::new(summary).small().weak());

            ui.add_space(4.0);
            ui.add(
                egui::TextEdit::singleline(&mut list_state.filter)
                    .desired_width(f32::INFINITY)
                    .hint_text("Filter"),
            );
            ui.separator();

            let selected = match engine.driver.state() {
                InteractionState::Selected(id) => Some(id),
                _ => None,
            };

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let records =
                        filtered_records(engine.driver.store().records(), &list_state.filter);
                    if records.is_empty() {
                        ui.label(
                            egui::RichText::new("No annotations")
                                .italics()
                                .color(theme::ui::HINT_TEXT),
                        );
                    }
                    for record in records {
                        let is_selected = selected == Some(&record.id);
                        let response = ui
                            .selectable_label(is_selected, record.title.as_str())
                            .on_hover_text(format!("Building {}", record.id));
                        if response.clicked() {
                            focus = Some(record.id.clone());
                        }
                    }
                });
        });

    if let Some(id) = focus {
        let provider = engine.driver.provider();
        let world = match (provider.find(&id), engine.driver.get_annotation(&id)) {
            (Some(footprint), _) => Some(footprint.center()),
            // Annotated but not in the loaded footprints
            (None, Some(record)) => Some(provider.frame().to_world(record.anchor)),
            (None, None) => None,
        };
        if let Some(world) = world {
            focus_events.write(FocusCameraRequest { world, scale: None });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GeoPoint;

    fn record(id: BuildingId, title: &str, description: &str) -> AnnotationRecord {
        AnnotationRecord {
            id,
            anchor: GeoPoint::new(41.7, 44.8),
            title: title.to_string(),
            description: description.to_string(),
            media: Vec::new(),
        }
    }

    #[test]
    fn test_records_sorted_by_title() {
        let records = vec![
            record(BuildingId::Int(2), "library", ""),
            record(BuildingId::Int(1), "Bathhouse", ""),
            record(BuildingId::Int(3), "Church", ""),
        ];
        let titles: Vec<&str> = filtered_records(&records, "")
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Bathhouse", "Church", "library"]);
    }

    #[test]
    fn test_filter_matches_title_description_and_id() {
        let records = vec![
            record(BuildingId::Int(42), "Bathhouse", "Sulfur baths"),
            record(BuildingId::from("way/17"), "Library", "Public reading room"),
        ];
        assert_eq!(filtered_records(&records, "SULFUR").len(), 1);
        assert_eq!(filtered_records(&records, "way/").len(), 1);
        assert_eq!(filtered_records(&records, "42")[0].title, "Bathhouse");
        assert!(filtered_records(&records, "museum").is_empty());
    }
}
