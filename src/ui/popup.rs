//! Floating popup for the hovered or selected annotated building.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::AppConfig;
use crate::engine::{AnnotationRecord, BuildingId, InteractionState, ScreenPoint};
use crate::map::AnnotationEngine;
use crate::theme;

/// Offset from the pointer so the popup never sits under it
const POPUP_CURSOR_OFFSET: f32 = 16.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub id: BuildingId,
    pub record: AnnotationRecord,
    pub screen: ScreenPoint,
}

#[derive(Resource, Default)]
pub struct PopupState {
    content: Option<PopupContent>,
    /// Elapsed-time instant (seconds) at which the popup closes
    dismiss_at: Option<f64>,
    /// Whether the pointer was over the popup window last frame
    pub pointer_over: bool,
}

impl PopupState {
    pub fn show(&mut self, id: BuildingId, record: AnnotationRecord, screen: ScreenPoint) {
        self.content = Some(PopupContent { id, record, screen });
        self.dismiss_at = None;
    }

    pub fn close(&mut self) {
        self.content = None;
        self.dismiss_at = None;
        self.pointer_over = false;
    }

    pub fn content(&self) -> Option<&PopupContent> {
        self.content.as_ref()
    }

    /// Advance the dismissal debounce.
    ///
    /// `active` is the building the engine currently hovers or selects. The popup
    /// stays while it matches or while the pointer rests on the popup itself;
    /// otherwise it closes `delay_secs` after the first frame it stopped matching.
    pub fn tick(&mut self, active: Option<&BuildingId>, now: f64, delay_secs: f64) {
        let Some(content) = &self.content else {
            return;
        };
        if self.pointer_over || active == Some(&content.id) {
            self.dismiss_at = None;
            return;
        }
        let at = *self.dismiss_at.get_or_insert(now + delay_secs);
        if now >= at {
            self.close();
        }
    }
}

pub fn update_popup_dismissal(
    mut popup: ResMut<PopupState>,
    engine: Res<AnnotationEngine>,
    config: Res<AppConfig>,
    time: Res<Time>,
) {
    let delay_secs = config.data.popup_dismiss_delay_ms as f64 / 1000.0;
    popup.tick(engine.driver.state().visual_id(), time.elapsed_secs_f64(), delay_secs);
}

pub fn annotation_popup_ui(
    mut contexts: EguiContexts,
    mut popup: ResMut<PopupState>,
    engine: Res<AnnotationEngine>,
) -> Result {
    let Some(content) = popup.content().cloned() else {
        return Ok(());
    };

    let selected = matches!(
        engine.driver.state(),
        InteractionState::Selected(id) if *id == content.id
    );
    let mut should_close = false;

    let response = egui::Window::new(content.record.title.as_str())
        .id(egui::Id::new("annotation_popup"))
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .max_width(320.0)
        .fixed_pos(egui::pos2(
            content.screen.x + POPUP_CURSOR_OFFSET,
            content.screen.y + POPUP_CURSOR_OFFSET,
        ))
        .show(contexts.ctx_mut()?, |ui| {
            ui.label(
                egui::RichText::new(content.record.title.as_str())
                    .strong()
                    .size(15.0)
                    .color(theme::ui::ANNOTATION_TITLE),
            );
            ui.label(
                egui::RichText::new(format!("Building {}", content.id))
                    .small()
                    .weak(),
            );

            if !content.record.description.is_empty() {
                ui.add_space(4.0);
                ui.label(content.record.description.as_str());
            }

            if !content.record.media.is_empty() {
                ui.add_space(4.0);
                for url in &content.record.media {
                    if ui.link(url.as_str()).on_hover_text("Open in browser").clicked()
                        && let Err(e) = open::that(url)
                    {
                        warn!("Failed to open {}: {}", url, e);
                    }
                }
            }

            if selected {
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "Click again to open {}",
                            engine.driver.route_for(&content.id)
                        ))
                        .small()
                        .color(theme::ui::HINT_TEXT),
                    );
                    if ui.small_button("Close").clicked() {
                        should_close = true;
                    }
                });
            }
        });

    popup.pointer_over = response
        .map(|inner| inner.response.contains_pointer())
        .unwrap_or(false);
    if should_close {
        popup.close();
    }

    Ok(())
}
