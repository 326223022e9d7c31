//! Centralized color theme for the map view and UI.
//!
//! Modify values here to change the application's color scheme.

use bevy::prelude::Color;

use crate::engine::VisualState;

// ============================================================================
// Footprint Colors
// ============================================================================

/// Plain building outline
pub const FOOTPRINT_DEFAULT: Color = Color::srgba(0.6, 0.62, 0.66, 0.7);

/// Building under the pointer
pub const FOOTPRINT_HIGHLIGHTED: Color = Color::srgb(0.3, 0.8, 1.0);

/// Annotated (or currently selected) building
pub const FOOTPRINT_SELECTED: Color = Color::srgb(0.95, 0.7, 0.2);

/// Annotated building under the pointer
pub const FOOTPRINT_SELECTED_HIGHLIGHTED: Color = Color::srgb(1.0, 0.9, 0.45);

// ============================================================================
// Interaction Overlays
// ============================================================================

/// Frame around the building whose popup is pinned
pub const SELECTION_FRAME: Color = Color::srgba(1.0, 0.9, 0.45, 0.9);

/// Marker where a new annotation will be anchored
pub const PENDING_ANCHOR: Color = Color::srgb(0.4, 1.0, 0.5);

/// Outline color for a building's current feature state.
pub fn footprint_color(state: VisualState) -> Color {
    match (state.highlighted, state.selected) {
        (true, true) => FOOTPRINT_SELECTED_HIGHLIGHTED,
        (true, false) => FOOTPRINT_HIGHLIGHTED,
        (false, true) => FOOTPRINT_SELECTED,
        (false, false) => FOOTPRINT_DEFAULT,
    }
}

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;

    /// Gold heading for annotated buildings
    pub const ANNOTATION_TITLE: egui::Color32 = egui::Color32::from_rgb(242, 178, 51);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_color_follows_flags() {
        let plain = VisualState::default();
        assert_eq!(footprint_color(plain), FOOTPRINT_DEFAULT);

        let hovered = VisualState {
            highlighted: true,
            selected: false,
        };
        assert_eq!(footprint_color(hovered), FOOTPRINT_HIGHLIGHTED);

        let annotated = VisualState {
            highlighted: false,
            selected: true,
        };
        assert_eq!(footprint_color(annotated), FOOTPRINT_SELECTED);

        let both = VisualState {
            highlighted: true,
            selected: true,
        };
        assert_eq!(footprint_color(both), FOOTPRINT_SELECTED_HIGHLIGHTED);
    }
}
