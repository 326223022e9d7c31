//! Footprint outlines and interaction overlays, drawn with gizmos.

use bevy::camera::visibility::RenderLayers;
use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::engine::InteractionState;
use crate::theme;

use super::camera::{CameraZoom, MapCamera};
use super::engine::AnnotationEngine;

/// Building outlines (layer 0)
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct FootprintGizmoGroup;

/// Selection frame and pending anchor (layer 1, drawn over footprints)
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct OverlayGizmoGroup;

pub fn configure_map_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (footprint_config, _) = config_store.config_mut::<FootprintGizmoGroup>();
    footprint_config.render_layers = RenderLayers::layer(0);
    footprint_config.line.width = 1.5;

    let (overlay_config, _) = config_store.config_mut::<OverlayGizmoGroup>();
    overlay_config.render_layers = RenderLayers::layer(1);
    overlay_config.line.width = 2.5;
}

pub fn render_footprints(mut gizmos: Gizmos<FootprintGizmoGroup>, engine: Res<AnnotationEngine>) {
    let provider = engine.driver.provider();
    for footprint in provider.footprints() {
        let color = theme::footprint_color(provider.visual_state(&footprint.footprint.id));
        for ring in footprint.polygons.iter().flatten() {
            let Some(&first) = ring.first() else {
                continue;
            };
            let closing = (ring.last() != Some(&first)).then_some(first);
            gizmos.linestrip_2d(ring.iter().copied().chain(closing), color);
        }
    }
}

pub fn render_interaction_overlay(
    mut gizmos: Gizmos<OverlayGizmoGroup>,
    engine: Res<AnnotationEngine>,
    camera_query: Query<&CameraZoom, With<MapCamera>>,
) {
    let scale = camera_query.single().map(|zoom| zoom.scale).unwrap_or(1.0);
    let provider = engine.driver.provider();

    match engine.driver.state() {
        InteractionState::Selected(id) => {
            let Some(footprint) = provider.find(id) else {
                return;
            };
            let padding = Vec2::splat(6.0 * scale);
            gizmos.rect_2d(
                Isometry2d::from_translation(footprint.center()),
                footprint.max - footprint.min + padding * 2.0,
                theme::SELECTION_FRAME,
            );
        }
        InteractionState::Pending(pending) => {
            let anchor = provider.frame().to_world(pending.anchor);
            gizmos.circle_2d(
                Isometry2d::from_translation(anchor),
                5.0 * scale,
                theme::PENDING_ANCHOR,
            );
        }
        InteractionState::Idle | InteractionState::Hovering(_) => {}
    }
}
