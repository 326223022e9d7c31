use bevy::camera::visibility::RenderLayers;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::constants::{MAX_CAMERA_SCALE, MIN_CAMERA_SCALE};
use crate::ui::DialogState;

use super::engine::AnnotationEngine;
use super::input::is_cursor_over_ui;
use super::picking::ViewportMapping;

#[derive(Component)]
pub struct MapCamera;

#[derive(Component)]
pub struct CameraZoom {
    pub scale: f32,
}

impl Default for CameraZoom {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Centre the camera on a world position (footprints loaded, building focused).
#[derive(Message)]
pub struct FocusCameraRequest {
    pub world: Vec2,
    pub scale: Option<f32>,
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        MapCamera,
        CameraZoom::default(),
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
        // Layer 0 = footprints, layer 1 = interaction overlays
        RenderLayers::from_layers(&[0, 1]),
    ));
}

/// Drag with the left or middle button to pan. A drag only pans when it started
/// on the map, not on a panel or dialog. The engine separately decides whether
/// the same gesture still counts as a click.
pub fn camera_pan(
    mut contexts: EguiContexts,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    dialog_state: Res<DialogState>,
    mut drag_on_map: Local<bool>,
    mut camera_query: Query<(&mut Transform, &CameraZoom), With<MapCamera>>,
) {
    const PAN_BUTTONS: [MouseButton; 2] = [MouseButton::Left, MouseButton::Middle];

    if mouse_button.any_just_pressed(PAN_BUTTONS) {
        *drag_on_map = !dialog_state.any_modal_open && !is_cursor_over_ui(&mut contexts);
    }
    if !*drag_on_map || !mouse_button.any_pressed(PAN_BUTTONS) {
        mouse_motion.clear();
        return;
    }

    let Ok((mut transform, zoom)) = camera_query.single_mut() else {
        return;
    };

    for event in mouse_motion.read() {
        let delta = event.delta * zoom.scale;
        transform.translation.x -= delta.x;
        transform.translation.y += delta.y;
    }
}

pub fn camera_zoom(
    mut contexts: EguiContexts,
    mut scroll_events: MessageReader<MouseWheel>,
    dialog_state: Res<DialogState>,
    mut camera_query: Query<&mut CameraZoom, With<MapCamera>>,
) {
    // Scrolling a panel must not zoom the map underneath it
    if dialog_state.any_modal_open || is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }
    let Ok(mut zoom) = camera_query.single_mut() else {
        return;
    };

    for event in scroll_events.read() {
        zoom.scale = zoomed_scale(zoom.scale, event.unit, event.y);
    }
}

/// Multiplicative so zooming feels the same at street and city scale.
pub fn zoomed_scale(scale: f32, unit: MouseScrollUnit, amount: f32) -> f32 {
    let step = match unit {
        MouseScrollUnit::Line => amount * 0.1,
        MouseScrollUnit::Pixel => amount * 0.001,
    };
    (scale * (1.0 - step)).clamp(MIN_CAMERA_SCALE, MAX_CAMERA_SCALE)
}

pub fn apply_camera_zoom(
    mut camera_query: Query<(&CameraZoom, &mut Projection), (With<MapCamera>, Changed<CameraZoom>)>,
) {
    for (zoom, mut projection) in camera_query.iter_mut() {
        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = zoom.scale;
        }
    }
}

pub fn focus_camera(
    mut events: MessageReader<FocusCameraRequest>,
    mut camera_query: Query<(&mut Transform, &mut CameraZoom), With<MapCamera>>,
) {
    let Ok((mut transform, mut zoom)) = camera_query.single_mut() else {
        return;
    };

    for event in events.read() {
        transform.translation.x = event.world.x;
        transform.translation.y = event.world.y;
        if let Some(scale) = event.scale {
            zoom.scale = scale.clamp(MIN_CAMERA_SCALE, MAX_CAMERA_SCALE);
        }
    }
}

/// Copy the camera's current view into the provider so screen-space picks match
/// what is on screen this frame.
pub fn sync_viewport(
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Transform, &CameraZoom), With<MapCamera>>,
    mut engine: ResMut<AnnotationEngine>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((transform, zoom)) = camera_query.single() else {
        return;
    };

    let viewport = ViewportMapping {
        camera_position: transform.translation.truncate(),
        scale: zoom.scale,
        window_size: window.size(),
    };
    if engine.driver.provider().viewport() != &viewport {
        engine.driver.provider_mut().set_viewport(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_multiplicative() {
        let closer = zoomed_scale(2.0, MouseScrollUnit::Line, 1.0);
        assert!((closer - 1.8).abs() < 1e-6);
        let farther = zoomed_scale(2.0, MouseScrollUnit::Line, -1.0);
        assert!((farther - 2.2).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_is_clamped() {
        assert_eq!(
            zoomed_scale(MIN_CAMERA_SCALE, MouseScrollUnit::Line, 5.0),
            MIN_CAMERA_SCALE
        );
        assert_eq!(
            zoomed_scale(MAX_CAMERA_SCALE, MouseScrollUnit::Pixel, -500.0),
            MAX_CAMERA_SCALE
        );
    }
}
