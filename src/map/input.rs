//! Translates Bevy window input into engine pointer events.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::engine::{Modifiers, PointerEvent, PointerEventKind, ScreenPoint};
use crate::ui::DialogState;

use super::engine::AnnotationEngine;

/// Where the pointer was last seen on the map surface.
#[derive(Resource, Default)]
pub struct PointerTracker {
    last_cursor: Option<Vec2>,
}

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Events for one frame of raw input.
///
/// `cursor` is `None` when the pointer is off the map surface (outside the window
/// or over UI). Order within a frame: leave or move first, then press, then
/// release followed by its click. A release off the map emits `Up` alone.
pub fn pointer_events_for_frame(
    previous: Option<Vec2>,
    cursor: Option<Vec2>,
    pressed: bool,
    released: bool,
    ctrl: bool,
) -> Vec<PointerEvent> {
    let Some(cursor) = cursor else {
        let last = previous.map(to_screen).unwrap_or_default();
        let mut events = Vec::new();
        if previous.is_some() {
            events.push(PointerEvent::new(PointerEventKind::Leave, last));
        }
        // Off-map release ends a drag but never clicks
        if released {
            events.push(PointerEvent::new(PointerEventKind::Up, last));
        }
        return events;
    };

    let screen = to_screen(cursor);
    let mut events = Vec::new();
    if previous != Some(cursor) {
        events.push(PointerEvent::new(PointerEventKind::Move, screen));
    }
    if pressed {
        events.push(PointerEvent::new(PointerEventKind::Down, screen));
    }
    if released {
        events.push(PointerEvent::new(PointerEventKind::Up, screen));
        events.push(PointerEvent::new(
            PointerEventKind::Click(Modifiers { ctrl }),
            screen,
        ));
    }
    events
}

fn to_screen(cursor: Vec2) -> ScreenPoint {
    ScreenPoint::new(cursor.x, cursor.y)
}

pub fn feed_pointer_events(
    mut contexts: EguiContexts,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    dialog_state: Res<DialogState>,
    mut tracker: ResMut<PointerTracker>,
    mut engine: ResMut<AnnotationEngine>,
) {
    let blocked = dialog_state.any_modal_open || is_cursor_over_ui(&mut contexts);
    let cursor = window_query
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .filter(|_| !blocked);

    // Cmd on macOS, Ctrl elsewhere
    let ctrl = keyboard.any_pressed([
        KeyCode::ControlLeft,
        KeyCode::ControlRight,
        KeyCode::SuperLeft,
        KeyCode::SuperRight,
    ]);

    let events = pointer_events_for_frame(
        tracker.last_cursor,
        cursor,
        mouse_button.just_pressed(MouseButton::Left),
        mouse_button.just_released(MouseButton::Left),
        ctrl,
    );
    tracker.last_cursor = cursor;

    for event in events {
        engine.driver.handle(event);
    }
}
