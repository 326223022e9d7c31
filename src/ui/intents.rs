//! Routes engine intents to the windows that present them.

use bevy::prelude::*;

use crate::engine::{InteractionState, UiIntent};
use crate::map::{AnnotationEngine, FocusCameraRequest};

use super::create_form::CreateFormState;
use super::popup::PopupState;

/// Last in-app route produced by clicking a selected building.
#[derive(Resource, Default)]
pub struct NavigationLog {
    pub last_route: Option<String>,
}

/// Routes that leave the application and open in the system browser.
pub fn is_external_route(route: &str) -> bool {
    let route = route.trim_start().to_ascii_lowercase();
    route.starts_with("http://") || route.starts_with("https://")
}

pub fn consume_intents(
    mut engine: ResMut<AnnotationEngine>,
    mut popup: ResMut<PopupState>,
    mut create_form: ResMut<CreateFormState>,
    mut navigation: ResMut<NavigationLog>,
    mut focus_events: MessageWriter<FocusCameraRequest>,
) {
    let intents: Vec<UiIntent> = engine.driver.drain_intents().collect();
    for intent in intents {
        match intent {
            UiIntent::ShowPopup { id, record, screen } => popup.show(id, record, screen),
            UiIntent::OpenCreateForm { id, anchor, screen } => {
                popup.close();
                create_form.open(id, anchor, screen);
            }
            UiIntent::Navigate { route } => {
                if is_external_route(&route) {
                    info!("Opening {}", route);
                    if let Err(e) = open::that(&route) {
                        warn!("Failed to open {}: {}", route, e);
                    }
                } else {
                    info!("Navigate to {}", route);
                    if let InteractionState::Selected(id) = engine.driver.state()
                        && let Some(footprint) = engine.driver.provider().find(id)
                    {
                        focus_events.write(FocusCameraRequest {
                            world: footprint.center(),
                            scale: None,
                        });
                    }
                }
                navigation.last_route = Some(route);
            }
        }
    }
}
