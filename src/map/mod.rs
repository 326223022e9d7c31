mod camera;
mod engine;
mod footprints;
mod input;
mod loading;
mod picking;
mod projection;
mod rendering;

pub use camera::FocusCameraRequest;
pub use engine::AnnotationEngine;
pub use loading::{FootprintLoadError, FootprintSource, LoadFootprintsRequest};

use bevy::prelude::*;

use crate::config::ConfigLoaded;

/// Systems that feed pointer input into the engine. Intent consumers run after this.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerFeed;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnnotationEngine>()
            .init_resource::<input::PointerTracker>()
            .init_resource::<FootprintLoadError>()
            .init_resource::<FootprintSource>()
            .init_gizmo_group::<rendering::FootprintGizmoGroup>()
            .init_gizmo_group::<rendering::OverlayGizmoGroup>()
            .add_message::<LoadFootprintsRequest>()
            .add_message::<FocusCameraRequest>()
            .add_systems(
                Startup,
                (camera::spawn_camera, rendering::configure_map_gizmos),
            )
            .add_systems(
                Startup,
                (engine::configure_engine, loading::request_initial_footprints)
                    .chain()
                    .after(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::focus_camera.run_if(on_message::<FocusCameraRequest>),
                    camera::apply_camera_zoom,
                    camera::sync_viewport,
                    input::feed_pointer_events.in_set(PointerFeed),
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    loading::load_footprints_system.run_if(on_message::<LoadFootprintsRequest>),
                    loading::poll_footprint_tasks,
                ),
            )
            .add_systems(
                Update,
                (
                    rendering::render_footprints,
                    rendering::render_interaction_overlay,
                )
                    .after(PointerFeed),
            );
    }
}
