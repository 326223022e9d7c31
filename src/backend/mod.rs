//! Loading and persisting annotation records.
//!
//! Records come from either a REST collection (`GET`/`POST {base}/annotations`)
//! or a local JSON file. All I/O runs on the IO task pool; the engine only ever
//! sees finished results.

mod operations;
mod state;
mod systems;


pub use operations::BackendTarget;
pub use state::{BackendError, BackendStatus, PersistAnnotationRequest, ReloadAnnotationsRequest};

use bevy::prelude::*;

use crate::config::{ConfigLoaded, ConfigUpdate};

pub struct BackendPlugin;

impl Plugin for BackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BackendError>()
            .init_resource::<BackendStatus>()
            .add_message::<ReloadAnnotationsRequest>()
            .add_message::<PersistAnnotationRequest>()
            .add_systems(Startup, systems::request_initial_load.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    systems::start_fetch_system.run_if(on_message::<ReloadAnnotationsRequest>),
                    systems::poll_fetch_tasks,
                    systems::queue_persist_system.run_if(on_message::<PersistAnnotationRequest>),
                    systems::dispatch_persist_system,
                    systems::poll_persist_tasks,
                )
                    .chain()
                    .after(ConfigUpdate),
            );
    }
}
