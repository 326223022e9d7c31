mod annotation_list;
mod create_form;
pub mod file_menu;
mod help;
mod intents;
mod popup;
mod settings_dialog;

pub use create_form::CreateFormState;
pub use intents::{is_external_route, NavigationLog};
pub use popup::PopupState;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::backend::BackendError;
use crate::config::{ConfigResetNotification, MissingFootprintsWarning};
use crate::map::{FootprintLoadError, PointerFeed};

/// Resource that tracks whether any modal dialog is currently open.
/// Map input handlers should check this to avoid feeding pointer events
/// while the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block map input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    create_form: Res<CreateFormState>,
    settings: Res<settings_dialog::SettingsDialogState>,
    help: Res<help::HelpWindowState>,
    missing_footprints: Res<MissingFootprintsWarning>,
    config_reset: Res<ConfigResetNotification>,
    footprint_error: Res<FootprintLoadError>,
    backend_error: Res<BackendError>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = create_form.is_open()
        || settings.is_open
        || settings.pending_browse.is_some()
        || help.is_open
        || missing_footprints.show
        || config_reset.show
        || footprint_error.message.is_some()
        || backend_error.message.is_some();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<PopupState>()
            .init_resource::<CreateFormState>()
            .init_resource::<NavigationLog>()
            .init_resource::<annotation_list::AnnotationListState>()
            .init_resource::<help::HelpWindowState>()
            .init_resource::<settings_dialog::SettingsDialogState>()
            // Intents queued by this frame's pointer events
            .add_systems(
                Update,
                (intents::consume_intents, popup::update_popup_dismissal)
                    .chain()
                    .after(PointerFeed),
            )
            .add_systems(Update, help::handle_help_shortcut)
            // Side panels must render first so top panels fit between them
            .add_systems(EguiPrimaryContextPass, annotation_list::annotation_list_ui)
            .add_systems(
                EguiPrimaryContextPass,
                (file_menu::menu_bar_ui, file_menu::status_bar_ui)
                    .chain()
                    .after(annotation_list::annotation_list_ui),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    // Last: floating windows and dialogs
                    popup::annotation_popup_ui,
                    create_form::create_form_ui,
                    settings_dialog::settings_dialog_ui,
                    help::help_popup_ui,
                    file_menu::missing_footprints_warning_ui,
                    file_menu::config_reset_notification_ui,
                    file_menu::error_dialogs_ui,
                )
                    .after(file_menu::menu_bar_ui),
            )
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
