use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backend::BackendTarget;
use crate::constants::DEFAULT_POPUP_DISMISS_DELAY_MS;
use crate::engine::{EngineConfig, DEFAULT_DRAG_THRESHOLD_PX, DEFAULT_ROUTE_TEMPLATE};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// System set for config changes made during a frame (readers of the new values run after)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigUpdate;

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// GeoJSON footprints shown on the map (reopened on startup)
    #[serde(default)]
    pub footprints_path: Option<PathBuf>,

    /// Base URL of the annotation REST backend. Takes precedence over `annotations_file`.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Local JSON file of annotation records, used when no backend URL is set
    #[serde(default)]
    pub annotations_file: Option<PathBuf>,

    /// Pointer travel (logical px) after which a press becomes a map drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: f32,

    /// Route opened when clicking an already selected building; `{id}` is substituted
    #[serde(default = "default_route_template")]
    pub navigate_route_template: String,

    /// How long a hover popup lingers after the pointer leaves its building
    #[serde(default = "default_popup_dismiss_delay")]
    pub popup_dismiss_delay_ms: u64,
}

fn default_drag_threshold() -> f32 {
    DEFAULT_DRAG_THRESHOLD_PX
}

fn default_route_template() -> String {
    DEFAULT_ROUTE_TEMPLATE.to_string()
}

fn default_popup_dismiss_delay() -> u64 {
    DEFAULT_POPUP_DISMISS_DELAY_MS
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            footprints_path: None,
            backend_url: None,
            annotations_file: None,
            drag_threshold_px: default_drag_threshold(),
            navigate_route_template: default_route_template(),
            popup_dismiss_delay_ms: default_popup_dismiss_delay(),
        }
    }
}

impl AppConfigData {
    pub fn engine_config(&self) -> EngineConfig {
        let route_template = if self.navigate_route_template.trim().is_empty() {
            default_route_template()
        } else {
            self.navigate_route_template.clone()
        };
        EngineConfig {
            drag_threshold_px: self.drag_threshold_px,
            route_template,
        }
    }

    /// Where annotation records are loaded from and persisted to.
    pub fn backend_target(&self) -> BackendTarget {
        match self.backend_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => BackendTarget::Http {
                base_url: url.trim_end_matches('/').to_string(),
            },
            _ => BackendTarget::File {
                path: self
                    .annotations_file
                    .clone()
                    .unwrap_or_else(crate::paths::default_annotations_file),
            },
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource for the "footprints file missing" warning dialog
#[derive(Resource, Default)]
pub struct MissingFootprintsWarning {
    pub show: bool,
    pub path: Option<PathBuf>,
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember the footprints file that was just opened
#[derive(Message)]
pub struct UpdateFootprintsPathRequest {
    pub path: PathBuf,
}

/// Message to switch where annotation records live
#[derive(Message)]
pub struct SetBackendRequest {
    pub backend_url: Option<String>,
    pub annotations_file: Option<PathBuf>,
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

fn parse_config(json: &str) -> Result<AppConfigData, String> {
    serde_json::from_str(json).map_err(|e| format!("Configuration file was corrupted: {}", e))
}

/// Load configuration from disk
fn load_config(config_path: &std::path::Path) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: AppConfigData::default(),
            reset_reason: None,
        };
    }

    let parsed = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Could not read configuration file: {}", e))
        .and_then(|json| parse_config(&json));

    match parsed {
        Ok(data) => {
            info!("Loaded config from {:?}", config_path);
            LoadConfigResult {
                data,
                reset_reason: None,
            }
        }
        Err(reason) => {
            warn!("{}", reason);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(reason),
            }
        }
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.data;
    config.dirty = false;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Startup system to check if the last footprints file still exists
fn check_footprints_exist(config: Res<AppConfig>, mut warning: ResMut<MissingFootprintsWarning>) {
    if let Some(ref path) = config.data.footprints_path
        && !path.exists()
    {
        warning.show = true;
        warning.path = Some(path.clone());
        info!("Last opened footprints no longer exist: {:?}", path);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

fn update_footprints_path_system(
    mut events: MessageReader<UpdateFootprintsPathRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.footprints_path.as_ref() == Some(&event.path) {
            continue;
        }
        config.data.footprints_path = Some(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

fn set_backend_system(
    mut events: MessageReader<SetBackendRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.backend_url = event
            .backend_url
            .as_ref()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        config.data.annotations_file = event.annotations_file.clone();
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Annotation backend set to {}", config.data.backend_target());
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<MissingFootprintsWarning>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<UpdateFootprintsPathRequest>()
            .add_message::<SetBackendRequest>()
            .add_systems(
                Startup,
                (load_config_system, check_footprints_exist)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    update_footprints_path_system.run_if(on_message::<UpdateFootprintsPathRequest>),
                    set_backend_system.run_if(on_message::<SetBackendRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain()
                    .in_set(ConfigUpdate),
            );
    }
}
