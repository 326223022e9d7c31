//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels (also the viewport size before the first resize)
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels (also the viewport size before the first resize)
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Closest zoom, in world metres per screen pixel
pub const MIN_CAMERA_SCALE: f32 = 0.05;

/// Farthest zoom, in world metres per screen pixel
pub const MAX_CAMERA_SCALE: f32 = 50.0;

/// How long a hover popup lingers after the pointer leaves its building
pub const DEFAULT_POPUP_DISMISS_DELAY_MS: u64 = 300;
