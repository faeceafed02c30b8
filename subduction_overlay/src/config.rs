// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composer configuration.
//!
//! [`ComposerConfig`] holds the hardware capabilities and policy switches the
//! strategies consult. Start from a preset ([`ComposerConfig::mdss`] or
//! [`ComposerConfig::legacy`]) and optionally override it from a
//! [`PropertySource`] with [`ComposerConfig::apply_properties`].
//!
//! | key                           | effect                                  |
//! |-------------------------------|-----------------------------------------|
//! | `overlay.enable`              | enables offload at all                  |
//! | `overlay.mixed_mode.disable`  | disables cache- and load-based offload  |
//! | `overlay.debug_logs`          | enables per-frame debug logging         |
//! | `overlay.max_pipes_per_mixer` | lowers the per-mixer pipe ceiling       |
//! | `overlay.idle_time_ms`        | idle timeout; negative disables the timer |

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::time::Duration;

use crate::pipe::MAX_PIPES_PER_MIXER;

/// More app layers than this are always composed by the GPU.
pub const MAX_APP_LAYERS: usize = 32;

/// Offloaded layers allowed on a non-primary display.
pub const MAX_SECONDARY_LAYERS: usize = 1;

/// Idle timeout used when none is configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Property key enabling offload.
pub const PROP_ENABLE: &str = "overlay.enable";
/// Property key disabling partial (mixed) offload.
pub const PROP_MIXED_MODE_DISABLE: &str = "overlay.mixed_mode.disable";
/// Property key enabling debug logs.
pub const PROP_DEBUG_LOGS: &str = "overlay.debug_logs";
/// Property key overriding the per-mixer pipe ceiling.
pub const PROP_MAX_PIPES_PER_MIXER: &str = "overlay.max_pipes_per_mixer";
/// Property key for the idle timeout in milliseconds.
pub const PROP_IDLE_TIME_MS: &str = "overlay.idle_time_ms";

/// Source of string-valued configuration overrides.
pub trait PropertySource {
    /// Looks up `key`.
    fn property(&self, key: &str) -> Option<&str>;
}

impl PropertySource for [(&str, &str)] {
    fn property(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

impl<const N: usize> PropertySource for [(&str, &str); N] {
    fn property(&self, key: &str) -> Option<&str> {
        self.as_slice().property(key)
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Composer policy and hardware capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Offload at all. When `false` every frame is GPU-composed.
    pub enabled: bool,
    /// Allow partial offload (cache- and load-based strategies).
    pub mixed_mode: bool,
    /// Emit per-frame `log::debug!` output.
    pub debug_logs: bool,
    /// Pipes per mixer the strategies may plan for.
    pub max_pipes_per_mixer: usize,
    /// App layer ceiling; above it every frame is GPU-composed and not cached.
    pub max_app_layers: usize,
    /// Offloaded layer ceiling on non-primary displays.
    pub max_secondary_layers: usize,
    /// Idle fallback timeout. `None` disables the idle timer.
    pub idle_timeout: Option<Duration>,
    /// Maximum downscale ratio of a pipe.
    pub max_downscale: u32,
    /// Pipes can decimate, raising the effective downscale limit.
    pub supports_decimation: bool,
    /// Pipes can apply plane alpha while blending.
    pub supports_alpha_scale: bool,
    /// Unscaled RGB layers may use blit pipes.
    pub blit_for_unscaled: bool,
    /// Smallest crop width or height a pipe accepts.
    pub min_crop_dimension: u32,
}

impl ComposerConfig {
    /// Configuration for MDSS-class hardware.
    #[must_use]
    pub const fn mdss() -> Self {
        Self {
            enabled: true,
            mixed_mode: true,
            debug_logs: false,
            max_pipes_per_mixer: MAX_PIPES_PER_MIXER,
            max_app_layers: MAX_APP_LAYERS,
            max_secondary_layers: MAX_SECONDARY_LAYERS,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            max_downscale: 4,
            supports_decimation: true,
            supports_alpha_scale: true,
            blit_for_unscaled: true,
            min_crop_dimension: 5,
        }
    }

    /// Configuration for older parts without alpha scaling or blit pipes.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            supports_decimation: false,
            supports_alpha_scale: false,
            blit_for_unscaled: false,
            ..Self::mdss()
        }
    }

    /// Largest downscale a pipe accepts, decimation included.
    #[must_use]
    pub const fn effective_max_downscale(&self) -> u32 {
        if self.supports_decimation {
            64
        } else {
            self.max_downscale
        }
    }

    /// Overrides fields from string properties. Unknown or malformed values
    /// leave the field unchanged.
    pub fn apply_properties<P: PropertySource + ?Sized>(&mut self, props: &P) {
        if let Some(v) = props.property(PROP_ENABLE).and_then(parse_bool) {
            self.enabled = v;
        }
        if let Some(v) = props.property(PROP_MIXED_MODE_DISABLE).and_then(parse_bool) {
            self.mixed_mode = !v;
        }
        if let Some(v) = props.property(PROP_DEBUG_LOGS).and_then(parse_bool) {
            self.debug_logs = v;
        }
        if let Some(v) = props
            .property(PROP_MAX_PIPES_PER_MIXER)
            .and_then(|s| s.trim().parse::<usize>().ok())
        {
            self.max_pipes_per_mixer = v.min(MAX_PIPES_PER_MIXER);
        }
        if let Some(ms) = props
            .property(PROP_IDLE_TIME_MS)
            .and_then(|s| s.trim().parse::<i64>().ok())
        {
            self.idle_timeout = match u64::try_from(ms) {
                Ok(0) => Some(DEFAULT_IDLE_TIMEOUT),
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(_) => None,
            };
        }
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::mdss()
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s == "1" || s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s == "0" || s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
