//! Runtime configuration loaded from `.env`/environment.
//!
//! Reads:
//! - `AVATAR_DEFAULT_TOOL_MODE` (`avatar` | `model` | `camera`, default `avatar`)
//! - `AVATAR_POINTER_QUEUE_CAPACITY` (default 128, clamped to `1..=4096`)
//! - `AVATAR_DEFAULT_MODEL_URL` (default `/vrm/default.vrm`)
//! - `AVATAR_DEBUG_OVERLAY` (`1`/`true`/`on` or `0`/`false`/`off`, default on)

use serde::Serialize;

use super::pointer_queue::DEFAULT_POINTER_QUEUE_CAPACITY;
use super::tool_mode::ToolMode;

pub const DEFAULT_MODEL_URL: &str = "/vrm/default.vrm";
const MAX_POINTER_QUEUE_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub default_tool_mode: ToolMode,
    pub pointer_queue_capacity: usize,
    pub default_model_url: String,
    pub debug_overlay: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_tool_mode: ToolMode::Avatar,
            pointer_queue_capacity: DEFAULT_POINTER_QUEUE_CAPACITY,
            default_model_url: DEFAULT_MODEL_URL.to_string(),
            debug_overlay: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unknown or malformed values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_tool_mode = match lookup("AVATAR_DEFAULT_TOOL_MODE") {
            Some(raw) => ToolMode::parse(&raw).unwrap_or_else(|| {
                log::warn!(
                    "Ignoring AVATAR_DEFAULT_TOOL_MODE={:?}; using {}",
                    raw,
                    defaults.default_tool_mode
                );
                defaults.default_tool_mode
            }),
            None => defaults.default_tool_mode,
        };

        let pointer_queue_capacity = lookup("AVATAR_POINTER_QUEUE_CAPACITY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.pointer_queue_capacity)
            .clamp(1, MAX_POINTER_QUEUE_CAPACITY);

        let default_model_url = lookup("AVATAR_DEFAULT_MODEL_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.default_model_url);

        let debug_overlay = lookup("AVATAR_DEBUG_OVERLAY")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.debug_overlay);

        Self {
            default_tool_mode,
            pointer_queue_capacity,
            default_model_url,
            debug_overlay,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.default_tool_mode, ToolMode::Avatar);
        assert_eq!(config.pointer_queue_capacity, 128);
        assert_eq!(config.default_model_url, "/vrm/default.vrm");
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("AVATAR_DEFAULT_TOOL_MODE", "Camera"),
            ("AVATAR_POINTER_QUEUE_CAPACITY", "64"),
            ("AVATAR_DEFAULT_MODEL_URL", " /vrm/custom.vrm "),
            ("AVATAR_DEBUG_OVERLAY", "off"),
        ]));
        assert_eq!(config.default_tool_mode, ToolMode::Camera);
        assert_eq!(config.pointer_queue_capacity, 64);
        assert_eq!(config.default_model_url, "/vrm/custom.vrm");
        assert!(!config.debug_overlay);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("AVATAR_DEFAULT_TOOL_MODE", "brush"),
            ("AVATAR_POINTER_QUEUE_CAPACITY", "lots"),
            ("AVATAR_DEFAULT_MODEL_URL", "   "),
            ("AVATAR_DEBUG_OVERLAY", "maybe"),
        ]));
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_capacity_is_clamped() {
        let zero =
            RuntimeConfig::from_lookup(lookup_from(&[("AVATAR_POINTER_QUEUE_CAPACITY", "0")]));
        assert_eq!(zero.pointer_queue_capacity, 1);
        let huge =
            RuntimeConfig::from_lookup(lookup_from(&[("AVATAR_POINTER_QUEUE_CAPACITY", "100000")]));
        assert_eq!(huge.pointer_queue_capacity, 4096);
    }
}
