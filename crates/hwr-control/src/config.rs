// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Render thread configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the render thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderThreadConfig {
    /// Name given to the OS thread, also used when attaching to the caller
    /// runtime.
    pub thread_name: String,
    /// Display refresh rate in Hz. Render-thread frames are paced on it.
    pub frame_rate_hz: u32,
    /// When disabled, render-thread frames run as soon as they are requested.
    pub vsync_enabled: bool,
}

impl RenderThreadConfig {
    /// Parses a JSON document. Missing fields keep their default.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Time between two vsync ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            thread_name: "RenderThread".to_owned(),
            frame_rate_hz: 60,
            vsync_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RenderThreadConfig::from_json_str(r#"{ "frame_rate_hz": 120 }"#).unwrap();
        assert_eq!(config.frame_rate_hz, 120);
        assert_eq!(config.thread_name, "RenderThread");
        assert!(config.vsync_enabled);
    }

    #[test]
    fn zero_rate_does_not_divide_by_zero() {
        let config = RenderThreadConfig {
            frame_rate_hz: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RenderThreadConfig::from_json_str("{ nope").is_err());
    }
}
