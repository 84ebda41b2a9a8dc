// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted preferences for the geometry receiver service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Config key the receiver prefs are stored under.
pub const RECEIVER_PREFS_KEY: &str = "receiver";

/// Default packet payload cap; the wire decoder's own limit.
pub use vantage_proto::wire::DEFAULT_MAX_PAYLOAD as DEFAULT_MAX_PAYLOAD_BYTES;

/// Default Unix socket path: `$XDG_RUNTIME_DIR/vantage-receiver.sock`, or
/// under `/tmp` when the runtime dir is unset.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map_or_else(|| PathBuf::from("/tmp"), PathBuf::from)
        .join("vantage-receiver.sock")
}

/// Saved receiver settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverPrefs {
    /// Unix socket the receiver listens on.
    pub socket_path: String,
    /// Largest accepted packet payload in bytes.
    pub max_payload_bytes: usize,
}

impl Default for ReceiverPrefs {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path().display().to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ReceiverPrefs {
    /// Apply command-line overrides on top of the stored values.
    #[must_use]
    pub fn with_overrides(mut self, socket_path: Option<PathBuf>, max_payload: Option<usize>) -> Self {
        if let Some(path) = socket_path {
            self.socket_path = path.display().to_string();
        }
        if let Some(max) = max_payload {
            self.max_payload_bytes = max;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ReceiverPrefs = serde_json::from_str(r#"{"socket_path":"/run/v.sock"}"#).unwrap();
        assert_eq!(prefs.socket_path, "/run/v.sock");
        assert_eq!(prefs.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn overrides_win_over_stored_values() {
        let prefs = ReceiverPrefs::default()
            .with_overrides(Some(PathBuf::from("/tmp/x.sock")), Some(1024));
        assert_eq!(prefs.socket_path, "/tmp/x.sock");
        assert_eq!(prefs.max_payload_bytes, 1024);

        let kept = prefs.clone().with_overrides(None, None);
        assert_eq!(kept, prefs);
    }

    #[test]
    fn default_cap_matches_the_wire_decoder() {
        assert_eq!(
            ReceiverPrefs::default().max_payload_bytes,
            vantage_proto::wire::DEFAULT_MAX_PAYLOAD
        );
    }

    #[test]
    fn default_socket_lives_in_a_runtime_dir() {
        let path = default_socket_path();
        assert!(path.ends_with("vantage-receiver.sock"));
    }
}
