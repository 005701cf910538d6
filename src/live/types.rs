// Core live view data structures and types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::arbitration::LiveViewState;

/// Activity snapshot pushed by the external activity signal source
///
/// Read-only to the orchestrator; the adapter refreshes it continuously.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraActivity {
    pub active_motion: bool,
    pub active_tracking: bool,
    pub objects: Vec<TrackedObject>,
    pub offline: bool,
}

impl CameraActivity {
    /// Whether the camera currently shows activity (motion or tracked objects)
    pub fn is_active(&self) -> bool {
        self.active_motion || self.active_tracking
    }
}

/// A tracked object reported by the activity source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub label: String,
    pub sub_label: Option<String>,
}

impl TrackedObject {
    /// The label shown to the operator
    ///
    /// Labels ending in `-verified` resolve to their sub label; unverified
    /// labels display as-is.
    pub fn display_label(&self) -> Option<&str> {
        if self.label.ends_with("verified") {
            self.sub_label.as_deref()
        } else {
            Some(self.label.as_str())
        }
    }
}

/// Deduplicated, sorted display labels for a set of tracked objects
pub fn display_labels(objects: &[TrackedObject]) -> Vec<String> {
    objects
        .iter()
        .filter_map(TrackedObject::display_label)
        .filter(|label| !label.contains("-verified"))
        .map(|label| label.replace("-verified", ""))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Streaming transport variant preferred by the host view
///
/// Opaque to the orchestrator beyond dispatch; each variant carries an
/// incompatible transport strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    /// No live backend; the still-image path is always active
    None,
    Jsmpeg,
    Mse,
    WebRtc,
}

impl LiveMode {
    /// Static string form for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveMode::None => "none",
            LiveMode::Jsmpeg => "jsmpeg",
            LiveMode::Mse => "mse",
            LiveMode::WebRtc => "webrtc",
        }
    }
}

impl fmt::Display for LiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Browser media-decoding capability flags, probed once at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    pub media_source: bool,
    pub managed_media_source: bool,
}

impl MediaCapabilities {
    /// Whether the MSE transport can run in this environment
    pub fn supports_mse(&self) -> bool {
        self.media_source || self.managed_media_source
    }
}

/// Category of a backend playback failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackErrorKind {
    /// Backend never produced frames
    Startup,
    /// Playback began, then stopped advancing
    Stalled,
    /// Received data could not be decoded
    Decode,
}

/// Structured failure reported by a streaming backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackError {
    pub kind: PlaybackErrorKind,
    pub message: String,
}

impl PlaybackError {
    pub fn new(kind: PlaybackErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Still-image polling cadence in milliseconds; `-1` disables polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshInterval(pub i64);

impl RefreshInterval {
    /// Never refresh the still image
    pub const DISABLED: RefreshInterval = RefreshInterval(-1);

    /// The interval in milliseconds, `-1` when disabled
    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn is_disabled(&self) -> bool {
        self.0 < 0
    }
}

/// The presentation surface currently visible to the operator
///
/// At most one surface is visible at any instant; a hidden surface may stay
/// mounted to avoid re-fetch cost on toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    /// The periodically refreshed still image
    Still,
    /// The real-time stream
    Live,
    /// Neither: still display is disabled and live is not ready
    Placeholder,
}

/// Snapshot of the orchestrator's outward-facing state
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub surface: Surface,
    pub still_refresh: RefreshInterval,
    pub live_ready: bool,
    pub offline: bool,
    pub state: LiveViewState,
    pub audio_enabled: bool,
}

/// Inbound events driving the orchestrator
///
/// Every state transition originates from one of these or a timer expiry.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The activity source pushed a fresh snapshot
    ActivityChanged(CameraActivity),
    /// Viewer visibility changed (tab/window shown or hidden)
    VisibilityChanged(bool),
    /// The host switched the preferred streaming transport
    PreferredModeChanged(LiveMode),
    /// The viewer explicitly forced live playback
    ForceLive,
    /// The selected backend began rendering real frames
    BackendPlaying { generation: u64 },
    /// The selected backend failed unrecoverably
    BackendError {
        generation: u64,
        error: PlaybackError,
    },
    /// The viewer toggled the per-camera audio preference
    ToggleAudio,
    /// First-class user gesture, used for the autoplay unlock workaround
    PointerDown,
}

/// Outbound notifications surfaced to the host view
#[derive(Debug, Clone, PartialEq)]
pub enum HostNotice {
    /// A backend reported an unrecoverable playback failure
    PlaybackError(PlaybackError),
    /// A hysteresis-timed fallback to the still surface completed
    LiveModeReset,
}

/// Static configuration for one live view
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Camera identity, used to scope persisted preferences
    pub camera: String,
    pub preferred_mode: LiveMode,
    /// Show the still image when no activity is present
    pub show_still_without_activity: bool,
    pub window_visible: bool,
    /// Caller-supplied default for the audio preference
    pub play_audio: bool,
    /// Microphone passthrough; only the WebRTC transport supports it
    pub mic_enabled: bool,
    /// Whether activity alone promotes the view to live
    pub auto_live: bool,
    /// Bypass the persisted audio preference entirely
    pub override_local_audio: bool,
    pub capabilities: MediaCapabilities,
}

impl ViewConfig {
    /// Configuration with the defaults the host view assumes
    pub fn new(camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            preferred_mode: LiveMode::None,
            show_still_without_activity: true,
            window_visible: true,
            play_audio: true,
            mic_enabled: false,
            auto_live: true,
            override_local_audio: false,
            capabilities: MediaCapabilities::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_labels_resolve_to_sub_label() {
        let objects = vec![
            TrackedObject {
                label: "face-verified".into(),
                sub_label: Some("alice".into()),
            },
            TrackedObject {
                label: "person".into(),
                sub_label: None,
            },
            TrackedObject {
                label: "person".into(),
                sub_label: None,
            },
        ];

        assert_eq!(display_labels(&objects), vec!["alice", "person"]);
    }

    #[test]
    fn activity_requires_motion_or_tracking() {
        let mut activity = CameraActivity::default();
        assert!(!activity.is_active());

        activity.active_motion = true;
        assert!(activity.is_active());

        activity.active_motion = false;
        activity.active_tracking = true;
        assert!(activity.is_active());
    }

    #[test]
    fn mse_needs_either_capability_flag() {
        assert!(!MediaCapabilities::default().supports_mse());
        assert!(
            MediaCapabilities {
                media_source: true,
                managed_media_source: false
            }
            .supports_mse()
        );
        assert!(
            MediaCapabilities {
                media_source: false,
                managed_media_source: true
            }
            .supports_mse()
        );
    }
}
