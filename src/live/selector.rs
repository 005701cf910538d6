// Playback mode selection and backend lifecycle planning
//
// Dispatches a preferred transport variant to a concrete backend plan, gates
// the MSE variant on runtime capability, and tags every plan with a
// generation so callbacks from a torn-down backend are rejected.

use super::types::{LiveMode, MediaCapabilities};

/// Static message shown in place of the player when the environment cannot
/// run the selected transport
pub const MSE_UNSUPPORTED_MESSAGE: &str =
    "Media source extensions are required for this live stream type.";

/// Constructor-style configuration handed to a streaming backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    pub playback_enabled: bool,
    pub audio_enabled: bool,
    /// Microphone passthrough; only the WebRTC transport supports it
    pub microphone_enabled: bool,
}

/// A planned backend instance
///
/// The host instantiates the real decoder from this and reports readiness and
/// errors back as generation-tagged events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPlan {
    pub mode: LiveMode,
    pub generation: u64,
    pub config: BackendConfig,
}

/// What occupies the player slot for the current preferred mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
    /// No backend; the still-image path carries the view
    Inactive,
    /// Capability probe failed; show a static message instead of a player
    Unsupported(&'static str),
    /// A backend should be mounted with this plan
    Player(BackendPlan),
}

/// Chooses and supervises the lifecycle of one backend per view
///
/// Switching the preferred mode retires the previous plan: the generation is
/// bumped so late callbacks from the old backend no longer match, which is
/// how stale readiness is kept off a different backend.
#[derive(Debug)]
pub struct PlaybackModeSelector {
    mode: LiveMode,
    capabilities: MediaCapabilities,
    generation: u64,
}

impl PlaybackModeSelector {
    /// Create a selector; capabilities are probed once and fixed
    pub fn new(mode: LiveMode, capabilities: MediaCapabilities) -> Self {
        Self {
            mode,
            capabilities,
            generation: 0,
        }
    }

    pub fn mode(&self) -> LiveMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a callback tagged with `generation` is from the live plan
    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Switch the preferred mode; returns true when it actually changed
    pub fn set_mode(&mut self, mode: LiveMode) -> bool {
        if mode == self.mode {
            return false;
        }
        log::debug!("live mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.generation += 1;
        true
    }

    /// Plan the player slot for the current mode and flags
    pub fn plan(
        &self,
        playback_enabled: bool,
        audio_enabled: bool,
        microphone_enabled: bool,
    ) -> PlayerSlot {
        let config = BackendConfig {
            playback_enabled,
            audio_enabled,
            microphone_enabled: microphone_enabled && self.mode == LiveMode::WebRtc,
        };

        match self.mode {
            LiveMode::None => PlayerSlot::Inactive,
            LiveMode::Mse if !self.capabilities.supports_mse() => {
                PlayerSlot::Unsupported(MSE_UNSUPPORTED_MESSAGE)
            }
            LiveMode::Mse | LiveMode::WebRtc => PlayerSlot::Player(BackendPlan {
                mode: self.mode,
                generation: self.generation,
                config,
            }),
            // The jsmpeg pipeline decodes continuously once mounted, so it is
            // only mounted while playback is actually wanted.
            LiveMode::Jsmpeg if !playback_enabled => PlayerSlot::Inactive,
            LiveMode::Jsmpeg => PlayerSlot::Player(BackendPlan {
                mode: self.mode,
                generation: self.generation,
                config,
            }),
        }
    }
}
