// Live view playback orchestrator
//
// Synchronous, event-driven composition of the cadence calculator, playback
// mode selector, arbitration machine, and audio controller. Every transition
// is triggered by a `ViewEvent` or a timer expiry evaluated against a
// caller-supplied instant, so the whole core is deterministic under test.

use std::time::Instant;

use super::arbitration::{ArbitrationMachine, LiveViewState};
use super::audio::AudioPreferenceController;
use super::cadence::{CadenceInputs, still_refresh_interval};
use super::selector::{PlaybackModeSelector, PlayerSlot};
use super::types::{
    CameraActivity, HostNotice, LiveMode, Presentation, RefreshInterval, ViewConfig, ViewEvent,
};
use crate::preferences::PreferenceStore;

/// Orchestrates one camera's live view for the lifetime of the host view
///
/// Single-threaded and non-blocking: backend playback and storage I/O are
/// fire-and-forget from its perspective, observed later as events.
pub struct LiveViewOrchestrator {
    config: ViewConfig,
    activity: CameraActivity,
    visible: bool,
    store: PreferenceStore,
    selector: PlaybackModeSelector,
    machine: ArbitrationMachine,
    audio: AudioPreferenceController,
    notices: Vec<HostNotice>,
}

impl LiveViewOrchestrator {
    /// Create the orchestrator from the view configuration and the initial
    /// activity snapshot
    pub fn new(config: ViewConfig, mut store: PreferenceStore, activity: CameraActivity) -> Self {
        let audio = AudioPreferenceController::new(
            &config.camera,
            config.play_audio,
            config.override_local_audio,
            &mut store,
        );
        let machine = ArbitrationMachine::new(config.auto_live, activity.is_active());
        let selector = PlaybackModeSelector::new(config.preferred_mode, config.capabilities);

        Self {
            visible: config.window_visible,
            config,
            activity,
            store,
            selector,
            machine,
            audio,
            notices: Vec::new(),
        }
    }

    pub fn camera(&self) -> &str {
        &self.config.camera
    }

    pub fn state(&self) -> LiveViewState {
        self.machine.state()
    }

    pub fn live_ready(&self) -> bool {
        self.machine.live_ready()
    }

    /// Route one inbound event
    pub fn handle_event(&mut self, event: ViewEvent, now: Instant) {
        match event {
            ViewEvent::ActivityChanged(activity) => {
                self.machine.on_activity(activity.is_active(), now);
                self.activity = activity;
            }
            ViewEvent::VisibilityChanged(visible) => {
                self.visible = visible;
            }
            ViewEvent::PreferredModeChanged(mode) => {
                if self.selector.set_mode(mode) {
                    self.machine.on_mode_change(mode != LiveMode::None);
                }
            }
            ViewEvent::ForceLive => {
                self.machine.force_live();
            }
            ViewEvent::BackendPlaying { generation } => {
                if self.selector.accepts(generation) {
                    self.machine.on_ready();
                } else {
                    log::debug!(
                        "ignoring stale playing callback for {} (generation {})",
                        self.config.camera,
                        generation
                    );
                }
            }
            ViewEvent::BackendError { generation, error } => {
                if self.selector.accepts(generation) {
                    log::warn!("backend error on {}: {}", self.config.camera, error);
                    self.machine.on_error();
                    self.notices.push(HostNotice::PlaybackError(error));
                } else {
                    log::debug!(
                        "ignoring stale error callback for {}: {}",
                        self.config.camera,
                        error
                    );
                }
            }
            ViewEvent::ToggleAudio => {
                self.audio.toggle(&mut self.store);
            }
            ViewEvent::PointerDown => {
                self.audio.on_pointer_down(now);
            }
        }
    }

    /// Drive all outstanding timers
    pub fn poll(&mut self, now: Instant) {
        if self.machine.poll(now) {
            self.notices.push(HostNotice::LiveModeReset);
        }
        self.audio.poll(now, &mut self.store);
    }

    /// The earliest pending timer deadline across all components
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.machine.next_deadline(), self.audio.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Current still-image polling cadence
    pub fn still_refresh(&self) -> RefreshInterval {
        still_refresh_interval(CadenceInputs {
            visible: self.visible,
            offline: self.activity.offline,
            still_enabled: self.config.show_still_without_activity,
            live_ready: self.machine.live_ready(),
            activity: self.activity.is_active(),
            auto_live: self.config.auto_live,
        })
    }

    /// What occupies the player slot right now
    pub fn player_slot(&self) -> PlayerSlot {
        let playback_enabled =
            !self.config.show_still_without_activity || self.machine.wants_live();
        self.selector.plan(
            playback_enabled,
            self.audio.effective_audio(),
            self.config.mic_enabled,
        )
    }

    /// Snapshot of the outward-facing state
    pub fn presentation(&self) -> Presentation {
        Presentation {
            surface: self
                .machine
                .surface(self.config.show_still_without_activity),
            still_refresh: self.still_refresh(),
            live_ready: self.machine.live_ready(),
            offline: self.activity.offline,
            state: self.machine.state(),
            audio_enabled: self.audio.effective_audio(),
        }
    }

    /// Drain notifications queued for the host
    pub fn take_notices(&mut self) -> Vec<HostNotice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::arbitration::FALLBACK_DEBOUNCE;
    use crate::live::cadence::READY_ACTIVE_MS;
    use crate::live::types::{MediaCapabilities, PlaybackError, PlaybackErrorKind, Surface};
    use std::time::Duration;

    fn webrtc_config(camera: &str) -> ViewConfig {
        let mut config = ViewConfig::new(camera);
        config.preferred_mode = LiveMode::WebRtc;
        config.capabilities = MediaCapabilities {
            media_source: true,
            managed_media_source: false,
        };
        config
    }

    fn orchestrator(config: ViewConfig) -> LiveViewOrchestrator {
        LiveViewOrchestrator::new(config, PreferenceStore::in_memory(), CameraActivity::default())
    }

    fn motion() -> CameraActivity {
        CameraActivity {
            active_motion: true,
            ..CameraActivity::default()
        }
    }

    fn generation(orch: &LiveViewOrchestrator) -> u64 {
        match orch.player_slot() {
            PlayerSlot::Player(plan) => plan.generation,
            other => panic!("expected a planned player, got {:?}", other),
        }
    }

    #[test]
    fn offline_camera_shows_still_and_never_polls() {
        let mut orch = orchestrator(ViewConfig::new("front_door"));
        orch.handle_event(
            ViewEvent::ActivityChanged(CameraActivity {
                offline: true,
                ..CameraActivity::default()
            }),
            Instant::now(),
        );

        let presentation = orch.presentation();
        assert!(presentation.offline);
        assert_eq!(presentation.surface, Surface::Still);
        assert_eq!(presentation.still_refresh, RefreshInterval::DISABLED);
        assert_eq!(orch.player_slot(), PlayerSlot::Inactive);
    }

    #[test]
    fn activity_then_playing_promotes_to_live() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("yard"));
        assert_eq!(orch.state(), LiveViewState::StillOnly);

        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        assert_eq!(orch.state(), LiveViewState::LivePending);

        let generation = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation }, now);
        assert_eq!(orch.state(), LiveViewState::LiveActive);

        let presentation = orch.presentation();
        assert_eq!(presentation.surface, Surface::Live);
        assert_eq!(presentation.still_refresh.millis(), READY_ACTIVE_MS);
    }

    #[test]
    fn mode_change_resets_readiness_before_new_callbacks() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("yard"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let stale = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation: stale }, now);
        assert!(orch.live_ready());

        orch.handle_event(ViewEvent::PreferredModeChanged(LiveMode::Mse), now);
        assert!(!orch.live_ready());
        assert_eq!(orch.state(), LiveViewState::LivePending);

        // A late callback from the torn-down backend must be ignored.
        orch.handle_event(ViewEvent::BackendPlaying { generation: stale }, now);
        assert!(!orch.live_ready());

        let fresh = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation: fresh }, now);
        assert!(orch.live_ready());
    }

    #[test]
    fn reselecting_same_mode_is_a_no_op() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("yard"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let generation = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation }, now);

        orch.handle_event(ViewEvent::PreferredModeChanged(LiveMode::WebRtc), now);
        assert!(orch.live_ready());
        assert_eq!(orch.state(), LiveViewState::LiveActive);
    }

    #[test]
    fn backend_error_reverts_to_still_and_reports_once() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("garage"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let generation = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation }, now);

        let error = PlaybackError::new(PlaybackErrorKind::Stalled, "no frames for 3s");
        orch.handle_event(
            ViewEvent::BackendError {
                generation,
                error: error.clone(),
            },
            now,
        );

        assert_eq!(orch.state(), LiveViewState::StillOnly);
        assert_eq!(orch.presentation().surface, Surface::Still);
        assert_eq!(orch.take_notices(), vec![HostNotice::PlaybackError(error)]);
        assert!(orch.take_notices().is_empty());
    }

    #[test]
    fn stale_error_is_ignored() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("garage"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let stale = generation(&orch);
        orch.handle_event(ViewEvent::PreferredModeChanged(LiveMode::Jsmpeg), now);

        orch.handle_event(
            ViewEvent::BackendError {
                generation: stale,
                error: PlaybackError::new(PlaybackErrorKind::Startup, "old backend"),
            },
            now,
        );
        assert!(orch.take_notices().is_empty());
        assert_eq!(orch.state(), LiveViewState::LivePending);
    }

    #[test]
    fn completed_fallback_notifies_host_once() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("porch"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let generation = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation }, now);

        orch.handle_event(ViewEvent::ActivityChanged(CameraActivity::default()), now);
        assert_eq!(orch.state(), LiveViewState::LiveFallingBack);
        assert!(orch.next_deadline().is_some());

        orch.poll(now + FALLBACK_DEBOUNCE);
        assert_eq!(orch.state(), LiveViewState::StillOnly);
        assert!(!orch.live_ready());
        assert_eq!(orch.take_notices(), vec![HostNotice::LiveModeReset]);

        orch.poll(now + FALLBACK_DEBOUNCE * 4);
        assert!(orch.take_notices().is_empty());
    }

    #[test]
    fn activity_reentry_keeps_live_without_reset_notice() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("porch"));
        orch.handle_event(ViewEvent::ActivityChanged(motion()), now);
        let generation = generation(&orch);
        orch.handle_event(ViewEvent::BackendPlaying { generation }, now);

        orch.handle_event(ViewEvent::ActivityChanged(CameraActivity::default()), now);
        orch.handle_event(
            ViewEvent::ActivityChanged(motion()),
            now + Duration::from_millis(200),
        );

        orch.poll(now + Duration::from_secs(2));
        assert_eq!(orch.state(), LiveViewState::LiveActive);
        assert!(orch.take_notices().is_empty());
    }

    #[test]
    fn hidden_viewer_disables_polling() {
        let mut orch = orchestrator(ViewConfig::new("side"));
        orch.handle_event(ViewEvent::VisibilityChanged(false), Instant::now());
        assert_eq!(orch.still_refresh(), RefreshInterval::DISABLED);
    }

    #[test]
    fn audio_preference_survives_backend_switches() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("deck"));
        orch.handle_event(ViewEvent::ToggleAudio, now);
        assert!(!orch.presentation().audio_enabled);

        orch.handle_event(ViewEvent::PreferredModeChanged(LiveMode::Jsmpeg), now);
        orch.handle_event(ViewEvent::PreferredModeChanged(LiveMode::WebRtc), now);
        assert!(!orch.presentation().audio_enabled);
    }

    #[test]
    fn pointer_down_schedules_unlock_and_restores_audio() {
        let now = Instant::now();
        let mut orch = orchestrator(webrtc_config("deck"));
        orch.handle_event(ViewEvent::PointerDown, now);

        let stage_one = orch.next_deadline().expect("unlock stage scheduled");
        orch.poll(stage_one);
        assert!(!orch.presentation().audio_enabled);

        let stage_two = orch.next_deadline().expect("restore stage scheduled");
        orch.poll(stage_two);
        assert!(orch.presentation().audio_enabled);
    }
}
