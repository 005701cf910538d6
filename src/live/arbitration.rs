// Live/still arbitration state machine
//
// Decides at any instant whether the still image or the live stream is the
// presented surface. Demotion from live is debounced so transient activity
// dropouts never flicker the view back to the still image.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use super::timer::DelayTimer;
use super::types::Surface;

/// Hysteresis window before a live view falls back to the still image
pub const FALLBACK_DEBOUNCE: Duration = Duration::from_millis(500);

/// Arbitration states for one live view
///
/// The machine runs for the lifetime of the view; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiveViewState {
    /// The still image is the presented surface
    StillOnly,
    /// A live backend is mounted and awaited
    LivePending,
    /// The live stream is rendering and presented
    LiveActive,
    /// Activity lapsed; demotion is pending the debounce window
    LiveFallingBack,
}

impl LiveViewState {
    /// Static string form for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveViewState::StillOnly => "StillOnly",
            LiveViewState::LivePending => "LivePending",
            LiveViewState::LiveActive => "LiveActive",
            LiveViewState::LiveFallingBack => "LiveFallingBack",
        }
    }
}

impl fmt::Display for LiveViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The live/still arbitration machine
///
/// Owns `PlaybackReadiness`: only backend "playing" events set it and only
/// the machine's own reset transitions clear it.
#[derive(Debug)]
pub struct ArbitrationMachine {
    state: LiveViewState,
    live_ready: bool,
    activity: bool,
    auto_live: bool,
    fallback: DelayTimer,
}

impl ArbitrationMachine {
    /// Create the machine for one view
    ///
    /// Starts in `StillOnly`, or directly in `LivePending` when automatic
    /// promotion is enabled and activity is already present.
    pub fn new(auto_live: bool, activity_present: bool) -> Self {
        let state = if auto_live && activity_present {
            LiveViewState::LivePending
        } else {
            LiveViewState::StillOnly
        };

        Self {
            state,
            live_ready: false,
            activity: activity_present,
            auto_live,
            fallback: DelayTimer::new(),
        }
    }

    pub fn state(&self) -> LiveViewState {
        self.state
    }

    /// Current playback readiness
    pub fn live_ready(&self) -> bool {
        self.live_ready
    }

    /// Whether the machine is in a live-seeking state
    pub fn wants_live(&self) -> bool {
        self.state != LiveViewState::StillOnly
    }

    /// The pending demotion deadline, if the debounce window is open
    pub fn next_deadline(&self) -> Option<Instant> {
        self.fallback.deadline()
    }

    /// Activity signal changed
    pub fn on_activity(&mut self, present: bool, now: Instant) {
        self.activity = present;

        if present {
            match self.state {
                LiveViewState::StillOnly if self.auto_live => {
                    self.transition(LiveViewState::LivePending, "activity");
                }
                LiveViewState::LiveFallingBack => {
                    // Re-entry of activity cancels the pending demotion.
                    self.fallback.cancel();
                    self.transition(LiveViewState::LiveActive, "activity re-entered");
                }
                _ => {}
            }
        } else if self.state == LiveViewState::LiveActive && self.auto_live && self.live_ready {
            self.fallback.start(now, FALLBACK_DEBOUNCE);
            self.transition(LiveViewState::LiveFallingBack, "activity lapsed");
        }
    }

    /// The viewer explicitly forced live playback
    pub fn force_live(&mut self) {
        match self.state {
            LiveViewState::StillOnly => {
                self.transition(LiveViewState::LivePending, "forced live");
            }
            LiveViewState::LiveFallingBack => {
                self.fallback.cancel();
                self.transition(LiveViewState::LiveActive, "forced live");
            }
            _ => {}
        }
    }

    /// The selected backend began rendering real frames
    pub fn on_ready(&mut self) {
        self.live_ready = true;
        if matches!(
            self.state,
            LiveViewState::StillOnly | LiveViewState::LivePending
        ) {
            self.transition(LiveViewState::LiveActive, "backend playing");
        }
    }

    /// The preferred streaming mode changed
    ///
    /// Readiness is reset before any callback from the replacement backend
    /// can be observed; stale readiness must never be presented against a
    /// different backend. A switch to no backend at all lands in `StillOnly`
    /// since there is nothing to await.
    pub fn on_mode_change(&mut self, has_backend: bool) {
        self.live_ready = false;
        self.fallback.cancel();
        let to = if has_backend {
            LiveViewState::LivePending
        } else {
            LiveViewState::StillOnly
        };
        self.transition(to, "mode changed");
    }

    /// The backend reported an unrecoverable failure
    ///
    /// Falls back to the still surface immediately; retry is the host's
    /// decision.
    pub fn on_error(&mut self) {
        self.live_ready = false;
        self.fallback.cancel();
        self.transition(LiveViewState::StillOnly, "backend error");
    }

    /// Drive the demotion debounce; returns true when a fallback completed
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.fallback.poll(now) {
            return false;
        }

        // Re-check at expiry: the window only demotes if live is still
        // carrying a signal nobody is watching for.
        if self.state == LiveViewState::LiveFallingBack && self.live_ready && !self.activity {
            self.live_ready = false;
            self.transition(LiveViewState::StillOnly, "fallback debounce expired");
            return true;
        }

        if self.state == LiveViewState::LiveFallingBack {
            self.transition(LiveViewState::LiveActive, "fallback superseded");
        }
        false
    }

    /// The visible surface under the configured still-display policy
    ///
    /// The live surface is shown iff readiness holds; otherwise the still
    /// image, unless still display is disabled outright.
    pub fn surface(&self, still_enabled: bool) -> Surface {
        if self.live_ready {
            Surface::Live
        } else if still_enabled {
            Surface::Still
        } else {
            Surface::Placeholder
        }
    }

    fn transition(&mut self, to: LiveViewState, reason: &str) {
        if self.state != to {
            log::debug!("live view {} -> {} ({})", self.state, to, reason);
            self.state = to;
        }
    }
}
