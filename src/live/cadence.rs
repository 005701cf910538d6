// Adaptive still-image refresh cadence
//
// Pure priority-ordered policy trading bandwidth and CPU against the
// perceived latency of noticing new activity. Once live playback is carrying
// the signal, polling never runs faster than necessary.

use super::types::RefreshInterval;

/// Fast poll while live is mounted but activity has lapsed, to catch
/// re-activation quickly
pub const READY_IDLE_MS: i64 = 300;
/// Slow poll while the live surface is doing the real work
pub const READY_ACTIVE_MS: i64 = 60_000;
/// Fast poll supporting quick promotion to live when activity appears
pub const PROMOTE_FAST_MS: i64 = 200;
/// Slow poll when activity is present but promotion is disabled
pub const PROMOTE_DISABLED_MS: i64 = 59_000;
/// Default cadence: idle, online, visible
pub const IDLE_MS: i64 = 30_000;

/// Inputs to the cadence calculation
///
/// Recomputed reactively whenever any field changes; the result is always
/// derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceInputs {
    /// Viewer visibility (tab/window shown)
    pub visible: bool,
    /// Camera reported offline by the activity source
    pub offline: bool,
    /// Still-image display enabled at all
    pub still_enabled: bool,
    /// Selected backend is rendering real frames
    pub live_ready: bool,
    /// Motion or tracked objects currently present
    pub activity: bool,
    /// Automatic live promotion policy
    pub auto_live: bool,
}

/// Compute the still-image polling interval; first matching rule wins
pub fn still_refresh_interval(inputs: CadenceInputs) -> RefreshInterval {
    if !inputs.visible || inputs.offline || !inputs.still_enabled {
        return RefreshInterval::DISABLED;
    }

    if inputs.live_ready && !inputs.activity {
        return RefreshInterval(READY_IDLE_MS);
    }

    if inputs.live_ready {
        return RefreshInterval(READY_ACTIVE_MS);
    }

    if inputs.activity {
        if inputs.auto_live {
            return RefreshInterval(PROMOTE_FAST_MS);
        }
        return RefreshInterval(PROMOTE_DISABLED_MS);
    }

    RefreshInterval(IDLE_MS)
}
