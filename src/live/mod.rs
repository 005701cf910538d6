// Live View Playback Orchestration
//
// This module decides, for one camera view, whether the operator sees a true
// real-time stream or a periodically refreshed still image. It supervises
// the streaming backend selection, arbitrates live/still presentation with
// hysteresis, derives the still-image refresh cadence, and manages the
// persisted per-camera audio preference.

pub mod api;
pub mod arbitration;
pub mod audio;
pub mod cadence;
pub mod error;
pub mod orchestrator;
pub mod selector;
pub mod timer;
pub mod types;

pub use api::{HostNoticeHandler, LiveView, ViewId};
pub use arbitration::{ArbitrationMachine, FALLBACK_DEBOUNCE, LiveViewState};
pub use audio::{AudioPreferenceController, UNLOCK_STAGE_ONE, UNLOCK_STAGE_TWO};
pub use cadence::{CadenceInputs, still_refresh_interval};
pub use error::{LiveResult, LiveViewError};
pub use orchestrator::LiveViewOrchestrator;
pub use selector::{
    BackendConfig, BackendPlan, MSE_UNSUPPORTED_MESSAGE, PlaybackModeSelector, PlayerSlot,
};
pub use timer::DelayTimer;
pub use types::*;

/// External activity signal source for one camera
///
/// Implemented by the host, not this crate. The adapter refreshes its
/// snapshot continuously (motion, tracked objects, offline state) and pushes
/// changes to the orchestrator as `ViewEvent::ActivityChanged`.
pub trait ActivitySource: Send + Sync {
    /// The current activity snapshot for the camera
    fn snapshot(&self) -> CameraActivity;
}
