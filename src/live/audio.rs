// Per-camera audio preference and autoplay unlock
//
// Holds the persisted audio toggle for one camera and runs the one-shot
// workaround that coaxes the browser into granting audio playback after the
// first user gesture: the effective flag is flipped off and back on across
// two scheduled delays, which re-primes the backend's audio path under the
// permission the gesture just granted.

use std::time::{Duration, Instant};

use super::timer::DelayTimer;
use crate::preferences::{PreferenceStore, audio_preference_key};

/// Delay between the unlocking gesture and the first flip
pub const UNLOCK_STAGE_ONE: Duration = Duration::from_millis(100);
/// Delay between the first flip and the restore
pub const UNLOCK_STAGE_TWO: Duration = Duration::from_millis(1);

/// Audio preference controller for one camera view
///
/// When the caller's override flag is set the persisted value is bypassed
/// entirely: reads and writes skip the store and the override value is
/// authoritative.
#[derive(Debug)]
pub struct AudioPreferenceController {
    key: String,
    override_active: bool,
    effective: bool,
    unlock_attempted: bool,
    restore_to: Option<bool>,
    stage_one: DelayTimer,
    stage_two: DelayTimer,
}

impl AudioPreferenceController {
    /// Create the controller, lazily initializing the persisted preference
    /// to `default_audio` on first view of this camera
    pub fn new(
        camera: &str,
        default_audio: bool,
        override_active: bool,
        store: &mut PreferenceStore,
    ) -> Self {
        let key = audio_preference_key(camera);
        let effective = if override_active {
            default_audio
        } else {
            store.get(&key, default_audio)
        };

        Self {
            key,
            override_active,
            effective,
            unlock_attempted: false,
            restore_to: None,
            stage_one: DelayTimer::new(),
            stage_two: DelayTimer::new(),
        }
    }

    /// The effective audio-enabled flag fed to the playback backend
    pub fn effective_audio(&self) -> bool {
        self.effective
    }

    /// Whether the one-shot unlock has already been consumed
    pub fn unlock_attempted(&self) -> bool {
        self.unlock_attempted
    }

    /// Flip the preference from a user toggle, persisting the new value
    pub fn toggle(&mut self, store: &mut PreferenceStore) {
        let next = !self.effective;
        self.apply(next, store);
    }

    /// First user gesture after mount; schedules the unlock sequence
    ///
    /// Runs exactly once per view lifetime; later gestures are ignored.
    pub fn on_pointer_down(&mut self, now: Instant) {
        if self.unlock_attempted {
            return;
        }
        self.unlock_attempted = true;
        self.stage_one.start(now, UNLOCK_STAGE_ONE);
    }

    /// Drive the unlock timers; returns true when the effective flag changed
    pub fn poll(&mut self, now: Instant, store: &mut PreferenceStore) -> bool {
        let mut changed = false;

        if self.stage_one.poll(now) {
            self.restore_to = Some(self.effective);
            let flipped = !self.effective;
            self.apply(flipped, store);
            self.stage_two.start(now, UNLOCK_STAGE_TWO);
            changed = true;
        }

        if self.stage_two.poll(now) {
            if let Some(original) = self.restore_to.take() {
                self.apply(original, store);
                changed = true;
            }
        }

        changed
    }

    /// The earliest pending unlock deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.stage_one.deadline(), self.stage_two.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Cancel any scheduled unlock stages (view teardown)
    pub fn cancel(&mut self) {
        self.stage_one.cancel();
        self.stage_two.cancel();
        self.restore_to = None;
    }

    fn apply(&mut self, value: bool, store: &mut PreferenceStore) {
        self.effective = value;
        if !self.override_active {
            store.set(&self.key, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_view_persists_the_default() {
        let mut store = PreferenceStore::in_memory();
        let controller = AudioPreferenceController::new("front_door", true, false, &mut store);

        assert!(controller.effective_audio());
        assert!(store.get("front_door_audio", false));
    }

    #[test]
    fn toggle_persists_across_controllers() {
        let mut store = PreferenceStore::in_memory();
        let mut controller = AudioPreferenceController::new("yard", true, false, &mut store);
        controller.toggle(&mut store);
        assert!(!controller.effective_audio());

        let revisit = AudioPreferenceController::new("yard", true, false, &mut store);
        assert!(!revisit.effective_audio());
    }

    #[test]
    fn override_bypasses_persistence() {
        let mut store = PreferenceStore::in_memory();
        let mut controller = AudioPreferenceController::new("garage", false, true, &mut store);
        assert!(!controller.effective_audio());

        controller.toggle(&mut store);
        assert!(controller.effective_audio());

        // Nothing was read from or written to the store.
        assert!(!store.get("garage_audio", false));
    }

    #[test]
    fn unlock_flips_off_then_back_on() {
        let now = Instant::now();
        let mut store = PreferenceStore::in_memory();
        let mut controller = AudioPreferenceController::new("porch", true, false, &mut store);

        controller.on_pointer_down(now);
        assert!(controller.effective_audio());

        let stage_one = now + UNLOCK_STAGE_ONE;
        assert!(controller.poll(stage_one, &mut store));
        assert!(!controller.effective_audio());

        let stage_two = stage_one + UNLOCK_STAGE_TWO;
        assert!(controller.poll(stage_two, &mut store));
        assert!(controller.effective_audio());

        // Net persisted value is unchanged.
        assert!(store.get("porch_audio", false));
    }

    #[test]
    fn unlock_runs_exactly_once() {
        let now = Instant::now();
        let mut store = PreferenceStore::in_memory();
        let mut controller = AudioPreferenceController::new("porch", true, false, &mut store);

        controller.on_pointer_down(now);
        controller.poll(now + UNLOCK_STAGE_ONE, &mut store);
        controller.poll(now + UNLOCK_STAGE_ONE + UNLOCK_STAGE_TWO, &mut store);

        controller.on_pointer_down(now + Duration::from_secs(1));
        assert_eq!(controller.next_deadline(), None);
        assert!(!controller.poll(now + Duration::from_secs(2), &mut store));
    }

    #[test]
    fn cancel_disarms_pending_stages() {
        let now = Instant::now();
        let mut store = PreferenceStore::in_memory();
        let mut controller = AudioPreferenceController::new("porch", true, false, &mut store);

        controller.on_pointer_down(now);
        controller.cancel();
        assert!(!controller.poll(now + Duration::from_secs(1), &mut store));
        assert!(controller.effective_audio());
    }
}
