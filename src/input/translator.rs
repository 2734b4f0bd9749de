//! Input translation
//!
//! Turns key events and drag gestures into press/release actions against the
//! pressed-key set, each dispatched with the full snapshot taken after the
//! set mutation.

use crate::input::{LogicalKey, PressedKeySet};
use crate::log_debug;
use crate::network::{ActionKind, KeyAction};
use crossbeam_channel::Sender;

/// Minimum drag distance on the decisive axis before a swipe registers.
pub const SWIPE_THRESHOLD: f64 = 5.0;

/// Whether a key event reports the key going down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

/// Closed set of input shapes the translator understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: LogicalKey, state: KeyState },
    Gesture { dx: f64, dy: f64 },
}

/// Owns the pressed-key set and feeds the action dispatcher.
pub struct InputTranslator {
    pressed: PressedKeySet,
    tx: Sender<KeyAction>,
    gesture_active: bool,
}

impl InputTranslator {
    pub fn new(tx: Sender<KeyAction>) -> Self {
        Self {
            pressed: PressedKeySet::new(),
            tx,
            gesture_active: false,
        }
    }

    /// Translate one input event into zero or more dispatched actions.
    ///
    /// Key auto-repeat is passed through deliberately: every repeated down
    /// event re-emits a press, even though the set already holds the key.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, state } => match state {
                KeyState::Down => self.press(key),
                KeyState::Up => self.release(key),
            },
            InputEvent::Gesture { dx, dy } => self.gesture(dx, dy),
        }
    }

    /// A pointer drag started on the mirror surface; scrolling is suppressed
    /// until the gesture ends.
    pub fn begin_gesture(&mut self) {
        self.gesture_active = true;
    }

    pub fn end_gesture(&mut self) {
        self.gesture_active = false;
    }

    pub fn gesture_active(&self) -> bool {
        self.gesture_active
    }

    /// Teardown: restore scrolling even mid-gesture.
    pub fn reset(&mut self) {
        self.gesture_active = false;
    }

    fn press(&mut self, key: LogicalKey) {
        self.pressed.press(key);
        self.dispatch(ActionKind::Press, key);
    }

    fn release(&mut self, key: LogicalKey) {
        self.pressed.release(key);
        self.dispatch(ActionKind::Release, key);
    }

    /// Horizontal swipes left go Back; vertical swipes map down-on-screen to
    /// Up and up-on-screen to Down, matching what the pod expects for list
    /// navigation. Drags at or under the threshold are no-ops.
    fn gesture(&mut self, dx: f64, dy: f64) {
        log_debug!("INPUT", "Gesture dx={:.0} dy={:.0}", dx, dy);
        if dx.abs() > dy.abs() {
            if dx < -SWIPE_THRESHOLD {
                self.press(LogicalKey::Back);
                self.release(LogicalKey::Back);
            }
        } else if dy > SWIPE_THRESHOLD {
            self.press(LogicalKey::Up);
            self.release(LogicalKey::Up);
        } else if dy < -SWIPE_THRESHOLD {
            self.press(LogicalKey::Down);
            self.release(LogicalKey::Down);
        }
    }

    fn dispatch(&mut self, kind: ActionKind, key: LogicalKey) {
        let action = KeyAction {
            kind,
            key,
            pressed_keys: self.pressed.snapshot(),
        };
        let _ = self.tx.try_send(action);
    }
}
