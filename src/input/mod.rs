//! Input module - User input translation

mod keymap;
mod keys;
mod translator;

pub use keymap::map_key;
pub use keys::{LogicalKey, PressedKeySet};
pub use translator::{InputEvent, InputTranslator, KeyState, SWIPE_THRESHOLD};
