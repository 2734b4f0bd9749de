//! Network module - Communication with the pod

mod action;
pub mod stream;

pub use action::{start_action_thread, ActionClient, ActionKind, KeyAction};
pub use stream::{subscribe, StreamFilter, SubscriptionHandle, RECONNECT_DELAY};
