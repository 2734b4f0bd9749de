//! Logical keys and the pressed-key set

use serde::Serialize;
use std::str::FromStr;

/// The fixed set of keys the pod understands, independent of which physical
/// input produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalKey {
    L1,
    L2,
    L3,
    Home,
    Back,
    Up,
    Down,
}

impl FromStr for LogicalKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(LogicalKey::L1),
            "l2" => Ok(LogicalKey::L2),
            "l3" => Ok(LogicalKey::L3),
            "home" => Ok(LogicalKey::Home),
            "back" => Ok(LogicalKey::Back),
            "up" => Ok(LogicalKey::Up),
            "down" => Ok(LogicalKey::Down),
            other => Err(format!("unknown key '{}'", other)),
        }
    }
}

/// The client's current belief about which logical keys are held.
///
/// Insertion-ordered set: pressing an already-held key is a no-op on the set
/// (though the press event still goes out), releasing an absent key is a
/// no-op. Every outbound action carries a full snapshot of this set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PressedKeySet {
    keys: Vec<LogicalKey>,
}

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key` if absent. Returns true when the set changed.
    pub fn press(&mut self, key: LogicalKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Remove `key` if present. Returns true when the set changed.
    pub fn release(&mut self, key: LogicalKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|&k| k != key);
        self.keys.len() != before
    }

    pub fn contains(&self, key: LogicalKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Full copy of the current state, in insertion order.
    pub fn snapshot(&self) -> Vec<LogicalKey> {
        self.keys.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_reconciliation() {
        // After any sequence, the set equals the keys with an unmatched
        // trailing press.
        let mut set = PressedKeySet::new();
        set.press(LogicalKey::L1);
        set.press(LogicalKey::Up);
        set.release(LogicalKey::L1);
        set.press(LogicalKey::Down);
        set.release(LogicalKey::Down);

        assert_eq!(set.snapshot(), vec![LogicalKey::Up]);
    }

    #[test]
    fn test_duplicate_press_is_noop_on_set() {
        let mut set = PressedKeySet::new();
        assert!(set.press(LogicalKey::Back));
        assert!(!set.press(LogicalKey::Back));
        assert!(!set.press(LogicalKey::Back));
        assert_eq!(set.snapshot(), vec![LogicalKey::Back]);

        assert!(set.release(LogicalKey::Back));
        assert!(set.is_empty());
    }

    #[test]
    fn test_release_absent_key_is_noop() {
        let mut set = PressedKeySet::new();
        assert!(!set.release(LogicalKey::Home));
        assert!(set.is_empty());
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut set = PressedKeySet::new();
        set.press(LogicalKey::L2);
        set.press(LogicalKey::L3);
        assert_eq!(set.snapshot(), set.snapshot());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut set = PressedKeySet::new();
        set.press(LogicalKey::Down);
        set.press(LogicalKey::L1);
        set.press(LogicalKey::Home);
        set.release(LogicalKey::L1);
        set.press(LogicalKey::L1);

        assert_eq!(
            set.snapshot(),
            vec![LogicalKey::Down, LogicalKey::Home, LogicalKey::L1]
        );
    }

    #[test]
    fn test_key_from_str() {
        assert_eq!("up".parse::<LogicalKey>().unwrap(), LogicalKey::Up);
        assert_eq!("L1".parse::<LogicalKey>().unwrap(), LogicalKey::L1);
        assert!("volume".parse::<LogicalKey>().is_err());
    }
}
