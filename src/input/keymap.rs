//! Physical key to logical key mapping

use crate::input::LogicalKey;
use winit::keyboard::{Key, NamedKey};

/// Map a physical keyboard key to the pod key it stands for.
///
/// Digits select the side keys, Backspace is Home, and the arrow keys have
/// vim-style aliases. Unmapped keys return None and are ignored upstream.
pub fn map_key(key: &Key) -> Option<LogicalKey> {
    match key {
        Key::Character(c) => match c.as_str() {
            "1" => Some(LogicalKey::L1),
            "2" => Some(LogicalKey::L2),
            "3" => Some(LogicalKey::L3),
            "h" => Some(LogicalKey::Back),
            "k" => Some(LogicalKey::Up),
            "j" => Some(LogicalKey::Down),
            _ => None,
        },
        Key::Named(NamedKey::Backspace) => Some(LogicalKey::Home),
        Key::Named(NamedKey::ArrowLeft) => Some(LogicalKey::Back),
        Key::Named(NamedKey::ArrowUp) => Some(LogicalKey::Up),
        Key::Named(NamedKey::ArrowDown) => Some(LogicalKey::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    fn character(s: &str) -> Key {
        Key::Character(SmolStr::new(s))
    }

    #[test]
    fn test_digit_keys() {
        assert_eq!(map_key(&character("1")), Some(LogicalKey::L1));
        assert_eq!(map_key(&character("2")), Some(LogicalKey::L2));
        assert_eq!(map_key(&character("3")), Some(LogicalKey::L3));
    }

    #[test]
    fn test_navigation_keys_and_vim_aliases() {
        assert_eq!(
            map_key(&Key::Named(NamedKey::Backspace)),
            Some(LogicalKey::Home)
        );
        assert_eq!(
            map_key(&Key::Named(NamedKey::ArrowLeft)),
            Some(LogicalKey::Back)
        );
        assert_eq!(map_key(&character("h")), Some(LogicalKey::Back));
        assert_eq!(
            map_key(&Key::Named(NamedKey::ArrowUp)),
            Some(LogicalKey::Up)
        );
        assert_eq!(map_key(&character("k")), Some(LogicalKey::Up));
        assert_eq!(
            map_key(&Key::Named(NamedKey::ArrowDown)),
            Some(LogicalKey::Down)
        );
        assert_eq!(map_key(&character("j")), Some(LogicalKey::Down));
    }

    #[test]
    fn test_unmapped_keys_ignored() {
        assert_eq!(map_key(&character("q")), None);
        assert_eq!(map_key(&character("4")), None);
        assert_eq!(map_key(&Key::Named(NamedKey::Enter)), None);
    }
}
