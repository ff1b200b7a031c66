// Layoutkeys Pressed Button State
// HashSet-based O(1) lookup for buttons currently held down

use std::collections::HashSet;

use crate::key::KeyButton;

/// Tracks held buttons with O(1) lookup
#[derive(Debug, Clone, Default)]
pub struct PressedKeyState {
    pressed: HashSet<KeyButton>,
}

impl PressedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a button going down
    pub fn add(&mut self, button: KeyButton) {
        self.pressed.insert(button);
    }

    /// Record a button going up
    pub fn remove(&mut self, button: KeyButton) {
        self.pressed.remove(&button);
    }

    /// Apply one transition
    pub fn update(&mut self, button: KeyButton, down: bool) {
        if down {
            self.add(button);
        } else {
            self.remove(button);
        }
    }

    pub fn is_pressed(&self, button: KeyButton) -> bool {
        self.pressed.contains(&button)
    }

    /// Held buttons in ascending order
    pub fn get_all(&self) -> Vec<KeyButton> {
        let mut all: Vec<KeyButton> = self.pressed.iter().copied().collect();
        all.sort_unstable();
        all
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(code: u8) -> KeyButton {
        KeyButton::from_virtual_key(code)
    }

    #[test]
    fn test_state_add_remove() {
        let mut state = PressedKeyState::new();
        assert!(!state.is_pressed(button(0)));
        state.add(button(0));
        assert!(state.is_pressed(button(0)));
        state.remove(button(0));
        assert!(!state.is_pressed(button(0)));
    }

    #[test]
    fn test_state_get_all_sorted() {
        let mut state = PressedKeyState::new();
        state.add(button(0x31));
        state.add(button(0x00));
        state.add(button(0x38));
        assert_eq!(state.get_all(), vec![button(0x00), button(0x31), button(0x38)]);
    }

    #[test]
    fn test_state_duplicate_add() {
        let mut state = PressedKeyState::new();
        state.add(button(1));
        state.add(button(1));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_state_remove_nonexistent() {
        let mut state = PressedKeyState::new();
        // removing an unknown button is a no-op
        state.remove(button(1));
        assert!(state.is_empty());
    }

    #[test]
    fn test_state_update_and_clear() {
        let mut state = PressedKeyState::default();
        state.update(button(2), true);
        state.update(button(3), true);
        state.update(button(2), false);
        assert_eq!(state.get_all(), vec![button(3)]);
        state.clear();
        assert!(state.is_empty());
    }
}
