// Layoutkeys Actions
// Press, release and repeat transitions of keys

use std::fmt;

use crate::native::{NativeEventKind, NativeKeyEvent};

/// Direction of a key transition, observed or synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Release,
    Press,
    Repeat,
}

impl Action {
    /// Action for a key that is now down (`true`) or up (`false`)
    pub fn from_down(down: bool) -> Self {
        if down {
            Action::Press
        } else {
            Action::Release
        }
    }

    /// Action for a synthetic button stroke
    pub fn from_stroke(press: bool, repeat: bool) -> Self {
        match (press, repeat) {
            (true, true) => Action::Repeat,
            (down, _) => Action::from_down(down),
        }
    }

    /// Action carried by a native key event. Flag changes have none.
    pub fn from_event(event: &NativeKeyEvent) -> Option<Self> {
        match event.kind {
            NativeEventKind::KeyDown if event.autorepeat => Some(Action::Repeat),
            NativeEventKind::KeyDown => Some(Action::Press),
            NativeEventKind::KeyUp => Some(Action::Release),
            NativeEventKind::FlagsChanged => None,
        }
    }

    pub fn is_pressed(self) -> bool {
        matches!(self, Action::Press | Action::Repeat)
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, Action::Repeat)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Release => "release",
            Action::Press => "press",
            Action::Repeat => "repeat",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_event() {
        let down = NativeKeyEvent::key_down(0x00, Default::default());
        assert_eq!(Action::from_event(&down), Some(Action::Press));
        assert_eq!(Action::from_event(&down.with_autorepeat()), Some(Action::Repeat));

        let up = NativeKeyEvent::key_up(0x00, Default::default());
        assert_eq!(Action::from_event(&up), Some(Action::Release));
    }

    #[test]
    fn test_action_from_stroke() {
        assert_eq!(Action::from_stroke(true, false), Action::Press);
        assert_eq!(Action::from_stroke(true, true), Action::Repeat);
        assert_eq!(Action::from_stroke(false, true), Action::Release);
        assert!(Action::Repeat.is_pressed());
        assert!(!Action::Release.is_pressed());
    }
}
