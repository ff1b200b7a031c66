// Layoutkeys Special Keys
// Keys whose meaning never depends on the layout

use crate::native::{vk, VirtualKey};
use crate::KeyId;

/// Hard-coded keys overlaid on every layout.
///
/// Right-hand modifiers share the left-hand id, and lookups by id take the
/// first row, so injected modifiers always use the left-hand key.
pub const SPECIAL_KEYS: &[(VirtualKey, KeyId)] = &[
    // cursor keys
    (vk::LEFT_ARROW, KeyId::LEFT),
    (vk::RIGHT_ARROW, KeyId::RIGHT),
    (vk::UP_ARROW, KeyId::UP),
    (vk::DOWN_ARROW, KeyId::DOWN),
    (vk::HOME, KeyId::HOME),
    (vk::END, KeyId::END),
    (vk::PAGE_UP, KeyId::PAGE_UP),
    (vk::PAGE_DOWN, KeyId::PAGE_DOWN),
    (vk::HELP, KeyId::INSERT),
    (vk::FORWARD_DELETE, KeyId::DELETE),
    // function keys
    (vk::F1, KeyId(0xEFBE)),
    (vk::F2, KeyId(0xEFBF)),
    (vk::F3, KeyId(0xEFC0)),
    (vk::F4, KeyId(0xEFC1)),
    (vk::F5, KeyId(0xEFC2)),
    (vk::F6, KeyId(0xEFC3)),
    (vk::F7, KeyId(0xEFC4)),
    (vk::F8, KeyId(0xEFC5)),
    (vk::F9, KeyId(0xEFC6)),
    (vk::F10, KeyId(0xEFC7)),
    (vk::F11, KeyId(0xEFC8)),
    (vk::F12, KeyId(0xEFC9)),
    (vk::F13, KeyId(0xEFCA)),
    (vk::F14, KeyId(0xEFCB)),
    (vk::F15, KeyId(0xEFCC)),
    (vk::F16, KeyId(0xEFCD)),
    (vk::F17, KeyId(0xEFCE)),
    (vk::F18, KeyId(0xEFCF)),
    (vk::F19, KeyId(0xEFD0)),
    (vk::F20, KeyId(0xEFD1)),
    // modifiers
    (vk::SHIFT, KeyId::SHIFT_L),
    (vk::RIGHT_SHIFT, KeyId::SHIFT_L),
    (vk::CONTROL, KeyId::CONTROL_L),
    (vk::RIGHT_CONTROL, KeyId::CONTROL_L),
    (vk::COMMAND, KeyId::ALT_L),
    (vk::RIGHT_COMMAND, KeyId::ALT_L),
    (vk::OPTION, KeyId::SUPER_L),
    (vk::RIGHT_OPTION, KeyId::SUPER_L),
    (vk::CAPS_LOCK, KeyId::CAPS_LOCK),
    (vk::KEYPAD_CLEAR, KeyId::NUM_LOCK),
    // system keys
    (vk::MISSION_CONTROL, KeyId::MISSION_CONTROL),
    (vk::LAUNCHPAD, KeyId::LAUNCHPAD),
    (vk::BRIGHTNESS_UP, KeyId::BRIGHTNESS_UP),
    (vk::BRIGHTNESS_DOWN, KeyId::BRIGHTNESS_DOWN),
    (vk::VOLUME_UP, KeyId::AUDIO_UP),
    (vk::VOLUME_DOWN, KeyId::AUDIO_DOWN),
    (vk::MUTE, KeyId::AUDIO_MUTE),
    (vk::KEYPAD_ENTER, KeyId::KP_ENTER),
];

/// Layout-independent key id for a virtual key
pub fn special_key(virtual_key: VirtualKey) -> Option<KeyId> {
    SPECIAL_KEYS
        .iter()
        .find(|(code, _)| *code == virtual_key)
        .map(|(_, id)| *id)
}

/// Virtual key for a layout-independent key id
pub fn special_virtual_key(id: KeyId) -> Option<VirtualKey> {
    SPECIAL_KEYS
        .iter()
        .find(|(_, key)| *key == id)
        .map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_keys_are_contiguous() {
        let f_keys: Vec<KeyId> = SPECIAL_KEYS[10..30].iter().map(|(_, id)| *id).collect();
        let expected: Vec<KeyId> = (1..=20).filter_map(KeyId::function).collect();
        assert_eq!(f_keys, expected);
    }

    #[test]
    fn test_left_hand_modifiers_win() {
        assert_eq!(special_virtual_key(KeyId::SHIFT_L), Some(vk::SHIFT));
        assert_eq!(special_virtual_key(KeyId::ALT_L), Some(vk::COMMAND));
        assert_eq!(special_virtual_key(KeyId::SUPER_L), Some(vk::OPTION));
        assert_eq!(special_key(vk::RIGHT_OPTION), Some(KeyId::SUPER_L));
    }

    #[test]
    fn test_help_is_insert() {
        assert_eq!(special_key(vk::HELP), Some(KeyId::INSERT));
        assert_eq!(special_key(vk::ANSI_A), None);
    }

    #[test]
    fn test_virtual_keys_fit_a_button() {
        for (code, _) in SPECIAL_KEYS {
            assert!(*code <= 0xFF);
        }
    }
}
