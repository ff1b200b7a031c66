// Layoutkeys Virtual Key Mapper
// Translation between native key events and canonical key ids

use crate::key::{KeyButton, KeyId, KeySequence};
use crate::keymap::{special_key, Group, KeyMap, KeyMapKey};
use crate::modifier::ModifierMask;
use crate::native::{CarbonModifiers, NativeEventKind, NativeHotKey, NativeKeyEvent, VirtualKey};

/// Result of mapping one native key event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappedKey {
    /// Physical button, `None` when the virtual key has no button
    pub button: Option<KeyButton>,
    /// Key ids typed by the event; empty for releases and unmapped keys
    pub ids: KeySequence,
    /// Canonical modifiers to report with the ids
    pub mask: ModifierMask,
}

impl MappedKey {
    /// The single key id of this event
    pub fn key(&self) -> Option<KeyId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        !self.ids.is_empty()
    }
}

pub fn map_virtual_key_to_key_button(virtual_key: VirtualKey) -> Option<KeyButton> {
    u8::try_from(virtual_key).ok().map(KeyButton::from_virtual_key)
}

pub fn map_key_button_to_virtual_key(button: KeyButton) -> Option<VirtualKey> {
    button.virtual_key().map(VirtualKey::from)
}

/// Report Option as AltGr when it typed a glyph.
///
/// Option both types alternate glyphs and acts as a shortcut modifier. When
/// no command modifier is held and the keystroke produced a glyph, Option
/// is replaced by AltGr in the reported mask.
pub fn adjust_alt_gr(ids: &[KeyId], mask: ModifierMask, is_command: bool) -> ModifierMask {
    if is_command || !mask.contains(ModifierMask::SUPER) {
        return mask;
    }
    if !ids.iter().any(|id| id.is_glyph()) {
        return mask;
    }
    (mask - ModifierMask::SUPER) | ModifierMask::ALT_GR
}

/// Map a native key event through the canonical key map
pub fn map_key_from_event(map: &KeyMap, group: Group, event: &NativeKeyEvent) -> MappedKey {
    map_key(map, group, event, true)
}

pub(crate) fn map_key(
    map: &KeyMap,
    group: Group,
    event: &NativeKeyEvent,
    option_as_altgr: bool,
) -> MappedKey {
    let mask = ModifierMask::from_event_flags(event.flags);
    let Some(button) = map_virtual_key_to_key_button(event.virtual_key) else {
        log::trace!("virtual key {:#x} has no button", event.virtual_key);
        return MappedKey {
            button: None,
            ids: KeySequence::new(),
            mask,
        };
    };

    if event.kind == NativeEventKind::KeyUp {
        return MappedKey {
            button: Some(button),
            ids: KeySequence::new(),
            mask,
        };
    }

    let out_mask = mask - ModifierMask::ALT_GR;
    if let Some(id) = special_key(event.virtual_key) {
        let mut ids = KeySequence::new();
        ids.push(id);
        return MappedKey {
            button: Some(button),
            ids,
            mask: out_mask,
        };
    }

    // command shortcuts are looked up on the unmodified glyph
    let is_command = mask.intersects(ModifierMask::COMMAND);
    let mut lookup = mask & ModifierMask::GLYPH;
    if is_command {
        lookup.remove(ModifierMask::SUPER);
    }

    let ids = map
        .lookup(button, lookup, group)
        .map(|entry| entry.ids.clone())
        .unwrap_or_default();
    let mask = if option_as_altgr {
        adjust_alt_gr(&ids, out_mask, is_command)
    } else {
        out_mask
    };

    MappedKey {
        button: Some(button),
        ids,
        mask,
    }
}

/// Find the native key and modifiers that type `id` with `mask` held.
///
/// Returns `None` when the group's layout cannot produce the key.
pub fn map_hot_key_to_native(
    map: &KeyMap,
    group: Group,
    id: KeyId,
    mask: ModifierMask,
) -> Option<NativeHotKey> {
    let modifiers = CarbonModifiers::from_modifier_mask(mask);
    if id.is_none() {
        return Some(NativeHotKey {
            virtual_key: 0,
            modifiers,
        });
    }

    let mut want = mask & ModifierMask::GLYPH;
    if mask.contains(ModifierMask::ALT_GR) {
        want |= ModifierMask::SUPER;
    }

    let candidates = || map.find(id).iter().filter(|key| key.group == group);
    let key: &KeyMapKey = candidates()
        .find(|key| key.mask == want)
        .or_else(|| candidates().find(|key| want.contains(key.mask)))
        .or_else(|| candidates().next())?;

    let virtual_key = map_key_button_to_virtual_key(key.button)?;
    Some(NativeHotKey {
        virtual_key,
        modifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyMapEntry;
    use crate::native::{vk, EventFlags};
    use smallvec::smallvec;

    fn button(code: VirtualKey) -> KeyButton {
        map_virtual_key_to_key_button(code).unwrap()
    }

    fn sample_map() -> KeyMap {
        let mut map = KeyMap::new();
        let mut put = |code: VirtualKey, mask: ModifierMask, c: char| {
            let ids: KeySequence = smallvec![KeyId::from(c)];
            let entry_mask = adjust_alt_gr(&ids, mask, false);
            map.insert(
                KeyMapKey::new(button(code), mask, Group(0)),
                KeyMapEntry::new(ids, entry_mask),
            );
        };
        put(vk::ANSI_A, ModifierMask::empty(), 'a');
        put(vk::ANSI_A, ModifierMask::SHIFT, 'A');
        put(vk::ANSI_A, ModifierMask::SUPER, 'å');
        put(vk::ANSI_1, ModifierMask::empty(), '1');
        put(vk::ANSI_1, ModifierMask::SHIFT, '!');
        map
    }

    #[test]
    fn test_button_offset() {
        assert_eq!(map_virtual_key_to_key_button(0).map(KeyButton::get), Some(1));
        assert_eq!(map_virtual_key_to_key_button(0x100), None);
        assert_eq!(map_key_button_to_virtual_key(button(0x7E)), Some(0x7E));
    }

    #[test]
    fn test_key_down_maps_glyph() {
        let map = sample_map();
        let event = NativeKeyEvent::key_down(vk::ANSI_A, EventFlags::SHIFT);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::from('A')));
        assert_eq!(mapped.mask, ModifierMask::SHIFT);
        assert_eq!(mapped.button, Some(button(vk::ANSI_A)));
    }

    #[test]
    fn test_key_up_has_no_ids() {
        let map = sample_map();
        let event = NativeKeyEvent::key_up(vk::ANSI_A, EventFlags::empty());
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.button, Some(button(vk::ANSI_A)));
        assert!(!mapped.is_mapped());
    }

    #[test]
    fn test_option_glyph_reports_alt_gr() {
        let map = sample_map();
        let event = NativeKeyEvent::key_down(vk::ANSI_A, EventFlags::ALTERNATE);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::from('å')));
        assert_eq!(mapped.mask, ModifierMask::ALT_GR);
    }

    #[test]
    fn test_command_option_keeps_super() {
        let map = sample_map();
        let event = NativeKeyEvent::key_down(vk::ANSI_A, EventFlags::ALTERNATE | EventFlags::COMMAND);
        let mapped = map_key_from_event(&map, Group(0), &event);
        // option is stripped for the lookup, so the plain glyph comes out
        assert_eq!(mapped.key(), Some(KeyId::from('a')));
        assert_eq!(mapped.mask, ModifierMask::ALT | ModifierMask::SUPER);
    }

    #[test]
    fn test_special_keys_bypass_layout() {
        let map = KeyMap::new();
        let event = NativeKeyEvent::key_down(vk::LEFT_ARROW, EventFlags::ALTERNATE);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::LEFT));
        assert_eq!(mapped.mask, ModifierMask::SUPER);
    }

    #[test]
    fn test_unknown_virtual_key() {
        let event = NativeKeyEvent::key_down(0x1FF, EventFlags::empty());
        let mapped = map_key_from_event(&KeyMap::new(), Group(0), &event);
        assert_eq!(mapped.button, None);
        assert!(!mapped.is_mapped());
    }

    #[test]
    fn test_adjust_alt_gr() {
        let glyph = [KeyId::from('@')];
        let named = [KeyId::LEFT];
        assert_eq!(
            adjust_alt_gr(&glyph, ModifierMask::SUPER, false),
            ModifierMask::ALT_GR
        );
        assert_eq!(
            adjust_alt_gr(&glyph, ModifierMask::SUPER, true),
            ModifierMask::SUPER
        );
        assert_eq!(
            adjust_alt_gr(&named, ModifierMask::SUPER, false),
            ModifierMask::SUPER
        );
        assert_eq!(
            adjust_alt_gr(&glyph, ModifierMask::SHIFT, false),
            ModifierMask::SHIFT
        );
        assert_eq!(
            adjust_alt_gr(&[KeyId::KP_EQUAL], ModifierMask::SUPER | ModifierMask::SHIFT, false),
            ModifierMask::ALT_GR | ModifierMask::SHIFT
        );
    }

    #[test]
    fn test_hot_key_prefers_exact_mask() {
        let map = sample_map();
        let hot = map_hot_key_to_native(&map, Group(0), KeyId::from('!'), ModifierMask::SHIFT).unwrap();
        assert_eq!(hot.virtual_key, vk::ANSI_1);
        assert_eq!(hot.modifiers, CarbonModifiers::SHIFT);
    }

    #[test]
    fn test_hot_key_falls_back_to_subset() {
        let map = sample_map();
        let hot = map_hot_key_to_native(
            &map,
            Group(0),
            KeyId::from('a'),
            ModifierMask::ALT | ModifierMask::SHIFT,
        )
        .unwrap();
        assert_eq!(hot.virtual_key, vk::ANSI_A);
        assert_eq!(hot.modifiers, CarbonModifiers::CMD | CarbonModifiers::SHIFT);
    }

    #[test]
    fn test_hot_key_alt_gr_uses_option() {
        let map = sample_map();
        let hot = map_hot_key_to_native(&map, Group(0), KeyId::from('å'), ModifierMask::ALT_GR).unwrap();
        assert_eq!(hot.virtual_key, vk::ANSI_A);
        assert_eq!(hot.modifiers, CarbonModifiers::OPTION);
    }

    #[test]
    fn test_hot_key_unknown() {
        let map = sample_map();
        assert_eq!(
            map_hot_key_to_native(&map, Group(0), KeyId::from('ß'), ModifierMask::empty()),
            None
        );
        assert_eq!(
            map_hot_key_to_native(&map, Group(1), KeyId::from('a'), ModifierMask::empty()),
            None
        );
        let none = map_hot_key_to_native(&map, Group(0), KeyId::NONE, ModifierMask::CONTROL).unwrap();
        assert_eq!(none.virtual_key, 0);
        assert_eq!(none.modifiers, CarbonModifiers::CONTROL);
    }
}
