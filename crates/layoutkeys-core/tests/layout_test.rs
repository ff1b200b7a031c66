// Layoutkeys Layout Integration Tests
//
// These tests verify the decoding pipeline:
// uchr blob -> UchrKeyResource -> KeyMapBuilder -> mapper lookups
//
// Run with: cargo test -p layoutkeys-core --test layout_test

mod common;

mod tests {
    use std::sync::Arc;

    use layoutkeys_core::layout::uchr::output::NONE;
    use layoutkeys_core::layout::{
        DeadKeyState, KeyResource, StateEntries, StateRecord, UchrBuilder, UchrKeyResource,
    };
    use layoutkeys_core::native::vk;
    use layoutkeys_core::{
        map_hot_key_to_native, map_key_from_event, EventFlags, Group, KeyButton, KeyId, KeyMap,
        KeyMapBuilder, ModifierMask, NativeKeyEvent,
    };

    use crate::common::{us_layout, OPTION_INDEX, SHIFT_INDEX};

    fn resource(builder: &UchrBuilder) -> Arc<dyn KeyResource> {
        Arc::new(UchrKeyResource::parse(builder.build(), 40).unwrap())
    }

    fn us_map() -> KeyMap {
        KeyMapBuilder::new().build(&[resource(&us_layout())])
    }

    #[test]
    fn test_shifted_letter_lands_one_button_up() {
        // virtual key 18 types 'A' with shift
        let mut b = UchrBuilder::new(32);
        b.add_table();
        let shift = b.add_table();
        b.map_modifier(SHIFT_INDEX, shift);
        b.set_char(shift, 18, 'A');
        let map = KeyMapBuilder::new().build(&[resource(&b)]);

        let button = KeyButton::new(19).unwrap();
        let entry = map.lookup(button, ModifierMask::SHIFT, Group(0)).unwrap();
        assert_eq!(entry.key(), Some(KeyId::from('A')));

        let hot = map_hot_key_to_native(&map, Group(0), KeyId::from('A'), ModifierMask::SHIFT).unwrap();
        assert_eq!(hot.virtual_key, 18);
        assert_eq!(ModifierMask::from_carbon(hot.modifiers), ModifierMask::SHIFT);
    }

    #[test]
    fn test_dead_key_entry() {
        let map = us_map();
        let e = KeyButton::from_virtual_key(vk::ANSI_E as u8);
        let entry = map.lookup(e, ModifierMask::SUPER, Group(0)).unwrap();
        assert!(entry.dead);
        assert_eq!(entry.key(), Some(KeyId::DEAD_ACUTE));
    }

    #[test]
    fn test_acute_then_e_composes() {
        let r = resource(&us_layout());
        let option = r.table_for_modifier(OPTION_INDEX);
        let plain = r.table_for_modifier(0);
        let e = u32::from(vk::ANSI_E);

        let armed = r.translate(option, e, DeadKeyState::IDLE);
        assert!(armed.is_pending());
        let composed = r.translate(plain, e, armed.state);
        assert_eq!(composed.keys.as_slice(), [KeyId::from('é')]);
        assert!(!composed.state.is_pending());
    }

    #[test]
    fn test_acute_then_unmatched_key() {
        let r = resource(&us_layout());
        let option = r.table_for_modifier(OPTION_INDEX);
        let plain = r.table_for_modifier(0);

        let armed = r.translate(option, u32::from(vk::ANSI_E), DeadKeyState::IDLE);
        let out = r.translate(plain, u32::from(vk::ANSI_S), armed.state);
        assert_eq!(out.keys.as_slice(), [KeyId::from('´'), KeyId::from('s')]);
        assert!(!out.state.is_pending());
    }

    #[test]
    fn test_acute_then_space() {
        let r = resource(&us_layout());
        let option = r.table_for_modifier(OPTION_INDEX);
        let plain = r.table_for_modifier(0);

        let armed = r.translate(option, u32::from(vk::ANSI_E), DeadKeyState::IDLE);
        let out = r.translate(plain, u32::from(vk::SPACE), armed.state);
        assert_eq!(out.keys.as_slice(), [KeyId::from('´')]);
    }

    #[test]
    fn test_chained_dead_keys_compose() {
        // acute arms state 1, diaeresis moves 1 to 3, u types the
        // double-accented letter from 3
        const U: u32 = 0x20;
        let mut b = UchrBuilder::new(64);
        let plain = b.add_table();
        let option = b.add_table();
        b.map_modifier(OPTION_INDEX, option);

        let acute = b.add_terminator('´');
        let diaeresis = b.add_terminator('¨');
        let both = b.add_terminator('˝');
        assert_eq!((acute, diaeresis, both), (1, 2, 3));

        let dead_acute = b.add_state_record(StateRecord::dead(acute));
        let dead_diaeresis = b.add_state_record(StateRecord::raw(
            NONE,
            diaeresis,
            StateEntries::Range(vec![(acute, 0, 0, NONE, both)]),
        ));
        let u = b.add_state_record(StateRecord::new(
            'u',
            StateEntries::Terminal(vec![(acute, 0x00FA), (diaeresis, 0x00FC), (both, 0x01D8)]),
        ));
        b.set_state(option, u32::from(vk::ANSI_E), dead_acute);
        b.set_state(option, U, dead_diaeresis);
        b.set_state(plain, U, u);

        let r = resource(&b);
        let option = r.table_for_modifier(OPTION_INDEX);
        let plain = r.table_for_modifier(0);

        let first = r.translate(option, u32::from(vk::ANSI_E), DeadKeyState::IDLE);
        assert!(first.is_pending());
        assert_eq!(first.state, DeadKeyState(acute));

        let second = r.translate(option, U, first.state);
        assert!(second.is_pending());
        assert_eq!(second.state, DeadKeyState(both));

        let third = r.translate(plain, U, second.state);
        assert_eq!(third.keys.as_slice(), [KeyId::from('ǘ')]);
        assert_eq!(third.state, DeadKeyState::IDLE);

        // diaeresis alone still composes with u
        let armed = r.translate(option, U, DeadKeyState::IDLE);
        let out = r.translate(plain, U, armed.state);
        assert_eq!(out.keys.as_slice(), [KeyId::from('ü')]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let blob = us_layout().build();
        let a: Arc<dyn KeyResource> = Arc::new(UchrKeyResource::new(blob.clone(), 40));
        let b: Arc<dyn KeyResource> = Arc::new(UchrKeyResource::new(blob, 40));
        let first = KeyMapBuilder::new().build(&[a]);
        let second = KeyMapBuilder::new().build(&[b]);

        let first: Vec<_> = first.iter().collect();
        let second: Vec<_> = second.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_hot_key_round_trip() {
        let map = us_map();
        let mut checked = 0;
        for (key, entry) in map.iter() {
            let Some(id) = entry.key() else { continue };
            let hot = map_hot_key_to_native(&map, key.group, id, key.mask)
                .unwrap_or_else(|| panic!("no hot key for {}", id));

            let flags = EventFlags::from_modifier_mask(ModifierMask::from_carbon(hot.modifiers));
            let event = NativeKeyEvent::key_down(hot.virtual_key, flags);
            let mapped = map_key_from_event(&map, key.group, &event);
            assert_eq!(mapped.key(), Some(id), "round trip of {} with {:?}", id, key.mask);
            checked += 1;
        }
        assert!(checked > 40);
    }

    #[test]
    fn test_control_keys_decode_to_named_keys() {
        let map = us_map();
        let lookup = |code: u16| {
            map.lookup(KeyButton::from_virtual_key(code as u8), ModifierMask::empty(), Group(0))
                .and_then(|entry| entry.key())
        };
        assert_eq!(lookup(vk::RETURN), Some(KeyId::RETURN));
        assert_eq!(lookup(vk::TAB), Some(KeyId::TAB));
        assert_eq!(lookup(vk::DELETE), Some(KeyId::BACKSPACE));
        assert_eq!(lookup(vk::ESCAPE), Some(KeyId::ESCAPE));
        assert_eq!(lookup(vk::FORWARD_DELETE), Some(KeyId::DELETE));
    }

    #[test]
    fn test_option_glyph_reports_alt_gr() {
        let map = us_map();
        let event = NativeKeyEvent::key_down(vk::ANSI_S, EventFlags::ALTERNATE);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::from('ß')));
        assert_eq!(mapped.mask, ModifierMask::ALT_GR);

        let event = NativeKeyEvent::key_down(vk::ANSI_S, EventFlags::ALTERNATE | EventFlags::COMMAND);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::from('s')));
        assert_eq!(mapped.mask, ModifierMask::ALT | ModifierMask::SUPER);
    }

    #[test]
    fn test_caps_lock_table() {
        let map = us_map();
        let event = NativeKeyEvent::key_down(vk::ANSI_A, EventFlags::ALPHA_SHIFT);
        let mapped = map_key_from_event(&map, Group(0), &event);
        assert_eq!(mapped.key(), Some(KeyId::from('A')));
        assert_eq!(mapped.mask, ModifierMask::CAPS_LOCK);
    }

    #[test]
    fn test_map_is_shared_across_threads() {
        let handle = layoutkeys_core::KeyMapHandle::new(us_map());
        let reader = handle.clone();
        let len = std::thread::spawn(move || reader.snapshot().len())
            .join()
            .unwrap();
        assert_eq!(len, handle.snapshot().len());
        assert!(len > 0);
    }
}
