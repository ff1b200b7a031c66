// Layoutkeys Native Types
// Platform virtual key codes, modifier encodings and raw key events

use bitflags::bitflags;

/// Native virtual key code as carried by key events.
pub type VirtualKey = u16;

/// Hardware virtual key codes (`kVK_*`) used by the hard-coded key tables.
pub mod vk {
    use super::VirtualKey;

    pub const ANSI_A: VirtualKey = 0x00;
    pub const ANSI_S: VirtualKey = 0x01;
    pub const ANSI_E: VirtualKey = 0x0E;
    pub const ANSI_1: VirtualKey = 0x12;
    pub const RETURN: VirtualKey = 0x24;
    pub const TAB: VirtualKey = 0x30;
    pub const SPACE: VirtualKey = 0x31;
    pub const DELETE: VirtualKey = 0x33;
    pub const ESCAPE: VirtualKey = 0x35;
    pub const RIGHT_COMMAND: VirtualKey = 0x36;
    pub const COMMAND: VirtualKey = 0x37;
    pub const SHIFT: VirtualKey = 0x38;
    pub const CAPS_LOCK: VirtualKey = 0x39;
    pub const OPTION: VirtualKey = 0x3A;
    pub const CONTROL: VirtualKey = 0x3B;
    pub const RIGHT_SHIFT: VirtualKey = 0x3C;
    pub const RIGHT_OPTION: VirtualKey = 0x3D;
    pub const RIGHT_CONTROL: VirtualKey = 0x3E;
    pub const FUNCTION: VirtualKey = 0x3F;
    pub const F17: VirtualKey = 0x40;
    pub const VOLUME_UP: VirtualKey = 0x48;
    pub const VOLUME_DOWN: VirtualKey = 0x49;
    pub const MUTE: VirtualKey = 0x4A;
    pub const KEYPAD_CLEAR: VirtualKey = 0x47;
    pub const KEYPAD_ENTER: VirtualKey = 0x4C;
    pub const F18: VirtualKey = 0x4F;
    pub const F19: VirtualKey = 0x50;
    pub const F20: VirtualKey = 0x5A;
    pub const F5: VirtualKey = 0x60;
    pub const F6: VirtualKey = 0x61;
    pub const F7: VirtualKey = 0x62;
    pub const F3: VirtualKey = 0x63;
    pub const F8: VirtualKey = 0x64;
    pub const F9: VirtualKey = 0x65;
    pub const F11: VirtualKey = 0x67;
    pub const F13: VirtualKey = 0x69;
    pub const F16: VirtualKey = 0x6A;
    pub const F14: VirtualKey = 0x6B;
    pub const F10: VirtualKey = 0x6D;
    pub const F12: VirtualKey = 0x6F;
    pub const F15: VirtualKey = 0x71;
    pub const HELP: VirtualKey = 0x72;
    pub const HOME: VirtualKey = 0x73;
    pub const PAGE_UP: VirtualKey = 0x74;
    pub const FORWARD_DELETE: VirtualKey = 0x75;
    pub const F4: VirtualKey = 0x76;
    pub const END: VirtualKey = 0x77;
    pub const F2: VirtualKey = 0x78;
    pub const PAGE_DOWN: VirtualKey = 0x79;
    pub const F1: VirtualKey = 0x7A;
    pub const LEFT_ARROW: VirtualKey = 0x7B;
    pub const RIGHT_ARROW: VirtualKey = 0x7C;
    pub const DOWN_ARROW: VirtualKey = 0x7D;
    pub const UP_ARROW: VirtualKey = 0x7E;
    pub const LAUNCHPAD: VirtualKey = 0x83;
    pub const BRIGHTNESS_UP: VirtualKey = 0x90;
    pub const BRIGHTNESS_DOWN: VirtualKey = 0x91;
    pub const MISSION_CONTROL: VirtualKey = 0xA0;
}

bitflags! {
    /// Modifier flags carried on native key events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u64 {
        const ALPHA_SHIFT = 0x0001_0000;
        const SHIFT = 0x0002_0000;
        const CONTROL = 0x0004_0000;
        const ALTERNATE = 0x0008_0000;
        const COMMAND = 0x0010_0000;
        const NUMERIC_PAD = 0x0020_0000;
        const HELP = 0x0040_0000;
        const SECONDARY_FN = 0x0080_0000;
    }
}

bitflags! {
    /// Old-style modifier bits used to address layout tables.
    ///
    /// Bits 8..16 shifted down by 8 form the modifier-combination index of
    /// a layout resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CarbonModifiers: u32 {
        const CMD = 0x0100;
        const SHIFT = 0x0200;
        const ALPHA_LOCK = 0x0400;
        const OPTION = 0x0800;
        const CONTROL = 0x1000;
        const RIGHT_SHIFT = 0x2000;
        const RIGHT_OPTION = 0x4000;
        const RIGHT_CONTROL = 0x8000;
        const NUM_LOCK = 0x0001_0000;
    }
}

impl CarbonModifiers {
    /// Modifiers that turn a keystroke into a command rather than a glyph
    pub const COMMAND_MODIFIERS: CarbonModifiers = CarbonModifiers::CMD
        .union(CarbonModifiers::CONTROL)
        .union(CarbonModifiers::RIGHT_CONTROL);

    /// Convert event flags to layout-table modifiers
    pub fn from_event_flags(flags: EventFlags) -> Self {
        let mut out = CarbonModifiers::empty();
        if flags.contains(EventFlags::SHIFT) {
            out |= CarbonModifiers::SHIFT;
        }
        if flags.contains(EventFlags::CONTROL) {
            out |= CarbonModifiers::CONTROL;
        }
        if flags.contains(EventFlags::COMMAND) {
            out |= CarbonModifiers::CMD;
        }
        if flags.contains(EventFlags::ALTERNATE) {
            out |= CarbonModifiers::OPTION;
        }
        if flags.contains(EventFlags::ALPHA_SHIFT) {
            out |= CarbonModifiers::ALPHA_LOCK;
        }
        if flags.contains(EventFlags::NUMERIC_PAD) {
            out |= CarbonModifiers::NUM_LOCK;
        }
        out
    }

    /// Modifier-combination index used by layout resources
    pub fn modifier_index(self) -> u32 {
        (self.bits() >> 8) & 0xFF
    }

    /// Inverse of [`CarbonModifiers::modifier_index`]
    pub fn from_modifier_index(index: u32) -> Self {
        CarbonModifiers::from_bits_truncate((index & 0xFF) << 8)
    }
}

/// Kind of a native keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    KeyDown,
    KeyUp,
    FlagsChanged,
}

/// A raw key event as delivered by the host event queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeKeyEvent {
    pub kind: NativeEventKind,
    pub virtual_key: VirtualKey,
    pub flags: EventFlags,
    pub autorepeat: bool,
}

impl NativeKeyEvent {
    /// Key press with the given modifier flags
    pub fn key_down(virtual_key: VirtualKey, flags: EventFlags) -> Self {
        Self {
            kind: NativeEventKind::KeyDown,
            virtual_key,
            flags,
            autorepeat: false,
        }
    }

    /// Key release with the given modifier flags
    pub fn key_up(virtual_key: VirtualKey, flags: EventFlags) -> Self {
        Self {
            kind: NativeEventKind::KeyUp,
            virtual_key,
            flags,
            autorepeat: false,
        }
    }

    /// Mark this event as generated by key auto-repeat
    pub fn with_autorepeat(mut self) -> Self {
        self.autorepeat = true;
        self
    }
}

/// Native key and modifiers that reproduce a hot key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHotKey {
    pub virtual_key: VirtualKey,
    pub modifiers: CarbonModifiers,
}
