// Layoutkeys Modifier System
// Canonical modifier masks and the roles tracked for reconciliation

use std::fmt;

use bitflags::bitflags;
use strum_macros::{AsRefStr, EnumIter};

use crate::native::{vk, CarbonModifiers, EventFlags, VirtualKey};
use crate::{KeyButton, KeyId};

bitflags! {
    /// Platform-independent set of modifier roles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct ModifierMask: u32 {
        const SHIFT = 0x0001;
        const CONTROL = 0x0002;
        const ALT = 0x0004;
        const META = 0x0008;
        const SUPER = 0x0010;
        const ALT_GR = 0x0020;
        const CAPS_LOCK = 0x1000;
        const NUM_LOCK = 0x2000;
        const SCROLL_LOCK = 0x4000;
    }
}

impl ModifierMask {
    /// Modifiers that select which glyph a key produces
    pub const GLYPH: ModifierMask = ModifierMask::SHIFT
        .union(ModifierMask::CAPS_LOCK)
        .union(ModifierMask::SUPER);

    /// Modifiers that mark a keystroke as a command or shortcut
    pub const COMMAND: ModifierMask = ModifierMask::ALT.union(ModifierMask::CONTROL);

    /// Convert native event flags to a canonical mask.
    ///
    /// Command acts as Alt and Option as Super, so that Option stays free to
    /// work as AltGr.
    pub fn from_event_flags(flags: EventFlags) -> Self {
        let mut out = ModifierMask::empty();
        if flags.contains(EventFlags::SHIFT) {
            out |= ModifierMask::SHIFT;
        }
        if flags.contains(EventFlags::CONTROL) {
            out |= ModifierMask::CONTROL;
        }
        if flags.contains(EventFlags::ALTERNATE) {
            out |= ModifierMask::SUPER;
        }
        if flags.contains(EventFlags::COMMAND) {
            out |= ModifierMask::ALT;
        }
        if flags.contains(EventFlags::ALPHA_SHIFT) {
            out |= ModifierMask::CAPS_LOCK;
        }
        if flags.contains(EventFlags::NUMERIC_PAD) {
            out |= ModifierMask::NUM_LOCK;
        }
        out
    }

    /// Convert layout-table modifiers to a canonical mask
    pub fn from_carbon(carbon: CarbonModifiers) -> Self {
        let mut out = ModifierMask::empty();
        if carbon.intersects(CarbonModifiers::SHIFT | CarbonModifiers::RIGHT_SHIFT) {
            out |= ModifierMask::SHIFT;
        }
        if carbon.intersects(CarbonModifiers::CONTROL | CarbonModifiers::RIGHT_CONTROL) {
            out |= ModifierMask::CONTROL;
        }
        if carbon.contains(CarbonModifiers::CMD) {
            out |= ModifierMask::ALT;
        }
        if carbon.intersects(CarbonModifiers::OPTION | CarbonModifiers::RIGHT_OPTION) {
            out |= ModifierMask::SUPER;
        }
        if carbon.contains(CarbonModifiers::ALPHA_LOCK) {
            out |= ModifierMask::CAPS_LOCK;
        }
        if carbon.contains(CarbonModifiers::NUM_LOCK) {
            out |= ModifierMask::NUM_LOCK;
        }
        out
    }

    /// Canonical mask for a layout modifier-combination index
    pub fn from_modifier_index(index: u32) -> Self {
        Self::from_carbon(CarbonModifiers::from_modifier_index(index))
    }
}

impl CarbonModifiers {
    /// Convert a canonical mask to layout-table modifiers.
    ///
    /// AltGr has no native key of its own and is expressed as Option.
    pub fn from_modifier_mask(mask: ModifierMask) -> Self {
        let mut out = CarbonModifiers::empty();
        if mask.contains(ModifierMask::SHIFT) {
            out |= CarbonModifiers::SHIFT;
        }
        if mask.contains(ModifierMask::CONTROL) {
            out |= CarbonModifiers::CONTROL;
        }
        if mask.contains(ModifierMask::ALT) {
            out |= CarbonModifiers::CMD;
        }
        if mask.intersects(ModifierMask::SUPER | ModifierMask::ALT_GR) {
            out |= CarbonModifiers::OPTION;
        }
        if mask.contains(ModifierMask::CAPS_LOCK) {
            out |= CarbonModifiers::ALPHA_LOCK;
        }
        if mask.contains(ModifierMask::NUM_LOCK) {
            out |= CarbonModifiers::NUM_LOCK;
        }
        out
    }
}

impl EventFlags {
    /// Convert a canonical mask to native event flags
    pub fn from_modifier_mask(mask: ModifierMask) -> Self {
        let mut out = EventFlags::empty();
        if mask.contains(ModifierMask::SHIFT) {
            out |= EventFlags::SHIFT;
        }
        if mask.contains(ModifierMask::CONTROL) {
            out |= EventFlags::CONTROL;
        }
        if mask.contains(ModifierMask::ALT) {
            out |= EventFlags::COMMAND;
        }
        if mask.intersects(ModifierMask::SUPER | ModifierMask::ALT_GR) {
            out |= EventFlags::ALTERNATE;
        }
        if mask.contains(ModifierMask::CAPS_LOCK) {
            out |= EventFlags::ALPHA_SHIFT;
        }
        if mask.contains(ModifierMask::NUM_LOCK) {
            out |= EventFlags::NUMERIC_PAD;
        }
        out
    }
}

/// A modifier role tracked by the modifier reconciler.
///
/// Declaration order is the order in which reconciliation emits events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Super,
    CapsLock,
}

impl Modifier {
    /// Canonical mask bit for this role
    pub fn mask(self) -> ModifierMask {
        match self {
            Modifier::Shift => ModifierMask::SHIFT,
            Modifier::Control => ModifierMask::CONTROL,
            Modifier::Alt => ModifierMask::ALT,
            Modifier::Super => ModifierMask::SUPER,
            Modifier::CapsLock => ModifierMask::CAPS_LOCK,
        }
    }

    /// Key id reported when this role goes down or up
    pub fn key_id(self) -> KeyId {
        match self {
            Modifier::Shift => KeyId::SHIFT_L,
            Modifier::Control => KeyId::CONTROL_L,
            Modifier::Alt => KeyId::ALT_L,
            Modifier::Super => KeyId::SUPER_L,
            Modifier::CapsLock => KeyId::CAPS_LOCK,
        }
    }

    /// Native key that carries this role
    pub fn virtual_key(self) -> VirtualKey {
        match self {
            Modifier::Shift => vk::SHIFT,
            Modifier::Control => vk::CONTROL,
            Modifier::Alt => vk::COMMAND,
            Modifier::Super => vk::OPTION,
            Modifier::CapsLock => vk::CAPS_LOCK,
        }
    }

    /// Button of the left-hand key carrying this role
    pub fn button(self) -> KeyButton {
        // modifier virtual keys all sit below 0x40
        KeyButton::from_virtual_key(self.virtual_key() as u8)
    }

    /// Role carried by a native key, left or right hand
    pub fn from_virtual_key(virtual_key: VirtualKey) -> Option<Modifier> {
        match virtual_key {
            vk::SHIFT | vk::RIGHT_SHIFT => Some(Modifier::Shift),
            vk::CONTROL | vk::RIGHT_CONTROL => Some(Modifier::Control),
            vk::COMMAND | vk::RIGHT_COMMAND => Some(Modifier::Alt),
            vk::OPTION | vk::RIGHT_OPTION => Some(Modifier::Super),
            vk::CAPS_LOCK => Some(Modifier::CapsLock),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}
