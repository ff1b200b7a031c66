// Layoutkeys Core Library
// Native keyboard layout decoding and canonical key mapping

pub mod action;
pub mod key;
pub mod keymap;
pub mod layout;
pub mod mapper;
pub mod modifier;
pub mod native;
pub mod settings;
pub mod state;

pub use action::Action;
pub use key::{key_from_name, key_name, KeyButton, KeyId, KeySequence, KEY_BUTTON_OFFSET};
pub use keymap::{Group, KeyMap, KeyMapBuilder, KeyMapEntry, KeyMapHandle, KeyMapKey};
pub use layout::{
    DeadKeyState, KeyResource, LayoutError, Translation, UchrBuilder, UchrKeyResource,
};
pub use mapper::{
    adjust_alt_gr, map_hot_key_to_native, map_key_button_to_virtual_key, map_key_from_event,
    map_virtual_key_to_key_button, MappedKey,
};
pub use modifier::{Modifier, ModifierMask};
pub use native::{CarbonModifiers, EventFlags, NativeEventKind, NativeHotKey, NativeKeyEvent, VirtualKey};
pub use settings::{LayoutSource, Settings, SettingsError};
pub use state::{
    InstalledLayout, KeyEventSink, KeyState, Keystroke, LayoutId, ModifierEvent, ModifierEvents,
    ModifierTracker, PressedKeyState,
};
