// Layoutkeys State Module
// Live keyboard state: modifiers, held buttons and the key state facade

pub mod key_state;
pub mod modifiers;
pub mod pressed;

pub use key_state::{InstalledLayout, KeyEventSink, KeyState, Keystroke, LayoutId};
pub use modifiers::{ModifierEvent, ModifierEvents, ModifierTracker};
pub use pressed::PressedKeyState;
