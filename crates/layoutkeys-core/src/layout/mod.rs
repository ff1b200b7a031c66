// Layoutkeys Layout Module
// Native layout resources and the uchr decoder

pub mod builder;
mod macroman;
pub mod resource;
pub mod uchr;

pub use builder::{StateEntries, StateRecord, UchrBuilder};
pub use resource::{key_id_from_mac_roman, unichar_to_key_id, DeadKeyState, KeyResource, Translation};
pub use uchr::{LayoutError, UchrKeyResource, DEFAULT_KEYBOARD_TYPE};
