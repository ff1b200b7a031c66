// Layoutkeys Key Resources
// Read-only view over one native keyboard layout table

use crate::key::{KeyId, KeySequence};
use crate::layout::macroman::MAC_ROMAN_HIGH;

/// Pending dead-key state between two keystrokes.
///
/// Zero means no dead key is pending. The value is a state number defined
/// by the layout resource that produced it and is meaningless elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeadKeyState(pub u16);

impl DeadKeyState {
    pub const IDLE: DeadKeyState = DeadKeyState(0);

    /// Returns true while a dead key waits for the next keystroke
    pub fn is_pending(self) -> bool {
        self.0 != 0
    }
}

/// Result of one keystroke through a layout's dead-key state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    /// Key ids produced by this keystroke, in output order
    pub keys: KeySequence,
    /// State to feed into the next keystroke
    pub state: DeadKeyState,
}

impl Translation {
    /// Returns true when the keystroke only armed a dead key
    pub fn is_pending(&self) -> bool {
        self.keys.is_empty() && self.state.is_pending()
    }
}

/// A read-only native keyboard layout table.
///
/// A resource maps each modifier combination to an output table and each
/// (table, button) cell to the key ids it produces. Several modifier
/// combinations commonly share one table.
///
/// Indexed lookups must stay within `num_tables()` and `num_buttons()`;
/// callers that violate the bounds get an empty result in release builds.
pub trait KeyResource: Send + Sync {
    /// Whether the underlying data was structurally well formed
    fn is_valid(&self) -> bool;

    /// Number of modifier combinations addressed by `table_for_modifier`
    fn num_modifier_combinations(&self) -> u32;

    /// Number of output tables
    fn num_tables(&self) -> u32;

    /// Number of physical buttons per table
    fn num_buttons(&self) -> u32;

    /// Output table used for a modifier-combination index
    fn table_for_modifier(&self, index: u32) -> u32;

    /// Key ids produced by one cell, with dead keys resolved to their
    /// dead-key ids. Empty when the cell produces nothing.
    fn keys(&self, table: u32, button: u32) -> KeySequence;

    /// Run one keystroke through the dead-key state machine
    fn translate(&self, table: u32, button: u32, state: DeadKeyState) -> Translation;

    /// The single key id produced by one cell
    fn key(&self, table: u32, button: u32) -> Option<KeyId> {
        match self.keys(table, button).as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Whether the cell is a dead key
    fn is_dead(&self, table: u32, button: u32) -> bool {
        self.key(table, button).is_some_and(KeyId::is_dead)
    }
}

/// Convert a character in the legacy single-byte script (Mac OS Roman) to
/// a key id.
pub fn key_id_from_mac_roman(c: u8) -> Option<KeyId> {
    match c {
        0 => None,
        0x20..=0x7E => Some(KeyId(u32::from(c))),
        0x80..=0xFF => unichar_to_key_id(MAC_ROMAN_HIGH[usize::from(c - 0x80)]),
        _ => unichar_to_key_id(u16::from(c)),
    }
}

/// Convert a UTF-16 code unit produced by a layout to a key id.
///
/// Control characters with a key meaning map to named keys; other
/// controls, lone surrogates and non-characters have no key.
pub fn unichar_to_key_id(c: u16) -> Option<KeyId> {
    match c {
        3 => Some(KeyId::KP_ENTER),
        8 => Some(KeyId::BACKSPACE),
        9 => Some(KeyId::TAB),
        13 => Some(KeyId::RETURN),
        27 => Some(KeyId::ESCAPE),
        127 => Some(KeyId::DELETE),
        0..=31 => None,
        0xD800..=0xDFFF => None,
        0xFFFE | 0xFFFF => None,
        _ => Some(KeyId(u32::from(c))),
    }
}
