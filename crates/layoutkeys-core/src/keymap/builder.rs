// Layoutkeys Key Map Builder
// Walks every layout resource and builds the canonical key map

use std::sync::Arc;

use smallvec::smallvec;

use crate::key::KeyButton;
use crate::keymap::{special::SPECIAL_KEYS, Group, KeyMap, KeyMapEntry, KeyMapKey};
use crate::layout::KeyResource;
use crate::mapper::adjust_alt_gr;
use crate::modifier::ModifierMask;
use crate::native::CarbonModifiers;

/// Layout tables are addressed by one byte
const MAX_BUTTONS: u32 = 256;

/// Modifier combinations that select glyphs; command and control never do
const MAX_COMBINATIONS: u32 = 32;

/// Builds a [`KeyMap`] from the resources of every installed group
#[derive(Debug, Clone, Copy)]
pub struct KeyMapBuilder {
    option_as_altgr: bool,
}

impl Default for KeyMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMapBuilder {
    pub fn new() -> Self {
        Self {
            option_as_altgr: true,
        }
    }

    /// Record glyphs typed with Option as AltGr glyphs
    pub fn option_as_altgr(mut self, enabled: bool) -> Self {
        self.option_as_altgr = enabled;
        self
    }

    /// Build the map; the group of each resource is its position
    pub fn build(&self, groups: &[Arc<dyn KeyResource>]) -> KeyMap {
        let mut map = KeyMap::new();
        for (index, resource) in groups.iter().enumerate() {
            let Ok(group) = u8::try_from(index) else {
                log::warn!("ignoring {} layouts past the last group", groups.len() - index);
                break;
            };
            let group = Group(group);
            if !resource.is_valid() {
                log::warn!("skipping invalid layout in group {}", group);
                continue;
            }
            self.add_layout(&mut map, group, resource.as_ref());
        }
        log::debug!(
            "built key map with {} entries for {} groups",
            map.len(),
            groups.len()
        );
        map
    }

    fn add_layout(&self, map: &mut KeyMap, group: Group, resource: &dyn KeyResource) {
        let command = CarbonModifiers::COMMAND_MODIFIERS.modifier_index();
        let buttons = resource.num_buttons().min(MAX_BUTTONS);
        let combinations = resource.num_modifier_combinations().min(MAX_COMBINATIONS);

        for index in (0..combinations).filter(|index| index & command == 0) {
            let table = resource.table_for_modifier(index);
            if table >= resource.num_tables() {
                log::trace!("modifier combination {} has no table", index);
                continue;
            }
            let mask = ModifierMask::from_modifier_index(index);

            for code in 0..buttons {
                let ids = resource.keys(table, code);
                if ids.is_empty() {
                    continue;
                }
                // buttons is capped at 256
                let button = KeyButton::from_virtual_key(code as u8);
                if matches!(ids.as_slice(), [id] if id.is_locking()) {
                    map.add_half_duplex(button);
                }
                let entry_mask = if self.option_as_altgr {
                    adjust_alt_gr(&ids, mask, false)
                } else {
                    mask
                };
                map.insert(
                    KeyMapKey::new(button, mask, group),
                    KeyMapEntry::new(ids, entry_mask),
                );
            }
        }

        for &(virtual_key, id) in SPECIAL_KEYS {
            let Ok(code) = u8::try_from(virtual_key) else {
                continue;
            };
            let button = KeyButton::from_virtual_key(code);
            for mask in glyph_masks() {
                map.insert(
                    KeyMapKey::new(button, mask, group),
                    KeyMapEntry::new(smallvec![id], mask),
                );
            }
            if id.is_locking() {
                map.add_half_duplex(button);
            }
        }
    }
}

/// Every combination of shift, caps lock and super
fn glyph_masks() -> impl Iterator<Item = ModifierMask> {
    // shift, alpha lock and option are bits 1..=3 of the combination index
    (0..8u32).map(|bits| ModifierMask::from_modifier_index(bits << 1))
}
