// Layoutkeys Key Map
// Canonical (button, modifiers, group) to key id map with a reverse index

pub mod builder;
pub mod special;

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::key::{KeyButton, KeyId, KeySequence};
use crate::modifier::ModifierMask;

pub use builder::KeyMapBuilder;
pub use special::{special_key, special_virtual_key, SPECIAL_KEYS};

/// Index of an installed keyboard layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Group(pub u8);

impl Group {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup key of the canonical map.
///
/// `mask` only ever holds glyph modifiers (shift, caps lock, super).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyMapKey {
    pub button: KeyButton,
    pub mask: ModifierMask,
    pub group: Group,
}

impl KeyMapKey {
    pub fn new(button: KeyButton, mask: ModifierMask, group: Group) -> Self {
        Self {
            button,
            mask: mask & ModifierMask::GLYPH,
            group,
        }
    }
}

/// What one key position produces under one modifier combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapEntry {
    pub ids: KeySequence,
    /// Canonical modifiers in effect, after AltGr adjustment
    pub mask: ModifierMask,
    /// True when the position is a dead key
    pub dead: bool,
}

impl KeyMapEntry {
    pub fn new(ids: KeySequence, mask: ModifierMask) -> Self {
        let dead = matches!(ids.as_slice(), [id] if id.is_dead());
        Self { ids, mask, dead }
    }

    /// The single key id of this entry
    pub fn key(&self) -> Option<KeyId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }
}

/// The canonical key map for every installed layout group.
///
/// Built in one pass by [`KeyMapBuilder`] and never mutated afterwards;
/// iteration order is insertion order, so two builds from the same
/// resources are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    entries: IndexMap<KeyMapKey, KeyMapEntry>,
    reverse: IndexMap<KeyId, SmallVec<[KeyMapKey; 2]>>,
    half_duplex: IndexSet<KeyButton>,
    groups: usize,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the reverse index current
    pub fn insert(&mut self, key: KeyMapKey, entry: KeyMapEntry) {
        if let Some(old) = self.entries.get(&key).and_then(KeyMapEntry::key) {
            if let Some(keys) = self.reverse.get_mut(&old) {
                keys.retain(|k| *k != key);
            }
        }
        if let Some(id) = entry.key() {
            let keys = self.reverse.entry(id).or_default();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.groups = self.groups.max(key.group.index() + 1);
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &KeyMapKey) -> Option<&KeyMapEntry> {
        self.entries.get(key)
    }

    /// Entry for a button under any modifiers; non-glyph modifiers are ignored
    pub fn lookup(&self, button: KeyButton, mask: ModifierMask, group: Group) -> Option<&KeyMapEntry> {
        self.entries.get(&KeyMapKey::new(button, mask, group))
    }

    /// Every position that produces `id` on its own, in build order
    pub fn find(&self, id: KeyId) -> &[KeyMapKey] {
        self.reverse.get(&id).map_or(&[], |keys| keys.as_slice())
    }

    pub fn add_half_duplex(&mut self, button: KeyButton) {
        self.half_duplex.insert(button);
    }

    /// Whether a button toggles a lock and reports press and release as
    /// one toggle
    pub fn is_half_duplex(&self, button: KeyButton) -> bool {
        self.half_duplex.contains(&button)
    }

    pub fn half_duplex(&self) -> impl Iterator<Item = KeyButton> + '_ {
        self.half_duplex.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyMapKey, &KeyMapEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of groups with at least one entry slot
    pub fn num_groups(&self) -> usize {
        self.groups
    }
}

/// Shared, swappable reference to the current key map.
///
/// Clones share the same slot; readers on any thread take an `Arc`
/// snapshot that stays valid across rebuilds.
#[derive(Debug, Clone, Default)]
pub struct KeyMapHandle {
    inner: Arc<RwLock<Arc<KeyMap>>>,
}

impl KeyMapHandle {
    pub fn new(map: KeyMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(map))),
        }
    }

    /// Current key map
    pub fn snapshot(&self) -> Arc<KeyMap> {
        Arc::clone(&self.inner.read())
    }

    pub(crate) fn replace(&self, map: KeyMap) {
        *self.inner.write() = Arc::new(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn button(vk: u8) -> KeyButton {
        KeyButton::from_virtual_key(vk)
    }

    #[test]
    fn test_key_drops_non_glyph_modifiers() {
        let key = KeyMapKey::new(
            button(0),
            ModifierMask::SHIFT | ModifierMask::CONTROL | ModifierMask::ALT,
            Group(0),
        );
        assert_eq!(key.mask, ModifierMask::SHIFT);
    }

    #[test]
    fn test_insert_and_reverse_lookup() {
        let mut map = KeyMap::new();
        let a = KeyId::from('a');
        let key = KeyMapKey::new(button(0), ModifierMask::empty(), Group(0));
        map.insert(key, KeyMapEntry::new(smallvec![a], ModifierMask::empty()));

        assert_eq!(map.len(), 1);
        assert_eq!(map.find(a), &[key]);
        assert_eq!(
            map.lookup(button(0), ModifierMask::CONTROL, Group(0)).and_then(KeyMapEntry::key),
            Some(a)
        );
        assert_eq!(map.num_groups(), 1);
    }

    #[test]
    fn test_replace_updates_reverse_index() {
        let mut map = KeyMap::new();
        let key = KeyMapKey::new(button(0x7B), ModifierMask::empty(), Group(0));
        map.insert(key, KeyMapEntry::new(smallvec![KeyId::from('x')], ModifierMask::empty()));
        map.insert(key, KeyMapEntry::new(smallvec![KeyId::LEFT], ModifierMask::empty()));

        assert!(map.find(KeyId::from('x')).is_empty());
        assert_eq!(map.find(KeyId::LEFT), &[key]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_sequences_are_not_reverse_indexed() {
        let mut map = KeyMap::new();
        let key = KeyMapKey::new(button(1), ModifierMask::empty(), Group(0));
        let ids: KeySequence = smallvec![KeyId::from('a'), KeyId::from('b')];
        map.insert(key, KeyMapEntry::new(ids, ModifierMask::empty()));
        assert!(map.find(KeyId::from('a')).is_empty());
    }

    #[test]
    fn test_dead_entry() {
        let entry = KeyMapEntry::new(smallvec![KeyId::DEAD_ACUTE], ModifierMask::empty());
        assert!(entry.dead);
        let entry = KeyMapEntry::new(smallvec![KeyId::from('e')], ModifierMask::empty());
        assert!(!entry.dead);
    }

    #[test]
    fn test_handle_swaps_snapshots() {
        let handle = KeyMapHandle::default();
        let before = handle.snapshot();
        assert!(before.is_empty());

        let mut map = KeyMap::new();
        map.add_half_duplex(button(0x39));
        handle.clone().replace(map);

        assert!(before.is_empty());
        assert!(handle.snapshot().is_half_duplex(button(0x39)));
    }
}
