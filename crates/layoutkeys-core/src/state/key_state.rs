// Layoutkeys Key State
// Owns installed layouts, the shared key map and live keyboard state

use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::key::{KeyButton, KeyId};
use crate::keymap::{special_key, special_virtual_key, Group, KeyMapBuilder, KeyMapHandle};
use crate::layout::{DeadKeyState, KeyResource, UchrKeyResource};
use crate::mapper::{self, adjust_alt_gr, map_key_button_to_virtual_key, MappedKey};
use crate::modifier::{Modifier, ModifierMask};
use crate::native::{vk, CarbonModifiers, EventFlags, NativeEventKind, NativeHotKey, NativeKeyEvent, VirtualKey};
use crate::settings::Settings;
use crate::state::modifiers::{ModifierEvents, ModifierTracker};
use crate::state::pressed::PressedKeyState;

/// Host handle of an installed keyboard layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LayoutId(String);

impl LayoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayoutId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LayoutId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A layout as reported by the host: its handle and raw `uchr` data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLayout {
    pub id: LayoutId,
    pub data: Arc<[u8]>,
}

impl InstalledLayout {
    pub fn new(id: impl Into<LayoutId>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

/// One synthetic keyboard action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Press or release a button
    Button {
        button: KeyButton,
        press: bool,
        repeat: bool,
    },
    /// Switch layout group, to `group` when absolute or by `group` steps
    Group { group: i32, absolute: bool },
}

/// Receiver of synthesized native key events
pub trait KeyEventSink {
    /// Post one key transition with the modifier flags to report
    fn post_key_event(&mut self, virtual_key: VirtualKey, down: bool, flags: EventFlags);

    /// Whether the host lets Control+Alt+Delete through
    fn supports_secure_attention(&self) -> bool {
        false
    }
}

#[derive(Clone)]
struct GroupLayout {
    id: LayoutId,
    data: Arc<[u8]>,
    resource: Arc<dyn KeyResource>,
}

impl fmt::Debug for GroupLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupLayout")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .field("valid", &self.resource.is_valid())
            .finish()
    }
}

/// Keyboard state of one host session.
///
/// Mutated from a single thread; other threads read the key map through
/// [`KeyState::key_map_handle`].
#[derive(Debug)]
pub struct KeyState {
    settings: Settings,
    groups: Vec<GroupLayout>,
    active: Group,
    key_map: KeyMapHandle,
    modifiers: ModifierTracker,
    pressed: PressedKeyState,
    dead_key: DeadKeyState,
}

impl KeyState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            groups: Vec::new(),
            active: Group::default(),
            key_map: KeyMapHandle::default(),
            modifiers: ModifierTracker::new(),
            pressed: PressedKeyState::new(),
            dead_key: DeadKeyState::IDLE,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Install a new set of layouts and rebuild the key map
    pub fn set_layouts(&mut self, layouts: Vec<InstalledLayout>, active: &LayoutId) {
        let keyboard_type = self.settings.keyboard_type();
        self.groups = layouts
            .into_iter()
            .map(|layout| {
                let resource = UchrKeyResource::new(Arc::clone(&layout.data), keyboard_type);
                if !resource.is_valid() {
                    log::warn!("layout {} is unusable", layout.id);
                }
                GroupLayout {
                    id: layout.id,
                    data: layout.data,
                    resource: Arc::new(resource),
                }
            })
            .collect();
        self.active = self.group_of(active).unwrap_or_default();
        self.dead_key = DeadKeyState::IDLE;
        self.rebuild();
    }

    /// Bring the state up to date with the host's layouts.
    ///
    /// Returns true when the installed set or the active layout changed.
    pub fn check_keyboard_layout(&mut self, layouts: &[InstalledLayout], active: &LayoutId) -> bool {
        let same_set = layouts.len() == self.groups.len()
            && layouts.iter().zip(&self.groups).all(|(layout, group)| {
                layout.id == group.id
                    && (Arc::ptr_eq(&layout.data, &group.data) || layout.data == group.data)
            });
        if !same_set {
            log::debug!("installed layouts changed, {} groups", layouts.len());
            self.set_layouts(layouts.to_vec(), active);
            return true;
        }

        match self.group_of(active) {
            Some(group) if group != self.active => self.set_group(group),
            _ => false,
        }
    }

    /// Make `group` the active group, returning false if it does not exist
    /// or is already active
    pub fn set_group(&mut self, group: Group) -> bool {
        if group.index() >= self.groups.len() {
            log::warn!("no layout group {}", group);
            return false;
        }
        if group == self.active {
            return false;
        }
        log::debug!("switching to group {} ({})", group, self.groups[group.index()].id);
        self.active = group;
        // dead-key states are numbered per layout
        self.dead_key = DeadKeyState::IDLE;
        self.rebuild();
        true
    }

    fn group_of(&self, id: &LayoutId) -> Option<Group> {
        let index = self.groups.iter().position(|group| group.id == *id)?;
        u8::try_from(index).ok().map(Group)
    }

    fn rebuild(&mut self) {
        let resources: Vec<Arc<dyn KeyResource>> =
            self.groups.iter().map(|group| Arc::clone(&group.resource)).collect();
        let map = KeyMapBuilder::new()
            .option_as_altgr(self.settings.option_as_altgr())
            .build(&resources);
        self.key_map.replace(map);
    }

    /// Layout handle of a group
    pub fn layout_id(&self, group: Group) -> Option<&LayoutId> {
        self.groups.get(group.index()).map(|g| &g.id)
    }

    /// Decoded resource of a group
    pub fn resource(&self, group: Group) -> Option<&Arc<dyn KeyResource>> {
        self.groups.get(group.index()).map(|g| &g.resource)
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Reader handle for the current key map
    pub fn key_map_handle(&self) -> KeyMapHandle {
        self.key_map.clone()
    }

    /// Map a native key event in the active group.
    ///
    /// With dead-key composition on, a dead key press reports nothing and
    /// the following press reports the composed keys.
    pub fn map_key_from_event(&mut self, event: &NativeKeyEvent) -> MappedKey {
        let map = self.key_map.snapshot();
        let option_as_altgr = self.settings.option_as_altgr();
        let mut mapped = mapper::map_key(&map, self.active, event, option_as_altgr);

        let action = Action::from_event(event);
        if let (Some(button), Some(action)) = (mapped.button, action) {
            self.pressed.update(button, action.is_pressed());
        }

        if event.kind != NativeEventKind::KeyDown || !self.settings.compose_dead_keys() {
            return mapped;
        }
        if action.is_some_and(Action::is_repeat) {
            // repeats never advance the dead-key state
            if self.dead_key.is_pending() {
                mapped.ids.clear();
            }
            return mapped;
        }
        if special_key(event.virtual_key).is_some() {
            self.dead_key = DeadKeyState::IDLE;
            return mapped;
        }

        let carbon = CarbonModifiers::from_event_flags(event.flags);
        if carbon.intersects(CarbonModifiers::COMMAND_MODIFIERS) {
            // shortcuts never compose
            self.dead_key = DeadKeyState::IDLE;
            return mapped;
        }

        let Some(resource) = self.resource(self.active).filter(|r| r.is_valid()) else {
            return mapped;
        };
        let Ok(code) = u32::try_from(event.virtual_key) else {
            return mapped;
        };
        let table = resource.table_for_modifier(carbon.modifier_index());
        if table >= resource.num_tables() || code >= resource.num_buttons() {
            return mapped;
        }

        let translation = resource.translate(table, code, self.dead_key);
        if translation.is_pending() {
            log::trace!("dead key pending in state {}", translation.state.0);
        }
        self.dead_key = translation.state;

        let mask = ModifierMask::from_event_flags(event.flags) - ModifierMask::ALT_GR;
        mapped.mask = if option_as_altgr {
            adjust_alt_gr(&translation.keys, mask, false)
        } else {
            mask
        };
        mapped.ids = translation.keys;
        mapped
    }

    /// Native key and modifiers typing `id` in the active group
    pub fn map_hot_key_to_native(&self, id: KeyId, mask: ModifierMask) -> Option<NativeHotKey> {
        let map = self.key_map.snapshot();
        mapper::map_hot_key_to_native(&map, self.active, id, mask)
    }

    /// Reconcile reported modifier flags, returning the implied transitions
    pub fn handle_modifier_keys(&mut self, flags: EventFlags) -> ModifierEvents {
        let events = self.modifiers.reconcile(flags);
        let map = self.key_map.snapshot();
        for event in &events {
            log::trace!("modifier {} {}", event.role, event.action);
            if !map.is_half_duplex(event.button) {
                self.pressed.update(event.button, event.action.is_pressed());
            }
        }
        events
    }

    pub fn poll_active_modifiers(&self) -> ModifierMask {
        self.modifiers.mask()
    }

    pub fn poll_active_group(&self) -> Group {
        self.active
    }

    pub fn poll_pressed_keys(&self) -> Vec<KeyButton> {
        self.pressed.get_all()
    }

    /// Synthesize one keystroke
    pub fn fake_key(&mut self, stroke: Keystroke, sink: &mut dyn KeyEventSink) {
        match stroke {
            Keystroke::Button {
                button,
                press,
                repeat,
            } => {
                let Some(virtual_key) = map_key_button_to_virtual_key(button) else {
                    log::warn!("button {} has no virtual key", button);
                    return;
                };
                match Modifier::from_virtual_key(virtual_key) {
                    Some(Modifier::CapsLock) => {
                        if press && !repeat {
                            let locked = self.modifiers.is_active(Modifier::CapsLock);
                            self.modifiers.set(Modifier::CapsLock, !locked);
                        }
                    }
                    Some(role) => {
                        self.modifiers.set(role, press);
                    }
                    None => {}
                }
                if !self.key_map.snapshot().is_half_duplex(button) {
                    self.pressed.update(button, press);
                }
                log::trace!("fake {} button {}", Action::from_stroke(press, repeat), button);
                sink.post_key_event(virtual_key, press, self.modifiers.native_flags());
            }
            Keystroke::Group { group, absolute } => {
                let Ok(count) = i64::try_from(self.groups.len()) else {
                    return;
                };
                if count == 0 {
                    return;
                }
                let target = if absolute {
                    i64::from(group)
                } else {
                    i64::from(self.active.0) + i64::from(group)
                };
                if let Ok(target) = u8::try_from(target.rem_euclid(count)) {
                    self.set_group(Group(target));
                }
            }
        }
    }

    /// Inject Control+Alt+Delete if the host allows it
    pub fn fake_ctrl_alt_del(&mut self, sink: &mut dyn KeyEventSink) -> bool {
        if !sink.supports_secure_attention() {
            log::debug!("secure attention sequence not supported");
            return false;
        }
        let delete = special_virtual_key(KeyId::DELETE).unwrap_or(vk::FORWARD_DELETE);
        let control = EventFlags::CONTROL;
        let control_alt = control | EventFlags::COMMAND;

        sink.post_key_event(vk::CONTROL, true, control);
        sink.post_key_event(vk::COMMAND, true, control_alt);
        sink.post_key_event(delete, true, control_alt);
        sink.post_key_event(delete, false, control_alt);
        sink.post_key_event(vk::COMMAND, false, control);
        sink.post_key_event(vk::CONTROL, false, EventFlags::empty());
        true
    }

    /// Forget held keys, modifiers and any pending dead key
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.modifiers.reset();
        self.dead_key = DeadKeyState::IDLE;
    }
}
