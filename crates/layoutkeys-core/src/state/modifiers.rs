// Layoutkeys Modifier Tracker
// Reconciles reported modifier flags into discrete press and release events

use smallvec::SmallVec;
use strum::IntoEnumIterator;

use crate::modifier::{Modifier, ModifierMask};
use crate::native::EventFlags;
use crate::{Action, KeyButton, KeyId};

/// A synthesized modifier key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierEvent {
    pub role: Modifier,
    pub key: KeyId,
    pub button: KeyButton,
    pub action: Action,
    /// Tracked modifiers after this transition
    pub mask: ModifierMask,
}

/// Events from one reconciliation, at most one per role
pub type ModifierEvents = SmallVec<[ModifierEvent; 5]>;

/// Last known state of the five tracked modifier roles.
///
/// The platform reports modifier changes as a whole new flag set; the
/// tracker turns each report into the individual key transitions that
/// explain it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierTracker {
    shift: bool,
    control: bool,
    alt: bool,
    super_: bool,
    caps_lock: bool,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, role: Modifier) -> &mut bool {
        match role {
            Modifier::Shift => &mut self.shift,
            Modifier::Control => &mut self.control,
            Modifier::Alt => &mut self.alt,
            Modifier::Super => &mut self.super_,
            Modifier::CapsLock => &mut self.caps_lock,
        }
    }

    pub fn is_active(&self, role: Modifier) -> bool {
        match role {
            Modifier::Shift => self.shift,
            Modifier::Control => self.control,
            Modifier::Alt => self.alt,
            Modifier::Super => self.super_,
            Modifier::CapsLock => self.caps_lock,
        }
    }

    /// Canonical mask of the tracked roles
    pub fn mask(&self) -> ModifierMask {
        Modifier::iter()
            .filter(|role| self.is_active(*role))
            .fold(ModifierMask::empty(), |mask, role| mask | role.mask())
    }

    /// Native event flags of the tracked roles
    pub fn native_flags(&self) -> EventFlags {
        EventFlags::from_modifier_mask(self.mask())
    }

    /// Reconcile against native event flags
    pub fn reconcile(&mut self, flags: EventFlags) -> ModifierEvents {
        self.reconcile_mask(ModifierMask::from_event_flags(flags))
    }

    /// Reconcile against a canonical mask.
    ///
    /// Emits one event per role whose state differs, in role order, and
    /// leaves the tracker matching `mask`. Untracked bits are ignored.
    pub fn reconcile_mask(&mut self, mask: ModifierMask) -> ModifierEvents {
        let mut events = ModifierEvents::new();
        for role in Modifier::iter() {
            let down = mask.contains(role.mask());
            if let Some(event) = self.set(role, down) {
                events.push(event);
            }
        }
        events
    }

    /// Set one role, returning the transition if it changed
    pub fn set(&mut self, role: Modifier, down: bool) -> Option<ModifierEvent> {
        let slot = self.slot(role);
        if *slot == down {
            return None;
        }
        *slot = down;
        Some(ModifierEvent {
            role,
            key: role.key_id(),
            button: role.button(),
            action: Action::from_down(down),
            mask: self.mask(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_emits_changes_in_order() {
        let mut tracker = ModifierTracker::new();
        let events = tracker.reconcile(EventFlags::COMMAND | EventFlags::SHIFT | EventFlags::ALPHA_SHIFT);
        let roles: Vec<Modifier> = events.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Modifier::Shift, Modifier::Alt, Modifier::CapsLock]);
        assert!(events.iter().all(|e| e.action == Action::Press));
        assert_eq!(
            tracker.mask(),
            ModifierMask::SHIFT | ModifierMask::ALT | ModifierMask::CAPS_LOCK
        );
    }

    #[test]
    fn test_reconcile_is_minimal() {
        let mut tracker = ModifierTracker::new();
        tracker.reconcile(EventFlags::SHIFT | EventFlags::CONTROL);

        let events = tracker.reconcile(EventFlags::SHIFT | EventFlags::ALTERNATE);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].role, Modifier::Control);
        assert_eq!(events[0].action, Action::Release);
        assert_eq!(events[0].key, KeyId::CONTROL_L);
        assert_eq!(events[1].role, Modifier::Super);
        assert_eq!(events[1].action, Action::Press);
        assert_eq!(events[1].mask, ModifierMask::SHIFT | ModifierMask::SUPER);

        assert!(tracker.reconcile(EventFlags::SHIFT | EventFlags::ALTERNATE).is_empty());
    }

    #[test]
    fn test_every_mask_pair() {
        // changed roles are exactly the symmetric difference
        let all: Vec<ModifierMask> = (0u32..32)
            .map(|bits| {
                Modifier::iter()
                    .enumerate()
                    .filter(|(i, _)| bits & (1 << i) != 0)
                    .fold(ModifierMask::empty(), |m, (_, role)| m | role.mask())
            })
            .collect();
        for &from in &all {
            for &to in &all {
                let mut tracker = ModifierTracker::new();
                tracker.reconcile_mask(from);
                let events = tracker.reconcile_mask(to);
                assert_eq!(events.len(), (from ^ to).bits().count_ones() as usize);
                assert_eq!(tracker.mask(), to);
            }
        }
    }

    #[test]
    fn test_untracked_bits_ignored() {
        let mut tracker = ModifierTracker::new();
        let events = tracker.reconcile(EventFlags::NUMERIC_PAD | EventFlags::HELP);
        assert!(events.is_empty());
        assert_eq!(tracker.mask(), ModifierMask::empty());
    }

    #[test]
    fn test_native_flags() {
        let mut tracker = ModifierTracker::new();
        tracker.reconcile_mask(ModifierMask::ALT | ModifierMask::SUPER);
        assert_eq!(
            tracker.native_flags(),
            EventFlags::COMMAND | EventFlags::ALTERNATE
        );
    }

    #[test]
    fn test_event_buttons() {
        let mut tracker = ModifierTracker::new();
        let events = tracker.reconcile(EventFlags::CONTROL);
        assert_eq!(events[0].button, KeyButton::from_virtual_key(0x3B));
    }
}
