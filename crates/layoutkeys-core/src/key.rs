// Layoutkeys Key Types
// Canonical key identifiers and physical key buttons

use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

include!(concat!(env!("OUT_DIR"), "/key_ids.rs"));

/// Ordered list of key ids produced by one keystroke.
///
/// Almost every keystroke produces zero or one id; dead-key chains and
/// multi-character outputs stay inline for up to four.
pub type KeySequence = smallvec::SmallVec<[KeyId; 4]>;

impl KeyId {
    pub const NONE: KeyId = KeyId(0x0000);

    // TTY functions
    pub const BACKSPACE: KeyId = KeyId(0xEF08);
    pub const TAB: KeyId = KeyId(0xEF09);
    pub const LINEFEED: KeyId = KeyId(0xEF0A);
    pub const CLEAR: KeyId = KeyId(0xEF0B);
    pub const RETURN: KeyId = KeyId(0xEF0D);
    pub const PAUSE: KeyId = KeyId(0xEF13);
    pub const SCROLL_LOCK: KeyId = KeyId(0xEF14);
    pub const SYS_REQ: KeyId = KeyId(0xEF15);
    pub const ESCAPE: KeyId = KeyId(0xEF1B);
    pub const COMPOSE: KeyId = KeyId(0xEF20);
    pub const HENKAN: KeyId = KeyId(0xEF23);
    pub const KANA: KeyId = KeyId(0xEF26);
    pub const HIRAGANA_KATAKANA: KeyId = KeyId(0xEF27);
    pub const ZENKAKU: KeyId = KeyId(0xEF2A);
    pub const HANGUL: KeyId = KeyId(0xEF31);
    pub const HANJA: KeyId = KeyId(0xEF34);
    pub const DELETE: KeyId = KeyId(0xEFFF);

    // cursor control
    pub const HOME: KeyId = KeyId(0xEF50);
    pub const LEFT: KeyId = KeyId(0xEF51);
    pub const UP: KeyId = KeyId(0xEF52);
    pub const RIGHT: KeyId = KeyId(0xEF53);
    pub const DOWN: KeyId = KeyId(0xEF54);
    pub const PAGE_UP: KeyId = KeyId(0xEF55);
    pub const PAGE_DOWN: KeyId = KeyId(0xEF56);
    pub const END: KeyId = KeyId(0xEF57);
    pub const BEGIN: KeyId = KeyId(0xEF58);
    pub const LEFT_TAB: KeyId = KeyId(0xEE20);

    // misc functions
    pub const SELECT: KeyId = KeyId(0xEF60);
    pub const PRINT: KeyId = KeyId(0xEF61);
    pub const EXECUTE: KeyId = KeyId(0xEF62);
    pub const INSERT: KeyId = KeyId(0xEF63);
    pub const UNDO: KeyId = KeyId(0xEF65);
    pub const REDO: KeyId = KeyId(0xEF66);
    pub const MENU: KeyId = KeyId(0xEF67);
    pub const FIND: KeyId = KeyId(0xEF68);
    pub const CANCEL: KeyId = KeyId(0xEF69);
    pub const HELP: KeyId = KeyId(0xEF6A);
    pub const BREAK: KeyId = KeyId(0xEF6B);
    pub const ALT_GR: KeyId = KeyId(0xEF7E);
    pub const NUM_LOCK: KeyId = KeyId(0xEF7F);

    // keypad
    pub const KP_SPACE: KeyId = KeyId(0xEF80);
    pub const KP_TAB: KeyId = KeyId(0xEF89);
    pub const KP_ENTER: KeyId = KeyId(0xEF8D);
    pub const KP_HOME: KeyId = KeyId(0xEF95);
    pub const KP_LEFT: KeyId = KeyId(0xEF96);
    pub const KP_UP: KeyId = KeyId(0xEF97);
    pub const KP_RIGHT: KeyId = KeyId(0xEF98);
    pub const KP_DOWN: KeyId = KeyId(0xEF99);
    pub const KP_PAGE_UP: KeyId = KeyId(0xEF9A);
    pub const KP_PAGE_DOWN: KeyId = KeyId(0xEF9B);
    pub const KP_END: KeyId = KeyId(0xEF9C);
    pub const KP_BEGIN: KeyId = KeyId(0xEF9D);
    pub const KP_INSERT: KeyId = KeyId(0xEF9E);
    pub const KP_DELETE: KeyId = KeyId(0xEF9F);
    pub const KP_MULTIPLY: KeyId = KeyId(0xEFAA);
    pub const KP_ADD: KeyId = KeyId(0xEFAB);
    pub const KP_SEPARATOR: KeyId = KeyId(0xEFAC);
    pub const KP_SUBTRACT: KeyId = KeyId(0xEFAD);
    pub const KP_DECIMAL: KeyId = KeyId(0xEFAE);
    pub const KP_DIVIDE: KeyId = KeyId(0xEFAF);
    pub const KP_0: KeyId = KeyId(0xEFB0);
    pub const KP_9: KeyId = KeyId(0xEFB9);
    pub const KP_EQUAL: KeyId = KeyId(0xEFBD);

    // function keys, F1 through F35 are contiguous
    pub const F1: KeyId = KeyId(0xEFBE);
    pub const F35: KeyId = KeyId(0xEFE0);

    // modifiers
    pub const SHIFT_L: KeyId = KeyId(0xEFE1);
    pub const SHIFT_R: KeyId = KeyId(0xEFE2);
    pub const CONTROL_L: KeyId = KeyId(0xEFE3);
    pub const CONTROL_R: KeyId = KeyId(0xEFE4);
    pub const CAPS_LOCK: KeyId = KeyId(0xEFE5);
    pub const SHIFT_LOCK: KeyId = KeyId(0xEFE6);
    pub const META_L: KeyId = KeyId(0xEFE7);
    pub const META_R: KeyId = KeyId(0xEFE8);
    pub const ALT_L: KeyId = KeyId(0xEFE9);
    pub const ALT_R: KeyId = KeyId(0xEFEA);
    pub const SUPER_L: KeyId = KeyId(0xEFEB);
    pub const SUPER_R: KeyId = KeyId(0xEFEC);
    pub const HYPER_L: KeyId = KeyId(0xEFED);
    pub const HYPER_R: KeyId = KeyId(0xEFEE);

    // extended keys
    pub const EJECT: KeyId = KeyId(0xE001);
    pub const SLEEP: KeyId = KeyId(0xE05F);
    pub const WWW_BACK: KeyId = KeyId(0xE0A6);
    pub const WWW_FORWARD: KeyId = KeyId(0xE0A7);
    pub const WWW_REFRESH: KeyId = KeyId(0xE0A8);
    pub const WWW_STOP: KeyId = KeyId(0xE0A9);
    pub const WWW_SEARCH: KeyId = KeyId(0xE0AA);
    pub const WWW_FAVORITES: KeyId = KeyId(0xE0AB);
    pub const WWW_HOME: KeyId = KeyId(0xE0AC);
    pub const AUDIO_MUTE: KeyId = KeyId(0xE0AD);
    pub const AUDIO_DOWN: KeyId = KeyId(0xE0AE);
    pub const AUDIO_UP: KeyId = KeyId(0xE0AF);
    pub const AUDIO_NEXT: KeyId = KeyId(0xE0B0);
    pub const AUDIO_PREV: KeyId = KeyId(0xE0B1);
    pub const AUDIO_STOP: KeyId = KeyId(0xE0B2);
    pub const AUDIO_PLAY: KeyId = KeyId(0xE0B3);
    pub const APP_MAIL: KeyId = KeyId(0xE0B4);
    pub const APP_MEDIA: KeyId = KeyId(0xE0B5);
    pub const BRIGHTNESS_DOWN: KeyId = KeyId(0xE0B8);
    pub const BRIGHTNESS_UP: KeyId = KeyId(0xE0B9);
    pub const MISSION_CONTROL: KeyId = KeyId(0xE0C0);
    pub const LAUNCHPAD: KeyId = KeyId(0xE0C1);

    // dead keys
    pub const DEAD_GRAVE: KeyId = KeyId(0x0300);
    pub const DEAD_ACUTE: KeyId = KeyId(0x0301);
    pub const DEAD_CIRCUMFLEX: KeyId = KeyId(0x0302);
    pub const DEAD_TILDE: KeyId = KeyId(0x0303);
    pub const DEAD_MACRON: KeyId = KeyId(0x0304);
    pub const DEAD_BREVE: KeyId = KeyId(0x0306);
    pub const DEAD_ABOVEDOT: KeyId = KeyId(0x0307);
    pub const DEAD_DIAERESIS: KeyId = KeyId(0x0308);
    pub const DEAD_ABOVERING: KeyId = KeyId(0x030A);
    pub const DEAD_DOUBLEACUTE: KeyId = KeyId(0x030B);
    pub const DEAD_CARON: KeyId = KeyId(0x030C);
    pub const DEAD_CEDILLA: KeyId = KeyId(0x0327);
    pub const DEAD_OGONEK: KeyId = KeyId(0x0328);

    /// Function key `F<n>` for `n` in `1..=35`
    pub const fn function(n: u32) -> Option<KeyId> {
        if n >= 1 && n <= 35 {
            Some(KeyId(Self::F1.0 + n - 1))
        } else {
            None
        }
    }

    /// Returns true if this is the "no key" id
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// Returns true if this id names a dead key
    pub const fn is_dead(self) -> bool {
        self.0 == Self::COMPOSE.0 || (self.0 >= 0x0300 && self.0 <= 0x036F)
    }

    /// Returns true if this id produces a printable glyph.
    ///
    /// Named keys are not glyphs, except the keypad `=` and digits which
    /// type characters.
    pub const fn is_glyph(self) -> bool {
        if self.is_none() {
            return false;
        }
        (self.0 < 0xE000 || self.0 > 0xEFFF)
            || self.0 == Self::KP_EQUAL.0
            || (self.0 >= Self::KP_0.0 && self.0 <= Self::KP_9.0)
    }

    /// Returns true for keys that toggle a lock state
    pub const fn is_locking(self) -> bool {
        self.0 == Self::CAPS_LOCK.0 || self.0 == Self::NUM_LOCK.0 || self.0 == Self::SCROLL_LOCK.0
    }

    /// Convert a spacing accent to the dead key that produces it.
    ///
    /// Ids that are not accents are returned unchanged.
    pub fn to_dead(self) -> KeyId {
        match self.0 {
            0x0060 => Self::DEAD_GRAVE,
            0x00B4 => Self::DEAD_ACUTE,
            0x005E | 0x02C6 => Self::DEAD_CIRCUMFLEX,
            0x007E | 0x02DC => Self::DEAD_TILDE,
            0x00AF => Self::DEAD_MACRON,
            0x02D8 => Self::DEAD_BREVE,
            0x02D9 => Self::DEAD_ABOVEDOT,
            0x00A8 => Self::DEAD_DIAERESIS,
            0x00B0 | 0x02DA => Self::DEAD_ABOVERING,
            0x02DD => Self::DEAD_DOUBLEACUTE,
            0x02C7 => Self::DEAD_CARON,
            0x00B8 => Self::DEAD_CEDILLA,
            0x02DB => Self::DEAD_OGONEK,
            _ => self,
        }
    }

    /// The character for glyph ids
    pub fn to_char(self) -> Option<char> {
        if self.is_glyph() && !(self.0 >= 0xE000 && self.0 <= 0xEFFF) {
            char::from_u32(self.0)
        } else {
            None
        }
    }
}

/// Names for every non-glyph key id
const NAMED_KEYS: &[(&str, KeyId)] = &[
    ("None", KeyId::NONE),
    ("BackSpace", KeyId::BACKSPACE),
    ("Tab", KeyId::TAB),
    ("Linefeed", KeyId::LINEFEED),
    ("Clear", KeyId::CLEAR),
    ("Return", KeyId::RETURN),
    ("Pause", KeyId::PAUSE),
    ("Scroll_Lock", KeyId::SCROLL_LOCK),
    ("Sys_Req", KeyId::SYS_REQ),
    ("Escape", KeyId::ESCAPE),
    ("Multi_key", KeyId::COMPOSE),
    ("Henkan", KeyId::HENKAN),
    ("Kana", KeyId::KANA),
    ("Hiragana_Katakana", KeyId::HIRAGANA_KATAKANA),
    ("Zenkaku", KeyId::ZENKAKU),
    ("Hangul", KeyId::HANGUL),
    ("Hanja", KeyId::HANJA),
    ("Delete", KeyId::DELETE),
    ("Home", KeyId::HOME),
    ("Left", KeyId::LEFT),
    ("Up", KeyId::UP),
    ("Right", KeyId::RIGHT),
    ("Down", KeyId::DOWN),
    ("Page_Up", KeyId::PAGE_UP),
    ("Page_Down", KeyId::PAGE_DOWN),
    ("End", KeyId::END),
    ("Begin", KeyId::BEGIN),
    ("ISO_Left_Tab", KeyId::LEFT_TAB),
    ("Select", KeyId::SELECT),
    ("Print", KeyId::PRINT),
    ("Execute", KeyId::EXECUTE),
    ("Insert", KeyId::INSERT),
    ("Undo", KeyId::UNDO),
    ("Redo", KeyId::REDO),
    ("Menu", KeyId::MENU),
    ("Find", KeyId::FIND),
    ("Cancel", KeyId::CANCEL),
    ("Help", KeyId::HELP),
    ("Break", KeyId::BREAK),
    ("AltGr", KeyId::ALT_GR),
    ("Num_Lock", KeyId::NUM_LOCK),
    ("KP_Space", KeyId::KP_SPACE),
    ("KP_Tab", KeyId::KP_TAB),
    ("KP_Enter", KeyId::KP_ENTER),
    ("KP_Home", KeyId::KP_HOME),
    ("KP_Left", KeyId::KP_LEFT),
    ("KP_Up", KeyId::KP_UP),
    ("KP_Right", KeyId::KP_RIGHT),
    ("KP_Down", KeyId::KP_DOWN),
    ("KP_Page_Up", KeyId::KP_PAGE_UP),
    ("KP_Page_Down", KeyId::KP_PAGE_DOWN),
    ("KP_End", KeyId::KP_END),
    ("KP_Begin", KeyId::KP_BEGIN),
    ("KP_Insert", KeyId::KP_INSERT),
    ("KP_Delete", KeyId::KP_DELETE),
    ("KP_Multiply", KeyId::KP_MULTIPLY),
    ("KP_Add", KeyId::KP_ADD),
    ("KP_Separator", KeyId::KP_SEPARATOR),
    ("KP_Subtract", KeyId::KP_SUBTRACT),
    ("KP_Decimal", KeyId::KP_DECIMAL),
    ("KP_Divide", KeyId::KP_DIVIDE),
    ("KP_0", KeyId::KP_0),
    ("KP_1", KeyId(0xEFB1)),
    ("KP_2", KeyId(0xEFB2)),
    ("KP_3", KeyId(0xEFB3)),
    ("KP_4", KeyId(0xEFB4)),
    ("KP_5", KeyId(0xEFB5)),
    ("KP_6", KeyId(0xEFB6)),
    ("KP_7", KeyId(0xEFB7)),
    ("KP_8", KeyId(0xEFB8)),
    ("KP_9", KeyId::KP_9),
    ("KP_Equal", KeyId::KP_EQUAL),
    ("Shift_L", KeyId::SHIFT_L),
    ("Shift_R", KeyId::SHIFT_R),
    ("Control_L", KeyId::CONTROL_L),
    ("Control_R", KeyId::CONTROL_R),
    ("Caps_Lock", KeyId::CAPS_LOCK),
    ("Shift_Lock", KeyId::SHIFT_LOCK),
    ("Meta_L", KeyId::META_L),
    ("Meta_R", KeyId::META_R),
    ("Alt_L", KeyId::ALT_L),
    ("Alt_R", KeyId::ALT_R),
    ("Super_L", KeyId::SUPER_L),
    ("Super_R", KeyId::SUPER_R),
    ("Hyper_L", KeyId::HYPER_L),
    ("Hyper_R", KeyId::HYPER_R),
    ("Eject", KeyId::EJECT),
    ("Sleep", KeyId::SLEEP),
    ("WWW_Back", KeyId::WWW_BACK),
    ("WWW_Forward", KeyId::WWW_FORWARD),
    ("WWW_Refresh", KeyId::WWW_REFRESH),
    ("WWW_Stop", KeyId::WWW_STOP),
    ("WWW_Search", KeyId::WWW_SEARCH),
    ("WWW_Favorites", KeyId::WWW_FAVORITES),
    ("WWW_Home", KeyId::WWW_HOME),
    ("Audio_Mute", KeyId::AUDIO_MUTE),
    ("Audio_Down", KeyId::AUDIO_DOWN),
    ("Audio_Up", KeyId::AUDIO_UP),
    ("Audio_Next", KeyId::AUDIO_NEXT),
    ("Audio_Prev", KeyId::AUDIO_PREV),
    ("Audio_Stop", KeyId::AUDIO_STOP),
    ("Audio_Play", KeyId::AUDIO_PLAY),
    ("App_Mail", KeyId::APP_MAIL),
    ("App_Media", KeyId::APP_MEDIA),
    ("Brightness_Down", KeyId::BRIGHTNESS_DOWN),
    ("Brightness_Up", KeyId::BRIGHTNESS_UP),
    ("Mission_Control", KeyId::MISSION_CONTROL),
    ("Launchpad", KeyId::LAUNCHPAD),
    ("Dead_Grave", KeyId::DEAD_GRAVE),
    ("Dead_Acute", KeyId::DEAD_ACUTE),
    ("Dead_Circumflex", KeyId::DEAD_CIRCUMFLEX),
    ("Dead_Tilde", KeyId::DEAD_TILDE),
    ("Dead_Macron", KeyId::DEAD_MACRON),
    ("Dead_Breve", KeyId::DEAD_BREVE),
    ("Dead_Abovedot", KeyId::DEAD_ABOVEDOT),
    ("Dead_Diaeresis", KeyId::DEAD_DIAERESIS),
    ("Dead_Abovering", KeyId::DEAD_ABOVERING),
    ("Dead_Doubleacute", KeyId::DEAD_DOUBLEACUTE),
    ("Dead_Caron", KeyId::DEAD_CARON),
    ("Dead_Cedilla", KeyId::DEAD_CEDILLA),
    ("Dead_Ogonek", KeyId::DEAD_OGONEK),
];

/// Display name for a key id
///
/// Named keys use their symbolic name, function keys `F<n>`, printable
/// characters the character itself and anything else `U+XXXX`.
pub fn key_name(id: KeyId) -> String {
    if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, k)| *k == id) {
        return (*name).to_string();
    }
    if id >= KeyId::F1 && id <= KeyId::F35 {
        return format!("F{}", id.0 - KeyId::F1.0 + 1);
    }
    match id.to_char() {
        Some(c) if !c.is_control() && !c.is_whitespace() => c.to_string(),
        _ => format!("U+{:04X}", id.0),
    }
}

/// Try to parse a key name to a key id
///
/// Accepts symbolic names (case-insensitive), `F<n>`, `U+XXXX`, `0xXXXX`
/// and single characters.
pub fn key_from_name(name: &str) -> Option<KeyId> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyId::from(c));
    }

    if let Some((_, id)) = NAMED_KEYS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
    {
        return Some(*id);
    }

    let upper = name.to_uppercase();
    if let Some(hex) = upper
        .strip_prefix("U+")
        .or_else(|| upper.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16).ok().map(KeyId);
    }
    if let Some(n) = upper.strip_prefix('F') {
        return n.parse::<u32>().ok().and_then(KeyId::function);
    }
    match upper.as_str() {
        "SPACE" => Some(KeyId::from(' ')),
        "ENTER" => Some(KeyId::RETURN),
        "ESC" => Some(KeyId::ESCAPE),
        _ => None,
    }
}

/// Offset between a native virtual key and its `KeyButton`.
///
/// Native virtual key 0 is a real key ('A' on ANSI keyboards) while button 0
/// means "no button", so every native code is shifted up by this amount.
pub const KEY_BUTTON_OFFSET: u16 = 1;

/// Identifier of one physical key position, stable across layouts.
///
/// Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeyButton(NonZeroU16);

impl KeyButton {
    /// Wrap a raw button id, rejecting the reserved value 0
    pub fn new(raw: u16) -> Option<Self> {
        NonZeroU16::new(raw).map(KeyButton)
    }

    /// Button for a native virtual key
    pub fn from_virtual_key(virtual_key: u8) -> Self {
        // a u8 plus the offset always fits and is never zero
        KeyButton(NonZeroU16::MIN.saturating_add(u16::from(virtual_key) + (KEY_BUTTON_OFFSET - 1)))
    }

    /// Native virtual key for this button, if it came from one
    pub fn virtual_key(self) -> Option<u8> {
        u8::try_from(self.0.get() - KEY_BUTTON_OFFSET).ok()
    }

    /// Get the raw button id
    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for KeyButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name() {
        assert_eq!(key_from_name("a"), Some(KeyId::from('a')));
        assert_eq!(key_from_name("A"), Some(KeyId::from('A')));
        assert_eq!(key_from_name("return"), Some(KeyId::RETURN));
        assert_eq!(key_from_name("F1"), Some(KeyId::F1));
        assert_eq!(key_from_name("f20"), Some(KeyId(0xEFD1)));
        assert_eq!(key_from_name("U+00E9"), Some(KeyId::from('é')));
        assert_eq!(key_from_name("Dead_Acute"), Some(KeyId::DEAD_ACUTE));
        assert_eq!(key_from_name("NotAKey"), None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(KeyId::from('a').to_string(), "a");
        assert_eq!(KeyId::RETURN.to_string(), "Return");
        assert_eq!(KeyId::function(12).unwrap().to_string(), "F12");
        assert_eq!(KeyId::from(' ').to_string(), "U+0020");
    }

    #[test]
    fn test_glyph_classification() {
        assert!(KeyId::from('a').is_glyph());
        assert!(KeyId::from('€').is_glyph());
        assert!(KeyId::KP_EQUAL.is_glyph());
        assert!(KeyId::KP_0.is_glyph());
        assert!(!KeyId::KP_ENTER.is_glyph());
        assert!(!KeyId::LEFT.is_glyph());
        assert!(!KeyId::NONE.is_glyph());
    }

    #[test]
    fn test_dead_key_conversion() {
        assert_eq!(KeyId::from('´').to_dead(), KeyId::DEAD_ACUTE);
        assert_eq!(KeyId::from('`').to_dead(), KeyId::DEAD_GRAVE);
        assert_eq!(KeyId::from('¨').to_dead(), KeyId::DEAD_DIAERESIS);
        assert_eq!(KeyId::from('x').to_dead(), KeyId::from('x'));
        assert!(KeyId::DEAD_ACUTE.is_dead());
        assert!(!KeyId::from('´').is_dead());
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(KeyId::function(1), Some(KeyId::F1));
        assert_eq!(KeyId::function(35), Some(KeyId::F35));
        assert_eq!(KeyId::function(0), None);
        assert_eq!(KeyId::function(36), None);
    }

    #[test]
    fn test_key_button_offset() {
        for vk in 0..=u8::MAX {
            let button = KeyButton::from_virtual_key(vk);
            assert_eq!(button.get(), u16::from(vk) + KEY_BUTTON_OFFSET);
            assert_ne!(button.get(), 0);
            assert_eq!(button.virtual_key(), Some(vk));
        }
        assert_eq!(KeyButton::new(0), None);
    }
}
