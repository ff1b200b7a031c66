// Layoutkeys Settings Module
// User-configurable options for layout decoding and key mapping

use std::path::{Path, PathBuf};

use crate::layout::DEFAULT_KEYBOARD_TYPE;

/// A layout blob named in the settings file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSource {
    /// Host identifier of the layout
    pub id: String,
    /// Path to the raw `uchr` data
    pub path: PathBuf,
}

/// Settings for layout decoding and key mapping.
///
/// Loaded from a TOML file (default: ~/.config/layoutkeys/settings.toml):
///
/// ```toml
/// [keyboard]
/// type = 40
/// compose_dead_keys = true
///
/// [modifiers]
/// option_as_altgr = true
///
/// [[layouts]]
/// id = "com.apple.keylayout.US"
/// path = "us.uchr"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Keyboard type used to pick a layout header
    keyboard_type: u32,

    /// Run key presses through the dead-key state machine
    compose_dead_keys: bool,

    /// Report Option as AltGr when it types a glyph
    option_as_altgr: bool,

    layouts: Vec<LayoutSource>,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

#[cfg(feature = "settings")]
mod file {
    use std::path::PathBuf;

    /// TOML representation for deserializing settings
    #[derive(Debug, Clone, serde::Deserialize, Default)]
    pub(super) struct SettingsToml {
        #[serde(default)]
        pub keyboard: Option<KeyboardSettings>,

        #[serde(default)]
        pub modifiers: Option<ModifierSettings>,

        #[serde(default)]
        pub layouts: Vec<LayoutToml>,
    }

    #[derive(Debug, Clone, serde::Deserialize, Default)]
    pub(super) struct KeyboardSettings {
        #[serde(default, rename = "type")]
        pub keyboard_type: Option<i64>,

        #[serde(default)]
        pub compose_dead_keys: Option<toml::Value>,
    }

    #[derive(Debug, Clone, serde::Deserialize, Default)]
    pub(super) struct ModifierSettings {
        #[serde(default)]
        pub option_as_altgr: Option<toml::Value>,
    }

    #[derive(Debug, Clone, serde::Deserialize)]
    pub(super) struct LayoutToml {
        pub id: String,
        pub path: PathBuf,
    }
}

impl Settings {
    /// Settings with every option at its default
    pub fn new() -> Self {
        Self {
            keyboard_type: DEFAULT_KEYBOARD_TYPE,
            compose_dead_keys: true,
            option_as_altgr: true,
            layouts: Vec::new(),
            source_path: None,
        }
    }

    /// Load settings from a TOML file.
    ///
    /// Relative layout paths are resolved against the file's directory.
    #[cfg(feature = "settings")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            for layout in &mut settings.layouts {
                if layout.path.is_relative() {
                    layout.path = dir.join(&layout.path);
                }
            }
        }
        settings.source_path = Some(path.to_path_buf());
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from TOML string
    #[cfg(feature = "settings")]
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let toml_settings: file::SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(keyboard) = toml_settings.keyboard {
            if let Some(kind) = keyboard.keyboard_type {
                settings.keyboard_type = u32::try_from(kind).map_err(|_| {
                    SettingsError::InvalidValue(format!("keyboard type {} out of range", kind))
                })?;
            }
            if let Some(value) = keyboard.compose_dead_keys {
                settings.compose_dead_keys = parse_bool_value(&value)?;
            }
        }

        if let Some(modifiers) = toml_settings.modifiers {
            if let Some(value) = modifiers.option_as_altgr {
                settings.option_as_altgr = parse_bool_value(&value)?;
            }
        }

        for layout in toml_settings.layouts {
            if layout.id.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!(
                    "layout {} has an empty id",
                    layout.path.display()
                )));
            }
            settings.layouts.push(LayoutSource {
                id: layout.id,
                path: layout.path,
            });
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("layoutkeys").join("settings.toml"))
    }

    /// Load from default location (~/.config/layoutkeys/settings.toml)
    #[cfg(feature = "settings")]
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    /// Reload settings from the original file
    #[cfg(feature = "settings")]
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            *self = Self::from_file(path)?;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue("No source path set".to_string()))
        }
    }

    pub fn keyboard_type(&self) -> u32 {
        self.keyboard_type
    }

    pub fn set_keyboard_type(&mut self, keyboard_type: u32) {
        self.keyboard_type = keyboard_type;
    }

    pub fn compose_dead_keys(&self) -> bool {
        self.compose_dead_keys
    }

    pub fn set_compose_dead_keys(&mut self, enabled: bool) {
        self.compose_dead_keys = enabled;
    }

    pub fn option_as_altgr(&self) -> bool {
        self.option_as_altgr
    }

    pub fn set_option_as_altgr(&mut self, enabled: bool) {
        self.option_as_altgr = enabled;
    }

    pub fn layouts(&self) -> &[LayoutSource] {
        &self.layouts
    }

    pub fn add_layout(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.layouts.push(LayoutSource {
            id: id.into(),
            path: path.into(),
        });
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Parse a TOML value as a boolean
#[cfg(feature = "settings")]
fn parse_bool_value(value: &toml::Value) -> Result<bool, SettingsError> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(SettingsError::InvalidValue(format!(
                "Cannot convert '{}' to boolean",
                s
            ))),
        },
        _ => Err(SettingsError::InvalidValue(format!(
            "Cannot convert {:?} to boolean",
            value
        ))),
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Layoutkeys Settings
# Place this file at: ~/.config/layoutkeys/settings.toml

[keyboard]
# Keyboard type used to pick the layout variant (40 = ANSI)
type = 40
# Combine dead keys with the next keystroke
compose_dead_keys = true

[modifiers]
# Report Option as AltGr when it types a character
option_as_altgr = true

# Layout blobs for the command line tool
# [[layouts]]
# id = "com.apple.keylayout.US"
# path = "us.uchr"
"#
}
