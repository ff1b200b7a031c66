// Layoutkeys CLI
// Inspect keyboard layout blobs: dump the key map, translate keystrokes,
// resolve hot keys

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use layoutkeys_core::native::VirtualKey;
use layoutkeys_core::{
    EventFlags, Group, InstalledLayout, KeyId, KeyMap, KeyResource, KeyState, LayoutId,
    ModifierMask, NativeKeyEvent, Settings,
};

/// Keyboard layout inspector
#[derive(Parser, Debug)]
#[command(name = "layoutkeys")]
#[command(version)]
#[command(about = "Decode macOS keyboard layouts into canonical key maps", long_about = None)]
struct Args {
    /// TOML settings file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Raw 'uchr' layout data (can be used multiple times, one group each)
    #[arg(short, long, value_name = "LAYOUT", global = true)]
    layout: Vec<PathBuf>,

    /// Keyboard type used to pick the layout variant
    #[arg(long, value_name = "TYPE", global = true)]
    keyboard_type: Option<u32>,

    /// Active layout group
    #[arg(short, long, default_value_t = 0, global = true)]
    group: u8,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every entry of the key map
    Dump,

    /// Type keystrokes such as `0x0E`, `option+14` or `shift+0`
    Translate {
        #[arg(required = true, value_name = "KEYSTROKE")]
        keys: Vec<String>,
    },

    /// Find the native key for a key id such as `a`, `F5` or `U+00E9`
    Hotkey {
        key: String,

        #[arg(long)]
        shift: bool,

        #[arg(long)]
        control: bool,

        #[arg(long)]
        alt: bool,

        #[arg(long = "super")]
        super_: bool,

        #[arg(long)]
        altgr: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Settings::load_default().context("failed to load default settings"),
    }
}

fn load_layouts(paths: &[PathBuf], settings: &Settings) -> Result<Vec<InstalledLayout>> {
    let sources: Vec<(String, PathBuf)> = if paths.is_empty() {
        settings
            .layouts()
            .iter()
            .map(|source| (source.id.clone(), source.path.clone()))
            .collect()
    } else {
        paths
            .iter()
            .map(|path| (path.display().to_string(), path.clone()))
            .collect()
    };

    if sources.is_empty() {
        bail!("no layouts given; pass --layout or add [[layouts]] to the settings file");
    }

    sources
        .into_iter()
        .map(|(id, path)| {
            let data = std::fs::read(&path)
                .with_context(|| format!("failed to read layout {}", path.display()))?;
            Ok(InstalledLayout::new(id, data))
        })
        .collect()
}

fn mask_name(mask: ModifierMask) -> String {
    if mask.is_empty() {
        return "-".to_string();
    }
    mask.iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join("+")
}

fn keys_name(ids: &[KeyId]) -> String {
    ids.iter().map(|id| id.name()).collect::<Vec<_>>().join(" ")
}

/// Parse `[modifier+]...<virtual key>` with a decimal or 0x-prefixed code
fn parse_keystroke(text: &str) -> Result<(VirtualKey, EventFlags)> {
    let mut parts: Vec<&str> = text.split('+').collect();
    let code = parts.pop().unwrap_or_default();
    let virtual_key = match code.strip_prefix("0x") {
        Some(hex) => VirtualKey::from_str_radix(hex, 16),
        None => code.parse(),
    }
    .with_context(|| format!("bad virtual key in '{}'", text))?;

    let mut flags = EventFlags::empty();
    for part in parts {
        flags |= match part.to_lowercase().as_str() {
            "shift" => EventFlags::SHIFT,
            "control" | "ctrl" => EventFlags::CONTROL,
            "option" | "opt" => EventFlags::ALTERNATE,
            "command" | "cmd" => EventFlags::COMMAND,
            "caps" => EventFlags::ALPHA_SHIFT,
            other => bail!("unknown modifier '{}' in '{}'", other, text),
        };
    }
    Ok((virtual_key, flags))
}

fn dump(state: &KeyState, map: &KeyMap) {
    for index in 0..state.num_groups() {
        let Ok(group) = u8::try_from(index).map(Group) else {
            break;
        };
        let valid = state.resource(group).is_some_and(|r| r.is_valid());
        let id = state.layout_id(group).map(LayoutId::as_str).unwrap_or("?");
        println!("group {} ({}){}", group, id, if valid { "" } else { " invalid" });

        for (key, entry) in map.iter().filter(|(key, _)| key.group == group) {
            let vk = key.button.virtual_key().map_or(0, u16::from);
            println!(
                "  {:>4}  {:#04x}  {:<24} {:<20}{}",
                key.button.get(),
                vk,
                mask_name(key.mask),
                keys_name(&entry.ids),
                if entry.dead { "  dead" } else { "" }
            );
        }
    }

    let half_duplex: Vec<String> = map.half_duplex().map(|b| b.to_string()).collect();
    println!("half duplex buttons: {}", half_duplex.join(" "));
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(keyboard_type) = args.keyboard_type {
        settings.set_keyboard_type(keyboard_type);
    }

    let layouts = load_layouts(&args.layout, &settings)?;
    let active = layouts
        .first()
        .map(|layout| layout.id.clone())
        .ok_or_else(|| anyhow!("no layouts loaded"))?;

    log::debug!("loaded {} layout(s), active {}", layouts.len(), active);

    let mut state = KeyState::new(settings);
    state.set_layouts(layouts, &active);
    if args.group != 0 && !state.set_group(Group(args.group)) {
        bail!("no layout group {}", args.group);
    }

    match args.command {
        Command::Dump => {
            let map = state.key_map_handle().snapshot();
            dump(&state, &map);
        }
        Command::Translate { keys } => {
            for text in &keys {
                let (virtual_key, flags) = parse_keystroke(text)?;
                let mapped = state.map_key_from_event(&NativeKeyEvent::key_down(virtual_key, flags));
                state.map_key_from_event(&NativeKeyEvent::key_up(virtual_key, flags));
                let button = mapped
                    .button
                    .map_or_else(|| "-".to_string(), |b| b.to_string());
                let output = if mapped.is_mapped() {
                    keys_name(&mapped.ids)
                } else {
                    "(nothing)".to_string()
                };
                println!("{:<16} button {:<4} {} [{}]", text, button, output, mask_name(mapped.mask));
            }
        }
        Command::Hotkey {
            key,
            shift,
            control,
            alt,
            super_,
            altgr,
        } => {
            let id: KeyId = key.parse().map_err(|e: String| anyhow!(e))?;
            let mut mask = ModifierMask::empty();
            mask.set(ModifierMask::SHIFT, shift);
            mask.set(ModifierMask::CONTROL, control);
            mask.set(ModifierMask::ALT, alt);
            mask.set(ModifierMask::SUPER, super_);
            mask.set(ModifierMask::ALT_GR, altgr);

            match state.map_hot_key_to_native(id, mask) {
                Some(hot) => println!(
                    "{} -> virtual key {:#04x} with modifiers {:#06x}",
                    id,
                    hot.virtual_key,
                    hot.modifiers.bits()
                ),
                None => bail!("layout cannot type {} with {}", id, mask_name(mask)),
            }
        }
    }

    Ok(())
}
