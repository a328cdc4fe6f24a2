//! User configuration loaded from a TOML file. Every field has a default,
//! so a missing file or a partial file is fine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cadence_core::audio::DEFAULT_RING_CAPACITY;
use cadence_core::input::{Button, DEFAULT_DEADZONE};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    UnknownButton(String),
    UnknownKey { button: String, key: String },
    /// Two buttons bound to the same key.
    KeyConflict { key: String, first: String, second: String },
    /// A button bound to one of the fixed frontend hotkeys.
    ReservedKey { button: String, key: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "invalid config {}: {source}", path.display()),
            Self::UnknownButton(name) => write!(f, "unknown button in bindings: {name}"),
            Self::UnknownKey { button, key } => write!(f, "unknown key {key:?} bound to {button}"),
            Self::KeyConflict { key, first, second } => {
                write!(f, "key {key:?} bound to both {first} and {second}")
            }
            Self::ReservedKey { button, key } => {
                write!(f, "key {key:?} for {button} is reserved for a hotkey")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
    pub save: SaveConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Integer window scale over the native display size.
    pub scale: u32,
    pub vsync: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Frames per SDL callback.
    pub buffer_samples: u16,
    /// Interleaved samples held between the pacer and the callback.
    pub ring_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            buffer_samples: 1024,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub deadzone: i16,
    /// Button name -> SDL scancode name. Entries in the file override the
    /// defaults one button at a time.
    #[serde(deserialize_with = "keyboard_over_defaults")]
    pub keyboard: BTreeMap<String, String>,
    /// Button name -> joystick button index, merged like `keyboard`.
    #[serde(deserialize_with = "joystick_over_defaults")]
    pub joystick: BTreeMap<String, u32>,
}

const DEFAULT_KEYS: [(Button, &str); 12] = [
    (Button::A, "X"),
    (Button::B, "Z"),
    (Button::Select, "Space"),
    (Button::Start, "Return"),
    (Button::Right, "Right"),
    (Button::Left, "Left"),
    (Button::Up, "Up"),
    (Button::Down, "Down"),
    (Button::R, "S"),
    (Button::L, "A"),
    (Button::Turbo, "Tab"),
    (Button::Menu, "Escape"),
];

const DEFAULT_JOYSTICK: [(Button, u32); 12] = [
    (Button::A, 0),
    (Button::B, 1),
    (Button::Select, 11),
    (Button::Start, 10),
    (Button::Right, 14),
    (Button::Left, 12),
    (Button::Up, 13),
    (Button::Down, 15),
    (Button::R, 7),
    (Button::L, 6),
    (Button::Turbo, 9),
    (Button::Menu, 5),
];

fn default_keyboard() -> BTreeMap<String, String> {
    DEFAULT_KEYS
        .iter()
        .map(|(b, key)| (b.name().to_string(), key.to_string()))
        .collect()
}

fn default_joystick() -> BTreeMap<String, u32> {
    DEFAULT_JOYSTICK
        .iter()
        .map(|(b, idx)| (b.name().to_string(), *idx))
        .collect()
}

/// Lay the bindings from the file over `defaults`. Known button names are
/// normalised so `A` and `a` replace the same entry; unknown names are kept
/// for the key map to reject.
fn merge_over<'de, D, V>(
    deserializer: D,
    defaults: BTreeMap<String, V>,
) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let mut merged = defaults;
    for (name, value) in BTreeMap::<String, V>::deserialize(deserializer)? {
        let name = Button::from_name(&name).map_or(name, |b| b.name().to_string());
        merged.insert(name, value);
    }
    Ok(merged)
}

fn keyboard_over_defaults<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    merge_over(deserializer, default_keyboard())
}

fn joystick_over_defaults<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, u32>, D::Error> {
    merge_over(deserializer, default_joystick())
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            keyboard: default_keyboard(),
            joystick: default_joystick(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Flush the save region while running, not only on exit.
    pub autosave: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self { autosave: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub show_stats: bool,
}

impl Config {
    /// `<config dir>/cadence/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cadence").join("config.toml"))
    }

    /// Load `path`. A missing file yields the defaults when `required` is
    /// false.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        log::info!("Loaded config from {}", path.display());
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_port_layout() {
        let config = Config::default();
        assert_eq!(config.video.scale, 4);
        assert!(config.save.autosave);
        assert_eq!(config.audio.ring_capacity, 8192);
        assert_eq!(config.input.deadzone, 10_000);
        assert_eq!(config.input.keyboard["a"], "X");
        assert_eq!(config.input.keyboard["menu"], "Escape");
        assert_eq!(config.input.joystick["start"], 10);
        assert_eq!(config.input.joystick.len(), 12);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [video]
            scale = 2

            [input.keyboard]
            A = "K"

            [input.joystick]
            start = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.video.scale, 2);
        assert!(config.video.vsync);
        assert_eq!(config.input.keyboard.len(), 12);
        assert_eq!(config.input.keyboard["a"], "K");
        assert_eq!(config.input.keyboard["turbo"], "Tab");
        assert_eq!(config.input.keyboard["menu"], "Escape");
        assert_eq!(config.input.joystick.len(), 12);
        assert_eq!(config.input.joystick["start"], 3);
        assert_eq!(config.input.joystick["a"], 0);
        assert_eq!(config.audio, AudioConfig::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_depends_on_required() {
        let path = std::env::temp_dir().join("cadence_config_test_missing.toml");
        let _ = std::fs::remove_file(&path);
        assert_eq!(Config::load(&path, false).unwrap(), Config::default());
        assert!(matches!(
            Config::load(&path, true),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = std::env::temp_dir().join("cadence_config_test_bad");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[video]\nscale = \"big\"\n").unwrap();

        assert!(matches!(
            Config::load(&path, false),
            Err(ConfigError::Parse { .. })
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
