use std::collections::{BTreeMap, HashMap};

use cadence_core::input::{BUTTON_COUNT, Button, DeviceSnapshot};
use sdl2::joystick::Joystick;
use sdl2::keyboard::Scancode;

use crate::config::ConfigError;

pub const TOGGLE_STATS_KEY: Scancode = Scancode::F3;
pub const RESET_KEY: Scancode = Scancode::F5;
pub const SCREENSHOT_KEY: Scancode = Scancode::F12;

/// Handled by the frontend before the key map; never bindable.
const HOTKEYS: [Scancode; 3] = [TOGGLE_STATS_KEY, RESET_KEY, SCREENSHOT_KEY];

/// Maps SDL scancodes to logical buttons.
#[derive(Debug, Default)]
pub struct KeyMap {
    map: HashMap<Scancode, Button>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a scancode to a button. A scancode drives at most one button.
    pub fn bind(&mut self, scancode: Scancode, button: Button) {
        self.map.insert(scancode, button);
    }

    /// Look up the button for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<Button> {
        self.map.get(&scancode).copied()
    }

    /// Build from `button name -> scancode name` pairs as found in the
    /// config file. Hotkeys and keys shared by two buttons are rejected.
    pub fn from_bindings(bindings: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut km = Self::new();
        for (name, key) in bindings {
            let button = parse_button(name)?;
            let scancode = Scancode::from_name(key).ok_or_else(|| ConfigError::UnknownKey {
                button: name.clone(),
                key: key.clone(),
            })?;
            if HOTKEYS.contains(&scancode) {
                return Err(ConfigError::ReservedKey {
                    button: name.clone(),
                    key: key.clone(),
                });
            }
            if let Some(first) = km.get(scancode)
                && first != button
            {
                return Err(ConfigError::KeyConflict {
                    key: key.clone(),
                    first: first.name().to_string(),
                    second: button.name().to_string(),
                });
            }
            km.bind(scancode, button);
        }
        Ok(km)
    }
}

/// Joystick button index for each logical button.
#[derive(Debug, Default)]
pub struct JoystickMap {
    buttons: [Option<u32>; BUTTON_COUNT],
}

impl JoystickMap {
    pub fn from_bindings(bindings: &BTreeMap<String, u32>) -> Result<Self, ConfigError> {
        let mut jm = Self::default();
        for (name, &index) in bindings {
            jm.buttons[parse_button(name)?.index()] = Some(index);
        }
        Ok(jm)
    }

    pub fn index_of(&self, button: Button) -> Option<u32> {
        self.buttons[button.index()]
    }

    /// Read the bound buttons and the first two axes of `joystick`.
    pub fn snapshot(&self, joystick: &Joystick) -> DeviceSnapshot {
        self.snapshot_with(
            |index| joystick.button(index).unwrap_or(false),
            joystick.axis(0).unwrap_or(0),
            joystick.axis(1).unwrap_or(0),
        )
    }

    fn snapshot_with(
        &self,
        pressed: impl Fn(u32) -> bool,
        axis_x: i16,
        axis_y: i16,
    ) -> DeviceSnapshot {
        let mut snapshot = DeviceSnapshot {
            axis_x,
            axis_y,
            ..Default::default()
        };
        for (slot, index) in snapshot.buttons.iter_mut().zip(self.buttons) {
            *slot = index.is_some_and(&pressed);
        }
        snapshot
    }
}

fn parse_button(name: &str) -> Result<Button, ConfigError> {
    Button::from_name(name).ok_or_else(|| ConfigError::UnknownButton(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;

    #[test]
    fn default_bindings_resolve() {
        let config = InputConfig::default();
        let km = KeyMap::from_bindings(&config.keyboard).unwrap();
        assert_eq!(km.get(Scancode::X), Some(Button::A));
        assert_eq!(km.get(Scancode::Return), Some(Button::Start));
        assert_eq!(km.get(Scancode::Tab), Some(Button::Turbo));
        assert_eq!(km.get(Scancode::F3), None);

        let jm = JoystickMap::from_bindings(&config.joystick).unwrap();
        assert_eq!(jm.index_of(Button::Right), Some(14));
        assert_eq!(jm.index_of(Button::Menu), Some(5));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut keys = BTreeMap::new();
        keys.insert("jump".to_string(), "Space".to_string());
        assert!(matches!(
            KeyMap::from_bindings(&keys),
            Err(ConfigError::UnknownButton(_))
        ));

        let mut keys = BTreeMap::new();
        keys.insert("a".to_string(), "NoSuchKey".to_string());
        assert!(matches!(
            KeyMap::from_bindings(&keys),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn hotkeys_cannot_be_bound() {
        for key in ["F3", "F5", "F12"] {
            let mut keys = BTreeMap::new();
            keys.insert("start".to_string(), key.to_string());
            assert!(matches!(
                KeyMap::from_bindings(&keys),
                Err(ConfigError::ReservedKey { .. })
            ));
        }
    }

    #[test]
    fn one_key_for_two_buttons_is_rejected() {
        let config: crate::config::Config = toml::from_str(
            r#"
            [input.keyboard]
            a = "Z"
            "#,
        )
        .unwrap();
        match KeyMap::from_bindings(&config.input.keyboard) {
            Err(ConfigError::KeyConflict { first, second, .. }) => {
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("expected a conflict, got {other:?}"),
        }
    }

    #[test]
    fn partial_override_keeps_other_default_keys() {
        let config: crate::config::Config = toml::from_str(
            r#"
            [input.keyboard]
            a = "K"
            "#,
        )
        .unwrap();
        let km = KeyMap::from_bindings(&config.input.keyboard).unwrap();
        assert_eq!(km.get(Scancode::K), Some(Button::A));
        assert_eq!(km.get(Scancode::X), None);
        assert_eq!(km.get(Scancode::Tab), Some(Button::Turbo));
        assert_eq!(km.get(Scancode::Escape), Some(Button::Menu));
        assert_eq!(km.get(Scancode::Left), Some(Button::Left));
    }

    #[test]
    fn snapshot_reads_only_bound_buttons() {
        let mut bindings = BTreeMap::new();
        bindings.insert("a".to_string(), 0);
        bindings.insert("start".to_string(), 10);
        let jm = JoystickMap::from_bindings(&bindings).unwrap();

        let snapshot = jm.snapshot_with(|index| index == 10 || index == 3, -200, 32_000);
        assert!(snapshot.buttons[Button::Start.index()]);
        assert!(!snapshot.buttons[Button::A.index()]);
        assert_eq!(snapshot.buttons.iter().filter(|&&b| b).count(), 1);
        assert_eq!((snapshot.axis_x, snapshot.axis_y), (-200, 32_000));
    }
}
