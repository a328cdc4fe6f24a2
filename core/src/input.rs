//! Merges keyboard edges and a polled controller into one logical
//! button table, latched into the engine once per frame.

pub const BUTTON_COUNT: usize = 12;

/// Buttons at indices below this are latched into the engine; Turbo and
/// Menu are frontend-only.
pub const LATCHED_BUTTONS: usize = 10;

/// Default analog deadzone for i16 joystick axes.
pub const DEFAULT_DEADZONE: i16 = 10_000;

/// Logical buttons, in latch bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
    R,
    L,
    Turbo,
    Menu,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
        Button::R,
        Button::L,
        Button::Turbo,
        Button::Menu,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Button::A => "a",
            Button::B => "b",
            Button::Select => "select",
            Button::Start => "start",
            Button::Right => "right",
            Button::Left => "left",
            Button::Up => "up",
            Button::Down => "down",
            Button::R => "r",
            Button::L => "l",
            Button::Turbo => "turbo",
            Button::Menu => "menu",
        }
    }

    pub fn from_name(name: &str) -> Option<Button> {
        Button::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Level state of a polled controller at one frame boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub buttons: [bool; BUTTON_COUNT],
    pub axis_x: i16,
    pub axis_y: i16,
}

/// Per-button {keyboard, device} assertions.
///
/// The effective state of a button is keyboard OR device. Keyboard state is
/// edge driven (key down sets, key up clears); device state is replaced on
/// every poll.
#[derive(Debug, Clone)]
pub struct InputState {
    keyboard: [bool; BUTTON_COUNT],
    device: [bool; BUTTON_COUNT],
    deadzone: i32,
}

impl InputState {
    pub fn new(deadzone: i16) -> Self {
        Self {
            keyboard: [false; BUTTON_COUNT],
            device: [false; BUTTON_COUNT],
            deadzone: i32::from(deadzone).abs(),
        }
    }

    /// Record a key edge for a mapped button.
    pub fn set_key(&mut self, button: Button, down: bool) {
        self.keyboard[button.index()] = down;
    }

    /// Replace the device assertions with a fresh snapshot.
    ///
    /// Discrete buttons map directly. The two axes are then OR-ed onto the
    /// directional buttons when they exceed the deadzone in the matching
    /// direction, so a held d-pad and a deflected stick both count.
    pub fn apply_device(&mut self, snapshot: &DeviceSnapshot) {
        self.device = snapshot.buttons;

        let x = i32::from(snapshot.axis_x);
        let y = i32::from(snapshot.axis_y);
        self.device[Button::Right.index()] |= x > self.deadzone;
        self.device[Button::Left.index()] |= x < -self.deadzone;
        self.device[Button::Up.index()] |= y < -self.deadzone;
        self.device[Button::Down.index()] |= y > self.deadzone;
    }

    /// Drop every device assertion (controller unplugged).
    pub fn clear_device(&mut self) {
        self.device = [false; BUTTON_COUNT];
    }

    pub fn keyboard_asserted(&self, button: Button) -> bool {
        self.keyboard[button.index()]
    }

    pub fn device_asserted(&self, button: Button) -> bool {
        self.device[button.index()]
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.keyboard_asserted(button) || self.device_asserted(button)
    }

    /// Accelerated mode is simply "Turbo held on any source".
    pub fn turbo(&self) -> bool {
        self.is_pressed(Button::Turbo)
    }

    /// Engine latch value: bit N set when logical button N is pressed.
    pub fn latch_bits(&self) -> u16 {
        Button::ALL[..LATCHED_BUTTONS]
            .iter()
            .filter(|&&b| self.is_pressed(b))
            .fold(0, |bits, &b| bits | (1 << b.index()))
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(DEFAULT_DEADZONE)
    }
}
