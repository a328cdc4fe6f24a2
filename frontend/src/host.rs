use std::path::PathBuf;

use cadence_core::input::{DeviceSnapshot, InputState};
use cadence_core::pacer::{Host, HostCommand};
use log::{info, warn};
use sdl2::EventPump;
use sdl2::JoystickSubsystem;
use sdl2::event::Event;
use sdl2::joystick::Joystick;

use crate::error::StartupError;
use crate::input::{JoystickMap, KeyMap, RESET_KEY, SCREENSHOT_KEY, TOGGLE_STATS_KEY};
use crate::screenshot;
use crate::video::Video;

pub struct HostOptions {
    pub key_map: KeyMap,
    pub joystick_map: JoystickMap,
    /// Screenshots are written next to this path.
    pub rom_path: PathBuf,
}

/// Window, keyboard and first joystick.
pub struct SdlHost<'t> {
    video: Video<'t>,
    event_pump: EventPump,
    joystick_subsystem: JoystickSubsystem,
    joystick: Option<Joystick>,
    key_map: KeyMap,
    joystick_map: JoystickMap,
    last_frame: Vec<u8>,
    rom_path: PathBuf,
    next_screenshot: u32,
}

impl<'t> SdlHost<'t> {
    pub fn new(
        sdl: &sdl2::Sdl,
        video: Video<'t>,
        options: HostOptions,
    ) -> Result<Self, StartupError> {
        let joystick_subsystem = sdl.joystick().map_err(StartupError::Sdl)?;
        let event_pump = sdl.event_pump().map_err(StartupError::Sdl)?;

        let mut host = Self {
            video,
            event_pump,
            joystick_subsystem,
            joystick: None,
            key_map: options.key_map,
            joystick_map: options.joystick_map,
            last_frame: Vec::new(),
            rom_path: options.rom_path,
            next_screenshot: 0,
        };
        if host.joystick_subsystem.num_joysticks().unwrap_or(0) > 0 {
            host.open_joystick(0);
        }
        Ok(host)
    }

    fn open_joystick(&mut self, index: u32) {
        if self.joystick.is_some() {
            return;
        }
        match self.joystick_subsystem.open(index) {
            Ok(joystick) => {
                info!("Joystick attached: {}", joystick.name());
                self.joystick = Some(joystick);
            }
            Err(e) => warn!("Cannot open joystick {index}: {e}"),
        }
    }

    fn save_screenshot(&mut self) {
        if self.last_frame.is_empty() {
            return;
        }
        let (path, n) = screenshot::next_path(&self.rom_path, self.next_screenshot);
        self.next_screenshot = n + 1;
        let (width, height) = self.video.size();
        match screenshot::save_png(&path, &self.last_frame, width, height) {
            Ok(()) => info!("Screenshot saved: {}", path.display()),
            Err(e) => warn!("Screenshot {} failed: {e}", path.display()),
        }
    }
}

impl Host for SdlHost<'_> {
    fn present(&mut self, frame: &[u8]) {
        if self.last_frame.len() == frame.len() {
            self.last_frame.copy_from_slice(frame);
        } else {
            self.last_frame = frame.to_vec();
        }
        if let Err(e) = self.video.present(frame) {
            warn!("present failed: {e}");
        }
    }

    fn pump_events(&mut self, input: &mut InputState, commands: &mut Vec<HostCommand>) {
        let mut screenshot = false;
        let mut added = None;
        let mut removed = None;

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => commands.push(HostCommand::Quit),

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => match sc {
                    TOGGLE_STATS_KEY => commands.push(HostCommand::ToggleStats),
                    RESET_KEY => commands.push(HostCommand::Reset),
                    SCREENSHOT_KEY => screenshot = true,
                    _ => {
                        if let Some(button) = self.key_map.get(sc) {
                            input.set_key(button, true);
                        }
                    }
                },

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(button) = self.key_map.get(sc) {
                        input.set_key(button, false);
                    }
                }

                Event::JoyDeviceAdded { which, .. } => added = Some(which),
                Event::JoyDeviceRemoved { which, .. } => removed = Some(which),

                _ => {}
            }
        }

        if let Some(instance) = removed
            && self
                .joystick
                .as_ref()
                .is_some_and(|j| j.instance_id() == instance)
        {
            info!("Joystick detached");
            self.joystick = None;
            input.clear_device();
        }
        if let Some(index) = added {
            self.open_joystick(index);
        }
        if screenshot {
            self.save_screenshot();
        }
    }

    fn poll_device(&mut self) -> Option<DeviceSnapshot> {
        self.joystick
            .as_ref()
            .map(|joystick| self.joystick_map.snapshot(joystick))
    }
}
