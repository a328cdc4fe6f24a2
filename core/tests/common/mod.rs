#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cadence_core::engine::{Engine, EngineEvents, RomError};
use cadence_core::input::{Button, DeviceSnapshot, InputState};
use cadence_core::pacer::{Host, HostCommand};
use cadence_core::save::Storage;

pub const WIDTH: u32 = 16;
pub const HEIGHT: u32 = 12;
pub const FRAME_FILL: u8 = 200;

/// Engine that emits audio chunks and frames on fixed step intervals.
pub struct ScriptedEngine {
    pub steps: u64,
    /// Emit a chunk every N steps (0 = never).
    pub audio_every: u64,
    /// Emit a frame every N steps (0 = never).
    pub frame_every: u64,
    pub chunk_len: usize,
    pub save: Vec<u8>,
    pub latches: Vec<u16>,
    pub resets: usize,
    next_sample: i16,
    chunk: Vec<i16>,
    frame: Vec<u8>,
}

impl ScriptedEngine {
    pub fn new(audio_every: u64, frame_every: u64, chunk_len: usize) -> Self {
        Self {
            steps: 0,
            audio_every,
            frame_every,
            chunk_len,
            save: vec![0; 64],
            latches: Vec::new(),
            resets: 0,
            next_sample: 1,
            chunk: Vec::new(),
            frame: vec![FRAME_FILL; (WIDTH * HEIGHT * 3) as usize],
        }
    }
}

impl Engine for ScriptedEngine {
    fn display_size(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn step(&mut self, events: &mut dyn EngineEvents) {
        self.steps += 1;
        if self.audio_every > 0 && self.steps % self.audio_every == 0 {
            self.chunk.clear();
            for _ in 0..self.chunk_len {
                self.chunk.push(self.next_sample);
                self.next_sample = self.next_sample.wrapping_add(1).max(1);
            }
            events.on_audio_chunk_ready(&self.chunk);
        }
        if self.frame_every > 0 && self.steps % self.frame_every == 0 {
            events.on_frame_ready(&self.frame);
        }
    }

    fn save_region(&self) -> &[u8] {
        &self.save
    }

    fn load_save_region(&mut self, data: &[u8]) {
        let len = data.len().min(self.save.len());
        self.save[..len].copy_from_slice(&data[..len]);
        self.save[len..].fill(0);
    }

    fn set_input_latch(&mut self, bits: u16) {
        self.latches.push(bits);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomError> {
        if rom.is_empty() {
            Err(RomError::Empty)
        } else {
            Ok(())
        }
    }
}

/// In-memory storage whose write log stays visible after the storage is
/// moved into an `Autosave`.
#[derive(Clone, Default)]
pub struct MemStorage {
    pub writes: Rc<RefCell<Vec<(PathBuf, Vec<u8>)>>>,
    pub existing: Option<Vec<u8>>,
    pub fail: bool,
}

impl MemStorage {
    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.borrow().last().map(|(_, data)| data.clone())
    }
}

impl Storage for MemStorage {
    fn read(&self, _path: &Path) -> io::Result<Option<Vec<u8>>> {
        Ok(self.existing.clone())
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("disk full"));
        }
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), data.to_vec()));
        Ok(())
    }
}

/// Host that records presented frames and replays scripted input.
#[derive(Default)]
pub struct RecordingHost {
    pub presented: Vec<Vec<u8>>,
    pub pumps: u64,
    /// Key edges delivered on the next pump.
    pub pending_keys: Vec<(Button, bool)>,
    /// Commands delivered on the next pump.
    pub pending_commands: Vec<HostCommand>,
    /// Deliver `Quit` on this pump number (1-based).
    pub quit_on_pump: Option<u64>,
    pub device: Option<DeviceSnapshot>,
}

impl Host for RecordingHost {
    fn present(&mut self, frame: &[u8]) {
        self.presented.push(frame.to_vec());
    }

    fn pump_events(&mut self, input: &mut InputState, commands: &mut Vec<HostCommand>) {
        self.pumps += 1;
        for (button, down) in self.pending_keys.drain(..) {
            input.set_key(button, down);
        }
        commands.append(&mut self.pending_commands);
        if self.quit_on_pump == Some(self.pumps) {
            commands.push(HostCommand::Quit);
        }
    }

    fn poll_device(&mut self) -> Option<DeviceSnapshot> {
        self.device
    }
}
