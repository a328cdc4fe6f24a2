//! Built-in engine that draws a test pattern and plays a test tone.
//!
//! Lets the frontend run end to end without an external emulation core:
//! video, audio, input latching and the save region all behave like a real
//! cycle-stepped engine, just with trivial content.

use super::{Engine, EngineEvents, RomError};

pub const DISPLAY_WIDTH: u32 = 240;
pub const DISPLAY_HEIGHT: u32 = 160;
pub const SAMPLE_RATE: u32 = 48_000;
pub const SAVE_REGION_LEN: usize = 8 * 1024;
pub const MAX_ROM_LEN: usize = 32 * 1024 * 1024;

/// One step is one scanline: 160 visible lines plus 68 lines of blanking.
const VISIBLE_LINES: u32 = DISPLAY_HEIGHT;
const LINES_PER_FRAME: u32 = 228;
/// Four audio chunks per frame.
const LINES_PER_CHUNK: u32 = LINES_PER_FRAME / 4;
/// Stereo pairs per chunk at 60 frames per second.
const PAIRS_PER_CHUNK: usize = (SAMPLE_RATE / 60 / 4) as usize;

const TONE_HZ: u32 = 440;
const TONE_AMPLITUDE: i16 = 4000;
const CURSOR_SIZE: u32 = 8;

const BIT_A: u16 = 1 << 0;
const BIT_START: u16 = 1 << 3;
const BIT_RIGHT: u16 = 1 << 4;
const BIT_LEFT: u16 = 1 << 5;
const BIT_UP: u16 = 1 << 6;
const BIT_DOWN: u16 = 1 << 7;

pub struct TestPatternEngine {
    rom_seed: u8,
    line: u32,
    frame: u64,
    latch: u16,
    prev_latch: u16,
    cursor: (u32, u32),
    phase: u32,
    save: Vec<u8>,
    framebuffer: Vec<u8>,
    chunk: Vec<i16>,
}

impl TestPatternEngine {
    pub fn new() -> Self {
        Self {
            rom_seed: 0,
            line: 0,
            frame: 0,
            latch: 0,
            prev_latch: 0,
            cursor: initial_cursor(),
            phase: 0,
            save: vec![0; SAVE_REGION_LEN],
            framebuffer: vec![0; (DISPLAY_WIDTH * DISPLAY_HEIGHT * 3) as usize],
            chunk: vec![0; PAIRS_PER_CHUNK * 2],
        }
    }

    /// Number of Start presses recorded in the save region.
    pub fn start_presses(&self) -> u32 {
        u32::from_le_bytes([self.save[0], self.save[1], self.save[2], self.save[3]])
    }

    fn fill_audio_chunk(&mut self) {
        let period = SAMPLE_RATE / TONE_HZ;
        for pair in self.chunk.chunks_exact_mut(2) {
            let sample = if self.latch & BIT_A == 0 {
                0
            } else if self.phase < period / 2 {
                TONE_AMPLITUDE
            } else {
                -TONE_AMPLITUDE
            };
            pair[0] = sample;
            pair[1] = sample;
            self.phase = (self.phase + 1) % period;
        }
    }

    fn end_frame(&mut self) {
        let pressed = self.latch & !self.prev_latch;
        if pressed & BIT_START != 0 {
            let count = self.start_presses().wrapping_add(1);
            self.save[..4].copy_from_slice(&count.to_le_bytes());
        }
        self.prev_latch = self.latch;

        let (mut cx, mut cy) = self.cursor;
        if self.latch & BIT_RIGHT != 0 {
            cx = (cx + 1).min(DISPLAY_WIDTH - CURSOR_SIZE);
        }
        if self.latch & BIT_LEFT != 0 {
            cx = cx.saturating_sub(1);
        }
        if self.latch & BIT_DOWN != 0 {
            cy = (cy + 1).min(DISPLAY_HEIGHT - CURSOR_SIZE);
        }
        if self.latch & BIT_UP != 0 {
            cy = cy.saturating_sub(1);
        }
        self.cursor = (cx, cy);

        self.render();
        self.frame += 1;
    }

    fn render(&mut self) {
        let scroll = self.frame as u32;
        let (cx, cy) = self.cursor;
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                let offset = ((y * DISPLAY_WIDTH + x) * 3) as usize;
                let on_cursor =
                    (cx..cx + CURSOR_SIZE).contains(&x) && (cy..cy + CURSOR_SIZE).contains(&y);
                let rgb = if on_cursor {
                    [255, 255, 255]
                } else {
                    [
                        (x.wrapping_add(scroll) as u8) ^ self.rom_seed,
                        (y * 255 / DISPLAY_HEIGHT) as u8,
                        self.rom_seed.wrapping_add((scroll / 4) as u8),
                    ]
                };
                self.framebuffer[offset..offset + 3].copy_from_slice(&rgb);
            }
        }
    }
}

impl Default for TestPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_cursor() -> (u32, u32) {
    (
        (DISPLAY_WIDTH - CURSOR_SIZE) / 2,
        (DISPLAY_HEIGHT - CURSOR_SIZE) / 2,
    )
}

impl Engine for TestPatternEngine {
    fn display_size(&self) -> (u32, u32) {
        (DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn step(&mut self, events: &mut dyn EngineEvents) {
        self.line += 1;
        if self.line % LINES_PER_CHUNK == 0 {
            self.fill_audio_chunk();
            events.on_audio_chunk_ready(&self.chunk);
        }
        if self.line == VISIBLE_LINES {
            self.end_frame();
            events.on_frame_ready(&self.framebuffer);
        }
        if self.line == LINES_PER_FRAME {
            self.line = 0;
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
        self.latch = bits;
    }

    fn reset(&mut self) {
        self.line = 0;
        self.frame = 0;
        self.latch = 0;
        self.prev_latch = 0;
        self.cursor = initial_cursor();
        self.phase = 0;
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomError> {
        if rom.is_empty() {
            return Err(RomError::Empty);
        }
        if rom.len() > MAX_ROM_LEN {
            return Err(RomError::TooLarge {
                size: rom.len(),
                max: MAX_ROM_LEN,
            });
        }
        self.rom_seed = rom.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        self.save.fill(0);
        Ok(())
    }
}
