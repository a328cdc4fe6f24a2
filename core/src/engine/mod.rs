pub mod test_pattern;

pub use test_pattern::TestPatternEngine;

/// Notifications an engine raises from inside [`Engine::step`].
///
/// The driver implements this to react to engine-determined boundaries;
/// it never decides when they happen.
pub trait EngineEvents {
    /// One chunk of interleaved signed 16-bit samples has been decoded.
    fn on_audio_chunk_ready(&mut self, samples: &[i16]);

    /// One complete frame is ready. `pixels` is RGB24, row-major,
    /// `width * height * 3` bytes (see [`Engine::display_size`]).
    fn on_frame_ready(&mut self, pixels: &[u8]);
}

/// Errors an engine reports when it cannot accept a ROM image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomError {
    /// The image contained no bytes.
    Empty,

    /// The image does not fit the engine's ROM window.
    TooLarge { size: usize, max: usize },

    /// Engine-specific rejection (bad header, unsupported mapper, ...).
    Rejected(String),
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "ROM image is empty"),
            Self::TooLarge { size, max } => {
                write!(f, "ROM image is {size} bytes, engine accepts at most {max}")
            }
            Self::Rejected(reason) => write!(f, "ROM rejected: {reason}"),
        }
    }
}

impl std::error::Error for RomError {}

/// Cycle-stepped emulation engine consumed by the frame pacer.
///
/// The pacer only sees this narrow surface: it steps the engine, reacts to
/// the callbacks raised through [`EngineEvents`], latches input once per
/// frame and watches the persistent save region for autosave.
pub trait Engine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Output rate of the interleaved stereo samples, in Hz.
    fn sample_rate(&self) -> u32;

    /// Advance by one internal unit. May call zero or more `events` callbacks.
    fn step(&mut self, events: &mut dyn EngineEvents);

    /// Live contents of the battery-backed save memory.
    fn save_region(&self) -> &[u8];

    /// Overwrite the start of the save region with `data`.
    ///
    /// Bytes past `data.len()` are zeroed; excess input is ignored.
    fn load_save_region(&mut self, data: &[u8]);

    /// Latch the controller bitmask (bit N = logical button N, N < 10).
    fn set_input_latch(&mut self, bits: u16);

    /// Return to the power-on state, keeping the loaded ROM and save region.
    fn reset(&mut self);

    /// Load a ROM image. Called once at startup, before [`Engine::reset`].
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomError>;
}
