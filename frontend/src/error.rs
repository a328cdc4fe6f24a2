use cadence_core::engine::RomError;

use crate::config::ConfigError;
use crate::rom_path::RomLoadError;

/// Anything that stops the frontend before the main loop starts.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    RomFile(RomLoadError),
    Rom(RomError),
    /// SDL subsystem, window or renderer setup.
    Sdl(String),
    /// The audio device could not be opened.
    Audio(String),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::RomFile(e) => write!(f, "cannot load ROM: {e}"),
            Self::Rom(e) => write!(f, "engine rejected ROM: {e}"),
            Self::Sdl(e) => write!(f, "SDL: {e}"),
            Self::Audio(e) => write!(f, "failed to open audio device: {e}"),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RomLoadError> for StartupError {
    fn from(e: RomLoadError) -> Self {
        Self::RomFile(e)
    }
}

impl From<RomError> for StartupError {
    fn from(e: RomError) -> Self {
        Self::Rom(e)
    }
}
