//! Real-time glue between a cycle-stepped emulation engine, an audio
//! device running on its own clock, and a display surface.
//!
//! The [`pacer::Pacer`] steps an [`engine::Engine`] until a frame or audio
//! chunk boundary, feeds samples into an [`audio::SampleRing`] drained by
//! the audio callback, composites the [`overlay::Overlay`] onto each
//! presented frame, latches [`input::InputState`] once per frame and lets
//! [`save::Autosave`] flush the battery save once it settles.

pub mod audio;
pub mod engine;
pub mod input;
pub mod overlay;
pub mod pacer;
pub mod save;

pub mod prelude {
    pub use crate::audio::{PopOutcome, PushOutcome, SampleRing, TurboFlag};
    pub use crate::engine::{Engine, EngineEvents, RomError};
    pub use crate::input::{Button, DeviceSnapshot, InputState};
    pub use crate::overlay::{Overlay, Status};
    pub use crate::pacer::{Host, HostCommand, Pacer, StopFlag};
    pub use crate::save::{Autosave, FsStorage, SaveError, Storage, save_path_for};
}
