//! The steady-state loop: steps the engine until a frame or an audio chunk
//! boundary, feeds audio into the shared ring, presents frames through the
//! overlay, and latches input at every frame boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::audio::{PushOutcome, SampleRing, TurboFlag};
use crate::engine::{Engine, EngineEvents};
use crate::input::{Button, DeviceSnapshot, InputState};
use crate::overlay::{Overlay, Status, font};
use crate::save::{Autosave, SaveError, Storage};

/// Frames between FPS samples.
pub const FPS_WINDOW: u64 = 120;
/// Frames between autosave checks / overlay countdown ticks.
pub const HOUSEKEEPING_PERIOD: u64 = 60;
/// In turbo, only every Nth frame is presented.
pub const TURBO_PRESENT_INTERVAL: u64 = 20;

const NOTICE_TICKS: u32 = 2;
/// Poll interval while waiting for the audio device to drain the ring.
const AUDIO_WAIT: Duration = Duration::from_millis(1);

/// Frontend-level requests raised while pumping host events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Quit,
    Reset,
    ToggleStats,
}

/// Presentation and input surface the pacer drives once per frame.
pub trait Host {
    /// Show a finished RGB24 frame (overlay already composited).
    fn present(&mut self, frame: &[u8]);

    /// Drain pending window/keyboard events into `input` and `commands`.
    fn pump_events(&mut self, input: &mut InputState, commands: &mut Vec<HostCommand>);

    /// Level snapshot of the attached controller, if any.
    fn poll_device(&mut self) -> Option<DeviceSnapshot>;
}

/// Idempotent cancellation flag, checked once per frame boundary.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Frame counter with a windowed FPS estimate.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_count: u64,
    fps: u32,
    window_start: Instant,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            frame_count: 0,
            fps: 0,
            window_start: now,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Count a completed frame. Every [`FPS_WINDOW`] frames the FPS is
    /// recomputed from the elapsed milliseconds (floored at 1) and returned.
    pub fn frame_completed(&mut self, now: Instant) -> Option<u32> {
        self.frame_count += 1;
        if self.frame_count % FPS_WINDOW != 0 {
            return None;
        }
        let delta_ms = now
            .saturating_duration_since(self.window_start)
            .as_millis()
            .max(1);
        self.fps = u32::try_from(u128::from(FPS_WINDOW) * 1000 / delta_ms).unwrap_or(u32::MAX);
        self.window_start = now;
        Some(self.fps)
    }
}

/// Receives engine callbacks during one step.
struct StepSink<'a> {
    ring: &'a SampleRing,
    turbo: bool,
    framebuffer: &'a mut [u8],
    pushed: usize,
    audio_ready: bool,
    frame_ready: bool,
}

impl EngineEvents for StepSink<'_> {
    fn on_audio_chunk_ready(&mut self, samples: &[i16]) {
        self.audio_ready = true;
        if self.turbo {
            return;
        }
        match self.ring.push(samples) {
            PushOutcome::Accepted(count) => self.pushed += count,
            PushOutcome::Overflow { buffered, rejected } => {
                warn!("audio ring overflow: {buffered} buffered, dropped {rejected}");
                self.pushed += rejected;
            }
        }
    }

    fn on_frame_ready(&mut self, pixels: &[u8]) {
        self.frame_ready = true;
        let len = pixels.len().min(self.framebuffer.len());
        self.framebuffer[..len].copy_from_slice(&pixels[..len]);
    }
}

#[derive(Debug, Clone, Copy)]
struct Stepped {
    audio: bool,
    frame: bool,
}

/// The emulation session: owns the engine and every per-run counter,
/// buffer and flag, and shares only the sample ring with the audio thread.
pub struct Pacer<E: Engine, S: Storage> {
    engine: E,
    ring: Arc<SampleRing>,
    turbo: TurboFlag,
    stop: StopFlag,
    input: InputState,
    autosave: Autosave<S>,
    overlay: Overlay,
    stats: FrameStats,
    width: usize,
    framebuffer: Vec<u8>,
    composed: Vec<u8>,
    banner: String,
    commands: Vec<HostCommand>,
    underruns_reported: u64,
    /// Samples produced during the frame in progress and the last one.
    frame_audio: usize,
    last_frame_audio: usize,
}

impl<E: Engine, S: Storage> Pacer<E, S> {
    /// `engine` must already hold its ROM; `autosave` must have been
    /// attached to it.
    pub fn new(
        engine: E,
        autosave: Autosave<S>,
        ring: Arc<SampleRing>,
        input: InputState,
        overlay: Overlay,
    ) -> Self {
        let (width, height) = engine.display_size();
        let frame_len = (width * height * 3) as usize;
        Self {
            engine,
            ring,
            turbo: Arc::new(AtomicBool::new(false)),
            stop: StopFlag::new(),
            input,
            autosave,
            overlay,
            stats: FrameStats::new(Instant::now()),
            width: width as usize,
            framebuffer: vec![0; frame_len],
            composed: vec![0; frame_len],
            banner: String::new(),
            commands: Vec::new(),
            underruns_reported: 0,
            frame_audio: 0,
            last_frame_audio: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn ring(&self) -> &Arc<SampleRing> {
        &self.ring
    }

    /// Handle for the audio callback to observe accelerated mode.
    pub fn turbo_flag(&self) -> TurboFlag {
        Arc::clone(&self.turbo)
    }

    pub fn is_turbo(&self) -> bool {
        self.turbo.load(Ordering::Relaxed)
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    pub fn autosave(&self) -> &Autosave<S> {
        &self.autosave
    }

    pub fn frame_count(&self) -> u64 {
        self.stats.frame_count()
    }

    pub fn fps(&self) -> u32 {
        self.stats.fps()
    }

    /// Step until the engine emits one audio chunk. Frames completed on the
    /// way are still handled.
    pub fn run_until_audio_chunk(&mut self, host: &mut dyn Host) {
        loop {
            let stepped = self.step_once();
            if stepped.frame {
                self.finish_frame(host);
            }
            if stepped.audio {
                return;
            }
        }
    }

    /// Step until the engine completes one frame. Audio chunks produced on
    /// the way are pushed to the ring as they arrive.
    pub fn run_until_frame(&mut self, host: &mut dyn Host) {
        loop {
            if self.step_once().frame {
                self.finish_frame(host);
                return;
            }
        }
    }

    /// Run frames until stopped, then flush the save region unconditionally.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<(), SaveError> {
        info!("Entering main loop");
        while !self.stop.is_requested() {
            self.wait_for_audio_room();
            self.run_until_frame(host);
            self.frame_boundary(host);
        }
        info!("Stopping after {} frames", self.stats.frame_count());
        self.shutdown()
    }

    /// Final unconditional save flush.
    pub fn shutdown(&mut self) -> Result<(), SaveError> {
        self.autosave
            .flush_final(self.engine.save_region(), &mut self.overlay)
    }

    /// Normal speed is paced by the audio device: hold off while the ring
    /// cannot take another frame's worth of samples. Turbo never waits.
    pub fn wait_for_audio_room(&self) {
        let needed = self.last_frame_audio.min(self.ring.capacity());
        while !self.is_turbo()
            && !self.stop.is_requested()
            && self.ring.len() + needed > self.ring.capacity()
        {
            std::thread::sleep(AUDIO_WAIT);
        }
    }

    /// Input and host-command handling between frames.
    pub fn frame_boundary(&mut self, host: &mut dyn Host) {
        let mut commands = std::mem::take(&mut self.commands);
        commands.clear();
        host.pump_events(&mut self.input, &mut commands);
        for &command in &commands {
            self.apply_command(command);
        }
        self.commands = commands;

        if let Some(snapshot) = host.poll_device() {
            self.input.apply_device(&snapshot);
        }
        self.latch_input();

        if self.input.is_pressed(Button::Menu) {
            self.stop.request();
        }
    }

    fn apply_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Quit => self.stop.request(),
            HostCommand::Reset => {
                info!("Resetting engine");
                self.engine.reset();
                self.overlay.show(NOTICE_TICKS, "Reset");
            }
            HostCommand::ToggleStats => {
                let show = !self.overlay.show_stats();
                self.overlay.set_show_stats(show);
                self.overlay
                    .show(NOTICE_TICKS, if show { "Stats on" } else { "Stats off" });
            }
        }
    }

    fn latch_input(&mut self) {
        self.engine.set_input_latch(self.input.latch_bits());
        let turbo = self.input.turbo();
        if self.turbo.swap(turbo, Ordering::Relaxed) != turbo {
            info!("Turbo {}", if turbo { "on" } else { "off" });
        }
    }

    fn step_once(&mut self) -> Stepped {
        let mut sink = StepSink {
            ring: &self.ring,
            turbo: self.turbo.load(Ordering::Relaxed),
            framebuffer: &mut self.framebuffer,
            pushed: 0,
            audio_ready: false,
            frame_ready: false,
        };
        self.engine.step(&mut sink);
        self.frame_audio += sink.pushed;
        Stepped {
            audio: sink.audio_ready,
            frame: sink.frame_ready,
        }
    }

    fn finish_frame(&mut self, host: &mut dyn Host) {
        self.last_frame_audio = std::mem::take(&mut self.frame_audio);
        let turbo = self.is_turbo();
        if let Some(fps) = self.stats.frame_completed(Instant::now()) {
            debug!("FPS: {fps}");
            self.report_underruns();
        }

        let frame = self.stats.frame_count();
        if frame % HOUSEKEEPING_PERIOD == 0 && !turbo {
            self.autosave
                .check(self.engine.save_region(), &mut self.overlay);
            self.overlay.tick();
        }

        if turbo && frame % TURBO_PRESENT_INTERVAL != 0 {
            return;
        }
        self.present(host, turbo);
    }

    fn present(&mut self, host: &mut dyn Host, turbo: bool) {
        let status = Status {
            fps: self.stats.fps(),
            buffered_samples: self.ring.len(),
            turbo,
        };
        if !self.overlay.compose(&status, &mut self.banner) {
            host.present(&self.framebuffer);
            return;
        }
        self.composed.copy_from_slice(&self.framebuffer);
        font::draw_banner(&mut self.composed, self.width, &self.banner);
        host.present(&self.composed);
    }

    fn report_underruns(&mut self) {
        let total = self.ring.underruns();
        if total > self.underruns_reported {
            warn!(
                "audio underrun: {} callbacks padded with silence",
                total - self.underruns_reported
            );
            self.underruns_reported = total;
        }
    }
}
