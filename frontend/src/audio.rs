use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cadence_core::audio::{SampleRing, TurboFlag};
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

use crate::error::StartupError;

/// Interleaved stereo output.
pub const CHANNELS: u8 = 2;

/// Number of samples over which to fade in/out (~2.7 ms of stereo at 48 kHz).
const FADE_SAMPLES: u32 = 256;

pub(crate) struct AudioPlayer {
    ring: Arc<SampleRing>,
    turbo: TurboFlag,
    fade_in_pos: u32,
    fading_out: Arc<AtomicBool>,
    fade_out_pos: u32,
}

impl AudioCallback for AudioPlayer {
    type Channel = i16;
    fn callback(&mut self, out: &mut [i16]) {
        // Turbo leaves the ring alone; the pacer is not feeding it either.
        if self.turbo.load(Ordering::Relaxed) {
            out.fill(0);
            return;
        }
        self.ring.pop(out);
        self.apply_fades(out);
    }
}

impl AudioPlayer {
    fn apply_fades(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            if self.fade_in_pos < FADE_SAMPLES {
                // Ramp up from silence at startup
                let gain = self.fade_in_pos as f32 / FADE_SAMPLES as f32;
                *sample = (*sample as f32 * gain) as i16;
                self.fade_in_pos += 1;
            } else if self.fading_out.load(Ordering::Relaxed) {
                // Ramp down to silence at shutdown
                if self.fade_out_pos < FADE_SAMPLES {
                    let gain = 1.0 - (self.fade_out_pos as f32 / FADE_SAMPLES as f32);
                    *sample = (*sample as f32 * gain) as i16;
                    self.fade_out_pos += 1;
                } else {
                    *sample = 0;
                }
            }
        }
    }
}

/// Handle for signalling the audio callback to fade out before shutdown.
pub type FadeOut = Arc<AtomicBool>;

/// Open a paused stereo playback device at the engine's sample rate,
/// draining `ring`.
///
/// Returns the device (must be kept alive) and a fade-out signal for clean
/// shutdown.
pub fn open(
    sdl_audio: &sdl2::AudioSubsystem,
    ring: Arc<SampleRing>,
    turbo: TurboFlag,
    sample_rate: u32,
    buffer_samples: u16,
) -> Result<(AudioDevice<AudioPlayer>, FadeOut), StartupError> {
    let fade_out: FadeOut = Arc::new(AtomicBool::new(false));

    let desired_spec = AudioSpecDesired {
        freq: Some(sample_rate as i32),
        channels: Some(CHANNELS),
        samples: Some(buffer_samples),
    };

    let device = sdl_audio
        .open_playback(None, &desired_spec, |spec| {
            log::info!(
                "Audio device: {} Hz, {} channels, {} samples",
                spec.freq,
                spec.channels,
                spec.samples
            );
            AudioPlayer {
                ring,
                turbo,
                fade_in_pos: 0,
                fading_out: Arc::clone(&fade_out),
                fade_out_pos: 0,
            }
        })
        .map_err(StartupError::Audio)?;

    Ok((device, fade_out))
}

/// Signal the fade-out, give the callback time to ramp down, then pause.
pub fn shut_down(device: &AudioDevice<AudioPlayer>, fade_out: &FadeOut) {
    fade_out.store(true, Ordering::Relaxed);
    std::thread::sleep(fade_out_duration());
    device.pause();
}

/// Duration to sleep after signalling fade-out, allowing the callback
/// to ramp down before the device is paused.
fn fade_out_duration() -> Duration {
    // FADE_SAMPLES at 48 kHz stereo is under 3 ms; round up.
    Duration::from_millis(10)
}
