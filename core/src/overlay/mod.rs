pub mod font;

use std::fmt::Write;

/// Longest message kept; anything beyond is cut at a char boundary.
pub const MESSAGE_CAPACITY: usize = 63;

/// Inputs for the stats line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status {
    pub fps: u32,
    pub buffered_samples: usize,
    pub turbo: bool,
}

/// Single-slot transient message plus the FPS/stats line.
///
/// A message is shown for a number of housekeeping ticks; a new request
/// always replaces the one in flight.
#[derive(Debug, Default)]
pub struct Overlay {
    text: String,
    remaining_ticks: u32,
    show_stats: bool,
}

impl Overlay {
    pub fn new(show_stats: bool) -> Self {
        Self {
            text: String::new(),
            remaining_ticks: 0,
            show_stats,
        }
    }

    /// Show `text` for `ticks` housekeeping ticks, replacing any message.
    pub fn show(&mut self, ticks: u32, text: &str) {
        let end = text
            .char_indices()
            .nth(MESSAGE_CAPACITY)
            .map_or(text.len(), |(i, _)| i);
        self.text.clear();
        self.text.push_str(&text[..end]);
        self.remaining_ticks = ticks;
    }

    /// One housekeeping tick elapsed in normal-speed mode.
    pub fn tick(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    pub fn message(&self) -> Option<&str> {
        self.is_active().then_some(self.text.as_str())
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    pub fn set_show_stats(&mut self, show: bool) {
        self.show_stats = show;
    }

    /// Write the banner text for this frame into `out`.
    ///
    /// Precedence: active message, then the stats line when enabled, then
    /// FPS alone while in turbo. Returns false when nothing is drawn.
    pub fn compose(&self, status: &Status, out: &mut String) -> bool {
        out.clear();
        if let Some(text) = self.message() {
            out.push_str(text);
        } else if self.show_stats {
            let _ = write!(
                out,
                "FPS: {}, fifo: {}",
                status.fps, status.buffered_samples
            );
        } else if status.turbo {
            let _ = write!(out, "FPS: {}", status.fps);
        } else {
            return false;
        }
        true
    }
}
