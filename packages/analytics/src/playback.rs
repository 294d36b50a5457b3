//! Hour-by-hour time playback.
//!
//! The dashboard can animate the survey day by stepping a one-hour window
//! forward on every timer tick. The host owns the timer; this only tracks
//! where the window is.

use chrono::{Duration, NaiveDateTime};
use mobility_map_analytics_models::DateWindow;

/// Rolling one-hour window between `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    start: NaiveDateTime,
    end: NaiveDateTime,
    current: NaiveDateTime,
}

impl Playback {
    /// Starts playback at `start`. Windows wrap back to `start` once they
    /// reach `end`; an `end` at or before `start` plays a single hour.
    #[must_use]
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let end = if end > start {
            end
        } else {
            start + Duration::hours(1)
        };
        Self {
            start,
            end,
            current: start,
        }
    }

    /// Start of the current window.
    #[must_use]
    pub const fn current(&self) -> NaiveDateTime {
        self.current
    }

    /// The current hour-wide window.
    #[must_use]
    pub fn window(&self) -> DateWindow {
        DateWindow::hour_starting(self.current)
    }

    /// Advances one hour and returns the new window.
    pub fn tick(&mut self) -> DateWindow {
        self.current += Duration::hours(1);
        if self.current >= self.end {
            self.current = self.start;
        }
        self.window()
    }

    /// Rewinds to the first window.
    pub const fn reset(&mut self) {
        self.current = self.start;
    }
}
