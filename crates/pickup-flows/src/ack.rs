//! Timed acknowledgements ("Copied!", "Settings saved").

use std::time::Duration;

use tokio::time::Instant;

/// How long a "copied" acknowledgement stays visible.
pub const COPY_ACK_WINDOW: Duration = Duration::from_secs(2);

/// How long the "saved" indicator stays visible.
pub const SAVE_ACK_WINDOW: Duration = Duration::from_secs(3);

/// A flag that turns itself off once its window has elapsed.
///
/// Triggering again restarts the window. Reads use the tokio clock, so
/// paused-time tests can step through the window deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    window: Duration,
    until: Option<Instant>,
}

impl Acknowledgement {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    pub fn trigger(&mut self) {
        self.until = Some(Instant::now() + self.window);
    }

    pub fn clear(&mut self) {
        self.until = None;
    }

    pub fn is_active(&self) -> bool {
        self.until.is_some_and(|until| Instant::now() < until)
    }

    /// Time left before the flag clears, if it is showing.
    pub fn remaining(&self) -> Option<Duration> {
        self.until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
