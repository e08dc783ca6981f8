//! The lobby start countdown for Brainfreeze.
//!
//! A [`Countdown`] is a tiny timing state machine: idle until started,
//! then one step per second until it reaches zero. It owns no members and
//! sends nothing; the lobby actor decides what each step means.
//!
//! # Timeline
//!
//! With a length of 3 seconds:
//!
//! ```text
//! t=0s  start()        -> 3   (caller broadcasts countdown{3})
//! t=1s  wait_for_step  -> Tick { remaining: 2 }
//! t=2s  wait_for_step  -> Tick { remaining: 1 }
//! t=3s  wait_for_step  -> Elapsed             (caller promotes the lobby)
//! ```
//!
//! # Integration
//!
//! The countdown is designed to sit inside an actor's `tokio::select!`
//! loop. While idle, [`Countdown::wait_for_step`] pends forever, so the
//! loop only wakes for commands:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join / leave */ }
//!         step = countdown.wait_for_step() => match step {
//!             CountdownStep::Tick { remaining } => { /* broadcast */ }
//!             CountdownStep::Elapsed => { /* promote */ }
//!         }
//!     }
//! }
//! ```
//!
//! `wait_for_step` only mutates state after its sleep completes, so
//! dropping it mid-sleep (the other `select!` branch won) is safe.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Length of one countdown step.
pub const STEP: Duration = Duration::from_secs(1);

/// What happened when a running countdown advanced one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// A second passed; `remaining` seconds are left (always ≥ 1).
    Tick {
        /// Seconds left before the countdown elapses.
        remaining: u32,
    },
    /// The countdown reached zero and is idle again.
    Elapsed,
}

/// One-second countdown timer. One per lobby.
#[derive(Debug)]
pub struct Countdown {
    length: u32,
    /// `Some` while running: seconds left and when the next step fires.
    running: Option<Running>,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    remaining: u32,
    next_step: Instant,
}

impl Countdown {
    /// Creates an idle countdown of `length_secs` seconds.
    ///
    /// A length of 0 is raised to 1 so a started countdown always
    /// announces itself before elapsing.
    pub fn new(length_secs: u32) -> Self {
        Self {
            length: length_secs.max(1),
            running: None,
        }
    }

    /// Starts the countdown and returns the initial number of seconds.
    ///
    /// Restarting a running countdown resets it to the full length.
    pub fn start(&mut self) -> u32 {
        self.running = Some(Running {
            remaining: self.length,
            next_step: Instant::now() + STEP,
        });
        debug!(seconds = self.length, "countdown started");
        self.length
    }

    /// Stops a running countdown. Returns `true` if it was running.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.running.take().is_some();
        if was_running {
            debug!("countdown cancelled");
        }
        was_running
    }

    /// Whether the countdown is currently running.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Seconds left, or `None` when idle.
    pub fn remaining(&self) -> Option<u32> {
        self.running.map(|r| r.remaining)
    }

    /// The configured length in seconds.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Waits for the next step of a running countdown.
    ///
    /// Pends forever while idle; `tokio::select!` keeps serving its other
    /// branches.
    pub async fn wait_for_step(&mut self) -> CountdownStep {
        let Some(running) = self.running else {
            return std::future::pending().await;
        };

        time::sleep_until(running.next_step).await;

        let remaining = running.remaining.saturating_sub(1);
        if remaining == 0 {
            self.running = None;
            trace!("countdown elapsed");
            return CountdownStep::Elapsed;
        }

        // Keep the original cadence so a late wake-up doesn't stretch
        // the whole countdown.
        self.running = Some(Running {
            remaining,
            next_step: running.next_step + STEP,
        });
        trace!(remaining, "countdown tick");
        CountdownStep::Tick { remaining }
    }
}

impl Default for Countdown {
    /// A ten-second countdown.
    fn default() -> Self {
        Self::new(10)
    }
}
