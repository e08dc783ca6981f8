//! Game sessions for Brainfreeze.
//!
//! A session is the fixed group of players promoted together out of a
//! lobby when its countdown hit zero. Each session runs as an isolated
//! Tokio task (actor model) that collects one result per participant,
//! relays scores to peers as they arrive, and resolves the round exactly
//! once.
//!
//! # Key types
//!
//! - [`Round`]: the pure state machine (who submitted what, is it over?)
//! - [`SessionManager`]: starts sessions and routes submissions to them
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`SessionReport`]: the final standings, emitted once per session
//! - [`SessionConfig`]: result timeout and queue size

mod config;
mod error;
mod manager;
mod outcome;
mod round;
mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use manager::{SessionManager, StartedSession};
pub use outcome::{Contender, Rule, SessionReport, Standing, Verdict, first_finisher, highest_score};
pub use round::{Dispatch, Participant, Round};
pub use session::{SessionHandle, SessionInfo};
