//! # Pancakes
//!
//! Terminal host for the study tracker.
//!
//! ## Threading
//!
//! ```text
//! stdin thread ──lines──> crossbeam channel ──> main thread
//!                                                 ├─ Shell::handle_line (parse + tracker ops)
//!                                                 ├─ FrameDriver::frame (tick)
//!                                                 └─ print event feed
//! ```
//!
//! The main thread is the only one that touches the tracker.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod commands;
pub mod config;
pub mod driver;
pub mod shell;
pub mod view;

/// Re-export of the core.
pub use pancakes_economy as economy;

pub use commands::{Command, ParseError, HELP};
pub use config::{BulkConfig, TrackerConfig, DEFAULT_CONFIG_PATH};
pub use driver::{FrameDriver, FrameStats};
pub use shell::{PauseOnExit, Reply, Shell};
pub use view::Dashboard;
