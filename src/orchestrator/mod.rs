//! Application-level orchestration.
//!
//! This module owns the capture/submit/cancel lifecycle and post-run
//! processing such as report building and exports. UI/CLI layers drive it
//! with commands and consume the console events it emits.

mod controller;
mod post_process;

pub use controller::{run_controller, UiCommand};
pub use post_process::{process_run_completion, ProcessedRun};
