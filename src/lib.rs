#![forbid(unsafe_code)]

pub mod capture;
pub mod channel;
pub mod chat;
pub mod cli;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod simulator;
pub mod text_summary;
#[cfg(feature = "tui")]
pub mod tui;

pub use channel::{EventChannel, Subscription};
pub use error::{ConsoleError, ConsoleResult};
pub use model::{AnalysisResult, RunId, RunStatus, SimConfig, StatusEvent};
pub use session::ConsoleSession;
pub use simulator::{RunHandle, RunSimulator};
