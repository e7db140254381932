// Session orchestration for the globetrotter quiz client.

pub mod app;
pub mod config;
pub mod controller;
pub mod protocol;

pub use app::{spawn, SessionHandle, SessionOptions};
pub use controller::{GameSummary, Phase};
pub use protocol::{Advanced, Snapshot, UiUpdate, UserCommand};
