// Library root: exposes the TUI so its view logic can be tested in isolation.

pub mod tui;
