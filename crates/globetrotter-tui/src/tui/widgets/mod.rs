// TUI widget modules for each screen panel.

pub mod clues;
pub mod feedback;
pub mod options;
pub mod status_bar;
