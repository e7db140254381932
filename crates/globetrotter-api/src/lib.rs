// HTTP transport for the globetrotter quiz backend.

pub mod client;
pub mod wire;

pub use client::HttpQuizService;
