pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod fetch;
pub mod installer;
pub mod logging;
mod message;
pub mod platform;
pub mod release;

// re-export for convenient use with `message`
pub use colored::Colorize;
