//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the clap command definitions and the `App` that runs them, the
//! interactive prompts used by the menu loop, and table rendering for map views
//! and dashboard payloads.

mod commands;
pub mod prompts;
pub mod render;

pub use commands::*;
