//! CLI, session controller, terminal view
//!
//! This crate provides the `agenda` command-line interface.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod view;

pub use cli::Cli;
pub use controller::{SessionController, SessionPhase, ViewModel};
pub use error::{ClientError, ClientResult};
