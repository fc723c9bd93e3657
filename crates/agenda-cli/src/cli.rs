//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use agenda_core::WindowStrategy;

/// agenda - your Google Calendar events at a glance
#[derive(Debug, Parser)]
#[command(name = "agenda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "AGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// OAuth client ID (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret (from Google Cloud Console)
    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Event window to display
    #[arg(long, value_enum)]
    pub window: Option<WindowArg>,

    /// Keep the session open for refresh and sign-out commands
    #[arg(long, short)]
    pub interactive: bool,
}

/// Selectable event windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    /// The current calendar month
    Month,
    /// The next thirty days
    Rolling30,
}

impl From<WindowArg> for WindowStrategy {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Month => WindowStrategy::CalendarMonth,
            WindowArg::Rolling30 => WindowStrategy::Rolling30Days,
        }
    }
}
