//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "tickdown")]
#[command(about = "A state-managed HTTP countdown timer with audible warning cues")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20560")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Default countdown duration in minutes (used on reset and when starting
    /// without keypad input)
    #[arg(short, long, default_value = "10")]
    pub duration: u64,

    /// Countdown-beep track played over the final ten seconds
    #[arg(long, default_value = "countdown.mp3")]
    pub countdown_cue: PathBuf,

    /// End-of-countdown alert track
    #[arg(long, default_value = "end-buzzer.mp3")]
    pub end_cue: PathBuf,

    /// Disable audio output entirely
    #[arg(long)]
    pub muted: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the configured default duration in seconds
    pub fn duration_seconds(&self) -> u64 {
        self.duration * 60
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
