//! Command-line surface, derived with `clap`.

use std::path::PathBuf;

use clap::Parser;

/// Interactive terminal client for Viewdata/teletext services.
#[derive(Debug, Parser)]
#[command(name = "vidtex", author, version, about)]
pub struct Cli {
    /// Host to connect to. Overrides the profile's host when given alongside `--profile`.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to connect to. Overrides the profile's port when given alongside `--profile`.
    #[arg(long)]
    pub port: Option<String>,

    /// Named `vidtexrc` profile to connect with, skipping the interactive menu.
    #[arg(long)]
    pub profile: Option<String>,

    /// Show the profile picker and prompt for a numeric choice.
    #[arg(long)]
    pub menu: bool,

    /// Replay a previously `--dump`ed frame buffer instead of connecting.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Write each received frame buffer to FILE on exit (last frame only).
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,

    /// Render in monochrome, ignoring received colors.
    #[arg(long)]
    pub mono: bool,

    /// Render alpha characters in bold.
    #[arg(long)]
    pub bold: bool,

    /// Use the high-compatibility alternate font instead of the rounded default.
    #[arg(long)]
    pub galax: bool,

    /// Append a structured per-byte trace to FILE.
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
