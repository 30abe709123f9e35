//! Entry point: wires the CLI surface, `vidtexrc` profile lookup, logging,
//! and the session loop together.

use std::io::Write;

use anyhow::{Context, Result};

use vidtex::charmap::Font;
use vidtex::cli::Cli;
use vidtex::config::{menu_choice, menu_lines, RcState};
use vidtex::error::SessionError;
use vidtex::logging;

#[cfg(unix)]
use vidtex::session::{replay_frame, SessionConfig, SessionLoop};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let _logging_guard = logging::init(cli.trace.as_deref())?;

    tracing::info!("Starting vidtex");

    let font = if cli.galax { Font::Compat } else { Font::Default };

    if let Some(path) = &cli.file {
        return run_replay(path, font, cli.mono, cli.bold);
    }

    let rc_state = RcState::load().context("loading vidtexrc")?;

    let (host, port, preamble, postamble) = resolve_target(&cli, &rc_state)?;

    #[cfg(unix)]
    {
        let config = SessionConfig {
            host,
            port,
            preamble,
            postamble,
            dump_path: cli.dump.clone(),
            mono: cli.mono,
            bold: cli.bold,
            font,
        };

        let mut session = SessionLoop::connect(config).map_err(anyhow::Error::from)?;
        let result = session.run();
        match result {
            Ok(()) => {
                println!("Session terminated\nGoodbye");
                Ok(())
            }
            Err(err) => Err(anyhow::Error::from(err)),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (host, port, preamble, postamble);
        anyhow::bail!("vidtex's session loop requires a unix target (libc::poll-based multiplexing)")
    }
}

fn run_replay(path: &std::path::Path, font: Font, mono: bool, bold: bool) -> Result<()> {
    #[cfg(unix)]
    {
        replay_frame(path, font, mono, bold).map_err(anyhow::Error::from)
    }
    #[cfg(not(unix))]
    {
        let _ = (path, font, mono, bold);
        anyhow::bail!("frame replay requires a unix target")
    }
}

/// Resolves the final host/port/preamble/postamble from, in priority order:
/// `--menu` (interactive pick), `--profile NAME`, then bare `--host`/`--port`.
fn resolve_target(
    cli: &Cli,
    rc_state: &RcState,
) -> Result<(String, String, Vec<u8>, Vec<u8>)> {
    if cli.menu {
        let lines = menu_lines(rc_state);
        if lines.is_empty() {
            anyhow::bail!("no configuration found in vidtexrc");
        }
        for line in &lines {
            println!("{line}");
        }
        print!("Choice: ");
        std::io::stdout().flush().ok();

        let mut input = String::new();
        std::io::stdin().read_line(&mut input).context("reading menu choice")?;
        let choice: usize = input.trim().parse().context("not a number")?;

        let entry = menu_choice(rc_state, choice)
            .ok_or_else(|| anyhow::Error::from(SessionError::UnknownProfile(choice.to_string())))?;
        return Ok((entry.host.clone(), entry.port.clone(), entry.preamble.clone(), entry.postamble.clone()));
    }

    if let Some(name) = &cli.profile {
        let entry = rc_state
            .find(name)
            .ok_or_else(|| SessionError::UnknownProfile(name.clone()))?;
        let host = cli.host.clone().unwrap_or_else(|| entry.host.clone());
        let port = cli.port.clone().unwrap_or_else(|| entry.port.clone());
        return Ok((host, port, entry.preamble.clone(), entry.postamble.clone()));
    }

    match (&cli.host, &cli.port) {
        (Some(host), Some(port)) => Ok((host.clone(), port.clone(), Vec::new(), Vec::new())),
        _ => Err(anyhow::Error::from(SessionError::NoTarget)),
    }
}
