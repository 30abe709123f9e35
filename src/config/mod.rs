//! `vidtexrc` profile file parsing. A profile names a host/port pair plus
//! optional preamble/postamble byte sequences sent on connect/disconnect;
//! files are searched for across sysconfdir, `$HOME`, and the current
//! directory and merged together.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const RCFILE: &str = "vidtexrc";
const MAX_AMBLE_LEN: usize = 10;

/// One named connection profile loaded from a `vidtexrc` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcEntry {
    pub name: String,
    pub host: String,
    pub port: String,
    pub preamble: Vec<u8>,
    pub postamble: Vec<u8>,
}

/// All profiles loaded across the search path, in file order with later
/// directories' entries appended after earlier ones (no de-duplication by
/// name — later entries with the same name simply shadow earlier ones at
/// lookup time).
#[derive(Debug, Clone, Default)]
pub struct RcState {
    pub entries: Vec<RcEntry>,
}

impl RcState {
    /// Loads `vidtexrc` from sysconfdir (if `VIDTEX_SYSCONFDIR` is set),
    /// `$HOME`, then the current directory — skipping the cwd pass if it's
    /// the same directory as `$HOME`.
    pub fn load() -> Result<Self> {
        let mut state = RcState::default();

        if let Ok(sysconfdir) = env::var("VIDTEX_SYSCONFDIR") {
            state.load_dir(Path::new(&sysconfdir))?;
        }

        let home = dirs::home_dir();
        if let Some(ref home) = home {
            state.load_dir(home)?;
        }

        if let Ok(cwd) = env::current_dir() {
            if home.as_deref() != Some(cwd.as_path()) {
                state.load_dir(&cwd)?;
            }
        }

        Ok(state)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<()> {
        let path = dir.join(RCFILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err).context(format!("reading {}", path.display())),
        };

        for (idx, line) in text.lines().enumerate() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let entry = parse_line(line)
                .with_context(|| format!("{} line {}", path.display(), idx + 1))?;
            self.entries.push(entry);
        }

        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&RcEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Splits a line the way `strtok(sin, "\t\n,|")` does: fields separated by
/// any of tab, newline, comma, or pipe, with runs of delimiters collapsed
/// and leading/trailing empty fields dropped.
fn tokenize(line: &str) -> Vec<&str> {
    line.split(['\t', '\n', ',', '|'])
        .filter(|tok| !tok.is_empty())
        .collect()
}

fn parse_line(line: &str) -> Result<RcEntry> {
    let tokens = tokenize(line);

    let name = tokens
        .first()
        .map(|t| trim_trailing_space(t))
        .filter(|t| !t.is_empty())
        .context("no name specified")?;
    let host = tokens
        .get(1)
        .map(|t| trim_trailing_space(t))
        .filter(|t| !t.is_empty())
        .context("no host specified")?;
    let port = tokens
        .get(2)
        .map(|t| trim_trailing_space(t))
        .filter(|t| !t.is_empty())
        .context("no port specified")?;

    let preamble = tokens.get(3).map(scan_array).unwrap_or_default();
    let postamble = tokens.get(4).map(scan_array).unwrap_or_default();

    Ok(RcEntry {
        name,
        host,
        port,
        preamble,
        postamble,
    })
}

fn trim_trailing_space(token: &str) -> String {
    token.trim_end().to_string()
}

/// Parses at most [`MAX_AMBLE_LEN`] whitespace-separated `u8` values,
/// stopping at the first token that doesn't parse (matching `sscanf`'s
/// partial-match semantics).
fn scan_array(token: &&str) -> Vec<u8> {
    token
        .split_whitespace()
        .take(MAX_AMBLE_LEN)
        .map_while(|t| t.parse::<u8>().ok())
        .collect()
}

/// A menu entry as printed by the `--menu` picker: index plus name.
pub fn menu_lines(state: &RcState) -> Vec<String> {
    state
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{:3} {:<20}", i, e.name))
        .collect()
}

pub fn menu_choice(state: &RcState, choice: usize) -> Option<&RcEntry> {
    state.entries.get(choice)
}
