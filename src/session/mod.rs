//! SessionLoop: the single-threaded event loop multiplexing the network
//! socket, the keyboard, and the one-second flash timer.
//!
//! A single `poll(2)` call waits on both file descriptors, with the timeout
//! computed from the next flash tick rather than a separate timer fd — the
//! tick fires with the same "once a second, serialized with byte processing"
//! guarantee a `timerfd`-based design would give, without the extra fd.
//! Keyboard chords (`Ctrl-R` reveal, `Ctrl-G` download, `Ctrl-F` save frame,
//! `Ctrl-B` bold) and the preamble/postamble/download-acknowledgement byte
//! handling follow the same shape as a direct-dial Viewdata client's main
//! loop.

use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::charmap::Font;
use crate::display::{clear_screen, CrosstermBackend, Display};
use crate::error::SessionError;
use crate::telesoftware::TeleState;
use crate::terminal::decoder::PresentationDecoder;

const IO_BUFFER_LEN: usize = 2048;
const FLASH_PERIOD: Duration = Duration::from_secs(1);
const DEFAULT_POSTAMBLE: [u8; 4] = [b'*', b'9', b'0', b'_'];
const PREAMBLE_LEAD_BYTE: u8 = 22;
const DOWNLOAD_ACK_BYTE: u8 = b'_';

const fn ctrl(c: u8) -> u8 {
    c & 0x1F
}

const KEY_REVEAL: u8 = ctrl(b'r');
const KEY_DOWNLOAD: u8 = ctrl(b'g');
const KEY_SAVE_FRAME: u8 = ctrl(b'f');
const KEY_BOLD: u8 = ctrl(b'b');

static TERMINATE_RECEIVED: AtomicBool = AtomicBool::new(false);
static SOCKET_CLOSED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_signal(signal: libc::c_int) {
    TERMINATE_RECEIVED.store(true, Ordering::SeqCst);
    if signal == libc::SIGPIPE {
        SOCKET_CLOSED.store(true, Ordering::SeqCst);
    }
}

/// Installs the termination signal handlers: `SIGINT`/`SIGTERM`/`SIGQUIT`/
/// `SIGHUP` set the termination flag, `SIGPIPE` additionally marks the
/// socket closed so a broken pipe on write doesn't re-raise and kill the
/// process.
pub fn install_signal_handlers() {
    unsafe {
        for &sig in &[
            libc::SIGINT,
            libc::SIGTERM,
            libc::SIGQUIT,
            libc::SIGHUP,
            libc::SIGPIPE,
        ] {
            libc::signal(sig, handle_signal as usize);
        }
    }
}

/// Connection and rendering options a session is started with — the subset
/// of `Cli`/`RcEntry` the loop actually needs, so it doesn't depend on the
/// CLI or config modules directly.
pub struct SessionConfig {
    pub host: String,
    pub port: String,
    pub preamble: Vec<u8>,
    pub postamble: Vec<u8>,
    pub dump_path: Option<PathBuf>,
    pub mono: bool,
    pub bold: bool,
    pub font: Font,
}

/// Ties together the two decoders, the display, and the live socket for one
/// connected session.
pub struct SessionLoop {
    stream: TcpStream,
    decoder: PresentationDecoder,
    tele: TeleState,
    display: Display<CrosstermBackend<std::io::Stdout>>,
    dump_file: Option<File>,
    download_file: Option<File>,
    download_name: Option<String>,
    can_download: bool,
    is_downloading: bool,
    postamble: Vec<u8>,
    save_dir: PathBuf,
}

impl SessionLoop {
    /// Connects to `config.host:config.port`, writes the preamble, and
    /// prepares the decoders and raw-mode terminal. Does not yet enter the
    /// event loop — call [`SessionLoop::run`] for that.
    pub fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        let mut stream =
            TcpStream::connect((config.host.as_str(), config.port.parse::<u16>().unwrap_or(0)))
                .map_err(|source| SessionError::Connect {
                    host: config.host.clone(),
                    port: config.port.clone(),
                    source,
                })?;
        stream.set_nodelay(true).ok();

        let mut preamble = Vec::with_capacity(1 + config.preamble.len());
        preamble.push(PREAMBLE_LEAD_BYTE);
        preamble.extend_from_slice(&config.preamble);
        write_all_traced(&mut stream, &preamble, "preamble").map_err(|source| SessionError::Connect {
            host: config.host.clone(),
            port: config.port.clone(),
            source,
        })?;

        let dump_file = match &config.dump_path {
            Some(path) => Some(File::create(path).map_err(|source| SessionError::DumpWrite {
                path: path.display().to_string(),
                source,
            })?),
            None => None,
        };

        let backend = CrosstermBackend::new(std::io::stdout());
        let mut display = Display::new(backend, config.mono);
        crossterm::terminal::enable_raw_mode().ok();
        let mut stdout = std::io::stdout();
        clear_screen(&mut stdout).ok();
        display.flush();

        let mut decoder = PresentationDecoder::new(config.font);
        decoder.set_bold_mode(config.bold);

        let postamble = if config.postamble.is_empty() {
            DEFAULT_POSTAMBLE.to_vec()
        } else {
            config.postamble
        };

        install_signal_handlers();

        Ok(SessionLoop {
            stream,
            decoder,
            tele: TeleState::new(),
            display,
            dump_file,
            download_file: None,
            download_name: None,
            can_download: false,
            is_downloading: false,
            postamble,
            save_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        })
    }

    /// Runs the multiplexed event loop until a termination signal fires or
    /// the peer closes the connection, then sends the postamble and tears
    /// down raw mode.
    pub fn run(&mut self) -> Result<(), SessionError> {
        let socket_fd = self.stream.as_raw_fd();
        let stdin_fd = std::io::stdin().as_raw_fd();

        let mut buffer = [0u8; IO_BUFFER_LEN];
        let mut next_flash = Instant::now() + FLASH_PERIOD;

        while !(TERMINATE_RECEIVED.load(Ordering::SeqCst) || SOCKET_CLOSED.load(Ordering::SeqCst)) {
            let timeout_ms = next_flash
                .saturating_duration_since(Instant::now())
                .as_millis()
                .min(i32::MAX as u128) as i32;

            let mut poll_fds = [
                libc::pollfd { fd: socket_fd, events: libc::POLLIN, revents: 0 },
                libc::pollfd { fd: stdin_fd, events: libc::POLLIN, revents: 0 },
            ];

            let prv = unsafe { libc::poll(poll_fds.as_mut_ptr(), poll_fds.len() as libc::nfds_t, timeout_ms) };

            if prv == -1 {
                let errno = std::io::Error::last_os_error();
                if errno.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(SessionError::Io(errno));
            }

            if Instant::now() >= next_flash {
                self.decoder.toggle_flash(&mut self.display);
                self.display.flush();
                next_flash += FLASH_PERIOD;
                if Instant::now() >= next_flash {
                    next_flash = Instant::now() + FLASH_PERIOD;
                }
            }

            if prv < 1 {
                continue;
            }

            if poll_fds[0].revents & libc::POLLIN != 0 {
                self.handle_socket_readable(&mut buffer)?;
            }

            if poll_fds[1].revents & libc::POLLIN != 0 {
                self.handle_keyboard_readable()?;
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_socket_readable(&mut self, buffer: &mut [u8]) -> Result<(), SessionError> {
        match self.stream.read(buffer) {
            Ok(0) => {
                SOCKET_CLOSED.store(true, Ordering::SeqCst);
                Ok(())
            }
            Ok(n) => {
                let chunk = &buffer[..n];

                if let Some(dump) = self.dump_file.as_mut() {
                    let _ = dump.write_all(chunk);
                }

                tracing::trace!(
                    target: "vidtex::trace",
                    bytes = n,
                    "inbound chunk: {} | {}",
                    ascii_dump(chunk),
                    hex_dump(chunk)
                );

                self.decoder.decode(chunk, &mut self.display);
                self.display.set_title(&self.decoder.header_text());
                self.display.flush();

                if !self.is_downloading {
                    self.can_download = self.tele.decode_header(chunk);
                    if self.can_download {
                        self.download_name = Some(self.tele.filename().to_string());
                    }
                } else {
                    let mut sink = self.download_file.take();
                    {
                        let out: Option<&mut dyn Write> = sink.as_mut().map(|f| f as &mut dyn Write);
                        self.tele.decode(chunk, out);
                    }
                    self.download_file = sink;

                    if self.tele.end_of_file || self.tele.end_of_frame {
                        if self.tele.end_of_file {
                            self.download_file = None;
                            self.is_downloading = false;
                            self.can_download = false;
                            self.tele.reset();
                        }
                        self.request_next_block()?;
                    }
                }

                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => Ok(()),
            Err(_) => {
                SOCKET_CLOSED.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn handle_keyboard_readable(&mut self) -> Result<(), SessionError> {
        let mut byte = [0u8; 1];
        match std::io::stdin().read(&mut byte) {
            Ok(0) | Err(_) => return Ok(()),
            Ok(_) => {}
        }

        let ch = transform_input(byte[0]);

        match ch {
            KEY_REVEAL => {
                self.decoder.toggle_reveal(&mut self.display);
                self.display.flush();
            }
            KEY_DOWNLOAD => {
                if self.can_download {
                    if let Some(name) = self.download_name.clone() {
                        let path = self.save_dir.join(sanitize_filename(&name));
                        match File::create(&path) {
                            Ok(file) => {
                                self.download_file = Some(file);
                                self.is_downloading = true;
                                self.request_next_block()?;
                            }
                            Err(source) => {
                                return Err(SessionError::DumpWrite {
                                    path: path.display().to_string(),
                                    source,
                                })
                            }
                        }
                    }
                }
            }
            KEY_SAVE_FRAME => self.save_frame()?,
            KEY_BOLD => self.decoder.toggle_bold_mode(),
            _ => {
                if self.stream.write_all(&[ch]).is_err() {
                    SOCKET_CLOSED.store(true, Ordering::SeqCst);
                }
            }
        }

        Ok(())
    }

    fn request_next_block(&mut self) -> Result<(), SessionError> {
        if self.stream.write_all(&[DOWNLOAD_ACK_BYTE]).is_err() {
            SOCKET_CLOSED.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    /// `Ctrl-F`: dumps the decoder's captured frame buffer to a timestamped
    /// `.frame` file in the current directory.
    fn save_frame(&mut self) -> Result<(), SessionError> {
        let name = format!("vidtex_{}.frame", timestamp_suffix());
        let path = self.save_dir.join(name);
        let mut file = File::create(&path).map_err(|source| SessionError::DumpWrite {
            path: path.display().to_string(),
            source,
        })?;
        self.decoder
            .save_frame(&mut file)
            .map_err(|source| SessionError::DumpWrite {
                path: path.display().to_string(),
                source,
            })
    }

    fn shutdown(&mut self) {
        if self.stream.write_all(&self.postamble).is_ok() {
            tracing::trace!(target: "vidtex::trace", "postamble: {}", hex_dump(&self.postamble));
            let _ = self.stream.shutdown(std::net::Shutdown::Both);
        }
        crossterm::terminal::disable_raw_mode().ok();
    }
}

impl Drop for SessionLoop {
    fn drop(&mut self) {
        crossterm::terminal::disable_raw_mode().ok();
    }
}

/// `#` and newline both become `_` on the wire, so a viewdata keyboard
/// missing those legends can still send the byte the server expects.
fn transform_input(ch: u8) -> u8 {
    match ch {
        b'#' | b'\n' => b'_',
        other => other,
    }
}

fn write_all_traced(stream: &mut TcpStream, bytes: &[u8], label: &str) -> std::io::Result<()> {
    stream.write_all(bytes)?;
    tracing::trace!(target: "vidtex::trace", "{label}: {}", hex_dump(bytes));
    Ok(())
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

/// Renders `bytes` with non-printable bytes shown as `.`, for a trace line
/// a human can skim alongside the hex dump.
fn ascii_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { '.' })
        .collect()
}

/// Strips path separators from a telesoftware-supplied filename before it's
/// joined onto `save_dir`, so a hostile or malformed header can't escape the
/// current directory.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\') && !c.is_control())
        .collect()
}

fn timestamp_suffix() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs.to_string()
}

/// Replays a previously `--dump`ed (or `Ctrl-F`-saved) frame buffer through a
/// fresh decoder instead of connecting to a socket, then idles on the
/// keyboard/flash-timer pair so reveal toggling still works on the replayed
/// page.
pub fn replay_frame(path: &Path, font: Font, mono: bool, bold: bool) -> Result<(), SessionError> {
    let bytes = std::fs::read(path).map_err(|source| SessionError::LoadFrame {
        path: path.display().to_string(),
        source,
    })?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut display = Display::new(backend, mono);
    crossterm::terminal::enable_raw_mode().ok();
    let mut stdout = std::io::stdout();
    clear_screen(&mut stdout).ok();

    let mut decoder = PresentationDecoder::new(font);
    decoder.set_bold_mode(bold);
    decoder.decode(&bytes, &mut display);
    display.set_title(&decoder.header_text());
    display.flush();

    install_signal_handlers();

    let stdin_fd = std::io::stdin().as_raw_fd();
    let mut next_flash = Instant::now() + FLASH_PERIOD;

    while !TERMINATE_RECEIVED.load(Ordering::SeqCst) {
        let timeout_ms = next_flash
            .saturating_duration_since(Instant::now())
            .as_millis()
            .min(i32::MAX as u128) as i32;

        let mut poll_fds = [libc::pollfd { fd: stdin_fd, events: libc::POLLIN, revents: 0 }];
        let prv = unsafe { libc::poll(poll_fds.as_mut_ptr(), 1, timeout_ms) };

        if prv == -1 {
            let errno = std::io::Error::last_os_error();
            if errno.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            break;
        }

        if Instant::now() >= next_flash {
            decoder.toggle_flash(&mut display);
            display.flush();
            next_flash += FLASH_PERIOD;
            if Instant::now() >= next_flash {
                next_flash = Instant::now() + FLASH_PERIOD;
            }
        }

        if prv < 1 {
            continue;
        }

        if poll_fds[0].revents & libc::POLLIN != 0 {
            let mut byte = [0u8; 1];
            if std::io::stdin().read(&mut byte).unwrap_or(0) > 0
                && transform_input(byte[0]) == KEY_REVEAL
            {
                decoder.toggle_reveal(&mut display);
                display.flush();
            }
        }
    }

    crossterm::terminal::disable_raw_mode().ok();
    Ok(())
}
