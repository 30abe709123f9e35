//! vidtex: an interactive terminal client for 1970s/80s teletext/Viewdata
//! services. Laid out module-per-subsystem — presentation decoding, telesoftware
//! downloads, the display backend, configuration, and the session loop each
//! get their own module, with unit tests alongside the code they cover.

pub mod charmap;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
#[cfg(unix)]
pub mod session;
pub mod telesoftware;
pub mod terminal;

pub use terminal::decoder::PresentationDecoder;
pub use terminal::grid::Grid;
