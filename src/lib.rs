//! Drivers for Atlona devices that expose a small JSON API over HTTP.
//!
//! Every call is one independent GET against the device's embedded web
//! server; nothing is cached between calls.

pub mod amp;
pub mod config;
pub mod http;
pub mod switcher;
pub mod utils;

pub use amp::{Amp60, AmpAudio, AmpStatus};
pub use switcher::{SwitcherInput, SwitcherState, VideoSwitcher2x1};
