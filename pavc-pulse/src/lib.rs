//! # pavc-pulse
//!
//! PulseAudio backend for pavc.
//!
//! Provides:
//! - `PulseBackend` — `ServerBackend` over the threaded mainloop of
//!   `libpulse-binding`
//! - the `pavc` binary (CLI surface)
//!
//! ## Usage
//! ```ignore
//! use pavc_pulse::PulseBackend;
//! use pavc_core::Session;
//!
//! let backend = PulseBackend::new()?;
//! let mut session = Session::new(backend);
//! session.start()?;
//! session.connect(None)?;
//! ```

pub mod backend;

pub use backend::PulseBackend;
