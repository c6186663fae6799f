//! # pavc-core
//!
//! Platform-agnostic core of `pavc`, a command-line sink (output device)
//! volume controller for a callback-driven audio server.
//!
//! The server's client library is asynchronous: requests return pending
//! operations and results arrive via callbacks on a dedicated event-loop
//! thread. This crate turns that into a sequence of blocking, ordered,
//! fail-fast calls usable from straight-line command code. Backends
//! implement the [`ServerBackend`] trait and plug into the generic
//! [`Session`].
//!
//! ## Architecture
//!
//! ```text
//! pavc-core (this crate)
//! ├── models/     ← ControlError, ContextState/OperationState/SessionPhase, SinkDevice
//! ├── registry    ← doubling-growth ordered sink registry
//! ├── volume      ← channel volume math (scale, clamp, average, decibel)
//! ├── command     ← Command/Action/Unit + percentage parsing
//! ├── traits/     ← ServerBackend, PendingOp (the audio-server boundary)
//! ├── session     ← synchronization bridge + lifecycle state machine
//! └── dispatch    ← per-sink command application
//! ```

pub mod command;
pub mod dispatch;
pub mod models;
pub mod registry;
pub mod session;
pub mod traits;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use command::{Action, Command, Unit};
pub use models::error::ControlError;
pub use models::sink::SinkDevice;
pub use models::state::{ContextState, OperationState, SessionPhase};
pub use registry::Registry;
pub use session::Session;
pub use traits::backend::{PendingOp, ServerBackend};
pub use volume::ChannelVolumes;
