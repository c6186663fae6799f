use crate::models::error::ControlError;
use crate::models::sink::SinkDevice;
use crate::models::state::{ContextState, OperationState};
use crate::volume::ChannelVolumes;

/// One outstanding asynchronous request.
///
/// Exists between issuance and release (drop); at most one is live per
/// session at a time. The state is polled from the main thread while it
/// holds the loop lock.
pub trait PendingOp {
    fn state(&self) -> OperationState;
}

/// The audio-server client boundary.
///
/// Implementations wrap a callback-driven client library running its own
/// event loop on a dedicated worker thread. The worker thread holds the
/// loop's monitor while delivering callbacks; the main thread holds it
/// whenever it is not parked inside [`wait`](ServerBackend::wait). That
/// monitor is what makes the blocking bridge in [`Session`] sound.
///
/// Request methods return `None` when the client library refused to start
/// the request — the session surfaces that as a fatal operation error.
///
/// [`Session`]: crate::session::Session
pub trait ServerBackend {
    type Op: PendingOp;

    // --- event loop ---

    /// Start the worker thread that pumps the server's asynchronous I/O.
    fn start_loop(&mut self) -> Result<(), ControlError>;

    /// Stop and join the worker thread. Must be called without the lock held.
    fn stop_loop(&mut self);

    /// Acquire the loop monitor.
    fn lock(&mut self);

    /// Release the loop monitor.
    fn unlock(&mut self);

    /// Park until a callback signals. The caller must hold the monitor; it
    /// is released while parked and reacquired before returning. Wakeups
    /// may be spurious — callers re-check their predicate in a loop.
    fn wait(&mut self);

    // --- connection ---

    /// Issue an asynchronous connection request to `server` (`None` for the
    /// default server). Returns immediately; completion is observed by
    /// polling [`context_state`](ServerBackend::context_state).
    fn connect(&mut self, server: Option<&str>) -> Result<(), ControlError>;

    fn context_state(&self) -> ContextState;

    fn disconnect(&mut self);

    /// Text of the server's last reported error code, if any. Checked after
    /// every completed operation.
    fn last_error(&self) -> Option<String>;

    // --- requests ---

    /// Request descriptors for every sink. Discovered sinks accumulate
    /// until [`drain_sinks`](ServerBackend::drain_sinks).
    fn request_sink_list(&mut self) -> Option<Self::Op>;

    /// Request the descriptor of the sink named `name`.
    fn request_sink_by_name(&mut self, name: &str) -> Option<Self::Op>;

    /// Request new channel volumes for the sink at `index`.
    fn request_set_volume(&mut self, index: u32, volumes: &ChannelVolumes) -> Option<Self::Op>;

    /// Request a new mute flag for the sink at `index`.
    fn request_set_mute(&mut self, index: u32, mute: bool) -> Option<Self::Op>;

    /// Take ownership of the sinks the discovery callbacks collected since
    /// the previous drain.
    fn drain_sinks(&mut self) -> Vec<SinkDevice>;
}
