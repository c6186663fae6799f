/// Connection state of the client context, as reported by the audio server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Unconnected,
    Connecting,
    Authorizing,
    SettingName,
    Ready,
    Failed,
    Terminated,
}

impl ContextState {
    /// True once a connection can never reach `Ready` again.
    ///
    /// A wait primitive that observes a terminal failure raises a fatal
    /// connection error instead of parking again.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

/// Completion state of one outstanding asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Running,
    Done,
    Cancelled,
}

/// Session lifecycle tag.
///
/// State transitions:
/// ```text
/// created → loop-running → connected → torn-down
///     └──────────┴──────────────┴─────────↑ (any fatal error)
/// ```
///
/// `TornDown` is reached exactly once; teardown of each resource is skipped
/// for phases that never created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    LoopRunning,
    Connected,
    TornDown,
}

impl SessionPhase {
    pub fn is_torn_down(&self) -> bool {
        matches!(self, Self::TornDown)
    }
}
