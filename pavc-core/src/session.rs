//! The synchronization bridge and session lifecycle.
//!
//! [`Session`] turns the backend's callback-driven protocol into a sequence
//! of blocking, ordered, fail-fast calls. Two threads are involved: the
//! calling (main) thread, which blocks inside the wait primitives here, and
//! the backend's worker thread, which delivers callbacks while holding the
//! loop monitor. The main thread holds the monitor from [`Session::start`]
//! until teardown, yielding it only while parked inside a wait.

use crate::command::{Action, Unit};
use crate::models::error::ControlError;
use crate::models::sink::SinkDevice;
use crate::models::state::{ContextState, OperationState, SessionPhase};
use crate::registry::Registry;
use crate::traits::backend::{PendingOp, ServerBackend};
use crate::volume::{self, ChannelVolumes};

/// One audio-server session: backend, at most one pending operation, and
/// the registry of sinks resolved for the current command.
pub struct Session<B: ServerBackend> {
    backend: B,
    pending: Option<B::Op>,
    registry: Registry<SinkDevice>,
    phase: SessionPhase,
}

impl<B: ServerBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: None,
            registry: Registry::new(usize::MAX),
            phase: SessionPhase::Created,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Start the worker thread and take the loop monitor.
    /// Transitions: created → loop-running.
    pub fn start(&mut self) -> Result<(), ControlError> {
        debug_assert_eq!(self.phase, SessionPhase::Created);
        self.backend.start_loop()?;
        self.backend.lock();
        self.phase = SessionPhase::LoopRunning;
        log::debug!("event loop started");
        Ok(())
    }

    /// Issue the connection request and block until the context is ready.
    /// Transitions: loop-running → connected.
    pub fn connect(&mut self, server: Option<&str>) -> Result<(), ControlError> {
        debug_assert_eq!(self.phase, SessionPhase::LoopRunning);
        self.backend.connect(server)?;
        self.wait_for_context(ContextState::Ready)?;
        self.phase = SessionPhase::Connected;
        log::debug!("connected to audio server");
        Ok(())
    }

    /// Block until the context reaches `target`, re-checking after every
    /// wake (callbacks fire for intermediate states too). A terminal
    /// failure state observed mid-wait is fatal.
    fn wait_for_context(&mut self, target: ContextState) -> Result<(), ControlError> {
        loop {
            let state = self.backend.context_state();
            if state == target {
                return Ok(());
            }
            if state.is_terminal_failure() {
                let what = match state {
                    ContextState::Terminated => "terminated",
                    _ => "failed",
                };
                return Err(ControlError::Connection(what.into()));
            }
            self.backend.wait();
        }
    }

    /// Block until the pending operation completes. Cancellation observed
    /// mid-wait is fatal; the loop tolerates spurious wakeups by polling
    /// the state again after every wake.
    fn wait_for_operation(&mut self) -> Result<(), ControlError> {
        loop {
            let state = match &self.pending {
                Some(op) => op.state(),
                None => return Err(ControlError::Operation("no pending operation".into())),
            };
            match state {
                OperationState::Done => return Ok(()),
                OperationState::Cancelled => {
                    return Err(ControlError::Operation("operation cancelled".into()))
                }
                OperationState::Running => self.backend.wait(),
            }
        }
    }

    /// One-operation-at-a-time request protocol: adopt the operation (a
    /// `None` means the request never started), wait for completion, check
    /// the server's error code, release.
    fn run_request(&mut self, op: Option<B::Op>, what: &str) -> Result<(), ControlError> {
        debug_assert!(
            self.pending.is_none(),
            "request issued while another is pending"
        );
        let Some(op) = op else {
            return Err(ControlError::Operation(format!("failed to {what}")));
        };
        self.pending = Some(op);
        let waited = self.wait_for_operation();
        self.pending = None;
        waited?;
        if let Some(err) = self.backend.last_error() {
            return Err(ControlError::Operation(err));
        }
        Ok(())
    }

    /// Resolve the sink set for one command: the named sink, or every sink
    /// the server reports. Replaces whatever the registry held before.
    pub fn resolve_sinks(&mut self, name: Option<&str>) -> Result<usize, ControlError> {
        self.registry.clear();
        self.backend.drain_sinks(); // discard leftovers from any earlier resolution

        match name {
            Some(name) => {
                let op = self.backend.request_sink_by_name(name);
                self.run_request(op, "retrieve sink information")?;
            }
            None => {
                let op = self.backend.request_sink_list();
                self.run_request(op, "retrieve sink list")?;
            }
        }

        let discovered = self.backend.drain_sinks();
        if name.is_some() && discovered.is_empty() {
            return Err(ControlError::Operation(
                "failed to retrieve sink information".into(),
            ));
        }
        for sink in discovered {
            self.registry.push(sink)?;
        }
        log::debug!("resolved {} sink(s)", self.registry.len());
        Ok(self.registry.len())
    }

    pub fn sink_count(&self) -> usize {
        self.registry.len()
    }

    pub fn sink(&self, i: usize) -> Option<&SinkDevice> {
        self.registry.get(i)
    }

    /// Drop the resolved sink set. Descriptors are stale once the command
    /// that resolved them has consumed its result.
    pub fn clear_sinks(&mut self) {
        self.registry.clear();
    }

    pub fn set_sink_volume(
        &mut self,
        index: u32,
        volumes: &ChannelVolumes,
    ) -> Result<(), ControlError> {
        let op = self.backend.request_set_volume(index, volumes);
        self.run_request(op, "set sink volume")
    }

    pub fn set_sink_mute(&mut self, index: u32, mute: bool) -> Result<(), ControlError> {
        let op = self.backend.request_set_mute(index, mute);
        self.run_request(op, "toggle mute")
    }

    /// Apply one action to one sink: issue the request and wait for it to
    /// complete before returning, so requests are never pipelined.
    pub fn apply(&mut self, sink: &SinkDevice, action: &Action) -> Result<Option<String>, ControlError> {
        match action {
            Action::Toggle => {
                self.set_sink_mute(sink.index, !sink.muted)?;
                Ok(None)
            }
            Action::Up(percent) => {
                let mut volumes = sink.volumes.clone();
                if !volumes.increase_clamped(volume::scale_percent(*percent), volume::VOLUME_NORM)
                {
                    return Err(ControlError::Operation(
                        "failed incrementing volume".into(),
                    ));
                }
                self.set_sink_volume(sink.index, &volumes)?;
                Ok(None)
            }
            Action::Down(percent) => {
                let mut volumes = sink.volumes.clone();
                if !volumes.decrease(volume::scale_percent(*percent)) {
                    return Err(ControlError::Operation(
                        "failed decrementing volume".into(),
                    ));
                }
                self.set_sink_volume(sink.index, &volumes)?;
                Ok(None)
            }
            Action::Report(unit) => {
                let average = sink.volumes.average();
                let text = match unit {
                    Unit::Percent => volume::percent_from_norm(average).to_string(),
                    Unit::Decibel => volume::format_db(volume::volume_to_db(average)),
                };
                Ok(Some(text))
            }
        }
    }

    /// Tear the session down. Idempotent: resources a given phase never
    /// created are skipped, and a second call is a no-op. Reached exactly
    /// once, either after normal completion or on the fatal-error path
    /// (via `Drop`).
    pub fn close(&mut self) {
        match self.phase {
            SessionPhase::TornDown => return,
            SessionPhase::Created => {}
            SessionPhase::LoopRunning | SessionPhase::Connected => {
                self.pending = None;
                if self.phase == SessionPhase::Connected {
                    self.backend.disconnect();
                }
                self.backend.unlock();
                self.backend.stop_loop();
            }
        }
        self.registry.clear();
        self.phase = SessionPhase::TornDown;
        log::debug!("session torn down");
    }
}

impl<B: ServerBackend> Drop for Session<B> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sink, Issued, MockBackend};
    use crate::volume::VOLUME_NORM;

    fn connected_session(backend: MockBackend) -> Session<MockBackend> {
        let mut session = Session::new(backend);
        session.start().unwrap();
        session.connect(None).unwrap();
        session
    }

    #[test]
    fn lifecycle_reaches_connected_and_tears_down() {
        let backend = MockBackend::new();
        let probe = backend.probe();

        let mut session = connected_session(backend);
        assert_eq!(session.phase(), SessionPhase::Connected);

        session.close();
        assert_eq!(session.phase(), SessionPhase::TornDown);

        let state = probe.borrow();
        assert_eq!(state.loop_starts, 1);
        assert_eq!(state.loop_stops, 1);
        assert_eq!(state.disconnects, 1);
        assert_eq!(state.lock_depth, 0);
    }

    #[test]
    fn close_is_idempotent_and_drop_safe() {
        let backend = MockBackend::new();
        let probe = backend.probe();

        let mut session = connected_session(backend);
        session.close();
        session.close();
        drop(session);

        let state = probe.borrow();
        assert_eq!(state.loop_stops, 1);
        assert_eq!(state.disconnects, 1);
    }

    #[test]
    fn connection_failure_is_fatal_and_unwinds() {
        let backend = MockBackend::new();
        backend.probe().borrow_mut().fail_connection = true;
        let probe = backend.probe();

        let mut session = Session::new(backend);
        session.start().unwrap();
        let err = session.connect(None).unwrap_err();
        assert_eq!(err, ControlError::Connection("failed".into()));

        drop(session); // error path still tears down via Drop
        let state = probe.borrow();
        assert_eq!(state.loop_stops, 1);
        assert_eq!(state.lock_depth, 0);
    }

    #[test]
    fn failed_loop_start_leaves_nothing_to_tear_down() {
        let backend = MockBackend::new();
        backend.probe().borrow_mut().fail_start_loop = true;
        let probe = backend.probe();

        let mut session = Session::new(backend);
        assert_eq!(
            session.start().unwrap_err(),
            ControlError::Resource("event loop")
        );
        drop(session);

        let state = probe.borrow();
        assert_eq!(state.loop_stops, 0);
        assert_eq!(state.disconnects, 0);
    }

    #[test]
    fn resolve_populates_registry_in_enumeration_order() {
        let backend = MockBackend::with_sinks(vec![
            sink(0, "alpha", VOLUME_NORM, false),
            sink(3, "beta", VOLUME_NORM / 2, true),
        ]);
        let mut session = connected_session(backend);

        assert_eq!(session.resolve_sinks(None).unwrap(), 2);
        assert_eq!(session.sink(0).unwrap().name, "alpha");
        assert_eq!(session.sink(1).unwrap().name, "beta");
        assert_eq!(session.sink(2), None);
    }

    #[test]
    fn resolve_by_name_fetches_exactly_one() {
        let backend = MockBackend::with_sinks(vec![
            sink(0, "alpha", VOLUME_NORM, false),
            sink(3, "beta", VOLUME_NORM / 2, true),
        ]);
        let probe = backend.probe();
        let mut session = connected_session(backend);

        assert_eq!(session.resolve_sinks(Some("beta")).unwrap(), 1);
        assert_eq!(session.sink(0).unwrap().index, 3);
        assert_eq!(
            probe.borrow().issued,
            vec![Issued::SinkByName("beta".into())]
        );
    }

    #[test]
    fn resolve_by_missing_name_is_fatal_with_no_mutations() {
        let backend = MockBackend::with_sinks(vec![sink(0, "alpha", VOLUME_NORM, false)]);
        let probe = backend.probe();
        let mut session = connected_session(backend);

        let err = session.resolve_sinks(Some("speaker-2")).unwrap_err();
        assert_eq!(
            err,
            ControlError::Operation("failed to retrieve sink information".into())
        );
        // only the lookup was issued, nothing mutating
        assert_eq!(
            probe.borrow().issued,
            vec![Issued::SinkByName("speaker-2".into())]
        );
    }

    #[test]
    fn refused_request_reports_failure_to_start() {
        let backend = MockBackend::new();
        backend.probe().borrow_mut().refuse_requests = true;
        let mut session = connected_session(backend);

        assert_eq!(
            session.resolve_sinks(None).unwrap_err(),
            ControlError::Operation("failed to retrieve sink list".into())
        );
    }

    #[test]
    fn cancelled_operation_is_fatal() {
        let backend = MockBackend::new();
        backend.probe().borrow_mut().cancel_next_op = true;
        let mut session = connected_session(backend);

        assert_eq!(
            session.resolve_sinks(None).unwrap_err(),
            ControlError::Operation("operation cancelled".into())
        );
    }

    #[test]
    fn server_error_code_surfaces_after_completion() {
        let backend = MockBackend::new();
        backend.probe().borrow_mut().error_after_op = Some("access denied".into());
        let mut session = connected_session(backend);

        assert_eq!(
            session.resolve_sinks(None).unwrap_err(),
            ControlError::Operation("access denied".into())
        );
    }

    #[test]
    fn waits_tolerate_spurious_wakeups() {
        let backend = MockBackend::with_sinks(vec![sink(0, "alpha", VOLUME_NORM, false)]);
        backend.probe().borrow_mut().spurious_wakes = 3;
        let mut session = connected_session(backend);

        assert_eq!(session.resolve_sinks(None).unwrap(), 1);
    }

    #[test]
    fn mutating_requests_wait_before_the_next_is_issued() {
        let backend = MockBackend::with_sinks(vec![sink(0, "alpha", VOLUME_NORM / 2, false)]);
        let probe = backend.probe();
        let mut session = connected_session(backend);

        // The mock panics if a request is issued while one is running.
        session.set_sink_mute(0, true).unwrap();
        session.set_sink_mute(0, false).unwrap();
        assert_eq!(
            probe.borrow().issued,
            vec![
                Issued::SetMute { index: 0, mute: true },
                Issued::SetMute { index: 0, mute: false },
            ]
        );
    }
}
