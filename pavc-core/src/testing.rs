//! Scripted in-process backend for session and dispatch tests.
//!
//! `wait()` plays the next scripted wake: advancing the connection state,
//! completing (or cancelling) the current operation and delivering staged
//! sinks. Requests are recorded so tests can assert exact sequencing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::models::error::ControlError;
use crate::models::sink::SinkDevice;
use crate::models::state::{ContextState, OperationState};
use crate::traits::backend::{PendingOp, ServerBackend};
use crate::volume::ChannelVolumes;

pub(crate) struct MockOp(Rc<Cell<OperationState>>);

impl PendingOp for MockOp {
    fn state(&self) -> OperationState {
        self.0.get()
    }
}

/// One recorded request, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Issued {
    SinkList,
    SinkByName(String),
    SetVolume { index: u32, levels: Vec<u32> },
    SetMute { index: u32, mute: bool },
}

#[derive(Default)]
pub(crate) struct MockState {
    // fixture + scripting
    pub sinks: Vec<SinkDevice>,
    pub fail_start_loop: bool,
    pub fail_connection: bool,
    pub refuse_requests: bool,
    pub cancel_next_op: bool,
    pub error_after_op: Option<String>,
    pub spurious_wakes: u32,

    // observations
    pub issued: Vec<Issued>,
    pub lock_depth: i32,
    pub loop_starts: u32,
    pub loop_stops: u32,
    pub disconnects: u32,

    context_state: Option<ContextState>,
    current_op: Option<Rc<Cell<OperationState>>>,
    staged: Vec<SinkDevice>,
    discovered: Vec<SinkDevice>,
}

pub(crate) struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    pub fn with_sinks(sinks: Vec<SinkDevice>) -> Self {
        let backend = Self::new();
        backend.state.borrow_mut().sinks = sinks;
        backend
    }

    /// Shared handle for inspecting the mock after the session consumed it.
    pub fn probe(&self) -> Rc<RefCell<MockState>> {
        Rc::clone(&self.state)
    }

    fn begin_op(&mut self) -> Option<MockOp> {
        let mut state = self.state.borrow_mut();
        if state.refuse_requests {
            return None;
        }
        if let Some(prev) = &state.current_op {
            assert_ne!(
                prev.get(),
                OperationState::Running,
                "request issued while another operation is still running"
            );
        }
        let cell = Rc::new(Cell::new(OperationState::Running));
        state.current_op = Some(Rc::clone(&cell));
        Some(MockOp(cell))
    }
}

impl ServerBackend for MockBackend {
    type Op = MockOp;

    fn start_loop(&mut self) -> Result<(), ControlError> {
        let mut state = self.state.borrow_mut();
        if state.fail_start_loop {
            return Err(ControlError::Resource("event loop"));
        }
        state.loop_starts += 1;
        Ok(())
    }

    fn stop_loop(&mut self) {
        let mut state = self.state.borrow_mut();
        assert_eq!(state.lock_depth, 0, "stop_loop called with the lock held");
        state.loop_stops += 1;
    }

    fn lock(&mut self) {
        self.state.borrow_mut().lock_depth += 1;
    }

    fn unlock(&mut self) {
        let mut state = self.state.borrow_mut();
        state.lock_depth -= 1;
        assert!(state.lock_depth >= 0, "unlock without matching lock");
    }

    fn wait(&mut self) {
        let mut state = self.state.borrow_mut();
        assert_eq!(state.lock_depth, 1, "wait called without the lock held");
        if state.spurious_wakes > 0 {
            state.spurious_wakes -= 1;
            return;
        }
        if state.context_state == Some(ContextState::Connecting) {
            state.context_state = Some(if state.fail_connection {
                ContextState::Failed
            } else {
                ContextState::Ready
            });
            return;
        }
        let completed = match &state.current_op {
            Some(op) if op.get() == OperationState::Running => {
                if state.cancel_next_op {
                    op.set(OperationState::Cancelled);
                    false
                } else {
                    op.set(OperationState::Done);
                    true
                }
            }
            _ => panic!("wait called with nothing to wait for"),
        };
        if completed {
            let mut staged = std::mem::take(&mut state.staged);
            state.discovered.append(&mut staged);
        }
    }

    fn connect(&mut self, _server: Option<&str>) -> Result<(), ControlError> {
        self.state.borrow_mut().context_state = Some(ContextState::Connecting);
        Ok(())
    }

    fn context_state(&self) -> ContextState {
        self.state
            .borrow()
            .context_state
            .unwrap_or(ContextState::Unconnected)
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.disconnects += 1;
        state.context_state = Some(ContextState::Terminated);
    }

    fn last_error(&self) -> Option<String> {
        self.state.borrow().error_after_op.clone()
    }

    fn request_sink_list(&mut self) -> Option<Self::Op> {
        let op = self.begin_op()?;
        let mut state = self.state.borrow_mut();
        state.issued.push(Issued::SinkList);
        state.staged = state.sinks.clone();
        Some(op)
    }

    fn request_sink_by_name(&mut self, name: &str) -> Option<Self::Op> {
        let op = self.begin_op()?;
        let mut state = self.state.borrow_mut();
        state.issued.push(Issued::SinkByName(name.to_owned()));
        state.staged = state
            .sinks
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect();
        Some(op)
    }

    fn request_set_volume(&mut self, index: u32, volumes: &ChannelVolumes) -> Option<Self::Op> {
        let op = self.begin_op()?;
        self.state.borrow_mut().issued.push(Issued::SetVolume {
            index,
            levels: volumes.levels().to_vec(),
        });
        Some(op)
    }

    fn request_set_mute(&mut self, index: u32, mute: bool) -> Option<Self::Op> {
        let op = self.begin_op()?;
        self.state
            .borrow_mut()
            .issued
            .push(Issued::SetMute { index, mute });
        Some(op)
    }

    fn drain_sinks(&mut self) -> Vec<SinkDevice> {
        std::mem::take(&mut self.state.borrow_mut().discovered)
    }
}

/// Sink fixture with uniform stereo volume.
pub(crate) fn sink(index: u32, name: &str, level: u32, muted: bool) -> SinkDevice {
    SinkDevice {
        index,
        name: name.to_owned(),
        description: format!("{name} (test fixture)"),
        volumes: ChannelVolumes::uniform(2, level),
        muted,
    }
}
