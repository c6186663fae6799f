//! PulseAudio backend for the pavc core.
//!
//! Wraps the threaded mainloop + context of `libpulse-binding` behind the
//! core's `ServerBackend` trait. Follows the binding's documented pattern
//! for the threaded mainloop: `Rc<RefCell<Mainloop>>` shared into the
//! callbacks, which signal waiting threads through the mainloop's raw
//! handle (the worker thread already holds the loop lock while it runs a
//! callback, so `RefCell` borrows must not be taken there).

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;

use libpulse_binding::callbacks::ListResult;
use libpulse_binding::context::introspect::SinkInfo;
use libpulse_binding::context::{Context, FlagSet, State};
use libpulse_binding::mainloop::threaded::Mainloop;
use libpulse_binding::operation::{Operation, State as PaOperationState};
use libpulse_binding::volume::{ChannelVolumes as PaChannelVolumes, Volume as PaVolume};

use pavc_core::models::error::ControlError;
use pavc_core::models::sink::SinkDevice;
use pavc_core::models::state::{ContextState, OperationState};
use pavc_core::traits::backend::{PendingOp, ServerBackend};
use pavc_core::volume::ChannelVolumes;

/// Application name registered with the server.
const CLIENT_NAME: &str = "pavc";

trait PollOperation {
    fn poll(&self) -> OperationState;
}

impl<C: ?Sized> PollOperation for Operation<C> {
    fn poll(&self) -> OperationState {
        match self.get_state() {
            PaOperationState::Running => OperationState::Running,
            PaOperationState::Done => OperationState::Done,
            PaOperationState::Cancelled => OperationState::Cancelled,
        }
    }
}

/// Type-erased pending operation. The introspector returns differently
/// typed `Operation`s per request; the session only ever polls the state.
/// Dropping it unrefs the underlying operation (the explicit release step
/// of the request protocol).
pub struct PulseOp(Box<dyn PollOperation>);

impl PendingOp for PulseOp {
    fn state(&self) -> OperationState {
        self.0.poll()
    }
}

/// `ServerBackend` over a PulseAudio threaded mainloop.
pub struct PulseBackend {
    mainloop: Rc<RefCell<Mainloop>>,
    context: Rc<RefCell<Context>>,
    /// Sinks collected by discovery callbacks on the worker thread,
    /// drained by the main thread after the operation completes.
    discovered: Arc<Mutex<Vec<SinkDevice>>>,
}

impl PulseBackend {
    /// Allocate the event loop and the connection context.
    ///
    /// The context is created from the loop's dispatch table before the
    /// worker thread is started, matching the required setup order.
    pub fn new() -> Result<Self, ControlError> {
        let mainloop = Rc::new(RefCell::new(
            Mainloop::new().ok_or(ControlError::Resource("event loop"))?,
        ));
        let context = Context::new(mainloop.borrow().deref(), CLIENT_NAME)
            .ok_or(ControlError::Resource("context"))?;
        Ok(Self {
            mainloop,
            context: Rc::new(RefCell::new(context)),
            discovered: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn sink_collector(&self) -> impl FnMut(ListResult<&SinkInfo>) + 'static {
        let discovered = Arc::clone(&self.discovered);
        let ml_ref = Rc::clone(&self.mainloop);
        move |result| {
            if let ListResult::Item(info) = result {
                discovered.lock().push(sink_device_from_info(info));
            }
            // wake the thread parked in wait()
            unsafe { (*ml_ref.as_ptr()).signal(false) };
        }
    }

    fn success_signaler(&self) -> Box<dyn FnMut(bool) + 'static> {
        let ml_ref = Rc::clone(&self.mainloop);
        Box::new(move |_success| {
            unsafe { (*ml_ref.as_ptr()).signal(false) };
        })
    }
}

impl ServerBackend for PulseBackend {
    type Op = PulseOp;

    fn start_loop(&mut self) -> Result<(), ControlError> {
        self.mainloop
            .borrow_mut()
            .start()
            .map_err(|_| ControlError::Resource("event loop thread"))
    }

    fn stop_loop(&mut self) {
        self.mainloop.borrow_mut().stop();
    }

    fn lock(&mut self) {
        self.mainloop.borrow_mut().lock();
    }

    fn unlock(&mut self) {
        self.mainloop.borrow_mut().unlock();
    }

    fn wait(&mut self) {
        // parks the calling thread, releasing the loop lock until a
        // callback signals; the lock is reacquired before returning
        self.mainloop.borrow_mut().wait();
    }

    fn connect(&mut self, server: Option<&str>) -> Result<(), ControlError> {
        let ml_ref = Rc::clone(&self.mainloop);
        self.context
            .borrow_mut()
            .set_state_callback(Some(Box::new(move || {
                unsafe { (*ml_ref.as_ptr()).signal(false) };
            })));
        self.context
            .borrow_mut()
            .connect(server, FlagSet::NOFLAGS, None)
            .map_err(|e| ControlError::Connection(format!("failed: {e}")))
    }

    fn context_state(&self) -> ContextState {
        match self.context.borrow().get_state() {
            State::Unconnected => ContextState::Unconnected,
            State::Connecting => ContextState::Connecting,
            State::Authorizing => ContextState::Authorizing,
            State::SettingName => ContextState::SettingName,
            State::Ready => ContextState::Ready,
            State::Failed => ContextState::Failed,
            State::Terminated => ContextState::Terminated,
        }
    }

    fn disconnect(&mut self) {
        self.context.borrow_mut().disconnect();
    }

    fn last_error(&self) -> Option<String> {
        let err = self.context.borrow().errno();
        if err.0 == 0 {
            None
        } else {
            err.to_string()
        }
    }

    fn request_sink_list(&mut self) -> Option<Self::Op> {
        log::debug!("requesting sink list");
        let callback = self.sink_collector();
        let op = self
            .context
            .borrow()
            .introspect()
            .get_sink_info_list(callback);
        Some(PulseOp(Box::new(op)))
    }

    fn request_sink_by_name(&mut self, name: &str) -> Option<Self::Op> {
        log::debug!("requesting sink info for {name}");
        let callback = self.sink_collector();
        let op = self
            .context
            .borrow()
            .introspect()
            .get_sink_info_by_name(name, callback);
        Some(PulseOp(Box::new(op)))
    }

    fn request_set_volume(&mut self, index: u32, volumes: &ChannelVolumes) -> Option<Self::Op> {
        log::debug!("setting volume on sink {index}");
        let mut cv = PaChannelVolumes::default();
        cv.set_len(volumes.channel_count() as u8);
        for (slot, &level) in cv.get_mut().iter_mut().zip(volumes.levels()) {
            *slot = PaVolume(level);
        }
        let callback = self.success_signaler();
        let mut introspector = self.context.borrow().introspect();
        let op = introspector.set_sink_volume_by_index(index, &cv, Some(callback));
        Some(PulseOp(Box::new(op)))
    }

    fn request_set_mute(&mut self, index: u32, mute: bool) -> Option<Self::Op> {
        log::debug!("setting mute={mute} on sink {index}");
        let callback = self.success_signaler();
        let mut introspector = self.context.borrow().introspect();
        let op = introspector.set_sink_mute_by_index(index, mute, Some(callback));
        Some(PulseOp(Box::new(op)))
    }

    fn drain_sinks(&mut self) -> Vec<SinkDevice> {
        std::mem::take(&mut *self.discovered.lock())
    }
}

/// Convert a borrowed sink descriptor to owned data inside the callback
/// window — nothing borrowed from the server outlives the callback.
fn sink_device_from_info(info: &SinkInfo) -> SinkDevice {
    SinkDevice {
        index: info.index,
        name: info.name.as_deref().unwrap_or_default().to_owned(),
        description: info.description.as_deref().unwrap_or_default().to_owned(),
        volumes: ChannelVolumes::new(info.volume.get().iter().map(|v| v.0).collect()),
        muted: info.mute,
    }
}
