//! Single-active-handler slots for event interfaces.
//!
//! Every event interface owns one [`ActiveHandlerSlot`]. Native code holds
//! one adapter object per interface, created from a table of `extern "C"`
//! trampolines; the trampolines find their host handler through the slot.
//! Only one host handler can therefore be active at a time:
//!
//! ```text
//!            activate(h)                      dispose(h)
//!   Empty ──────────────► Active(h, handle) ──────────────► Disposing ───► Empty
//!                           │   ▲                              (hooks run,
//!              activate(h)  └───┘  (same handler)               native delete)
//!              activate(g)  ─► Err(HandlerAlreadyActive), unchanged
//! ```
//!
//! While a handler is disposing it keeps its native handle, so hooks can
//! still deregister it, but nothing new can attach to it: `activate`,
//! `attach` and a second `dispose` fail with [`EventError::Disposing`].
//!
//! # Thread Safety
//!
//! Slot state lives behind a [`parking_lot::Mutex`]. Trampolines clone the
//! active handler out under the lock and call it after releasing it, so a
//! handler may register or dispose handlers from inside a callback.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EventError, EventResult};
use crate::handle::NativeHandle;

/// Runs once when the handler it was registered for is disposed.
pub type DisposeHook = Box<dyn FnOnce() + Send>;

struct ActiveEntry<H: ?Sized> {
    handler: Arc<H>,
    handle: NativeHandle,
    /// Keyed by the dispatcher the hook deregisters from.
    hooks: Vec<(NativeHandle, DisposeHook)>,
    disposing: bool,
}

impl<H: ?Sized> ActiveEntry<H> {
    fn holds(&self, handler: &Arc<H>) -> bool {
        same_handler(&self.handler, handler)
    }
}

/// The at-most-one active handler of an event interface.
pub struct ActiveHandlerSlot<H: ?Sized> {
    interface: &'static str,
    state: Mutex<Option<ActiveEntry<H>>>,
}

fn same_handler<H: ?Sized>(a: &Arc<H>, b: &Arc<H>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl<H: ?Sized> ActiveHandlerSlot<H> {
    /// An empty slot. `const` so generated code can place it in a `static`.
    pub const fn new(interface: &'static str) -> Self {
        Self {
            interface,
            state: parking_lot::const_mutex(None),
        }
    }

    /// Make `handler` the active handler.
    ///
    /// Returns the native adapter handle. If `handler` is already active the
    /// existing handle is returned and `create` is not called. If a
    /// different handler is active the slot is left untouched.
    pub fn activate(
        &self,
        handler: &Arc<H>,
        create: impl FnOnce() -> NativeHandle,
    ) -> EventResult<NativeHandle> {
        let mut state = self.state.lock();
        self.activate_locked(&mut state, handler, create)
    }

    fn activate_locked(
        &self,
        state: &mut Option<ActiveEntry<H>>,
        handler: &Arc<H>,
        create: impl FnOnce() -> NativeHandle,
    ) -> EventResult<NativeHandle> {
        if let Some(entry) = state.as_ref() {
            if !entry.holds(handler) {
                tracing::warn!(
                    interface = self.interface,
                    "activation rejected: another handler is active"
                );
                return Err(EventError::HandlerAlreadyActive {
                    interface: self.interface,
                });
            }
            if entry.disposing {
                return Err(EventError::Disposing {
                    interface: self.interface,
                });
            }
            return Ok(entry.handle);
        }

        let handle = create();
        tracing::debug!(interface = self.interface, ?handle, "event handler activated");
        *state = Some(ActiveEntry {
            handler: Arc::clone(handler),
            handle,
            hooks: Vec::new(),
            disposing: false,
        });
        Ok(handle)
    }

    /// Activate `handler` and tie its lifetime to the returned guard.
    pub fn scope(
        &self,
        handler: Arc<H>,
        create: impl FnOnce() -> NativeHandle,
        delete: fn(NativeHandle),
    ) -> EventResult<ScopedHandler<'_, H>> {
        let handle = self.activate(&handler, create)?;
        Ok(ScopedHandler {
            slot: self,
            handler: Some(handler),
            handle,
            delete,
        })
    }

    /// The active handler, if any.
    pub fn active(&self) -> Option<Arc<H>> {
        self.state.lock().as_ref().map(|entry| Arc::clone(&entry.handler))
    }

    /// Native handle of `handler`, or `None` when it is not the active one.
    pub fn active_handle(&self, handler: &Arc<H>) -> Option<NativeHandle> {
        self.state
            .lock()
            .as_ref()
            .filter(|entry| entry.holds(handler))
            .map(|entry| entry.handle)
    }

    pub fn is_active(&self, handler: &Arc<H>) -> bool {
        self.active_handle(handler).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_none()
    }

    /// Activate `handler` (or reuse its activation) and register a disposal
    /// hook under `key`, returning the native handle.
    ///
    /// Both steps happen under one lock hold. While `handler` is disposing
    /// this fails with [`EventError::Disposing`] and `hook` is dropped
    /// unrun. At most one hook is kept per key; attaching again under the
    /// same key replaces the previous hook.
    pub fn attach(
        &self,
        handler: &Arc<H>,
        create: impl FnOnce() -> NativeHandle,
        key: NativeHandle,
        hook: DisposeHook,
    ) -> EventResult<NativeHandle> {
        let mut state = self.state.lock();
        let handle = self.activate_locked(&mut state, handler, create)?;
        if let Some(entry) = state.as_mut() {
            entry.hooks.retain(|(existing, _)| *existing != key);
            entry.hooks.push((key, hook));
        }
        Ok(handle)
    }

    /// Drop the hook registered under `key` without running it.
    pub fn forget_hook(&self, handler: &Arc<H>, key: NativeHandle) -> bool {
        let mut state = self.state.lock();
        match state.as_mut().filter(|entry| entry.holds(handler)) {
            Some(entry) => {
                let before = entry.hooks.len();
                entry.hooks.retain(|(existing, _)| *existing != key);
                entry.hooks.len() != before
            }
            None => false,
        }
    }

    /// Deactivate `handler`.
    ///
    /// The entry is first marked as disposing, which stops anything new
    /// from attaching. Disposal hooks then run with the slot unlocked and
    /// `handler` still active, so deregistration calls made from them pass
    /// their identity checks. Finally the slot is emptied and `delete`
    /// receives the native handle.
    pub fn dispose(&self, handler: &Arc<H>, delete: impl FnOnce(NativeHandle)) -> EventResult<()> {
        let hooks = {
            let mut state = self.state.lock();
            let entry = state
                .as_mut()
                .filter(|entry| entry.holds(handler))
                .ok_or(EventError::NotActive {
                    interface: self.interface,
                })?;
            if entry.disposing {
                return Err(EventError::Disposing {
                    interface: self.interface,
                });
            }
            entry.disposing = true;
            std::mem::take(&mut entry.hooks)
        };

        for (key, hook) in hooks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(hook)) {
                tracing::error!(
                    interface = self.interface,
                    dispatcher = ?key,
                    message = panic_message(payload.as_ref()),
                    "disposal hook panicked"
                );
            }
        }

        let entry = self.state.lock().take();
        match entry {
            Some(entry) => {
                debug_assert!(entry.hooks.is_empty());
                tracing::debug!(interface = self.interface, handle = ?entry.handle, "event handler disposed");
                delete(entry.handle);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Guard that disposes its handler when dropped.
pub struct ScopedHandler<'s, H: ?Sized> {
    slot: &'s ActiveHandlerSlot<H>,
    handler: Option<Arc<H>>,
    handle: NativeHandle,
    delete: fn(NativeHandle),
}

impl<H: ?Sized> ScopedHandler<'_, H> {
    /// Native adapter handle of the guarded handler.
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn handler(&self) -> Option<&Arc<H>> {
        self.handler.as_ref()
    }

    /// Dispose now instead of at the end of the scope.
    pub fn release(mut self) -> EventResult<()> {
        self.dispose_inner()
    }

    fn dispose_inner(&mut self) -> EventResult<()> {
        match self.handler.take() {
            Some(handler) => self.slot.dispose(&handler, self.delete),
            None => Ok(()),
        }
    }
}

impl<H: ?Sized> Drop for ScopedHandler<'_, H> {
    fn drop(&mut self) {
        if let Err(err) = self.dispose_inner() {
            tracing::warn!(error = %err, "scoped handler was already disposed");
        }
    }
}

/// Forward a native event to the active handler.
///
/// Called from generated `extern "C"` trampolines. With no active handler
/// the event is dropped and `R::default()` is returned. A panicking handler
/// is logged and also yields `R::default()`; unwinding never reaches native
/// code.
pub fn dispatch<H, R, F>(slot: &ActiveHandlerSlot<H>, event: &'static str, call: F) -> R
where
    H: ?Sized,
    R: Default,
    F: FnOnce(&H) -> R,
{
    let Some(handler) = slot.active() else {
        tracing::trace!(interface = slot.interface, event, "no active handler");
        return R::default();
    };

    match catch_unwind(AssertUnwindSafe(|| call(&handler))) {
        Ok(value) => value,
        Err(payload) => {
            tracing::error!(
                interface = slot.interface,
                event,
                message = panic_message(payload.as_ref()),
                "event handler panicked"
            );
            R::default()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
