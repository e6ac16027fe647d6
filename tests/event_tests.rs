//! Integration tests for `#[sash::event_handler]`.
//!
//! A fake native event system lives at the bottom of this file. It records
//! the trampoline table handed to the adapter constructor so tests can raise
//! events the way native code would.

#![allow(non_snake_case)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};
use sash::{BlittableBool, EventError, EventPriority, NativeHandle, Size, StringView};

#[sash::event_handler]
pub trait IVehicleEventHandler {
    fn on_vehicle_spawn(&self, vehicle_id: i32);
    fn on_vehicle_death(&self, vehicle_id: i32, killer: i32) -> bool;
    fn on_vehicle_named(&self, vehicle_id: i32, name: &str);
    fn on_siren_state_change(&self, vehicle_id: i32, enabled: bool) -> bool;
    fn on_vehicle_damage(&self, vehicle_id: i32, amount: f32) -> i32;
}

type Handler = Arc<dyn IVehicleEventHandler + Send + Sync>;

// =============================================================================
// Host handlers
// =============================================================================

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    allow_respawn: bool,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl IVehicleEventHandler for Recorder {
    fn on_vehicle_spawn(&self, vehicle_id: i32) {
        self.events.lock().push(format!("spawn {vehicle_id}"));
    }

    fn on_vehicle_death(&self, vehicle_id: i32, killer: i32) -> bool {
        self.events.lock().push(format!("death {vehicle_id} by {killer}"));
        self.allow_respawn
    }

    fn on_vehicle_named(&self, vehicle_id: i32, name: &str) {
        self.events.lock().push(format!("named {vehicle_id} {name}"));
    }

    fn on_siren_state_change(&self, vehicle_id: i32, enabled: bool) -> bool {
        self.events.lock().push(format!("siren {vehicle_id} {enabled}"));
        enabled
    }

    fn on_vehicle_damage(&self, _vehicle_id: i32, amount: f32) -> i32 {
        amount as i32
    }
}

struct Panicking;

impl IVehicleEventHandler for Panicking {
    fn on_vehicle_spawn(&self, _vehicle_id: i32) {
        panic!("spawn handler failed");
    }

    fn on_vehicle_death(&self, _vehicle_id: i32, _killer: i32) -> bool {
        panic!("death handler failed");
    }

    fn on_vehicle_named(&self, _vehicle_id: i32, _name: &str) {}

    fn on_siren_state_change(&self, _vehicle_id: i32, _enabled: bool) -> bool {
        true
    }

    fn on_vehicle_damage(&self, _vehicle_id: i32, _amount: f32) -> i32 {
        panic!("damage handler failed");
    }
}

fn recorder(allow_respawn: bool) -> (Arc<Recorder>, Handler) {
    let recorder = Arc::new(Recorder {
        allow_respawn,
        ..Recorder::default()
    });
    let handler: Handler = recorder.clone();
    (recorder, handler)
}

// =============================================================================
// Fake native side
// =============================================================================

type SpawnFn = extern "C" fn(i32);
type DeathFn = extern "C" fn(i32, i32) -> BlittableBool;
type NamedFn = extern "C" fn(i32, StringView);
type SirenFn = extern "C" fn(i32, BlittableBool) -> BlittableBool;
type DamageFn = extern "C" fn(i32, f32) -> i32;

#[derive(Clone, Copy)]
struct Table {
    spawn: SpawnFn,
    death: DeathFn,
    named: NamedFn,
    siren: SirenFn,
    damage: DamageFn,
}

struct Registration {
    dispatcher: usize,
    handler: usize,
    priority: i8,
}

static SERIAL: Mutex<()> = parking_lot::const_mutex(());
static TABLE: Mutex<Option<Table>> = parking_lot::const_mutex(None);
static REGISTRATIONS: Mutex<Vec<Registration>> = parking_lot::const_mutex(Vec::new());
static CREATED: AtomicUsize = AtomicUsize::new(0);
static DELETED: AtomicUsize = AtomicUsize::new(0);
static NATIVE_CALLS: AtomicUsize = AtomicUsize::new(0);
/// Handler the next native removal adds back, and the dispatcher it targets.
static READD_ON_REMOVE: Mutex<Option<(usize, Handler)>> = parking_lot::const_mutex(None);
static READD_RESULT: Mutex<Option<bool>> = parking_lot::const_mutex(None);

#[unsafe(no_mangle)]
pub extern "C" fn VehicleEventHandlerImpl_create(
    on_vehicle_spawn: SpawnFn,
    on_vehicle_death: DeathFn,
    on_vehicle_named: NamedFn,
    on_siren_state_change: SirenFn,
    on_vehicle_damage: DamageFn,
) -> NativeHandle {
    *TABLE.lock() = Some(Table {
        spawn: on_vehicle_spawn,
        death: on_vehicle_death,
        named: on_vehicle_named,
        siren: on_siren_state_change,
        damage: on_vehicle_damage,
    });
    let created = CREATED.fetch_add(1, Ordering::SeqCst) + 1;
    NativeHandle::from_addr(0x1000 + created)
}

#[unsafe(no_mangle)]
pub extern "C" fn VehicleEventHandlerImpl_delete(handle: NativeHandle) {
    assert!(!handle.is_null());
    DELETED.fetch_add(1, Ordering::SeqCst);
}

#[unsafe(no_mangle)]
pub extern "C" fn IEventDispatcher_VehicleEventHandler_addEventHandler(
    dispatcher: NativeHandle,
    handler: NativeHandle,
    priority: i8,
) -> BlittableBool {
    NATIVE_CALLS.fetch_add(1, Ordering::SeqCst);
    let mut registrations = REGISTRATIONS.lock();
    let exists = registrations
        .iter()
        .any(|r| r.dispatcher == dispatcher.addr() && r.handler == handler.addr());
    if !exists {
        registrations.push(Registration {
            dispatcher: dispatcher.addr(),
            handler: handler.addr(),
            priority,
        });
    }
    BlittableBool::from(!exists)
}

#[unsafe(no_mangle)]
pub extern "C" fn IEventDispatcher_VehicleEventHandler_removeEventHandler(
    dispatcher: NativeHandle,
    handler: NativeHandle,
) -> BlittableBool {
    NATIVE_CALLS.fetch_add(1, Ordering::SeqCst);
    let readd = READD_ON_REMOVE.lock().take();
    if let Some((target, handler)) = readd {
        let added = self::dispatcher(target).add_event_handler(&handler, EventPriority::Default);
        *READD_RESULT.lock() = Some(added);
    }

    let mut registrations = REGISTRATIONS.lock();
    let before = registrations.len();
    registrations.retain(|r| !(r.dispatcher == dispatcher.addr() && r.handler == handler.addr()));
    BlittableBool::from(registrations.len() != before)
}

#[unsafe(no_mangle)]
pub extern "C" fn IEventDispatcher_VehicleEventHandler_hasEventHandler(
    dispatcher: NativeHandle,
    handler: NativeHandle,
    priority: &mut i8,
) -> BlittableBool {
    NATIVE_CALLS.fetch_add(1, Ordering::SeqCst);
    let registrations = REGISTRATIONS.lock();
    match registrations
        .iter()
        .find(|r| r.dispatcher == dispatcher.addr() && r.handler == handler.addr())
    {
        Some(registration) => {
            *priority = registration.priority;
            BlittableBool::TRUE
        }
        None => BlittableBool::FALSE,
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn IEventDispatcher_VehicleEventHandler_count(dispatcher: NativeHandle) -> Size {
    let registrations = REGISTRATIONS.lock();
    Size(
        registrations
            .iter()
            .filter(|r| r.dispatcher == dispatcher.addr())
            .count(),
    )
}

fn table() -> Table {
    TABLE.lock().expect("adapter was never created")
}

/// Serialize tests sharing the static slot and reset the fake native side.
fn isolate() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    if let Some(active) = VehicleEventHandlerImpl::active() {
        let _ = VehicleEventHandlerImpl::dispose(&active);
    }
    REGISTRATIONS.lock().clear();
    READD_ON_REMOVE.lock().take();
    READD_RESULT.lock().take();
    CREATED.store(0, Ordering::SeqCst);
    DELETED.store(0, Ordering::SeqCst);
    NATIVE_CALLS.store(0, Ordering::SeqCst);
    guard
}

fn dispatcher(addr: usize) -> VehicleEventHandlerDispatcher {
    VehicleEventHandlerDispatcher::from_handle(NativeHandle::from_addr(addr))
}

// =============================================================================
// Activation
// =============================================================================

/// Activating the same handler twice reuses the native adapter.
#[test]
fn test_activate_is_idempotent() {
    let _guard = isolate();
    let (_, handler) = recorder(false);

    let first = VehicleEventHandlerImpl::activate(&handler).unwrap();
    let second = VehicleEventHandlerImpl::activate(&handler).unwrap();

    assert_eq!(first, second);
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert!(VehicleEventHandlerImpl::is_active(&handler));

    VehicleEventHandlerImpl::dispose(&handler).unwrap();
}

#[test]
fn test_second_handler_is_rejected() {
    let _guard = isolate();
    let (_, first) = recorder(false);
    let (_, second) = recorder(false);

    VehicleEventHandlerImpl::activate(&first).unwrap();
    let err = VehicleEventHandlerImpl::activate(&second).unwrap_err();

    assert_eq!(
        err,
        EventError::HandlerAlreadyActive {
            interface: "IVehicleEventHandler"
        }
    );
    assert!(VehicleEventHandlerImpl::is_active(&first));
    assert!(!VehicleEventHandlerImpl::is_active(&second));
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);

    VehicleEventHandlerImpl::dispose(&first).unwrap();
}

#[test]
fn test_dispose_inactive_handler_fails() {
    let _guard = isolate();
    let (_, handler) = recorder(false);

    assert!(matches!(
        VehicleEventHandlerImpl::dispose(&handler),
        Err(EventError::NotActive { .. })
    ));
    assert_eq!(DELETED.load(Ordering::SeqCst), 0);
}

/// A scoped handler is disposed when its guard goes out of scope.
#[test]
fn test_scope_disposes_on_drop() {
    let _guard = isolate();
    let (_, handler) = recorder(false);

    {
        let scoped = VehicleEventHandlerImpl::scope(handler.clone()).unwrap();
        assert!(!scoped.handle().is_null());
        assert!(VehicleEventHandlerImpl::is_active(&handler));
    }

    assert!(VehicleEventHandlerImpl::active().is_none());
    assert!(VehicleEventHandlerImpl::slot().is_empty());
    assert_eq!(DELETED.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Trampolines
// =============================================================================

#[test]
fn test_trampolines_reach_active_handler() {
    let _guard = isolate();
    let (recorder, handler) = recorder(true);
    VehicleEventHandlerImpl::activate(&handler).unwrap();
    let table = table();

    (table.spawn)(7);
    assert!((table.death)(7, 3).get());
    let name = String::from("Infernus");
    (table.named)(7, StringView::new(&name));
    assert!((table.siren)(7, BlittableBool(2)).get());
    assert_eq!((table.damage)(7, 41.5), 41);

    assert_eq!(
        recorder.events(),
        ["spawn 7", "death 7 by 3", "named 7 Infernus", "siren 7 true"]
    );

    VehicleEventHandlerImpl::dispose(&handler).unwrap();
}

/// Events raised with no active handler return the default value.
#[test]
fn test_events_without_handler_return_default() {
    let _guard = isolate();
    let (recorder, handler) = recorder(true);
    VehicleEventHandlerImpl::activate(&handler).unwrap();
    let table = table();
    VehicleEventHandlerImpl::dispose(&handler).unwrap();

    (table.spawn)(1);
    assert!(!(table.death)(1, 2).get());
    assert_eq!((table.damage)(1, 5.0), 0);
    assert!(recorder.events().is_empty());
}

/// A panicking handler never unwinds into native code.
#[test]
fn test_panicking_handler_returns_default() {
    let _guard = isolate();
    let handler: Handler = Arc::new(Panicking);
    VehicleEventHandlerImpl::activate(&handler).unwrap();
    let table = table();

    (table.spawn)(1);
    assert!(!(table.death)(1, 2).get());
    assert_eq!((table.damage)(1, 9.0), 0);
    assert!((table.siren)(1, BlittableBool::FALSE).get());
    assert!(VehicleEventHandlerImpl::is_active(&handler));

    VehicleEventHandlerImpl::dispose(&handler).unwrap();
}

// =============================================================================
// Dispatchers
// =============================================================================

/// Disposal removes the handler from every dispatcher it was added to.
#[test]
fn test_dispose_removes_from_all_dispatchers() {
    let _guard = isolate();
    let (_, handler) = recorder(false);
    let vehicles = dispatcher(0xA0);
    let players = dispatcher(0xB0);

    assert!(vehicles.add_event_handler(&handler, EventPriority::Default));
    assert!(players.add_event_handler(&handler, EventPriority::FairlyLow));
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(vehicles.count(), 1);
    assert_eq!(players.count(), 1);

    let calls = NATIVE_CALLS.load(Ordering::SeqCst);
    VehicleEventHandlerImpl::dispose(&handler).unwrap();

    // One native removal per dispatcher.
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), calls + 2);
    assert_eq!(vehicles.count(), 0);
    assert_eq!(players.count(), 0);
    assert_eq!(DELETED.load(Ordering::SeqCst), 1);
    assert!(VehicleEventHandlerImpl::slot().is_empty());
}

/// Native code that adds the handler back while disposal is removing it
/// gets `false`, and nothing is registered against the deleted adapter.
#[test]
fn test_add_during_dispose_is_refused() {
    let _guard = isolate();
    let (_, handler) = recorder(false);
    let vehicles = dispatcher(0xA0);
    let players = dispatcher(0xB0);

    assert!(vehicles.add_event_handler(&handler, EventPriority::Default));
    *READD_ON_REMOVE.lock() = Some((0xB0, Arc::clone(&handler)));

    let calls = NATIVE_CALLS.load(Ordering::SeqCst);
    VehicleEventHandlerImpl::dispose(&handler).unwrap();

    assert_eq!(*READD_RESULT.lock(), Some(false));
    // Only the removal reached native code.
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), calls + 1);
    assert_eq!(vehicles.count(), 0);
    assert_eq!(players.count(), 0);
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(DELETED.load(Ordering::SeqCst), 1);
    assert!(VehicleEventHandlerImpl::slot().is_empty());
}

#[test]
fn test_add_while_other_handler_active_fails() {
    let _guard = isolate();
    let (_, first) = recorder(false);
    let (_, second) = recorder(false);
    let vehicles = dispatcher(0xA0);

    assert!(vehicles.add_event_handler(&first, EventPriority::Default));
    let calls = NATIVE_CALLS.load(Ordering::SeqCst);

    assert!(!vehicles.add_event_handler(&second, EventPriority::Highest));
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), calls);
    assert_eq!(vehicles.count(), 1);

    VehicleEventHandlerImpl::dispose(&first).unwrap();
}

#[test]
fn test_remove_inactive_handler_skips_native() {
    let _guard = isolate();
    let (_, first) = recorder(false);
    let (_, second) = recorder(false);
    let vehicles = dispatcher(0xA0);
    vehicles.add_event_handler(&first, EventPriority::Default);
    let calls = NATIVE_CALLS.load(Ordering::SeqCst);

    assert!(!vehicles.remove_event_handler(&second));
    assert!(vehicles.has_event_handler(&second).is_none());
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), calls);

    VehicleEventHandlerImpl::dispose(&first).unwrap();
}

/// Removing by hand leaves nothing for disposal to remove.
#[test]
fn test_remove_then_dispose() {
    let _guard = isolate();
    let (_, handler) = recorder(false);
    let vehicles = dispatcher(0xA0);

    assert!(vehicles.add_event_handler(&handler, EventPriority::Default));
    assert!(vehicles.remove_event_handler(&handler));
    assert!(!vehicles.remove_event_handler(&handler));
    assert_eq!(vehicles.count(), 0);

    let calls = NATIVE_CALLS.load(Ordering::SeqCst);
    VehicleEventHandlerImpl::dispose(&handler).unwrap();
    assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), calls);
    assert_eq!(DELETED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_has_event_handler_reports_priority() {
    let _guard = isolate();
    let (_, handler) = recorder(false);
    let vehicles = dispatcher(0xA0);
    let players = dispatcher(0xB0);

    assert!(vehicles.add_event_handler(&handler, EventPriority::FairlyHigh));

    assert_eq!(
        vehicles.has_event_handler(&handler),
        Some(EventPriority::FairlyHigh)
    );
    assert_eq!(players.has_event_handler(&handler), None);

    VehicleEventHandlerImpl::dispose(&handler).unwrap();
}

#[test]
fn test_count_tracks_registrations() {
    let _guard = isolate();
    let (_, handler) = recorder(false);
    let vehicles = dispatcher(0xA0);

    assert_eq!(vehicles.count(), 0);
    vehicles.add_event_handler(&handler, EventPriority::Default);
    assert!(!vehicles.add_event_handler(&handler, EventPriority::Default));
    assert_eq!(vehicles.count(), 1);

    VehicleEventHandlerImpl::dispose(&handler).unwrap();
    assert_eq!(vehicles.count(), 0);
}
