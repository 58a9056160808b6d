//! # Single Instance
//!
//! Only one builder window may run. On Windows the first process owns the named mutex
//! `EXEBUILDER_MUTEX` and waits on the auto-reset event `EXEBUILDER_ACTIVATE_EVENT`; a
//! second launch signals that event and exits, and the first instance brings its window to
//! the front. Other platforms always run as the primary instance.

use crate::events::EventSender;

pub const MUTEX_NAME: &str = "EXEBUILDER_MUTEX";
pub const ACTIVATE_EVENT_NAME: &str = "EXEBUILDER_ACTIVATE_EVENT";

pub enum InstanceRole {
    Primary(InstanceGuard),
    /// Another builder is running and has been asked to show itself.
    Secondary,
}

/// Keeps the instance mutex alive for the life of the process.
pub struct InstanceGuard {
    #[cfg(windows)]
    handles: Option<platform::Handles>,
}

impl InstanceGuard {
    /// Starts the activation listener; each signal posts [`crate::events::AppEvent::Activate`].
    #[cfg(windows)]
    pub fn listen(&mut self, events: EventSender) {
        if let Some(handles) = &self.handles {
            platform::spawn_listener(handles, events);
        }
    }

    #[cfg(not(windows))]
    pub fn listen(&mut self, _events: EventSender) {}
}

/// Claims the single-instance slot or, if taken, activates the running instance.
#[cfg(windows)]
pub fn claim() -> InstanceRole {
    platform::claim()
}

#[cfg(not(windows))]
pub fn claim() -> InstanceRole {
    InstanceRole::Primary(InstanceGuard {})
}

#[cfg(windows)]
mod platform {
    use std::thread;
    use log::{debug, info, warn};
    use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE, WAIT_OBJECT_0};
    use windows::Win32::System::Threading::{
        CreateEventW, CreateMutexW, EVENT_MODIFY_STATE, INFINITE, OpenEventW, SetEvent, WaitForSingleObject,
    };
    use windows::core::HSTRING;
    use super::{ACTIVATE_EVENT_NAME, InstanceGuard, InstanceRole, MUTEX_NAME};
    use crate::events::{AppEvent, EventSender};

    /// Raw handle values; `HANDLE` itself is not `Send`.
    pub struct Handles {
        _mutex: isize,
        event: isize,
    }

    pub fn claim() -> InstanceRole {
        let mutex = unsafe { CreateMutexW(None, false, &HSTRING::from(MUTEX_NAME)) };
        let already_running = unsafe { GetLastError() } == ERROR_ALREADY_EXISTS;

        let mutex = match mutex {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not create instance mutex: {e}");
                return InstanceRole::Primary(InstanceGuard { handles: None });
            }
        };

        if already_running {
            info!("Builder already running; activating it");
            signal_running_instance();
            unsafe {
                let _ = CloseHandle(mutex);
            }
            return InstanceRole::Secondary;
        }

        let event = unsafe { CreateEventW(None, false, false, &HSTRING::from(ACTIVATE_EVENT_NAME)) };
        let handles = match event {
            Ok(event) => Some(Handles {
                _mutex: mutex.0 as isize,
                event: event.0 as isize,
            }),
            Err(e) => {
                warn!("Could not create activation event: {e}");
                None
            }
        };
        InstanceRole::Primary(InstanceGuard { handles })
    }

    fn signal_running_instance() {
        unsafe {
            match OpenEventW(EVENT_MODIFY_STATE, false, &HSTRING::from(ACTIVATE_EVENT_NAME)) {
                Ok(event) => {
                    if let Err(e) = SetEvent(event) {
                        warn!("Could not signal running instance: {e}");
                    }
                    let _ = CloseHandle(event);
                }
                Err(e) => warn!("Running instance has no activation event: {e}"),
            }
        }
    }

    pub fn spawn_listener(handles: &Handles, events: EventSender) {
        let raw = handles.event;
        let spawned = thread::Builder::new()
            .name("activation-listener".into())
            .spawn(move || {
                let event = HANDLE(raw as *mut _);
                loop {
                    let result = unsafe { WaitForSingleObject(event, INFINITE) };
                    if result != WAIT_OBJECT_0 {
                        warn!("Activation wait ended: {:?}", result);
                        break;
                    }
                    debug!("Activation requested by another instance");
                    events.post(AppEvent::Activate);
                }
            });
        if let Err(e) = spawned {
            warn!("Could not start activation listener: {e}");
        }
    }
}
