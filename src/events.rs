//! Messages from background threads to the UI thread.
//!
//! Workers only ever post; every state change happens when the UI drains the queue at the
//! start of a frame.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use crate::system::ProcessExit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The PyInstaller process of build session `session` exited.
    BuildExited { session: u64, exit: ProcessExit },
    /// PyInstaller could not be started or waited on.
    BuildLaunchFailed { session: u64, error: String },
    /// `-m PyInstaller --version` failed, so nothing was launched.
    PackagerMissing { session: u64, detail: String },
    /// A second instance asked this one to come to the front.
    Activate,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle for posting events. Optionally wakes the UI so the event is handled
/// without waiting for input.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<AppEvent>,
    waker: Option<Waker>,
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("waker", &self.waker.is_some())
            .finish()
    }
}

impl EventSender {
    /// Fire-and-forget; a closed queue means the UI is gone.
    pub fn post(&self, event: AppEvent) {
        if self.tx.send(event).is_ok() {
            if let Some(wake) = &self.waker {
                wake();
            }
        }
    }
}

pub struct EventQueue {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    waker: Option<Waker>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, waker: None }
    }

    /// Installs the repaint hook used by senders created afterwards.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Everything posted so far, in order. Never blocks.
    pub fn drain(&self) -> Vec<AppEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
