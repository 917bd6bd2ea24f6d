//! # Sync Gate
//!
//! Admits at most one network activity at a time: either a save or a
//! freshness check. Entering hands out a ticket; the activity ends when the
//! ticket is dropped, whatever path the caller takes out.
//!
//! The gate also counts blocking operations (checkout and the like) that must
//! not race with an auto-save, and publishes a `SyncStatus` for the UI.

use folio_model::VersionMarker;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

const IDLE: u8 = 0;
const SAVING: u8 = 1;
const CHECKING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Saving,
    Checking,
}

impl Activity {
    fn code(self) -> u8 {
        match self {
            Activity::Saving => SAVING,
            Activity::Checking => CHECKING,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            SAVING => Some(Activity::Saving),
            CHECKING => Some(Activity::Checking),
            _ => None,
        }
    }
}

/// Snapshot of the sync state, published on every change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub saving: bool,
    pub checking: bool,
    pub last_saved: Option<VersionMarker>,
    pub last_error: Option<String>,
    pub terminated: bool,
}

#[derive(Debug)]
pub struct SyncGate {
    state: AtomicU8,
    blocking: AtomicUsize,
    status: watch::Sender<SyncStatus>,
}

impl SyncGate {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            state: AtomicU8::new(IDLE),
            blocking: AtomicUsize::new(0),
            status,
        }
    }

    /// Enter the gate if it is free
    pub fn try_enter(self: &Arc<Self>, activity: Activity) -> Option<GateTicket> {
        self.state
            .compare_exchange(IDLE, activity.code(), Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        self.status.send_modify(|status| set_flag(status, activity, true));
        Some(GateTicket {
            gate: Arc::clone(self),
            activity,
        })
    }

    /// Wait until the gate is free, then enter it
    pub async fn enter(self: &Arc<Self>, activity: Activity) -> GateTicket {
        let mut changes = self.status.subscribe();
        loop {
            if let Some(ticket) = self.try_enter(activity) {
                return ticket;
            }
            // Every release publishes a status change
            let _ = changes.changed().await;
        }
    }

    pub fn current(&self) -> Option<Activity> {
        Activity::from_code(self.state.load(Ordering::Acquire))
    }

    pub fn is_saving(&self) -> bool {
        self.current() == Some(Activity::Saving)
    }

    pub fn is_checking(&self) -> bool {
        self.current() == Some(Activity::Checking)
    }

    /// Hold off auto-saves until the returned guard is dropped
    pub fn begin_blocking(self: &Arc<Self>) -> BlockingOperation {
        self.blocking.fetch_add(1, Ordering::AcqRel);
        BlockingOperation {
            gate: Arc::clone(self),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocking.load(Ordering::Acquire) > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn record_saved(&self, marker: VersionMarker) {
        self.status.send_modify(|status| {
            status.last_saved = Some(marker);
            status.last_error = None;
        });
    }

    pub fn record_error(&self, error: &str) {
        self.status
            .send_modify(|status| status.last_error = Some(error.to_string()));
    }

    pub fn mark_terminated(&self) {
        self.status.send_modify(|status| status.terminated = true);
    }

    fn release(&self, activity: Activity) {
        self.state.store(IDLE, Ordering::Release);
        self.status.send_modify(|status| set_flag(status, activity, false));
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

fn set_flag(status: &mut SyncStatus, activity: Activity, value: bool) {
    match activity {
        Activity::Saving => status.saving = value,
        Activity::Checking => status.checking = value,
    }
}

/// Proof of holding the gate. Dropping it frees the gate.
#[derive(Debug)]
pub struct GateTicket {
    gate: Arc<SyncGate>,
    activity: Activity,
}

impl GateTicket {
    pub fn activity(&self) -> Activity {
        self.activity
    }
}

impl Drop for GateTicket {
    fn drop(&mut self) {
        self.gate.release(self.activity);
    }
}

/// An operation during which auto-save must not start
#[derive(Debug)]
pub struct BlockingOperation {
    gate: Arc<SyncGate>,
}

impl Drop for BlockingOperation {
    fn drop(&mut self) {
        self.gate.blocking.fetch_sub(1, Ordering::AcqRel);
    }
}
