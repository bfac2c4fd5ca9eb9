//! Registration orchestration: spoofed browser setup plus device-flow
//! login, executed as a single background attempt.
//!
//! At most one attempt runs system-wide. Two concurrent attempts would
//! race for the same IDE auth slot, so a second start is rejected
//! outright, never queued.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::browser::PageHook;
use crate::oauth::{build_token_record, DeviceFlowClient, DeviceFlowError};
use crate::spoof::{SpoofInjector, SpoofProfile};
use crate::token::TokenStore;

/// Errors from the attempt registry.
#[derive(Debug, PartialEq, Eq)]
pub enum AttemptError {
    /// A registration attempt is already in flight.
    Busy,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "a registration attempt is already running"),
        }
    }
}

impl std::error::Error for AttemptError {}

/// Observable state of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Starting,
    /// The human must authorize out-of-band; polling has not begun.
    AwaitingAuthorization {
        verification_url: String,
        user_code: String,
    },
    Polling,
    Completed {
        file_name: String,
    },
    Failed {
        message: String,
    },
    Cancelled,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }
}

struct AttemptHandle {
    id: u64,
    status_rx: watch::Receiver<AttemptStatus>,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Single-slot registry of registration attempts.
///
/// `start` spawns the attempt task and occupies the slot until the task
/// reports a terminal status; `cancel` signals cooperatively and the
/// provider's device code is simply left to expire.
#[derive(Default)]
pub struct AttemptRegistry {
    next_id: AtomicU64,
    slot: Mutex<Option<AttemptHandle>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slot: Mutex::new(None),
        }
    }

    /// Start an attempt in the slot. Rejected while one is in flight.
    pub fn start<F, Fut>(&self, task_fn: F) -> Result<u64, AttemptError>
    where
        F: FnOnce(watch::Sender<AttemptStatus>, watch::Receiver<bool>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.as_ref() {
            if !handle.status_rx.borrow().is_terminal() && !handle.task.is_finished() {
                return Err(AttemptError::Busy);
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (status_tx, status_rx) = watch::channel(AttemptStatus::Starting);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(task_fn(status_tx, cancel_rx));
        *slot = Some(AttemptHandle {
            id,
            status_rx,
            cancel_tx,
            task,
        });
        tracing::info!(attempt = id, "registration attempt started");
        Ok(id)
    }

    /// Current attempt id and status, including finished attempts until a
    /// new one replaces them.
    pub fn status(&self) -> Option<(u64, AttemptStatus)> {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_ref()
            .map(|handle| (handle.id, handle.status_rx.borrow().clone()))
    }

    /// Signal the running attempt to stop. Returns whether an attempt was
    /// signalled.
    pub fn cancel(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some(handle) if !handle.status_rx.borrow().is_terminal() => {
                let _ = handle.cancel_tx.send(true);
                true
            }
            _ => false,
        }
    }
}

/// Parameters of one registration attempt.
#[derive(Debug, Clone)]
pub struct RegistrationParams {
    pub account_name: String,
    pub region: String,
    pub start_url: String,
    pub timeout: Duration,
    /// Seed for the spoof profile; random per attempt when absent.
    pub profile_seed: Option<u64>,
}

/// Drive one registration attempt to a terminal status.
///
/// Spoof injection strictly precedes any navigation; a missing injection
/// primitive degrades but never aborts. The device-flow poll blocks only
/// this task and honors the cancel signal.
pub async fn run_registration(
    params: RegistrationParams,
    store: TokenStore,
    hook: Option<Arc<dyn PageHook>>,
    status: watch::Sender<AttemptStatus>,
    cancel: watch::Receiver<bool>,
) {
    let _ = status.send(AttemptStatus::Starting);

    if let Some(hook) = hook.as_deref() {
        let seed = params.profile_seed.unwrap_or_else(rand::random);
        let injector = SpoofInjector::new(SpoofProfile::randomized(seed));
        let method = injector.install(hook).await;
        tracing::debug!(?method, seed, "spoof injection finished");
    }

    let client =
        DeviceFlowClient::new(&params.region, &params.start_url).with_timeout(params.timeout);
    let session = match client.start().await {
        Ok(session) => session,
        Err(err) => {
            let _ = status.send(AttemptStatus::Failed {
                message: err.to_string(),
            });
            return;
        }
    };
    let _ = status.send(AttemptStatus::AwaitingAuthorization {
        verification_url: session.authorization_url().to_string(),
        user_code: session.user_code.clone(),
    });

    let _ = status.send(AttemptStatus::Polling);
    let issued = match client.wait_for_token(&session, cancel).await {
        Ok(issued) => issued,
        Err(DeviceFlowError::Cancelled) => {
            let _ = status.send(AttemptStatus::Cancelled);
            return;
        }
        Err(err) => {
            let _ = status.send(AttemptStatus::Failed {
                message: err.to_string(),
            });
            return;
        }
    };

    let record = build_token_record(
        issued,
        &session,
        &params.region,
        &params.start_url,
        &params.account_name,
        chrono::Utc::now(),
    );
    match store.save_new(&record) {
        Ok(file_name) => {
            let _ = status.send(AttemptStatus::Completed { file_name });
        }
        Err(err) => {
            let _ = status.send(AttemptStatus::Failed {
                message: err.to_string(),
            });
        }
    }
}
