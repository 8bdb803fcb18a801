use crate::RpcCallError;
use framerpc::Message;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;

/// Decodes the outcome into the caller's reply type and signals completion.
pub(crate) type Resolver = Box<dyn FnOnce(Result<Message, RpcCallError>) + Send>;

/// An in-flight call awaiting its response.
pub(crate) struct PendingCall {
    resolver: Resolver,
    timer: Option<AbortHandle>,
}

impl PendingCall {
    pub(crate) fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            timer: None,
        }
    }

    /// Resolves the call, cancelling its deadline timer if one is armed.
    pub(crate) fn resolve(self, outcome: Result<Message, RpcCallError>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        (self.resolver)(outcome);
    }

    /// Resolves from within the deadline timer itself.
    pub(crate) fn resolve_timed_out(mut self) {
        self.timer = None;
        self.resolve(Err(RpcCallError::Timeout));
    }
}

/// Calls awaiting a response, keyed by sequence number.
///
/// Every removal path (response, timeout, failed send, shutdown) goes through
/// `take` or `drain`, so whichever path removes an entry is the only one that
/// resolves it.
#[derive(Default)]
pub(crate) struct PendingCalls {
    calls: Mutex<HashMap<u64, PendingCall>>,
}

impl PendingCalls {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, PendingCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, seq: u64, call: PendingCall) {
        self.lock().insert(seq, call);
    }

    pub(crate) fn take(&self, seq: u64) -> Option<PendingCall> {
        self.lock().remove(&seq)
    }

    pub(crate) fn drain(&self) -> Vec<PendingCall> {
        self.lock().drain().map(|(_, call)| call).collect()
    }

    /// Attaches a deadline timer to a still-pending call. If the call was
    /// already resolved the timer is aborted instead.
    pub(crate) fn attach_timer(&self, seq: u64, timer: AbortHandle) {
        match self.lock().get_mut(&seq) {
            Some(call) => call.timer = Some(timer),
            None => timer.abort(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
