use crate::RpcCallError;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A resolved call, delivered exactly once on its completion queue.
#[derive(Debug)]
pub struct Call<R> {
    pub seq: u64,
    pub service_method: String,
    pub reply: Result<R, RpcCallError>,
}

/// Returned by `RpcClient::go`; identifies the `Call` that will later arrive
/// on the completion queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHandle {
    pub seq: u64,
    pub service_method: String,
    pub deadline: Option<Instant>,
}

pub type CallSender<R> = mpsc::UnboundedSender<Call<R>>;
pub type CallReceiver<R> = mpsc::UnboundedReceiver<Call<R>>;

/// Creates a completion queue that can be shared by any number of calls with
/// the same reply type.
pub fn completion_queue<R>() -> (CallSender<R>, CallReceiver<R>) {
    mpsc::unbounded_channel()
}
