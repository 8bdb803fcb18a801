use crate::pending_calls::{PendingCall, PendingCalls, Resolver};
use crate::{Call, CallHandle, CallSender, RpcCallError, completion_queue};
use framerpc::constants::{REQUEST_TIMEOUT_KEY, SERVICE_METHOD_SEPARATOR};
use framerpc::{
    BoxedConnection, Context, Header, Message, MessageType, Metadata, ProtocolType, RpcOptions,
    SocketTransport, Transport, TransportAddr, TransportType,
};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type SharedWriter = Arc<Mutex<Option<WriteHalf<BoxedConnection>>>>;

#[derive(Default)]
struct ClientState {
    /// Set by `close`.
    shutdown: AtomicBool,
    /// Set when the reader loop has exited; the connection is unusable.
    closed: AtomicBool,
}

impl ClientState {
    fn terminal_error(&self) -> RpcCallError {
        if self.shutdown.load(Ordering::SeqCst) {
            RpcCallError::Shutdown
        } else {
            RpcCallError::ConnectionClosed
        }
    }
}

/// Multiplexes concurrent calls over a single connection.
///
/// Each call gets a fresh sequence number and is parked in the pending-call
/// table until the background reader task sees the response carrying the
/// same number. Responses may arrive in any order.
pub struct RpcClient {
    options: RpcOptions,
    writer: SharedWriter,
    pending: Arc<PendingCalls>,
    state: Arc<ClientState>,
    next_seq: AtomicU64,
    reader_task: JoinHandle<()>,
    local_addr: Option<TransportAddr>,
    remote_addr: Option<TransportAddr>,
}

impl RpcClient {
    /// Dials `address` with the transport selected by `options.transport_type`.
    pub async fn connect(network: &str, address: &str, options: RpcOptions) -> io::Result<Self> {
        match options.transport_type {
            TransportType::Socket => {
                Self::connect_with(&SocketTransport, network, address, options).await
            }
        }
    }

    /// Dials `address` with an explicitly supplied transport.
    pub async fn connect_with<T>(
        transport: &T,
        network: &str,
        address: &str,
        options: RpcOptions,
    ) -> io::Result<Self>
    where
        T: Transport + ?Sized,
    {
        let conn = transport.dial(network, address).await?;
        Ok(Self::from_connection(conn, options))
    }

    /// Wraps an established connection and starts the reader task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_connection(conn: BoxedConnection, options: RpcOptions) -> Self {
        let local_addr = conn.local_addr().ok();
        let remote_addr = conn.remote_addr().ok();
        let (reader, writer) = tokio::io::split(conn);

        let pending = Arc::new(PendingCalls::default());
        let state = Arc::new(ClientState::default());

        let reader_task = tokio::spawn(Self::read_loop(
            options.protocol_type,
            reader,
            pending.clone(),
            state.clone(),
        ));

        tracing::debug!(
            "Client connected {:?} -> {:?}",
            local_addr.as_ref().map(ToString::to_string),
            remote_addr.as_ref().map(ToString::to_string)
        );

        RpcClient {
            options,
            writer: Arc::new(Mutex::new(Some(writer))),
            pending,
            state,
            next_seq: AtomicU64::new(1),
            reader_task,
            local_addr,
            remote_addr,
        }
    }

    pub fn options(&self) -> &RpcOptions {
        &self.options
    }

    pub fn local_addr(&self) -> Option<&TransportAddr> {
        self.local_addr.as_ref()
    }

    pub fn remote_addr(&self) -> Option<&TransportAddr> {
        self.remote_addr.as_ref()
    }

    /// Number of calls still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.shutdown.load(Ordering::SeqCst)
    }

    /// Sends a call and returns without waiting for the response.
    ///
    /// The resolved `Call` is delivered on `done`, which may be shared by many
    /// calls. If the effective context has a deadline, the call is resolved
    /// with `RpcCallError::Timeout` when the deadline passes first.
    pub async fn go<A, R>(
        &self,
        ctx: &Context,
        service_method: &str,
        args: &A,
        metadata: Metadata,
        done: CallSender<R>,
    ) -> CallHandle
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let abandon = AbandonGuard::new(&self.pending, seq);
        let handle = self
            .send(seq, ctx, service_method, args, metadata, done)
            .await;
        // From here on the deadline timer owns the entry.
        abandon.disarm();
        if let Some(deadline) = handle.deadline {
            self.arm_deadline_timer(seq, deadline);
        }
        handle
    }

    /// Invokes `service_method` and waits for its reply or the deadline,
    /// whichever comes first.
    pub async fn call<A, R>(
        &self,
        ctx: &Context,
        service_method: &str,
        args: &A,
    ) -> Result<R, RpcCallError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        self.call_with_metadata(ctx, service_method, args, Metadata::new())
            .await
    }

    pub async fn call_with_metadata<A, R>(
        &self,
        ctx: &Context,
        service_method: &str,
        args: &A,
        metadata: Metadata,
    ) -> Result<R, RpcCallError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let (done, mut done_rx) = completion_queue::<R>();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        // Forgets the call if this future is dropped before it resolves.
        let _abandon = AbandonGuard::new(&self.pending, seq);
        let handle = self
            .send(seq, ctx, service_method, args, metadata, done)
            .await;

        let call = match handle.deadline {
            Some(deadline) => tokio::select! {
                call = done_rx.recv() => call,
                _ = tokio::time::sleep_until(deadline) => {
                    // Whoever removes the entry resolves the call. If the
                    // reader got there first, its result is already queued.
                    if self.pending.take(handle.seq).is_some() {
                        tracing::debug!("Call {} ({}) timed out", handle.seq, handle.service_method);
                        return Err(RpcCallError::Timeout);
                    }
                    done_rx.recv().await
                }
            },
            None => done_rx.recv().await,
        };

        match call {
            Some(call) => call.reply,
            None => Err(RpcCallError::ConnectionClosed),
        }
    }

    /// Shuts the client down.
    ///
    /// Closes the write side of the connection, stops the reader task and
    /// resolves every pending call with `RpcCallError::Shutdown`.
    pub async fn close(&self) -> Result<(), RpcCallError> {
        if self.state.shutdown.swap(true, Ordering::SeqCst) {
            return Err(RpcCallError::Shutdown);
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(err) = writer.shutdown().await {
                tracing::debug!("Error shutting down connection: {}", err);
            }
        }
        self.reader_task.abort();

        for call in self.pending.drain() {
            call.resolve(Err(RpcCallError::Shutdown));
        }

        Ok(())
    }

    async fn send<A, R>(
        &self,
        seq: u64,
        ctx: &Context,
        service_method: &str,
        args: &A,
        mut metadata: Metadata,
        done: CallSender<R>,
    ) -> CallHandle
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let ctx = match self.options.request_timeout {
            timeout if timeout.is_zero() => *ctx,
            timeout => {
                metadata.insert(
                    REQUEST_TIMEOUT_KEY.to_string(),
                    timeout.as_millis().to_string(),
                );
                ctx.child_with_timeout(timeout)
            }
        };

        let handle = CallHandle {
            seq,
            service_method: service_method.to_string(),
            deadline: ctx.deadline(),
        };
        let resolver = Self::resolver(seq, service_method.to_string(), done);

        if self.state.shutdown.load(Ordering::SeqCst) {
            resolver(Err(RpcCallError::Shutdown));
            return handle;
        }

        let Some((service_name, method_name)) = split_service_method(service_method) else {
            resolver(Err(RpcCallError::InvalidServiceMethod(
                service_method.to_string(),
            )));
            return handle;
        };

        // Registered before anything is written so a fast response can never
        // arrive for an unknown sequence number.
        self.pending.insert(seq, PendingCall::new(resolver));

        if self.state.closed.load(Ordering::SeqCst) {
            self.fail(seq, self.state.terminal_error());
            return handle;
        }

        let data = match self.options.serialize_type.encode(args) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("Failed to encode arguments for {}: {}", service_method, err);
                self.fail(seq, err.into());
                return handle;
            }
        };

        let request = Message::new(
            Header {
                seq,
                message_type: MessageType::Request,
                compress_type: self.options.compress_type,
                serialize_type: self.options.serialize_type,
                service_name: service_name.to_string(),
                method_name: method_name.to_string(),
                metadata,
                ..Header::default()
            },
            data,
        );

        let frame = match self.options.protocol_type.encode_message(&request) {
            Ok(frame) => frame,
            Err(err) => {
                self.fail(seq, err.into());
                return handle;
            }
        };

        // Waiting for the writer and writing both count against the deadline.
        {
            let Some(mut writer) = until(handle.deadline, self.writer.lock()).await else {
                tracing::debug!("Call {} ({}) timed out waiting to send", seq, service_method);
                self.fail(seq, RpcCallError::Timeout);
                return handle;
            };
            let Some(stream) = writer.as_mut() else {
                self.fail(seq, self.state.terminal_error());
                return handle;
            };

            let written = until(handle.deadline, stream.write_all(&frame)).await;
            match written {
                Some(Ok(())) => {}
                Some(Err(err)) => {
                    tracing::error!("Failed to send call {} ({}): {}", seq, service_method, err);
                    self.fail(seq, err.into());
                    return handle;
                }
                None => {
                    // Part of the frame may already be on the wire, so the
                    // stream cannot carry further requests.
                    tracing::warn!(
                        "Call {} ({}) timed out while sending; closing the write side",
                        seq,
                        service_method
                    );
                    *writer = None;
                    self.fail(seq, RpcCallError::Timeout);
                    return handle;
                }
            }
        }

        tracing::trace!("Sent call {} ({}, {} bytes)", seq, service_method, frame.len());

        handle
    }

    /// Resolves `seq` with `RpcCallError::Timeout` at `deadline` unless a
    /// response gets there first.
    fn arm_deadline_timer(&self, seq: u64, deadline: Instant) {
        let pending = self.pending.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(call) = pending.take(seq) {
                tracing::debug!("Call {} timed out", seq);
                call.resolve_timed_out();
            }
        });
        self.pending.attach_timer(seq, timer.abort_handle());
    }

    /// Resolves `seq` with `err` if it is still pending.
    fn fail(&self, seq: u64, err: RpcCallError) {
        if let Some(call) = self.pending.take(seq) {
            call.resolve(Err(err));
        }
    }

    fn resolver<R>(seq: u64, service_method: String, done: CallSender<R>) -> Resolver
    where
        R: DeserializeOwned + Send + 'static,
    {
        Box::new(move |outcome: Result<Message, RpcCallError>| {
            let reply = outcome.and_then(decode_reply::<R>);
            // The receiver may already be gone (e.g. the caller stopped waiting).
            let _ = done.send(Call {
                seq,
                service_method,
                reply,
            });
        })
    }

    /// Reads responses until the connection ends, then fails every call still
    /// waiting so none of them hangs.
    async fn read_loop(
        protocol: ProtocolType,
        mut reader: ReadHalf<BoxedConnection>,
        pending: Arc<PendingCalls>,
        state: Arc<ClientState>,
    ) {
        loop {
            match protocol.decode_message(&mut reader).await {
                Ok(Some(message)) => {
                    if message.header.message_type != MessageType::Response {
                        tracing::debug!("Ignoring non-response frame {}", message.header.seq);
                        continue;
                    }
                    match pending.take(message.header.seq) {
                        Some(call) => call.resolve(Ok(message)),
                        None => tracing::debug!(
                            "Dropping response for unknown call {} ({})",
                            message.header.seq,
                            message.header.service_method()
                        ),
                    }
                }
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(err) => {
                    tracing::warn!("Failed to read response: {}", err);
                    break;
                }
            }
        }

        state.closed.store(true, Ordering::SeqCst);
        for call in pending.drain() {
            call.resolve(Err(state.terminal_error()));
        }
    }
}

/// Removes a call's pending entry when the awaiting future goes away.
struct AbandonGuard<'a> {
    pending: &'a PendingCalls,
    seq: u64,
    armed: bool,
}

impl<'a> AbandonGuard<'a> {
    fn new(pending: &'a PendingCalls, seq: u64) -> Self {
        Self {
            pending,
            seq,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.pending.take(self.seq).is_some() {
            tracing::debug!("Call {} abandoned by its caller", self.seq);
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Runs `future` to completion, or gives up at `deadline` if there is one.
async fn until<F>(deadline: Option<Instant>, future: F) -> Option<F::Output>
where
    F: Future,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

fn split_service_method(service_method: &str) -> Option<(&str, &str)> {
    match service_method.split_once(SERVICE_METHOD_SEPARATOR) {
        Some((service, method)) if !service.is_empty() && !method.is_empty() => {
            Some((service, method))
        }
        _ => None,
    }
}

fn decode_reply<R>(message: Message) -> Result<R, RpcCallError>
where
    R: DeserializeOwned,
{
    if message.header.is_error() {
        return Err(RpcCallError::Remote(message.header.error));
    }

    message
        .header
        .serialize_type
        .decode(&message.data)
        .map_err(RpcCallError::from)
}
