//! Note: This `RpcServer` does not include authentication or authorization
//! mechanisms. It is best suited for trusted, internal network communication.

use crate::error::{DispatchError, RegisterError, RpcServerError};
use crate::service::{MethodHandler, Service};
use framerpc::constants::REQUEST_TIMEOUT_KEY;
use framerpc::{
    BoxedConnection, Context, Header, Message, MessageType, ProtocolType, RpcOptions,
    ServerTransport, SocketServerTransport, TransportAddr,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::watch;

type ServiceMap = Arc<RwLock<HashMap<String, Arc<Service>>>>;

/// A type alias for the write half of a connection, shared by every request
/// task on that connection so whole frames are written one at a time.
type SharedWriter = Arc<tokio::sync::Mutex<WriteHalf<BoxedConnection>>>;

/// Accepts connections and dispatches each request to a registered service.
pub struct RpcServer {
    options: RpcOptions,
    services: ServiceMap,
    shutdown: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    local_addr: Mutex<Option<TransportAddr>>,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcServer {
    pub fn new() -> Self {
        Self::with_options(RpcOptions::default())
    }

    pub fn with_options(options: RpcOptions) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        RpcServer {
            options,
            services: Arc::new(RwLock::new(HashMap::new())),
            shutdown: AtomicBool::new(false),
            shutdown_tx,
            local_addr: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &RpcOptions {
        &self.options
    }

    /// Publishes a service under its name.
    ///
    /// # Arguments
    ///
    /// * `service` - The service built with `ServiceBuilder`.
    /// * `metadata` - Free-form text stored alongside the service.
    ///
    /// # Returns
    ///
    /// `RegisterError::NoMethods` for a service without methods, or
    /// `RegisterError::AlreadyRegistered` if the name is taken.
    pub fn register(
        &self,
        mut service: Service,
        metadata: impl Into<String>,
    ) -> Result<(), RegisterError> {
        if !service.has_methods() {
            return Err(RegisterError::NoMethods(service.name().to_string()));
        }

        let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
        if services.contains_key(service.name()) {
            return Err(RegisterError::AlreadyRegistered(service.name().to_string()));
        }

        service.set_metadata(metadata.into());
        tracing::info!(
            "Registered service {} ({} methods)",
            service.name(),
            service.method_names().count()
        );
        services.insert(service.name().to_string(), Arc::new(service));
        Ok(())
    }

    /// Listens on `address` over a TCP or Unix-domain socket and serves until
    /// `close` is called.
    ///
    /// The network can be `tcp`, `tcp4`, `tcp6` or `unix`.
    pub async fn serve(&self, network: &str, address: &str) -> Result<(), RpcServerError> {
        let mut transport = SocketServerTransport::new();
        transport.listen(network, address).await?;
        self.serve_with(transport).await
    }

    /// Runs the accept loop on an already listening transport.
    ///
    /// This is useful for cases like binding to an ephemeral port (port 0)
    /// and then retrieving the actual address, or for in-memory transports.
    pub async fn serve_with<T>(&self, mut transport: T) -> Result<(), RpcServerError>
    where
        T: ServerTransport,
    {
        // Subscribe before checking the flag so a concurrent `close` is never missed.
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.is_shutdown() {
            let _ = transport.close();
            return Err(RpcServerError::Shutdown);
        }

        let address = transport.local_addr()?;
        tracing::info!("Server running on {}", address);
        *self.lock_local_addr() = Some(address);

        let outcome = loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break Ok(()),
                accepted = transport.accept() => match accepted {
                    Ok(conn) => self.serve_connection(conn),
                    Err(_) if self.is_shutdown() => break Ok(()),
                    Err(err) => {
                        tracing::error!("Accept failed: {}", err);
                        break Err(RpcServerError::Io(err));
                    }
                },
            }
        };

        if let Err(err) = transport.close() {
            tracing::debug!("Error closing listener: {}", err);
        }
        tracing::info!("Server stopped accepting connections");
        outcome
    }

    /// Serves a single, already established connection on a new task.
    ///
    /// Once the server is closed the connection is dropped unserved.
    pub fn serve_connection(&self, conn: BoxedConnection) {
        let peer = conn
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());

        let shutdown_rx = self.shutdown_tx.subscribe();
        if self.is_shutdown() {
            tracing::info!("Rejected connection from {} (server shut down)", peer);
            return;
        }
        tracing::info!("Client connected: {}", peer);

        let (reader, writer) = tokio::io::split(conn);

        tokio::spawn(Self::connection_task(
            self.options.protocol_type,
            self.services.clone(),
            reader,
            Arc::new(tokio::sync::Mutex::new(writer)),
            shutdown_rx,
            peer,
        ));
    }

    /// Stops accepting connections, ends every connection loop and empties
    /// the registry.
    pub fn close(&self) -> Result<(), RpcServerError> {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return Err(RpcServerError::Shutdown);
        }

        self.shutdown_tx.send_replace(true);
        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("Server closed");
        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Address of the listener, once `serve` or `serve_with` has started.
    pub fn local_addr(&self) -> Option<TransportAddr> {
        self.lock_local_addr().clone()
    }

    fn lock_local_addr(&self) -> std::sync::MutexGuard<'_, Option<TransportAddr>> {
        self.local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads requests from one connection until it ends or the server closes.
    ///
    /// Each request is dispatched on its own task, so a slow method never
    /// holds up later requests on the same connection. Responses are written
    /// as they complete and may therefore arrive out of order.
    async fn connection_task(
        protocol: ProtocolType,
        services: ServiceMap,
        mut reader: ReadHalf<BoxedConnection>,
        writer: SharedWriter,
        mut shutdown_rx: watch::Receiver<bool>,
        peer: String,
    ) {
        loop {
            let decoded = tokio::select! {
                _ = shutdown_rx.changed() => {
                    tracing::info!("Closing connection to {} (server shut down)", peer);
                    break;
                }
                decoded = protocol.decode_message(&mut reader) => decoded,
            };

            match decoded {
                Ok(Some(request)) => {
                    if request.header.message_type != MessageType::Request {
                        tracing::debug!(
                            "Ignoring non-request frame {} from {}",
                            request.header.seq,
                            peer
                        );
                        continue;
                    }
                    tokio::spawn(Self::handle_request(
                        protocol,
                        services.clone(),
                        writer.clone(),
                        request,
                    ));
                }
                Ok(None) => {
                    tracing::info!("Client {} disconnected.", peer);
                    break;
                }
                Err(err) => {
                    tracing::warn!("Failed to read request from {}: {}", peer, err);
                    break;
                }
            }
        }

        // Shut down our side once in-flight requests no longer need it.
        if let Some(writer) = Arc::into_inner(writer) {
            if let Err(err) = writer.into_inner().shutdown().await {
                tracing::debug!("Error shutting down connection to {}: {}", peer, err);
            }
        }
        tracing::info!("Terminated connection for {}.", peer);
    }

    async fn handle_request(
        protocol: ProtocolType,
        services: ServiceMap,
        writer: SharedWriter,
        request: Message,
    ) {
        let header = &request.header;
        tracing::debug!("Dispatching call {} ({})", header.seq, header.service_method());
        if let Some(timeout) = header.metadata.get(REQUEST_TIMEOUT_KEY) {
            tracing::trace!("Call {} advises a {}ms timeout", header.seq, timeout);
        }

        let response = request.to_response();
        let outcome = match find_method(&services, &request.header) {
            Ok(handler) => {
                handler(
                    Context::background(),
                    request.header.serialize_type,
                    request.data,
                )
                .await
            }
            Err(err) => Err(err),
        };

        let response = match outcome {
            Ok(data) => response.with_data(data),
            Err(err) => {
                tracing::debug!("Call {} failed: {}", response.header.seq, err);
                response.with_error(err.to_string())
            }
        };

        let frame = match protocol.encode_message(&response) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("Failed to encode response {}: {}", response.header.seq, err);
                let fallback = response.with_error(format!("rpc-server: {err}"));
                match protocol.encode_message(&fallback) {
                    Ok(frame) => frame,
                    Err(_) => return,
                }
            }
        };

        let mut writer = writer.lock().await;
        if let Err(err) = writer.write_all(&frame).await {
            tracing::error!("Failed to write response: {}", err);
        }
    }
}

fn find_method(services: &ServiceMap, header: &Header) -> Result<MethodHandler, DispatchError> {
    let services = services.read().unwrap_or_else(PoisonError::into_inner);

    let service = services
        .get(&header.service_name)
        .ok_or_else(|| DispatchError::UnknownService(header.service_name.clone()))?;

    service
        .handler(&header.method_name)
        .ok_or_else(|| DispatchError::UnknownMethod(header.method_name.clone()))
}
