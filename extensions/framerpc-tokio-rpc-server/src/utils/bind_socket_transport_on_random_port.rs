use framerpc::SocketServerTransport;
use std::io::Result;
use tokio::net::TcpListener;

/// Creates a `SocketServerTransport` listening on a random, available port on
/// the local loopback address (`127.0.0.1`).
///
/// Useful for tests, or whenever a server needs a guaranteed-free port
/// without manual configuration. The returned transport is already
/// listening and can be handed straight to `RpcServer::serve_with`.
pub async fn bind_socket_transport_on_random_port() -> Result<(SocketServerTransport, u16)> {
    // Port 0 lets the OS pick an ephemeral port.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    Ok((SocketServerTransport::from_tcp_listener(listener), port))
}
