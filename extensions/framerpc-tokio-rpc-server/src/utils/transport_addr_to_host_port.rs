use framerpc::TransportAddr;
use std::io::{Error, ErrorKind, Result};
use std::net::IpAddr;

/// Extracts the IP address and port from a TCP `TransportAddr`.
///
/// Handy after binding to an ephemeral port, e.g. with the address returned
/// by `RpcServer::local_addr`. Unix-domain and in-memory addresses have no
/// host/port and yield `ErrorKind::InvalidInput`.
pub fn transport_addr_to_host_port(addr: &TransportAddr) -> Result<(IpAddr, u16)> {
    let socket_addr = addr.as_socket_addr().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("{addr} is not a TCP address"),
        )
    })?;

    Ok((socket_addr.ip(), socket_addr.port()))
}
