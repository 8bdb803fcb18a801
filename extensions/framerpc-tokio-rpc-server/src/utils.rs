mod bind_socket_transport_on_random_port;
pub use bind_socket_transport_on_random_port::bind_socket_transport_on_random_port;

mod transport_addr_to_host_port;
pub use transport_addr_to_host_port::transport_addr_to_host_port;
