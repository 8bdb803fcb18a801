pub mod error;
pub use error::{RegisterError, RpcServerError};

mod rpc_server;
pub use rpc_server::RpcServer;

mod service;
pub use service::{Service, ServiceBuilder, ServiceError};

pub mod utils;
