mod call;
pub use call::*;

pub mod error;
pub use error::RpcCallError;

mod pending_calls;

mod rpc_client;
pub use rpc_client::RpcClient;
