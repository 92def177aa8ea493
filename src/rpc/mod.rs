pub mod client;
pub mod codec;
pub mod messages;
pub mod server;

pub use messages::{Operation, RpcRequest, RpcResponse, TransactionLeg, Vote};
