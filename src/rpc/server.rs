//! Inbound RPC server: accept loop plus a per-connection task, dispatching
//! each request straight to the owning [`crate::node::Node`].
//!
//! Grounded on `distributed_p2p.rs`'s `start_listener` (accept loop spawning
//! a read loop per connection) and the original's per-request goroutine.

use super::codec::{read_frame, write_frame};
use super::messages::RpcResponse;
use crate::error::{to_wire, TpcResult, WireResult};
use crate::node::Node;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

pub async fn serve(listener: TcpListener, node: Arc<Node>) -> TpcResult<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let node = node.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, node).await {
                tracing::warn!(%peer, error = %e, "rpc connection error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, node: Arc<Node>) -> TpcResult<()> {
    let peer = stream.peer_addr().ok();
    let request = read_frame(&mut stream).await?;
    let method = request.method_name();
    tracing::debug!(method, ?peer, "handling rpc");
    let result = node.dispatch(request).await;
    if let Err(e) = &result {
        tracing::warn!(method, error = %e, "rpc handler returned an error");
    }
    let wire: WireResult<RpcResponse> = to_wire(result);
    write_frame(&mut stream, &wire).await
}
