//! Outbound RPC calls: dial, send one request frame, read one reply frame,
//! close. One TCP connection per call, matching the original's
//! `Dial`-per-call recovery queries and the coordinator's per-leg calls.

use super::codec::{read_frame, write_frame};
use super::messages::{RpcRequest, RpcResponse};
use crate::error::{from_wire, TpcError, TpcResult, WireResult};
use crate::identity::NodeAddress;
use std::time::Duration;
use tokio::net::TcpStream;

pub async fn call(address: &NodeAddress, request: RpcRequest) -> TpcResult<RpcResponse> {
    let method = request.method_name();
    let mut stream = TcpStream::connect(address.to_socket_string())
        .await
        .map_err(|e| TpcError::Transport(format!("dial {address} for {method}: {e}")))?;
    write_frame(&mut stream, &request).await?;
    let wire: WireResult<RpcResponse> = read_frame(&mut stream).await?;
    from_wire(wire)
}

pub async fn call_with_timeout(
    address: &NodeAddress,
    request: RpcRequest,
    timeout: Duration,
) -> TpcResult<RpcResponse> {
    match tokio::time::timeout(timeout, call(address, request)).await {
        Ok(result) => result,
        Err(_) => Err(TpcError::Timeout),
    }
}
