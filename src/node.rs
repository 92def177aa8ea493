//! Shared node lifecycle: construction, `node_data/` bootstrap, and request
//! dispatch across the full RPC method table.
//!
//! Grounded on `node/node.go` (the `Node` struct's `Ping`/`HealthCheck`/
//! `Start` responsibilities) and `distributed_topology.rs`'s `NodeInfo` for
//! the identity payload shape.

use crate::balance::BalanceStore;
use crate::coordinator::CoordinatorState;
use crate::error::{TpcError, TpcResult};
use crate::identity::{NodeAddress, NodeIdentity, NodeKind};
use crate::participant::ParticipantState;
use crate::rpc::{RpcRequest, RpcResponse};
use crate::txnlog::TransactionLog;
use std::path::Path;
use std::sync::Arc;

pub enum Role {
    Coordinator(CoordinatorState),
    Participant(Arc<ParticipantState>),
}

pub struct Node {
    pub identity: NodeIdentity,
    pub role: Role,
}

impl Node {
    pub fn new_coordinator(name: impl Into<String>, address: NodeAddress, data_dir: &Path) -> TpcResult<Arc<Node>> {
        let identity = NodeIdentity::new(NodeKind::Coordinator, name, address);
        let log = TransactionLog::open(data_dir.join(format!("{}.log", identity.file_stem())))?;
        Ok(Arc::new(Node {
            identity,
            role: Role::Coordinator(CoordinatorState::new(log)),
        }))
    }

    pub fn new_participant(
        name: impl Into<String>,
        address: NodeAddress,
        coordinator_address: NodeAddress,
        data_dir: &Path,
    ) -> TpcResult<Arc<Node>> {
        let identity = NodeIdentity::new(NodeKind::Participant, name, address.clone());
        let stem = identity.file_stem();
        let balances = BalanceStore::new(data_dir.join(format!("{stem}.data")));
        let log = TransactionLog::open(data_dir.join(format!("{stem}.log")))?;
        let state = ParticipantState::new(
            identity.name.clone(),
            address,
            coordinator_address,
            balances,
            log,
        );
        Ok(Arc::new(Node {
            identity,
            role: Role::Participant(Arc::new(state)),
        }))
    }

    fn as_coordinator(&self) -> TpcResult<&CoordinatorState> {
        match &self.role {
            Role::Coordinator(c) => Ok(c),
            Role::Participant(_) => Err(TpcError::NotCoordinator),
        }
    }

    fn as_participant(&self) -> TpcResult<&Arc<ParticipantState>> {
        match &self.role {
            Role::Participant(p) => Ok(p),
            Role::Coordinator(_) => Err(TpcError::NotParticipant),
        }
    }

    pub async fn dispatch(&self, request: RpcRequest) -> TpcResult<RpcResponse> {
        match request {
            RpcRequest::Ping => Ok(RpcResponse::Pong {
                message: "pong".to_string(),
                name: self.identity.name.clone(),
            }),
            RpcRequest::HealthCheck => Ok(RpcResponse::Health {
                status: "OK".to_string(),
            }),
            RpcRequest::GetInfo => Ok(RpcResponse::Info {
                name: self.identity.name.clone(),
                address: self.identity.address.clone(),
                kind: self.identity.kind,
            }),
            RpcRequest::AddParticipant { name, address } => {
                self.as_coordinator()?.add_participant(name, address)
            }
            RpcRequest::ListParticipants => match &self.role {
                Role::Coordinator(c) => c.list_participants(),
                Role::Participant(p) => p.list_participants().await,
            },
            RpcRequest::GetBalance => self.as_participant()?.get_balance(),
            RpcRequest::Deposit { amount } => self.as_participant()?.deposit(amount),
            RpcRequest::Withdraw { amount } => self.as_participant()?.withdraw(amount),
            RpcRequest::ClientParticipantTransaction { legs } => {
                self.as_participant()?.client_transaction(legs).await
            }
            RpcRequest::ParticipantCoordinatorTransaction { legs } => {
                self.as_coordinator()?.run_transaction(legs).await
            }
            RpcRequest::ReceivePrepare {
                tid,
                amount,
                operation,
                legs,
            } => {
                self.as_participant()?
                    .receive_prepare(tid, amount, operation, legs)
                    .await
            }
            RpcRequest::ReceiveCommit { tid } => self.as_participant()?.receive_commit(tid).await,
            RpcRequest::ReceiveAbort { tid } => self.as_participant()?.receive_abort(tid).await,
            RpcRequest::P2PQueryTransactionStatus { tid, requester_address } => {
                self.as_participant()?
                    .handle_peer_query(tid, requester_address)
                    .await
            }
            RpcRequest::SimulateDelay {
                sleep_before,
                sleep_after,
            } => self.as_participant()?.simulate_delay(sleep_before, sleep_after),
        }
    }
}
