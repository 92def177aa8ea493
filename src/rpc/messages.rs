//! The RPC method table: one request variant and one response variant per
//! method, in the method-name + argument-struct + result-struct convention.
//!
//! Grounded on `distributed_p2p.rs`'s `MessageType`/`P2PMessage` shape
//! (a tagged enum carried whole over the wire) rather than a per-method
//! trait, since every call here is a single request/response round trip.

use crate::error::{TpcError, TpcResult};
use crate::identity::{NodeAddress, NodeKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
}

impl Operation {
    pub fn parse(s: &str) -> TpcResult<Self> {
        match s {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            other => Err(TpcError::UnknownOperation(other.to_string())),
        }
    }

    pub fn apply(&self, balance: f64, amount: f64) -> f64 {
        match self {
            Operation::Add => balance + amount,
            Operation::Subtract => balance - amount,
            Operation::Multiply => balance * amount,
        }
    }
}

/// One leg of a multi-party transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLeg {
    pub target_name: String,
    pub target_address: NodeAddress,
    pub operation: Operation,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Commit,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RpcRequest {
    Ping,
    HealthCheck,
    GetInfo,
    AddParticipant {
        name: String,
        address: NodeAddress,
    },
    ListParticipants,
    GetBalance,
    Deposit {
        amount: f64,
    },
    Withdraw {
        amount: f64,
    },
    ClientParticipantTransaction {
        legs: Vec<TransactionLeg>,
    },
    ParticipantCoordinatorTransaction {
        legs: Vec<TransactionLeg>,
    },
    ReceivePrepare {
        tid: Uuid,
        amount: f64,
        operation: Operation,
        legs: Vec<TransactionLeg>,
    },
    ReceiveCommit {
        tid: Uuid,
    },
    ReceiveAbort {
        tid: Uuid,
    },
    P2PQueryTransactionStatus {
        tid: Uuid,
        requester_address: NodeAddress,
    },
    SimulateDelay {
        sleep_before: bool,
        sleep_after: bool,
    },
}

impl RpcRequest {
    /// Method name, used only for log/tracing context.
    pub fn method_name(&self) -> &'static str {
        match self {
            RpcRequest::Ping => "Ping",
            RpcRequest::HealthCheck => "HealthCheck",
            RpcRequest::GetInfo => "GetInfo",
            RpcRequest::AddParticipant { .. } => "AddParticipant",
            RpcRequest::ListParticipants => "ListParticipants",
            RpcRequest::GetBalance => "GetBalance",
            RpcRequest::Deposit { .. } => "Deposit",
            RpcRequest::Withdraw { .. } => "Withdraw",
            RpcRequest::ClientParticipantTransaction { .. } => "ClientParticipantTransaction",
            RpcRequest::ParticipantCoordinatorTransaction { .. } => {
                "ParticipantCoordinatorTransaction"
            }
            RpcRequest::ReceivePrepare { .. } => "ReceivePrepare",
            RpcRequest::ReceiveCommit { .. } => "ReceiveCommit",
            RpcRequest::ReceiveAbort { .. } => "ReceiveAbort",
            RpcRequest::P2PQueryTransactionStatus { .. } => "P2PQueryTransactionStatus",
            RpcRequest::SimulateDelay { .. } => "SimulateDelay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RpcResponse {
    Pong { message: String, name: String },
    Health { status: String },
    Info { name: String, address: NodeAddress, kind: NodeKind },
    Unit,
    Participants { names: Vec<String>, addresses: Vec<NodeAddress> },
    Balance { balance: f64 },
    DepositResult { success: bool, message: String },
    Prepared { vote: Vote },
}
