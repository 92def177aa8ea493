//! A pedagogical two-phase-commit engine: a coordinator, a statically known
//! cohort of balance-holding participants, and the client-facing operations
//! that drive transfers across them.
//!
//! # Architecture
//!
//! - Identity: stable `(type, name, address)` triples (`identity`)
//! - Balance store: durable per-participant scalar (`balance`)
//! - Transaction log: append-only phase-transition record (`txnlog`)
//! - RPC fabric: length-prefixed bincode frames over TCP (`rpc`)
//! - Coordinator: transaction-ID minting, prepare/decide/broadcast (`coordinator`)
//! - Participant: promised-commit state machine, crash hooks (`participant`)
//! - Recovery: peer-polling monitor for a silent coordinator (`recovery`)
//! - Node: ties identity + role together behind the RPC dispatch table (`node`)
//! - Config: `nodes.txt` bootstrap file (`config`)

pub mod balance;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod identity;
pub mod node;
pub mod participant;
pub mod recovery;
pub mod rpc;
pub mod txnlog;

pub use balance::BalanceStore;
pub use config::{read_nodes_file, write_nodes_file, NodeEntry};
pub use coordinator::CoordinatorState;
pub use error::{TpcError, TpcResult};
pub use identity::{NodeAddress, NodeIdentity, NodeKind};
pub use node::{Node, Role};
pub use participant::ParticipantState;
pub use rpc::{Operation, RpcRequest, RpcResponse, TransactionLeg, Vote};
pub use txnlog::{Phase, TransactionLog};
