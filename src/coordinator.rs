//! Coordinator commit driver: transaction-ID minting, prepare phase, vote
//! tally, decide, and broadcast.
//!
//! Grounded on `distributed_2pc.rs`'s `TwoPhaseCommitCoordinator` for the
//! module shape and `2pc_coordinator.go`'s exact sequencing (serial prepare,
//! write-ahead decision, best-effort broadcast).

use crate::error::{TpcError, TpcResult};
use crate::identity::NodeAddress;
use crate::rpc::{client, RpcRequest, RpcResponse, TransactionLeg, Vote};
use crate::txnlog::{Phase, TransactionLog};
use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

const PREPARE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CoordinatorState {
    /// Participant name -> address. The coordinator dials fresh per call
    /// rather than holding a persistent socket, matching the connection
    /// discipline used for every other RPC in this crate.
    cohort: RwLock<std::collections::HashMap<String, NodeAddress>>,
    log: TransactionLog,
}

impl CoordinatorState {
    pub fn new(log: TransactionLog) -> Self {
        CoordinatorState {
            cohort: RwLock::new(std::collections::HashMap::new()),
            log,
        }
    }

    /// A duplicate name silently replaces the prior entry; this is a
    /// documented sharp edge, not a bug.
    pub fn add_participant(&self, name: String, address: NodeAddress) -> TpcResult<RpcResponse> {
        self.cohort.write().unwrap().insert(name, address);
        Ok(RpcResponse::Unit)
    }

    pub fn list_participants(&self) -> TpcResult<RpcResponse> {
        let cohort = self.cohort.read().unwrap();
        let (names, addresses) = cohort.iter().map(|(n, a)| (n.clone(), a.clone())).unzip();
        Ok(RpcResponse::Participants { names, addresses })
    }

    pub async fn run_transaction(&self, legs: Vec<TransactionLeg>) -> TpcResult<RpcResponse> {
        let mut seen = HashSet::new();
        for leg in &legs {
            if !seen.insert(leg.target_name.clone()) {
                return Err(TpcError::SelfCollision);
            }
        }

        let tid = Uuid::new_v4();
        self.log.append(tid, Phase::Prepare)?;

        let mut failures: Vec<(String, String)> = Vec::new();
        for leg in &legs {
            let request = RpcRequest::ReceivePrepare {
                tid,
                amount: leg.amount,
                operation: leg.operation,
                legs: legs.clone(),
            };
            match client::call_with_timeout(&leg.target_address, request, PREPARE_TIMEOUT).await {
                Ok(RpcResponse::Prepared { vote: Vote::Commit }) => {}
                Ok(RpcResponse::Prepared { vote: Vote::Abort }) => {
                    failures.push((leg.target_name.clone(), "already promised or infeasible".into()));
                }
                Ok(_) => failures.push((leg.target_name.clone(), "invalid prepare response".into())),
                Err(e) => failures.push((leg.target_name.clone(), e.to_string())),
            }
        }

        if failures.is_empty() {
            self.log.append(tid, Phase::Commit)?;
            self.broadcast(&legs, tid, true).await;
            Ok(RpcResponse::Unit)
        } else {
            self.log.append(tid, Phase::Abort)?;
            self.broadcast(&legs, tid, false).await;
            let detail = failures
                .iter()
                .map(|(name, reason)| format!("{name}: {reason}"))
                .collect::<Vec<_>>()
                .join("; ");
            Err(TpcError::Aggregate(failures.len(), detail))
        }
    }

    /// Sequential, best-effort: errors are logged but never change the
    /// decision already recorded in `self.log`.
    async fn broadcast(&self, legs: &[TransactionLeg], tid: Uuid, commit: bool) {
        for leg in legs {
            let request = if commit {
                RpcRequest::ReceiveCommit { tid }
            } else {
                RpcRequest::ReceiveAbort { tid }
            };
            if let Err(e) = client::call(&leg.target_address, request).await {
                tracing::warn!(peer = %leg.target_name, %tid, error = %e, "decision broadcast failed, leaving recovery to the peer monitor");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(name: &str) -> TransactionLeg {
        TransactionLeg {
            target_name: name.to_string(),
            target_address: NodeAddress::new("127.0.0.1", 0),
            operation: crate::rpc::Operation::Add,
            amount: 1.0,
        }
    }

    #[tokio::test]
    async fn self_collision_is_rejected_before_minting_a_tid() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = CoordinatorState::new(
            TransactionLog::open(dir.path().join("Coordinator.log")).unwrap(),
        );
        let err = state
            .run_transaction(vec![leg("A"), leg("A")])
            .await
            .unwrap_err();
        assert!(matches!(err, TpcError::SelfCollision));
    }

    #[test]
    fn add_participant_then_list_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = CoordinatorState::new(
            TransactionLog::open(dir.path().join("Coordinator.log")).unwrap(),
        );
        state
            .add_participant("A".into(), NodeAddress::new("127.0.0.1", 9001))
            .unwrap();
        match state.list_participants().unwrap() {
            RpcResponse::Participants { names, addresses } => {
                assert_eq!(names, vec!["A".to_string()]);
                assert_eq!(addresses, vec![NodeAddress::new("127.0.0.1", 9001)]);
            }
            _ => panic!("expected Participants"),
        }
    }
}
