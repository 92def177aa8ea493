//! Participant commit state machine: Idle/Promised transitions, the
//! single-flight `promisedCommit` lock, crash-simulation hooks, and the
//! recovery-monitor lifecycle.
//!
//! Grounded on `distributed_2pc.rs`'s `TwoPhaseCommitParticipant`
//! (prepare/commit/abort split) and `2pc_participant.go`'s exact vote and
//! feasibility semantics.

use crate::balance::BalanceStore;
use crate::error::{TpcError, TpcResult};
use crate::identity::NodeAddress;
use crate::recovery;
use crate::rpc::client;
use crate::rpc::{Operation, RpcRequest, RpcResponse, TransactionLeg, Vote};
use crate::txnlog::{Phase, TransactionLog};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

/// `promisedCommit` plus the precomputed post-commit balance it guards.
struct CommitLock {
    tid: Option<Uuid>,
    new_balance: Option<f64>,
    legs: Vec<TransactionLeg>,
}

impl CommitLock {
    fn idle() -> Self {
        CommitLock {
            tid: None,
            new_balance: None,
            legs: Vec::new(),
        }
    }

    fn is_promised(&self) -> bool {
        self.tid.is_some()
    }
}

/// One-shot crash-simulation request, consumed by the next `ReceivePrepare`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PendingDelay {
    None,
    Before,
    After,
}

pub struct ParticipantState {
    pub name: String,
    pub address: NodeAddress,
    pub coordinator_address: NodeAddress,
    pub balances: BalanceStore,
    pub log: TransactionLog,
    commit: Mutex<CommitLock>,
    pub reject_incoming: AtomicBool,
    pending_delay: Mutex<PendingDelay>,
    recovery_cancel: Mutex<Option<oneshot::Sender<()>>>,
}

const SIMULATED_CRASH_DELAY: std::time::Duration = std::time::Duration::from_secs(10);

impl ParticipantState {
    pub fn new(
        name: String,
        address: NodeAddress,
        coordinator_address: NodeAddress,
        balances: BalanceStore,
        log: TransactionLog,
    ) -> Self {
        ParticipantState {
            name,
            address,
            coordinator_address,
            balances,
            log,
            commit: Mutex::new(CommitLock::idle()),
            reject_incoming: AtomicBool::new(false),
            pending_delay: Mutex::new(PendingDelay::None),
            recovery_cancel: Mutex::new(None),
        }
    }

    pub fn get_balance(&self) -> TpcResult<RpcResponse> {
        Ok(RpcResponse::Balance {
            balance: self.balances.read()?,
        })
    }

    pub fn deposit(&self, amount: f64) -> TpcResult<RpcResponse> {
        match self.balances.deposit(amount) {
            Ok(_) => Ok(RpcResponse::DepositResult {
                success: true,
                message: "ok".to_string(),
            }),
            Err(e) => Ok(RpcResponse::DepositResult {
                success: false,
                message: e.to_string(),
            }),
        }
    }

    pub fn withdraw(&self, amount: f64) -> TpcResult<RpcResponse> {
        self.balances.withdraw(amount)?;
        Ok(RpcResponse::Unit)
    }

    /// Forwards a client-submitted transaction to the coordinator.
    pub async fn client_transaction(&self, legs: Vec<TransactionLeg>) -> TpcResult<RpcResponse> {
        client::call(
            &self.coordinator_address,
            RpcRequest::ParticipantCoordinatorTransaction { legs },
        )
        .await
    }

    pub async fn list_participants(&self) -> TpcResult<RpcResponse> {
        client::call(&self.coordinator_address, RpcRequest::ListParticipants).await
    }

    /// One-shot: the next `ReceivePrepare` consumes this mode.
    pub fn simulate_delay(&self, sleep_before: bool, sleep_after: bool) -> TpcResult<RpcResponse> {
        let mode = if sleep_before {
            PendingDelay::Before
        } else if sleep_after {
            PendingDelay::After
        } else {
            PendingDelay::None
        };
        *self.pending_delay.lock().unwrap() = mode;
        Ok(RpcResponse::Unit)
    }

    pub async fn receive_prepare(
        self: &std::sync::Arc<Self>,
        tid: Uuid,
        amount: f64,
        operation: Operation,
        legs: Vec<TransactionLeg>,
    ) -> TpcResult<RpcResponse> {
        if self.reject_incoming.load(Ordering::SeqCst) {
            return Err(TpcError::Transport("rejecting incoming (simulated crash)".into()));
        }

        let delay = {
            let mut guard = self.pending_delay.lock().unwrap();
            std::mem::replace(&mut *guard, PendingDelay::None)
        };
        if delay == PendingDelay::Before {
            self.reject_incoming.store(true, Ordering::SeqCst);
            tokio::time::sleep(SIMULATED_CRASH_DELAY).await;
            self.reject_incoming.store(false, Ordering::SeqCst);
        }

        {
            let mut guard = self.commit.lock().unwrap();
            if guard.is_promised() {
                self.log.append(tid, Phase::VoteAbort)?;
                return Ok(RpcResponse::Prepared { vote: Vote::Abort });
            }
            // Tentatively promise so no concurrent prepare can interleave.
            guard.tid = Some(tid);
        }

        let current = self.balances.read()?;
        let new_balance = operation.apply(current, amount);

        if new_balance >= 0.0 {
            {
                let mut guard = self.commit.lock().unwrap();
                guard.new_balance = Some(new_balance);
                guard.legs = legs.clone();
            }
            self.log.append(tid, Phase::VoteCommit)?;
            let cancel = recovery::spawn(
                self.clone(),
                tid,
                legs,
                self.name.clone(),
                self.address.clone(),
            );
            *self.recovery_cancel.lock().unwrap() = Some(cancel);

            if delay == PendingDelay::After {
                self.reject_incoming.store(true, Ordering::SeqCst);
                let this = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(SIMULATED_CRASH_DELAY).await;
                    this.reject_incoming.store(false, Ordering::SeqCst);
                });
            }

            Ok(RpcResponse::Prepared { vote: Vote::Commit })
        } else {
            *self.commit.lock().unwrap() = CommitLock::idle();
            self.log.append(tid, Phase::VoteAbort)?;
            Ok(RpcResponse::Prepared { vote: Vote::Abort })
        }
    }

    pub async fn receive_commit(&self, tid: Uuid) -> TpcResult<RpcResponse> {
        if self.reject_incoming.load(Ordering::SeqCst) {
            return Err(TpcError::Transport("rejecting incoming (simulated crash)".into()));
        }

        let new_balance = {
            let mut guard = self.commit.lock().unwrap();
            if guard.tid != Some(tid) {
                // Already applied (or never promised for this tid): no-op.
                return Ok(RpcResponse::Unit);
            }
            let nb = match guard.new_balance.take() {
                Some(nb) => nb,
                None => return Ok(RpcResponse::Unit),
            };
            *guard = CommitLock::idle();
            nb
        };

        self.log.append(tid, Phase::Commit)?;
        self.balances.write(new_balance)?;
        self.cancel_recovery();
        Ok(RpcResponse::Unit)
    }

    pub async fn receive_abort(&self, tid: Uuid) -> TpcResult<RpcResponse> {
        if self.reject_incoming.load(Ordering::SeqCst) {
            return Err(TpcError::Transport("rejecting incoming (simulated crash)".into()));
        }

        {
            let mut guard = self.commit.lock().unwrap();
            if guard.tid != Some(tid) {
                return Ok(RpcResponse::Unit);
            }
            *guard = CommitLock::idle();
        }

        self.log.append(tid, Phase::Abort)?;
        self.cancel_recovery();
        Ok(RpcResponse::Unit)
    }

    /// Answers a peer's recovery query: if this node has a terminal entry
    /// for `tid`, replay the coordinator's decision back to the requester.
    pub async fn handle_peer_query(
        &self,
        tid: Uuid,
        requester_address: NodeAddress,
    ) -> TpcResult<RpcResponse> {
        if let Some(phase) = self.log.terminal_entry(tid)? {
            let request = match phase {
                Phase::Commit => RpcRequest::ReceiveCommit { tid },
                Phase::Abort => RpcRequest::ReceiveAbort { tid },
                _ => unreachable!("terminal_entry only returns Commit/Abort"),
            };
            tokio::spawn(async move {
                if let Err(e) = client::call(&requester_address, request).await {
                    tracing::warn!(%requester_address, error = %e, "peer replay failed");
                }
            });
        }
        Ok(RpcResponse::Unit)
    }

    fn cancel_recovery(&self) {
        if let Some(tx) = self.recovery_cancel.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_lock_starts_idle() {
        let lock = CommitLock::idle();
        assert!(!lock.is_promised());
    }
}
