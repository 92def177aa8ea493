//! Peer recovery monitor: started on `VoteCommit`, bounds how long a
//! participant can stay Promised if the coordinator never delivers a
//! decision.
//!
//! Grounded on `distributed_p2p.rs`'s heartbeat task (`tokio::spawn` plus
//! `tokio::time::interval`) and spec-pacing of 500ms intra-sweep checks with
//! a full peer sweep every ~5s.

use crate::identity::NodeAddress;
use crate::participant::ParticipantState;
use crate::rpc::{client, RpcRequest, TransactionLeg};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

const INTRA_SWEEP_INTERVAL: Duration = Duration::from_millis(500);
const SWEEPS_PER_FULL_SWEEP: u32 = 10; // 10 * 500ms ~= 5s between peer sweeps

/// Spawns the monitor and returns a cancellation handle; sending (or
/// dropping) it stops the loop.
pub fn spawn(
    participant: Arc<ParticipantState>,
    tid: Uuid,
    legs: Vec<TransactionLeg>,
    self_name: String,
    self_address: NodeAddress,
) -> oneshot::Sender<()> {
    let (cancel_tx, mut cancel_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut ticks_since_sweep = 0u32;
        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    tracing::debug!(%tid, "recovery monitor cancelled");
                    return;
                }
                _ = tokio::time::sleep(INTRA_SWEEP_INTERVAL) => {}
            }

            if participant.reject_incoming.load(Ordering::SeqCst) {
                continue;
            }

            if let Ok(Some(phase)) = participant.log.terminal_entry(tid) {
                tracing::info!(%tid, ?phase, "recovery monitor observed local outcome");
                return;
            }

            ticks_since_sweep += 1;
            if ticks_since_sweep >= SWEEPS_PER_FULL_SWEEP {
                ticks_since_sweep = 0;
                query_peers(&legs, &self_name, &self_address, tid).await;
                if let Ok(Some(_)) = participant.log.terminal_entry(tid) {
                    return;
                }
            }
        }
    });

    cancel_tx
}

async fn query_peers(legs: &[TransactionLeg], self_name: &str, self_address: &NodeAddress, tid: Uuid) {
    for leg in legs {
        if leg.target_name == self_name {
            continue;
        }
        let request = RpcRequest::P2PQueryTransactionStatus {
            tid,
            requester_address: self_address.clone(),
        };
        if let Err(e) = client::call(&leg.target_address, request).await {
            tracing::warn!(peer = %leg.target_name, error = %e, "peer query failed");
        }
    }
}
