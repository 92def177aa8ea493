use std::collections::HashMap;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tpc_bank::{
    rpc, Node, NodeAddress, Operation, RpcRequest, RpcResponse, TpcResult, TransactionLeg,
};

pub async fn bind() -> (TcpListener, NodeAddress) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, NodeAddress::new("127.0.0.1", port))
}

/// A coordinator plus a named cohort of participants, all running as real
/// Tokio tasks bound to ephemeral loopback ports.
pub struct Cohort {
    _tmp: TempDir,
    pub coordinator_address: NodeAddress,
    pub participants: HashMap<String, NodeAddress>,
}

impl Cohort {
    pub async fn spawn(names: &[&str]) -> Self {
        let tmp = TempDir::new().unwrap();
        let (coord_listener, coordinator_address) = bind().await;
        let coordinator =
            Node::new_coordinator("Coordinator", coordinator_address.clone(), tmp.path()).unwrap();
        tokio::spawn(rpc::server::serve(coord_listener, coordinator));

        let mut participants = HashMap::new();
        for name in names {
            let (listener, address) = bind().await;
            let node = Node::new_participant(
                *name,
                address.clone(),
                coordinator_address.clone(),
                tmp.path(),
            )
            .unwrap();
            rpc::client::call(
                &coordinator_address,
                RpcRequest::AddParticipant {
                    name: name.to_string(),
                    address: address.clone(),
                },
            )
            .await
            .unwrap();
            tokio::spawn(rpc::server::serve(listener, node));
            participants.insert(name.to_string(), address);
        }

        Cohort {
            _tmp: tmp,
            coordinator_address,
            participants,
        }
    }

    pub fn address(&self, name: &str) -> NodeAddress {
        self.participants.get(name).unwrap().clone()
    }

    pub async fn set_balance(&self, name: &str, amount: f64) {
        rpc::client::call(&self.address(name), RpcRequest::Deposit { amount })
            .await
            .unwrap();
    }

    pub async fn balance(&self, name: &str) -> f64 {
        match rpc::client::call(&self.address(name), RpcRequest::GetBalance)
            .await
            .unwrap()
        {
            RpcResponse::Balance { balance } => balance,
            other => panic!("expected Balance, got {other:?}"),
        }
    }

    /// Submits legs as a client would: to the first leg's own participant,
    /// which forwards to the coordinator.
    pub async fn submit(&self, legs: Vec<TransactionLeg>) -> TpcResult<RpcResponse> {
        let entry_point = legs[0].target_address.clone();
        rpc::client::call(
            &entry_point,
            RpcRequest::ClientParticipantTransaction { legs },
        )
        .await
    }

    pub fn leg(&self, name: &str, operation: Operation, amount: f64) -> TransactionLeg {
        TransactionLeg {
            target_name: name.to_string(),
            target_address: self.address(name),
            operation,
            amount,
        }
    }

    pub async fn simulate_delay(&self, name: &str, sleep_before: bool, sleep_after: bool) {
        rpc::client::call(
            &self.address(name),
            RpcRequest::SimulateDelay {
                sleep_before,
                sleep_after,
            },
        )
        .await
        .unwrap();
    }
}
