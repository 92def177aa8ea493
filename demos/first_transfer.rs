//! A minimal walkthrough: stand up a coordinator and two participants in
//! one process, fund one of them, and run a two-leg transfer end to end.

use tempfile::TempDir;
use tokio::net::TcpListener;
use tpc_bank::{rpc, Node, NodeAddress, Operation, RpcRequest, RpcResponse, TransactionLeg};

async fn bind() -> (TcpListener, NodeAddress) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, NodeAddress::new("127.0.0.1", port))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let data_dir = TempDir::new().unwrap();

    let (coord_listener, coord_address) = bind().await;
    let coordinator = Node::new_coordinator("Coordinator", coord_address.clone(), data_dir.path()).unwrap();
    tokio::spawn(rpc::server::serve(coord_listener, coordinator));

    let (a_listener, a_address) = bind().await;
    let a = Node::new_participant("A", a_address.clone(), coord_address.clone(), data_dir.path()).unwrap();
    rpc::client::call(
        &coord_address,
        RpcRequest::AddParticipant { name: "A".into(), address: a_address.clone() },
    )
    .await
    .unwrap();
    tokio::spawn(rpc::server::serve(a_listener, a));

    let (b_listener, b_address) = bind().await;
    let b = Node::new_participant("B", b_address.clone(), coord_address.clone(), data_dir.path()).unwrap();
    rpc::client::call(
        &coord_address,
        RpcRequest::AddParticipant { name: "B".into(), address: b_address.clone() },
    )
    .await
    .unwrap();
    tokio::spawn(rpc::server::serve(b_listener, b));

    rpc::client::call(&a_address, RpcRequest::Deposit { amount: 100.0 })
        .await
        .unwrap();

    println!("A starts with 100.00, B starts with 0.00");

    let legs = vec![
        TransactionLeg {
            target_name: "A".into(),
            target_address: a_address.clone(),
            operation: Operation::Subtract,
            amount: 40.0,
        },
        TransactionLeg {
            target_name: "B".into(),
            target_address: b_address.clone(),
            operation: Operation::Add,
            amount: 40.0,
        },
    ];

    rpc::client::call(&a_address, RpcRequest::ClientParticipantTransaction { legs })
        .await
        .unwrap();

    for (name, address) in [("A", &a_address), ("B", &b_address)] {
        if let RpcResponse::Balance { balance } =
            rpc::client::call(address, RpcRequest::GetBalance).await.unwrap()
        {
            println!("{name}: {balance:.2}");
        }
    }
}
