//! Operational surface: `server` spawns one coordinator plus N participants
//! on ephemeral ports and writes `nodes.txt`; `client` reads it and issues
//! one cohort-facing operation. Both are thin wrappers over `tpc_bank`'s
//! public API, per the out-of-scope boundary around shell/UI polish.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tpc_bank::{
    config, NodeAddress, NodeEntry, NodeKind, Node, Operation, RpcRequest, RpcResponse,
    TransactionLeg,
};

#[derive(Parser)]
#[command(name = "tpc-bank", about = "A two-phase-commit teaching bank")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a coordinator and its participant cohort in this process.
    Server {
        #[arg(long, default_value_t = 2)]
        participants: u8,
        #[arg(long, default_value = "node_data")]
        data_dir: PathBuf,
        #[arg(long, default_value = "nodes.txt")]
        nodes_file: PathBuf,
    },
    /// Issue one operation against a running cohort.
    Client {
        #[arg(long, default_value = "nodes.txt")]
        nodes_file: PathBuf,
        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
enum ClientAction {
    Ping { name: String },
    Balance { name: String },
    Deposit { name: String, amount: f64 },
    Withdraw { name: String, amount: f64 },
    /// Two-leg transfer: subtract `amount` from `from`, add it to `to`.
    Transfer { from: String, to: String, amount: f64 },
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Server {
            participants,
            data_dir,
            nodes_file,
        } => run_server(participants, data_dir, nodes_file).await,
        Command::Client { nodes_file, action } => run_client(nodes_file, action).await,
    }
}

async fn bind_ephemeral() -> anyhow::Result<(TcpListener, NodeAddress)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    Ok((listener, NodeAddress::new("127.0.0.1", port)))
}

async fn run_server(participant_count: u8, data_dir: PathBuf, nodes_file: PathBuf) -> anyhow::Result<()> {
    std::fs::create_dir_all(&data_dir)?;

    let (coord_listener, coord_address) = bind_ephemeral().await?;
    let coordinator = Node::new_coordinator("Coordinator", coord_address.clone(), &data_dir)?;
    let mut entries = vec![NodeEntry {
        kind: NodeKind::Coordinator,
        name: "Coordinator".to_string(),
        address: coord_address.clone(),
    }];
    tokio::spawn(tpc_bank::rpc::server::serve(coord_listener, coordinator));

    for i in 0..participant_count {
        let name = ((b'A' + i) as char).to_string();
        let (listener, address) = bind_ephemeral().await?;
        let participant = Node::new_participant(name.clone(), address.clone(), coord_address.clone(), &data_dir)?;
        tracing::info!(name, %address, "participant listening");

        // Membership bootstrap: dial the coordinator directly rather than
        // going through the listener we just spawned for it.
        tpc_bank::rpc::client::call(
            &coord_address,
            RpcRequest::AddParticipant {
                name: name.clone(),
                address: address.clone(),
            },
        )
        .await?;

        entries.push(NodeEntry {
            kind: NodeKind::Participant,
            name,
            address,
        });
        tokio::spawn(tpc_bank::rpc::server::serve(listener, participant));
    }

    config::write_nodes_file(&nodes_file, &entries)?;
    tracing::info!(path = %nodes_file.display(), "wrote bootstrap file");

    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn run_client(nodes_file: PathBuf, action: ClientAction) -> anyhow::Result<()> {
    let entries = config::read_nodes_file(&nodes_file)?;
    let find = |name: &str| -> anyhow::Result<NodeAddress> {
        entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.address.clone())
            .ok_or_else(|| anyhow::anyhow!("no node named {name:?} in {}", nodes_file.display()))
    };

    match action {
        ClientAction::Ping { name } => {
            let response = tpc_bank::rpc::client::call(&find(&name)?, RpcRequest::Ping).await?;
            println!("{response:?}");
        }
        ClientAction::Balance { name } => {
            let response = tpc_bank::rpc::client::call(&find(&name)?, RpcRequest::GetBalance).await?;
            if let RpcResponse::Balance { balance } = response {
                println!("{name}: {balance:.2}");
            }
        }
        ClientAction::Deposit { name, amount } => {
            let response =
                tpc_bank::rpc::client::call(&find(&name)?, RpcRequest::Deposit { amount }).await?;
            println!("{response:?}");
        }
        ClientAction::Withdraw { name, amount } => {
            tpc_bank::rpc::client::call(&find(&name)?, RpcRequest::Withdraw { amount }).await?;
            println!("ok");
        }
        ClientAction::Transfer { from, to, amount } => {
            let legs = vec![
                TransactionLeg {
                    target_name: from.clone(),
                    target_address: find(&from)?,
                    operation: Operation::Subtract,
                    amount,
                },
                TransactionLeg {
                    target_name: to.clone(),
                    target_address: find(&to)?,
                    operation: Operation::Add,
                    amount,
                },
            ];
            tpc_bank::rpc::client::call(
                &find(&from)?,
                RpcRequest::ClientParticipantTransaction { legs },
            )
            .await?;
            println!("ok");
        }
        ClientAction::List => {
            for entry in &entries {
                println!("{:?} {} {}", entry.kind, entry.name, entry.address);
            }
        }
    }
    Ok(())
}
