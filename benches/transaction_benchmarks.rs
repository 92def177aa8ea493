//! Performance Benchmarks for the two-phase-commit engine
//!
//! Measures balance-store and transaction-log throughput in isolation, and
//! end-to-end commit latency across a real coordinator + participant
//! cohort running on loopback TCP.

use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tpc_bank::{rpc, BalanceStore, Node, NodeAddress, Operation, RpcRequest, TransactionLeg};

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub name: String,
    pub operations: usize,
    pub duration: Duration,
    pub ops_per_sec: f64,
    pub avg_latency_ms: f64,
}

impl BenchmarkResult {
    pub fn new(name: &str, operations: usize, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        let ops_per_sec = operations as f64 / secs;
        let avg_latency_ms = (secs * 1000.0) / operations as f64;

        BenchmarkResult {
            name: name.to_string(),
            operations,
            duration,
            ops_per_sec,
            avg_latency_ms,
        }
    }

    pub fn print(&self) {
        println!("=== {} ===", self.name);
        println!("  Operations:    {}", self.operations);
        println!("  Duration:      {:?}", self.duration);
        println!("  Throughput:    {:.2} ops/sec", self.ops_per_sec);
        println!("  Avg Latency:   {:.3} ms", self.avg_latency_ms);
        println!();
    }
}

/// Benchmark: repeated deposit/withdraw round trips through the balance store
fn bench_balance_store(count: usize) -> BenchmarkResult {
    let dir = TempDir::new().unwrap();
    let store = BalanceStore::new(dir.path().join("Participant-Bench.data"));

    let start = Instant::now();
    for _ in 0..count {
        store.deposit(1.0).unwrap();
        store.withdraw(1.0).unwrap();
    }
    let duration = start.elapsed();

    BenchmarkResult::new("balance store deposit+withdraw", count * 2, duration)
}

/// Benchmark: append-only write-ahead log throughput
fn bench_transaction_log(count: usize) -> BenchmarkResult {
    use tpc_bank::{Phase, TransactionLog};
    use uuid::Uuid;

    let dir = TempDir::new().unwrap();
    let log = TransactionLog::open(dir.path().join("Coordinator.log")).unwrap();

    let start = Instant::now();
    for _ in 0..count {
        let tid = Uuid::new_v4();
        log.append(tid, Phase::Prepare).unwrap();
        log.append(tid, Phase::Commit).unwrap();
    }
    let duration = start.elapsed();

    BenchmarkResult::new("write-ahead log append (fsync'd)", count * 2, duration)
}

async fn bind(rt_local: bool) -> (TcpListener, NodeAddress) {
    let _ = rt_local;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, NodeAddress::new("127.0.0.1", port))
}

/// Benchmark: end-to-end two-leg transfers over real TCP, one at a time.
async fn bench_end_to_end_transfers(count: usize) -> BenchmarkResult {
    let dir = TempDir::new().unwrap();

    let (coord_listener, coord_address) = bind(true).await;
    let coordinator = Node::new_coordinator("Coordinator", coord_address.clone(), dir.path()).unwrap();
    tokio::spawn(rpc::server::serve(coord_listener, coordinator));

    let (a_listener, a_address) = bind(true).await;
    let a = Node::new_participant("A", a_address.clone(), coord_address.clone(), dir.path()).unwrap();
    rpc::client::call(
        &coord_address,
        RpcRequest::AddParticipant { name: "A".into(), address: a_address.clone() },
    )
    .await
    .unwrap();
    tokio::spawn(rpc::server::serve(a_listener, a));

    let (b_listener, b_address) = bind(true).await;
    let b = Node::new_participant("B", b_address.clone(), coord_address.clone(), dir.path()).unwrap();
    rpc::client::call(
        &coord_address,
        RpcRequest::AddParticipant { name: "B".into(), address: b_address.clone() },
    )
    .await
    .unwrap();
    tokio::spawn(rpc::server::serve(b_listener, b));

    rpc::client::call(&a_address, RpcRequest::Deposit { amount: count as f64 })
        .await
        .unwrap();

    let start = Instant::now();
    for _ in 0..count {
        let legs = vec![
            TransactionLeg {
                target_name: "A".into(),
                target_address: a_address.clone(),
                operation: Operation::Subtract,
                amount: 1.0,
            },
            TransactionLeg {
                target_name: "B".into(),
                target_address: b_address.clone(),
                operation: Operation::Add,
                amount: 1.0,
            },
        ];
        rpc::client::call(&a_address, RpcRequest::ClientParticipantTransaction { legs })
            .await
            .unwrap();
    }
    let duration = start.elapsed();

    BenchmarkResult::new("end-to-end two-leg commit over TCP", count, duration)
}

fn run_all_benchmarks() {
    println!("\n=== tpc-bank Performance Benchmarks ===\n");

    println!("--- Balance store ---\n");
    bench_balance_store(2_000).print();

    println!("--- Transaction log ---\n");
    bench_transaction_log(2_000).print();

    println!("--- End-to-end commit ---\n");
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(bench_end_to_end_transfers(200)).print();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmarks() {
        // Verify the benchmarks run without errors, at a small scale.
        bench_balance_store(10);
        bench_transaction_log(10);
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(bench_end_to_end_transfers(5));
    }
}

fn main() {
    run_all_benchmarks();
}
