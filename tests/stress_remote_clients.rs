//! Stress tests for the remote client cache under concurrent first access
//!
//! Run with: cargo test --release --test stress_remote_clients -- --nocapture

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{worker_cluster, MockCommunicator};
use vortex_dist::ServerContext;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_concurrent_get_remote_client() {
    let num_callers = 256;
    let mock = MockCommunicator::new();
    mock.slow_creation(Duration::from_millis(2));

    let server = ServerContext::new(Arc::new(mock.clone()));
    let context = server
        .create_distributed_context(7, worker_cluster(4, 0))
        .unwrap();
    let handle = context.get_task_handle("worker", 3).unwrap();

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..num_callers {
        let context = context.clone();
        handles.push(tokio::spawn(async move {
            context.get_remote_client(handle).unwrap()
        }));
    }

    let mut clients = Vec::new();
    for h in handles {
        clients.push(h.await.unwrap());
    }

    println!("Concurrent client lookup stress test:");
    println!("  Callers: {}", num_callers);
    println!("  Elapsed: {:?}", start.elapsed());

    assert_eq!(mock.clients_created("/job:worker/task:3"), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
    assert_eq!(context.remote_clients().len(), 1);
}

#[test]
fn stress_threads_across_handles() {
    let num_threads = 32;
    let cluster_size = 8;
    let mock = MockCommunicator::new();

    let server = ServerContext::new(Arc::new(mock.clone()));
    let context = server
        .create_distributed_context(8, worker_cluster(cluster_size, 0))
        .unwrap();

    let threads: Vec<_> = (0..num_threads)
        .map(|i| {
            let context = context.clone();
            std::thread::spawn(move || {
                for id in 1..cluster_size {
                    // Walk the handles in a different order per thread.
                    let id = (id + i) % (cluster_size - 1) + 1;
                    let handle = context.get_task_handle("worker", id).unwrap();
                    context.get_remote_client(handle).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    for id in 1..cluster_size {
        let task = format!("/job:worker/task:{}", id);
        assert_eq!(mock.clients_created(&task), 1, "{} created more than once", task);
    }
    assert_eq!(context.remote_clients().len(), (cluster_size - 1) as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_large_cluster_broadcast() {
    let cluster_size = 512;
    let mock = MockCommunicator::new();
    let server = ServerContext::new(Arc::new(mock.clone()));
    let context = server
        .create_distributed_context(9, worker_cluster(cluster_size, 0))
        .unwrap();

    let start = Instant::now();
    context.create_remote_contexts_async().await.unwrap();
    context.close_remote_contexts_async().await.unwrap();

    println!("Broadcast stress test:");
    println!("  Tasks: {}", cluster_size);
    println!("  Elapsed: {:?}", start.elapsed());

    assert_eq!(mock.calls().len(), 2 * (cluster_size as usize - 1));
}

#[test]
fn stress_racing_context_creation() {
    let num_threads = 16;
    let server = Arc::new(ServerContext::new(Arc::new(MockCommunicator::new())));

    let threads: Vec<_> = (0..num_threads)
        .map(|i| {
            let server = server.clone();
            // Each contender describes a different cluster under the same id.
            std::thread::spawn(move || {
                server
                    .create_distributed_context(11, worker_cluster(2 + i, 0))
                    .ok()
            })
        })
        .collect();
    let winners: Vec<_> = threads
        .into_iter()
        .filter_map(|t| t.join().unwrap())
        .collect();

    assert_eq!(winners.len(), 1);
    assert_eq!(server.context_count(), 1);
    // Only the registered context contributes devices.
    assert_eq!(server.device_manager().len(), winners[0].cluster_info().len());
}
