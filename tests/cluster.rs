use std::time::Duration;

use herald::raft::{Peer, Raft, RaftConfig, RaftTasks};
use tokio::net::TcpListener;
use tokio::time::sleep;

struct TestNode {
    raft: Raft,
    tasks: RaftTasks,
}

async fn start_cluster(size: usize) -> Vec<TestNode> {
    let mut listeners = Vec::new();
    for _ in 0..size {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.expect("bind"));
    }
    let peers: Vec<Peer> = listeners
        .iter()
        .map(|l| Peer::new("127.0.0.1", l.local_addr().expect("local_addr").port()))
        .collect();

    let mut nodes = Vec::new();
    for (listener, local) in listeners.into_iter().zip(peers.iter()) {
        let mut config = RaftConfig::new(local.clone());
        for peer in &peers {
            config.add_peer(peer.clone());
        }
        config.election_timeout_min = 300;
        config.election_timeout_max = 600;
        config.heartbeat_interval = 50;
        config.rpc_timeout = 100;

        let raft = Raft::new(config).expect("raft");
        let tasks = raft.start(listener);
        nodes.push(TestNode { raft, tasks });
    }
    nodes
}

async fn leaders(nodes: &[TestNode], alive: &[usize]) -> Vec<usize> {
    let mut found = Vec::new();
    for &i in alive {
        if nodes[i].raft.node.lock().await.is_leader() {
            found.push(i);
        }
    }
    found
}

async fn wait_for_single_leader(nodes: &[TestNode], alive: &[usize]) -> usize {
    // Retry for a while to allow contested rounds to settle.
    for _attempt in 0..100u32 {
        let found = leaders(nodes, alive).await;
        if found.len() == 1 {
            return found[0];
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("no single leader among nodes {alive:?} after retries");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_node_cluster_elects_one_leader_and_fails_over() {
    let nodes = start_cluster(3).await;
    let all: Vec<usize> = (0..nodes.len()).collect();

    let leader = wait_for_single_leader(&nodes, &all).await;
    assert!(nodes[leader].raft.node.lock().await.round() >= 1);

    // Stop the leader; the survivors still form a majority of three.
    nodes[leader].tasks.abort();
    let survivors: Vec<usize> = all.iter().copied().filter(|&i| i != leader).collect();

    let new_leader = wait_for_single_leader(&nodes, &survivors).await;
    assert_ne!(new_leader, leader);

    for node in &nodes {
        node.tasks.abort();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn heartbeats_keep_followers_from_electing() {
    let nodes = start_cluster(3).await;
    let all: Vec<usize> = (0..nodes.len()).collect();

    wait_for_single_leader(&nodes, &all).await;
    // Let a contested start settle before taking the snapshot
    sleep(Duration::from_millis(500)).await;
    let leader = wait_for_single_leader(&nodes, &all).await;

    let mut rounds = Vec::new();
    for node in &nodes {
        rounds.push(node.raft.node.lock().await.round());
    }

    // Several election timeouts pass without a new round
    sleep(Duration::from_millis(2000)).await;

    assert_eq!(leaders(&nodes, &all).await, vec![leader]);
    for (node, before) in nodes.iter().zip(rounds) {
        assert_eq!(node.raft.node.lock().await.round(), before);
    }

    for node in &nodes {
        node.tasks.abort();
    }
}
